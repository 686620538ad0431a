//! Geocoding: resolving free-text place names to coordinates
//!
//! Providers implement [`Geocoder`]; [`from_config`] picks the one named in
//! the configuration.

pub mod nominatim;
pub mod open_meteo;

use crate::Result;
use crate::config::{GeocodingConfig, GeocodingProvider};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub use nominatim::NominatimGeocoder;
pub use open_meteo::OpenMeteoGeocoder;

/// Best match for a place name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodedPlace {
    /// Comma separated formatted address, most specific part first
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl GeocodedPlace {
    #[must_use]
    pub fn new(address: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            address: address.into(),
            latitude,
            longitude,
        }
    }

    /// Country of this place, see [`country_from_address`]
    #[must_use]
    pub fn country(&self) -> String {
        country_from_address(&self.address)
    }
}

/// Last `", "` separated segment of a formatted address.
///
/// An address without a separator is returned whole.
#[must_use]
pub fn country_from_address(address: &str) -> String {
    address
        .rsplit(", ")
        .next()
        .unwrap_or(address)
        .trim()
        .to_string()
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolve `place_name`; `Ok(None)` means the provider has no match
    async fn geocode(&self, place_name: &str) -> Result<Option<GeocodedPlace>>;
}

/// Build the geocoder selected by `config.provider`
pub fn from_config(config: &GeocodingConfig) -> Result<Arc<dyn Geocoder>> {
    Ok(match config.provider {
        GeocodingProvider::Nominatim => Arc::new(NominatimGeocoder::new(config)?),
        GeocodingProvider::OpenMeteo => Arc::new(OpenMeteoGeocoder::new(config)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Eiffel Tower, Paris, France", "France")]
    #[case("Paris, Île-de-France, France métropolitaine, France", "France")]
    #[case("Kyoto, Kyoto Prefecture, Japan ", "Japan")]
    #[case("Antarctica", "Antarctica")]
    #[case("Washington, District of Columbia, United States", "United States")]
    fn test_country_from_address(#[case] address: &str, #[case] expected: &str) {
        assert_eq!(country_from_address(address), expected);
    }

    #[test]
    fn test_geocoded_place_country() {
        let place = GeocodedPlace::new("Paris, Île-de-France, France", 48.8566, 2.3522);
        assert_eq!(place.country(), "France");
    }

    #[test]
    fn test_from_config_builds_both_providers() {
        let mut config = GeocodingConfig::default();
        assert!(from_config(&config).is_ok());
        config.provider = GeocodingProvider::OpenMeteo;
        assert!(from_config(&config).is_ok());
    }
}
