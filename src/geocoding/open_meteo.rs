//! Open-Meteo geocoding API

use super::{GeocodedPlace, Geocoder};
use crate::Result;
use crate::config::GeocodingConfig;
use crate::http;
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{info, instrument, warn};

const PROVIDER: &str = "Open-Meteo geocoding";

/// Geocoding response from `OpenMeteo`
#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    results: Option<Vec<GeocodingResult>>,
}

#[derive(Debug, Deserialize)]
struct GeocodingResult {
    name: String,
    latitude: f64,
    longitude: f64,
    country: Option<String>,
    admin1: Option<String>,
}

impl GeocodingResult {
    /// "name, admin1, country" with absent or repeated parts skipped
    fn formatted_address(&self) -> String {
        let mut parts: Vec<&str> = vec![self.name.as_str()];
        for part in [self.admin1.as_deref(), self.country.as_deref()]
            .into_iter()
            .flatten()
        {
            if !part.is_empty() && !parts.contains(&part) {
                parts.push(part);
            }
        }
        parts.join(", ")
    }
}

impl From<GeocodingResult> for GeocodedPlace {
    fn from(result: GeocodingResult) -> Self {
        GeocodedPlace {
            address: result.formatted_address(),
            latitude: result.latitude,
            longitude: result.longitude,
        }
    }
}

pub struct OpenMeteoGeocoder {
    client: ClientWithMiddleware,
    base_url: String,
}

impl OpenMeteoGeocoder {
    pub fn new(config: &GeocodingConfig) -> Result<Self> {
        let client = http::build_client(
            &config.user_agent,
            config.timeout_seconds,
            config.max_retries,
        )?;

        Ok(Self {
            client,
            base_url: config
                .effective_base_url()
                .trim_end_matches('/')
                .to_string(),
        })
    }
}

#[async_trait]
impl Geocoder for OpenMeteoGeocoder {
    #[instrument(skip(self), fields(provider = PROVIDER))]
    async fn geocode(&self, place_name: &str) -> Result<Option<GeocodedPlace>> {
        // OpenMeteo geocoding API (no API key required)
        let url = format!(
            "{}/search?name={}&count=1&language=en&format=json",
            self.base_url,
            urlencoding::encode(place_name)
        );

        let response: GeocodingResponse = http::get_json(&self.client, PROVIDER, &url).await?;

        match response.results.unwrap_or_default().into_iter().next() {
            Some(result) => {
                let place = GeocodedPlace::from(result);
                info!(
                    "Geocoded '{}' to {} ({:.4}, {:.4})",
                    place_name, place.address, place.latitude, place.longitude
                );
                Ok(Some(place))
            }
            None => {
                warn!("No results found for location '{}'", place_name);
                Ok(None)
            }
        }
    }
}
