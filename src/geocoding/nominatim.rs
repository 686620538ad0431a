//! Nominatim (OpenStreetMap) forward geocoding
//!
//! Free, no API key, but the usage policy asks for an identifying user agent
//! and at most one request per second. Requests are spaced by
//! `min_request_interval_ms` and capped by `max_requests_per_minute`.

use super::{GeocodedPlace, Geocoder};
use crate::config::GeocodingConfig;
use crate::http::{self, Throttle};
use crate::{PlannerError, Result};
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

const PROVIDER: &str = "Nominatim";

/// One search hit; Nominatim encodes coordinates as strings
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    display_name: String,
}

pub struct NominatimGeocoder {
    client: ClientWithMiddleware,
    base_url: String,
    throttle: Throttle,
}

impl NominatimGeocoder {
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
            throttle: Throttle::new(
                config.max_requests_per_minute,
                Duration::from_millis(config.min_request_interval_ms),
            ),
        })
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    #[instrument(skip(self), fields(provider = PROVIDER))]
    async fn geocode(&self, place_name: &str) -> Result<Option<GeocodedPlace>> {
        let url = format!(
            "{}/search?q={}&format=jsonv2&limit=1",
            self.base_url,
            urlencoding::encode(place_name)
        );

        self.throttle.acquire().await;
        let places: Vec<NominatimPlace> = http::get_json(&self.client, PROVIDER, &url).await?;

        let Some(place) = places.into_iter().next() else {
            warn!("No results found for location '{}'", place_name);
            return Ok(None);
        };

        let latitude = parse_coordinate("latitude", &place.lat)?;
        let longitude = parse_coordinate("longitude", &place.lon)?;

        info!(
            "Geocoded '{}' to {} ({:.4}, {:.4})",
            place_name, place.display_name, latitude, longitude
        );

        Ok(Some(GeocodedPlace {
            address: place.display_name,
            latitude,
            longitude,
        }))
    }
}

fn parse_coordinate(axis: &str, raw: &str) -> Result<f64> {
    raw.trim().parse::<f64>().map_err(|e| {
        debug!("Unparseable {axis} '{raw}': {e}");
        PlannerError::api(format!("{PROVIDER} returned an invalid {axis}: {raw}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn geocoder_for(server: &MockServer) -> NominatimGeocoder {
        let config = GeocodingConfig {
            base_url: server.uri(),
            timeout_seconds: 5,
            ..GeocodingConfig::default()
        };
        NominatimGeocoder::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_geocode_returns_first_hit() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "Eiffel Tower"))
            .and(query_param("format", "jsonv2"))
            .and(query_param("limit", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {
                    "place_id": 88066702,
                    "lat": "48.8582599",
                    "lon": "2.2945006",
                    "display_name": "Eiffel Tower, Avenue Gustave Eiffel, Paris, Île-de-France, France",
                    "type": "attraction"
                }
            ])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let place = geocoder_for(&mock_server)
            .geocode("Eiffel Tower")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(place.latitude, 48.858_259_9);
        assert_eq!(place.longitude, 2.294_500_6);
        assert_eq!(place.country(), "France");
    }

    #[tokio::test]
    async fn test_geocode_no_match() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&mock_server)
            .await;

        let result = geocoder_for(&mock_server).geocode("Xyzzyplugh").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_geocode_bad_coordinates() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"lat": "north", "lon": "2.29", "display_name": "Somewhere, France"}
            ])))
            .mount(&mock_server)
            .await;

        let err = geocoder_for(&mock_server).geocode("Somewhere").await.unwrap_err();
        assert!(matches!(err, PlannerError::Api { .. }));
        assert!(err.to_string().contains("invalid latitude"));
    }

    #[tokio::test]
    async fn test_consecutive_lookups_are_spaced() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(3)
            .mount(&mock_server)
            .await;

        let config = GeocodingConfig {
            base_url: mock_server.uri(),
            timeout_seconds: 5,
            min_request_interval_ms: 200,
            ..GeocodingConfig::default()
        };
        let geocoder = NominatimGeocoder::new(&config).unwrap();
        let start = std::time::Instant::now();

        for place in ["Paris", "Rome", "Oslo"] {
            geocoder.geocode(place).await.unwrap();
        }

        assert!(start.elapsed() >= Duration::from_millis(400));
    }

    #[tokio::test]
    async fn test_geocode_upstream_failure_is_api_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let err = geocoder_for(&mock_server).geocode("Paris").await.unwrap_err();
        assert!(matches!(err, PlannerError::Api { .. }));
    }
}
