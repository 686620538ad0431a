//! Open-Meteo daily weather client
//!
//! Recent and upcoming windows go to the forecast API; windows that ended
//! longer ago than `archive_lag_days` go to the historical archive, which is
//! the only endpoint that still serves them.

use super::WeatherProvider;
use crate::Result;
use crate::config::WeatherConfig;
use crate::http;
use async_trait::async_trait;
use chrono::{Days, NaiveDate, Utc};
use reqwest_middleware::ClientWithMiddleware;
use serde_json::Value;
use std::time::Instant;
use tracing::{info, instrument, warn};

const PROVIDER: &str = "Open-Meteo weather";

/// Which Open-Meteo API serves a window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Forecast,
    Archive,
}

/// Pick the endpoint for a window ending on `end_date`, as seen on `today`
#[must_use]
pub fn endpoint_for(end_date: NaiveDate, today: NaiveDate, archive_lag_days: u32) -> Endpoint {
    match today.checked_sub_days(Days::new(archive_lag_days.into())) {
        Some(cutoff) if end_date < cutoff => Endpoint::Archive,
        _ => Endpoint::Forecast,
    }
}

pub struct OpenMeteoWeather {
    client: ClientWithMiddleware,
    base_url: String,
    archive_base_url: String,
    daily: String,
    timezone: String,
    archive_lag_days: u32,
}

impl OpenMeteoWeather {
    pub fn new(config: &WeatherConfig, user_agent: &str) -> Result<Self> {
        let client = http::build_client(user_agent, config.timeout_seconds, config.max_retries)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            archive_base_url: config.archive_base_url.trim_end_matches('/').to_string(),
            daily: config.daily.join(","),
            timezone: config.timezone.clone(),
            archive_lag_days: config.archive_lag_days,
        })
    }

    fn url_for(
        &self,
        latitude: f64,
        longitude: f64,
        start_date: NaiveDate,
        end_date: NaiveDate,
        endpoint: Endpoint,
    ) -> String {
        let base = match endpoint {
            Endpoint::Forecast => format!("{}/forecast", self.base_url),
            Endpoint::Archive => format!("{}/archive", self.archive_base_url),
        };
        format!(
            "{base}?latitude={latitude}&longitude={longitude}&start_date={start_date}&end_date={end_date}&daily={}&timezone={}",
            urlencoding::encode(&self.daily),
            urlencoding::encode(&self.timezone)
        )
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoWeather {
    #[instrument(skip(self), fields(provider = PROVIDER))]
    async fn fetch(
        &self,
        latitude: f64,
        longitude: f64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Value> {
        let endpoint = endpoint_for(end_date, Utc::now().date_naive(), self.archive_lag_days);
        let url = self.url_for(latitude, longitude, start_date, end_date, endpoint);
        let start_time = Instant::now();

        let mut body: Value = http::get_json(&self.client, PROVIDER, &url).await?;

        let total_duration = start_time.elapsed();
        info!(
            "Retrieved {:?} weather for {:.4}, {:.4} ({} to {}) in {:.3}s",
            endpoint,
            latitude,
            longitude,
            start_date,
            end_date,
            total_duration.as_secs_f64()
        );
        if total_duration.as_secs() > 5 {
            warn!(
                "Slow weather API response: {:.3}s",
                total_duration.as_secs_f64()
            );
        }

        if let Some(daily) = body.get_mut("daily") {
            return Ok(daily.take());
        }
        Ok(body)
    }
}
