//! Weather retrieval for a destination over a date window

pub mod open_meteo;

use crate::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;

pub use open_meteo::OpenMeteoWeather;

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Weather for `(latitude, longitude)` over `start_date..=end_date`.
    ///
    /// The payload is provider specific and passed to clients as-is.
    async fn fetch(
        &self,
        latitude: f64,
        longitude: f64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Value>;
}
