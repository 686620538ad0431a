//! Weather lookup result returned to clients

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Weather for one requested place; `weather_data` is passed through from the provider untouched
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WeatherResult {
    pub place_name: String,
    pub weather_data: Value,
}
