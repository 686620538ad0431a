//! Holiday planner - trip weather lookup service
//!
//! Geocodes requested destinations, remembers them, and fetches weather for
//! the requested travel dates.

pub mod api;
pub mod config;
pub mod error;
pub mod geocoding;
pub mod http;
pub mod logging;
pub mod lookup;
pub mod models;
pub mod store;
pub mod weather;
pub mod web;

// Re-export core types for public API
pub use api::AppState;
pub use config::PlannerConfig;
pub use error::PlannerError;
pub use geocoding::{GeocodedPlace, Geocoder};
pub use lookup::TripWeatherLookup;
pub use models::{Destination, LocationRequest, NewDestination, WeatherResult};
pub use store::{DestinationStore, FjallDestinationStore, MemoryDestinationStore};
pub use weather::WeatherProvider;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, PlannerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
