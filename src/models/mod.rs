//! Data models for the holiday planner
//!
//! - Request: inbound (place, date range) tuples and their validation
//! - Destination: the persisted place record
//! - Weather: per-place lookup results

pub mod destination;
pub mod request;
pub mod weather;

// Re-export all public types for convenient access
pub use destination::{Destination, NewDestination};
pub use request::LocationRequest;
pub use weather::WeatherResult;
