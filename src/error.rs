//! Error types and handling for the holiday planner

use thiserror::Error;

/// Main error type for the holiday planner
#[derive(Error, Debug)]
pub enum PlannerError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Request payload failed validation
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// The geocoder had no match for a place name
    #[error("Geocoding failed for {place_name}")]
    GeocodeMiss { place_name: String },

    /// Outbound provider communication errors
    #[error("API error: {message}")]
    Api { message: String },

    /// Destination store errors
    #[error("Store error: {message}")]
    Store { message: String },
}

impl PlannerError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn geocode_miss<S: Into<String>>(place_name: S) -> Self {
        Self::GeocodeMiss {
            place_name: place_name.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Create a new store error
    pub fn store<S: Into<String>>(message: S) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Whether the caller sent something we cannot serve (as opposed to a fault on our side)
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::GeocodeMiss { .. })
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            PlannerError::Config { .. } => {
                "Configuration error. Please check your config file.".to_string()
            }
            PlannerError::Validation { message } => format!("Invalid input: {message}"),
            PlannerError::GeocodeMiss { place_name } => {
                format!("Geocoding failed for {place_name}")
            }
            PlannerError::Api { .. } => {
                "Unable to reach an upstream geocoding or weather service.".to_string()
            }
            PlannerError::Store { .. } => "Destination storage failed.".to_string(),
        }
    }
}
