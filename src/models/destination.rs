//! Destination record binding a place name to resolved coordinates

use serde::{Deserialize, Serialize};

/// Persisted destination, keyed uniquely by `name`
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Destination {
    /// Place name exactly as requested
    pub name: String,
    /// Country taken from the geocoded address
    pub country: String,
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
}

/// Attributes used when a destination has to be created
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct NewDestination {
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl NewDestination {
    #[must_use]
    pub fn into_destination(self, name: impl Into<String>) -> Destination {
        Destination {
            name: name.into(),
            country: self.country,
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

impl Destination {
    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_destination_keeps_attributes() {
        let destination = NewDestination {
            country: "France".to_string(),
            latitude: 48.8566,
            longitude: 2.3522,
        }
        .into_destination("Paris");

        assert_eq!(destination.name, "Paris");
        assert_eq!(destination.country, "France");
        assert_eq!(destination.format_coordinates(), "48.8566, 2.3522");
    }
}
