//! Test doubles for the outbound collaborators

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use holiday_planner::{
    GeocodedPlace, Geocoder, MemoryDestinationStore, PlannerError, TripWeatherLookup,
    WeatherProvider,
};
use serde_json::{Value, json};

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// Geocoder answering from a table that tests can change between calls
#[derive(Default)]
pub struct FakeGeocoder {
    places: Mutex<HashMap<String, GeocodedPlace>>,
    calls: Mutex<Vec<String>>,
}

impl FakeGeocoder {
    pub fn with(self, name: &str, address: &str, latitude: f64, longitude: f64) -> Self {
        self.set(name, address, latitude, longitude);
        self
    }

    pub fn set(&self, name: &str, address: &str, latitude: f64, longitude: f64) {
        self.places.lock().unwrap().insert(
            name.to_string(),
            GeocodedPlace::new(address, latitude, longitude),
        );
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Geocoder for FakeGeocoder {
    async fn geocode(&self, place_name: &str) -> holiday_planner::Result<Option<GeocodedPlace>> {
        self.calls.lock().unwrap().push(place_name.to_string());
        Ok(self.places.lock().unwrap().get(place_name).cloned())
    }
}

/// One recorded weather request
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherCall {
    pub latitude: f64,
    pub longitude: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Weather provider returning a fixed payload, or failing when asked to
pub struct FakeWeather {
    payload: Value,
    fail: bool,
    calls: Mutex<Vec<WeatherCall>>,
}

impl FakeWeather {
    pub fn returning(payload: Value) -> Self {
        Self {
            payload,
            fail: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            payload: Value::Null,
            fail: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<WeatherCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for FakeWeather {
    fn default() -> Self {
        Self::returning(json!({"temp_max": [22, 23, 21, 24, 25]}))
    }
}

#[async_trait]
impl WeatherProvider for FakeWeather {
    async fn fetch(
        &self,
        latitude: f64,
        longitude: f64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> holiday_planner::Result<Value> {
        self.calls.lock().unwrap().push(WeatherCall {
            latitude,
            longitude,
            start_date,
            end_date,
        });
        if self.fail {
            return Err(PlannerError::api("weather provider unavailable"));
        }
        Ok(self.payload.clone())
    }
}

/// Lookup wired to fakes, with handles kept for assertions
pub struct Harness {
    pub geocoder: Arc<FakeGeocoder>,
    pub weather: Arc<FakeWeather>,
    pub store: Arc<MemoryDestinationStore>,
    pub lookup: TripWeatherLookup,
}

impl Harness {
    pub fn new(geocoder: FakeGeocoder, weather: FakeWeather) -> Self {
        let geocoder = Arc::new(geocoder);
        let weather = Arc::new(weather);
        let store = Arc::new(MemoryDestinationStore::default());
        let lookup = TripWeatherLookup::new(geocoder.clone(), weather.clone(), store.clone());
        Self {
            geocoder,
            weather,
            store,
            lookup,
        }
    }
}

pub fn europe_geocoder() -> FakeGeocoder {
    FakeGeocoder::default()
        .with("Paris", "Paris, Île-de-France, France", 48.8566, 2.3522)
        .with("Rome", "Roma, Lazio, Italia", 41.8933, 12.4829)
        .with("Eiffel Tower", "Eiffel Tower, Paris, France", 48.8584, 2.2945)
}
