//! Trip weather lookup
//!
//! Resolves every requested place to a stored destination and fetches its
//! weather for the requested window. Items are handled strictly in order and
//! the first failure aborts the batch; callers never see partial results.

use crate::config::PlannerConfig;
use crate::geocoding::{self, Geocoder};
use crate::models::{LocationRequest, NewDestination, WeatherResult};
use crate::store::{self, DestinationStore};
use crate::weather::{OpenMeteoWeather, WeatherProvider};
use crate::{PlannerError, Result};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

pub struct TripWeatherLookup {
    geocoder: Arc<dyn Geocoder>,
    weather: Arc<dyn WeatherProvider>,
    store: Arc<dyn DestinationStore>,
}

impl TripWeatherLookup {
    pub fn new(
        geocoder: Arc<dyn Geocoder>,
        weather: Arc<dyn WeatherProvider>,
        store: Arc<dyn DestinationStore>,
    ) -> Self {
        Self {
            geocoder,
            weather,
            store,
        }
    }

    /// Wire up the providers and store named in `config`
    pub fn from_config(config: &PlannerConfig) -> Result<Self> {
        let geocoder = geocoding::from_config(&config.geocoding)?;
        let weather = Arc::new(OpenMeteoWeather::new(
            &config.weather,
            &config.geocoding.user_agent,
        )?);
        let store = store::from_config(&config.store)?;
        Ok(Self::new(geocoder, weather, store))
    }

    /// Weather for every request, in input order.
    ///
    /// Fails with [`PlannerError::GeocodeMiss`] on the first place the
    /// geocoder cannot resolve; items after it are not touched.
    #[instrument(skip_all, fields(items = requests.len()))]
    pub async fn handle(&self, requests: &[LocationRequest]) -> Result<Vec<WeatherResult>> {
        let start_time = Instant::now();
        let mut results = Vec::with_capacity(requests.len());

        for request in requests {
            results.push(self.lookup_one(request).await?);
        }

        info!(
            "Completed weather lookup for {} places in {:.3}s",
            results.len(),
            start_time.elapsed().as_secs_f64()
        );
        Ok(results)
    }

    #[instrument(skip_all, fields(place = %request.place_name))]
    async fn lookup_one(&self, request: &LocationRequest) -> Result<WeatherResult> {
        let place_name = request.place_name.as_str();

        let Some(place) = self.geocoder.geocode(place_name).await? else {
            warn!("Geocoding failed for {}", place_name);
            return Err(PlannerError::geocode_miss(place_name));
        };

        let defaults = NewDestination {
            country: place.country(),
            latitude: place.latitude,
            longitude: place.longitude,
        };
        let (destination, created) = self.store.find_or_create(place_name, defaults).await?;
        if created {
            info!(
                "Created destination {} in {} at {}",
                destination.name,
                destination.country,
                destination.format_coordinates()
            );
        } else {
            debug!(
                "Reusing stored destination {} at {}",
                destination.name,
                destination.format_coordinates()
            );
        }

        let weather_data = self
            .weather
            .fetch(
                destination.latitude,
                destination.longitude,
                request.start_date,
                request.end_date,
            )
            .await?;

        Ok(WeatherResult {
            place_name: request.place_name.clone(),
            weather_data,
        })
    }
}
