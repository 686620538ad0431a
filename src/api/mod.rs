use std::sync::Arc;

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::{
    PlannerError, VERSION,
    lookup::TripWeatherLookup,
    models::{LocationRequest, WeatherResult},
};

#[derive(Clone)]
pub struct AppState {
    pub lookup: Arc<TripWeatherLookup>,
}

impl AppState {
    pub fn new(lookup: TripWeatherLookup) -> Self {
        Self {
            lookup: Arc::new(lookup),
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}

#[derive(Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    pub version: String,
}

impl IntoResponse for PlannerError {
    fn into_response(self) -> Response {
        let status = if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            tracing::error!("Weather lookup failed: {self}");
            StatusCode::INTERNAL_SERVER_ERROR
        };
        let body = ApiError {
            error: self.user_message(),
        };
        (status, Json(body)).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/weather", post(post_weather))
        .route("/health", get(get_health))
        .with_state(state)
}

async fn post_weather(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Vec<WeatherResult>>, PlannerError> {
    let requests = LocationRequest::parse_batch(&body)?;
    let results = state.lookup.handle(&requests).await?;
    Ok(Json(results))
}

async fn get_health() -> Json<Health> {
    Json(Health {
        status: "ok".to_string(),
        version: VERSION.to_string(),
    })
}
