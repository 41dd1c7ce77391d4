//! HTTP API.
//!
//! | Route               | Response                                        |
//! |---------------------|-------------------------------------------------|
//! | `GET /availability` | `200 {"booked": ["YYYY-MM-DD", ...]}`           |
//! | `GET /health`       | `200 {"status": "ok"}`                          |
//!
//! When every source fails, `/availability` answers
//! `500 {"error": "Failed to load calendar"}`. The cause is added as
//! `details` only when `expose_error_details` is enabled, because it can
//! reveal which platforms the property is listed on.

use std::sync::Arc;

use availcal_core::{AvailabilitySnapshot, BookedDay};
use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::aggregator::Aggregator;
use crate::error::AggregationFailure;

/// Shared state of the HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    aggregator: Arc<Aggregator>,
    expose_error_details: bool,
}

impl AppState {
    pub fn new(aggregator: Arc<Aggregator>, expose_error_details: bool) -> Self {
        Self {
            aggregator,
            expose_error_details,
        }
    }
}

/// Body of a successful `/availability` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    /// Booked days, ascending, without duplicates.
    pub booked: Vec<BookedDay>,
}

impl From<&AvailabilitySnapshot> for AvailabilityResponse {
    fn from(snapshot: &AvailabilitySnapshot) -> Self {
        Self {
            booked: snapshot.booked_days().copied().collect(),
        }
    }
}

/// Standard API error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// An aggregation failure on its way to the client.
pub struct ApiError {
    failure: AggregationFailure,
    expose_details: bool,
}

impl ApiError {
    pub const MESSAGE: &'static str = "Failed to load calendar";
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: Self::MESSAGE.to_string(),
            details: self.expose_details.then(|| self.failure.details()),
        });
        (StatusCode::INTERNAL_SERVER_ERROR, no_store(), body).into_response()
    }
}

/// Responses are never cacheable.
fn no_store() -> [(header::HeaderName, &'static str); 1] {
    [(header::CACHE_CONTROL, "no-store")]
}

/// Builds the router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/availability", get(availability))
        .route("/health", get(health))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn availability(State(state): State<AppState>) -> Result<Response, ApiError> {
    let snapshot = state.aggregator.aggregate().await.map_err(|failure| ApiError {
        failure,
        expose_details: state.expose_error_details,
    })?;

    Ok((no_store(), Json(AvailabilityResponse::from(&snapshot))).into_response())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
