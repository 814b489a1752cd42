//! HTTP route handlers

use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::allocation::{ClassMap, EntryOutcome, ExitOutcome, VehicleClass, VehicleId};
use crate::error::Error;
use crate::metrics;
use crate::server::AppState;

/// Entry request
#[derive(Debug, Deserialize)]
pub struct EntryRequest {
    pub vehicle_id: String,
    pub class: VehicleClass,
}

/// Exit request
#[derive(Debug, Deserialize)]
pub struct ExitRequest {
    pub vehicle_id: String,
    pub elapsed_minutes: u64,
}

#[derive(Debug, Deserialize)]
pub struct RateRequest {
    pub rate: f64,
}

/// Error body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

/// Maps engine errors onto HTTP responses
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::DuplicateVehicle(_) => StatusCode::CONFLICT,
            Error::InvariantViolation(_) | Error::Internal(_) | Error::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        if self.0.is_fatal() {
            error!(error = %self.0, "Allocation engine failure");
        }
        (
            status,
            Json(ErrorResponse {
                success: false,
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

/// Re-initialize the facility
#[instrument(skip(state))]
pub async fn initialize(
    Extension(state): Extension<Arc<AppState>>,
    Json(counts): Json<ClassMap<u32>>,
) -> Result<Response, ApiError> {
    let stats = {
        let mut engine = state.engine.lock();
        engine.initialize(&counts)?;
        metrics::update_gauges(&engine);
        engine.stats()
    };
    info!(total = stats.total_slots, "Facility re-initialized over HTTP");
    Ok(Json(stats).into_response())
}

pub async fn get_rates(Extension(state): Extension<Arc<AppState>>) -> Response {
    Json(state.engine.lock().rates()).into_response()
}

#[instrument(skip(state))]
pub async fn set_rate(
    Extension(state): Extension<Arc<AppState>>,
    Path(class): Path<String>,
    Json(payload): Json<RateRequest>,
) -> Result<Response, ApiError> {
    let class: VehicleClass = class.parse()?;
    let rates = {
        let mut engine = state.engine.lock();
        engine.set_rate(class, payload.rate)?;
        engine.rates()
    };
    Ok(Json(rates).into_response())
}

#[instrument(skip(state))]
pub async fn vehicle_entry(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<EntryRequest>,
) -> Result<Response, ApiError> {
    let vehicle = VehicleId::new(payload.vehicle_id)?;

    let outcome = {
        let mut engine = state.engine.lock();
        let outcome = engine.entry(vehicle, payload.class)?;
        metrics::record_entry(payload.class, &outcome);
        metrics::update_gauges(&engine);
        outcome
    };

    let status = match &outcome {
        EntryOutcome::Assigned(_) => StatusCode::CREATED,
        EntryOutcome::Queued { .. } => StatusCode::ACCEPTED,
        EntryOutcome::AlreadyParked { .. } | EntryOutcome::AlreadyQueued { .. } => {
            warn!(?outcome, "Entry rejected");
            StatusCode::CONFLICT
        }
    };
    Ok((status, Json(outcome)).into_response())
}

#[instrument(skip(state))]
pub async fn vehicle_exit(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<ExitRequest>,
) -> Result<Response, ApiError> {
    let vehicle = VehicleId::new(payload.vehicle_id)?;
    let elapsed = i64::try_from(payload.elapsed_minutes).map_err(|_| {
        Error::InvalidArgument(format!(
            "elapsed_minutes out of range: {}",
            payload.elapsed_minutes
        ))
    })?;

    let outcome = {
        let mut engine = state.engine.lock();
        let outcome = engine.exit(vehicle.as_str(), elapsed)?;
        if let ExitOutcome::Released(receipt) = &outcome {
            metrics::record_exit(receipt);
        }
        metrics::update_gauges(&engine);
        outcome
    };

    let status = match &outcome {
        ExitOutcome::Released(_) => StatusCode::OK,
        ExitOutcome::NotParked => StatusCode::NOT_FOUND,
    };
    Ok((status, Json(outcome)).into_response())
}

pub async fn availability(Extension(state): Extension<Arc<AppState>>) -> Response {
    Json(state.engine.lock().availability()).into_response()
}

pub async fn stats(Extension(state): Extension<Arc<AppState>>) -> Response {
    Json(state.engine.lock().stats()).into_response()
}

pub async fn layout(Extension(state): Extension<Arc<AppState>>) -> Response {
    Json(state.engine.lock().layout()).into_response()
}
