use crate::api::responses::{
    ErrorCode, ErrorResponse, HealthStatus, HealthSuccessResponse, ScooterView, ScootersResponse,
    StateResponse,
};
use crate::catalog;
use crate::controller::{self, TimerAction};
use crate::error::AppError;
use crate::modes::{DestinationError, ExerciseError};
use crate::navigator::{NavigationError, Screen};
use crate::ride::RideError;
use crate::state::{SharedState, TimerTarget};
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use std::fmt;
use std::time::SystemTime;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{error, warn};

const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

#[derive(Debug)]
enum TimestampError {
    Format(time::error::Format),
}

impl fmt::Display for TimestampError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimestampError::Format(err) => write!(f, "timestamp format error: {err}"),
        }
    }
}

pub enum ApiResponse<T> {
    Success(T),
    Error {
        status: StatusCode,
        body: ErrorResponse,
    },
}

impl<T: serde::Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        match self {
            ApiResponse::Success(body) => (StatusCode::OK, Json(body)).into_response(),
            ApiResponse::Error { status, body } => (status, Json(body)).into_response(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct NavigateRequest {
    pub screen: Screen,
}

#[derive(Debug, Deserialize)]
pub struct SelectScooterRequest {
    pub scooter_id: u32,
}

#[derive(Debug, Deserialize)]
pub struct PickDestinationRequest {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Deserialize)]
pub struct ExerciseDurationRequest {
    pub minutes: u32,
}

pub async fn get_health(State(state): State<SharedState>) -> impl IntoResponse {
    build_health_response(&state, SystemTime::now())
}

pub async fn get_state(State(state): State<SharedState>) -> impl IntoResponse {
    build_state_response(&state, SystemTime::now())
}

pub async fn get_scooters() -> impl IntoResponse {
    build_scooters_response(SystemTime::now())
}

pub async fn post_navigate(
    State(state): State<SharedState>,
    Json(request): Json<NavigateRequest>,
) -> impl IntoResponse {
    let result = controller::navigate(&state, request.screen).map(|_| ());
    respond(&state, result, SystemTime::now())
}

pub async fn post_ride_find(State(state): State<SharedState>) -> impl IntoResponse {
    let result = controller::find_scooter(&state);
    respond(&state, result, SystemTime::now())
}

pub async fn post_ride_select(
    State(state): State<SharedState>,
    Json(request): Json<SelectScooterRequest>,
) -> impl IntoResponse {
    let result = controller::select_scooter(&state, request.scooter_id);
    respond(&state, result, SystemTime::now())
}

pub async fn post_ride_confirm(State(state): State<SharedState>) -> impl IntoResponse {
    let result = controller::confirm_selection(&state);
    respond(&state, result, SystemTime::now())
}

pub async fn post_ride_pay(State(state): State<SharedState>) -> impl IntoResponse {
    let result = controller::confirm_payment(&state);
    respond(&state, result, SystemTime::now())
}

pub async fn post_ride_end(State(state): State<SharedState>) -> impl IntoResponse {
    let result = controller::end_ride(&state).map(|_| ());
    respond(&state, result, SystemTime::now())
}

pub async fn post_ride_end_confirm(State(state): State<SharedState>) -> impl IntoResponse {
    let result = controller::confirm_end_ride(&state).map(|_| ());
    respond(&state, result, SystemTime::now())
}

pub async fn post_ride_home(State(state): State<SharedState>) -> impl IntoResponse {
    let result = controller::return_home(&state).map(|_| ());
    respond(&state, result, SystemTime::now())
}

pub async fn post_destination_pick(
    State(state): State<SharedState>,
    Json(request): Json<PickDestinationRequest>,
) -> impl IntoResponse {
    let result = controller::pick_destination(
        &state,
        request.x,
        request.y,
        request.width,
        request.height,
    )
    .map(|_| ());
    respond(&state, result, SystemTime::now())
}

pub async fn post_destination_start(State(state): State<SharedState>) -> impl IntoResponse {
    let result = controller::start_trip(&state);
    respond(&state, result, SystemTime::now())
}

pub async fn post_exercise_duration(
    State(state): State<SharedState>,
    Json(request): Json<ExerciseDurationRequest>,
) -> impl IntoResponse {
    let result = controller::select_exercise_duration(&state, request.minutes);
    respond(&state, result, SystemTime::now())
}

pub async fn delete_exercise_duration(State(state): State<SharedState>) -> impl IntoResponse {
    let result = controller::clear_exercise_duration(&state);
    respond(&state, result, SystemTime::now())
}

pub async fn post_timer_action(
    State(state): State<SharedState>,
    Path((target, action)): Path<(TimerTarget, TimerAction)>,
) -> impl IntoResponse {
    let result = controller::timer_action(&state, target, action);
    respond(&state, result, SystemTime::now())
}

/// Answer an action with the resulting state, or with the mapped error.
fn respond(
    state: &SharedState,
    result: Result<(), AppError>,
    now: SystemTime,
) -> ApiResponse<StateResponse> {
    match result {
        Ok(()) => build_state_response(state, now),
        Err(err) => error_response(&err, now),
    }
}

fn build_state_response(state: &SharedState, now: SystemTime) -> ApiResponse<StateResponse> {
    let guard = match state.read() {
        Ok(guard) => guard,
        Err(_) => {
            return internal_error("state lock poisoned while reading app state");
        }
    };
    let timestamp = match format_timestamp(now) {
        Ok(formatted) => formatted,
        Err(_) => {
            drop(guard);
            return internal_error("timestamp formatting failure");
        }
    };
    let body = StateResponse::from_state(&guard, timestamp);
    drop(guard);
    ApiResponse::Success(body)
}

fn build_health_response(
    state: &SharedState,
    now: SystemTime,
) -> ApiResponse<HealthSuccessResponse> {
    let screen = match state.read() {
        Ok(guard) => guard.current_screen(),
        Err(_) => {
            return internal_error("state lock poisoned while reading screen");
        }
    };

    match format_timestamp(now) {
        Ok(timestamp) => ApiResponse::Success(HealthSuccessResponse {
            status: HealthStatus::Ok,
            screen,
            timestamp,
        }),
        Err(_) => internal_error("timestamp formatting failure"),
    }
}

fn build_scooters_response(now: SystemTime) -> ApiResponse<ScootersResponse> {
    match format_timestamp(now) {
        Ok(timestamp) => ApiResponse::Success(ScootersResponse {
            scooters: catalog::all().iter().map(ScooterView::from).collect(),
            timestamp,
        }),
        Err(_) => internal_error("timestamp formatting failure"),
    }
}

fn classify_error(err: &AppError) -> (StatusCode, ErrorCode) {
    match err {
        AppError::Navigation(NavigationError::Rejected { .. }) => {
            (StatusCode::CONFLICT, ErrorCode::TransitionRejected)
        }
        AppError::Ride(RideError::InvalidStep { .. }) => {
            (StatusCode::CONFLICT, ErrorCode::InvalidAction)
        }
        AppError::Ride(RideError::NoScooterSelected)
        | AppError::Destination(DestinationError::NoLocationSelected)
        | AppError::Destination(DestinationError::TripNotStarted)
        | AppError::Exercise(ExerciseError::NoDurationSelected) => {
            (StatusCode::CONFLICT, ErrorCode::NothingSelected)
        }
        AppError::Ride(RideError::UnknownScooter(_)) => {
            (StatusCode::NOT_FOUND, ErrorCode::NotFound)
        }
        AppError::Destination(DestinationError::Map(_))
        | AppError::Exercise(ExerciseError::UnknownDuration(_)) => {
            (StatusCode::UNPROCESSABLE_ENTITY, ErrorCode::InvalidInput)
        }
        AppError::NoRide | AppError::ScreenInactive(_) => {
            (StatusCode::CONFLICT, ErrorCode::ScreenInactive)
        }
        AppError::StateLock => (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::InternalError),
    }
}

fn error_response<T>(err: &AppError, now: SystemTime) -> ApiResponse<T> {
    let (status, error_code) = classify_error(err);
    if error_code == ErrorCode::InternalError {
        return internal_error(&err.to_string());
    }
    warn!(error = %err, code = ?error_code, "Action rejected");
    match format_timestamp(now) {
        Ok(timestamp) => ApiResponse::Error {
            status,
            body: ErrorResponse {
                error_code,
                error_message: err.to_string(),
                timestamp,
            },
        },
        Err(_) => internal_error("timestamp formatting failure"),
    }
}

fn internal_error<T>(message: &str) -> ApiResponse<T> {
    error!(message = message, "Internal error while handling request");
    let formatted = format_timestamp(SystemTime::now()).unwrap_or_else(|err| {
        error!(error = %err, "Failed to format internal error timestamp");
        OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
    });
    ApiResponse::Error {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: ErrorResponse {
            error_code: ErrorCode::InternalError,
            error_message: INTERNAL_ERROR_MESSAGE.to_string(),
            timestamp: formatted,
        },
    }
}

fn format_timestamp(timestamp: SystemTime) -> Result<String, TimestampError> {
    let datetime = OffsetDateTime::from(timestamp);
    datetime.format(&Rfc3339).map_err(TimestampError::Format)
}
