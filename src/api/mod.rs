use crate::state::SharedState;
use axum::Router;
use axum::routing::{get, post};

pub mod handlers;
pub mod responses;

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/api/health", get(handlers::get_health))
        .route("/api/state", get(handlers::get_state))
        .route("/api/scooters", get(handlers::get_scooters))
        .route("/api/navigate", post(handlers::post_navigate))
        .route("/api/ride/find", post(handlers::post_ride_find))
        .route("/api/ride/select", post(handlers::post_ride_select))
        .route("/api/ride/confirm", post(handlers::post_ride_confirm))
        .route("/api/ride/pay", post(handlers::post_ride_pay))
        .route("/api/ride/end", post(handlers::post_ride_end))
        .route("/api/ride/end/confirm", post(handlers::post_ride_end_confirm))
        .route("/api/ride/home", post(handlers::post_ride_home))
        .route("/api/destination/pick", post(handlers::post_destination_pick))
        .route("/api/destination/start", post(handlers::post_destination_start))
        .route(
            "/api/exercise/duration",
            post(handlers::post_exercise_duration).delete(handlers::delete_exercise_duration),
        )
        .route(
            "/api/timers/{target}/{action}",
            post(handlers::post_timer_action),
        )
        .with_state(state)
}
