use crate::catalog::{BatteryLevel, Scooter, ScooterId};
use crate::fare::FareBreakdown;
use crate::map::{SelectedLocation, TripEstimate};
use crate::modes::{DestinationMode, ExerciseMode};
use crate::navigator::Screen;
use crate::ride::{RideFlow, RideStep};
use crate::state::AppState;
use crate::timer::{Timer, TimerControl, TimerMode, format_clock};
use serde::Serialize;

#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct HealthSuccessResponse {
    pub status: HealthStatus,
    pub screen: Screen,
    pub timestamp: String,
}

#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidAction,
    NothingSelected,
    NotFound,
    TransitionRejected,
    ScreenInactive,
    InvalidInput,
    InternalError,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ErrorResponse {
    pub error_code: ErrorCode,
    pub error_message: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct ScootersResponse {
    pub scooters: Vec<ScooterView>,
    pub timestamp: String,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct ScooterView {
    pub id: ScooterId,
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
    pub battery_percent: u8,
    pub battery_level: BatteryLevel,
}

impl From<&Scooter> for ScooterView {
    fn from(scooter: &Scooter) -> Self {
        Self {
            id: scooter.id,
            name: scooter.name,
            lat: scooter.lat,
            lng: scooter.lng,
            battery_percent: scooter.battery_percent,
            battery_level: scooter.battery_level(),
        }
    }
}

/// Full view of the app, returned by `GET /api/state` and by every action.
#[derive(Debug, Serialize)]
pub struct StateResponse {
    pub screen: Screen,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ride: Option<RideView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<DestinationView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exercise: Option<ExerciseView>,
    pub timestamp: String,
}

impl StateResponse {
    pub fn from_state(state: &AppState, timestamp: String) -> Self {
        Self {
            screen: state.current_screen(),
            ride: state.ride().map(RideView::from),
            destination: state.destination().map(DestinationView::from),
            exercise: state.exercise().map(ExerciseView::from),
            timestamp,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RideView {
    pub step: RideStep,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scooter: Option<ScooterView>,
    pub is_active: bool,
    pub elapsed_seconds: u64,
    pub elapsed_clock: String,
    /// While riding: free minutes left, or billable minutes once past them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub free_minutes_remaining: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_minutes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fare: Option<FareBreakdown>,
}

impl From<&RideFlow> for RideView {
    fn from(ride: &RideFlow) -> Self {
        let elapsed_seconds = ride.elapsed_seconds();
        let (free_minutes_remaining, extra_minutes) = if ride.step() == RideStep::Riding {
            let fare = ride.fare();
            if fare.within_free_time() {
                (Some(fare.free_minutes_remaining()), None)
            } else {
                (None, Some(fare.extra_minutes))
            }
        } else {
            (None, None)
        };

        Self {
            step: ride.step(),
            scooter: ride.selected_scooter().map(ScooterView::from),
            is_active: ride.is_ride_active(),
            elapsed_seconds,
            elapsed_clock: format_clock(elapsed_seconds),
            free_minutes_remaining,
            extra_minutes,
            fare: ride.displayed_fare(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TimerView {
    pub mode: TimerMode,
    pub seconds: u64,
    pub clock: String,
    pub is_running: bool,
    pub is_complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub control: Option<TimerControl>,
}

impl From<&Timer> for TimerView {
    fn from(timer: &Timer) -> Self {
        Self {
            mode: timer.mode(),
            seconds: timer.seconds(),
            clock: timer.clock(),
            is_running: timer.is_running(),
            is_complete: timer.is_complete(),
            control: timer.control(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DestinationView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<SelectedLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimate: Option<TripEstimate>,
    pub trip_started: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timer: Option<TimerView>,
}

impl From<&DestinationMode> for DestinationView {
    fn from(mode: &DestinationMode) -> Self {
        Self {
            location: mode.selected().copied(),
            estimate: mode.estimate().cloned(),
            trip_started: mode.trip_started(),
            timer: mode.trip_started().then(|| TimerView::from(mode.timer())),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ExerciseView {
    pub durations_minutes: Vec<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timer: Option<TimerView>,
}

impl From<&ExerciseMode> for ExerciseView {
    fn from(mode: &ExerciseMode) -> Self {
        Self {
            durations_minutes: mode.presets().to_vec(),
            selected_minutes: mode.selected_minutes(),
            timer: mode.timer().map(TimerView::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fare::FarePolicy;
    use serde_json::json;
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn error_response_uses_screaming_snake_case_code() {
        let response = ErrorResponse {
            error_code: ErrorCode::TransitionRejected,
            error_message: "nope".to_string(),
            timestamp: "2026-01-11T12:32:00Z".to_string(),
        };

        let value = serde_json::to_value(response).expect("serialize error response");
        assert_eq!(
            value,
            json!({
                "error_code": "TRANSITION_REJECTED",
                "error_message": "nope",
                "timestamp": "2026-01-11T12:32:00Z"
            })
        );
    }

    #[test]
    fn riding_view_reports_free_time_left() {
        let mut ride = RideFlow::new(FarePolicy::default());
        ride.find_nearest().expect("select step");
        ride.select_scooter(1).expect("scooter");
        ride.confirm_selection().expect("qr");
        ride.complete_qr_scan().expect("payment");
        ride.confirm_payment(UNIX_EPOCH).expect("riding");
        ride.tick(UNIX_EPOCH + Duration::from_secs(125));

        let value = serde_json::to_value(RideView::from(&ride)).expect("serialize ride view");

        assert_eq!(value["step"], json!("riding"));
        assert_eq!(value["elapsed_clock"], json!("02:05"));
        assert_eq!(value["free_minutes_remaining"], json!(2));
        assert_eq!(value.get("extra_minutes"), None);
        assert_eq!(value.get("fare"), None);
        assert_eq!(value["scooter"]["battery_level"], json!("high"));
    }

    fn riding_for(seconds: u64) -> RideFlow {
        let mut ride = RideFlow::new(FarePolicy::default());
        ride.find_nearest().expect("select step");
        ride.select_scooter(2).expect("scooter");
        ride.confirm_selection().expect("qr");
        ride.complete_qr_scan().expect("payment");
        ride.confirm_payment(UNIX_EPOCH).expect("riding");
        ride.tick(UNIX_EPOCH + Duration::from_secs(seconds));
        ride
    }

    #[test]
    fn riding_view_reports_billable_minutes_past_free_time() {
        let value =
            serde_json::to_value(RideView::from(&riding_for(421))).expect("serialize ride view");

        assert_eq!(value["elapsed_clock"], json!("07:01"));
        assert_eq!(value["extra_minutes"], json!(3));
        assert_eq!(value.get("free_minutes_remaining"), None);
        assert_eq!(value.get("fare"), None);
    }

    #[test]
    fn riding_view_at_exactly_five_minutes_has_no_free_time_left() {
        let value =
            serde_json::to_value(RideView::from(&riding_for(300))).expect("serialize ride view");

        assert_eq!(value["free_minutes_remaining"], json!(0));
        assert_eq!(value.get("extra_minutes"), None);
    }

    #[test]
    fn ended_ride_view_includes_fare() {
        let mut ride = RideFlow::new(FarePolicy::default());
        ride.find_nearest().expect("select step");
        ride.select_scooter(3).expect("scooter");
        ride.confirm_selection().expect("qr");
        ride.complete_qr_scan().expect("payment");
        ride.confirm_payment(UNIX_EPOCH).expect("riding");
        ride.tick(UNIX_EPOCH + Duration::from_secs(301));
        ride.end_ride().expect("end ride");

        let value = serde_json::to_value(RideView::from(&ride)).expect("serialize ride view");

        assert_eq!(value["step"], json!("endRide"));
        assert_eq!(
            value["fare"],
            json!({
                "initial_fee": 5,
                "free_minutes": 5,
                "used_minutes": 6,
                "extra_minutes": 1,
                "extra_cost": 1,
                "total_cost": 6
            })
        );
    }

    #[test]
    fn timer_view_shows_start_control_at_rest() {
        let value =
            serde_json::to_value(TimerView::from(&Timer::countdown(60))).expect("serialize timer");

        assert_eq!(
            value,
            json!({
                "mode": "down",
                "seconds": 60,
                "clock": "01:00",
                "is_running": false,
                "is_complete": false,
                "control": "start"
            })
        );
    }
}
