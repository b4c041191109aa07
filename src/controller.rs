//! Named transitions on the shared app state.
//!
//! Every user action goes through one of these functions. They hold the
//! state lock only for the transition itself and own the lifecycle of the
//! background tasks the transition implies: the QR scan delay, the ride
//! clock and the trip/exercise timer ticks.

use crate::error::AppError;
use crate::fare::FareBreakdown;
use crate::map::TripEstimate;
use crate::navigator::Screen;
use crate::state::{AppState, SharedState, TimerTarget};
use crate::ticker::{TaskId, TaskKind, TickControl, spawn_delayed, spawn_repeating};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock, RwLockWriteGuard, Weak};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerAction {
    Start,
    Pause,
    Resume,
    Reset,
}

fn write(state: &SharedState) -> Result<RwLockWriteGuard<'_, AppState>, AppError> {
    state.write().map_err(|_| AppError::StateLock)
}

pub fn navigate(state: &SharedState, to: Screen) -> Result<Screen, AppError> {
    write(state)?.set_screen(to)
}

pub fn find_scooter(state: &SharedState) -> Result<(), AppError> {
    write(state)?.active_ride_mut()?.find_nearest()?;
    Ok(())
}

pub fn select_scooter(state: &SharedState, scooter_id: u32) -> Result<(), AppError> {
    write(state)?.active_ride_mut()?.select_scooter(scooter_id)?;
    Ok(())
}

/// select → qr, then payment once the simulated scan delay has passed.
pub fn confirm_selection(state: &SharedState) -> Result<(), AppError> {
    let mut guard = write(state)?;
    guard.active_ride_mut()?.confirm_selection()?;

    let delay = guard.settings().qr_scan_delay;
    let id = guard.tasks_mut().next_id();
    let weak = Arc::downgrade(state);
    let ticker = spawn_delayed(delay, move || complete_qr_scan(&weak, id));
    guard.tasks_mut().replace(TaskKind::QrScan, id, ticker);
    debug!(delay_ms = delay.as_millis(), "QR scan scheduled");
    Ok(())
}

fn complete_qr_scan(state: &Weak<RwLock<AppState>>, id: TaskId) {
    let Some(state) = state.upgrade() else {
        return;
    };
    let Ok(mut guard) = state.write() else {
        warn!("State lock poisoned while completing QR scan");
        return;
    };
    if !guard.tasks().is_current(TaskKind::QrScan, id) {
        debug!("Stale QR scan ignored");
        return;
    }
    match guard.ride_mut().map(|ride| ride.complete_qr_scan()) {
        Some(Ok(())) => info!("QR scan completed"),
        Some(Err(err)) => debug!(error = %err, "QR scan completion ignored"),
        None => debug!("QR scan fired without a ride flow"),
    }
}

/// payment → riding. The ride clock starts and the navigator moves on to
/// trip mode selection while the ride keeps running.
pub fn confirm_payment(state: &SharedState) -> Result<(), AppError> {
    let mut guard = write(state)?;
    let now = guard.now();
    guard.active_ride_mut()?.confirm_payment(now)?;

    let interval = guard.settings().tick_interval;
    let id = guard.tasks_mut().next_id();
    let weak = Arc::downgrade(state);
    let ticker = spawn_repeating(interval, move || ride_tick(&weak, id));
    guard.tasks_mut().replace(TaskKind::RideClock, id, ticker);

    guard.set_screen(Screen::Mode)?;
    Ok(())
}

fn ride_tick(state: &Weak<RwLock<AppState>>, id: TaskId) -> TickControl {
    let Some(state) = state.upgrade() else {
        return TickControl::Stop;
    };
    match state.write() {
        Ok(guard) if !guard.tasks().is_current(TaskKind::RideClock, id) => TickControl::Stop,
        Ok(mut guard) => guard.tick_ride(),
        Err(_) => {
            warn!("State lock poisoned during ride tick");
            TickControl::Stop
        }
    }
}

/// riding → endRide; the ride clock is torn down and elapsed time frozen.
pub fn end_ride(state: &SharedState) -> Result<FareBreakdown, AppError> {
    let mut guard = write(state)?;
    let fare = guard.active_ride_mut()?.end_ride()?;
    guard.tasks_mut().cancel(TaskKind::RideClock);
    Ok(fare)
}

pub fn confirm_end_ride(state: &SharedState) -> Result<FareBreakdown, AppError> {
    Ok(write(state)?.active_ride_mut()?.confirm_end_ride()?)
}

/// Leave the receipt: the flow is discarded and the welcome screen shown.
pub fn return_home(state: &SharedState) -> Result<FareBreakdown, AppError> {
    let mut guard = write(state)?;
    let fare = guard.active_ride_mut()?.finish()?;
    guard.discard_ride();
    guard.set_screen(Screen::Welcome)?;
    Ok(fare)
}

pub fn pick_destination(
    state: &SharedState,
    pixel_x: f64,
    pixel_y: f64,
    width: f64,
    height: f64,
) -> Result<TripEstimate, AppError> {
    write(state)?.pick_destination(pixel_x, pixel_y, width, height)
}

pub fn start_trip(state: &SharedState) -> Result<(), AppError> {
    write(state)?.destination_mut()?.start_trip()?;
    Ok(())
}

/// Arm the exercise countdown; a previous countdown and its ticks are dropped.
pub fn select_exercise_duration(state: &SharedState, minutes: u32) -> Result<(), AppError> {
    let mut guard = write(state)?;
    guard.exercise_mut()?.select_duration(minutes)?;
    guard.tasks_mut().cancel(TaskKind::ExerciseTimer);
    Ok(())
}

pub fn clear_exercise_duration(state: &SharedState) -> Result<(), AppError> {
    let mut guard = write(state)?;
    guard.exercise_mut()?.clear_selection();
    guard.tasks_mut().cancel(TaskKind::ExerciseTimer);
    Ok(())
}

/// Drive a screen timer. Start and resume share one path; a tick task runs
/// exactly while the timer is running.
pub fn timer_action(
    state: &SharedState,
    target: TimerTarget,
    action: TimerAction,
) -> Result<(), AppError> {
    let mut guard = write(state)?;
    let timer = guard.timer_mut(target)?;
    let kind = target.task_kind();

    match action {
        TimerAction::Start | TimerAction::Resume => {
            if !timer.start_or_resume() {
                debug!(target = ?target, "Timer already finished, start ignored");
                return Ok(());
            }
            if guard.tasks().is_active(kind) {
                return Ok(());
            }
            let interval = guard.settings().tick_interval;
            let id = guard.tasks_mut().next_id();
            let weak = Arc::downgrade(state);
            let ticker = spawn_repeating(interval, move || timer_tick(&weak, target, id));
            guard.tasks_mut().replace(kind, id, ticker);
        }
        TimerAction::Pause => {
            timer.pause();
            guard.tasks_mut().cancel(kind);
        }
        TimerAction::Reset => {
            timer.reset();
            guard.tasks_mut().cancel(kind);
        }
    }
    debug!(target = ?target, action = ?action, "Timer control applied");
    Ok(())
}

fn timer_tick(state: &Weak<RwLock<AppState>>, target: TimerTarget, id: TaskId) -> TickControl {
    let Some(state) = state.upgrade() else {
        return TickControl::Stop;
    };
    match state.write() {
        Ok(guard) if !guard.tasks().is_current(target.task_kind(), id) => {
            debug!(target = ?target, "Stale timer tick ignored");
            TickControl::Stop
        }
        Ok(mut guard) => guard.tick_timer(target),
        Err(_) => {
            warn!("State lock poisoned during timer tick");
            TickControl::Stop
        }
    }
}
