use crate::clock::Clock;
use crate::config::Settings;
use crate::error::AppError;
use crate::map::TripEstimate;
use crate::modes::{DestinationError, DestinationMode, ExerciseMode};
use crate::navigator::{Navigator, Screen};
use crate::ride::RideFlow;
use crate::ticker::{TaskKind, TaskSet, TickControl};
use crate::timer::{TickOutcome, Timer};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use std::time::SystemTime;
use tokio::sync::watch;
use tracing::{debug, info};

pub type SharedState = Arc<RwLock<AppState>>;

/// Screen that owns a ticking [`Timer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerTarget {
    Destination,
    Exercise,
}

impl TimerTarget {
    pub fn task_kind(self) -> TaskKind {
        match self {
            TimerTarget::Destination => TaskKind::DestinationTimer,
            TimerTarget::Exercise => TaskKind::ExerciseTimer,
        }
    }
}

/// Everything one app session holds. Screen-local state lives only while
/// its screen is active, together with the tasks ticking it.
#[derive(Debug)]
pub struct AppState {
    settings: Settings,
    navigator: Navigator,
    screen_tx: watch::Sender<Screen>,
    ride: Option<RideFlow>,
    destination: Option<DestinationMode>,
    exercise: Option<ExerciseMode>,
    rng: ChaCha8Rng,
    clock: Arc<dyn Clock>,
    tasks: TaskSet,
}

impl AppState {
    pub fn new(settings: Settings, clock: Arc<dyn Clock>) -> Self {
        let navigator = Navigator::new(settings.transition_policy);
        let (screen_tx, _screen_rx) = watch::channel(navigator.current());
        let rng = match settings.rng_seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self {
            ride: Some(RideFlow::new(settings.fare)),
            settings,
            navigator,
            screen_tx,
            destination: None,
            exercise: None,
            rng,
            clock,
            tasks: TaskSet::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn now(&self) -> SystemTime {
        self.clock.now()
    }

    pub fn current_screen(&self) -> Screen {
        self.navigator.current()
    }

    pub fn subscribe_screen(&self) -> watch::Receiver<Screen> {
        self.screen_tx.subscribe()
    }

    /// Switch screens, tearing down the state and tasks of the screen left
    /// behind. Returns the previous screen.
    pub fn set_screen(&mut self, to: Screen) -> Result<Screen, AppError> {
        let from = self.navigator.go_to(to)?;
        if from != to {
            self.leave(from);
            self.enter(to);
        }
        self.screen_tx.send_replace(to);
        info!(from = ?from, to = ?to, "Screen changed");
        Ok(from)
    }

    fn leave(&mut self, screen: Screen) {
        match screen {
            Screen::Destination => {
                self.tasks.cancel(TaskKind::DestinationTimer);
                self.destination = None;
            }
            Screen::Exercise => {
                self.tasks.cancel(TaskKind::ExerciseTimer);
                self.exercise = None;
            }
            Screen::ScooterSelect | Screen::Welcome | Screen::Mode => {}
        }
    }

    fn enter(&mut self, screen: Screen) {
        match screen {
            Screen::Destination => self.destination = Some(DestinationMode::new()),
            Screen::Exercise => {
                self.exercise = Some(ExerciseMode::new(self.settings.exercise_durations.clone()))
            }
            Screen::ScooterSelect => {
                if self.ride.is_none() {
                    debug!("Starting a new ride flow");
                    self.ride = Some(RideFlow::new(self.settings.fare));
                }
            }
            Screen::Welcome | Screen::Mode => {}
        }
    }

    pub fn ride(&self) -> Option<&RideFlow> {
        self.ride.as_ref()
    }

    /// Ride flow for user actions, which are only accepted while the
    /// scooter screen is showing.
    pub fn active_ride_mut(&mut self) -> Result<&mut RideFlow, AppError> {
        if self.navigator.current() != Screen::ScooterSelect {
            return Err(AppError::ScreenInactive(Screen::ScooterSelect));
        }
        self.ride.as_mut().ok_or(AppError::NoRide)
    }

    /// Ride flow for background jobs, regardless of the visible screen.
    pub fn ride_mut(&mut self) -> Option<&mut RideFlow> {
        self.ride.as_mut()
    }

    /// Drop the finished flow and every task tied to it.
    pub fn discard_ride(&mut self) {
        self.tasks.cancel(TaskKind::QrScan);
        self.tasks.cancel(TaskKind::RideClock);
        self.ride = None;
    }

    pub fn destination(&self) -> Option<&DestinationMode> {
        self.destination.as_ref()
    }

    pub fn destination_mut(&mut self) -> Result<&mut DestinationMode, AppError> {
        self.destination
            .as_mut()
            .ok_or(AppError::ScreenInactive(Screen::Destination))
    }

    pub fn pick_destination(
        &mut self,
        pixel_x: f64,
        pixel_y: f64,
        width: f64,
        height: f64,
    ) -> Result<TripEstimate, AppError> {
        let map = self.settings.map;
        let destination = self
            .destination
            .as_mut()
            .ok_or(AppError::ScreenInactive(Screen::Destination))?;
        let estimate = destination.pick(&map, pixel_x, pixel_y, width, height, &mut self.rng)?;
        Ok(estimate.clone())
    }

    pub fn exercise(&self) -> Option<&ExerciseMode> {
        self.exercise.as_ref()
    }

    pub fn exercise_mut(&mut self) -> Result<&mut ExerciseMode, AppError> {
        self.exercise
            .as_mut()
            .ok_or(AppError::ScreenInactive(Screen::Exercise))
    }

    /// The timer a user control acts on. The trip timer only exists once the
    /// trip has been started.
    pub fn timer_mut(&mut self, target: TimerTarget) -> Result<&mut Timer, AppError> {
        match target {
            TimerTarget::Destination => {
                let destination = self.destination_mut()?;
                if !destination.trip_started() {
                    return Err(DestinationError::TripNotStarted.into());
                }
                Ok(destination.timer_mut())
            }
            TimerTarget::Exercise => Ok(self.exercise_mut()?.timer_mut()?),
        }
    }

    pub fn tasks(&self) -> &TaskSet {
        &self.tasks
    }

    pub fn tasks_mut(&mut self) -> &mut TaskSet {
        &mut self.tasks
    }

    pub fn tick_ride(&mut self) -> TickControl {
        let now = self.clock.now();
        if self.ride.as_mut().is_some_and(|ride| ride.tick(now)) {
            TickControl::Continue
        } else {
            TickControl::Stop
        }
    }

    pub fn tick_timer(&mut self, target: TimerTarget) -> TickControl {
        let timer = match target {
            TimerTarget::Destination => self.destination.as_mut().map(DestinationMode::timer_mut),
            TimerTarget::Exercise => self
                .exercise
                .as_mut()
                .and_then(|exercise| exercise.timer_mut().ok()),
        };
        let Some(timer) = timer else {
            return TickControl::Stop;
        };
        match timer.tick() {
            TickOutcome::Advanced => TickControl::Continue,
            TickOutcome::Completed => {
                info!(target = ?target, "Countdown finished");
                TickControl::Stop
            }
            TickOutcome::Idle => TickControl::Stop,
        }
    }
}
