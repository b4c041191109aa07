//! Count-up / countdown clock driven by an external one-second tick.
//!
//! The timer holds no tick source of its own; whoever owns it schedules
//! [`Timer::tick`] while [`Timer::is_running`] is true and tears that
//! schedule down on pause, reset or completion.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerMode {
    Up,
    Down,
}

/// Which control a view should offer for the current timer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerControl {
    Start,
    Resume,
    Pause,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Timer was not running; nothing changed.
    Idle,
    Advanced,
    /// Countdown hit zero on this tick and stopped.
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timer {
    mode: TimerMode,
    initial_seconds: u64,
    seconds: u64,
    is_running: bool,
}

impl Timer {
    pub fn new(mode: TimerMode, initial_seconds: u64) -> Self {
        Self {
            mode,
            initial_seconds,
            seconds: initial_seconds,
            is_running: false,
        }
    }

    pub fn count_up() -> Self {
        Self::new(TimerMode::Up, 0)
    }

    pub fn countdown(seconds: u64) -> Self {
        Self::new(TimerMode::Down, seconds)
    }

    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    pub fn seconds(&self) -> u64 {
        self.seconds
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn is_complete(&self) -> bool {
        self.mode == TimerMode::Down && self.seconds == 0
    }

    /// Start from rest or resume from a pause. Returns whether the timer is
    /// now running; a finished countdown stays stopped until reset.
    pub fn start_or_resume(&mut self) -> bool {
        if self.is_complete() {
            return false;
        }
        self.is_running = true;
        true
    }

    pub fn start(&mut self) -> bool {
        self.start_or_resume()
    }

    pub fn resume(&mut self) -> bool {
        self.start_or_resume()
    }

    pub fn pause(&mut self) {
        self.is_running = false;
    }

    pub fn reset(&mut self) {
        self.is_running = false;
        self.seconds = self.initial_seconds;
    }

    pub fn tick(&mut self) -> TickOutcome {
        if !self.is_running {
            return TickOutcome::Idle;
        }
        match self.mode {
            TimerMode::Up => {
                self.seconds = self.seconds.saturating_add(1);
                TickOutcome::Advanced
            }
            TimerMode::Down => {
                self.seconds = self.seconds.saturating_sub(1);
                if self.seconds == 0 {
                    self.is_running = false;
                    TickOutcome::Completed
                } else {
                    TickOutcome::Advanced
                }
            }
        }
    }

    pub fn control(&self) -> Option<TimerControl> {
        if self.is_running {
            Some(TimerControl::Pause)
        } else if self.is_complete() {
            None
        } else if self.seconds == self.initial_seconds {
            Some(TimerControl::Start)
        } else {
            Some(TimerControl::Resume)
        }
    }

    pub fn clock(&self) -> String {
        format_clock(self.seconds)
    }
}

/// `mm:ss`, zero padded; minutes are not wrapped into hours.
pub fn format_clock(total_seconds: u64) -> String {
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}
