use crate::timer::Timer;
use thiserror::Error;
use tracing::info;

pub const DEFAULT_DURATIONS_MINUTES: [u32; 3] = [90, 60, 30];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExerciseError {
    #[error("{0} minutes is not one of the offered durations")]
    UnknownDuration(u32),
    #[error("no exercise duration selected")]
    NoDurationSelected,
}

/// Countdown workout: pick one of the preset durations, then run it down.
#[derive(Debug, Clone)]
pub struct ExerciseMode {
    presets: Vec<u32>,
    selected_minutes: Option<u32>,
    timer: Option<Timer>,
}

impl ExerciseMode {
    pub fn new(presets: Vec<u32>) -> Self {
        Self {
            presets,
            selected_minutes: None,
            timer: None,
        }
    }

    pub fn presets(&self) -> &[u32] {
        &self.presets
    }

    pub fn selected_minutes(&self) -> Option<u32> {
        self.selected_minutes
    }

    pub fn timer(&self) -> Option<&Timer> {
        self.timer.as_ref()
    }

    pub fn timer_mut(&mut self) -> Result<&mut Timer, ExerciseError> {
        self.timer.as_mut().ok_or(ExerciseError::NoDurationSelected)
    }

    pub fn is_complete(&self) -> bool {
        self.timer.as_ref().is_some_and(Timer::is_complete)
    }

    pub fn select_duration(&mut self, minutes: u32) -> Result<&Timer, ExerciseError> {
        if !self.presets.contains(&minutes) {
            return Err(ExerciseError::UnknownDuration(minutes));
        }
        info!(minutes, "Exercise duration selected");
        self.selected_minutes = Some(minutes);
        Ok(&*self.timer.insert(Timer::countdown(u64::from(minutes) * 60)))
    }

    /// Back to the preset picker; the countdown is discarded.
    pub fn clear_selection(&mut self) {
        self.selected_minutes = None;
        self.timer = None;
    }
}

impl Default for ExerciseMode {
    fn default() -> Self {
        Self::new(DEFAULT_DURATIONS_MINUTES.to_vec())
    }
}
