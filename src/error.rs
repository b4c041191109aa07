use crate::modes::{DestinationError, ExerciseError};
use crate::navigator::{NavigationError, Screen};
use crate::ride::RideError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Navigation(#[from] NavigationError),
    #[error(transparent)]
    Ride(#[from] RideError),
    #[error(transparent)]
    Destination(#[from] DestinationError),
    #[error(transparent)]
    Exercise(#[from] ExerciseError),
    #[error("no ride in progress")]
    NoRide,
    #[error("the {0:?} screen is not active")]
    ScreenInactive(Screen),
    #[error("state lock poisoned")]
    StateLock,
}
