//! Trip modes offered once a ride is under way.

pub mod destination;
pub mod exercise;

pub use destination::{DestinationError, DestinationMode};
pub use exercise::{DEFAULT_DURATIONS_MINUTES, ExerciseError, ExerciseMode};
