use crate::map::{MapError, MockMap, SelectedLocation, TripEstimate, estimate_trip};
use crate::timer::Timer;
use rand::Rng;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error, PartialEq)]
pub enum DestinationError {
    #[error("no destination selected")]
    NoLocationSelected,
    #[error("trip has not been started")]
    TripNotStarted,
    #[error(transparent)]
    Map(#[from] MapError),
}

/// State of one visit to the destination screen.
#[derive(Debug, Clone)]
pub struct DestinationMode {
    selected: Option<SelectedLocation>,
    estimate: Option<TripEstimate>,
    trip_started: bool,
    timer: Timer,
}

impl DestinationMode {
    pub fn new() -> Self {
        Self {
            selected: None,
            estimate: None,
            trip_started: false,
            timer: Timer::count_up(),
        }
    }

    pub fn selected(&self) -> Option<&SelectedLocation> {
        self.selected.as_ref()
    }

    pub fn estimate(&self) -> Option<&TripEstimate> {
        self.estimate.as_ref()
    }

    pub fn trip_started(&self) -> bool {
        self.trip_started
    }

    pub fn timer(&self) -> &Timer {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut Timer {
        &mut self.timer
    }

    /// Replace the destination with a new map click and fabricate a fresh
    /// estimate for it.
    pub fn pick<R: Rng + ?Sized>(
        &mut self,
        map: &MockMap,
        pixel_x: f64,
        pixel_y: f64,
        width: f64,
        height: f64,
        rng: &mut R,
    ) -> Result<&TripEstimate, DestinationError> {
        let location = map.pick_location(pixel_x, pixel_y, width, height)?;
        let estimate = estimate_trip(rng);
        info!(
            lat = location.lat,
            lng = location.lng,
            distance_km = estimate.distance_km,
            estimated_minutes = estimate.estimated_minutes,
            "Destination selected"
        );
        self.selected = Some(location);
        Ok(&*self.estimate.insert(estimate))
    }

    /// Reveals the trip timer; it still has to be started separately.
    pub fn start_trip(&mut self) -> Result<(), DestinationError> {
        if self.selected.is_none() {
            return Err(DestinationError::NoLocationSelected);
        }
        self.trip_started = true;
        Ok(())
    }
}

impl Default for DestinationMode {
    fn default() -> Self {
        Self::new()
    }
}
