//! Fake map used by destination mode: click positions become coordinates
//! around a fixed reference point, and trips get fabricated estimates.

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_REFERENCE: GeoPoint = GeoPoint {
    lat: 24.7136,
    lng: 46.6753,
};
pub const DEFAULT_SPAN_DEGREES: f64 = 0.1;

pub const MIN_TRIP_KM: f64 = 2.0;
pub const MAX_TRIP_KM: f64 = 12.0;
pub const MINUTES_PER_KM: f64 = 4.0;

pub const DIRECTIONS: [&str; 7] = [
    "اتجه شمالاً على شارع الملك فهد",
    "استمر لمدة 500 متر",
    "انعطف يميناً عند إشارة المرور",
    "اتجه شرقاً على طريق العليا",
    "استمر لمدة 1.2 كيلومتر",
    "انعطف يساراً عند الدوار",
    "واصل السير حتى تصل إلى وجهتك",
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SelectedLocation {
    pub lat: f64,
    pub lng: f64,
    pub pixel_x: f64,
    pub pixel_y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripEstimate {
    pub distance_km: f64,
    pub estimated_minutes: u32,
    pub directions: Vec<&'static str>,
}

#[derive(Debug, Error, PartialEq)]
pub enum MapError {
    #[error("map area must have a positive size, got {width}x{height}")]
    DegenerateArea { width: f64, height: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MockMap {
    reference: GeoPoint,
    span_degrees: f64,
}

impl MockMap {
    pub fn new(reference: GeoPoint, span_degrees: f64) -> Self {
        Self {
            reference,
            span_degrees,
        }
    }

    /// Linear transform from a click inside a `width` x `height` area to a
    /// coordinate; the area centre maps onto the reference point. Clicks
    /// outside the area are extrapolated, not clamped.
    pub fn pick_location(
        &self,
        pixel_x: f64,
        pixel_y: f64,
        width: f64,
        height: f64,
    ) -> Result<SelectedLocation, MapError> {
        if !(width > 0.0 && height > 0.0) {
            return Err(MapError::DegenerateArea { width, height });
        }
        let lat = self.reference.lat + (pixel_y / height - 0.5) * self.span_degrees;
        let lng = self.reference.lng + (pixel_x / width - 0.5) * self.span_degrees;

        Ok(SelectedLocation {
            lat: round_to(lat, 6),
            lng: round_to(lng, 6),
            pixel_x,
            pixel_y,
        })
    }
}

impl Default for MockMap {
    fn default() -> Self {
        Self::new(DEFAULT_REFERENCE, DEFAULT_SPAN_DEGREES)
    }
}

/// Mock routing: distance is random, not derived from the picked point.
pub fn estimate_trip<R: Rng + ?Sized>(rng: &mut R) -> TripEstimate {
    let distance_km = round_to(rng.gen_range(MIN_TRIP_KM..MAX_TRIP_KM), 2);
    TripEstimate {
        distance_km,
        estimated_minutes: (distance_km * MINUTES_PER_KM).round() as u32,
        directions: DIRECTIONS.to_vec(),
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
