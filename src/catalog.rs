use serde::Serialize;

pub type ScooterId = u32;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scooter {
    pub id: ScooterId,
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
    /// 0..=100
    pub battery_percent: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatteryLevel {
    High,
    Medium,
    Low,
}

impl Scooter {
    pub fn battery_level(&self) -> BatteryLevel {
        match self.battery_percent {
            70.. => BatteryLevel::High,
            40..=69 => BatteryLevel::Medium,
            _ => BatteryLevel::Low,
        }
    }
}

pub const SCOOTERS: [Scooter; 5] = [
    Scooter {
        id: 1,
        name: "دراجة A",
        lat: 24.7136,
        lng: 46.6753,
        battery_percent: 85,
    },
    Scooter {
        id: 2,
        name: "دراجة B",
        lat: 24.7140,
        lng: 46.6758,
        battery_percent: 60,
    },
    Scooter {
        id: 3,
        name: "دراجة C",
        lat: 24.7132,
        lng: 46.6748,
        battery_percent: 40,
    },
    Scooter {
        id: 4,
        name: "دراجة D",
        lat: 24.7145,
        lng: 46.6760,
        battery_percent: 95,
    },
    Scooter {
        id: 5,
        name: "دراجة E",
        lat: 24.7128,
        lng: 46.6745,
        battery_percent: 70,
    },
];

pub fn all() -> &'static [Scooter] {
    &SCOOTERS
}

/// Every scooter in the catalog is selectable; no availability filtering.
pub fn find(id: ScooterId) -> Option<&'static Scooter> {
    SCOOTERS.iter().find(|scooter| scooter.id == id)
}
