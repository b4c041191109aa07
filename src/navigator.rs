use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Screen {
    ScooterSelect,
    Welcome,
    Mode,
    Destination,
    Exercise,
}

impl Screen {
    pub const ALL: [Screen; 5] = [
        Screen::ScooterSelect,
        Screen::Welcome,
        Screen::Mode,
        Screen::Destination,
        Screen::Exercise,
    ];
}

/// How strictly `go_to` checks requested screen changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionPolicy {
    /// Any screen is reachable from any other.
    #[default]
    Open,
    /// Only the edges in [`allowed_targets`] are accepted.
    Guarded,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NavigationError {
    #[error("transition from {from:?} to {to:?} is not allowed")]
    Rejected { from: Screen, to: Screen },
}

/// Edges used by the guarded policy.
pub fn allowed_targets(from: Screen) -> &'static [Screen] {
    match from {
        Screen::ScooterSelect => &[Screen::Welcome, Screen::Mode],
        Screen::Welcome => &[Screen::Mode, Screen::ScooterSelect],
        Screen::Mode => &[
            Screen::Welcome,
            Screen::Destination,
            Screen::Exercise,
            Screen::ScooterSelect,
        ],
        Screen::Destination => &[Screen::Mode, Screen::ScooterSelect],
        Screen::Exercise => &[Screen::Mode, Screen::ScooterSelect],
    }
}

#[derive(Debug, Clone)]
pub struct Navigator {
    current: Screen,
    policy: TransitionPolicy,
}

impl Navigator {
    pub fn new(policy: TransitionPolicy) -> Self {
        Self {
            current: Screen::ScooterSelect,
            policy,
        }
    }

    pub fn current(&self) -> Screen {
        self.current
    }

    pub fn policy(&self) -> TransitionPolicy {
        self.policy
    }

    pub fn can_go_to(&self, to: Screen) -> bool {
        match self.policy {
            TransitionPolicy::Open => true,
            TransitionPolicy::Guarded => {
                to == self.current || allowed_targets(self.current).contains(&to)
            }
        }
    }

    /// Make `to` the active screen. Returns the screen that was replaced.
    pub fn go_to(&mut self, to: Screen) -> Result<Screen, NavigationError> {
        let from = self.current;
        if !self.can_go_to(to) {
            warn!(from = ?from, to = ?to, "Screen transition rejected");
            return Err(NavigationError::Rejected { from, to });
        }
        self.current = to;
        debug!(from = ?from, to = ?to, "Screen changed");
        Ok(from)
    }
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new(TransitionPolicy::Open)
    }
}
