//! Rental flow: scooter choice, simulated QR scan and payment, the ride
//! itself and the closing receipt.
//!
//! Steps only move forward. A flow that reached its receipt is discarded by
//! the owner and a fresh one starts at [`RideStep::Welcome`].

use crate::catalog::{self, Scooter, ScooterId};
use crate::fare::{FareBreakdown, FarePolicy, compute_fare};
use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RideStep {
    Welcome,
    Select,
    Qr,
    Payment,
    Riding,
    EndRide,
    Receipt,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RideError {
    #[error("cannot {action} during the {step:?} step")]
    InvalidStep {
        action: &'static str,
        step: RideStep,
    },
    #[error("no scooter selected")]
    NoScooterSelected,
    #[error("unknown scooter id: {0}")]
    UnknownScooter(ScooterId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RideSession {
    started_at: SystemTime,
    elapsed_seconds: u64,
    is_active: bool,
}

impl RideSession {
    pub fn start(now: SystemTime) -> Self {
        Self {
            started_at: now,
            elapsed_seconds: 0,
            is_active: true,
        }
    }

    pub fn started_at(&self) -> SystemTime {
        self.started_at
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Recompute elapsed from the start timestamp instead of counting ticks,
    /// so late or skipped ticks never accumulate drift. No-op once frozen.
    pub fn tick(&mut self, now: SystemTime) -> bool {
        if !self.is_active {
            return false;
        }
        // A clock stepping backwards keeps the last value rather than rewinding.
        if let Ok(elapsed) = now.duration_since(self.started_at) {
            self.elapsed_seconds = self.elapsed_seconds.max(elapsed.as_secs());
        }
        true
    }

    pub fn freeze(&mut self) {
        self.is_active = false;
    }
}

#[derive(Debug, Clone)]
pub struct RideFlow {
    step: RideStep,
    selected: Option<&'static Scooter>,
    session: Option<RideSession>,
    fare_policy: FarePolicy,
}

impl RideFlow {
    pub fn new(fare_policy: FarePolicy) -> Self {
        Self {
            step: RideStep::Welcome,
            selected: None,
            session: None,
            fare_policy,
        }
    }

    pub fn step(&self) -> RideStep {
        self.step
    }

    pub fn selected_scooter(&self) -> Option<&'static Scooter> {
        self.selected
    }

    pub fn session(&self) -> Option<&RideSession> {
        self.session.as_ref()
    }

    pub fn fare_policy(&self) -> &FarePolicy {
        &self.fare_policy
    }

    pub fn is_ride_active(&self) -> bool {
        self.session.as_ref().is_some_and(RideSession::is_active)
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.session
            .as_ref()
            .map(RideSession::elapsed_seconds)
            .unwrap_or(0)
    }

    fn expect_step(&self, expected: RideStep, action: &'static str) -> Result<(), RideError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(RideError::InvalidStep {
                action,
                step: self.step,
            })
        }
    }

    fn advance(&mut self, to: RideStep) {
        debug!(from = ?self.step, to = ?to, "Ride step advanced");
        self.step = to;
    }

    /// welcome → select
    pub fn find_nearest(&mut self) -> Result<(), RideError> {
        self.expect_step(RideStep::Welcome, "look for a scooter")?;
        self.advance(RideStep::Select);
        Ok(())
    }

    /// Highlight a scooter on the map. May be repeated before confirming.
    pub fn select_scooter(&mut self, id: ScooterId) -> Result<&'static Scooter, RideError> {
        self.expect_step(RideStep::Select, "select a scooter")?;
        let scooter = catalog::find(id).ok_or(RideError::UnknownScooter(id))?;
        self.selected = Some(scooter);
        debug!(scooter_id = id, "Scooter selected");
        Ok(scooter)
    }

    /// select → qr. The owner schedules [`RideFlow::complete_qr_scan`].
    pub fn confirm_selection(&mut self) -> Result<(), RideError> {
        self.expect_step(RideStep::Select, "confirm a selection")?;
        if self.selected.is_none() {
            return Err(RideError::NoScooterSelected);
        }
        self.advance(RideStep::Qr);
        Ok(())
    }

    /// qr → payment, fired by the scan delay rather than by the user.
    pub fn complete_qr_scan(&mut self) -> Result<(), RideError> {
        self.expect_step(RideStep::Qr, "finish the QR scan")?;
        self.advance(RideStep::Payment);
        Ok(())
    }

    /// payment → riding; the ride clock starts at `now`.
    pub fn confirm_payment(&mut self, now: SystemTime) -> Result<&RideSession, RideError> {
        self.expect_step(RideStep::Payment, "confirm payment")?;
        self.advance(RideStep::Riding);
        info!(scooter_id = self.selected.map(|s| s.id), "Ride started");
        Ok(&*self.session.insert(RideSession::start(now)))
    }

    /// Returns whether the session is still active.
    pub fn tick(&mut self, now: SystemTime) -> bool {
        self.session
            .as_mut()
            .is_some_and(|session| session.tick(now))
    }

    /// riding → endRide; elapsed time is frozen at its last computed value.
    pub fn end_ride(&mut self) -> Result<FareBreakdown, RideError> {
        self.expect_step(RideStep::Riding, "end the ride")?;
        if let Some(session) = self.session.as_mut() {
            session.freeze();
        }
        self.advance(RideStep::EndRide);
        let fare = self.fare();
        info!(
            elapsed_seconds = self.elapsed_seconds(),
            total_cost = fare.total_cost,
            "Ride ended"
        );
        Ok(fare)
    }

    /// endRide → receipt
    pub fn confirm_end_ride(&mut self) -> Result<FareBreakdown, RideError> {
        self.expect_step(RideStep::EndRide, "confirm the end of the ride")?;
        self.advance(RideStep::Receipt);
        Ok(self.fare())
    }

    /// Leaving the receipt closes the flow; the owner drops it afterwards.
    pub fn finish(&self) -> Result<FareBreakdown, RideError> {
        self.expect_step(RideStep::Receipt, "return home")?;
        Ok(self.fare())
    }

    pub fn fare(&self) -> FareBreakdown {
        compute_fare(self.elapsed_seconds(), &self.fare_policy)
    }

    /// The fare is only shown once the ride has ended.
    pub fn displayed_fare(&self) -> Option<FareBreakdown> {
        matches!(self.step, RideStep::EndRide | RideStep::Receipt).then(|| self.fare())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    fn at(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(1_700_000_000 + secs)
    }

    fn flow_at_payment() -> RideFlow {
        let mut flow = RideFlow::new(FarePolicy::default());
        flow.find_nearest().expect("welcome -> select");
        flow.select_scooter(2).expect("select scooter");
        flow.confirm_selection().expect("select -> qr");
        flow.complete_qr_scan().expect("qr -> payment");
        flow
    }

    #[test]
    fn confirming_payment_starts_an_active_session() {
        let mut flow = flow_at_payment();

        let session = flow.confirm_payment(at(0)).expect("payment");

        assert!(session.is_active());
        assert_eq!(session.started_at(), at(0));
        assert_eq!(flow.step(), RideStep::Riding);
        assert!(flow.is_ride_active());
    }

    #[test]
    fn elapsed_is_recomputed_from_start_timestamp() {
        let mut flow = flow_at_payment();
        flow.confirm_payment(at(0)).expect("payment");

        // Ticks arriving late or skipped still land on wall-clock elapsed.
        assert!(flow.tick(at(1)));
        assert!(flow.tick(at(7)));
        assert_eq!(flow.elapsed_seconds(), 7);

        assert!(flow.tick(at(3)));
        assert_eq!(flow.elapsed_seconds(), 7);
    }

    #[test]
    fn end_ride_freezes_elapsed() {
        let mut flow = flow_at_payment();
        flow.confirm_payment(at(0)).expect("payment");
        flow.tick(at(301));

        let fare = flow.end_ride().expect("end ride");

        assert_eq!(fare.total_cost, 6);
        assert!(!flow.tick(at(900)));
        assert_eq!(flow.elapsed_seconds(), 301);
        assert_eq!(flow.step(), RideStep::EndRide);
    }

    #[test]
    fn fare_is_displayed_only_after_ride_ends() {
        let mut flow = flow_at_payment();
        flow.confirm_payment(at(0)).expect("payment");
        flow.tick(at(120));
        assert!(flow.displayed_fare().is_none());

        flow.end_ride().expect("end ride");
        let receipt = flow.confirm_end_ride().expect("receipt");

        assert_eq!(flow.step(), RideStep::Receipt);
        assert_eq!(flow.displayed_fare(), Some(receipt));
        assert_eq!(flow.finish(), Ok(receipt));
    }

    #[test]
    fn confirm_without_selection_is_rejected() {
        let mut flow = RideFlow::new(FarePolicy::default());
        flow.find_nearest().expect("welcome -> select");

        assert_eq!(flow.confirm_selection(), Err(RideError::NoScooterSelected));
        assert_eq!(flow.step(), RideStep::Select);
    }

    #[test]
    fn unknown_scooter_is_rejected() {
        let mut flow = RideFlow::new(FarePolicy::default());
        flow.find_nearest().expect("welcome -> select");

        assert_eq!(flow.select_scooter(42), Err(RideError::UnknownScooter(42)));
        assert!(flow.selected_scooter().is_none());
    }

    #[test]
    fn steps_never_move_backwards() {
        let mut flow = flow_at_payment();

        assert!(matches!(
            flow.find_nearest(),
            Err(RideError::InvalidStep {
                step: RideStep::Payment,
                ..
            })
        ));
        assert!(matches!(
            flow.complete_qr_scan(),
            Err(RideError::InvalidStep { .. })
        ));
        assert!(matches!(flow.end_ride(), Err(RideError::InvalidStep { .. })));
        assert_eq!(flow.step(), RideStep::Payment);
    }
}
