use serde::{Deserialize, Serialize};

pub const DEFAULT_INITIAL_FEE: u64 = 5;
pub const DEFAULT_FREE_MINUTES: u64 = 5;
pub const DEFAULT_PER_MINUTE_RATE: u64 = 1;

/// Pricing applied to a finished (or running) ride, in whole currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FarePolicy {
    /// Flat charge taken when the ride starts.
    pub initial_fee: u64,
    /// Minutes included before metering starts.
    pub free_minutes: u64,
    /// Charge per started minute beyond `free_minutes`.
    pub per_minute_rate: u64,
}

impl Default for FarePolicy {
    fn default() -> Self {
        Self {
            initial_fee: DEFAULT_INITIAL_FEE,
            free_minutes: DEFAULT_FREE_MINUTES,
            per_minute_rate: DEFAULT_PER_MINUTE_RATE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FareBreakdown {
    pub initial_fee: u64,
    pub free_minutes: u64,
    pub used_minutes: u64,
    pub extra_minutes: u64,
    pub extra_cost: u64,
    pub total_cost: u64,
}

impl FareBreakdown {
    pub fn within_free_time(&self) -> bool {
        self.extra_minutes == 0
    }

    /// Free minutes left before metering starts, zero once exceeded.
    pub fn free_minutes_remaining(&self) -> u64 {
        self.free_minutes.saturating_sub(self.used_minutes)
    }
}

/// Partial minutes are billed as whole minutes.
pub fn used_minutes(elapsed_seconds: u64) -> u64 {
    elapsed_seconds.div_ceil(60)
}

pub fn compute_fare(elapsed_seconds: u64, policy: &FarePolicy) -> FareBreakdown {
    let used_minutes = used_minutes(elapsed_seconds);
    let extra_minutes = used_minutes.saturating_sub(policy.free_minutes);
    let extra_cost = extra_minutes.saturating_mul(policy.per_minute_rate);

    FareBreakdown {
        initial_fee: policy.initial_fee,
        free_minutes: policy.free_minutes,
        used_minutes,
        extra_minutes,
        extra_cost,
        total_cost: policy.initial_fee.saturating_add(extra_cost),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn just_under_five_minutes_is_within_free_time() {
        let fare = compute_fare(299, &FarePolicy::default());

        assert_eq!(fare.used_minutes, 5);
        assert_eq!(fare.extra_minutes, 0);
        assert_eq!(fare.extra_cost, 0);
        assert_eq!(fare.total_cost, 5);
        assert!(fare.within_free_time());
    }

    #[test]
    fn one_second_past_five_minutes_bills_a_full_minute() {
        let fare = compute_fare(301, &FarePolicy::default());

        assert_eq!(fare.used_minutes, 6);
        assert_eq!(fare.extra_minutes, 1);
        assert_eq!(fare.extra_cost, 1);
        assert_eq!(fare.total_cost, 6);
        assert_eq!(fare.free_minutes_remaining(), 0);
    }

    #[test]
    fn zero_elapsed_costs_the_initial_fee() {
        let fare = compute_fare(0, &FarePolicy::default());

        assert_eq!(fare.used_minutes, 0);
        assert_eq!(fare.total_cost, DEFAULT_INITIAL_FEE);
        assert_eq!(fare.free_minutes_remaining(), 5);
    }

    #[test]
    fn total_never_drops_below_initial_fee() {
        let policy = FarePolicy::default();
        for elapsed in (0..3_600).step_by(7) {
            let fare = compute_fare(elapsed, &policy);
            assert!(fare.total_cost >= policy.initial_fee);
            assert_eq!(fare.total_cost, fare.initial_fee + fare.extra_cost);
            assert_eq!(
                fare.total_cost == policy.initial_fee,
                used_minutes(elapsed) <= policy.free_minutes,
                "elapsed={elapsed}"
            );
        }
    }

    #[test]
    fn custom_rate_scales_extra_cost() {
        let policy = FarePolicy {
            initial_fee: 3,
            free_minutes: 0,
            per_minute_rate: 2,
        };

        let fare = compute_fare(125, &policy);

        assert_eq!(fare.used_minutes, 3);
        assert_eq!(fare.extra_cost, 6);
        assert_eq!(fare.total_cost, 9);
    }
}
