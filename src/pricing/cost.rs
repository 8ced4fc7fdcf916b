//! Rental cost computation. Pure and deterministic: the same elapsed time and rate always
//! give the same figure, and a longer elapsed time never gives a smaller one.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants::COST_DECIMAL_PLACES;

/// Cost of a rental period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub hourly_rate_usd: f64,
    pub runtime_seconds: f64,
    pub runtime_minutes: f64,
    pub runtime_hours: f64,
    pub total_cost_usd: f64,
}

impl CostBreakdown {
    /// One-line human rendering, e.g. `$0.3400/hour × 0.2500hours = $0.085000`
    pub fn describe(&self) -> String {
        format!(
            "${:.4}/hour × {:.4}hours = ${:.6}",
            self.hourly_rate_usd, self.runtime_hours, self.total_cost_usd
        )
    }
}

/// Convert elapsed rental time into a dollar amount at `hourly_rate_usd`
pub fn calculate_cost(elapsed: Duration, hourly_rate_usd: f64) -> CostBreakdown {
    let runtime_seconds = elapsed.as_secs_f64();
    let runtime_hours = runtime_seconds / 3600.0;
    CostBreakdown {
        hourly_rate_usd,
        runtime_seconds,
        runtime_minutes: runtime_seconds / 60.0,
        runtime_hours,
        total_cost_usd: round_cost(runtime_hours * hourly_rate_usd),
    }
}

/// Round a dollar amount to the precision every reported cost uses
pub fn round_cost(value: f64) -> f64 {
    let scale = 10f64.powi(COST_DECIMAL_PLACES);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_hour_costs_the_hourly_rate() {
        let cost = calculate_cost(Duration::from_secs(3600), 0.34);
        assert_eq!(cost.total_cost_usd, 0.34);
        assert_eq!(cost.runtime_minutes, 60.0);
        assert_eq!(cost.runtime_hours, 1.0);
    }

    #[test]
    fn test_rounding_to_six_places() {
        let cost = calculate_cost(Duration::from_secs(1), 0.10);
        // 0.10 / 3600 = 0.0000277...
        assert_eq!(cost.total_cost_usd, 0.000028);
    }

    #[test]
    fn test_monotonic_in_elapsed_time() {
        let mut previous = 0.0;
        for seconds in (0..7200).step_by(37) {
            let cost = calculate_cost(Duration::from_secs(seconds), 0.192).total_cost_usd;
            assert!(cost >= previous);
            previous = cost;
        }
    }

    #[test]
    fn test_zero_elapsed_is_free() {
        assert_eq!(calculate_cost(Duration::ZERO, 1.0).total_cost_usd, 0.0);
    }

    #[test]
    fn test_describe() {
        let cost = calculate_cost(Duration::from_secs(900), 0.34);
        assert_eq!(cost.describe(), "$0.3400/hour × 0.2500hours = $0.085000");
    }
}
