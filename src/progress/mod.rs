use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::signal::Outcome;

pub const MSG_INITIALIZING: &str = "Disks transformation is initializing.";
pub const MSG_SUCCEEDED: &str = "Disks transformation succeeded.";
pub const MSG_FAILED: &str = "Disks transformation failed.";

/// Nominal percent reported before any unit has made progress, distinct from
/// a true 0 so the indicator signals liveness.
pub const STARTED_PERCENT: f64 = 1.0;

const WEIGHT_TOLERANCE: f64 = 1e-6;

/// One weighted sub-task (e.g. one disk being converted). Created once per
/// step sequence; `percent_complete` is refreshed on every poll and units are
/// never removed mid-sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressUnit {
    pub identifier: String,
    /// Share of the overall operation, 0-100. Weights across all units of
    /// one sequence sum to 100.
    pub weight: f64,
    pub percent_complete: f64,
}

impl ProgressUnit {
    pub fn new(identifier: impl Into<String>, weight: f64) -> Self {
        Self {
            identifier: identifier.into(),
            weight,
            percent_complete: 0.0,
        }
    }
}

/// Weights must sum to exactly 100 within floating-point tolerance.
pub fn validate_weights(units: &[ProgressUnit]) -> Result<()> {
    let total: f64 = units.iter().map(|u| u.weight).sum();
    if (total - 100.0).abs() > WEIGHT_TOLERANCE {
        bail!("Progress unit weights sum to {}, expected 100", total);
    }
    Ok(())
}

/// Derived, never stored: the overall percentage and user-facing message for
/// the current unit list, recomputed fresh on every poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionReport {
    pub overall_percent: f64,
    pub message: String,
    pub outcome: Outcome,
}

impl ConversionReport {
    pub fn from_units(units: &[ProgressUnit]) -> Self {
        if units.iter().all(|u| u.percent_complete == 0.0) {
            return Self {
                overall_percent: STARTED_PERCENT,
                message: MSG_INITIALIZING.to_string(),
                outcome: Outcome::Retry,
            };
        }

        if units.iter().all(|u| u.percent_complete >= 100.0) {
            return Self {
                overall_percent: 100.0,
                message: MSG_SUCCEEDED.to_string(),
                outcome: Outcome::ok(),
            };
        }

        let overall = round2(
            units
                .iter()
                .map(|u| u.weight * u.percent_complete)
                .sum::<f64>()
                / 100.0,
        );

        // 1-indexed position of the first unfinished unit, in stored order.
        let position = units
            .iter()
            .position(|u| u.percent_complete < 100.0)
            .map(|i| i + 1)
            .unwrap_or(units.len());

        Self {
            overall_percent: overall,
            message: format!(
                "Converting disk {} / {} [{}%].",
                position,
                units.len(),
                overall
            ),
            outcome: Outcome::Retry,
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(weight: f64, percent: f64) -> ProgressUnit {
        ProgressUnit {
            identifier: format!("disk-{}", weight),
            weight,
            percent_complete: percent,
        }
    }

    #[test]
    fn test_no_unit_started() {
        let units = vec![unit(25.0, 0.0), unit(75.0, 0.0)];
        let report = ConversionReport::from_units(&units);
        assert_eq!(report.message, MSG_INITIALIZING);
        assert_eq!(report.overall_percent, 1.0);
        assert_eq!(report.outcome, Outcome::Retry);
    }

    #[test]
    fn test_partial_progress() {
        let units = vec![unit(25.0, 100.0), unit(75.0, 25.0)];
        let report = ConversionReport::from_units(&units);
        assert_eq!(report.overall_percent, 43.75);
        assert_eq!(report.message, "Converting disk 2 / 2 [43.75%].");
        assert_eq!(report.outcome, Outcome::Retry);
    }

    #[test]
    fn test_all_units_complete() {
        let units = vec![unit(25.0, 100.0), unit(75.0, 100.0)];
        let report = ConversionReport::from_units(&units);
        assert_eq!(report.message, MSG_SUCCEEDED);
        assert_eq!(report.overall_percent, 100.0);
        assert_eq!(report.outcome, Outcome::ok());
    }

    #[test]
    fn test_first_unfinished_unit_drives_the_message() {
        let units = vec![unit(20.0, 50.0), unit(30.0, 100.0), unit(50.0, 0.0)];
        let report = ConversionReport::from_units(&units);
        assert_eq!(report.message, "Converting disk 1 / 3 [40%].");
    }

    #[test]
    fn test_overall_percent_stays_in_range() {
        for percents in [[0.0, 10.0], [50.0, 50.0], [99.0, 99.0], [100.0, 99.9]] {
            let units = vec![unit(25.0, percents[0]), unit(75.0, percents[1])];
            let report = ConversionReport::from_units(&units);
            assert!(report.overall_percent >= 0.0 && report.overall_percent <= 100.0);
            assert_ne!(report.overall_percent, 100.0);
        }
    }

    #[test]
    fn test_hundred_percent_only_when_every_unit_done() {
        let units = vec![unit(50.0, 100.0), unit(50.0, 100.0)];
        assert_eq!(ConversionReport::from_units(&units).overall_percent, 100.0);

        let units = vec![unit(50.0, 100.0), unit(50.0, 99.99)];
        assert!(ConversionReport::from_units(&units).overall_percent < 100.0);
    }

    #[test]
    fn test_weight_validation() {
        let units = vec![unit(25.0, 0.0), unit(75.0, 0.0)];
        assert!(validate_weights(&units).is_ok());

        let units = vec![unit(25.0, 0.0), unit(70.0, 0.0)];
        assert!(validate_weights(&units).is_err());

        // Floating-point dust within tolerance is accepted.
        let units = vec![unit(100.0 / 3.0, 0.0), unit(100.0 / 3.0, 0.0), unit(100.0 / 3.0, 0.0)];
        assert!(validate_weights(&units).is_ok());
    }
}
