//! Diagnostics collected while producing a separated presentation order.
//!
//! Serializable for machine consumption (`--json` in the CLI) and
//! printable as a short human-readable report.

use std::fmt::Write;

use serde::{Deserialize, Serialize};

/// Outcome data of the separation search and refinement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderingDiagnostics {
    /// Outer construction attempts consumed.
    pub attempts: u64,
    /// True when the construction budget ran out and the order fell
    /// back to grid scan.
    pub fallback: bool,
    /// Best minimum adjacent-pair distance observed during refinement.
    pub best_min_distance: f64,
    /// Minimum adjacent-pair distance of the final order.
    pub final_min_distance: f64,
    /// Mean adjacent-pair distance of the final order.
    pub mean_distance: f64,
    /// Refinement rounds executed.
    pub refine_rounds: u32,
    /// True when refinement stopped early on an improving move.
    pub early_stop: bool,
}

impl OrderingDiagnostics {
    /// Render a human-readable summary.
    #[must_use]
    pub fn report(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Ordering search");
        let _ = writeln!(out, "{}", "=".repeat(40));
        let _ = writeln!(out, "{:<26} {}", "Construction attempts:", self.attempts);
        let _ = writeln!(
            out,
            "{:<26} {}",
            "Fallback to scan order:",
            if self.fallback { "yes" } else { "no" },
        );
        let _ = writeln!(
            out,
            "{:<26} {}{}",
            "Refinement rounds:",
            self.refine_rounds,
            if self.early_stop { " (early stop)" } else { "" },
        );
        let _ = writeln!(
            out,
            "{:<26} {:.3}",
            "Best min distance:", self.best_min_distance,
        );
        let _ = writeln!(
            out,
            "{:<26} {:.3}",
            "Final min distance:", self.final_min_distance,
        );
        let _ = writeln!(out, "{:<26} {:.3}", "Mean distance:", self.mean_distance);
        out
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> OrderingDiagnostics {
        OrderingDiagnostics {
            attempts: 3,
            fallback: false,
            best_min_distance: 5.385,
            final_min_distance: 5.385,
            mean_distance: 14.2,
            refine_rounds: 412,
            early_stop: true,
        }
    }

    #[test]
    fn report_mentions_every_field() {
        let report = sample().report();
        assert!(report.contains("Construction attempts"));
        assert!(report.contains('3'));
        assert!(report.contains("Fallback to scan order"));
        assert!(report.contains("no"));
        assert!(report.contains("412 (early stop)"));
        assert!(report.contains("5.385"));
        assert!(report.contains("14.200"));
    }

    #[test]
    fn report_flags_fallback() {
        let diagnostics = OrderingDiagnostics {
            fallback: true,
            early_stop: false,
            ..sample()
        };
        let report = diagnostics.report();
        assert!(report.contains("yes"));
        assert!(!report.contains("early stop"));
    }

    #[test]
    fn serde_round_trip() {
        let diagnostics = sample();
        let json = serde_json::to_string(&diagnostics).unwrap();
        let deserialized: OrderingDiagnostics = serde_json::from_str(&json).unwrap();
        assert_eq!(diagnostics, deserialized);
    }
}
