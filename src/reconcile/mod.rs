//! Per-kind reconciliation: load desired config and recorded state, detect
//! drift, apply remote mutations in delete → unchanged → create → update
//! order, and persist the merged result.

mod bind;
mod component;
mod metric;
mod scorecard;

pub use bind::bind_metric_sources;
pub use component::reconcile_components;
pub use metric::reconcile_metrics;
pub use scorecard::reconcile_scorecards;

use crate::Result;
use crate::catalog::CatalogError;
use crate::model::Kind;
use ohno::bail;

/// Log target for the reconcilers
const LOG_TARGET: &str = "reconcile";

/// Outcome counts of one reconciliation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub unchanged: usize,
    pub failed: usize,
}

impl RunReport {
    pub fn absorb(&mut self, other: Self) {
        self.created += other.created;
        self.updated += other.updated;
        self.deleted += other.deleted;
        self.unchanged += other.unchanged;
        self.failed += other.failed;
    }

    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

impl core::fmt::Display for RunReport {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{} created, {} updated, {} deleted, {} unchanged, {} failed",
            self.created, self.updated, self.deleted, self.unchanged, self.failed
        )
    }
}

/// Record a per-item failure and keep going, except for authorization
/// failures which abort the whole run.
fn note_failure(report: &mut RunReport, kind: Kind, name: &str, operation: &str, e: &CatalogError) -> Result<()> {
    if matches!(e, CatalogError::Unauthorized) {
        bail!("{kind} '{name}': {operation} failed: {e}");
    }

    log::error!(target: LOG_TARGET, "{kind} '{name}': {operation} failed: {e}");
    report.failed += 1;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_absorb() {
        let mut report = RunReport {
            created: 1,
            ..RunReport::default()
        };
        report.absorb(RunReport {
            updated: 2,
            failed: 1,
            ..RunReport::default()
        });

        assert_eq!(report.created, 1);
        assert_eq!(report.updated, 2);
        assert_eq!(report.failed, 1);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_unauthorized_aborts() {
        let mut report = RunReport::default();
        let result = note_failure(&mut report, Kind::Metric, "coverage", "create", &CatalogError::Unauthorized);
        assert!(result.is_err());
    }

    #[test]
    fn test_other_failures_are_counted() {
        let mut report = RunReport::default();
        note_failure(&mut report, Kind::Metric, "coverage", "create", &CatalogError::Refused(vec!["nope".to_owned()])).unwrap();
        assert_eq!(report.failed, 1);
    }
}
