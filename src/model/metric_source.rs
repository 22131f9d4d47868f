use crate::model::FactOperations;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a metric source. Sources for pairs no longer
/// produced by bind stay in state as `inactive` rather than disappearing.
pub const STATUS_ACTIVE: &str = "active";
pub const STATUS_INACTIVE: &str = "inactive";

/// A metric source: the binding between one metric and one component,
/// carrying the facts used to compute the metric value for that component.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetricSource {
    pub api_version: String,
    pub kind: String,
    pub metadata: MetricSourceMetadata,
    pub spec: MetricSourceSpec,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetricSourceMetadata {
    pub name: String,
    pub component_type: Vec<String>,
    pub status: String,
    pub facts: FactOperations,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetricSourceSpec {
    pub id: Option<String>,
    pub name: String,
    pub metric: String,
    pub component: String,
}

impl MetricSource {
    #[must_use]
    pub fn unique_key(&self) -> &str {
        &self.spec.name
    }

    /// Desired-state equality for drift detection; remote IDs are excluded.
    #[must_use]
    pub fn same_desired(a: &Self, b: &Self) -> bool {
        a.spec.name == b.spec.name
            && a.spec.metric == b.spec.metric
            && a.spec.component == b.spec.component
            && a.metadata.status == b.metadata.status
            && a.metadata.facts == b.metadata.facts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_desired_ignores_id() {
        let mut a = MetricSource::default();
        a.spec.name = "coverage-svc-api".to_owned();
        a.metadata.status = STATUS_ACTIVE.to_owned();
        let mut b = a.clone();
        b.spec.id = Some("ms-1".to_owned());

        assert!(MetricSource::same_desired(&a, &b));
    }

    #[test]
    fn test_status_change_is_a_diff() {
        let mut a = MetricSource::default();
        a.spec.name = "coverage-svc-api".to_owned();
        a.metadata.status = STATUS_ACTIVE.to_owned();
        let mut b = a.clone();
        b.metadata.status = STATUS_INACTIVE.to_owned();

        assert!(!MetricSource::same_desired(&a, &b));
    }
}
