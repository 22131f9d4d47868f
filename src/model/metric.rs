use crate::model::FactOperations;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A metric definition. The metadata carries the component types the metric
/// applies to and the default facts that metric sources are seeded with at
/// bind time.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Metric {
    pub api_version: String,
    pub kind: String,
    pub metadata: MetricMetadata,
    pub spec: MetricSpec,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetricMetadata {
    pub name: String,
    pub labels: BTreeMap<String, String>,
    pub component_type: Vec<String>,
    pub facts: FactOperations,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetricSpec {
    pub id: Option<String>,
    pub name: String,
    pub description: String,
    pub format: MetricFormat,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetricFormat {
    pub unit: String,
}

impl Metric {
    #[must_use]
    pub fn unique_key(&self) -> &str {
        &self.spec.name
    }

    /// Desired-state equality for drift detection; remote IDs are excluded.
    #[must_use]
    pub fn same_desired(a: &Self, b: &Self) -> bool {
        a.spec.name == b.spec.name
            && a.spec.description == b.spec.description
            && a.spec.format == b.spec.format
            && a.metadata.component_type == b.metadata.component_type
            && a.metadata.facts == b.metadata.facts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_desired_ignores_id() {
        let mut a = Metric::default();
        a.spec.name = "coverage".to_owned();
        let mut b = a.clone();
        b.spec.id = Some("m-1".to_owned());

        assert!(Metric::same_desired(&a, &b));
    }

    #[test]
    fn test_same_desired_detects_unit_change() {
        let mut a = Metric::default();
        a.spec.name = "coverage".to_owned();
        a.spec.format.unit = "percent".to_owned();
        let mut b = a.clone();
        b.spec.format.unit = "ratio".to_owned();

        assert!(!Metric::same_desired(&a, &b));
    }
}
