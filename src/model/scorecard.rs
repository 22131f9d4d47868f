use serde::{Deserialize, Serialize};

/// A scorecard: a weighted set of criteria evaluated by the remote catalog
/// against metric values.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Scorecard {
    pub api_version: String,
    pub kind: String,
    pub metadata: ScorecardMetadata,
    pub spec: ScorecardSpec,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScorecardMetadata {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScorecardSpec {
    pub id: Option<String>,
    pub name: String,
    pub description: String,
    pub owner_id: String,
    pub state: String,
    pub component_type_ids: Vec<String>,
    pub importance: String,
    pub scoring_strategy_type: String,
    pub criteria: Vec<Criterion>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Criterion {
    pub has_metric_value: HasMetricValue,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HasMetricValue {
    pub id: Option<String>,
    pub weight: i64,
    pub name: String,
    pub metric_name: String,
    pub metric_definition_id: Option<String>,
    pub comparator: String,
    pub comparator_value: f64,
}

impl Scorecard {
    #[must_use]
    pub fn unique_key(&self) -> &str {
        &self.spec.name
    }

    /// Desired-state equality for drift detection. Criterion IDs are
    /// excluded (they run their own nested drift), but
    /// `metric_definition_id` is included: both sides are refreshed from
    /// state metrics before drift, so a mismatch is a real change.
    #[must_use]
    pub fn same_desired(a: &Self, b: &Self) -> bool {
        a.spec.name == b.spec.name
            && a.spec.description == b.spec.description
            && a.spec.owner_id == b.spec.owner_id
            && a.spec.state == b.spec.state
            && a.spec.component_type_ids == b.spec.component_type_ids
            && a.spec.importance == b.spec.importance
            && a.spec.scoring_strategy_type == b.spec.scoring_strategy_type
            && Criterion::same_set(&a.spec.criteria, &b.spec.criteria)
    }
}

impl Criterion {
    /// The name identifies a criterion within its scorecard.
    #[must_use]
    pub fn unique_key(&self) -> &str {
        &self.has_metric_value.name
    }

    /// Equality ignoring criterion IDs, order-sensitive.
    #[must_use]
    pub fn same_set(a: &[Self], b: &[Self]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| Self::same_desired(x, y))
    }

    #[must_use]
    pub fn same_desired(a: &Self, b: &Self) -> bool {
        let (a, b) = (&a.has_metric_value, &b.has_metric_value);
        a.weight == b.weight
            && a.name == b.name
            && a.metric_name == b.metric_name
            && a.metric_definition_id == b.metric_definition_id
            && a.comparator == b.comparator
            && (a.comparator_value - b.comparator_value).abs() < f64::EPSILON
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn criterion(name: &str, metric: &str, definition_id: Option<&str>) -> Criterion {
        Criterion {
            has_metric_value: HasMetricValue {
                name: name.to_owned(),
                metric_name: metric.to_owned(),
                metric_definition_id: definition_id.map(str::to_owned),
                weight: 10,
                comparator: "GREATER_THAN".to_owned(),
                comparator_value: 0.8,
                ..HasMetricValue::default()
            },
        }
    }

    #[test]
    fn test_criterion_equality_ignores_id() {
        let a = criterion("has coverage", "coverage", Some("m-1"));
        let mut b = a.clone();
        b.has_metric_value.id = Some("crit-7".to_owned());

        assert!(Criterion::same_desired(&a, &b));
    }

    #[test]
    fn test_criterion_equality_tracks_metric_definition() {
        let a = criterion("has coverage", "coverage", Some("m-old"));
        let b = criterion("has coverage", "coverage", Some("m-new"));

        assert!(!Criterion::same_desired(&a, &b));
    }

    #[test]
    fn test_scorecard_equality_ignores_top_level_id() {
        let mut a = Scorecard::default();
        a.spec.name = "production readiness".to_owned();
        a.spec.criteria = vec![criterion("has coverage", "coverage", Some("m-1"))];
        let mut b = a.clone();
        b.spec.id = Some("sc-1".to_owned());

        assert!(Scorecard::same_desired(&a, &b));
    }
}
