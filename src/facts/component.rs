use crate::Result;
use crate::facts::json;
use crate::model::{Component, Fact, FactType};
use ohno::{IntoAppError, bail};
use serde_json::Value;
use std::collections::BTreeMap;

/// Collector for facts evaluated against the local component state: the
/// named component is serialized to JSON and navigated like any other
/// document.
#[derive(Debug, Default)]
pub struct ComponentCollector {
    components: BTreeMap<String, Component>,
}

impl ComponentCollector {
    #[must_use]
    pub fn new(components: impl IntoIterator<Item = Component>) -> Self {
        Self {
            components: components.into_iter().map(|c| (c.spec.name.clone(), c)).collect(),
        }
    }

    pub fn check(&self, fact: &Fact) -> Result<bool> {
        if fact.fact_type != FactType::JsonPath {
            return Ok(false);
        }

        let doc = self.extract_json(fact)?;
        let value = json::lookup(&doc, &fact.json_path)?;
        json::compare_extracted(&json::value_to_string(value), &fact.expected_value, &fact.expected_formula)
    }

    pub fn inspect(&self, fact: &Fact) -> Result<f64> {
        let doc = self.extract_json(fact)?;
        let value = json::value_to_string(json::lookup(&doc, &fact.json_path)?);
        value
            .parse::<f64>()
            .into_app_err_with(|| format!("fact '{}': extracted value '{value}' is not numeric", fact.name))
    }

    fn extract_json(&self, fact: &Fact) -> Result<Value> {
        let Some(component) = self.components.get(&fact.component_name) else {
            bail!("fact '{}': component '{}' not found in state", fact.name, fact.component_name);
        };

        serde_json::to_value(component).into_app_err_with(|| format!("Failed to serialize component '{}'", fact.component_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FactSource;

    fn fixture() -> ComponentCollector {
        let mut c = Component::default();
        c.spec.name = "api".to_owned();
        c.spec.config_version = 3;
        c.spec.labels = vec!["tier:1".to_owned()];
        ComponentCollector::new([c])
    }

    fn fact(path: &str, expected_value: &str, expected_formula: &str) -> Fact {
        Fact {
            name: "sample".to_owned(),
            source: FactSource::Component,
            fact_type: FactType::JsonPath,
            component_name: "api".to_owned(),
            json_path: path.to_owned(),
            expected_value: expected_value.to_owned(),
            expected_formula: expected_formula.to_owned(),
            ..Fact::default()
        }
    }

    #[test]
    fn test_check_against_serialized_component() {
        let collector = fixture();
        assert!(collector.check(&fact("spec.name", "^api$", "")).unwrap());
        assert!(collector.check(&fact("spec.configVersion", "", ">= 3")).unwrap());
    }

    #[test]
    fn test_inspect_numeric_field() {
        let collector = fixture();
        let value = collector.inspect(&fact("spec.configVersion", "", "")).unwrap();
        assert!((value - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unknown_component_is_an_error() {
        let collector = fixture();
        let mut f = fact("spec.name", "api", "");
        f.component_name = "ghost".to_owned();
        assert!(collector.check(&f).is_err());
    }

    #[test]
    fn test_non_json_path_fact_checks_false() {
        let collector = fixture();
        let mut f = fact("spec.name", "api", "");
        f.fact_type = FactType::FileExists;
        assert!(!collector.check(&f).unwrap());
    }
}
