use crate::Result;
use crate::catalog::{CatalogClient, CatalogError};
use crate::facts::placeholder;
use crate::model::{
    self, Component, ComponentMetricSource, FactOperations, Kind, Metric, MetricSource, STATUS_ACTIVE, STATUS_INACTIVE,
};
use crate::reconcile::{RunReport, note_failure};
use crate::state::StateStore;
use std::collections::{BTreeMap, BTreeSet};

/// Log target for the reconcilers
const LOG_TARGET: &str = "reconcile";

/// Bind metrics to components: every metric applies to the components whose
/// type it lists, and each applicable pair gets a remote metric source named
/// `"{metric}-{slug}"` carrying the metric's facts with placeholders
/// substituted for the bound component.
///
/// Sources for pairs that no longer apply are deleted remotely and kept in
/// the metric-source state file as `inactive`.
pub async fn bind_metric_sources<C: CatalogClient>(client: &C, store: &StateStore) -> Result<RunReport> {
    let metrics = store.load_state::<Metric>()?;
    let mut components = store.load_state::<Component>()?;
    let previous = store.load_state::<MetricSource>()?;

    let mut report = RunReport::default();
    for component in &mut components {
        bind_component(client, &metrics, component, &mut report).await?;
    }

    let sources = collect_sources(&components, previous);
    store.write_state(components)?;
    store.write_state(sources)?;
    Ok(report)
}

fn applies(metric: &Metric, component: &Component) -> bool {
    metric
        .metadata
        .component_type
        .iter()
        .any(|t| t.eq_ignore_ascii_case(&component.metadata.component_type))
}

async fn bind_component<C: CatalogClient>(client: &C, metrics: &[Metric], component: &mut Component, report: &mut RunReport) -> Result<()> {
    let applicable: Vec<&Metric> = metrics.iter().filter(|m| applies(m, component)).collect();
    let applicable_names: BTreeSet<&str> = applicable.iter().map(|m| m.spec.name.as_str()).collect();

    // Prune pairs whose metric no longer targets this component type
    let stale: Vec<String> = component
        .spec
        .metric_sources
        .keys()
        .filter(|metric| !applicable_names.contains(metric.as_str()))
        .cloned()
        .collect();
    for metric_name in stale {
        let Some(source) = component.spec.metric_sources.get(&metric_name) else {
            continue;
        };
        let (source_id, source_name) = (source.id.clone(), source.name.clone());

        match client.delete_metric_source(&source_id).await {
            Ok(()) | Err(CatalogError::NotFound) => {
                let _ = component.spec.metric_sources.remove(&metric_name);
                report.deleted += 1;
            }
            Err(e) => note_failure(report, Kind::MetricSource, &source_name, "delete", &e)?,
        }
    }

    for metric in applicable {
        let Some(metric_id) = metric.spec.id.as_deref() else {
            log::warn!(target: LOG_TARGET, "metric '{}' has no remote ID yet, skipping bind", metric.spec.name);
            continue;
        };
        let Some(component_id) = component.spec.id.as_deref() else {
            log::warn!(target: LOG_TARGET, "component '{}' has no remote ID yet, skipping bind", component.spec.name);
            continue;
        };

        let name = model::metric_source_name(&metric.spec.name, &component.spec.name, &component.metadata.component_type);
        let facts = match bind_facts(&metric.metadata.facts, component) {
            Ok(facts) => facts,
            Err(e) => {
                log::error!(target: LOG_TARGET, "metric source '{name}': fact binding failed: {e}");
                report.failed += 1;
                continue;
            }
        };

        if let Some(source) = component.spec.metric_sources.get_mut(&metric.spec.name) {
            // Already bound: refresh the name and facts in place
            source.name = name;
            source.metric = metric.spec.name.clone();
            source.facts = facts;
            report.unchanged += 1;
        } else {
            match client.create_metric_source(metric_id, component_id, &name).await {
                Ok(id) => {
                    let _ = component.spec.metric_sources.insert(
                        metric.spec.name.clone(),
                        ComponentMetricSource {
                            id,
                            name,
                            metric: metric.spec.name.clone(),
                            facts,
                        },
                    );
                    report.created += 1;
                }
                Err(e) => note_failure(report, Kind::MetricSource, &name, "create", &e)?,
            }
        }
    }

    Ok(())
}

/// Substitute component placeholders into the fact fields that may carry
/// them.
fn bind_facts(facts: &FactOperations, component: &Component) -> Result<FactOperations> {
    let mut bound = facts.clone();
    for fact in bound.all.iter_mut().chain(bound.any.iter_mut()).chain(bound.inspect.iter_mut()) {
        fact.uri = placeholder::substitute(&fact.uri, component)?;
        fact.component_name = placeholder::substitute(&fact.component_name, component)?;
        fact.repo = placeholder::substitute(&fact.repo, component)?;
        fact.expected_value = placeholder::substitute(&fact.expected_value, component)?;
    }

    Ok(bound)
}

/// Rebuild the metric-source state file: every currently bound pair is
/// `active`; previously recorded sources no longer bound stay as `inactive`.
fn collect_sources(components: &[Component], previous: Vec<MetricSource>) -> Vec<MetricSource> {
    let mut by_name: BTreeMap<String, MetricSource> = previous
        .into_iter()
        .map(|mut source| {
            source.metadata.status = STATUS_INACTIVE.to_owned();
            (source.spec.name.clone(), source)
        })
        .collect();

    for component in components {
        for bound in component.spec.metric_sources.values() {
            let mut source = by_name.remove(&bound.name).unwrap_or_else(|| {
                let mut fresh = MetricSource::default();
                fresh.api_version = component.api_version.clone();
                fresh.kind = "MetricSource".to_owned();
                fresh
            });

            source.metadata.name = bound.name.clone();
            source.metadata.component_type = vec![component.metadata.component_type.clone()];
            source.metadata.status = STATUS_ACTIVE.to_owned();
            source.metadata.facts = bound.facts.clone();
            source.spec.id = Some(bound.id.clone());
            source.spec.name = bound.name.clone();
            source.spec.metric = bound.metric.clone();
            source.spec.component = component.spec.name.clone();
            let _ = by_name.insert(bound.name.clone(), source);
        }
    }

    by_name.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Fact, FactSource, FactType};

    fn component(name: &str, component_type: &str) -> Component {
        let mut c = Component::default();
        c.metadata.name = name.to_owned();
        c.metadata.component_type = component_type.to_owned();
        c.spec.name = name.to_owned();
        c.spec.id = Some(format!("c-{name}"));
        c.spec.labels = vec!["tier:1".to_owned()];
        c
    }

    fn metric(name: &str, component_types: &[&str]) -> Metric {
        let mut m = Metric::default();
        m.metadata.name = name.to_owned();
        m.metadata.component_type = component_types.iter().map(|t| (*t).to_owned()).collect();
        m.spec.name = name.to_owned();
        m.spec.id = Some(format!("m-{name}"));
        m
    }

    #[test]
    fn test_applies_matches_type_case_insensitively() {
        let m = metric("coverage", &["Service"]);
        assert!(applies(&m, &component("api", "service")));
        assert!(!applies(&m, &component("bucket", "cloud-resource")));
    }

    #[test]
    fn test_bind_facts_substitutes_component_fields() {
        let mut facts = FactOperations::default();
        facts.all.push(Fact {
            name: "dockerfile".to_owned(),
            source: FactSource::CodeHost,
            fact_type: FactType::FileExists,
            repo: "${component.name}".to_owned(),
            expected_value: "${component.labels.tier}".to_owned(),
            ..Fact::default()
        });

        let bound = bind_facts(&facts, &component("api", "service")).unwrap();
        assert_eq!(bound.all[0].repo, "api");
        assert_eq!(bound.all[0].expected_value, "1");
    }

    #[test]
    fn test_bind_facts_unknown_placeholder_is_an_error() {
        let mut facts = FactOperations::default();
        facts.all.push(Fact {
            uri: "${component.nonsense}".to_owned(),
            ..Fact::default()
        });

        assert!(bind_facts(&facts, &component("api", "service")).is_err());
    }

    #[test]
    fn test_collect_sources_marks_stale_entries_inactive() {
        let mut c = component("api", "service");
        let _ = c.spec.metric_sources.insert(
            "coverage".to_owned(),
            ComponentMetricSource {
                id: "ms-1".to_owned(),
                name: "coverage-svc-api".to_owned(),
                metric: "coverage".to_owned(),
                facts: FactOperations::default(),
            },
        );

        let mut old = MetricSource::default();
        old.metadata.name = "uptime-svc-api".to_owned();
        old.metadata.status = STATUS_ACTIVE.to_owned();
        old.spec.name = "uptime-svc-api".to_owned();
        old.spec.id = Some("ms-0".to_owned());

        let sources = collect_sources(&[c], vec![old]);
        assert_eq!(sources.len(), 2);

        let by_name: BTreeMap<&str, &MetricSource> = sources.iter().map(|s| (s.spec.name.as_str(), s)).collect();
        assert_eq!(by_name["coverage-svc-api"].metadata.status, STATUS_ACTIVE);
        assert_eq!(by_name["coverage-svc-api"].spec.id.as_deref(), Some("ms-1"));
        assert_eq!(by_name["uptime-svc-api"].metadata.status, STATUS_INACTIVE);
    }
}
