use crate::Result;
use crate::catalog::{CatalogClient, CatalogError, CatalogResult, CriteriaDiff};
use crate::drift;
use crate::model::{Criterion, Kind, Metric, Scorecard};
use crate::reconcile::{RunReport, note_failure};
use crate::state::{StateStore, load_config};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Log target for the reconcilers
const LOG_TARGET: &str = "reconcile";

/// Reconcile scorecards against the remote catalog.
///
/// Criterion metric references are refreshed from the metric state file on
/// both sides before drift runs, so a metric that was re-created under a new
/// ID updates the persisted reference without forcing a remote scorecard
/// update (the body is unchanged from the remote's point of view).
pub async fn reconcile_scorecards<C: CatalogClient>(client: &C, store: &StateStore, config_dir: &Path, recursive: bool) -> Result<RunReport> {
    let metric_ids: BTreeMap<String, String> = store
        .load_state::<Metric>()?
        .into_iter()
        .filter_map(|m| m.spec.id.map(|id| (m.spec.name, id)))
        .collect();

    let mut state = store.load_state::<Scorecard>()?;
    let mut config = load_config::<Scorecard>(config_dir, recursive)?;
    for scorecard in state.iter_mut().chain(config.iter_mut()) {
        refresh_metric_ids(scorecard, &metric_ids);
    }

    let state_by_name: BTreeMap<String, Scorecard> = state.iter().map(|s| (s.spec.name.clone(), s.clone())).collect();

    let drift = drift::detect(
        state,
        config,
        |s| s.spec.name.clone(),
        |s| s.spec.id.clone(),
        |s, id| s.spec.id = id,
        Scorecard::same_desired,
    );

    let mut report = RunReport::default();
    let mut out: Vec<Scorecard> = Vec::new();

    for scorecard in drift.deleted {
        match &scorecard.spec.id {
            None => report.deleted += 1,
            Some(id) => match client.delete_scorecard(id).await {
                Ok(()) | Err(CatalogError::NotFound) => report.deleted += 1,
                Err(e) => {
                    note_failure(&mut report, Kind::Scorecard, &scorecard.spec.name, "delete", &e)?;
                    out.push(scorecard);
                }
            },
        }
    }

    // Unchanged scorecards still adopt criterion IDs recorded in state, so
    // a later update can address each criterion remotely.
    for mut scorecard in drift.unchanged {
        if let Some(existing) = state_by_name.get(&scorecard.spec.name) {
            adopt_criterion_ids(&mut scorecard, existing);
        }
        out.push(scorecard);
        report.unchanged += 1;
    }

    for mut scorecard in drift.created {
        match client.create_scorecard(&scorecard).await {
            Ok(remote) => {
                scorecard.spec.id = Some(remote.id);
                merge_criterion_ids(&mut scorecard, &remote.criteria_ids);
                out.push(scorecard);
                report.created += 1;
            }
            Err(CatalogError::AlreadyExists) => match adopt_and_update(client, &mut scorecard).await {
                Ok(()) => {
                    out.push(scorecard);
                    report.updated += 1;
                }
                Err(e) => note_failure(&mut report, Kind::Scorecard, &scorecard.spec.name, "create", &e)?,
            },
            Err(e) => note_failure(&mut report, Kind::Scorecard, &scorecard.spec.name, "create", &e)?,
        }
    }

    for mut scorecard in drift.updated {
        let state_criteria = state_by_name
            .get(&scorecard.spec.name)
            .map(|s| s.spec.criteria.clone())
            .unwrap_or_default();
        let diff = criteria_diff(&state_criteria, &mut scorecard.spec.criteria);

        match client.update_scorecard(&scorecard, &diff).await {
            Ok(new_ids) => {
                merge_criterion_ids(&mut scorecard, &new_ids);
                out.push(scorecard);
                report.updated += 1;
            }
            Err(CatalogError::NotFound) => match adopt_and_update(client, &mut scorecard).await {
                Ok(()) => {
                    out.push(scorecard);
                    report.updated += 1;
                }
                Err(e) => note_failure(&mut report, Kind::Scorecard, &scorecard.spec.name, "update", &e)?,
            },
            Err(e) => note_failure(&mut report, Kind::Scorecard, &scorecard.spec.name, "update", &e)?,
        }
    }

    store.write_state(out)?;
    Ok(report)
}

/// Point every criterion at the current remote ID of the metric it names.
/// An unknown metric name leaves the reference as declared.
fn refresh_metric_ids(scorecard: &mut Scorecard, metric_ids: &BTreeMap<String, String>) {
    for criterion in &mut scorecard.spec.criteria {
        let hmv = &mut criterion.has_metric_value;
        match metric_ids.get(&hmv.metric_name) {
            Some(id) => hmv.metric_definition_id = Some(id.clone()),
            None => log::warn!(
                target: LOG_TARGET,
                "scorecard '{}': criterion '{}' references unknown metric '{}'",
                scorecard.spec.name, hmv.name, hmv.metric_name
            ),
        }
    }
}

/// Copy criterion IDs from the state copy into the desired copy, matching by
/// criterion name.
fn adopt_criterion_ids(scorecard: &mut Scorecard, state: &Scorecard) {
    let ids: BTreeMap<&str, &str> = state
        .spec
        .criteria
        .iter()
        .filter_map(|c| c.has_metric_value.id.as_deref().map(|id| (c.unique_key(), id)))
        .collect();

    for criterion in &mut scorecard.spec.criteria {
        if let Some(id) = ids.get(criterion.unique_key()) {
            criterion.has_metric_value.id = Some((*id).to_owned());
        }
    }
}

fn merge_criterion_ids(scorecard: &mut Scorecard, ids: &BTreeMap<String, String>) {
    for criterion in &mut scorecard.spec.criteria {
        if let Some(id) = ids.get(criterion.unique_key()) {
            criterion.has_metric_value.id = Some(id.clone());
        }
    }
}

/// Nested drift over a scorecard's criteria, keyed by criterion name.
/// Desired criteria adopt the IDs recorded in state along the way.
fn criteria_diff(state: &[Criterion], desired: &mut [Criterion]) -> CriteriaDiff {
    let by_name: BTreeMap<&str, &Criterion> = state.iter().map(|c| (c.unique_key(), c)).collect();

    let mut diff = CriteriaDiff::default();
    for criterion in desired.iter_mut() {
        match by_name.get(criterion.unique_key()) {
            Some(existing) => {
                criterion.has_metric_value.id = existing.has_metric_value.id.clone();
                if !Criterion::same_desired(existing, criterion) {
                    diff.updated.push(criterion.clone());
                }
            }
            None => diff.created.push(criterion.clone()),
        }
    }

    let desired_names: BTreeSet<&str> = desired.iter().map(Criterion::unique_key).collect();
    diff.deleted_ids = state
        .iter()
        .filter(|c| !desired_names.contains(c.unique_key()))
        .filter_map(|c| c.has_metric_value.id.clone())
        .collect();

    diff
}

/// The already-exists / not-found pivot for scorecards: resolve the remote
/// scorecard by name, adopt its ID and criterion IDs, and push one update
/// carrying the full criteria set.
async fn adopt_and_update<C: CatalogClient>(client: &C, scorecard: &mut Scorecard) -> CatalogResult<()> {
    let remote = client.get_scorecard_by_name(&scorecard.spec.name).await?;
    scorecard.spec.id = Some(remote.id);

    let mut diff = CriteriaDiff::default();
    for criterion in &mut scorecard.spec.criteria {
        match remote.criteria_ids.get(criterion.unique_key()) {
            Some(id) => {
                criterion.has_metric_value.id = Some(id.clone());
                diff.updated.push(criterion.clone());
            }
            None => diff.created.push(criterion.clone()),
        }
    }

    let desired_names: BTreeSet<&str> = scorecard.spec.criteria.iter().map(Criterion::unique_key).collect();
    diff.deleted_ids = remote
        .criteria_ids
        .iter()
        .filter(|(name, _)| !desired_names.contains(name.as_str()))
        .map(|(_, id)| id.clone())
        .collect();

    let new_ids = client.update_scorecard(scorecard, &diff).await?;
    merge_criterion_ids(scorecard, &new_ids);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::HasMetricValue;

    fn criterion(name: &str, metric: &str, id: Option<&str>, weight: i64) -> Criterion {
        Criterion {
            has_metric_value: HasMetricValue {
                id: id.map(str::to_owned),
                name: name.to_owned(),
                metric_name: metric.to_owned(),
                weight,
                comparator: "GREATER_THAN".to_owned(),
                comparator_value: 0.5,
                ..HasMetricValue::default()
            },
        }
    }

    #[test]
    fn test_refresh_metric_ids_points_at_state_metric() {
        let mut scorecard = Scorecard::default();
        scorecard.spec.name = "readiness".to_owned();
        scorecard.spec.criteria = vec![criterion("has coverage", "coverage", None, 10)];
        scorecard.spec.criteria[0].has_metric_value.metric_definition_id = Some("m-old".to_owned());

        let ids = BTreeMap::from([("coverage".to_owned(), "m-new".to_owned())]);
        refresh_metric_ids(&mut scorecard, &ids);

        assert_eq!(scorecard.spec.criteria[0].has_metric_value.metric_definition_id.as_deref(), Some("m-new"));
    }

    #[test]
    fn test_refresh_leaves_unknown_metric_alone() {
        let mut scorecard = Scorecard::default();
        scorecard.spec.criteria = vec![criterion("has uptime", "uptime", None, 10)];
        scorecard.spec.criteria[0].has_metric_value.metric_definition_id = Some("m-1".to_owned());

        refresh_metric_ids(&mut scorecard, &BTreeMap::new());
        assert_eq!(scorecard.spec.criteria[0].has_metric_value.metric_definition_id.as_deref(), Some("m-1"));
    }

    #[test]
    fn test_criteria_diff_partitions_and_adopts_ids() {
        let state = vec![
            criterion("kept", "coverage", Some("crit-1"), 10),
            criterion("changed", "uptime", Some("crit-2"), 10),
            criterion("dropped", "latency", Some("crit-3"), 10),
        ];
        let mut desired = vec![
            criterion("kept", "coverage", None, 10),
            criterion("changed", "uptime", None, 20),
            criterion("fresh", "errors", None, 5),
        ];

        let diff = criteria_diff(&state, &mut desired);

        assert_eq!(diff.created.len(), 1);
        assert_eq!(diff.created[0].unique_key(), "fresh");
        assert_eq!(diff.updated.len(), 1);
        assert_eq!(diff.updated[0].has_metric_value.id.as_deref(), Some("crit-2"));
        assert_eq!(diff.deleted_ids, vec!["crit-3".to_owned()]);
        assert_eq!(desired[0].has_metric_value.id.as_deref(), Some("crit-1"));
    }
}
