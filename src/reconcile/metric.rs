use crate::Result;
use crate::catalog::{CatalogClient, CatalogError, CatalogResult};
use crate::drift;
use crate::model::{Kind, Metric};
use crate::reconcile::{RunReport, note_failure};
use crate::state::{StateStore, load_config};
use std::path::Path;

/// Reconcile metric definitions against the remote catalog.
pub async fn reconcile_metrics<C: CatalogClient>(client: &C, store: &StateStore, config_dir: &Path, recursive: bool) -> Result<RunReport> {
    let state = store.load_state::<Metric>()?;
    let config = load_config::<Metric>(config_dir, recursive)?;

    let drift = drift::detect(
        state,
        config,
        |m| m.spec.name.clone(),
        |m| m.spec.id.clone(),
        |m, id| m.spec.id = id,
        Metric::same_desired,
    );

    let mut report = RunReport::default();
    let mut out: Vec<Metric> = Vec::new();

    // Deletes run first so unique names are free for reuse by creates.
    for metric in drift.deleted {
        match &metric.spec.id {
            None => report.deleted += 1,
            Some(id) => match client.delete_metric(id).await {
                Ok(()) | Err(CatalogError::NotFound) => report.deleted += 1,
                Err(e) => {
                    note_failure(&mut report, Kind::Metric, &metric.spec.name, "delete", &e)?;
                    out.push(metric);
                }
            },
        }
    }

    for metric in drift.unchanged {
        out.push(metric);
        report.unchanged += 1;
    }

    for mut metric in drift.created {
        match client.create_metric(&metric).await {
            Ok(id) => {
                metric.spec.id = Some(id);
                out.push(metric);
                report.created += 1;
            }
            Err(CatalogError::AlreadyExists) => match adopt_and_update(client, &mut metric).await {
                Ok(()) => {
                    out.push(metric);
                    report.updated += 1;
                }
                Err(e) => note_failure(&mut report, Kind::Metric, &metric.spec.name, "create", &e)?,
            },
            Err(e) => note_failure(&mut report, Kind::Metric, &metric.spec.name, "create", &e)?,
        }
    }

    for mut metric in drift.updated {
        match client.update_metric(&metric).await {
            Ok(()) => {
                out.push(metric);
                report.updated += 1;
            }
            Err(CatalogError::NotFound) => match adopt_and_update(client, &mut metric).await {
                Ok(()) => {
                    out.push(metric);
                    report.updated += 1;
                }
                Err(e) => note_failure(&mut report, Kind::Metric, &metric.spec.name, "update", &e)?,
            },
            Err(e) => note_failure(&mut report, Kind::Metric, &metric.spec.name, "update", &e)?,
        }
    }

    store.write_state(out)?;
    Ok(report)
}

/// The already-exists / not-found pivot: refresh the ID by unique name and
/// retry the update exactly once.
async fn adopt_and_update<C: CatalogClient>(client: &C, metric: &mut Metric) -> CatalogResult<()> {
    let id = client.get_metric_by_name(&metric.spec.name).await?;
    metric.spec.id = Some(id);
    client.update_metric(metric).await
}
