//! The `compute` command: evaluate one metric source and push the value.

use super::{Failure, Host};
use crate::catalog::{CatalogClient, CompassClient};
use crate::codehost::GitHubClient;
use crate::config::Settings;
use crate::facts::FactEngine;
use crate::model::{self, Component, MetricSource, STATUS_ACTIVE};
use crate::state::StateStore;
use chrono::Utc;
use ohno::app_err;
use std::io::Write;
use std::path::PathBuf;

#[derive(clap::Args, Debug)]
pub struct ComputeArgs {
    /// Component type (used to derive the metric source name)
    #[arg(long = "type")]
    pub component_type: String,

    /// Component name
    #[arg(long)]
    pub component: String,

    /// Metric name
    #[arg(long)]
    pub metric: String,

    /// Directory holding the recorded state files
    #[arg(long, default_value = ".state")]
    pub state_dir: PathBuf,
}

pub async fn compute<H: Host>(host: &mut H, args: &ComputeArgs) -> Result<(), Failure> {
    let settings = Settings::from_env().map_err(Failure::User)?;
    let catalog = CompassClient::new(&settings.compass_token, &settings.compass_host, &settings.compass_cloud_id).map_err(Failure::Internal)?;
    let github = GitHubClient::new(&settings.github_user, &settings.github_token, &settings.github_org).map_err(Failure::Internal)?;

    let store = StateStore::new(&args.state_dir);
    let sources: Vec<MetricSource> = store.load_state().map_err(Failure::Internal)?;

    let name = model::metric_source_name(&args.metric, &args.component, &args.component_type);
    let source = sources
        .iter()
        .find(|s| s.spec.name == name)
        .ok_or_else(|| Failure::User(app_err!("metric source '{name}' not found in state, run 'catalog bind' first")))?;

    if source.metadata.status != STATUS_ACTIVE {
        return Err(Failure::User(app_err!("metric source '{name}' is {}", source.metadata.status)));
    }
    let source_id = source
        .spec
        .id
        .as_deref()
        .ok_or_else(|| Failure::User(app_err!("metric source '{name}' has no remote ID")))?;

    let components: Vec<Component> = store.load_state().map_err(Failure::Internal)?;
    let engine = FactEngine::new(github, components)
        .map_err(Failure::Internal)?
        .with_json_api_base(settings.prometheus_url);
    let value = engine.evaluate(&source.metadata.facts).await.map_err(Failure::Remote)?;

    catalog
        .push_metric(source_id, value, Utc::now())
        .await
        .map_err(|e| Failure::Remote(app_err!("failed to push metric value: {e}")))?;

    let _ = writeln!(host.output(), "{name} = {value}");
    Ok(())
}
