//! Single-resource commands: create, read, update, and delete one
//! component, metric, or scorecard without touching the state files.

use super::{Failure, Host};
use crate::catalog::{CatalogClient, CatalogError, CompassClient, CriteriaDiff};
use crate::config::Settings;
use crate::model::{self, Component, Metric, Scorecard};
use clap::Subcommand;
use ohno::app_err;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Subcommand, Debug)]
pub enum CrudCommand {
    /// Create the resource declared in a file
    Create(FileArgs),
    /// Look up a resource's remote identity by its stable reference
    Read(ReadArgs),
    /// Update the resource declared in a file
    Update(FileArgs),
    /// Delete a resource by remote ID
    Delete(DeleteArgs),
}

#[derive(clap::Args, Debug)]
pub struct FileArgs {
    /// YAML file declaring the resource
    #[arg(short, long)]
    pub file: PathBuf,
}

#[derive(clap::Args, Debug)]
pub struct ReadArgs {
    /// Slug for components, unique name for metrics and scorecards
    pub reference: String,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// Remote ID of the resource
    pub id: String,
}

pub async fn component<H: Host>(host: &mut H, command: &CrudCommand) -> Result<(), Failure> {
    let catalog = connect()?;

    match command {
        CrudCommand::Create(args) => {
            let mut component: Component = parse_file(&args.file)?;
            component.spec.slug = model::slug(&component.spec.name, &component.metadata.component_type);

            let created = catalog.create_component(&component).await.map_err(remote)?;
            let _ = writeln!(host.output(), "created component '{}' as {}", component.spec.name, created.id);
        }
        CrudCommand::Read(args) => {
            let found = catalog.get_component_by_slug(&args.reference).await.map_err(remote)?;
            let _ = writeln!(host.output(), "{}: {}", args.reference, found.id);
            for link in &found.links {
                let _ = writeln!(host.output(), "  link {} {} '{}' {}", link.id, link.link_type, link.name, link.url);
            }
        }
        CrudCommand::Update(args) => {
            let mut component: Component = parse_file(&args.file)?;
            component.spec.slug = model::slug(&component.spec.name, &component.metadata.component_type);
            if component.spec.id.is_none() {
                let found = catalog.get_component_by_slug(&component.spec.slug).await.map_err(remote)?;
                component.spec.id = Some(found.id);
            }

            let _ = catalog.update_component(&component).await.map_err(remote)?;
            let _ = writeln!(host.output(), "updated component '{}'", component.spec.name);
        }
        CrudCommand::Delete(args) => {
            catalog.delete_component(&args.id).await.map_err(remote)?;
            let _ = writeln!(host.output(), "deleted component {}", args.id);
        }
    }

    Ok(())
}

pub async fn metric<H: Host>(host: &mut H, command: &CrudCommand) -> Result<(), Failure> {
    let catalog = connect()?;

    match command {
        CrudCommand::Create(args) => {
            let metric: Metric = parse_file(&args.file)?;
            let id = catalog.create_metric(&metric).await.map_err(remote)?;
            let _ = writeln!(host.output(), "created metric '{}' as {id}", metric.spec.name);
        }
        CrudCommand::Read(args) => {
            let id = catalog.get_metric_by_name(&args.reference).await.map_err(remote)?;
            let _ = writeln!(host.output(), "{}: {id}", args.reference);
        }
        CrudCommand::Update(args) => {
            let mut metric: Metric = parse_file(&args.file)?;
            if metric.spec.id.is_none() {
                metric.spec.id = Some(catalog.get_metric_by_name(&metric.spec.name).await.map_err(remote)?);
            }

            catalog.update_metric(&metric).await.map_err(remote)?;
            let _ = writeln!(host.output(), "updated metric '{}'", metric.spec.name);
        }
        CrudCommand::Delete(args) => {
            catalog.delete_metric(&args.id).await.map_err(remote)?;
            let _ = writeln!(host.output(), "deleted metric {}", args.id);
        }
    }

    Ok(())
}

pub async fn scorecard<H: Host>(host: &mut H, command: &CrudCommand) -> Result<(), Failure> {
    let catalog = connect()?;

    match command {
        CrudCommand::Create(args) => {
            let scorecard: Scorecard = parse_file(&args.file)?;
            let created = catalog.create_scorecard(&scorecard).await.map_err(remote)?;
            let _ = writeln!(host.output(), "created scorecard '{}' as {}", scorecard.spec.name, created.id);
        }
        CrudCommand::Read(args) => {
            let found = catalog.get_scorecard_by_name(&args.reference).await.map_err(remote)?;
            let _ = writeln!(host.output(), "{}: {}", args.reference, found.id);
            for (name, id) in &found.criteria_ids {
                let _ = writeln!(host.output(), "  criterion '{name}' {id}");
            }
        }
        CrudCommand::Update(args) => {
            let mut scorecard: Scorecard = parse_file(&args.file)?;
            if scorecard.spec.id.is_none() {
                let found = catalog.get_scorecard_by_name(&scorecard.spec.name).await.map_err(remote)?;
                scorecard.spec.id = Some(found.id);
                for criterion in &mut scorecard.spec.criteria {
                    if let Some(id) = found.criteria_ids.get(criterion.unique_key()) {
                        criterion.has_metric_value.id = Some(id.clone());
                    }
                }
            }

            // Criteria carrying an ID are updated in place, the rest created
            let mut diff = CriteriaDiff::default();
            for criterion in &scorecard.spec.criteria {
                if criterion.has_metric_value.id.is_some() {
                    diff.updated.push(criterion.clone());
                } else {
                    diff.created.push(criterion.clone());
                }
            }

            let _ = catalog.update_scorecard(&scorecard, &diff).await.map_err(remote)?;
            let _ = writeln!(host.output(), "updated scorecard '{}'", scorecard.spec.name);
        }
        CrudCommand::Delete(args) => {
            catalog.delete_scorecard(&args.id).await.map_err(remote)?;
            let _ = writeln!(host.output(), "deleted scorecard {}", args.id);
        }
    }

    Ok(())
}

fn connect() -> Result<CompassClient, Failure> {
    let settings = Settings::from_env().map_err(Failure::User)?;
    CompassClient::new(&settings.compass_token, &settings.compass_host, &settings.compass_cloud_id).map_err(Failure::Internal)
}

fn parse_file<T: DeserializeOwned>(path: &Path) -> Result<T, Failure> {
    let text = fs::read_to_string(path).map_err(|e| Failure::User(app_err!("failed to read '{}': {e}", path.display())))?;
    serde_yaml::from_str(&text).map_err(|e| Failure::User(app_err!("failed to parse '{}': {e}", path.display())))
}

fn remote(e: CatalogError) -> Failure {
    Failure::Remote(app_err!("{e}"))
}
