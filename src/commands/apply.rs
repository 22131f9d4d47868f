//! The `apply` command: full reconciliation of a config tree.

use super::{Failure, Host};
use crate::catalog::CompassClient;
use crate::codehost::{CodeHost, GitHubClient};
use crate::config::Settings;
use crate::model::Kind;
use crate::owner::OwnerDirectory;
use crate::reconcile::{RunReport, reconcile_components, reconcile_metrics, reconcile_scorecards};
use crate::state::{StateStore, acquire_state_lock};
use ohno::app_err;
use std::io::Write;
use std::path::PathBuf;

/// Repository and file holding the org directory of tribes and squads.
const ORG_DIRECTORY_REPO: &str = "of-org";
const ORG_DIRECTORY_FILE: &str = "main.yaml";

#[derive(clap::Args, Debug)]
pub struct ApplyArgs {
    /// Directory tree holding the desired-state YAML documents
    #[arg(long, default_value = ".")]
    pub config_dir: PathBuf,

    /// Directory holding the recorded state files
    #[arg(long, default_value = ".state")]
    pub state_dir: PathBuf,

    /// Recurse into subdirectories of the config tree
    #[arg(long)]
    pub recursive: bool,

    /// Limit the run to one kind (metric, scorecard, or component)
    #[arg(long)]
    pub kind: Option<String>,
}

pub async fn apply<H: Host>(host: &mut H, args: &ApplyArgs) -> Result<(), Failure> {
    let settings = Settings::from_env().map_err(Failure::User)?;
    let catalog = CompassClient::new(&settings.compass_token, &settings.compass_host, &settings.compass_cloud_id).map_err(Failure::Internal)?;
    let github = GitHubClient::new(&settings.github_user, &settings.github_token, &settings.github_org).map_err(Failure::Internal)?;

    // Metrics first so scorecard criteria and bind can reference their IDs
    let kinds: Vec<Kind> = match &args.kind {
        None => Kind::ALL.into_iter().filter(|k| *k != Kind::MetricSource).collect(),
        Some(name) => match name.parse() {
            Ok(Kind::MetricSource) => {
                return Err(Failure::User(app_err!("metric sources are managed by 'catalog bind'")));
            }
            Ok(kind) => vec![kind],
            Err(_) => return Err(Failure::User(app_err!("unknown kind '{name}'"))),
        },
    };

    let _lock = acquire_state_lock(&args.state_dir).await.map_err(Failure::Internal)?;
    let store = StateStore::new(&args.state_dir);

    let mut report = RunReport::default();
    for kind in kinds {
        let partial = match kind {
            Kind::Metric => reconcile_metrics(&catalog, &store, &args.config_dir, args.recursive).await,
            Kind::Scorecard => reconcile_scorecards(&catalog, &store, &args.config_dir, args.recursive).await,
            Kind::Component => {
                let owners = load_owner_directory(&github).await.map_err(Failure::Remote)?;
                reconcile_components(&catalog, &github, &owners, &store, &args.config_dir, args.recursive).await
            }
            Kind::MetricSource => Ok(RunReport::default()),
        }
        .map_err(Failure::Remote)?;
        report.absorb(partial);
    }

    let _ = writeln!(host.output(), "apply: {report}");
    if report.is_clean() {
        Ok(())
    } else {
        Err(Failure::Remote(app_err!("{} items failed to reconcile", report.failed)))
    }
}

async fn load_owner_directory(github: &GitHubClient) -> crate::Result<OwnerDirectory> {
    let content = github
        .get_file_content(ORG_DIRECTORY_REPO, ORG_DIRECTORY_FILE)
        .await
        .map_err(|e| app_err!("failed to fetch the org directory from '{ORG_DIRECTORY_REPO}': {e}"))?;

    OwnerDirectory::parse(&content)
}
