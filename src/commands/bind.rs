//! The `bind` command: metric ↔ component linking.

use super::{Failure, Host};
use crate::catalog::CompassClient;
use crate::config::Settings;
use crate::reconcile::bind_metric_sources;
use crate::state::{StateStore, acquire_state_lock};
use ohno::app_err;
use std::io::Write;
use std::path::PathBuf;

#[derive(clap::Args, Debug)]
pub struct BindArgs {
    /// Directory holding the recorded state files
    #[arg(long, default_value = ".state")]
    pub state_dir: PathBuf,
}

pub async fn bind<H: Host>(host: &mut H, args: &BindArgs) -> Result<(), Failure> {
    let settings = Settings::from_env().map_err(Failure::User)?;
    let catalog = CompassClient::new(&settings.compass_token, &settings.compass_host, &settings.compass_cloud_id).map_err(Failure::Internal)?;

    let _lock = acquire_state_lock(&args.state_dir).await.map_err(Failure::Internal)?;
    let store = StateStore::new(&args.state_dir);

    let report = bind_metric_sources(&catalog, &store).await.map_err(Failure::Remote)?;

    let _ = writeln!(host.output(), "bind: {report}");
    if report.is_clean() {
        Ok(())
    } else {
        Err(Failure::Remote(app_err!("{} metric sources failed to bind", report.failed)))
    }
}
