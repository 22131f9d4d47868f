//! Command dispatch for the `catalog` CLI.

use super::{ApplyArgs, BindArgs, ComputeArgs, CrudCommand, Host, apply, bind, compute, crud};
use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use clap::{Parser, Subcommand};
use std::io::Write;

const CLAP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

#[derive(Parser, Debug)]
#[command(name = "catalog", version, author)]
#[command(about = "Reconcile declarative catalog definitions against the remote catalog")]
#[command(styles = CLAP_STYLES)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage a single component
    Component {
        #[command(subcommand)]
        command: CrudCommand,
    },
    /// Manage a single metric
    Metric {
        #[command(subcommand)]
        command: CrudCommand,
    },
    /// Manage a single scorecard
    Scorecard {
        #[command(subcommand)]
        command: CrudCommand,
    },
    /// Reconcile the whole config tree against the remote catalog
    Apply(ApplyArgs),
    /// Bind metrics to the components their type targets
    Bind(BindArgs),
    /// Evaluate one metric source's facts and push the value
    Compute(ComputeArgs),
}

/// A failed command, classified for the process exit code.
#[derive(Debug)]
pub enum Failure {
    /// Bad flags, unreadable or malformed input files: exit 1.
    User(ohno::AppError),

    /// The remote catalog or code host failed or refused: exit 2.
    Remote(ohno::AppError),

    /// Local infrastructure failure (state lock, HTTP client setup): exit 3.
    Internal(ohno::AppError),
}

impl Failure {
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::User(_) => 1,
            Self::Remote(_) => 2,
            Self::Internal(_) => 3,
        }
    }
}

impl core::fmt::Display for Failure {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::User(e) | Self::Remote(e) | Self::Internal(e) => write!(f, "{e}"),
        }
    }
}

/// Parse command-line arguments and dispatch to the matching handler.
pub async fn run<I, T, H>(host: &mut H, args: I) -> Result<(), Failure>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
    H: Host,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion) => {
            let _ = write!(host.output(), "{e}");
            return Ok(());
        }
        Err(e) => return Err(Failure::User(ohno::app_err!("{e}"))),
    };

    match &cli.command {
        Command::Component { command } => crud::component(host, command).await,
        Command::Metric { command } => crud::metric(host, command).await,
        Command::Scorecard { command } => crud::scorecard(host, command).await,
        Command::Apply(args) => apply::apply(host, args).await,
        Command::Bind(args) => bind::bind(host, args).await,
        Command::Compute(args) => compute::compute(host, args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::super::host::TestHost;
    use super::*;

    #[tokio::test]
    async fn test_help_is_not_a_failure() {
        let mut host = TestHost::new();
        run(&mut host, ["catalog", "--help"]).await.unwrap();
        assert!(!host.output_buf.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_subcommand_is_a_user_error() {
        let mut host = TestHost::new();
        let failure = run(&mut host, ["catalog", "frobnicate"]).await.unwrap_err();
        assert_eq!(failure.exit_code(), 1);
    }

    #[tokio::test]
    async fn test_delete_requires_an_id() {
        let mut host = TestHost::new();
        let failure = run(&mut host, ["catalog", "metric", "delete"]).await.unwrap_err();
        assert_eq!(failure.exit_code(), 1);
    }
}
