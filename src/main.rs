//! Declarative catalog management: reconcile YAML-described components,
//! metrics, and scorecards against a remote catalog.

use fact_catalog::commands::{Host, run};
use std::io::Write;
use std::io::{stderr, stdout};
use std::process::ExitCode;

/// Default host that writes to the real standard streams.
#[derive(Debug, Clone, Default)]
pub struct RealHost;

impl Host for RealHost {
    fn output(&mut self) -> impl Write {
        stdout()
    }

    fn error(&mut self) -> impl Write {
        stderr()
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let env = env_logger::Env::default().filter_or("RUST_LOG", "warn");
    env_logger::Builder::from_env(env).init();

    let mut host = RealHost;
    match run(&mut host, std::env::args()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(failure) => {
            let _ = writeln!(stderr(), "catalog: {failure}");
            ExitCode::from(failure.exit_code())
        }
    }
}
