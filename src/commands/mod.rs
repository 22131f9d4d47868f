//! Command-line interface and orchestration for the `catalog` tool.
//!
//! The `run` function parses arguments with clap and routes to one of the
//! handlers: per-kind CRUD against the remote catalog, `apply` for the full
//! reconciliation of a config tree, `bind` for metric ↔ component linking,
//! and `compute` for pushing a single metric value.

mod apply;
mod bind;
mod compute;
mod crud;
mod host;
mod run;

pub use apply::ApplyArgs;
pub use bind::BindArgs;
pub use compute::ComputeArgs;
pub use crud::CrudCommand;
pub use host::Host;
pub use run::{Failure, run};
