//! On-disk desired-state and last-applied-state plumbing: per-kind YAML
//! state files, config tree globbing, and the advisory state lock.

mod lock;
mod store;

pub use lock::{StateLockGuard, acquire_state_lock};
pub use store::{StateResource, StateStore, load_config};
