use crate::Result;
use fs4::fs_std::FileExt;
use ohno::IntoAppError;
use std::fs::{File, OpenOptions};
use std::path::Path;

/// Log target for the state lock
const LOG_TARGET: &str = "state";

/// Guard that releases the state directory lock when dropped
#[derive(Debug)]
pub struct StateLockGuard(File);

impl Drop for StateLockGuard {
    fn drop(&mut self) {
        // Lock is automatically released when the file is closed
        if let Err(e) = self.0.unlock() {
            log::warn!(target: LOG_TARGET, "Failed to unlock state directory: {e}");
        }
    }
}

/// Acquire an advisory lock on the state directory.
///
/// Concurrent runs against the same state directory are not supported; the
/// lock turns a silent last-writer-wins into a wait.
pub async fn acquire_state_lock(state_dir: &Path) -> Result<StateLockGuard> {
    std::fs::create_dir_all(state_dir)
        .into_app_err_with(|| format!("Failed to create state directory '{}'", state_dir.display()))?;

    let lock_path = state_dir.join(".lock");

    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&lock_path)
        .into_app_err_with(|| format!("Failed to open state lock file at '{}'", lock_path.display()))?;

    // Block until we can acquire the lock
    // This needs to run in a blocking task since it may block for an extended time
    let file = tokio::task::spawn_blocking(move || {
        file.lock_exclusive()
            .into_app_err_with(|| format!("Failed to acquire exclusive lock on state at '{}'", lock_path.display()))?;
        log::debug!(target: LOG_TARGET, "Acquired state lock at '{}'", lock_path.display());
        Ok::<_, ohno::AppError>(file)
    })
    .await
    .into_app_err("Lock task panicked")??;

    Ok(StateLockGuard(file))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lock_creates_directory_and_lock_file() {
        let dir = tempfile::tempdir().unwrap();
        let state_dir = dir.path().join("nested").join(".state");

        let guard = acquire_state_lock(&state_dir).await.unwrap();
        assert!(state_dir.join(".lock").exists());
        drop(guard);
    }

    #[tokio::test]
    async fn test_lock_can_be_reacquired_after_drop() {
        let dir = tempfile::tempdir().unwrap();

        let guard = acquire_state_lock(dir.path()).await.unwrap();
        drop(guard);
        let guard = acquire_state_lock(dir.path()).await.unwrap();
        drop(guard);
    }
}
