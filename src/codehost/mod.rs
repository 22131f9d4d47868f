//! Code host boundary: read-only access to repositories on a Git forge.

mod github;

pub use github::GitHubClient;

use std::collections::BTreeMap;

/// Classified failure of one code host operation.
#[derive(Debug)]
pub enum CodeHostError {
    /// Repository, file, or property set does not exist.
    NotFound,

    /// The token was rejected; fatal for the run.
    Unauthorized,

    /// The response did not decode as expected.
    Decode(ohno::AppError),

    /// Connection, timeout, or unexpected status.
    Transport(ohno::AppError),
}

impl core::fmt::Display for CodeHostError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "not found on code host"),
            Self::Unauthorized => write!(f, "code host rejected the credentials"),
            Self::Decode(e) => write!(f, "code host response decode failure: {e}"),
            Self::Transport(e) => write!(f, "code host transport failure: {e}"),
        }
    }
}

impl core::error::Error for CodeHostError {}

impl From<reqwest::Error> for CodeHostError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.into())
    }
}

pub type CodeHostResult<T> = core::result::Result<T, CodeHostError>;

/// Read-only operations the fact collectors and reconcilers need from a
/// code forge. Content always comes back as decoded text.
pub trait CodeHost {
    async fn get_file_content(&self, repo: &str, path: &str) -> CodeHostResult<String>;
    async fn get_file_exists(&self, repo: &str, path: &str) -> CodeHostResult<bool>;
    async fn get_repo_properties(&self, repo: &str) -> CodeHostResult<BTreeMap<String, String>>;
    async fn get_repo_description(&self, repo: &str) -> CodeHostResult<String>;
    async fn search(&self, repo: &str, query: &str) -> CodeHostResult<Vec<String>>;

    /// Browser URL of a repository; pure, no network.
    fn get_repo_url(&self, repo: &str) -> String;
}
