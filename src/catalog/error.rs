use regex::Regex;
use std::sync::LazyLock;

/// Remote error messages signalling that the entity is already present.
/// The catalog phrases these as `... already exists.`
static ALREADY_EXISTS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"already exists\.").unwrap_or_else(|e| panic!("invalid regex: {e}")));

static NOT_FOUND: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)not found").unwrap_or_else(|e| panic!("invalid regex: {e}")));

/// Classified failure of one remote catalog operation.
///
/// `AlreadyExists` and `NotFound` are recoverable by the reconciler's pivot
/// (re-resolve the ID by reference, retry once); the rest are fatal for the
/// affected item or run.
#[derive(Debug)]
pub enum CatalogError {
    /// The remote already holds an entity with this unique reference.
    AlreadyExists,

    /// The entity addressed by ID no longer exists remotely.
    NotFound,

    /// Authentication or authorization failure; fatal for the whole run.
    Unauthorized,

    /// The remote refused the mutation with one or more error messages.
    Refused(Vec<String>),

    /// Connection, timeout, non-2xx, or decode failure.
    Transport(ohno::AppError),
}

impl CatalogError {
    /// Classify a failed mutation from the error messages in its payload.
    #[must_use]
    pub fn from_remote_messages(messages: Vec<String>) -> Self {
        if messages.iter().any(|m| ALREADY_EXISTS.is_match(m)) {
            Self::AlreadyExists
        } else if messages.iter().any(|m| NOT_FOUND.is_match(m)) {
            Self::NotFound
        } else {
            Self::Refused(messages)
        }
    }
}

impl core::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AlreadyExists => write!(f, "entity already exists remotely"),
            Self::NotFound => write!(f, "entity not found remotely"),
            Self::Unauthorized => write!(f, "catalog rejected the credentials"),
            Self::Refused(messages) => write!(f, "catalog refused the operation: {}", messages.join("; ")),
            Self::Transport(e) => write!(f, "catalog transport failure: {e}"),
        }
    }
}

impl core::error::Error for CatalogError {}

impl From<ohno::AppError> for CatalogError {
    fn from(e: ohno::AppError) -> Self {
        Self::Transport(e)
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_already_exists_detected() {
        let e = CatalogError::from_remote_messages(vec!["Component with this name already exists.".to_owned()]);
        assert!(matches!(e, CatalogError::AlreadyExists));
    }

    #[test]
    fn test_not_found_detected() {
        let e = CatalogError::from_remote_messages(vec!["Entity not found".to_owned()]);
        assert!(matches!(e, CatalogError::NotFound));
    }

    #[test]
    fn test_other_messages_are_refused() {
        let e = CatalogError::from_remote_messages(vec!["quota exceeded".to_owned()]);
        assert!(matches!(e, CatalogError::Refused(ref m) if m.len() == 1));
    }

    #[test]
    fn test_already_exists_wins_over_not_found() {
        let e = CatalogError::from_remote_messages(vec!["owner not found".to_owned(), "slug already exists.".to_owned()]);
        assert!(matches!(e, CatalogError::AlreadyExists));
    }
}
