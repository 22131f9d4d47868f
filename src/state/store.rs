use crate::Result;
use crate::model::{Component, Kind, Metric, MetricSource, Scorecard};
use ohno::{IntoAppError, bail};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Log target for the state store
const LOG_TARGET: &str = "state";

/// A resource kind that can be persisted to a per-kind state file.
pub trait StateResource: Serialize + DeserializeOwned + Clone {
    const KIND: Kind;

    fn unique_key(&self) -> &str;
}

impl StateResource for Component {
    const KIND: Kind = Kind::Component;

    fn unique_key(&self) -> &str {
        self.unique_key()
    }
}

impl StateResource for Metric {
    const KIND: Kind = Kind::Metric;

    fn unique_key(&self) -> &str {
        self.unique_key()
    }
}

impl StateResource for Scorecard {
    const KIND: Kind = Kind::Scorecard;

    fn unique_key(&self) -> &str {
        self.unique_key()
    }
}

impl StateResource for MetricSource {
    const KIND: Kind = Kind::MetricSource;

    fn unique_key(&self) -> &str {
        self.unique_key()
    }
}

/// Loads and writes the per-kind YAML state files under one directory.
#[derive(Debug, Clone)]
pub struct StateStore {
    state_dir: PathBuf,
}

impl StateStore {
    #[must_use]
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        Self { state_dir: state_dir.into() }
    }

    /// Path of the state file for a kind: `<stateDir>/<kind>.yaml`.
    #[must_use]
    pub fn state_file(&self, kind: Kind) -> PathBuf {
        self.state_dir.join(format!("{}.yaml", kind.file_stem()))
    }

    /// Load the recorded state for one kind. A missing file is an empty
    /// collection, not an error.
    pub fn load_state<T: StateResource>(&self) -> Result<Vec<T>> {
        let path = self.state_file(T::KIND);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e).into_app_err_with(|| format!("Failed to read state file '{}'", path.display())),
        };

        let items = parse_documents::<T>(&text, &path)?;
        ensure_unique_keys(&items, &path)?;
        Ok(items)
    }

    /// Replace the recorded state for one kind.
    ///
    /// An empty collection removes the file (missing is fine). A non-empty
    /// collection is sorted by unique key, serialized as a multi-document
    /// stream, and swapped in atomically via a temp file rename.
    pub fn write_state<T: StateResource>(&self, mut items: Vec<T>) -> Result<()> {
        let path = self.state_file(T::KIND);

        if items.is_empty() {
            log::debug!(target: LOG_TARGET, "No {} items left, removing '{}'", T::KIND, path.display());
            return match fs::remove_file(&path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e).into_app_err_with(|| format!("Failed to remove state file '{}'", path.display())),
            };
        }

        items.sort_by(|a, b| a.unique_key().cmp(b.unique_key()));

        let mut docs = Vec::with_capacity(items.len());
        for item in &items {
            docs.push(
                serde_yaml::to_string(item)
                    .into_app_err_with(|| format!("Failed to encode {} '{}'", T::KIND, item.unique_key()))?,
            );
        }

        fs::create_dir_all(&self.state_dir)
            .into_app_err_with(|| format!("Failed to create state directory '{}'", self.state_dir.display()))?;

        let tmp_path = path.with_extension("yaml.tmp");
        fs::write(&tmp_path, docs.join("---\n"))
            .into_app_err_with(|| format!("Failed to write state file '{}'", tmp_path.display()))?;
        fs::rename(&tmp_path, &path)
            .into_app_err_with(|| format!("Failed to replace state file '{}'", path.display()))?;

        log::debug!(target: LOG_TARGET, "Wrote {} {} items to '{}'", items.len(), T::KIND, path.display());
        Ok(())
    }
}

/// Load the desired-state config for one kind from a directory tree.
///
/// Matches files named `<kind>*.yaml` / `<kind>*.yml` anywhere in the tree
/// when `recursive`, or in the top directory only otherwise. Each file may
/// hold multiple YAML documents.
pub fn load_config<T: StateResource>(config_dir: &Path, recursive: bool) -> Result<Vec<T>> {
    let stem = T::KIND.file_stem();
    let max_depth = if recursive { usize::MAX } else { 1 };

    let mut items = Vec::new();
    for entry in WalkDir::new(config_dir).max_depth(max_depth).sort_by_file_name() {
        let entry = entry.into_app_err_with(|| format!("Failed to walk config directory '{}'", config_dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let Some(name) = entry.file_name().to_str() else {
            continue;
        };

        if !name.starts_with(stem) || !(name.ends_with(".yaml") || name.ends_with(".yml")) {
            continue;
        }

        let text = fs::read_to_string(entry.path())
            .into_app_err_with(|| format!("Failed to read config file '{}'", entry.path().display()))?;
        items.extend(parse_documents::<T>(&text, entry.path())?);
    }

    ensure_unique_keys(&items, config_dir)?;
    Ok(items)
}

fn parse_documents<T: StateResource>(text: &str, path: &Path) -> Result<Vec<T>> {
    let mut items = Vec::new();
    for doc in serde_yaml::Deserializer::from_str(text) {
        let value = serde_yaml::Value::deserialize(doc)
            .into_app_err_with(|| format!("Failed to decode {} document in '{}'", T::KIND, path.display()))?;

        // A stream like "a\n---\n" yields a trailing null document
        if value.is_null() {
            continue;
        }

        items.push(
            serde_yaml::from_value(value)
                .into_app_err_with(|| format!("Failed to decode {} document in '{}'", T::KIND, path.display()))?,
        );
    }

    Ok(items)
}

fn ensure_unique_keys<T: StateResource>(items: &[T], path: &Path) -> Result<()> {
    let mut seen = BTreeSet::new();
    for item in items {
        if !seen.insert(item.unique_key()) {
            bail!("Duplicate {} '{}' in '{}'", T::KIND, item.unique_key(), path.display());
        }
    }

    Ok(())
}
