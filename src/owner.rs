//! Owner resolution: map `(tribe, squad)` to the catalog owner identity
//! recorded in the org directory.
//!
//! The directory is a multi-document YAML stream of group documents
//! (tribes and squads) fetched from the code host by the caller; this
//! module is pure over the parsed form.

use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Group {
    metadata: GroupMetadata,
    spec: GroupSpec,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct GroupMetadata {
    name: String,
    links: Vec<GroupLink>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct GroupLink {
    url: String,
    title: String,
    icon: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct GroupSpec {
    id: String,
    #[serde(rename = "type")]
    group_type: String,
    parent: String,
    profile: GroupProfile,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct GroupProfile {
    display_name: String,
}

/// A resolved owner: the catalog identity plus the links a component
/// inherits from its squad.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Owner {
    pub owner_id: String,
    pub display_name: String,
    pub slack_channels: BTreeMap<String, String>,
    pub projects: BTreeMap<String, String>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum OwnerError {
    /// No squad group with this name exists in the directory.
    SquadUnknown(String),

    /// The squad exists but belongs to a different tribe.
    TribeMismatch { squad: String, expected: String, given: String },
}

impl core::fmt::Display for OwnerError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::SquadUnknown(squad) => write!(f, "squad '{squad}' is not in the org directory"),
            Self::TribeMismatch { squad, expected, given } => {
                write!(f, "squad '{squad}' belongs to tribe '{expected}', not '{given}'")
            }
        }
    }
}

impl core::error::Error for OwnerError {}

/// The parsed org directory.
#[derive(Debug, Default)]
pub struct OwnerDirectory {
    groups: Vec<Group>,
}

impl OwnerDirectory {
    /// Parse the org directory from its multi-document YAML form.
    pub fn parse(content: &str) -> crate::Result<Self> {
        use ohno::IntoAppError;

        let mut groups = Vec::new();
        for doc in serde_yaml::Deserializer::from_str(content) {
            let value = serde_yaml::Value::deserialize(doc).into_app_err("Failed to decode org directory document")?;
            if value.is_null() {
                continue;
            }

            groups.push(serde_yaml::from_value(value).into_app_err("Failed to decode org directory group")?);
        }

        Ok(Self { groups })
    }

    /// Resolve a `(tribe, squad)` pair to its owner.
    pub fn resolve(&self, tribe: &str, squad: &str) -> core::result::Result<Owner, OwnerError> {
        let group = self
            .groups
            .iter()
            .find(|g| g.spec.group_type == "squad" && g.metadata.name == squad)
            .ok_or_else(|| OwnerError::SquadUnknown(squad.to_owned()))?;

        if group.spec.parent != tribe {
            return Err(OwnerError::TribeMismatch {
                squad: squad.to_owned(),
                expected: group.spec.parent.clone(),
                given: tribe.to_owned(),
            });
        }

        let mut owner = Owner {
            owner_id: group.spec.id.clone(),
            display_name: group.spec.profile.display_name.clone(),
            ..Owner::default()
        };

        for link in &group.metadata.links {
            if link.icon == "slack" || link.title.contains("Slack") {
                let _ = owner.slack_channels.insert(link.title.clone(), link.url.clone());
            } else if link.icon == "project" || link.title.contains("Jira") {
                let _ = owner.projects.insert(link.title.clone(), link.url.clone());
            }
        }

        Ok(owner)
    }
}
