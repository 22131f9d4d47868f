use serde::{Deserialize, Serialize};

/// Where a fact's data comes from. Unknown sources deserialize to
/// `Unknown` so that newer config files can carry sources this build
/// does not understand; the engine skips them in `all`/`any`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum FactSource {
    #[serde(rename = "code-host")]
    #[strum(serialize = "code-host")]
    CodeHost,

    #[serde(rename = "json-api")]
    #[strum(serialize = "json-api")]
    JsonApi,

    #[serde(rename = "component")]
    #[strum(serialize = "component")]
    Component,

    #[serde(other)]
    #[strum(serialize = "unknown")]
    Unknown,
}

/// The extraction algorithm a fact runs against its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum FactType {
    #[serde(rename = "fileExists")]
    #[strum(serialize = "fileExists")]
    FileExists,

    #[serde(rename = "fileRegex")]
    #[strum(serialize = "fileRegex")]
    FileRegex,

    #[serde(rename = "jsonPath")]
    #[strum(serialize = "jsonPath")]
    JsonPath,

    #[serde(rename = "repoProperties")]
    #[strum(serialize = "repoProperties")]
    RepoProperties,

    #[serde(rename = "repoSearch")]
    #[strum(serialize = "repoSearch")]
    RepoSearch,

    #[serde(other)]
    #[strum(serialize = "unknown")]
    Unknown,
}

/// Credentials for facts that hit an authenticated JSON API. The token is
/// never stored in config; only the name of the environment variable
/// holding it is.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FactAuth {
    pub header: String,
    pub token_env_variable: String,
}

/// A single unit predicate or value source. Which fields are meaningful
/// depends on `fact_type`; the rest stay empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Fact {
    pub name: String,
    pub source: FactSource,
    pub fact_type: FactType,
    pub repo: String,
    pub file_path: String,
    pub regex_pattern: String,
    pub json_path: String,
    pub repo_property: String,
    pub repos_search_query: String,
    pub uri: String,
    pub component_name: String,
    pub expected_value: String,
    pub expected_formula: String,
    pub auth: Option<FactAuth>,
}

impl Default for Fact {
    fn default() -> Self {
        Self {
            name: String::new(),
            source: FactSource::Unknown,
            fact_type: FactType::Unknown,
            repo: String::new(),
            file_path: String::new(),
            regex_pattern: String::new(),
            json_path: String::new(),
            repo_property: String::new(),
            repos_search_query: String::new(),
            uri: String::new(),
            component_name: String::new(),
            expected_value: String::new(),
            expected_formula: String::new(),
            auth: None,
        }
    }
}

/// How a metric source combines its facts.
///
/// The value is truthy iff every fact in `all` checks true and, when `any`
/// is non-empty, at least one fact in `any` checks true. `inspect` yields a
/// numeric value directly and only applies when both lists are empty.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FactOperations {
    pub all: Vec<Fact>,
    pub any: Vec<Fact>,
    pub inspect: Option<Fact>,
}

impl FactOperations {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.all.is_empty() && self.any.is_empty() && self.inspect.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fact_source_round_trip() {
        let yaml = "source: code-host\nfactType: fileExists\n";
        let fact: Fact = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(fact.source, FactSource::CodeHost);
        assert_eq!(fact.fact_type, FactType::FileExists);
    }

    #[test]
    fn test_unknown_source_is_tolerated() {
        let yaml = "source: gitlab-ci\nfactType: fileExists\n";
        let fact: Fact = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(fact.source, FactSource::Unknown);
    }

    #[test]
    fn test_unknown_fact_type_is_tolerated_at_parse_time() {
        let yaml = "source: component\nfactType: spaceAge\n";
        let fact: Fact = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(fact.fact_type, FactType::Unknown);
    }

    #[test]
    fn test_operations_default_is_empty() {
        let ops = FactOperations::default();
        assert!(ops.is_empty());
    }

    #[test]
    fn test_auth_parses() {
        let yaml = "source: json-api\nfactType: jsonPath\nauth:\n  header: Authorization\n  tokenEnvVariable: MY_TOKEN\n";
        let fact: Fact = serde_yaml::from_str(yaml).unwrap();
        let auth = fact.auth.unwrap();
        assert_eq!(auth.header, "Authorization");
        assert_eq!(auth.token_env_variable, "MY_TOKEN");
    }
}
