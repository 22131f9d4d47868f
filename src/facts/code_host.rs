use crate::Result;
use crate::codehost::CodeHost;
use crate::facts::json;
use crate::model::{Fact, FactType};
use ohno::{IntoAppError, bail};
use regex::Regex;
use serde_json::Value;
use std::path::Path;

/// Collector for facts sourced from the code host.
#[derive(Debug)]
pub struct CodeHostCollector<H> {
    host: H,
}

impl<H: CodeHost> CodeHostCollector<H> {
    pub const fn new(host: H) -> Self {
        Self { host }
    }

    pub async fn check(&self, fact: &Fact) -> Result<bool> {
        match fact.fact_type {
            FactType::FileExists => self
                .host
                .get_file_exists(&fact.repo, &fact.file_path)
                .await
                .into_app_err_with(|| format!("fact '{}': file existence check failed", fact.name)),
            FactType::FileRegex => self.check_file_regex(fact).await,
            FactType::JsonPath => {
                let doc = self.extract_json(fact).await?;
                let value = json::lookup(&doc, &fact.json_path)?;
                json::compare_extracted(&json::value_to_string(value), &fact.expected_value, &fact.expected_formula)
            }
            FactType::RepoProperties => self.check_repo_properties(fact).await,
            FactType::RepoSearch => {
                let results = self
                    .host
                    .search(&fact.repo, &fact.repos_search_query)
                    .await
                    .into_app_err_with(|| format!("fact '{}': repository search failed", fact.name))?;
                Ok(!results.is_empty())
            }
            FactType::Unknown => bail!("fact '{}': unsupported fact type", fact.name),
        }
    }

    pub async fn inspect(&self, fact: &Fact) -> Result<f64> {
        let doc = self.extract_json(fact).await?;
        let value = json::value_to_string(json::lookup(&doc, &fact.json_path)?);
        value
            .parse::<f64>()
            .into_app_err_with(|| format!("fact '{}': extracted value '{value}' is not numeric", fact.name))
    }

    async fn check_file_regex(&self, fact: &Fact) -> Result<bool> {
        let content = self
            .host
            .get_file_content(&fact.repo, &fact.file_path)
            .await
            .into_app_err_with(|| format!("fact '{}': failed to fetch '{}'", fact.name, fact.file_path))?;

        let pattern = Regex::new(&fact.regex_pattern)
            .into_app_err_with(|| format!("fact '{}': invalid pattern '{}'", fact.name, fact.regex_pattern))?;
        Ok(pattern.is_match(&content))
    }

    async fn check_repo_properties(&self, fact: &Fact) -> Result<bool> {
        let properties = self
            .host
            .get_repo_properties(&fact.repo)
            .await
            .into_app_err_with(|| format!("fact '{}': failed to fetch repo properties", fact.name))?;

        let Some(value) = properties.get(&fact.repo_property) else {
            bail!("fact '{}': repo property '{}' does not exist", fact.name, fact.repo_property);
        };

        if !fact.expected_value.is_empty() {
            return Ok(*value == fact.expected_value);
        }

        crate::facts::eval::expression(&format!("{value} {}", fact.expected_formula))
    }

    /// Fetch a `.json` or `.toml` file and decode it to a JSON value.
    async fn extract_json(&self, fact: &Fact) -> Result<Value> {
        let extension = Path::new(&fact.file_path).extension().and_then(|e| e.to_str()).unwrap_or_default();
        if extension != "json" && extension != "toml" {
            bail!("fact '{}': unsupported file extension '{extension}'", fact.name);
        }

        let content = self
            .host
            .get_file_content(&fact.repo, &fact.file_path)
            .await
            .into_app_err_with(|| format!("fact '{}': failed to fetch '{}'", fact.name, fact.file_path))?;

        if extension == "toml" {
            return json::toml_to_json(&content);
        }

        serde_json::from_str(&content).into_app_err_with(|| format!("fact '{}': '{}' is not valid JSON", fact.name, fact.file_path))
    }
}
