use crate::codehost::{CodeHost, CodeHostError, CodeHostResult};
use ohno::{IntoAppError, app_err};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Log target for the GitHub client
const LOG_TARGET: &str = "codehost";

/// GitHub REST client scoped to one organization. Authenticates with
/// basic auth, a user plus a personal access token.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: reqwest::Client,
    user: String,
    token: String,
    api_base: String,
    web_base: String,
    org: String,
}

#[derive(Debug, Deserialize)]
struct RepoInfo {
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PropertyValue {
    property_name: String,
    #[serde(default)]
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResults {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    path: String,
}

impl GitHubClient {
    pub fn new(user: &str, token: &str, org: impl Into<String>) -> crate::Result<Self> {
        Self::with_base_urls(user, token, org, "https://api.github.com", "https://github.com")
    }

    /// Base URL injection for tests.
    pub fn with_base_urls(
        user: &str,
        token: &str,
        org: impl Into<String>,
        api_base: impl Into<String>,
        web_base: impl Into<String>,
    ) -> crate::Result<Self> {
        let mut headers = HeaderMap::new();
        let _ = headers.insert("X-GitHub-Api-Version", HeaderValue::from_static("2022-11-28"));

        Ok(Self {
            client: reqwest::Client::builder()
                .user_agent("fact-catalog")
                .default_headers(headers)
                .build()
                .into_app_err("Failed to build HTTP client")?,
            user: user.to_owned(),
            token: token.to_owned(),
            api_base: api_base.into(),
            web_base: web_base.into(),
            org: org.into(),
        })
    }

    async fn get(&self, url: &str, accept: &'static str) -> CodeHostResult<Response> {
        let resp = self
            .client
            .get(url)
            .basic_auth(&self.user, Some(&self.token))
            .header(ACCEPT, accept)
            .send()
            .await?;

        match resp.status() {
            StatusCode::NOT_FOUND => Err(CodeHostError::NotFound),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(CodeHostError::Unauthorized),
            status if status.is_success() => Ok(resp),
            status => Err(CodeHostError::Transport(app_err!("code host returned HTTP {status} for '{url}'"))),
        }
    }
}

impl CodeHost for GitHubClient {
    async fn get_file_content(&self, repo: &str, path: &str) -> CodeHostResult<String> {
        let url = format!("{}/repos/{}/{repo}/contents/{path}", self.api_base, self.org);

        // The raw media type skips the base64 JSON envelope
        let resp = self.get(&url, "application/vnd.github.raw+json").await?;
        resp.text().await.map_err(|e| CodeHostError::Decode(e.into()))
    }

    async fn get_file_exists(&self, repo: &str, path: &str) -> CodeHostResult<bool> {
        match self.get_file_content(repo, path).await {
            Ok(_) => Ok(true),
            Err(CodeHostError::NotFound) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn get_repo_properties(&self, repo: &str) -> CodeHostResult<BTreeMap<String, String>> {
        let url = format!("{}/repos/{}/{repo}/properties/values", self.api_base, self.org);
        let resp = self.get(&url, "application/vnd.github+json").await?;

        let values: Vec<PropertyValue> = resp.json().await.map_err(|e| CodeHostError::Decode(e.into()))?;
        Ok(values
            .into_iter()
            .filter_map(|p| p.value.map(|v| (p.property_name, v)))
            .collect())
    }

    async fn get_repo_description(&self, repo: &str) -> CodeHostResult<String> {
        let url = format!("{}/repos/{}/{repo}", self.api_base, self.org);
        let resp = self.get(&url, "application/vnd.github+json").await?;

        let info: RepoInfo = resp.json().await.map_err(|e| CodeHostError::Decode(e.into()))?;
        Ok(info.description.unwrap_or_default())
    }

    async fn search(&self, repo: &str, query: &str) -> CodeHostResult<Vec<String>> {
        let url = format!("{}/search/code", self.api_base);
        let q = format!("{query} repo:{}/{repo}", self.org);

        let resp = self
            .client
            .get(&url)
            .basic_auth(&self.user, Some(&self.token))
            .query(&[("q", q.as_str())])
            .header(ACCEPT, "application/vnd.github+json")
            .send()
            .await?;

        match resp.status() {
            StatusCode::NOT_FOUND => return Err(CodeHostError::NotFound),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => return Err(CodeHostError::Unauthorized),
            status if !status.is_success() => {
                return Err(CodeHostError::Transport(app_err!("code search returned HTTP {status}")));
            }
            _ => {}
        }

        let results: SearchResults = resp.json().await.map_err(|e| CodeHostError::Decode(e.into()))?;
        log::debug!(target: LOG_TARGET, "Search '{query}' in '{repo}' matched {} files", results.items.len());
        Ok(results.items.into_iter().map(|i| i.path).collect())
    }

    fn get_repo_url(&self, repo: &str) -> String {
        format!("{}/{}/{repo}", self.web_base, self.org)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_url_is_pure() {
        let client = GitHubClient::new("u", "t", "acme").unwrap();
        assert_eq!(client.get_repo_url("billing"), "https://github.com/acme/billing");
    }

    #[test]
    fn test_property_values_skip_nulls() {
        let json = r#"[
            { "property_name": "DefaultBranch", "value": "main" },
            { "property_name": "Deprecated", "value": null }
        ]"#;

        let values: Vec<PropertyValue> = serde_json::from_str(json).unwrap();
        let map: BTreeMap<String, String> = values.into_iter().filter_map(|p| p.value.map(|v| (p.property_name, v))).collect();

        assert_eq!(map.len(), 1);
        assert_eq!(map.get("DefaultBranch").map(String::as_str), Some("main"));
    }

    #[test]
    fn test_search_results_decode() {
        let json = r#"{ "total_count": 2, "items": [ { "path": "Dockerfile" }, { "path": "build/Dockerfile" } ] }"#;
        let results: SearchResults = serde_json::from_str(json).unwrap();
        assert_eq!(results.items.len(), 2);
    }
}
