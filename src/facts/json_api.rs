use crate::Result;
use crate::facts::json;
use crate::model::{Fact, FactType};
use ohno::{IntoAppError, bail};
use serde_json::Value;

/// Collector for facts fetched from an arbitrary JSON API. Only
/// `jsonPath` facts are meaningful here; other types check false.
///
/// A fact URI starting with `/` is resolved against the base URL, so
/// Prometheus-style queries don't need the endpoint in every fact.
#[derive(Debug, Clone)]
pub struct JsonApiCollector {
    client: reqwest::Client,
    base_url: Option<String>,
}

impl JsonApiCollector {
    pub fn new() -> crate::Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder()
                .user_agent("fact-catalog")
                .build()
                .into_app_err("Failed to build HTTP client")?,
            base_url: None,
        })
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        self.base_url = base_url;
        self
    }

    fn resolve_uri(&self, fact: &Fact) -> Result<String> {
        if !fact.uri.starts_with('/') {
            return Ok(fact.uri.clone());
        }

        match &self.base_url {
            Some(base) => Ok(format!("{}{}", base.trim_end_matches('/'), fact.uri)),
            None => bail!("fact '{}': relative URI '{}' but no base URL is configured", fact.name, fact.uri),
        }
    }

    pub async fn check(&self, fact: &Fact) -> Result<bool> {
        if fact.fact_type != FactType::JsonPath {
            return Ok(false);
        }

        let doc = self.extract_json(fact).await?;
        let value = json::lookup(&doc, &fact.json_path)?;
        json::compare_extracted(&json::value_to_string(value), &fact.expected_value, &fact.expected_formula)
    }

    pub async fn inspect(&self, fact: &Fact) -> Result<f64> {
        if fact.fact_type != FactType::JsonPath {
            return Ok(0.0);
        }

        let doc = self.extract_json(fact).await?;
        let value = json::value_to_string(json::lookup(&doc, &fact.json_path)?);
        value
            .parse::<f64>()
            .into_app_err_with(|| format!("fact '{}': extracted value '{value}' is not numeric", fact.name))
    }

    async fn extract_json(&self, fact: &Fact) -> Result<Value> {
        let uri = self.resolve_uri(fact)?;
        let mut request = self.client.get(&uri);

        // The token itself never appears in config, only the name of the
        // environment variable holding it
        if let Some(auth) = &fact.auth {
            let token = match std::env::var(&auth.token_env_variable) {
                Ok(token) => token,
                Err(_) => bail!("fact '{}': environment variable '{}' is not set", fact.name, auth.token_env_variable),
            };
            request = request.header(&auth.header, token);
        }

        let resp = request
            .send()
            .await
            .into_app_err_with(|| format!("fact '{}': request to '{uri}' failed", fact.name))?;

        let status = resp.status();
        if !status.is_success() {
            bail!("fact '{}': '{uri}' returned HTTP {status}", fact.name);
        }

        resp.json()
            .await
            .into_app_err_with(|| format!("fact '{}': response from '{uri}' is not valid JSON", fact.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fact(uri: &str) -> Fact {
        Fact {
            name: "sample".to_owned(),
            uri: uri.to_owned(),
            ..Fact::default()
        }
    }

    #[test]
    fn test_absolute_uri_passes_through() {
        let collector = JsonApiCollector::new().unwrap();
        assert_eq!(collector.resolve_uri(&fact("https://api.example.com/v1")).unwrap(), "https://api.example.com/v1");
    }

    #[test]
    fn test_relative_uri_joins_the_base() {
        let collector = JsonApiCollector::new()
            .unwrap()
            .with_base_url(Some("https://prometheus.example.com/".to_owned()));
        assert_eq!(
            collector.resolve_uri(&fact("/api/v1/query?query=up")).unwrap(),
            "https://prometheus.example.com/api/v1/query?query=up"
        );
    }

    #[test]
    fn test_relative_uri_without_a_base_is_an_error() {
        let collector = JsonApiCollector::new().unwrap();
        assert!(collector.resolve_uri(&fact("/api/v1/query")).is_err());
    }
}
