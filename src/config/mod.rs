//! Runtime settings sourced from the environment.

use crate::Result;
use ohno::bail;

pub const ENV_GITHUB_ORG: &str = "FC_GITHUB_ORG";
pub const ENV_GITHUB_USER: &str = "FC_GITHUB_USER";
pub const ENV_GITHUB_TOKEN: &str = "FC_GITHUB_TOKEN";
pub const ENV_COMPASS_TOKEN: &str = "FC_COMPASS_TOKEN";
pub const ENV_COMPASS_HOST: &str = "FC_COMPASS_HOST";
pub const ENV_COMPASS_CLOUD_ID: &str = "FC_COMPASS_CLOUD_ID";
pub const ENV_PROMETHEUS_URL: &str = "FC_PROMETHEUS_URL";

/// Credentials and endpoints for the remote catalog and the code host.
#[derive(Debug, Clone)]
pub struct Settings {
    pub github_org: String,
    pub github_user: String,
    pub github_token: String,
    pub compass_token: String,
    pub compass_host: String,
    pub compass_cloud_id: String,
    pub prometheus_url: Option<String>,
}

impl Settings {
    /// Read all settings from the environment.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            github_org: required(ENV_GITHUB_ORG)?,
            github_user: required(ENV_GITHUB_USER)?,
            github_token: required(ENV_GITHUB_TOKEN)?,
            compass_token: required(ENV_COMPASS_TOKEN)?,
            compass_host: required(ENV_COMPASS_HOST)?,
            compass_cloud_id: required(ENV_COMPASS_CLOUD_ID)?,
            prometheus_url: std::env::var(ENV_PROMETHEUS_URL).ok().filter(|v| !v.is_empty()),
        })
    }
}

fn required(name: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => bail!("environment variable '{name}' must be set"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_variable_names_the_variable() {
        let err = required("FC_TEST_UNSET_VARIABLE").unwrap_err();
        assert!(err.to_string().contains("FC_TEST_UNSET_VARIABLE"));
    }
}
