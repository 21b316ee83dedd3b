//! Provider configuration with environment fallback.

use std::time::Duration;

use serde::Deserialize;
use teamcity_core::connection::{ENV_HOST, ENV_PASSWORD, ENV_TOKEN, ENV_USERNAME};
use teamcity_core::{ApiError, Connection};

/// Block-level provider settings. Every field may be left out and supplied
/// by the matching `TEAMCITY_*` environment variable instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    pub host: Option<String>,
    pub token: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Retry budget for retried calls. Defaults to the connection default.
    pub max_retries: Option<u32>,
    /// Per-call timeout in seconds.
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing TeamCity host: set `host` or {ENV_HOST}")]
    MissingHost,

    #[error("missing TeamCity credentials: set `token` ({ENV_TOKEN}) or `username`/`password` ({ENV_USERNAME}/{ENV_PASSWORD})")]
    MissingCredentials,

    #[error("invalid TeamCity connection: {0}")]
    Invalid(#[from] ApiError),
}

impl ProviderConfig {
    /// Fill unset fields from the process environment.
    pub fn with_env_fallback(self) -> Self {
        self.merge_env(|name| std::env::var(name).ok())
    }

    /// Fill unset fields from `lookup`. Explicit values always win.
    pub fn merge_env(self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            host: self.host.or_else(|| lookup(ENV_HOST)),
            token: self.token.or_else(|| lookup(ENV_TOKEN)),
            username: self.username.or_else(|| lookup(ENV_USERNAME)),
            password: self.password.or_else(|| lookup(ENV_PASSWORD)),
            ..self
        }
    }

    /// Validate and build the connection.
    pub fn resolve(&self) -> Result<Connection, ConfigError> {
        let field = |value: &Option<String>| value.as_deref().unwrap_or_default().to_string();
        let host = field(&self.host);
        let (token, username, password) =
            (field(&self.token), field(&self.username), field(&self.password));

        if host.is_empty() {
            return Err(ConfigError::MissingHost);
        }
        if token.is_empty() && username.is_empty() && password.is_empty() {
            return Err(ConfigError::MissingCredentials);
        }

        let mut connection = Connection::new(&host, &token, &username, &password)?;
        if let Some(max_retries) = self.max_retries {
            connection = connection.with_max_retries(max_retries);
        }
        if let Some(secs) = self.timeout_secs {
            connection = connection.with_timeout(Duration::from_secs(secs));
        }
        Ok(connection)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use teamcity_core::Credentials;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn explicit_values_win_over_environment() {
        let config = ProviderConfig {
            host: Some("http://explicit:8111".to_string()),
            ..Default::default()
        }
        .merge_env(env(&[(ENV_HOST, "http://env:8111"), (ENV_TOKEN, "abc")]));

        assert_eq!(config.host.as_deref(), Some("http://explicit:8111"));
        assert_eq!(config.token.as_deref(), Some("abc"));
    }

    #[test]
    fn missing_host_is_rejected() {
        let config = ProviderConfig {
            token: Some("abc".to_string()),
            ..Default::default()
        };
        assert!(matches!(config.resolve(), Err(ConfigError::MissingHost)));
    }

    #[test]
    fn missing_credentials_are_rejected() {
        let config = ProviderConfig {
            host: Some("http://tc:8111".to_string()),
            token: Some(String::new()),
            ..Default::default()
        };
        assert!(matches!(config.resolve(), Err(ConfigError::MissingCredentials)));
    }

    #[test]
    fn token_selects_bearer_credentials() {
        let connection = ProviderConfig {
            host: Some("http://tc:8111/".to_string()),
            token: Some("abc".to_string()),
            username: Some("admin".to_string()),
            max_retries: Some(7),
            ..Default::default()
        }
        .resolve()
        .unwrap();

        assert!(matches!(connection.credentials(), Credentials::Token(_)));
        assert_eq!(connection.rest_url().as_str(), "http://tc:8111/app/rest");
        assert_eq!(connection.retry().max_retries, 7);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let parsed: Result<ProviderConfig, _> =
            serde_json::from_str(r#"{"host":"http://tc","tokn":"abc"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn invalid_host_surfaces_connection_error() {
        let config = ProviderConfig {
            host: Some("not a url".to_string()),
            token: Some("abc".to_string()),
            ..Default::default()
        };
        assert!(matches!(config.resolve(), Err(ConfigError::Invalid(_))));
    }
}
