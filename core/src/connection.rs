//! Immutable connection settings: server address, credentials, timeouts.

use std::fmt;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use url::Url;

use crate::error::ApiError;
use crate::retry::RetryConfig;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub const ENV_HOST: &str = "TEAMCITY_HOST";
pub const ENV_TOKEN: &str = "TEAMCITY_TOKEN";
pub const ENV_USERNAME: &str = "TEAMCITY_USERNAME";
pub const ENV_PASSWORD: &str = "TEAMCITY_PASSWORD";

/// Exactly one credential mode is active per connection.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    Token(String),
    Basic { username: String, password: String },
}

impl Credentials {
    /// A non-empty token wins; otherwise username and password are used.
    pub fn select(token: &str, username: &str, password: &str) -> Self {
        if token.is_empty() {
            Credentials::Basic {
                username: username.to_string(),
                password: password.to_string(),
            }
        } else {
            Credentials::Token(token.to_string())
        }
    }

    /// Value of the `Authorization` header.
    pub fn authorization(&self) -> String {
        match self {
            Credentials::Token(token) => format!("Bearer {token}"),
            Credentials::Basic { username, password } => {
                format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
            }
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Token(_) => f.debug_tuple("Token").field(&"[REDACTED]").finish(),
            Credentials::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"[REDACTED]")
                .finish(),
        }
    }
}

/// Validated connection to one TeamCity server.
///
/// Built once by the provider configuration step and shared read-only by
/// every operation.
#[derive(Debug, Clone)]
pub struct Connection {
    app_url: Url,
    rest_url: Url,
    credentials: Credentials,
    timeout: Duration,
    retry: RetryConfig,
}

impl Connection {
    pub fn new(host: &str, token: &str, username: &str, password: &str) -> Result<Self, ApiError> {
        let host = host.trim_end_matches('/');
        if host.is_empty() {
            return Err(ApiError::Config("server host is empty".to_string()));
        }
        let app_url = parse_url(&format!("{host}/app"))?;
        let rest_url = parse_url(&format!("{host}/app/rest"))?;

        Ok(Self {
            app_url,
            rest_url,
            credentials: Credentials::select(token, username, password),
            timeout: DEFAULT_TIMEOUT,
            retry: RetryConfig::default(),
        })
    }

    /// Build from `TEAMCITY_HOST`, `TEAMCITY_TOKEN`, `TEAMCITY_USERNAME` and
    /// `TEAMCITY_PASSWORD`.
    pub fn from_env() -> Result<Self, ApiError> {
        let host = std::env::var(ENV_HOST)
            .map_err(|_| ApiError::Config(format!("{ENV_HOST} environment variable not set")))?;
        let var = |name| std::env::var(name).unwrap_or_default();
        Self::new(&host, &var(ENV_TOKEN), &var(ENV_USERNAME), &var(ENV_PASSWORD))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.retry.max_retries = max_retries;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn app_url(&self) -> &Url {
        &self.app_url
    }

    pub fn rest_url(&self) -> &Url {
        &self.rest_url
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn retry(&self) -> &RetryConfig {
        &self.retry
    }

    pub fn authorization(&self) -> String {
        self.credentials.authorization()
    }
}

fn parse_url(raw: &str) -> Result<Url, ApiError> {
    let url = Url::parse(raw).map_err(|e| ApiError::Config(format!("invalid server address {raw:?}: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(ApiError::Config(format!("server address {raw:?} cannot be used as a base URL")));
    }
    Ok(url)
}
