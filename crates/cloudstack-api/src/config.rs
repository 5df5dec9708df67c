//! Client configuration
//!
//! Credentials come from the environment, the same variables the provider and
//! the check tool both understand.

use crate::error::{CloudStackError, Result};
use secrecy::SecretString;
use std::time::Duration;
use url::Url;

pub const ENV_API_URL: &str = "CLOUDSTACK_API_URL";
pub const ENV_API_KEY: &str = "CLOUDSTACK_API_KEY";
pub const ENV_SECRET_KEY: &str = "CLOUDSTACK_SECRET_KEY";
pub const ENV_HTTP_GET_ONLY: &str = "CLOUDSTACK_HTTP_GET_ONLY";
pub const ENV_TIMEOUT: &str = "CLOUDSTACK_TIMEOUT";

/// Required variables, in the order they are reported when missing
pub const REQUIRED_ENV_VARS: [&str; 3] = [ENV_API_URL, ENV_API_KEY, ENV_SECRET_KEY];

/// Connection settings for a [`CloudStackClient`](crate::CloudStackClient)
#[derive(Debug)]
pub struct ClientConfig {
    /// API endpoint, e.g. `https://cloud.example.com/client/api`
    pub api_url: Url,
    pub api_key: String,
    pub secret_key: SecretString,
    /// Send every command as a GET with a signed query string
    pub http_get_only: bool,
    /// Per-request timeout; `None` waits indefinitely
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(
        api_url: &str,
        api_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            api_url: parse_api_url(api_url)?,
            api_key: api_key.into(),
            secret_key: SecretString::from(secret_key.into()),
            http_get_only: false,
            timeout: None,
        })
    }

    pub fn with_http_get_only(mut self, http_get_only: bool) -> Self {
        self.http_get_only = http_get_only;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Create ClientConfig from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Create ClientConfig from an arbitrary variable source.
    ///
    /// Every missing required variable is collected before failing, so the
    /// error names all of them at once. Empty values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let (api_url, api_key, secret_key) =
            match (get(ENV_API_URL), get(ENV_API_KEY), get(ENV_SECRET_KEY)) {
                (Some(url), Some(key), Some(secret)) => (url, key, secret),
                (url, key, secret) => {
                    let present = [url.is_some(), key.is_some(), secret.is_some()];
                    let missing = REQUIRED_ENV_VARS
                        .iter()
                        .zip(present)
                        .filter(|(_, present)| !present)
                        .map(|(name, _)| name.to_string())
                        .collect();
                    return Err(CloudStackError::MissingEnvVars(missing));
                }
            };

        let http_get_only = match get(ENV_HTTP_GET_ONLY) {
            Some(raw) => parse_bool(ENV_HTTP_GET_ONLY, &raw)?,
            None => false,
        };
        let timeout = match get(ENV_TIMEOUT) {
            Some(raw) => Some(parse_timeout(ENV_TIMEOUT, &raw)?),
            None => None,
        };

        Ok(Self::new(&api_url, api_key, secret_key)?
            .with_http_get_only(http_get_only)
            .with_timeout(timeout))
    }
}

fn parse_api_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|e| CloudStackError::InvalidConfig(format!("{ENV_API_URL} '{raw}': {e}")))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(CloudStackError::InvalidConfig(format!(
            "{ENV_API_URL} must use http or https, got '{other}'"
        ))),
    }
}

/// Parse a boolean setting (`true/false`, `1/0`, `yes/no`)
pub fn parse_bool(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(CloudStackError::InvalidConfig(format!(
            "{name} must be a boolean, got '{raw}'"
        ))),
    }
}

/// Parse a timeout given in whole seconds
pub fn parse_timeout(name: &str, raw: &str) -> Result<Duration> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(CloudStackError::InvalidConfig(format!(
            "{name} must be a positive number of seconds, got '{raw}'"
        ))),
    }
}
