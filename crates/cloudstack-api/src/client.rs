//! CloudStack API client
//!
//! Each call is one signed round trip against the `/client/api` endpoint.
//! There is no retry and no pagination: callers get exactly what a single
//! response contains.

use crate::config::ClientConfig;
use crate::error::{CloudStackError, Result};
use crate::model::{Account, ListAccountsResponse, ListUsersResponse, User};
use crate::signature;
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

/// Signed CloudStack API client
pub struct CloudStackClient {
    client: reqwest::Client,
    config: ClientConfig,
}

impl CloudStackClient {
    /// Create a new client
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            config,
        })
    }

    /// Get the API endpoint
    pub fn api_url(&self) -> &Url {
        &self.config.api_url
    }

    /// List accounts visible to the API key
    pub async fn list_accounts(&self) -> Result<Vec<Account>> {
        let response: ListAccountsResponse = self.execute("listAccounts", &[]).await?;
        tracing::debug!("listAccounts returned {} accounts", response.account.len());
        Ok(response.account)
    }

    /// List users visible to the API key
    pub async fn list_users(&self) -> Result<Vec<User>> {
        let response: ListUsersResponse = self.execute("listUsers", &[]).await?;
        tracing::debug!("listUsers returned {} users", response.user.len());
        Ok(response.user)
    }

    /// Sign and send a single API command, returning its decoded payload
    pub async fn execute<T: DeserializeOwned>(
        &self,
        command: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let mut all: Vec<(String, String)> = vec![
            ("command".to_string(), command.to_string()),
            ("response".to_string(), "json".to_string()),
            ("apikey".to_string(), self.config.api_key.clone()),
        ];
        all.extend(params.iter().map(|(k, v)| (k.to_string(), v.to_string())));

        let query = signature::signed_query(&all, self.config.secret_key.expose_secret())?;

        let request = if self.config.http_get_only {
            let mut url = self.config.api_url.clone();
            url.set_query(Some(&query));
            self.client.get(url)
        } else {
            self.client
                .post(self.config.api_url.clone())
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(query)
        };

        tracing::debug!(
            "Calling {} on {} (get_only={})",
            command,
            self.config.api_url,
            self.config.http_get_only
        );

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        parse_response(command, status, &body)
    }
}

/// Unwrap the `<command>response` envelope and surface API errors.
///
/// CloudStack reports failures either inside the command envelope or under
/// `errorresponse`, usually with a 4xx/5xx status; both carry `errorcode` and
/// `errortext`.
fn parse_response<T: DeserializeOwned>(command: &str, status: StatusCode, body: &str) -> Result<T> {
    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(_) if !status.is_success() => return Err(status_error(status, body)),
        Err(e) => return Err(e.into()),
    };

    let key = format!("{}response", command.to_lowercase());
    let Some(payload) = value.get(&key).or_else(|| value.get("errorresponse")) else {
        if !status.is_success() {
            return Err(status_error(status, body));
        }
        return Err(CloudStackError::UnexpectedResponse(format!(
            "'{}' not found in response",
            key
        )));
    };

    if let Some(text) = payload.get("errortext").and_then(Value::as_str) {
        let code = payload
            .get("errorcode")
            .and_then(Value::as_u64)
            .and_then(|c| u16::try_from(c).ok())
            .unwrap_or(status.as_u16());
        return Err(CloudStackError::Api {
            code,
            message: text.to_string(),
        });
    }

    if !status.is_success() {
        return Err(status_error(status, body));
    }

    Ok(T::deserialize(payload)?)
}

fn status_error(status: StatusCode, body: &str) -> CloudStackError {
    let body = body.trim();
    let message = if body.is_empty() {
        status.canonical_reason().unwrap_or("request failed").to_string()
    } else {
        body.to_string()
    };
    CloudStackError::Api {
        code: status.as_u16(),
        message,
    }
}
