//! CloudStack provider descriptor
//!
//! Declares the provider block and turns it into a configured API client.
//! Resource and data source logic is not part of this binary.

use async_trait::async_trait;
use cloudstack_api::config::{
    ENV_API_KEY, ENV_API_URL, ENV_HTTP_GET_ONLY, ENV_SECRET_KEY, ENV_TIMEOUT, parse_bool,
    parse_timeout,
};
use cloudstack_api::{ClientConfig, CloudStackClient};
use cloudstack_plugin::{Attribute, AttributeType, Diagnostic, Provider, ProviderSchema};
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::RwLock;

pub const PROVIDER_ADDRESS: &str = "registry.terraform.io/cloudstack/cloudstack";

const ATTR_API_URL: &str = "api_url";
const ATTR_API_KEY: &str = "api_key";
const ATTR_SECRET_KEY: &str = "secret_key";
const ATTR_HTTP_GET_ONLY: &str = "http_get_only";
const ATTR_TIMEOUT: &str = "timeout";

/// CloudStack provider
#[derive(Default)]
pub struct CloudStackProvider {
    client: RwLock<Option<Arc<CloudStackClient>>>,
}

impl CloudStackProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Client built by the last successful `configure`
    pub async fn client(&self) -> Option<Arc<CloudStackClient>> {
        self.client.read().await.clone()
    }

    /// Merge the provider block over the environment defaults.
    ///
    /// All problems are collected so the host can show them together.
    pub fn resolve_config<F>(
        config: &Map<String, Value>,
        lookup: F,
    ) -> Result<ClientConfig, Vec<Diagnostic>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let schema = schema();
        let value_of = |name: &str| -> Option<String> {
            match config.get(name) {
                Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
                Some(Value::Bool(b)) => Some(b.to_string()),
                Some(Value::Number(n)) => Some(n.to_string()),
                _ => schema
                    .get(name)
                    .and_then(|a| a.env_default.as_deref())
                    .and_then(&lookup)
                    .filter(|v| !v.trim().is_empty()),
            }
        };

        let mut diagnostics = Vec::new();
        let mut require = |name: &str, env: &str| {
            let value = value_of(name);
            if value.is_none() {
                diagnostics.push(
                    Diagnostic::error(format!("Missing required argument \"{}\"", name))
                        .with_detail(format!(
                            "Set \"{}\" in the provider block or the {} environment variable.",
                            name, env
                        ))
                        .with_attribute(name),
                );
            }
            value
        };

        let api_url = require(ATTR_API_URL, ENV_API_URL);
        let api_key = require(ATTR_API_KEY, ENV_API_KEY);
        let secret_key = require(ATTR_SECRET_KEY, ENV_SECRET_KEY);

        let http_get_only = match value_of(ATTR_HTTP_GET_ONLY) {
            Some(raw) => parse_bool(ATTR_HTTP_GET_ONLY, &raw).unwrap_or_else(|e| {
                diagnostics.push(Diagnostic::error(e.to_string()).with_attribute(ATTR_HTTP_GET_ONLY));
                false
            }),
            None => false,
        };
        let timeout = match value_of(ATTR_TIMEOUT) {
            Some(raw) => match parse_timeout(ATTR_TIMEOUT, &raw) {
                Ok(timeout) => Some(timeout),
                Err(e) => {
                    diagnostics.push(Diagnostic::error(e.to_string()).with_attribute(ATTR_TIMEOUT));
                    None
                }
            },
            None => None,
        };

        let (Some(api_url), Some(api_key), Some(secret_key)) = (api_url, api_key, secret_key)
        else {
            return Err(diagnostics);
        };
        if !diagnostics.is_empty() {
            return Err(diagnostics);
        }

        ClientConfig::new(&api_url, api_key, secret_key)
            .map(|c| c.with_http_get_only(http_get_only).with_timeout(timeout))
            .map_err(|e| vec![Diagnostic::error(e.to_string()).with_attribute(ATTR_API_URL)])
    }
}

fn schema() -> ProviderSchema {
    ProviderSchema {
        version: 0,
        attributes: vec![
            Attribute::required(
                ATTR_API_URL,
                AttributeType::String,
                "The URL of the CloudStack API endpoint",
            )
            .env_default(ENV_API_URL),
            Attribute::required(ATTR_API_KEY, AttributeType::String, "The API key of the account")
                .env_default(ENV_API_KEY),
            Attribute::required(
                ATTR_SECRET_KEY,
                AttributeType::String,
                "The secret key used to sign API requests",
            )
            .sensitive()
            .env_default(ENV_SECRET_KEY),
            Attribute::optional(
                ATTR_HTTP_GET_ONLY,
                AttributeType::Bool,
                "Send every API call as an HTTP GET",
            )
            .env_default(ENV_HTTP_GET_ONLY),
            Attribute::optional(
                ATTR_TIMEOUT,
                AttributeType::Number,
                "Timeout in seconds for each API call",
            )
            .env_default(ENV_TIMEOUT),
        ],
    }
}

#[async_trait]
impl Provider for CloudStackProvider {
    fn name(&self) -> &str {
        "cloudstack"
    }

    fn schema(&self) -> ProviderSchema {
        schema()
    }

    async fn configure(&self, config: Map<String, Value>) -> Vec<Diagnostic> {
        let client_config =
            match Self::resolve_config(&config, |name| std::env::var(name).ok()) {
                Ok(c) => c,
                Err(diagnostics) => return diagnostics,
            };

        let mut diagnostics = Vec::new();
        if client_config.http_get_only {
            diagnostics.push(
                Diagnostic::warning("All API calls are sent as HTTP GET")
                    .with_detail(
                        "Request parameters and the signature appear in the URL \
                        and may be recorded in proxy or server access logs.",
                    )
                    .with_attribute(ATTR_HTTP_GET_ONLY),
            );
        }

        let api_url = client_config.api_url.clone();
        match CloudStackClient::new(client_config) {
            Ok(client) => {
                tracing::info!("Configured CloudStack client for {}", api_url);
                *self.client.write().await = Some(Arc::new(client));
                diagnostics
            }
            Err(e) => vec![Diagnostic::error("Failed to create CloudStack client")
                .with_detail(e.to_string())],
        }
    }

    async fn stop(&self) -> cloudstack_plugin::Result<()> {
        match self.client().await {
            Some(client) => tracing::debug!("Stop requested for {}", client.api_url()),
            None => tracing::debug!("Stop requested before configure"),
        }
        Ok(())
    }
}
