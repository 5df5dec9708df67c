//! Provider trait definition

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Provider abstraction served to the host
///
/// The serving loop owns the transport; implementations only describe their
/// configuration schema and react to the host's calls.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Returns the provider name (e.g., "cloudstack")
    fn name(&self) -> &str;

    /// App protocol versions this provider can speak
    fn protocol_versions(&self) -> &[u32] {
        &[5]
    }

    /// Provider configuration schema
    fn schema(&self) -> ProviderSchema;

    /// Apply the provider block sent by the host
    async fn configure(&self, config: Map<String, Value>) -> Vec<Diagnostic>;

    /// Cancel in-flight work; the provider stays alive
    async fn stop(&self) -> Result<()>;
}

/// Attribute value type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    String,
    Number,
    Bool,
}

/// A single provider configuration attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,

    #[serde(rename = "type")]
    pub attribute_type: AttributeType,

    pub description: String,

    pub required: bool,

    pub sensitive: bool,

    /// Environment variable consulted when the attribute is not set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env_default: Option<String>,
}

impl Attribute {
    pub fn required(
        name: impl Into<String>,
        attribute_type: AttributeType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            attribute_type,
            description: description.into(),
            required: true,
            sensitive: false,
            env_default: None,
        }
    }

    pub fn optional(
        name: impl Into<String>,
        attribute_type: AttributeType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            required: false,
            ..Self::required(name, attribute_type, description)
        }
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn env_default(mut self, var: impl Into<String>) -> Self {
        self.env_default = Some(var.into());
        self
    }
}

/// Provider configuration schema
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderSchema {
    pub version: i64,
    pub attributes: Vec<Attribute>,
}

impl ProviderSchema {
    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

/// Problem reported back to the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

impl Diagnostic {
    pub fn error(summary: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            summary: summary.into(),
            detail: None,
            attribute: None,
        }
    }

    pub fn warning(summary: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(summary)
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}
