//! CloudStack API error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CloudStackError {
    #[error("missing required environment variables: {}", .0.join(", "))]
    MissingEnvVars(Vec<String>),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("CloudStack API error {code}: {message}")]
    Api { code: u16, message: String },

    #[error("Unexpected API response: {0}")]
    UnexpectedResponse(String),

    #[error("Request signing failed: {0}")]
    Signature(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CloudStackError>;
