//! Plugin serving error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PluginError {
    #[error(
        "This binary is a plugin. These are not meant to be executed directly.\n\
        Please execute the program that consumes these plugins, which will\n\
        load any plugins automatically"
    )]
    NotLaunchedByHost,

    #[error("Incompatible plugin protocol: host supports {host:?}, provider supports {provider:?}")]
    UnsupportedProtocol { host: Vec<u32>, provider: Vec<u32> },

    #[error("No free port between {min} and {max}")]
    NoFreePort { min: u16, max: u16 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PluginError>;
