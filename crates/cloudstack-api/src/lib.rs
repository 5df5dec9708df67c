//! CloudStack API client
//!
//! Small signed client for the CloudStack management API, shared by the
//! Terraform provider and the `cloudstack-check` diagnostic.
//!
//! # Requirements
//!
//! - `CLOUDSTACK_API_URL`, `CLOUDSTACK_API_KEY`, `CLOUDSTACK_SECRET_KEY` env vars
//! - Optional: `CLOUDSTACK_HTTP_GET_ONLY`, `CLOUDSTACK_TIMEOUT` (seconds)
//!
//! # Example
//!
//! ```ignore
//! use cloudstack_api::{ClientConfig, CloudStackClient};
//!
//! let client = CloudStackClient::new(ClientConfig::from_env()?)?;
//!
//! for account in client.list_accounts().await? {
//!     println!("{} ({})", account.name, account.id);
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod signature;

pub use client::CloudStackClient;
pub use config::{ClientConfig, REQUIRED_ENV_VARS};
pub use error::{CloudStackError, Result};
pub use model::{Account, User};
