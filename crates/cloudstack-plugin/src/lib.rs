//! Plugin serving for the CloudStack Terraform provider
//!
//! Implements the host-facing side of a provider process: the magic cookie
//! check, protocol version negotiation, the listener, the handshake line on
//! stdout and the loop that answers host calls.
//!
//! Host calls are newline-delimited JSON, advertised as the `jsonl` protocol
//! in the handshake line. A host must speak these calls to drive the provider;
//! Terraform's gRPC plugin protocol is not served.
//!
//! ```text
//! host                                 provider process
//!  │  TF_PLUGIN_MAGIC_COOKIE=…           │
//!  │  PLUGIN_PROTOCOL_VERSIONS=5,6 ────► │ negotiate, bind listener
//!  │ ◄──── 1|5|unix|/tmp/plugin…/plugin.sock|jsonl
//!  │ ──── connect ─────────────────────► │
//!  │ ──── {"id":1,"method":…} ─────────► │ Provider::schema / configure / stop
//!  │ ◄──── {"id":1,"result":…} ───────── │
//! ```

pub mod error;
pub mod handshake;
pub mod listener;
pub mod provider;
pub mod rpc;
pub mod server;

pub use error::{PluginError, Result};
pub use handshake::{Handshake, Network};
pub use listener::PluginListener;
pub use provider::{
    Attribute, AttributeType, Diagnostic, Provider, ProviderSchema, Severity,
};
pub use server::{PluginServer, ServeOpts, serve};
