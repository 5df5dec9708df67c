//! Host call messages
//!
//! One JSON object per line in each direction. Every request gets exactly one
//! response carrying the same `id`.

use crate::provider::{Diagnostic, Provider};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const GET_PROVIDER_SCHEMA: &str = "GetProviderSchema";
pub const CONFIGURE_PROVIDER: &str = "ConfigureProvider";
pub const STOP_PROVIDER: &str = "StopProvider";
pub const SHUTDOWN: &str = "Shutdown";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Request {
    #[serde(default)]
    pub id: Option<u64>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcError {
    pub message: String,
}

impl Response {
    pub fn ok(id: Option<u64>, result: Value) -> Self {
        Self {
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Option<u64>, message: impl Into<String>) -> Self {
        Self {
            id,
            result: None,
            error: Some(RpcError {
                message: message.into(),
            }),
        }
    }
}

/// Outcome of handling one line
pub struct Dispatch {
    pub response: Response,
    pub shutdown: bool,
}

/// Decode one request line and run it against the provider
pub async fn dispatch_line<P: Provider + ?Sized>(provider: &P, line: &str) -> Dispatch {
    match serde_json::from_str::<Request>(line) {
        Ok(request) => dispatch(provider, request).await,
        Err(e) => Dispatch {
            response: Response::error(None, format!("invalid request: {}", e)),
            shutdown: false,
        },
    }
}

pub async fn dispatch<P: Provider + ?Sized>(provider: &P, request: Request) -> Dispatch {
    let id = request.id;
    tracing::debug!("Handling {} (id={:?})", request.method, id);

    let response = match request.method.as_str() {
        GET_PROVIDER_SCHEMA => match serde_json::to_value(provider.schema()) {
            Ok(schema) => Response::ok(id, serde_json::json!({ "provider": schema })),
            Err(e) => Response::error(id, e.to_string()),
        },
        CONFIGURE_PROVIDER => {
            let config = match request.params.get("config") {
                None | Some(Value::Null) => Map::new(),
                Some(Value::Object(map)) => map.clone(),
                Some(_) => {
                    return Dispatch {
                        response: Response::error(id, "params.config must be an object"),
                        shutdown: false,
                    };
                }
            };
            let diagnostics: Vec<Diagnostic> = provider.configure(config).await;
            Response::ok(id, serde_json::json!({ "diagnostics": diagnostics }))
        }
        STOP_PROVIDER => match provider.stop().await {
            Ok(()) => Response::ok(id, serde_json::json!({})),
            Err(e) => Response::error(id, e.to_string()),
        },
        SHUTDOWN => {
            return Dispatch {
                response: Response::ok(id, serde_json::json!({})),
                shutdown: true,
            };
        }
        other => Response::error(id, format!("unknown method: {}", other)),
    };

    Dispatch {
        response,
        shutdown: false,
    }
}
