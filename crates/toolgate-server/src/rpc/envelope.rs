//! Protocol envelopes and error codes
//!
//! JSON-RPC 2.0 request/response wrappers plus the stable error-code
//! table. Every dispatch path - success or any failure - produces exactly
//! one well-formed response envelope carrying the request's id.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use toolgate_domain::Error;

/// Protocol version string
pub const JSONRPC_VERSION: &str = "2.0";

/// Invalid JSON was received
pub const PARSE_ERROR: i32 = -32700;
/// The envelope is not a valid request object
pub const INVALID_REQUEST: i32 = -32600;
/// The method does not exist
pub const METHOD_NOT_FOUND: i32 = -32601;
/// Invalid method parameters
pub const INVALID_PARAMS: i32 = -32602;
/// Internal server error
pub const INTERNAL_ERROR: i32 = -32603;
/// Missing, invalid, or expired credential
pub const UNAUTHENTICATED: i32 = -32001;
/// Credential lacks permission for the capability
pub const PERMISSION_DENIED: i32 = -32003;
/// Request budget exhausted for the current window
pub const RATE_LIMITED: i32 = -32004;

/// An inbound request envelope
#[derive(Debug, Clone, Deserialize)]
pub struct RpcRequest {
    /// Protocol version - must be "2.0"
    #[serde(default)]
    pub jsonrpc: Option<String>,
    /// Method name
    pub method: String,
    /// Method parameters
    #[serde(default)]
    pub params: Option<Value>,
    /// Correlation id echoed back in the response
    #[serde(default)]
    pub id: Option<Value>,
}

/// A protocol-level error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcError {
    /// Stable error code
    pub code: i32,
    /// Human-readable message
    pub message: String,
    /// Optional structured details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    /// Create an error without details
    pub fn new<S: Into<String>>(code: i32, message: S) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Create an error carrying structured details
    pub fn with_data<S: Into<String>>(code: i32, message: S, data: Value) -> Self {
        Self {
            code,
            message: message.into(),
            data: Some(data),
        }
    }
}

impl From<&Error> for RpcError {
    fn from(error: &Error) -> Self {
        match error {
            Error::MalformedRequest { message } => Self::new(INVALID_REQUEST, message.clone()),
            Error::Unauthenticated { message } | Error::CredentialExpired { message } => {
                Self::new(UNAUTHENTICATED, message.clone())
            }
            Error::PermissionDenied { message } => Self::new(PERMISSION_DENIED, message.clone()),
            Error::RateLimited { limit, reset_at } => Self::with_data(
                RATE_LIMITED,
                "Rate limit exceeded",
                serde_json::json!({ "limit": limit, "resetAt": reset_at }),
            ),
            Error::CapabilityNotFound { name } => {
                Self::new(INVALID_PARAMS, format!("Tool not found: {name}"))
            }
            Error::InvalidArgument { message } => Self::new(INVALID_PARAMS, message.clone()),
            Error::NotFound { resource } => {
                Self::new(INVALID_PARAMS, format!("Not found: {resource}"))
            }
            Error::ExecutionFailure { message } => {
                Self::new(INTERNAL_ERROR, format!("Tool execution error: {message}"))
            }
            // store/collaborator internals are logged, never surfaced
            Error::Storage { .. }
            | Error::Internal { .. }
            | Error::Config { .. }
            | Error::Json { .. }
            | Error::Io { .. } => Self::new(INTERNAL_ERROR, "Internal error"),
        }
    }
}

/// An outbound response envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse {
    /// Protocol version
    pub jsonrpc: String,
    /// Correlation id from the request (null when unknowable)
    pub id: Value,
    /// Success payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Failure payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    /// Build a success envelope
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Build a failure envelope
    pub fn failure(id: Value, error: RpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }

    /// Serialize to a JSON value
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| {
            serde_json::json!({
                "jsonrpc": JSONRPC_VERSION,
                "id": null,
                "error": { "code": INTERNAL_ERROR, "message": "Internal error" }
            })
        })
    }
}
