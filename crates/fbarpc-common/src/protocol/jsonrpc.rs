//! JSON-RPC Protocol Types
//!
//! Wire types for the FBA model service. Requests carry a `module.method`
//! name and a single positional argument array:
//!
//! - Request format: `{"jsonrpc": "2.0", "method": "fbaModelServices.check_job", "params": [{...}], "id": ...}`
//! - Response format: `{"jsonrpc": "2.0", "result": [...], "error": ..., "id": ...}`
//! - Error format: `{"code": ..., "message": "...", "data": ...}`
//!
//! # Error Codes
//!
//! - `-32700`: Parse error
//! - `-32600`: Invalid request
//! - `-32601`: Method not found (unknown module, method, or allow-list miss)
//! - `-32602`: Invalid params
//! - `-32603`: Internal error
//! - `-32001`: Request body too large
//! - `-32400`: Authentication required
//! - `-32500`: Application error raised by a method handler
//!
//! # Example
//!
//! ```
//! use fbarpc_common::protocol::jsonrpc::{JsonRpcRequest, JsonRpcResponse, JsonRpcError};
//! use serde_json::json;
//!
//! let request = JsonRpcRequest::new("fbaModelServices.version", json!([]));
//! assert_eq!(request.module_and_method(), Some(("fbaModelServices", "version")));
//!
//! let response = JsonRpcResponse::success(request.id.clone(), json!(["1.0.0"]));
//! let error = JsonRpcResponse::error(request.id, JsonRpcError::method_not_found("nope"));
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};

static REQUEST_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// JSON-RPC request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// JSON-RPC version (must be "2.0")
    pub jsonrpc: String,
    /// Fully qualified method name, `module.method`
    pub method: String,
    /// Positional argument array
    #[serde(default)]
    pub params: Value,
    /// Request identifier (number, string, or null)
    #[serde(default)]
    pub id: Value,
}

impl JsonRpcRequest {
    /// Builds a request with a process-unique numeric id.
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            method: method.into(),
            params,
            id: Value::from(REQUEST_ID_COUNTER.fetch_add(1, Ordering::SeqCst)),
        }
    }

    /// Splits the method name at its last `.` into `(module, method)`.
    pub fn module_and_method(&self) -> Option<(&str, &str)> {
        split_qualified_method(&self.method)
    }
}

/// Splits a qualified name such as `fbaModelServices.version` at its last `.`.
///
/// Returns `None` if either half is empty or there is no separator.
pub fn split_qualified_method(qualified: &str) -> Option<(&str, &str)> {
    let (module, method) = qualified.rsplit_once('.')?;
    if module.is_empty() || method.is_empty() {
        return None;
    }
    Some((module, method))
}

/// JSON-RPC response
///
/// Exactly one of `result` and `error` is present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// JSON-RPC version (must be "2.0")
    pub jsonrpc: String,
    /// Result value on success (None if error is present)
    #[serde(default)]
    pub result: Option<Value>,
    /// Error object on failure (None if result is present)
    #[serde(default)]
    pub error: Option<JsonRpcError>,
    /// Request identifier (must match the request id)
    #[serde(default)]
    pub id: Value,
}

/// JSON-RPC error envelope
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcError {
    /// Error code (standard codes are negative integers)
    pub code: i32,
    /// Short description of the error
    pub message: String,
    /// Diagnostic payload (optional)
    #[serde(default)]
    pub data: Option<Value>,
}

/// Invalid JSON was received by the server
pub const PARSE_ERROR: i32 = -32700;
/// The JSON sent is not a valid Request object
pub const INVALID_REQUEST: i32 = -32600;
/// The method does not exist / is not available
pub const METHOD_NOT_FOUND: i32 = -32601;
/// Invalid method parameter(s)
pub const INVALID_PARAMS: i32 = -32602;
/// Internal JSON-RPC error
pub const INTERNAL_ERROR: i32 = -32603;
/// Request entity too large
pub const REQUEST_TOO_LARGE: i32 = -32001;
/// Method requires an authentication token and none was sent
pub const UNAUTHORIZED: i32 = -32400;
/// A method handler failed
pub const APPLICATION_ERROR: i32 = -32500;

impl JsonRpcError {
    /// Create a parse error (-32700)
    pub fn parse_error() -> Self {
        Self {
            code: PARSE_ERROR,
            message: "Parse error".into(),
            data: None,
        }
    }

    /// Create an invalid request error (-32600)
    pub fn invalid_request(msg: &str) -> Self {
        Self {
            code: INVALID_REQUEST,
            message: msg.into(),
            data: None,
        }
    }

    /// Create a method not found error (-32601) naming the requested method.
    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: METHOD_NOT_FOUND,
            message: format!("No such method: {}", method),
            data: None,
        }
    }

    /// Create an invalid params error (-32602)
    pub fn invalid_params(msg: &str) -> Self {
        Self {
            code: INVALID_PARAMS,
            message: msg.into(),
            data: None,
        }
    }

    /// Create an internal error (-32603)
    pub fn internal_error(msg: &str) -> Self {
        Self {
            code: INTERNAL_ERROR,
            message: msg.into(),
            data: None,
        }
    }

    /// Create a request too large error (-32001)
    pub fn request_too_large(limit: usize) -> Self {
        Self {
            code: REQUEST_TOO_LARGE,
            message: format!("Request body too large (max {} bytes)", limit),
            data: None,
        }
    }

    /// Create an authentication required error (-32400)
    pub fn unauthorized(msg: &str) -> Self {
        Self {
            code: UNAUTHORIZED,
            message: msg.into(),
            data: None,
        }
    }

    /// Create an application error (-32500) carrying a diagnostic payload.
    pub fn application_error(msg: &str, data: Value) -> Self {
        Self {
            code: APPLICATION_ERROR,
            message: msg.into(),
            data: Some(data),
        }
    }

    /// Attaches a diagnostic payload, replacing any existing one.
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

impl JsonRpcResponse {
    /// Create a success response
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            result: Some(result),
            error: None,
            id,
        }
    }

    /// Create an error response
    pub fn error(id: Value, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            result: None,
            error: Some(error),
            id,
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
