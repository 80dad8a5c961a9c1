//! HTTP Transport Utilities
//!
//! Conversion between HTTP bodies and JSON-RPC messages, shared by the
//! server and the client.
//!
//! # Example
//!
//! ```
//! use fbarpc_common::transport::http::HttpTransport;
//! use fbarpc_common::protocol::JsonRpcResponse;
//! use serde_json::json;
//!
//! let request = HttpTransport::build_request("check_job", vec![json!({"jobid": "job.1"})]);
//! assert_eq!(request.method, "fbaModelServices.check_job");
//!
//! let response = JsonRpcResponse::success(request.id, json!([{"id": "job.1"}]));
//! let http_response = HttpTransport::to_http_response(response);
//! assert_eq!(http_response.status(), 200);
//! ```

use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Request, Response, StatusCode};
use serde_json::Value;

use crate::protocol::error::FbaError;
use crate::protocol::params::SERVICE_MODULE;
use crate::protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};

/// Type alias for Hyper incoming requests
pub type HyperRequest = Request<Incoming>;

/// Type alias for Hyper responses with full body
pub type HyperResponse = Response<Full<Bytes>>;

/// HTTP transport utility functions
pub struct HttpTransport;

impl HttpTransport {
    /// Parse a JSON-RPC request from an HTTP body
    pub fn parse_jsonrpc(body: Bytes) -> Result<JsonRpcRequest, FbaError> {
        serde_json::from_slice(&body).map_err(FbaError::JsonSerialization)
    }

    /// Parse a JSON-RPC response from an HTTP body
    pub fn parse_jsonrpc_response(body: &[u8]) -> Result<JsonRpcResponse, FbaError> {
        serde_json::from_slice(body)
            .map_err(|e| FbaError::InvalidResponse(format!("Malformed JSON-RPC response: {}", e)))
    }

    /// Create an HTTP 200 response from a JSON-RPC response
    pub fn to_http_response(jsonrpc: JsonRpcResponse) -> HyperResponse {
        Self::to_http_response_with_status(jsonrpc, StatusCode::OK)
    }

    /// Create an HTTP response from a JSON-RPC error
    pub fn to_http_error(id: Value, error: JsonRpcError) -> HyperResponse {
        Self::to_http_response(JsonRpcResponse::error(id, error))
    }

    /// Create an HTTP response with a custom status code
    pub fn to_http_response_with_status(jsonrpc: JsonRpcResponse, status: StatusCode) -> HyperResponse {
        let body = serde_json::to_vec(&jsonrpc).unwrap_or_default();

        let mut response = Response::new(Full::new(Bytes::from(body)));
        *response.status_mut() = status;
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        response
    }

    /// Fully qualifies a service method name: `check_job` becomes
    /// `fbaModelServices.check_job`.
    pub fn qualified_method(method: &str) -> String {
        format!("{}.{}", SERVICE_MODULE, method)
    }

    /// Build a service request with a positional argument array.
    pub fn build_request(method: &str, args: Vec<Value>) -> JsonRpcRequest {
        JsonRpcRequest::new(Self::qualified_method(method), Value::Array(args))
    }
}
