//! HTTP transport helpers for JSON-RPC over HTTP POST.

pub mod http;

pub use http::{HttpTransport, HyperRequest, HyperResponse};
