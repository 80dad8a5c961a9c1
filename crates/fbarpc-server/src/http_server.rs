//! HTTP Server
//!
//! Serves JSON-RPC over HTTP/1.1 with hyper. Each connection gets its own
//! tokio task, and each request is handed to the [`ServiceRouter`] along with
//! a [`CallContext`] built from its headers.
//!
//! # Request Handling
//!
//! - Only `POST` is accepted
//! - Bodies over `max_request_bytes` are rejected with `-32001` (HTTP 413)
//! - Unparseable bodies get a `-32700` parse error
//! - Everything else is answered by the router with HTTP 200
//!
//! # Example
//!
//! ```no_run
//! use fbarpc_server::{FbaModelServices, HttpServer, JobQueue, ServerConfig, ServiceRouter};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let router = ServiceRouter::new()
//!         .with_module(Arc::new(FbaModelServices::new(Arc::new(JobQueue::new()))));
//!     let server = HttpServer::new(router, ServerConfig::default());
//!     server.run("127.0.0.1:7036".parse().unwrap()).await.unwrap();
//! }
//! ```

use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::StatusCode;
use hyper_util::rt::TokioIo;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::context::CallContext;
use crate::http_router::ServiceRouter;
use fbarpc_common::protocol::error::FbaError;
use fbarpc_common::protocol::{JsonRpcError, JsonRpcResponse};
use fbarpc_common::transport::{HttpTransport, HyperRequest, HyperResponse};

/// HTTP front end for a [`ServiceRouter`].
pub struct HttpServer {
    router: Arc<ServiceRouter>,
    config: Arc<ServerConfig>,
}

impl HttpServer {
    pub fn new(router: ServiceRouter, config: ServerConfig) -> Self {
        Self {
            router: Arc::new(router),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Binds `addr` and serves until the accept loop fails.
    pub async fn run(self, addr: SocketAddr) -> Result<(), FbaError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| FbaError::Transport(format!("Failed to bind to {}: {}", addr, e)))?;
        self.run_with_listener(listener).await
    }

    /// Serves on an already bound listener.
    pub async fn run_with_listener(self, listener: TcpListener) -> Result<(), FbaError> {
        tracing::info!(
            "{} listening on {}",
            self.config.service_name,
            listener
                .local_addr()
                .map_err(|e| FbaError::Transport(format!("Failed to get local address: {}", e)))?
        );

        loop {
            let (stream, peer) = listener
                .accept()
                .await
                .map_err(|e| FbaError::Transport(format!("Failed to accept connection: {}", e)))?;

            let io = TokioIo::new(stream);
            let router = self.router.clone();
            let config = self.config.clone();

            tokio::task::spawn(async move {
                let service = service_fn(move |req| {
                    let router = router.clone();
                    let config = config.clone();
                    async move { Self::handle_request(router, config, peer, req).await }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    tracing::error!("Error serving connection from {}: {}", peer, err);
                }
            });
        }
    }

    async fn handle_request(
        router: Arc<ServiceRouter>,
        config: Arc<ServerConfig>,
        peer: SocketAddr,
        req: HyperRequest,
    ) -> Result<HyperResponse, FbaError> {
        if req.method() != hyper::Method::POST {
            return Ok(HttpTransport::to_http_response_with_status(
                JsonRpcResponse::error(
                    Value::Null,
                    JsonRpcError::invalid_request("Only POST requests are supported"),
                ),
                StatusCode::METHOD_NOT_ALLOWED,
            ));
        }

        let ctx = CallContext::from_headers(req.headers(), Some(peer), !config.dont_trust_x_ip_headers);

        let body = match Limited::new(req.into_body(), config.max_request_bytes).collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
                tracing::warn!("Rejected oversized request from {}", ctx);
                return Ok(HttpTransport::to_http_response_with_status(
                    JsonRpcResponse::error(
                        Value::Null,
                        JsonRpcError::request_too_large(config.max_request_bytes),
                    ),
                    StatusCode::PAYLOAD_TOO_LARGE,
                ));
            }
            Err(e) => {
                return Err(FbaError::Transport(format!("Failed to read request body: {}", e)));
            }
        };

        let jsonrpc_req = match HttpTransport::parse_jsonrpc(body) {
            Ok(req) => req,
            Err(e) => {
                tracing::error!("Failed to parse JSON-RPC request from {}: {}", ctx, e);
                return Ok(HttpTransport::to_http_error(Value::Null, JsonRpcError::parse_error()));
            }
        };

        let jsonrpc_res = router.handle_request(jsonrpc_req, ctx).await;
        Ok(HttpTransport::to_http_response(jsonrpc_res))
    }
}
