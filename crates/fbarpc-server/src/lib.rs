//! FBA Model Service Server
//!
//! A JSON-RPC dispatch stub for the `fbaModelServices` module. Requests are
//! routed by `module.method` name to allow-listed handlers, which validate
//! their parameters and record queued jobs.

pub mod config;
pub mod context;
pub mod dispatch;
pub mod http_router;
pub mod http_server;
pub mod job_queue;
pub mod service;

pub use config::ServerConfig;
pub use context::CallContext;
pub use dispatch::{AuthRequirement, MethodSpec, ServiceModule};
pub use http_router::ServiceRouter;
pub use http_server::HttpServer;
pub use job_queue::JobQueue;
pub use service::FbaModelServices;
