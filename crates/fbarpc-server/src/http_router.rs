//! JSON-RPC Router
//!
//! Routes `module.method` calls to registered [`ServiceModule`]s.
//!
//! # Dispatch Rules
//!
//! - The method name is split at its last `.`; anything that does not resolve
//!   to an allow-listed method is "no such method" (`-32601`)
//! - `params` must be an array holding exactly `arity` entries (`-32602`)
//! - Methods requiring auth reject calls without a token (`-32400`)
//! - Single-value results are wrapped in a one-element list
//! - Handler errors carry `{name, method, error}` in the error's `data`

use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::context::CallContext;
use crate::dispatch::{AuthRequirement, MethodSpec, ServiceModule};
use fbarpc_common::protocol::error::{FbaError, Result};
use fbarpc_common::protocol::jsonrpc::split_qualified_method;
use fbarpc_common::protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};

const ERROR_NAME: &str = "JSONRPCError";

/// Router over a set of named service modules.
#[derive(Default)]
pub struct ServiceRouter {
    modules: HashMap<String, Arc<dyn ServiceModule>>,
}

impl ServiceRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a module under its own name, replacing any previous one.
    pub fn register(&mut self, module: Arc<dyn ServiceModule>) {
        tracing::debug!("registering service module {}", module.name());
        self.modules.insert(module.name().to_string(), module);
    }

    pub fn with_module(mut self, module: Arc<dyn ServiceModule>) -> Self {
        self.register(module);
        self
    }

    pub fn module_names(&self) -> Vec<&str> {
        self.modules.keys().map(String::as_str).collect()
    }

    /// Looks up the module and allow-list entry for a qualified method name.
    pub fn resolve(&self, qualified: &str) -> Option<(&Arc<dyn ServiceModule>, &MethodSpec)> {
        let (module_name, method_name) = split_qualified_method(qualified)?;
        let module = self.modules.get(module_name)?;
        let spec = module.method(method_name)?;
        Some((module, spec))
    }

    /// Resolves, checks and invokes one call, returning the wire-shaped result.
    pub fn call_method(&self, qualified: &str, params: Value, ctx: &CallContext) -> Result<Value> {
        let (module, spec) = self
            .resolve(qualified)
            .ok_or_else(|| FbaError::NoSuchMethod(qualified.to_string()))?;

        let args = match params {
            Value::Array(args) => args,
            Value::Null if spec.arity == 0 => Vec::new(),
            _ => {
                return Err(FbaError::InvalidRequest(
                    "params must be a positional array".to_string(),
                ))
            }
        };
        if args.len() != spec.arity {
            return Err(FbaError::InvalidRequest(format!(
                "{} takes {} argument(s) but received {}",
                qualified,
                spec.arity,
                args.len()
            )));
        }

        if spec.auth == AuthRequirement::Required && ctx.token.is_none() {
            return Err(FbaError::Unauthorized(format!(
                "Authentication required for {}",
                qualified
            )));
        }

        let value = module.invoke(spec.name, ctx, args)?;
        Ok(spec.wrap_result(value))
    }

    /// Handles one JSON-RPC request. Failures are returned as error envelopes.
    pub async fn handle_request(&self, req: JsonRpcRequest, mut ctx: CallContext) -> JsonRpcResponse {
        let JsonRpcRequest { method, params, id, .. } = req;
        ctx.method = method.clone();

        match self.call_method(&method, params, &ctx) {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(e) => {
                tracing::error!(
                    "{} from user={} ip={}: {}",
                    method,
                    ctx.caller(),
                    ctx.client_ip.as_deref().unwrap_or("unknown"),
                    e
                );
                JsonRpcResponse::error(id, to_jsonrpc_error(&method, e))
            }
        }
    }
}

fn to_jsonrpc_error(method: &str, err: FbaError) -> JsonRpcError {
    let data = json!({
        "name": ERROR_NAME,
        "method": method,
        "error": format!("{:?}", err),
    });
    match err {
        FbaError::NoSuchMethod(_) => JsonRpcError::method_not_found(method),
        FbaError::Unauthorized(msg) => JsonRpcError::unauthorized(&msg),
        FbaError::InvalidRequest(msg) | FbaError::MissingInput(msg) => {
            JsonRpcError::invalid_params(&msg).with_data(data)
        }
        other => JsonRpcError::application_error(&other.to_string(), data),
    }
}
