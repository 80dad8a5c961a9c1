//! Service modules and method tables.
//!
//! A [`ServiceModule`] exposes an allow-list of [`MethodSpec`]s and a single
//! `invoke` entry point. The router only calls `invoke` for names on the
//! allow-list, with the argument count already checked.

use serde_json::Value;

use crate::context::CallContext;
use fbarpc_common::protocol::error::Result;

/// Whether a method needs an authentication token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRequirement {
    None,
    Optional,
    Required,
}

/// Allow-list entry for one method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodSpec {
    pub name: &'static str,
    /// Number of positional arguments
    pub arity: usize,
    /// Number of values the method returns on the wire
    pub return_count: usize,
    pub auth: AuthRequirement,
}

impl MethodSpec {
    pub const fn new(name: &'static str, arity: usize, return_count: usize, auth: AuthRequirement) -> Self {
        Self { name, arity, return_count, auth }
    }

    /// Shapes a handler's return value for the wire.
    ///
    /// Single-value methods get their value wrapped in a one-element list.
    /// Multi-value methods already return the list of values and pass through
    /// untouched; methods with no return value yield an empty list.
    pub fn wrap_result(&self, value: Value) -> Value {
        match self.return_count {
            0 => Value::Array(Vec::new()),
            1 => Value::Array(vec![value]),
            _ => value,
        }
    }
}

/// A named group of methods served under `<module>.<method>`.
pub trait ServiceModule: Send + Sync {
    fn name(&self) -> &str;

    fn methods(&self) -> &[MethodSpec];

    /// Runs one method. Returning `FbaError::NoSuchMethod` is treated the same
    /// as an allow-list miss.
    fn invoke(&self, method: &str, ctx: &CallContext, args: Vec<Value>) -> Result<Value>;

    fn method(&self, name: &str) -> Option<&MethodSpec> {
        self.methods().iter().find(|spec| spec.name == name)
    }
}
