//! FBA Model Service Common Types
//!
//! Shared protocol definitions for the FBA model service client, server and
//! command-line scripts.
//!
//! - [`protocol`]: JSON-RPC envelopes, the [`FbaError`] enum, parameter
//!   objects for each service method, and job handles
//! - [`records`]: schema records with field tables, defaults, and
//!   arena-backed derived references
//! - [`transport`]: HTTP/JSON-RPC conversion helpers
//!
//! # Wire Protocol
//!
//! - **Transport**: HTTP POST to `/`
//! - **Envelope**: JSON-RPC 2.0
//! - **Method names**: `module.method`, e.g. `fbaModelServices.queue_runfba`
//! - **Params**: a single positional argument array
//! - **Results**: single-value methods return `[value]`
//!
//! # Example
//!
//! ```
//! use fbarpc_common::ReactionSensitivityParams;
//! use serde_json::json;
//!
//! let params: ReactionSensitivityParams = serde_json::from_value(json!({
//!     "model": "iJO1366",
//!     "workspace": "myws",
//!     "delete_noncontributing_reactions": true
//! })).unwrap();
//! assert!(params.validate().is_ok());
//! ```

pub mod protocol;
pub mod records;
pub mod transport;

pub use protocol::*;
