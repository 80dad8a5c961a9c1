pub mod error;
pub mod jobs;
pub mod jsonrpc;
pub mod params;


pub use error::{FbaError, Result};
pub use jobs::JobObject;
pub use jsonrpc::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
pub use params::{
    CheckJobParams, FbaFormulation, GapfillFormulation, GapfillModelParams,
    ReactionSensitivityParams, RunFbaParams, SERVICE_MODULE,
};
