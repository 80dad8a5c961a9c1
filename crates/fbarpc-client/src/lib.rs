//! Client for the FBA model service.
//!
//! ```no_run
//! use fbarpc_client::FbaClient;
//! use fbarpc_common::protocol::CheckJobParams;
//!
//! # async fn run() -> fbarpc_common::protocol::Result<()> {
//! let client = FbaClient::new("http://127.0.0.1:7036")?.with_token("un=alice|tokenid=1");
//! let job = client
//!     .check_job(&CheckJobParams { jobid: "job.1".into(), auth: None })
//!     .await?;
//! println!("{} is {}", job.id, job.status);
//! # Ok(())
//! # }
//! ```

pub mod client;

pub use client::{unwrap_single, FbaClient, DEFAULT_TIMEOUT};
