//! Job handles returned by the queue methods.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Status of a queued job as reported by `check_job`.
///
/// The wire field is a free-form string so that statuses set by the remote
/// job runner pass through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobObject {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: String,
    /// The parameter object the job was queued with
    #[serde(default)]
    pub jobdata: Value,
    /// Unix timestamp (ms) at which the job was queued
    pub queuetime: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starttime: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completetime: Option<u64>,
    #[serde(default)]
    pub complete: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

impl JobObject {
    pub const STATUS_QUEUED: &'static str = "queued";

    pub fn is_queued(&self) -> bool {
        self.status == Self::STATUS_QUEUED
    }
}
