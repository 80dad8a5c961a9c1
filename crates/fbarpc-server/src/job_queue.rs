//! In-memory job ledger.
//!
//! Queue methods record a job here and hand back its handle. Nothing runs the
//! jobs locally: the remote job runner picks them up and owns their status.
//!
//! The ledger holds at most `max_jobs` entries. Queueing past the limit drops
//! the oldest job, after which `check_job` reports it as not found.

use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::time::{SystemTime, UNIX_EPOCH};

use fbarpc_common::protocol::error::{FbaError, Result};
use fbarpc_common::protocol::JobObject;

/// Ledger size used by [`JobQueue::new`].
pub const DEFAULT_MAX_JOBS: usize = 10_000;

#[derive(Default)]
struct QueueInner {
    next_id: u64,
    jobs: HashMap<String, JobObject>,
    /// Ids in queueing order, oldest first
    order: VecDeque<String>,
}

/// Thread-safe ledger of queued jobs. Ids are `job.1`, `job.2`, ...
pub struct JobQueue {
    inner: Mutex<QueueInner>,
    max_jobs: usize,
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::with_max_jobs(DEFAULT_MAX_JOBS)
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// A ledger keeping at most `max_jobs` entries (at least one).
    pub fn with_max_jobs(max_jobs: usize) -> Self {
        Self {
            inner: Mutex::new(QueueInner::default()),
            max_jobs: max_jobs.max(1),
        }
    }

    pub fn max_jobs(&self) -> usize {
        self.max_jobs
    }

    pub fn queue(&self, kind: &str, owner: Option<&str>, jobdata: Value) -> JobObject {
        let mut inner = self.inner.lock();
        inner.next_id += 1;
        let job = JobObject {
            id: format!("job.{}", inner.next_id),
            kind: kind.to_string(),
            status: JobObject::STATUS_QUEUED.to_string(),
            jobdata,
            queuetime: now_ms(),
            starttime: None,
            completetime: None,
            complete: false,
            owner: owner.map(str::to_string),
        };
        while inner.order.len() >= self.max_jobs {
            let Some(oldest) = inner.order.pop_front() else {
                break;
            };
            inner.jobs.remove(&oldest);
            tracing::debug!("Evicted {} from the job ledger", oldest);
        }
        inner.order.push_back(job.id.clone());
        inner.jobs.insert(job.id.clone(), job.clone());
        tracing::debug!("Queued {} as {}", kind, job.id);
        job
    }

    pub fn get(&self, id: &str) -> Result<JobObject> {
        self.inner
            .lock()
            .jobs
            .get(id)
            .cloned()
            .ok_or_else(|| FbaError::Server(format!("Job {} not found", id)))
    }

    pub fn len(&self) -> usize {
        self.inner.lock().jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_ids_start_at_one_and_increase() {
        let queue = JobQueue::new();
        assert!(queue.is_empty());
        let first = queue.queue("RunFBA", Some("alice"), json!({"model": "m"}));
        let second = queue.queue("GapfillModel", None, json!({}));
        assert_eq!(first.id, "job.1");
        assert_eq!(second.id, "job.2");
        assert!(first.is_queued());
        assert_eq!(first.owner.as_deref(), Some("alice"));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_get_returns_stored_job() {
        let queue = JobQueue::new();
        let job = queue.queue("RunFBA", None, json!({"model": "m"}));
        assert_eq!(queue.get(&job.id).unwrap(), job);
    }

    #[test]
    fn test_unknown_job_is_an_error() {
        let queue = JobQueue::new();
        let err = queue.get("job.42").unwrap_err();
        assert_eq!(err.to_string(), "Server error: Job job.42 not found");
    }

    #[test]
    fn test_ledger_evicts_oldest_past_limit() {
        let queue = JobQueue::with_max_jobs(2);
        let first = queue.queue("RunFBA", None, json!({}));
        let second = queue.queue("RunFBA", None, json!({}));
        let third = queue.queue("RunFBA", None, json!({}));

        assert_eq!(queue.len(), 2);
        assert!(queue.get(&first.id).is_err());
        assert_eq!(queue.get(&second.id).unwrap(), second);
        assert_eq!(queue.get(&third.id).unwrap(), third);
        assert_eq!(third.id, "job.3");
    }

    #[test]
    fn test_zero_limit_still_keeps_latest_job() {
        let queue = JobQueue::with_max_jobs(0);
        assert_eq!(queue.max_jobs(), 1);
        queue.queue("RunFBA", None, json!({}));
        let latest = queue.queue("RunFBA", None, json!({}));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.get(&latest.id).unwrap(), latest);
    }

    #[test]
    fn test_concurrent_queueing_yields_unique_ids() {
        let queue = Arc::new(JobQueue::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    (0..100)
                        .map(|_| queue.queue("RunFBA", None, Value::Null).id)
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let ids: HashSet<String> = handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap())
            .collect();
        assert_eq!(ids.len(), 800);
        assert_eq!(queue.len(), 800);
    }
}
