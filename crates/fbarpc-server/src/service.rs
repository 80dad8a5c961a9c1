//! The `fbaModelServices` module.
//!
//! Every analysis method validates its parameter object and queues a job.
//! The solver itself runs elsewhere; this module only records what was asked
//! for and reports on it.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::context::CallContext;
use crate::dispatch::{AuthRequirement, MethodSpec, ServiceModule};
use crate::job_queue::JobQueue;
use fbarpc_common::protocol::error::{FbaError, Result};
use fbarpc_common::protocol::params::{
    CheckJobParams, GapfillModelParams, ReactionSensitivityParams, RunFbaParams, SERVICE_MODULE,
};

const METHODS: &[MethodSpec] = &[
    MethodSpec::new("version", 0, 1, AuthRequirement::None),
    MethodSpec::new("status", 0, 1, AuthRequirement::None),
    MethodSpec::new("queue_runfba", 1, 1, AuthRequirement::Required),
    MethodSpec::new("queue_gapfill_model", 1, 1, AuthRequirement::Required),
    MethodSpec::new("queue_reaction_sensitivity_analysis", 1, 1, AuthRequirement::Required),
    MethodSpec::new("check_job", 1, 1, AuthRequirement::Required),
];

pub struct FbaModelServices {
    jobs: Arc<JobQueue>,
}

impl FbaModelServices {
    pub fn new(jobs: Arc<JobQueue>) -> Self {
        Self { jobs }
    }

    pub fn jobs(&self) -> &Arc<JobQueue> {
        &self.jobs
    }

    fn queue<P: Serialize>(&self, kind: &str, ctx: &CallContext, mut params: P, clear_auth: impl FnOnce(&mut P)) -> Result<Value> {
        // Tokens stay out of the ledger.
        clear_auth(&mut params);
        let jobdata = serde_json::to_value(&params)?;
        let job = self.jobs.queue(kind, ctx.user_id.as_deref(), jobdata);
        tracing::info!("{} queued {} job {}", ctx.caller(), kind, job.id);
        Ok(serde_json::to_value(job)?)
    }

    fn check_job(&self, ctx: &CallContext, params: CheckJobParams) -> Result<Value> {
        params.validate()?;
        let job = self.jobs.get(&params.jobid)?;
        if let (Some(owner), Some(user)) = (&job.owner, &ctx.user_id) {
            if owner != user {
                return Err(FbaError::Unauthorized(format!(
                    "Job {} belongs to another user",
                    job.id
                )));
            }
        }
        Ok(serde_json::to_value(job)?)
    }
}

fn parse_params<P: DeserializeOwned>(args: Vec<Value>) -> Result<P> {
    let value = args.into_iter().next().unwrap_or(Value::Null);
    serde_json::from_value(value)
        .map_err(|e| FbaError::InvalidRequest(format!("Invalid parameters: {}", e)))
}

impl ServiceModule for FbaModelServices {
    fn name(&self) -> &str {
        SERVICE_MODULE
    }

    fn methods(&self) -> &[MethodSpec] {
        METHODS
    }

    fn invoke(&self, method: &str, ctx: &CallContext, args: Vec<Value>) -> Result<Value> {
        match method {
            "version" => Ok(json!(env!("CARGO_PKG_VERSION"))),
            "status" => Ok(json!({
                "state": "OK",
                "version": env!("CARGO_PKG_VERSION"),
                "queued_jobs": self.jobs.len(),
            })),
            "queue_runfba" => {
                let params: RunFbaParams = parse_params(args)?;
                params.validate()?;
                self.queue("RunFBA", ctx, params, |p| p.auth = None)
            }
            "queue_gapfill_model" => {
                let params: GapfillModelParams = parse_params(args)?;
                params.validate()?;
                self.queue("GapfillModel", ctx, params, |p| p.auth = None)
            }
            "queue_reaction_sensitivity_analysis" => {
                let params: ReactionSensitivityParams = parse_params(args)?;
                params.validate()?;
                self.queue("ReactionSensitivityAnalysis", ctx, params, |p| p.auth = None)
            }
            "check_job" => self.check_job(ctx, parse_params(args)?),
            other => Err(FbaError::NoSuchMethod(format!("{}.{}", SERVICE_MODULE, other))),
        }
    }
}
