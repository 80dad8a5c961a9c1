// Copyright 2025 fbarpc Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # Analysis Scripts
//!
//! One argument struct per remote analysis. Each script owns a flag table
//! and turns its parsed flags into the typed parameter object for the
//! corresponding queue method, validating it before anything is sent.

use argh::FromArgs;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::translate::{list_value, switch_value, translate, FlagTable};
use fbarpc_common::protocol::error::{FbaError, Result};
use fbarpc_common::protocol::{
    CheckJobParams, GapfillModelParams, JobObject, ReactionSensitivityParams, RunFbaParams,
};

/// A command that builds one request parameter object from its flags.
pub trait Script {
    /// Name printed in the "job queued" line
    const LABEL: &'static str;
    const TABLE: FlagTable;
    type Params: Serialize + DeserializeOwned;

    /// Every flag in the table, with `None` for flags that were not given.
    fn flags(&self) -> Vec<(&'static str, Option<Value>)>;

    fn validate(params: &Self::Params) -> Result<()>;

    /// Translates the flags, attaches the token and validates the result.
    fn build_params(&self, token: Option<&str>) -> Result<Self::Params> {
        let mut object = translate(Self::TABLE, self.flags())?;
        if let Some(token) = token {
            object.insert("auth".to_string(), Value::from(token));
        }
        let params: Self::Params = serde_json::from_value(Value::Object(object))
            .map_err(|e| FbaError::InvalidRequest(format!("Invalid parameters: {}", e)))?;
        Self::validate(&params)?;
        Ok(params)
    }
}

/// The line printed after a queue method succeeds.
pub fn queued_message(label: &str, job: &JobObject) -> String {
    format!("{} job queued: {}", label, job.id)
}

/// The line printed by `checkjob`.
pub fn status_message(job: &JobObject) -> String {
    format!("Job {} ({}): {}", job.id, job.kind, job.status)
}

fn text(value: &Option<String>) -> Option<Value> {
    value.as_deref().map(Value::from)
}

fn number<T: Into<Value> + Copy>(value: Option<T>) -> Option<Value> {
    value.map(Into::into)
}

/// Fills `workspace` from a fallback when the flag was not given.
pub fn default_workspace(workspace: &mut Option<String>, fallback: Option<String>) {
    if workspace.is_none() {
        *workspace = fallback;
    }
}

// ============================================================================
// runfba
// ============================================================================

/// queue flux balance analysis on a model
#[derive(FromArgs, Debug, Default, PartialEq)]
#[argh(subcommand, name = "runfba")]
pub struct RunFbaArgs {
    /// model ID
    #[argh(positional)]
    pub model: String,

    /// workspace for the output (default: FBA_WORKSPACE)
    #[argh(option, short = 'w')]
    pub workspace: Option<String>,

    /// workspace holding the model
    #[argh(option, long = "modelws")]
    pub model_ws: Option<String>,

    /// output ID for the FBA result
    #[argh(option, long = "fbaout")]
    pub fba_out: Option<String>,

    /// media formulation ID
    #[argh(option)]
    pub media: Option<String>,

    /// workspace holding the media
    #[argh(option, long = "mediaws")]
    pub media_ws: Option<String>,

    /// fraction of the optimal objective to enforce (0 to 1)
    #[argh(option)]
    pub objfraction: Option<f64>,

    /// genes to knock out, separated by ',' or ';'
    #[argh(option)]
    pub geneko: Option<String>,

    /// reactions to knock out, separated by ',' or ';'
    #[argh(option)]
    pub rxnko: Option<String>,

    /// minimize the objective instead of maximizing it
    #[argh(switch)]
    pub minimize: bool,

    /// run flux variability analysis
    #[argh(switch)]
    pub fva: bool,

    /// simulate single gene knockouts
    #[argh(switch)]
    pub simulateko: bool,

    /// minimize total flux
    #[argh(switch)]
    pub minimizeflux: bool,

    /// find the minimal media
    #[argh(switch)]
    pub findminmedia: bool,

    /// notes to attach to the result
    #[argh(option)]
    pub notes: Option<String>,

    /// attach the result to the model
    #[argh(switch, long = "addtomodel")]
    pub add_to_model: bool,

    /// overwrite an existing result object
    #[argh(switch)]
    pub overwrite: bool,
}

impl Script for RunFbaArgs {
    const LABEL: &'static str = "FBA";
    const TABLE: FlagTable = &[
        ("model", "model"),
        ("workspace", "workspace"),
        ("modelws", "model_ws"),
        ("fbaout", "fba"),
        ("media", "formulation.media"),
        ("mediaws", "formulation.media_ws"),
        ("objfraction", "formulation.objfraction"),
        ("geneko", "formulation.geneko"),
        ("rxnko", "formulation.rxnko"),
        ("minimize", "formulation.maximize_objective"),
        ("fva", "fva"),
        ("simulateko", "simulateko"),
        ("minimizeflux", "minimizeflux"),
        ("findminmedia", "findminmedia"),
        ("notes", "notes"),
        ("addtomodel", "add_to_model"),
        ("overwrite", "overwrite"),
    ];
    type Params = RunFbaParams;

    fn flags(&self) -> Vec<(&'static str, Option<Value>)> {
        vec![
            ("model", Some(Value::from(self.model.as_str()))),
            ("workspace", text(&self.workspace)),
            ("modelws", text(&self.model_ws)),
            ("fbaout", text(&self.fba_out)),
            ("media", text(&self.media)),
            ("mediaws", text(&self.media_ws)),
            ("objfraction", number(self.objfraction)),
            ("geneko", list_value(self.geneko.as_deref())),
            ("rxnko", list_value(self.rxnko.as_deref())),
            ("minimize", self.minimize.then_some(Value::Bool(false))),
            ("fva", switch_value(self.fva)),
            ("simulateko", switch_value(self.simulateko)),
            ("minimizeflux", switch_value(self.minimizeflux)),
            ("findminmedia", switch_value(self.findminmedia)),
            ("notes", text(&self.notes)),
            ("addtomodel", switch_value(self.add_to_model)),
            ("overwrite", switch_value(self.overwrite)),
        ]
    }

    fn validate(params: &RunFbaParams) -> Result<()> {
        params.validate()
    }
}

// ============================================================================
// gapfill
// ============================================================================

/// queue gap-filling of a model
#[derive(FromArgs, Debug, Default, PartialEq)]
#[argh(subcommand, name = "gapfill")]
pub struct GapfillArgs {
    /// model ID
    #[argh(positional)]
    pub model: String,

    /// workspace for the output (default: FBA_WORKSPACE)
    #[argh(option, short = 'w')]
    pub workspace: Option<String>,

    /// workspace holding the model
    #[argh(option, long = "modelws")]
    pub model_ws: Option<String>,

    /// output ID for the gap-filled model
    #[argh(option, long = "outmodel")]
    pub out_model: Option<String>,

    /// media formulation ID
    #[argh(option)]
    pub media: Option<String>,

    /// workspace holding the media
    #[argh(option, long = "mediaws")]
    pub media_ws: Option<String>,

    /// fraction of the optimal objective to enforce (0 to 1)
    #[argh(option)]
    pub objfraction: Option<f64>,

    /// genes to knock out, separated by ',' or ';'
    #[argh(option)]
    pub geneko: Option<String>,

    /// reactions to knock out, separated by ',' or ';'
    #[argh(option)]
    pub rxnko: Option<String>,

    /// number of solutions to find
    #[argh(option, long = "numsolutions")]
    pub num_solutions: Option<u32>,

    /// do not add media hypotheses
    #[argh(switch)]
    pub nomediahyp: bool,

    /// do not add biomass hypotheses
    #[argh(switch)]
    pub nobiomasshyp: bool,

    /// seconds allowed per solution
    #[argh(option, long = "timepersol")]
    pub time_per_solution: Option<u64>,

    /// seconds allowed for the whole run
    #[argh(option, long = "timelimit")]
    pub total_time_limit: Option<u64>,

    /// gap-fill every reaction rather than only the objective
    #[argh(switch)]
    pub completegapfill: bool,

    /// integrate the first solution into the model
    #[argh(switch)]
    pub integrate: bool,

    /// overwrite an existing model
    #[argh(switch)]
    pub overwrite: bool,
}

impl Script for GapfillArgs {
    const LABEL: &'static str = "Gapfilling";
    const TABLE: FlagTable = &[
        ("model", "model"),
        ("workspace", "workspace"),
        ("modelws", "model_ws"),
        ("outmodel", "out_model"),
        ("media", "formulation.formulation.media"),
        ("mediaws", "formulation.formulation.media_ws"),
        ("objfraction", "formulation.formulation.objfraction"),
        ("geneko", "formulation.formulation.geneko"),
        ("rxnko", "formulation.formulation.rxnko"),
        ("numsolutions", "formulation.num_solutions"),
        ("nomediahyp", "formulation.nomediahyp"),
        ("nobiomasshyp", "formulation.nobiomasshyp"),
        ("timepersol", "formulation.time_per_solution"),
        ("timelimit", "formulation.total_time_limit"),
        ("completegapfill", "formulation.completegapfill"),
        ("integrate", "integrate_solution"),
        ("overwrite", "overwrite"),
    ];
    type Params = GapfillModelParams;

    fn flags(&self) -> Vec<(&'static str, Option<Value>)> {
        vec![
            ("model", Some(Value::from(self.model.as_str()))),
            ("workspace", text(&self.workspace)),
            ("modelws", text(&self.model_ws)),
            ("outmodel", text(&self.out_model)),
            ("media", text(&self.media)),
            ("mediaws", text(&self.media_ws)),
            ("objfraction", number(self.objfraction)),
            ("geneko", list_value(self.geneko.as_deref())),
            ("rxnko", list_value(self.rxnko.as_deref())),
            ("numsolutions", number(self.num_solutions)),
            ("nomediahyp", switch_value(self.nomediahyp)),
            ("nobiomasshyp", switch_value(self.nobiomasshyp)),
            ("timepersol", number(self.time_per_solution)),
            ("timelimit", number(self.total_time_limit)),
            ("completegapfill", switch_value(self.completegapfill)),
            ("integrate", switch_value(self.integrate)),
            ("overwrite", switch_value(self.overwrite)),
        ]
    }

    fn validate(params: &GapfillModelParams) -> Result<()> {
        params.validate()
    }
}

// ============================================================================
// rxnsensitivity
// ============================================================================

/// queue reaction sensitivity analysis on a model
#[derive(FromArgs, Debug, Default, PartialEq)]
#[argh(subcommand, name = "rxnsensitivity")]
pub struct RxnSensitivityArgs {
    /// model ID
    #[argh(positional)]
    pub model: String,

    /// workspace for the output (default: FBA_WORKSPACE)
    #[argh(option, short = 'w')]
    pub workspace: Option<String>,

    /// workspace holding the model
    #[argh(option, long = "modelws")]
    pub model_ws: Option<String>,

    /// output ID for the sensitivity analysis
    #[argh(option, long = "rxnsensout")]
    pub rxnsens_out: Option<String>,

    /// reactions to test, separated by ',' or ';'
    #[argh(option, long = "rxnstotest")]
    pub reactions_to_test: Option<String>,

    /// gap-filling solution whose reactions are tested
    #[argh(option, long = "gapfillsolution")]
    pub gapfill_solution: Option<String>,

    /// delete reactions that do not contribute to the objective
    #[argh(switch, long = "deletenoncontributing")]
    pub delete_noncontributing: bool,

    /// reaction probability object ID
    #[argh(option, long = "rxnprobs")]
    pub rxnprobs: Option<String>,

    /// workspace holding the reaction probabilities
    #[argh(option, long = "rxnprobsws")]
    pub rxnprobs_ws: Option<String>,

    /// analysis type recorded with the result
    #[argh(option, long = "type")]
    pub kind: Option<String>,

    /// overwrite an existing result object
    #[argh(switch)]
    pub overwrite: bool,
}

impl Script for RxnSensitivityArgs {
    const LABEL: &'static str = "Reaction sensitivity analysis";
    const TABLE: FlagTable = &[
        ("model", "model"),
        ("workspace", "workspace"),
        ("modelws", "model_ws"),
        ("rxnsensout", "rxnsens_uid"),
        ("rxnstotest", "reactions_to_delete"),
        ("gapfillsolution", "gapfill_solution_id"),
        ("deletenoncontributing", "delete_noncontributing_reactions"),
        ("rxnprobs", "rxnprobs_id"),
        ("rxnprobsws", "rxnprobs_ws"),
        ("type", "type"),
        ("overwrite", "overwrite"),
    ];
    type Params = ReactionSensitivityParams;

    fn flags(&self) -> Vec<(&'static str, Option<Value>)> {
        vec![
            ("model", Some(Value::from(self.model.as_str()))),
            ("workspace", text(&self.workspace)),
            ("modelws", text(&self.model_ws)),
            ("rxnsensout", text(&self.rxnsens_out)),
            ("rxnstotest", list_value(self.reactions_to_test.as_deref())),
            ("gapfillsolution", text(&self.gapfill_solution)),
            ("deletenoncontributing", switch_value(self.delete_noncontributing)),
            ("rxnprobs", text(&self.rxnprobs)),
            ("rxnprobsws", text(&self.rxnprobs_ws)),
            ("type", text(&self.kind)),
            ("overwrite", switch_value(self.overwrite)),
        ]
    }

    fn validate(params: &ReactionSensitivityParams) -> Result<()> {
        params.validate()
    }
}

// ============================================================================
// checkjob
// ============================================================================

/// show the status of a queued job
#[derive(FromArgs, Debug, Default, PartialEq)]
#[argh(subcommand, name = "checkjob")]
pub struct CheckJobArgs {
    /// job ID
    #[argh(positional)]
    pub jobid: String,
}

impl Script for CheckJobArgs {
    const LABEL: &'static str = "Check";
    const TABLE: FlagTable = &[("jobid", "jobid")];
    type Params = CheckJobParams;

    fn flags(&self) -> Vec<(&'static str, Option<Value>)> {
        vec![("jobid", Some(Value::from(self.jobid.as_str())))]
    }

    fn validate(params: &CheckJobParams) -> Result<()> {
        params.validate()
    }
}
