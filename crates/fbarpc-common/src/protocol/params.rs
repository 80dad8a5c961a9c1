//! Parameter objects for the FBA model service methods.
//!
//! Each queue method takes exactly one positional argument: one of the
//! structs below, serialized as a JSON object. Validation is shared by the
//! CLI (before anything is sent) and the service handlers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::error::{FbaError, Result};

/// Module name under which the service methods are exposed.
pub const SERVICE_MODULE: &str = "fbaModelServices";

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(FbaError::MissingInput(format!(
            "Missing required parameter: {}",
            field
        )));
    }
    Ok(())
}

fn default_objfraction() -> f64 {
    0.1
}

fn default_true() -> bool {
    true
}

fn default_num_solutions() -> u32 {
    1
}

fn default_sensitivity_type() -> String {
    "unknown".to_string()
}

/// Media, knockouts and objective settings shared by FBA and gap-filling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FbaFormulation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_ws: Option<String>,
    /// Fraction of the optimal objective enforced during secondary optimizations
    #[serde(default = "default_objfraction")]
    pub objfraction: f64,
    #[serde(default)]
    pub geneko: Vec<String>,
    #[serde(default)]
    pub rxnko: Vec<String>,
    #[serde(default = "default_true")]
    pub maximize_objective: bool,
    /// Per-element uptake limits, e.g. `{"C": 60}`
    #[serde(default)]
    pub uptakelim: BTreeMap<String, f64>,
}

impl Default for FbaFormulation {
    fn default() -> Self {
        Self {
            media: None,
            media_ws: None,
            objfraction: default_objfraction(),
            geneko: Vec::new(),
            rxnko: Vec::new(),
            maximize_objective: true,
            uptakelim: BTreeMap::new(),
        }
    }
}

impl FbaFormulation {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.objfraction) {
            return Err(FbaError::InvalidRequest(format!(
                "objfraction must be between 0 and 1, got {}",
                self.objfraction
            )));
        }
        if self.media_ws.is_some() && self.media.is_none() {
            return Err(FbaError::MissingInput(
                "A media workspace was given without a media ID".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parameters for `queue_runfba`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunFbaParams {
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_ws: Option<String>,
    /// Output ID for the FBA result object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fba: Option<String>,
    pub workspace: String,
    #[serde(default)]
    pub formulation: FbaFormulation,
    #[serde(default)]
    pub fva: bool,
    #[serde(default)]
    pub simulateko: bool,
    #[serde(default)]
    pub minimizeflux: bool,
    #[serde(default)]
    pub findminmedia: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub add_to_model: bool,
    #[serde(default)]
    pub overwrite: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<String>,
}

impl RunFbaParams {
    pub fn validate(&self) -> Result<()> {
        require("model", &self.model)?;
        require("workspace", &self.workspace)?;
        self.formulation.validate()
    }
}

/// Gap-filling settings layered over a base formulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapfillFormulation {
    #[serde(default)]
    pub formulation: FbaFormulation,
    #[serde(default = "default_num_solutions")]
    pub num_solutions: u32,
    #[serde(default)]
    pub nomediahyp: bool,
    #[serde(default)]
    pub nobiomasshyp: bool,
    /// Seconds allowed per solution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_per_solution: Option<u64>,
    /// Seconds allowed for the whole run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_time_limit: Option<u64>,
    #[serde(default)]
    pub completegapfill: bool,
}

impl Default for GapfillFormulation {
    fn default() -> Self {
        Self {
            formulation: FbaFormulation::default(),
            num_solutions: default_num_solutions(),
            nomediahyp: false,
            nobiomasshyp: false,
            time_per_solution: None,
            total_time_limit: None,
            completegapfill: false,
        }
    }
}

/// Parameters for `queue_gapfill_model`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapfillModelParams {
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_ws: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_model: Option<String>,
    pub workspace: String,
    #[serde(default)]
    pub formulation: GapfillFormulation,
    #[serde(default)]
    pub integrate_solution: bool,
    #[serde(default)]
    pub overwrite: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<String>,
}

impl GapfillModelParams {
    pub fn validate(&self) -> Result<()> {
        require("model", &self.model)?;
        require("workspace", &self.workspace)?;
        if self.formulation.num_solutions == 0 {
            return Err(FbaError::InvalidRequest(
                "num_solutions must be at least 1".to_string(),
            ));
        }
        if let (Some(per), Some(total)) = (
            self.formulation.time_per_solution,
            self.formulation.total_time_limit,
        ) {
            if per > total {
                return Err(FbaError::InvalidRequest(format!(
                    "time_per_solution ({}s) exceeds total_time_limit ({}s)",
                    per, total
                )));
            }
        }
        self.formulation.formulation.validate()
    }
}

/// Parameters for `queue_reaction_sensitivity_analysis`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionSensitivityParams {
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_ws: Option<String>,
    /// Output ID for the sensitivity analysis object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rxnsens_uid: Option<String>,
    pub workspace: String,
    #[serde(default)]
    pub reactions_to_delete: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gapfill_solution_id: Option<String>,
    #[serde(default)]
    pub delete_noncontributing_reactions: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rxnprobs_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rxnprobs_ws: Option<String>,
    #[serde(default = "default_sensitivity_type", rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub overwrite: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<String>,
}

impl ReactionSensitivityParams {
    /// Requires the model and workspace, plus at least one source of
    /// reactions to test.
    pub fn validate(&self) -> Result<()> {
        require("model", &self.model)?;
        require("workspace", &self.workspace)?;

        let has_reactions = !self.reactions_to_delete.is_empty();
        let has_solution = self
            .gapfill_solution_id
            .as_deref()
            .is_some_and(|id| !id.trim().is_empty());
        if !has_reactions && !has_solution && !self.delete_noncontributing_reactions {
            return Err(FbaError::MissingInput(
                "Must provide a list of reactions to test, a gapfill solution ID, \
                 or request deletion of noncontributing reactions"
                    .to_string(),
            ));
        }
        if self.rxnprobs_ws.is_some() && self.rxnprobs_id.is_none() {
            return Err(FbaError::MissingInput(
                "A reaction probability workspace was given without a reaction probability ID"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

/// Parameters for `check_job`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckJobParams {
    pub jobid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<String>,
}

impl CheckJobParams {
    pub fn validate(&self) -> Result<()> {
        require("jobid", &self.jobid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sensitivity(value: serde_json::Value) -> ReactionSensitivityParams {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_sensitivity_requires_one_reaction_source() {
        let params = sensitivity(json!({"model": "iJO1366", "workspace": "ws"}));
        let err = params.validate().unwrap_err();
        assert!(matches!(err, FbaError::MissingInput(_)));
        assert!(err.to_string().contains("gapfill solution ID"));
    }

    #[test]
    fn test_sensitivity_accepts_each_reaction_source() {
        let cases = [
            json!({"model": "m", "workspace": "ws", "reactions_to_delete": ["rxn00001"]}),
            json!({"model": "m", "workspace": "ws", "gapfill_solution_id": "gf.1.gfsol.1"}),
            json!({"model": "m", "workspace": "ws", "delete_noncontributing_reactions": true}),
        ];
        for case in cases {
            assert!(sensitivity(case.clone()).validate().is_ok(), "{case} should validate");
        }
    }

    #[test]
    fn test_sensitivity_blank_solution_id_does_not_count() {
        let params = sensitivity(json!({"model": "m", "workspace": "ws", "gapfill_solution_id": "  "}));
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_sensitivity_defaults() {
        let params = sensitivity(json!({"model": "m", "workspace": "ws"}));
        assert_eq!(params.kind, "unknown");
        assert!(params.reactions_to_delete.is_empty());
        assert!(!params.delete_noncontributing_reactions);
        assert!(!params.overwrite);

        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(value["type"], "unknown");
        assert!(value.get("gapfill_solution_id").is_none());
    }

    #[test]
    fn test_formulation_defaults() {
        let params: RunFbaParams =
            serde_json::from_value(json!({"model": "m", "workspace": "ws"})).unwrap();
        assert_eq!(params.formulation.objfraction, 0.1);
        assert!(params.formulation.maximize_objective);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_runfba_rejects_blank_model() {
        let params: RunFbaParams =
            serde_json::from_value(json!({"model": "", "workspace": "ws"})).unwrap();
        let err = params.validate().unwrap_err();
        assert_eq!(err.to_string(), "Missing required parameter: model");
    }

    #[test]
    fn test_formulation_rejects_out_of_range_objfraction() {
        let formulation = FbaFormulation {
            objfraction: 1.5,
            ..FbaFormulation::default()
        };
        assert!(matches!(formulation.validate(), Err(FbaError::InvalidRequest(_))));
    }

    #[test]
    fn test_gapfill_time_limits() {
        let mut params: GapfillModelParams =
            serde_json::from_value(json!({"model": "m", "workspace": "ws"})).unwrap();
        assert_eq!(params.formulation.num_solutions, 1);
        params.formulation.time_per_solution = Some(3600);
        params.formulation.total_time_limit = Some(60);
        assert!(params.validate().is_err());
        params.formulation.total_time_limit = Some(7200);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_check_job_requires_id() {
        let params = CheckJobParams { jobid: String::new(), auth: None };
        assert!(matches!(params.validate(), Err(FbaError::MissingInput(_))));
    }
}
