//! Metabolic model records.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ChildRecord, FieldKind, FieldSpec, LoadedModel, Record, RootRecord};
use crate::protocol::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FbaModel {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub source: String,
    pub source_id: String,
    pub genome_ref: String,
    pub template_ref: String,
    pub modelreactions: Vec<ModelReaction>,
}

impl Record for FbaModel {
    const TYPE_NAME: &'static str = "FBAModel";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("id", FieldKind::String),
        FieldSpec::with_default("name", FieldKind::String, "\"\""),
        FieldSpec::with_default("type", FieldKind::String, "\"Singlegenome\""),
        FieldSpec::with_default("source", FieldKind::String, "\"KBase\""),
        FieldSpec::with_default("source_id", FieldKind::String, "\"\""),
        FieldSpec::with_default("genome_ref", FieldKind::String, "\"\""),
        FieldSpec::with_default("template_ref", FieldKind::String, "\"\""),
        FieldSpec::with_default(
            "modelreactions",
            FieldKind::RecordList(ModelReaction::normalize),
            "[]",
        ),
    ];
}

impl RootRecord for FbaModel {
    type Child = ModelReaction;
    const COLLECTION: &'static str = "modelreactions";

    fn children(&self) -> &[ModelReaction] {
        &self.modelreactions
    }

    fn children_mut(&mut self) -> &mut Vec<ModelReaction> {
        &mut self.modelreactions
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelReaction {
    pub id: String,
    pub name: Option<String>,
    pub reaction_ref: String,
    /// `>` forward, `<` reverse, `=` reversible
    pub direction: String,
    pub protons: f64,
    pub modelcompartment_ref: String,
    /// Likelihood that the reaction is present, from annotation evidence
    pub probability: f64,
}

impl Record for ModelReaction {
    const TYPE_NAME: &'static str = "ModelReaction";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("id", FieldKind::String),
        FieldSpec::optional("name", FieldKind::String),
        FieldSpec::with_default("reaction_ref", FieldKind::String, "\"\""),
        FieldSpec::with_default("direction", FieldKind::String, "\"=\""),
        FieldSpec::with_default("protons", FieldKind::Float, "0"),
        FieldSpec::with_default("modelcompartment_ref", FieldKind::String, "\"\""),
        FieldSpec::with_default("probability", FieldKind::Float, "0"),
    ];
}

impl ChildRecord for ModelReaction {
    fn local_id(&self) -> &str {
        &self.id
    }
}

impl ModelReaction {
    pub fn is_reversible(&self) -> bool {
        self.direction == "="
    }

    /// The reaction id without its compartment suffix (`rxn00001_c0` -> `rxn00001`).
    pub fn base_id(&self) -> &str {
        match self.id.rsplit_once('_') {
            Some((base, _)) if !base.is_empty() => base,
            _ => &self.id,
        }
    }
}

impl LoadedModel {
    pub fn reaction_reference(&self, reaction_id: &str) -> Result<&str> {
        self.child_reference(reaction_id)
    }

    pub fn rename_reaction(&mut self, reaction_id: &str, new_id: &str) -> Result<()> {
        self.set_child_field(reaction_id, "id", Value::from(new_id))
    }
}
