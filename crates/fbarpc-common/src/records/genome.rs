//! Genome and Feature records.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ChildRecord, FieldKind, FieldSpec, LoadedGenome, Record, RootRecord};
use crate::protocol::error::Result;

/// Contig location of a feature: `(contig id, start, strand, length)`.
pub type Location = (String, i64, String, i64);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    pub id: String,
    pub scientific_name: String,
    pub domain: String,
    pub genetic_code: i64,
    pub dna_size: i64,
    pub num_contigs: i64,
    pub source: String,
    pub source_id: String,
    pub md5: String,
    pub taxonomy: String,
    pub gc_content: f64,
    pub features: Vec<Feature>,
}

impl Record for Genome {
    const TYPE_NAME: &'static str = "Genome";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("id", FieldKind::String),
        FieldSpec::with_default("scientific_name", FieldKind::String, "\"\""),
        FieldSpec::with_default("domain", FieldKind::String, "\"Bacteria\""),
        FieldSpec::with_default("genetic_code", FieldKind::Integer, "11"),
        FieldSpec::with_default("dna_size", FieldKind::Integer, "0"),
        FieldSpec::with_default("num_contigs", FieldKind::Integer, "0"),
        FieldSpec::with_default("source", FieldKind::String, "\"KBase\""),
        FieldSpec::with_default("source_id", FieldKind::String, "\"\""),
        FieldSpec::with_default("md5", FieldKind::String, "\"\""),
        FieldSpec::with_default("taxonomy", FieldKind::String, "\"\""),
        FieldSpec::with_default("gc_content", FieldKind::Float, "0.5"),
        FieldSpec::with_default("features", FieldKind::RecordList(Feature::normalize), "[]"),
    ];
}

impl RootRecord for Genome {
    type Child = Feature;
    const COLLECTION: &'static str = "features";

    fn children(&self) -> &[Feature] {
        &self.features
    }

    fn children_mut(&mut self) -> &mut Vec<Feature> {
        &mut self.features
    }
}

impl Genome {
    /// Features whose assigned function mentions `term` (case-insensitive).
    pub fn features_with_function<'a>(&'a self, term: &'a str) -> impl Iterator<Item = &'a Feature> {
        let term = term.to_lowercase();
        self.features
            .iter()
            .filter(move |f| f.function.to_lowercase().contains(&term))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub function: String,
    pub location: Vec<Location>,
    pub md5: String,
    pub protein_translation: Option<String>,
    pub dna_sequence: Option<String>,
    pub aliases: Vec<String>,
}

impl Record for Feature {
    const TYPE_NAME: &'static str = "Feature";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("id", FieldKind::String),
        FieldSpec::with_default("type", FieldKind::String, "\"peg\""),
        FieldSpec::with_default("function", FieldKind::String, "\"\""),
        FieldSpec::with_default("location", FieldKind::List, "[]"),
        FieldSpec::with_default("md5", FieldKind::String, "\"\""),
        FieldSpec::optional("protein_translation", FieldKind::String),
        FieldSpec::optional("dna_sequence", FieldKind::String),
        FieldSpec::with_default("aliases", FieldKind::StringList, "[]"),
    ];
}

impl ChildRecord for Feature {
    fn local_id(&self) -> &str {
        &self.id
    }
}

impl Feature {
    /// Functional roles, split on the ` / ` and `; ` separators used in
    /// multi-role annotations.
    pub fn roles(&self) -> Vec<&str> {
        self.function
            .split(" / ")
            .flat_map(|part| part.split("; "))
            .map(str::trim)
            .filter(|role| !role.is_empty())
            .collect()
    }

    /// Total length across all location segments.
    pub fn length(&self) -> i64 {
        self.location.iter().map(|(_, _, _, len)| len).sum()
    }
}

impl LoadedGenome {
    pub fn feature_reference(&self, feature_id: &str) -> Result<&str> {
        self.child_reference(feature_id)
    }

    pub fn rename_feature(&mut self, feature_id: &str, new_id: &str) -> Result<()> {
        self.set_child_field(feature_id, "id", Value::from(new_id))
    }
}
