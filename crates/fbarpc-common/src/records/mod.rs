//! Schema Records
//!
//! Local mirrors of the remote workspace schema. Each record type carries a
//! static field table (`FIELDS`) naming every field with its kind, whether it
//! is required, and the JSON default used when it is absent. Parsing a record
//! through [`Record::from_value`] applies that table recursively, so nested
//! record lists get their defaults too.
//!
//! Derived references (`"<workspace>/<object>/features/id/<id>"`) are not
//! stored on the records. They live in an [`ObjectGraph`] arena, where each
//! node holds the index of its parent instead of a back-pointer.
//!
//! # Example
//!
//! ```
//! use fbarpc_common::records::{LoadedGenome, Record};
//! use serde_json::json;
//!
//! let genome = LoadedGenome::load("myws", "Ecoli", json!({
//!     "id": "kb|g.0",
//!     "features": [{"id": "kb|g.0.peg.1"}]
//! })).unwrap();
//!
//! assert_eq!(genome.record().genetic_code, 11);
//! assert_eq!(
//!     genome.child_reference("kb|g.0.peg.1").unwrap(),
//!     "myws/Ecoli/features/id/kb|g.0.peg.1"
//! );
//! ```

pub mod genome;
pub mod graph;
pub mod model;

pub use genome::{Feature, Genome};
pub use graph::{NodeId, ObjectGraph};
pub use model::{FbaModel, ModelReaction};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;

use crate::protocol::error::{FbaError, Result};

/// Shape of a record field.
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    String,
    Integer,
    Float,
    Boolean,
    StringList,
    /// Arbitrary JSON list (e.g. location tuples)
    List,
    /// List of nested records, normalized by the child type's field table
    RecordList(fn(Value) -> Result<Value>),
}

impl FieldKind {
    /// Whether `value` has this kind. `null` never matches.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            FieldKind::String => value.is_string(),
            FieldKind::Integer => value.is_i64() || value.is_u64(),
            FieldKind::Float => value.is_number(),
            FieldKind::Boolean => value.is_boolean(),
            FieldKind::StringList => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
            FieldKind::List | FieldKind::RecordList(_) => value.is_array(),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Integer => "integer",
            FieldKind::Float => "float",
            FieldKind::Boolean => "boolean",
            FieldKind::StringList => "list of strings",
            FieldKind::List => "list",
            FieldKind::RecordList(_) => "list of records",
        }
    }
}

/// One entry of a record's field table.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    /// JSON literal used when the field is absent or null
    pub default: Option<&'static str>,
}

impl FieldSpec {
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind, required: true, default: None }
    }

    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind, required: false, default: None }
    }

    pub const fn with_default(name: &'static str, kind: FieldKind, default: &'static str) -> Self {
        Self { name, kind, required: false, default: Some(default) }
    }

    pub fn default_value(&self) -> Result<Value> {
        match self.default {
            Some(literal) => serde_json::from_str(literal).map_err(|e| {
                FbaError::Record(format!("bad default for field `{}`: {}", self.name, e))
            }),
            None => Ok(Value::Null),
        }
    }
}

/// A record mirrored from the remote schema.
pub trait Record: Serialize + DeserializeOwned + Sized {
    const TYPE_NAME: &'static str;
    const FIELDS: &'static [FieldSpec];

    fn field_spec(name: &str) -> Option<&'static FieldSpec> {
        Self::FIELDS.iter().find(|spec| spec.name == name)
    }

    /// Checks required fields, fills defaults and normalizes nested record
    /// lists, returning the completed JSON object.
    fn normalize(value: Value) -> Result<Value> {
        let Value::Object(mut map) = value else {
            return Err(FbaError::Record(format!(
                "{} must be a JSON object",
                Self::TYPE_NAME
            )));
        };

        for spec in Self::FIELDS {
            let present = map.get(spec.name).is_some_and(|v| !v.is_null());
            if !present {
                if spec.required {
                    return Err(FbaError::Record(format!(
                        "{}: missing required field `{}`",
                        Self::TYPE_NAME,
                        spec.name
                    )));
                }
                map.insert(spec.name.to_string(), spec.default_value()?);
                continue;
            }
            if let FieldKind::RecordList(normalize_child) = spec.kind {
                if let Some(Value::Array(children)) = map.remove(spec.name) {
                    let children = children
                        .into_iter()
                        .map(normalize_child)
                        .collect::<Result<Vec<_>>>()?;
                    map.insert(spec.name.to_string(), Value::Array(children));
                } else {
                    return Err(type_error::<Self>(spec));
                }
            }
        }

        Ok(Value::Object(map))
    }

    /// Parses a record from its serialized remote representation.
    fn from_value(value: Value) -> Result<Self> {
        let normalized = Self::normalize(value)?;
        serde_json::from_value(normalized)
            .map_err(|e| FbaError::Record(format!("{}: {}", Self::TYPE_NAME, e)))
    }

    fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    fn get_field(&self, name: &str) -> Result<Value> {
        let spec = Self::field_spec(name).ok_or_else(|| unknown_field::<Self>(name))?;
        let mut map = self.to_object()?;
        Ok(map.remove(spec.name).unwrap_or(Value::Null))
    }

    /// Replaces one field. A null value resets the field to its default.
    /// On error the record is left unchanged.
    fn set_field(&mut self, name: &str, value: Value) -> Result<()> {
        let spec = Self::field_spec(name).ok_or_else(|| unknown_field::<Self>(name))?;
        if !value.is_null() && !spec.kind.matches(&value) {
            return Err(type_error::<Self>(spec));
        }

        let mut map = self.to_object()?;
        map.insert(spec.name.to_string(), value);
        *self = Self::from_value(Value::Object(map))?;
        Ok(())
    }

    #[doc(hidden)]
    fn to_object(&self) -> Result<Map<String, Value>> {
        match self.to_value()? {
            Value::Object(map) => Ok(map),
            _ => Err(FbaError::Record(format!(
                "{} did not serialize to an object",
                Self::TYPE_NAME
            ))),
        }
    }
}

/// A record addressed by a local id inside its parent's collection.
pub trait ChildRecord: Record {
    fn local_id(&self) -> &str;
}

/// A top-level workspace object that owns one collection of child records.
pub trait RootRecord: Record {
    type Child: ChildRecord;
    /// Path segment naming the child collection, e.g. `features`
    const COLLECTION: &'static str;

    fn children(&self) -> &[Self::Child];
    fn children_mut(&mut self) -> &mut Vec<Self::Child>;
}

fn unknown_field<R: Record>(name: &str) -> FbaError {
    FbaError::Record(format!("{} has no field `{}`", R::TYPE_NAME, name))
}

fn type_error<R: Record>(spec: &FieldSpec) -> FbaError {
    FbaError::Record(format!(
        "{}: field `{}` must be a {}",
        R::TYPE_NAME,
        spec.name,
        spec.kind.name()
    ))
}

/// A root record together with the object graph that names it and its
/// children.
pub struct LoadedObject<R: RootRecord> {
    record: R,
    graph: ObjectGraph,
    root: NodeId,
    child_nodes: Vec<NodeId>,
}

pub type LoadedGenome = LoadedObject<Genome>;
pub type LoadedModel = LoadedObject<FbaModel>;

impl<R: RootRecord> LoadedObject<R> {
    /// Parses `value` as `R` and registers it as `<workspace>/<object_id>`.
    ///
    /// Child ids must be unique within the collection.
    pub fn load(workspace: &str, object_id: &str, value: Value) -> Result<Self> {
        let record = R::from_value(value)?;

        let mut graph = ObjectGraph::new();
        let root = graph.add_root(format!("{}/{}", workspace, object_id));

        let mut seen = HashSet::new();
        let mut child_nodes = Vec::with_capacity(record.children().len());
        for child in record.children() {
            if !seen.insert(child.local_id().to_string()) {
                return Err(FbaError::Record(format!(
                    "{}: duplicate {} id `{}`",
                    R::TYPE_NAME,
                    R::Child::TYPE_NAME,
                    child.local_id()
                )));
            }
            child_nodes.push(graph.add_child(root, R::COLLECTION, child.local_id())?);
        }

        Ok(Self { record, graph, root, child_nodes })
    }

    pub fn record(&self) -> &R {
        &self.record
    }

    pub fn graph(&self) -> &ObjectGraph {
        &self.graph
    }

    pub fn reference(&self) -> Result<&str> {
        self.graph.reference(self.root)
    }

    pub fn child(&self, local_id: &str) -> Option<&R::Child> {
        self.record.children().iter().find(|c| c.local_id() == local_id)
    }

    fn child_index(&self, local_id: &str) -> Result<usize> {
        self.record
            .children()
            .iter()
            .position(|c| c.local_id() == local_id)
            .ok_or_else(|| {
                FbaError::Record(format!(
                    "{} has no {} `{}`",
                    R::TYPE_NAME,
                    R::Child::TYPE_NAME,
                    local_id
                ))
            })
    }

    pub fn child_node(&self, local_id: &str) -> Result<NodeId> {
        Ok(self.child_nodes[self.child_index(local_id)?])
    }

    pub fn child_reference(&self, local_id: &str) -> Result<&str> {
        let node = self.child_node(local_id)?;
        self.graph.reference(node)
    }

    /// Sets a root-level field. The child collection itself cannot be
    /// replaced this way because the graph would go out of sync.
    pub fn set_field(&mut self, name: &str, value: Value) -> Result<()> {
        if name == R::COLLECTION {
            return Err(FbaError::Record(format!(
                "{}: `{}` cannot be replaced wholesale",
                R::TYPE_NAME,
                name
            )));
        }
        self.record.set_field(name, value)
    }

    /// Sets a field on one child. Changing the child's `id` renames its graph
    /// node, which drops the cached references below it.
    pub fn set_child_field(&mut self, local_id: &str, name: &str, value: Value) -> Result<()> {
        let index = self.child_index(local_id)?;

        if name == "id" {
            if let Some(new_id) = value.as_str() {
                if new_id != local_id && self.child(new_id).is_some() {
                    return Err(FbaError::Record(format!(
                        "{}: duplicate {} id `{}`",
                        R::TYPE_NAME,
                        R::Child::TYPE_NAME,
                        new_id
                    )));
                }
            }
        }

        self.record.children_mut()[index].set_field(name, value)?;

        let renamed = self.record.children()[index].local_id().to_string();
        if renamed != local_id {
            self.graph.rename(self.child_nodes[index], &renamed)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn genome() -> LoadedGenome {
        LoadedGenome::load(
            "chenry:home",
            "Ecoli.genome",
            json!({
                "id": "kb|g.0",
                "scientific_name": "Escherichia coli",
                "features": [
                    {"id": "kb|g.0.peg.1", "function": "thrA"},
                    {"id": "kb|g.0.peg.2", "aliases": ["b0002"]}
                ]
            }),
        )
        .unwrap()
    }

    #[test]
    fn test_defaults_are_populated_recursively() {
        let genome = genome();
        let record = genome.record();
        assert_eq!(record.domain, "Bacteria");
        assert_eq!(record.genetic_code, 11);
        assert_eq!(record.features[0].kind, "peg");
        assert_eq!(record.features[0].function, "thrA");
        assert_eq!(record.features[1].function, "");
        assert!(record.features[0].aliases.is_empty());
        assert_eq!(record.features[1].aliases, vec!["b0002".to_string()]);
    }

    #[test]
    fn test_missing_required_field_is_named() {
        let err = Genome::from_value(json!({"features": []})).unwrap_err();
        assert!(err.to_string().contains("missing required field `id`"));

        let err = Genome::from_value(json!({"id": "g", "features": [{"function": "x"}]})).unwrap_err();
        assert!(err.to_string().contains("Feature: missing required field `id`"));
    }

    #[test]
    fn test_non_object_is_rejected() {
        assert!(Feature::from_value(json!(["kb|g.0.peg.1"])).is_err());
    }

    #[test]
    fn test_get_and_set_field() {
        let mut feature = Feature::from_value(json!({"id": "f1"})).unwrap();
        assert_eq!(feature.get_field("type").unwrap(), json!("peg"));

        feature.set_field("function", json!("hypothetical protein")).unwrap();
        assert_eq!(feature.function, "hypothetical protein");

        feature.set_field("function", Value::Null).unwrap();
        assert_eq!(feature.function, "");
    }

    #[test]
    fn test_set_field_rejects_unknown_and_mistyped() {
        let mut feature = Feature::from_value(json!({"id": "f1"})).unwrap();
        assert!(feature.set_field("colour", json!("red")).is_err());
        assert!(feature.get_field("colour").is_err());

        let err = feature.set_field("aliases", json!("b0001")).unwrap_err();
        assert!(err.to_string().contains("list of strings"));
        assert!(feature.aliases.is_empty());

        assert!(feature.set_field("id", Value::Null).is_err());
        assert_eq!(feature.id, "f1");
    }

    #[test]
    fn test_references_concatenate_parent_and_segment() {
        let genome = genome();
        assert_eq!(genome.reference().unwrap(), "chenry:home/Ecoli.genome");
        let first = genome.child_reference("kb|g.0.peg.1").unwrap().to_string();
        assert_eq!(first, "chenry:home/Ecoli.genome/features/id/kb|g.0.peg.1");
        assert_eq!(genome.child_reference("kb|g.0.peg.1").unwrap(), first);
        assert!(genome.child_reference("kb|g.0.peg.99").is_err());
    }

    #[test]
    fn test_renaming_child_updates_reference() {
        let mut genome = genome();
        let before = genome.child_reference("kb|g.0.peg.2").unwrap().to_string();
        genome.set_child_field("kb|g.0.peg.2", "id", json!("kb|g.0.peg.20")).unwrap();

        assert!(genome.child_reference("kb|g.0.peg.2").is_err());
        let after = genome.child_reference("kb|g.0.peg.20").unwrap();
        assert_ne!(before, after);
        assert_eq!(after, "chenry:home/Ecoli.genome/features/id/kb|g.0.peg.20");
    }

    #[test]
    fn test_renaming_to_existing_id_is_rejected() {
        let mut genome = genome();
        assert!(genome.set_child_field("kb|g.0.peg.2", "id", json!("kb|g.0.peg.1")).is_err());
        assert!(genome.child("kb|g.0.peg.2").is_some());
    }

    #[test]
    fn test_duplicate_child_ids_are_rejected() {
        let result = LoadedGenome::load(
            "ws",
            "g",
            json!({"id": "g", "features": [{"id": "a"}, {"id": "a"}]}),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_collection_cannot_be_replaced() {
        let mut genome = genome();
        assert!(genome.set_field("features", json!([])).is_err());
        genome.set_field("scientific_name", json!("E. coli K-12")).unwrap();
        assert_eq!(genome.record().scientific_name, "E. coli K-12");
    }

    #[test]
    fn test_field_kind_matching() {
        assert!(FieldKind::Integer.matches(&json!(11)));
        assert!(!FieldKind::Integer.matches(&json!(1.5)));
        assert!(FieldKind::Float.matches(&json!(1)));
        assert!(FieldKind::StringList.matches(&json!(["a", "b"])));
        assert!(!FieldKind::StringList.matches(&json!(["a", 1])));
        assert!(!FieldKind::String.matches(&Value::Null));
    }

    #[test]
    fn test_every_default_literal_parses() {
        for spec in Genome::FIELDS
            .iter()
            .chain(Feature::FIELDS)
            .chain(FbaModel::FIELDS)
            .chain(ModelReaction::FIELDS)
        {
            let value = spec.default_value().unwrap();
            if spec.default.is_some() {
                assert!(spec.kind.matches(&value), "default for `{}` has wrong kind", spec.name);
            }
        }
    }
}
