//! # Core Type Definitions
//!
//! This module contains the input-side types of the content mesh:
//! - Primary key normalization (`PrimaryKey`)
//! - Schema description (`FieldSchema`, `CollectionSchema`)
//! - Relation metadata (`RelationDeclaration`)
//! - The complete export document (`MeshInput`)
//! - Error types (`MeshError`)
//!
//! ## Determinism Guarantees
//!
//! `PrimaryKey` implements `Ord` so every index in the mesh is a `BTreeMap`
//! and iterates in the same order for the same input.

use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

// =============================================================================
// PRIMARY KEY
// =============================================================================

/// A normalized primary-key value.
///
/// Keys arrive as loosely-typed JSON scalars. Integral numbers and strings
/// holding a canonical integer both become `Int`, so a record keyed `1` and
/// a foreign reference spelled `"1"` address the same node.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrimaryKey {
    /// Integer key (the common auto-increment case).
    Int(i64),
    /// Any other scalar key (UUIDs, slugs, very large or fractional numbers).
    Text(String),
}

impl PrimaryKey {
    /// Normalize a JSON value into a key.
    ///
    /// Returns `None` for `null`, booleans, empty strings, arrays and objects.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => Some(
                n.as_i64()
                    .or_else(|| n.as_f64().and_then(integral_f64))
                    .map(Self::Int)
                    .unwrap_or_else(|| Self::Text(n.to_string())),
            ),
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(Self::from_text(s)),
            Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_) => None,
        }
    }

    fn from_text(s: &str) -> Self {
        match s.parse::<i64>() {
            Ok(n) if n.to_string() == s => Self::Int(n),
            _ => Self::Text(s.to_string()),
        }
    }
}

/// `1.0` and `1e2` are integers written as floats.
#[allow(clippy::float_cmp, clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn integral_f64(f: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, which is already out of range.
    let in_range = f >= i64::MIN as f64 && f < i64::MAX as f64;
    (f.is_finite() && f.trunc() == f && in_range).then(|| f as i64)
}

impl From<i64> for PrimaryKey {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for PrimaryKey {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<String> for PrimaryKey {
    fn from(value: String) -> Self {
        Self::from_text(&value)
    }
}

impl From<&str> for PrimaryKey {
    fn from(value: &str) -> Self {
        Self::from_text(value)
    }
}

impl fmt::Display for PrimaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

// =============================================================================
// SCHEMA
// =============================================================================

/// One field definition of a collection schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    /// Field name, as used as the key in records.
    pub field: String,
    /// Type tag reported by the CMS (`"integer"`, `"file"`, `"o2m"`, ...).
    #[serde(rename = "type", default)]
    pub field_type: Option<String>,
    /// Whether this field is the collection's primary key.
    #[serde(default)]
    pub primary_key: bool,
}

impl FieldSchema {
    /// Create a plain, non-key field.
    #[must_use]
    pub fn new(field: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            field_type: Some(field_type.into()),
            primary_key: false,
        }
    }

    /// Create a primary-key field.
    #[must_use]
    pub fn primary(field: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            primary_key: true,
            ..Self::new(field, field_type)
        }
    }

    /// Check the field's type tag.
    #[must_use]
    pub fn is_type(&self, tag: &str) -> bool {
        self.field_type.as_deref() == Some(tag)
    }
}

/// The schema of a single collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSchema {
    /// Collection name, unique within an export.
    pub collection: String,
    /// Field definitions in declaration order.
    ///
    /// The CMS API returns these as an object keyed by field name; a plain
    /// array is accepted as well.
    #[serde(default, deserialize_with = "fields_from_map_or_seq")]
    pub fields: Vec<FieldSchema>,
    /// Whether the CMS manages this collection.
    #[serde(default)]
    pub managed: bool,
}

impl CollectionSchema {
    /// Create a managed collection schema.
    #[must_use]
    pub fn new(collection: impl Into<String>, fields: Vec<FieldSchema>) -> Self {
        Self {
            collection: collection.into(),
            fields,
            managed: true,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FieldList {
    Seq(Vec<FieldSchema>),
    Map(serde_json::Map<String, Value>),
}

fn fields_from_map_or_seq<'de, D>(deserializer: D) -> Result<Vec<FieldSchema>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<FieldList>::deserialize(deserializer)? {
        None => Ok(Vec::new()),
        Some(FieldList::Seq(fields)) => Ok(fields),
        Some(FieldList::Map(map)) => map
            .into_iter()
            .map(|(name, mut raw)| {
                // Entries keyed by name may omit the name itself.
                if let Value::Object(obj) = &mut raw {
                    obj.entry("field").or_insert(Value::String(name));
                }
                serde_json::from_value(raw).map_err(<D::Error as serde::de::Error>::custom)
            })
            .collect(),
    }
}

// =============================================================================
// RELATION DECLARATION
// =============================================================================

/// Foreign-key metadata as exported by the CMS.
///
/// The presence of `junction_field` is the only signal separating a
/// many-to-many half from a one-to-many/many-to-one declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationDeclaration {
    /// Collection holding the foreign key (or the junction collection).
    pub collection_many: String,
    /// Collection the foreign key points at.
    pub collection_one: String,
    /// Field on the "many" side.
    pub field_many: String,
    /// Alias field on the "one" side, when the CMS exposes one.
    #[serde(default)]
    pub field_one: Option<String>,
    /// Field on the junction row pointing at the opposite endpoint.
    #[serde(default)]
    pub junction_field: Option<String>,
}

impl RelationDeclaration {
    /// Declare a one-to-many/many-to-one relation.
    #[must_use]
    pub fn direct(
        collection_many: impl Into<String>,
        field_many: impl Into<String>,
        collection_one: impl Into<String>,
        field_one: impl Into<String>,
    ) -> Self {
        Self {
            collection_many: collection_many.into(),
            collection_one: collection_one.into(),
            field_many: field_many.into(),
            field_one: Some(field_one.into()),
            junction_field: None,
        }
    }

    /// Declare one half of a many-to-many pair.
    #[must_use]
    pub fn junction(
        junction: impl Into<String>,
        field_many: impl Into<String>,
        collection_one: impl Into<String>,
        field_one: impl Into<String>,
        junction_field: impl Into<String>,
    ) -> Self {
        Self {
            collection_many: junction.into(),
            collection_one: collection_one.into(),
            field_many: field_many.into(),
            field_one: Some(field_one.into()),
            junction_field: Some(junction_field.into()),
        }
    }

    /// The junction field, treating an empty string as absent.
    #[must_use]
    pub fn junction_field(&self) -> Option<&str> {
        self.junction_field.as_deref().filter(|f| !f.is_empty())
    }

    /// The "one"-side alias field, treating an empty string as absent.
    #[must_use]
    pub fn field_one(&self) -> Option<&str> {
        self.field_one.as_deref().filter(|f| !f.is_empty())
    }

    /// Whether this declaration is half of a many-to-many pair.
    #[must_use]
    pub fn is_many_to_many(&self) -> bool {
        self.junction_field().is_some()
    }
}

impl fmt::Display for RelationDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} -> {}.{}",
            self.collection_many,
            self.field_many,
            self.collection_one,
            self.field_one().unwrap_or("-")
        )?;
        if let Some(junction_field) = self.junction_field() {
            write!(f, " via {junction_field}")?;
        }
        Ok(())
    }
}

// =============================================================================
// MESH INPUT
// =============================================================================

/// A complete CMS export: everything needed to build a mesh.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshInput {
    /// Collection schemas in export order.
    pub collections: Vec<CollectionSchema>,
    /// Raw records per collection name. Missing entries mean no records.
    #[serde(default)]
    pub records: BTreeMap<String, Vec<Value>>,
    /// Relation declarations in export order.
    #[serde(default)]
    pub relations: Vec<RelationDeclaration>,
}

impl MeshInput {
    /// Parse an export document from JSON bytes.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, MeshError> {
        serde_json::from_slice(bytes).map_err(|e| MeshError::DeserializationError(e.to_string()))
    }

    /// Add a collection together with its records.
    #[must_use]
    pub fn with_collection(mut self, schema: CollectionSchema, records: Vec<Value>) -> Self {
        self.records.insert(schema.collection.clone(), records);
        self.collections.push(schema);
        self
    }

    /// Add a relation declaration.
    #[must_use]
    pub fn with_relation(mut self, relation: RelationDeclaration) -> Self {
        self.relations.push(relation);
        self
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Fatal errors raised while building a mesh.
///
/// Relation problems are never errors; they surface as diagnostics and
/// the offending relation is skipped.
#[derive(Debug, Error)]
pub enum MeshError {
    /// No field of the collection is flagged as primary key.
    #[error("Unable to resolve primary key field for collection {0}")]
    MissingPrimaryKeyField(String),

    /// A record is not a JSON object.
    #[error("Record {index} of collection {collection} is not an object")]
    InvalidRecord { collection: String, index: usize },

    /// A record has no usable value in its primary-key field.
    #[error("Record {index} of collection {collection} has no usable value for primary key {field}")]
    MissingPrimaryKeyValue {
        collection: String,
        field: String,
        index: usize,
    },

    /// Two schemas share a collection name.
    #[error("Collection {0} is declared more than once")]
    DuplicateCollection(String),

    /// The export document could not be parsed.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn primary_key_normalizes_integers() {
        assert_eq!(PrimaryKey::from_value(&json!(7)), Some(PrimaryKey::Int(7)));
        assert_eq!(PrimaryKey::from_value(&json!("7")), Some(PrimaryKey::Int(7)));
        assert_eq!(
            PrimaryKey::from_value(&json!("007")),
            Some(PrimaryKey::Text("007".to_string()))
        );
    }

    #[test]
    fn primary_key_normalizes_integral_floats() {
        assert_eq!(PrimaryKey::from_value(&json!(1.0)), Some(PrimaryKey::Int(1)));
        assert_eq!(PrimaryKey::from_value(&json!(1e2)), Some(PrimaryKey::Int(100)));
        assert_eq!(PrimaryKey::from_value(&json!(-3.0)), Some(PrimaryKey::Int(-3)));
        assert_eq!(
            PrimaryKey::from_value(&json!(1.5)),
            Some(PrimaryKey::Text("1.5".to_string()))
        );
        assert!(matches!(
            PrimaryKey::from_value(&json!(1e300)),
            Some(PrimaryKey::Text(_))
        ));
    }

    #[test]
    fn primary_key_rejects_non_scalars() {
        assert_eq!(PrimaryKey::from_value(&json!(null)), None);
        assert_eq!(PrimaryKey::from_value(&json!(true)), None);
        assert_eq!(PrimaryKey::from_value(&json!("")), None);
        assert_eq!(PrimaryKey::from_value(&json!({"id": 1})), None);
        assert_eq!(PrimaryKey::from_value(&json!([1])), None);
    }

    #[test]
    fn primary_key_ordering_is_deterministic() {
        let mut keys = vec![
            PrimaryKey::from("b"),
            PrimaryKey::Int(10),
            PrimaryKey::Int(2),
            PrimaryKey::from("a"),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                PrimaryKey::Int(2),
                PrimaryKey::Int(10),
                PrimaryKey::from("a"),
                PrimaryKey::from("b"),
            ]
        );
    }

    #[test]
    fn fields_deserialize_from_object_in_declaration_order() {
        let schema: CollectionSchema = serde_json::from_value(json!({
            "collection": "posts",
            "fields": {
                "id": {"type": "integer", "primary_key": true},
                "title": {"type": "string"},
                "cover": {"field": "cover", "type": "file"}
            }
        }))
        .expect("schema");

        let names: Vec<_> = schema.fields.iter().map(|f| f.field.as_str()).collect();
        assert_eq!(names, vec!["id", "title", "cover"]);
        assert!(schema.fields[0].primary_key);
        assert!(schema.fields[2].is_type("file"));
        assert!(!schema.managed);
    }

    #[test]
    fn fields_deserialize_from_array() {
        let schema: CollectionSchema = serde_json::from_value(json!({
            "collection": "tags",
            "fields": [{"field": "id", "primary_key": true}],
            "managed": true
        }))
        .expect("schema");

        assert_eq!(schema.fields.len(), 1);
        assert_eq!(schema.fields[0].field_type, None);
        assert!(schema.managed);
    }

    #[test]
    fn empty_junction_field_counts_as_absent() {
        let relation: RelationDeclaration = serde_json::from_value(json!({
            "collection_many": "posts",
            "collection_one": "authors",
            "field_many": "author",
            "field_one": "posts",
            "junction_field": ""
        }))
        .expect("relation");

        assert!(!relation.is_many_to_many());
        assert_eq!(relation.field_one(), Some("posts"));
    }

    #[test]
    fn relation_display_names_both_sides() {
        let relation = RelationDeclaration::junction("posts_tags", "post_id", "posts", "tags", "tag_id");
        assert_eq!(relation.to_string(), "posts_tags.post_id -> posts.tags via tag_id");
    }

    #[test]
    fn mesh_input_rejects_malformed_json() {
        let result = MeshInput::from_json_slice(b"{\"collections\": 3}");
        assert!(matches!(result, Err(MeshError::DeserializationError(_))));
    }
}
