//! # Content Collections
//!
//! A `Collection` wraps one schema plus an index of its nodes keyed by
//! primary key. The index is built once from the raw records and is never
//! structurally mutated; only the nodes it owns receive relation edges.

use crate::config::MeshConfig;
use crate::primitives::FILE_FIELD_TYPE;
use crate::{CollectionSchema, FieldSchema, MeshError, Node, PrimaryKey};
use serde_json::Value;
use std::collections::BTreeMap;

/// A named set of records sharing one schema.
#[derive(Debug, Clone)]
pub struct Collection {
    schema: CollectionSchema,
    primary_key_field: String,
    nodes: BTreeMap<PrimaryKey, Node>,
    shadowed: Vec<PrimaryKey>,
    is_internal: bool,
    is_file_collection: bool,
    is_junction: bool,
}

impl Collection {
    /// Build a collection and all of its nodes.
    ///
    /// # Errors
    ///
    /// - `MissingPrimaryKeyField` if no field is flagged primary.
    /// - `InvalidRecord` if a record is not a JSON object.
    /// - `MissingPrimaryKeyValue` if a record lacks a usable key.
    ///
    /// A key that appears twice keeps the later record; the key is listed in
    /// `shadowed_keys`.
    pub fn new(
        schema: CollectionSchema,
        records: Vec<Value>,
        config: &MeshConfig,
    ) -> Result<Self, MeshError> {
        let primary_key_field = Self::resolve_primary_key_field(&schema)?;
        let name = schema.collection.clone();

        let mut nodes = BTreeMap::new();
        let mut shadowed = Vec::new();

        for (index, record) in records.into_iter().enumerate() {
            let Value::Object(contents) = record else {
                return Err(MeshError::InvalidRecord {
                    collection: name,
                    index,
                });
            };

            let key = contents
                .get(&primary_key_field)
                .and_then(PrimaryKey::from_value)
                .ok_or_else(|| MeshError::MissingPrimaryKeyValue {
                    collection: name.clone(),
                    field: primary_key_field.clone(),
                    index,
                })?;

            let node = Node::new(name.clone(), key.clone(), contents);
            if nodes.insert(key.clone(), node).is_some() {
                shadowed.push(key);
            }
        }

        Ok(Self {
            is_internal: config.is_system_name(&name),
            is_file_collection: config.is_file_collection(&name),
            schema,
            primary_key_field,
            nodes,
            shadowed,
            is_junction: false,
        })
    }

    /// First field flagged primary, in declaration order.
    fn resolve_primary_key_field(schema: &CollectionSchema) -> Result<String, MeshError> {
        schema
            .fields
            .iter()
            .find(|f| f.primary_key)
            .map(|f| f.field.clone())
            .ok_or_else(|| MeshError::MissingPrimaryKeyField(schema.collection.clone()))
    }

    // -------------------------------------------------------------------------
    // Classification
    // -------------------------------------------------------------------------

    /// Collection name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.schema.collection
    }

    /// The underlying schema.
    #[must_use]
    pub fn schema(&self) -> &CollectionSchema {
        &self.schema
    }

    /// Field definitions in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldSchema] {
        &self.schema.fields
    }

    /// Fields typed as single file attachments.
    pub fn file_fields(&self) -> impl Iterator<Item = &FieldSchema> {
        self.schema
            .fields
            .iter()
            .filter(|f| f.is_type(FILE_FIELD_TYPE))
    }

    /// Name of the primary-key field.
    #[must_use]
    pub fn primary_key_field(&self) -> &str {
        &self.primary_key_field
    }

    /// Whether the name carries the reserved system prefix.
    #[must_use]
    pub fn is_internal(&self) -> bool {
        self.is_internal
    }

    /// Whether this is the designated file collection.
    #[must_use]
    pub fn is_file_collection(&self) -> bool {
        self.is_file_collection
    }

    /// Whether a many-to-many relation links through this collection.
    #[must_use]
    pub fn is_junction(&self) -> bool {
        self.is_junction
    }

    pub(crate) fn mark_junction(&mut self) {
        self.is_junction = true;
    }

    /// Whether relation edges may be written onto this collection's nodes.
    ///
    /// Only the system file collection refuses; it is only ever a target.
    #[must_use]
    pub fn accepts_relations(&self) -> bool {
        !(self.is_internal && self.is_file_collection)
    }

    // -------------------------------------------------------------------------
    // Node access
    // -------------------------------------------------------------------------

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the collection holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in primary-key order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub(crate) fn node_mut(&mut self, key: &PrimaryKey) -> Option<&mut Node> {
        self.nodes.get_mut(key)
    }

    /// Keys that occurred more than once in the input.
    #[must_use]
    pub fn shadowed_keys(&self) -> &[PrimaryKey] {
        &self.shadowed
    }

    /// Look up a node by primary key.
    #[must_use]
    pub fn get_by_primary_key(&self, key: &PrimaryKey) -> Option<&Node> {
        self.nodes.get(key)
    }

    /// Look up a node by a raw key value (`1`, `"1"`, `"uuid"`).
    #[must_use]
    pub fn get_by_key_value(&self, value: &Value) -> Option<&Node> {
        PrimaryKey::from_value(value).and_then(|key| self.nodes.get(&key))
    }

    /// Resolve an embedded (possibly partial) record back to the canonical node.
    ///
    /// Reads this collection's primary-key field out of `record`. Anything
    /// that is not an object, lacks the field, or names no known node
    /// resolves to `None`.
    #[must_use]
    pub fn get_by_record(&self, record: &Value) -> Option<&Node> {
        record
            .as_object()
            .and_then(|obj| obj.get(&self.primary_key_field))
            .and_then(|value| self.get_by_key_value(value))
    }
}

// =============================================================================
// TESTS
// =============================================================================
