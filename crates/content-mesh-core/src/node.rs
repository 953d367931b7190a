//! # Content Nodes
//!
//! A `Node` wraps one raw record plus the relation edges resolved for it.
//!
//! Edges never own their targets. A `NodeRef` is a `(collection, key)`
//! handle into the mesh; the target node stays owned by its collection and
//! is looked up through `Mesh::resolve`.

use crate::PrimaryKey;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

// =============================================================================
// NODE REFERENCE
// =============================================================================

/// Non-owning handle to a node: its collection name and primary key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeRef {
    /// Name of the owning collection.
    pub collection: String,
    /// Primary key within that collection.
    pub key: PrimaryKey,
}

impl NodeRef {
    /// Create a new handle.
    #[must_use]
    pub fn new(collection: impl Into<String>, key: impl Into<PrimaryKey>) -> Self {
        Self {
            collection: collection.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.collection, self.key)
    }
}

// =============================================================================
// NODE RELATION
// =============================================================================

/// The resolved target of a relation edge.
///
/// Multiplicity depends on the relation kind and on which side was resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Related {
    /// A single node (many-to-one, file attachment).
    One(NodeRef),
    /// An ordered sequence of nodes, possibly empty.
    Many(Vec<NodeRef>),
}

impl Related {
    /// All targets as a slice, regardless of multiplicity.
    #[must_use]
    pub fn targets(&self) -> &[NodeRef] {
        match self {
            Self::One(target) => std::slice::from_ref(target),
            Self::Many(targets) => targets,
        }
    }

    /// The single target, if this is a to-one edge.
    #[must_use]
    pub fn as_one(&self) -> Option<&NodeRef> {
        match self {
            Self::One(target) => Some(target),
            Self::Many(_) => None,
        }
    }

    /// The target sequence, if this is a to-many edge.
    #[must_use]
    pub fn as_many(&self) -> Option<&[NodeRef]> {
        match self {
            Self::One(_) => None,
            Self::Many(targets) => Some(targets),
        }
    }

    /// Number of targets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.targets().len()
    }

    /// Check if there are no targets (only possible for `Many`).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets().is_empty()
    }
}

/// A relation edge attached to a node under one field name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRelation {
    /// Field name this edge occupies on its node.
    pub field: String,
    /// The resolved target(s).
    pub related: Related,
}

impl NodeRelation {
    /// Create a new edge.
    #[must_use]
    pub fn new(field: impl Into<String>, related: Related) -> Self {
        Self {
            field: field.into(),
            related,
        }
    }
}

// =============================================================================
// NODE
// =============================================================================

/// One record of a collection together with its resolved relations.
///
/// The primary key is derived from the record when the owning collection
/// builds the node and never changes afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    key: PrimaryKey,
    collection: String,
    contents: Map<String, Value>,
    relations: BTreeMap<String, NodeRelation>,
}

impl Node {
    pub(crate) fn new(collection: String, key: PrimaryKey, contents: Map<String, Value>) -> Self {
        Self {
            key,
            collection,
            contents,
            relations: BTreeMap::new(),
        }
    }

    /// The node's primary key.
    #[must_use]
    pub fn primary_key(&self) -> &PrimaryKey {
        &self.key
    }

    /// The raw record, exactly as supplied.
    #[must_use]
    pub fn contents(&self) -> &Map<String, Value> {
        &self.contents
    }

    /// Read one raw field of the record.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.contents.get(name)
    }

    /// Name of the owning collection.
    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Handle to this node.
    #[must_use]
    pub fn to_ref(&self) -> NodeRef {
        NodeRef::new(self.collection.clone(), self.key.clone())
    }

    /// Attach an edge, replacing any edge already stored under its field.
    pub fn add_relation(&mut self, relation: NodeRelation) {
        self.relations.insert(relation.field.clone(), relation);
    }

    /// All edges keyed by field name.
    #[must_use]
    pub fn relations(&self) -> &BTreeMap<String, NodeRelation> {
        &self.relations
    }

    /// The edge stored under `field`.
    #[must_use]
    pub fn relation(&self, field: &str) -> Option<&NodeRelation> {
        self.relations.get(field)
    }
}

// =============================================================================
// TESTS
// =============================================================================
