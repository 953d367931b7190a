//! # Export Snapshot
//!
//! A serializable projection of a resolved mesh. Relations are written as
//! `{collection, key}` references (or arrays of them), so the output stays
//! acyclic even though the graph is not.

use content_mesh_core::{Collection, Diagnostic, Mesh, Node, PrimaryKey, Related};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// The whole resolved graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshSnapshot {
    pub node_count: usize,
    pub edge_count: usize,
    pub collections: Vec<CollectionSnapshot>,
    pub diagnostics: Vec<Diagnostic>,
}

/// One collection with its classification and nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionSnapshot {
    pub name: String,
    pub primary_key_field: String,
    pub internal: bool,
    pub file_collection: bool,
    pub junction: bool,
    pub nodes: Vec<NodeSnapshot>,
}

/// One node: raw contents plus resolved relations by field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub key: PrimaryKey,
    pub contents: Map<String, Value>,
    pub relations: BTreeMap<String, Related>,
}

impl MeshSnapshot {
    /// Project `mesh`; junction collections are skipped unless requested.
    #[must_use]
    pub fn capture(mesh: &Mesh, include_junctions: bool) -> Self {
        Self {
            node_count: mesh.node_count(),
            edge_count: mesh.edge_count(),
            collections: mesh
                .content_collections(include_junctions)
                .map(CollectionSnapshot::from)
                .collect(),
            diagnostics: mesh.diagnostics().to_vec(),
        }
    }
}

impl From<&Collection> for CollectionSnapshot {
    fn from(collection: &Collection) -> Self {
        Self {
            name: collection.name().to_string(),
            primary_key_field: collection.primary_key_field().to_string(),
            internal: collection.is_internal(),
            file_collection: collection.is_file_collection(),
            junction: collection.is_junction(),
            nodes: collection.nodes().map(NodeSnapshot::from).collect(),
        }
    }
}

impl From<&Node> for NodeSnapshot {
    fn from(node: &Node) -> Self {
        Self {
            key: node.primary_key().clone(),
            contents: node.contents().clone(),
            relations: node
                .relations()
                .iter()
                .map(|(field, relation)| (field.clone(), relation.related.clone()))
                .collect(),
        }
    }
}
