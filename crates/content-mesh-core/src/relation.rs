//! # Content Relations
//!
//! Stateless resolution strategies. A `Relation` binds two collections (and,
//! for many-to-many, a junction collection) and computes, for every node on
//! each side, the node(s) it relates to on the other side.
//!
//! ## Kinds
//!
//! | Kind       | Source side            | Destination side          |
//! |------------|------------------------|---------------------------|
//! | `Direct`   | "one" side, to-many    | "many" side, to-one       |
//! | `Junction` | to-many via junction   | to-many via junction      |
//! | `File`     | file collection, never | owning collection, to-one |
//!
//! Resolution reads raw record contents only, never another relation's
//! output, so relations can be applied in any order.

use crate::{Collection, Mesh, Node, NodeRef, NodeRelation, RelationDeclaration, Related};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Which endpoint of a relation is being resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Source,
    Destination,
}

impl Side {
    /// The opposite endpoint.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Source => Self::Destination,
            Self::Destination => Self::Source,
        }
    }
}

/// One endpoint: a collection and the field its nodes are annotated under.
///
/// An endpoint without a field is never annotated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub collection: String,
    pub field: Option<String>,
}

impl Endpoint {
    fn new(collection: &str, field: Option<&str>) -> Self {
        Self {
            collection: collection.to_string(),
            field: field.map(str::to_string),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}",
            self.collection,
            self.field.as_deref().unwrap_or("-")
        )
    }
}

/// The resolution strategy of a relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RelationKind {
    /// One-to-many / many-to-one through an embedded foreign record.
    Direct,
    /// Many-to-many through rows of a linking collection.
    Junction {
        junction: String,
        /// Junction-row field holding the source-side key.
        source_junction_field: String,
        /// Junction-row field holding the destination-side key.
        destination_junction_field: String,
    },
    /// Single file attachment pointing into the file collection.
    File,
}

/// A classified relation, ready to resolve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub kind: RelationKind,
    pub source: Endpoint,
    pub destination: Endpoint,
}

impl Relation {
    /// A direct relation from its declaration.
    ///
    /// The "one" collection is the source, the "many" collection (which holds
    /// the foreign key) is the destination.
    #[must_use]
    pub fn direct(declaration: &RelationDeclaration) -> Self {
        Self {
            kind: RelationKind::Direct,
            source: Endpoint::new(&declaration.collection_one, declaration.field_one()),
            destination: Endpoint::new(
                &declaration.collection_many,
                Some(&declaration.field_many),
            ),
        }
    }

    /// A many-to-many relation from a declaration pair sharing one junction.
    ///
    /// `first.collection_one` becomes the destination, `second.collection_one`
    /// the source. Each declaration's junction field names the row field
    /// pointing at the *other* endpoint, so `first.junction_field` holds the
    /// source key and `second.junction_field` the destination key.
    #[must_use]
    pub fn junction(first: &RelationDeclaration, second: &RelationDeclaration) -> Self {
        Self {
            kind: RelationKind::Junction {
                junction: first.collection_many.clone(),
                source_junction_field: first.junction_field().unwrap_or_default().to_string(),
                destination_junction_field: second
                    .junction_field()
                    .unwrap_or_default()
                    .to_string(),
            },
            source: Endpoint::new(&second.collection_one, second.field_one()),
            destination: Endpoint::new(&first.collection_one, first.field_one()),
        }
    }

    /// A file relation for one file-typed field of `owner`.
    #[must_use]
    pub fn file(file_collection: &Collection, owner: &str, field: &str) -> Self {
        Self {
            kind: RelationKind::File,
            source: Endpoint::new(
                file_collection.name(),
                Some(file_collection.primary_key_field()),
            ),
            destination: Endpoint::new(owner, Some(field)),
        }
    }

    /// The endpoint for `side`.
    #[must_use]
    pub fn endpoint(&self, side: Side) -> &Endpoint {
        match side {
            Side::Source => &self.source,
            Side::Destination => &self.destination,
        }
    }

    /// The linking collection, for many-to-many relations.
    #[must_use]
    pub fn junction_collection(&self) -> Option<&str> {
        match &self.kind {
            RelationKind::Junction { junction, .. } => Some(junction),
            RelationKind::Direct | RelationKind::File => None,
        }
    }

    /// Whether both endpoints are the same collection.
    ///
    /// Self-joins only ever materialize the source direction.
    #[must_use]
    pub fn is_self_join(&self) -> bool {
        self.source.collection == self.destination.collection
    }

    /// Resolve what `node` (living on `side`) relates to.
    ///
    /// Returns `None` when the policy for this side produces nothing, the
    /// endpoint has no field, or the opposite collection is unknown.
    #[must_use]
    pub fn resolve(&self, node: &Node, side: Side, mesh: &Mesh) -> Option<Related> {
        let opposite = mesh.collection(&self.endpoint(side.opposite()).collection)?;
        self.resolve_against(node, side, opposite)
    }

    fn resolve_against(&self, node: &Node, side: Side, opposite: &Collection) -> Option<Related> {
        let field = self.endpoint(side).field.as_deref()?;
        let embedded = node.field(field);

        match (&self.kind, side) {
            (RelationKind::Direct, Side::Source) => Some(Related::Many(
                as_rows(embedded)
                    .filter_map(|record| opposite.get_by_record(record))
                    .map(Node::to_ref)
                    .collect(),
            )),
            (RelationKind::Direct | RelationKind::File, Side::Destination) => embedded
                .and_then(|record| opposite.get_by_record(record))
                .map(|target| Related::One(target.to_ref())),
            (RelationKind::File, Side::Source) => None,
            (
                RelationKind::Junction {
                    source_junction_field,
                    destination_junction_field,
                    ..
                },
                _,
            ) => {
                // Each row carries both keys; read the one for the opposite side.
                let key_field = match side {
                    Side::Source => destination_junction_field,
                    Side::Destination => source_junction_field,
                };
                Some(Related::Many(
                    as_rows(embedded)
                        .filter_map(|row| row.get(key_field.as_str()))
                        .filter_map(|key| lookup_reference(opposite, key))
                        .map(Node::to_ref)
                        .collect(),
                ))
            }
        }
    }

    /// Compute every edge this relation attaches, without mutating anything.
    pub(crate) fn plan(&self, mesh: &Mesh) -> Vec<(NodeRef, NodeRelation)> {
        let mut edges = Vec::new();
        self.plan_side(Side::Source, mesh, &mut edges);
        if !self.is_self_join() {
            self.plan_side(Side::Destination, mesh, &mut edges);
        }
        edges
    }

    fn plan_side(&self, side: Side, mesh: &Mesh, edges: &mut Vec<(NodeRef, NodeRelation)>) {
        let endpoint = self.endpoint(side);
        let Some(field) = endpoint.field.as_deref() else {
            return;
        };
        let (Some(own), Some(opposite)) = (
            mesh.collection(&endpoint.collection),
            mesh.collection(&self.endpoint(side.opposite()).collection),
        ) else {
            return;
        };
        if !own.accepts_relations() {
            return;
        }

        for node in own.nodes() {
            if let Some(related) = self.resolve_against(node, side, opposite) {
                edges.push((node.to_ref(), NodeRelation::new(field, related)));
            }
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            RelationKind::Direct => write!(f, "O2M {} -> {}", self.destination, self.source),
            RelationKind::Junction { junction, .. } => write!(
                f,
                "M2M {} <-> {} via {}",
                self.destination, self.source, junction
            ),
            RelationKind::File => write!(f, "File {} -> {}", self.destination, self.source),
        }
    }
}

/// Iterate the object entries of an embedded array; anything else yields nothing.
fn as_rows(value: Option<&Value>) -> impl Iterator<Item = &Value> {
    value
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter(|row| row.is_object())
}

/// Resolve a junction-row foreign key, which may be a bare key or an
/// embedded record.
fn lookup_reference<'a>(collection: &'a Collection, value: &Value) -> Option<&'a Node> {
    if value.is_object() {
        collection.get_by_record(value)
    } else {
        collection.get_by_key_value(value)
    }
}

// =============================================================================
// TESTS
// =============================================================================
