//! # content-mesh-core
//!
//! The graph-construction engine for content-mesh - THE LOGIC.
//!
//! This crate ingests a flat, schema-described export of a headless-CMS
//! database and materializes it into an in-memory, bidirectionally-linked
//! content graph: one canonical `Node` per record, annotated with resolved
//! references to the nodes it relates to.
//!
//! ## Data Flow
//!
//! ```text
//! MeshInput { collections, records, relations }
//!     │
//!     ├──> Collection::new      (one per schema, indexes its Nodes by key)
//!     │
//!     ├──> classification       (Direct | Junction | File, or skipped)
//!     │
//!     └──> Relation::plan       (resolve embedded records to canonical Nodes)
//!            └─> Node::add_relation
//! ```
//!
//! ## Architectural Constraints
//!
//! - Synchronous, pure, in-memory: no async, no I/O, no logging
//! - Embedded relation payloads are never authoritative; every reference is
//!   looked up in its owning collection and dropped if absent
//! - Relation problems are returned as `Diagnostic`s, never raised

// =============================================================================
// MODULES
// =============================================================================

pub mod collection;
pub mod config;
pub mod diagnostics;
pub mod mesh;
pub mod node;
pub mod primitives;
pub mod relation;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    CollectionSchema, FieldSchema, MeshError, MeshInput, PrimaryKey, RelationDeclaration,
};

// =============================================================================
// RE-EXPORTS: Graph
// =============================================================================

pub use collection::Collection;
pub use config::MeshConfig;
pub use diagnostics::{Diagnostic, DiagnosticKind, Severity};
pub use mesh::Mesh;
pub use node::{Node, NodeRef, NodeRelation, Related};
pub use relation::{Endpoint, Relation, RelationKind, Side};
