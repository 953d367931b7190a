//! # Content Mesh
//!
//! The top-level orchestrator. Building a mesh is a single linear pass:
//!
//! 1. Build every `Collection` (and its nodes) from the schemas and records.
//! 2. Classify the relation declarations into direct and junction
//!    relations, and synthesize one file relation per file-typed field.
//! 3. Mark every junction collection.
//! 4. Resolve each relation and attach the resulting edges to the nodes.
//!
//! All collections must be fully populated before step 2, since resolution
//! looks nodes up by primary key in the opposite collection.

use crate::config::MeshConfig;
use crate::diagnostics::{Diagnostic, DiagnosticKind, Severity};
use crate::{
    Collection, MeshError, MeshInput, Node, NodeRef, NodeRelation, Relation, RelationDeclaration,
};
use std::collections::BTreeMap;

/// A fully cross-referenced content graph.
///
/// Immutable once built; queried by collection name and primary key.
#[derive(Debug, Clone)]
pub struct Mesh {
    config: MeshConfig,
    collections: BTreeMap<String, Collection>,
    relations: Vec<Relation>,
    diagnostics: Vec<Diagnostic>,
}

impl Mesh {
    /// Build a mesh with the default naming conventions.
    ///
    /// # Errors
    ///
    /// Same as [`Mesh::build`].
    pub fn new(input: MeshInput) -> Result<Self, MeshError> {
        Self::build(input, &MeshConfig::default())
    }

    /// Build a mesh.
    ///
    /// # Errors
    ///
    /// Only structural problems abort the build: a collection without a
    /// primary-key field, a record without a usable key, a record that is not
    /// an object, or a collection declared twice. Relation problems are
    /// reported through `diagnostics()` and the relation is skipped.
    pub fn build(input: MeshInput, config: &MeshConfig) -> Result<Self, MeshError> {
        let MeshInput {
            collections,
            mut records,
            relations: declarations,
        } = input;

        let mut mesh = Self {
            config: config.clone(),
            collections: BTreeMap::new(),
            relations: Vec::new(),
            diagnostics: Vec::new(),
        };

        for schema in collections {
            let name = schema.collection.clone();
            if mesh.collections.contains_key(&name) {
                return Err(MeshError::DuplicateCollection(name));
            }
            let collection =
                Collection::new(schema, records.remove(&name).unwrap_or_default(), config)?;
            for key in collection.shadowed_keys() {
                mesh.diagnostics.push(Diagnostic::new(
                    Severity::Warning,
                    DiagnosticKind::DuplicatePrimaryKey {
                        collection: name.clone(),
                        key: key.clone(),
                    },
                ));
            }
            mesh.collections.insert(name, collection);
        }

        let mut relations = mesh.build_direct_relations(&declarations);
        relations.extend(mesh.build_junction_relations(&declarations));
        relations.extend(mesh.build_file_relations());

        mesh.mark_junctions(&relations);

        for relation in &relations {
            let edges = relation.plan(&mesh);
            mesh.attach(edges);
        }
        mesh.relations = relations;

        Ok(mesh)
    }

    // -------------------------------------------------------------------------
    // Classification
    // -------------------------------------------------------------------------

    /// Whether a declaration links two system collections.
    fn is_internal_declaration(&self, declaration: &RelationDeclaration) -> bool {
        self.config.is_system_name(&declaration.collection_many)
            && self.config.is_system_name(&declaration.collection_one)
    }

    /// Names without a collection, each listed once, in first-seen order.
    fn missing_collections<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        let mut missing: Vec<String> = Vec::new();
        for name in names {
            if !self.collections.contains_key(name) && !missing.iter().any(|m| m == name) {
                missing.push(name.to_string());
            }
        }
        missing
    }

    fn build_direct_relations(&mut self, declarations: &[RelationDeclaration]) -> Vec<Relation> {
        let mut relations = Vec::new();

        for declaration in declarations {
            if declaration.is_many_to_many() || self.is_internal_declaration(declaration) {
                continue;
            }

            let missing = self.missing_collections([
                declaration.collection_many.as_str(),
                declaration.collection_one.as_str(),
            ]);
            if missing.is_empty() {
                relations.push(Relation::direct(declaration));
                continue;
            }

            // A missing system collection is expected in partial exports.
            let severity = if self.config.is_system_name(&declaration.collection_many)
                || self.config.is_system_name(&declaration.collection_one)
            {
                Severity::Notice
            } else {
                Severity::Warning
            };
            self.diagnostics.push(Diagnostic::new(
                severity,
                DiagnosticKind::MissingRelationEndpoint {
                    relation: declaration.clone(),
                    missing,
                },
            ));
        }

        relations
    }

    fn build_junction_relations(&mut self, declarations: &[RelationDeclaration]) -> Vec<Relation> {
        let mut buckets: BTreeMap<&str, Vec<&RelationDeclaration>> = BTreeMap::new();
        for declaration in declarations {
            if declaration.is_many_to_many() && !self.is_internal_declaration(declaration) {
                buckets
                    .entry(declaration.collection_many.as_str())
                    .or_default()
                    .push(declaration);
            }
        }

        let mut relations = Vec::new();

        for (junction, pair) in buckets {
            let [first, second, rest @ ..] = pair.as_slice() else {
                self.diagnostics.push(Diagnostic::new(
                    Severity::Warning,
                    DiagnosticKind::IncompleteJunction {
                        junction: junction.to_string(),
                    },
                ));
                continue;
            };

            if !rest.is_empty() {
                self.diagnostics.push(Diagnostic::new(
                    Severity::Warning,
                    DiagnosticKind::SurplusJunctionDeclarations {
                        junction: junction.to_string(),
                        count: pair.len(),
                    },
                ));
            }

            let missing = self.missing_collections([
                first.collection_one.as_str(),
                second.collection_one.as_str(),
                junction,
            ]);
            if !missing.is_empty() {
                self.diagnostics.push(Diagnostic::new(
                    Severity::Warning,
                    DiagnosticKind::MissingJunctionCollections {
                        junction: junction.to_string(),
                        missing,
                    },
                ));
                continue;
            }

            relations.push(Relation::junction(first, second));
        }

        relations
    }

    fn build_file_relations(&mut self) -> Vec<Relation> {
        let owners: Vec<(&str, &str)> = self
            .collections
            .values()
            .filter(|c| !c.is_file_collection())
            .flat_map(|c| c.file_fields().map(move |f| (c.name(), f.field.as_str())))
            .collect();

        if owners.is_empty() {
            return Vec::new();
        }

        let Some(files) = self.collections.get(&self.config.file_collection) else {
            let diagnostic = Diagnostic::new(
                Severity::Error,
                DiagnosticKind::MissingFileCollection {
                    name: self.config.file_collection.clone(),
                    fields: owners.len(),
                },
            );
            self.diagnostics.push(diagnostic);
            return Vec::new();
        };

        owners
            .into_iter()
            .map(|(owner, field)| Relation::file(files, owner, field))
            .collect()
    }

    /// Flag every collection a junction relation links through.
    fn mark_junctions(&mut self, relations: &[Relation]) {
        for junction in relations.iter().filter_map(Relation::junction_collection) {
            if let Some(collection) = self.collections.get_mut(junction) {
                collection.mark_junction();
            }
        }
    }

    fn attach(&mut self, edges: Vec<(NodeRef, NodeRelation)>) {
        for (target, relation) in edges {
            if let Some(node) = self
                .collections
                .get_mut(&target.collection)
                .and_then(|c| c.node_mut(&target.key))
            {
                node.add_relation(relation);
            }
        }
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// The configuration this mesh was built with.
    #[must_use]
    pub fn config(&self) -> &MeshConfig {
        &self.config
    }

    /// Look up a collection by name.
    #[must_use]
    pub fn collection(&self, name: &str) -> Option<&Collection> {
        self.collections.get(name)
    }

    /// All collections in name order.
    pub fn collections(&self) -> impl Iterator<Item = &Collection> {
        self.collections.values()
    }

    /// Collections meant for output: junction collections are hidden unless
    /// `include_junctions` is set.
    pub fn content_collections(&self, include_junctions: bool) -> impl Iterator<Item = &Collection> {
        self.collections
            .values()
            .filter(move |c| include_junctions || !c.is_junction())
    }

    /// The owning collection of a node.
    #[must_use]
    pub fn collection_of(&self, node: &Node) -> Option<&Collection> {
        self.collection(node.collection())
    }

    /// Follow a handle to its node.
    #[must_use]
    pub fn resolve(&self, target: &NodeRef) -> Option<&Node> {
        self.collection(&target.collection)?
            .get_by_primary_key(&target.key)
    }

    /// The nodes `node` relates to under `field`, in edge order.
    #[must_use]
    pub fn related(&self, node: &Node, field: &str) -> Vec<&Node> {
        node.relation(field)
            .map(|relation| {
                relation
                    .related
                    .targets()
                    .iter()
                    .filter_map(|target| self.resolve(target))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The relations that were materialized, in application order.
    #[must_use]
    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    /// Problems found while building, in discovery order.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Total number of nodes across all collections.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.collections.values().map(Collection::len).sum()
    }

    /// Total number of resolved targets across all node relations.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.collections
            .values()
            .flat_map(Collection::nodes)
            .flat_map(|node| node.relations().values())
            .map(|relation| relation.related.len())
            .sum()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CollectionSchema, FieldSchema, PrimaryKey, RelationKind};
    use serde_json::json;

    fn keyed(name: &str) -> CollectionSchema {
        CollectionSchema::new(name, vec![FieldSchema::primary("id", "integer")])
    }

    #[test]
    fn empty_input_builds_empty_mesh() {
        let mesh = Mesh::new(MeshInput::default()).expect("mesh");
        assert_eq!(mesh.collections().count(), 0);
        assert_eq!(mesh.node_count(), 0);
        assert_eq!(mesh.edge_count(), 0);
        assert!(mesh.diagnostics().is_empty());
    }

    #[test]
    fn duplicate_collection_is_fatal() {
        let input = MeshInput::default()
            .with_collection(keyed("posts"), Vec::new())
            .with_collection(keyed("posts"), Vec::new());

        let result = Mesh::new(input);
        assert!(matches!(result, Err(MeshError::DuplicateCollection(name)) if name == "posts"));
    }

    #[test]
    fn missing_primary_key_aborts_build() {
        let input = MeshInput::default().with_collection(
            CollectionSchema::new("posts", vec![FieldSchema::new("title", "string")]),
            Vec::new(),
        );
        assert!(matches!(
            Mesh::new(input),
            Err(MeshError::MissingPrimaryKeyField(_))
        ));
    }

    #[test]
    fn collections_without_records_are_empty() {
        let mut input = MeshInput::default().with_collection(keyed("posts"), Vec::new());
        input.records.clear();

        let mesh = Mesh::new(input).expect("mesh");
        assert!(mesh.collection("posts").is_some_and(Collection::is_empty));
    }

    #[test]
    fn internal_to_internal_relations_are_discarded_silently() {
        let input = MeshInput::default()
            .with_collection(keyed("directus_users"), vec![json!({"id": 1})])
            .with_collection(keyed("directus_roles"), vec![json!({"id": 1})])
            .with_relation(RelationDeclaration::direct(
                "directus_users",
                "role",
                "directus_roles",
                "users",
            ));

        let mesh = Mesh::new(input).expect("mesh");
        assert!(mesh.relations().is_empty());
        assert!(mesh.diagnostics().is_empty());
    }

    #[test]
    fn missing_user_collection_is_a_warning() {
        let input = MeshInput::default()
            .with_collection(keyed("posts"), Vec::new())
            .with_relation(RelationDeclaration::direct(
                "posts", "category", "categories", "posts",
            ));

        let mesh = Mesh::new(input).expect("mesh");
        assert!(mesh.relations().is_empty());
        assert_eq!(mesh.diagnostics().len(), 1);
        assert_eq!(mesh.diagnostics()[0].severity, Severity::Warning);
        assert!(matches!(
            &mesh.diagnostics()[0].kind,
            DiagnosticKind::MissingRelationEndpoint { missing, .. } if missing == &["categories".to_string()]
        ));
    }

    #[test]
    fn missing_system_collection_is_a_notice() {
        let input = MeshInput::default()
            .with_collection(keyed("posts"), Vec::new())
            .with_relation(RelationDeclaration::direct(
                "posts",
                "owner",
                "directus_users",
                "posts",
            ));

        let mesh = Mesh::new(input).expect("mesh");
        assert!(mesh.relations().is_empty());
        assert_eq!(mesh.diagnostics().len(), 1);
        assert_eq!(mesh.diagnostics()[0].severity, Severity::Notice);
    }

    #[test]
    fn lone_junction_declaration_is_reported() {
        let input = MeshInput::default()
            .with_collection(keyed("posts"), Vec::new())
            .with_collection(keyed("tags"), Vec::new())
            .with_collection(keyed("posts_tags"), Vec::new())
            .with_relation(RelationDeclaration::junction(
                "posts_tags", "post_id", "posts", "tags", "tag_id",
            ));

        let mesh = Mesh::new(input).expect("mesh");
        assert!(mesh.relations().is_empty());
        assert!(matches!(
            &mesh.diagnostics()[0].kind,
            DiagnosticKind::IncompleteJunction { junction } if junction == "posts_tags"
        ));
        assert!(mesh.collection("posts_tags").is_some_and(|c| !c.is_junction()));
    }

    #[test]
    fn junction_with_missing_linking_collection_is_reported() {
        let input = MeshInput::default()
            .with_collection(keyed("posts"), Vec::new())
            .with_collection(keyed("tags"), Vec::new())
            .with_relation(RelationDeclaration::junction(
                "posts_tags", "post_id", "posts", "tags", "tag_id",
            ))
            .with_relation(RelationDeclaration::junction(
                "posts_tags", "tag_id", "tags", "posts", "post_id",
            ));

        let mesh = Mesh::new(input).expect("mesh");
        assert!(mesh.relations().is_empty());
        assert!(matches!(
            &mesh.diagnostics()[0].kind,
            DiagnosticKind::MissingJunctionCollections { missing, .. } if missing == &["posts_tags".to_string()]
        ));
    }

    #[test]
    fn missing_collections_are_listed_once() {
        let input = MeshInput::default()
            .with_collection(keyed("tags"), Vec::new())
            .with_relation(RelationDeclaration::junction(
                "pj", "post_id", "pj", "tags", "tag_id",
            ))
            .with_relation(RelationDeclaration::junction(
                "pj", "tag_id", "posts", "pj", "post_id",
            ));

        let mesh = Mesh::new(input).expect("mesh");
        assert!(matches!(
            &mesh.diagnostics()[0].kind,
            DiagnosticKind::MissingJunctionCollections { missing, .. }
                if missing == &["pj".to_string(), "posts".to_string()]
        ));
    }

    #[test]
    fn config_is_kept_on_the_mesh() {
        let config = MeshConfig {
            system_prefix: "cms".to_string(),
            file_collection: "cms_assets".to_string(),
        };
        let mesh = Mesh::build(MeshInput::default(), &config).expect("mesh");
        assert_eq!(mesh.config(), &config);
    }

    #[test]
    fn junction_collections_are_marked_and_hidden_from_content() {
        let input = MeshInput::default()
            .with_collection(keyed("posts"), Vec::new())
            .with_collection(keyed("tags"), Vec::new())
            .with_collection(keyed("posts_tags"), Vec::new())
            .with_relation(RelationDeclaration::junction(
                "posts_tags", "post_id", "posts", "tags", "tag_id",
            ))
            .with_relation(RelationDeclaration::junction(
                "posts_tags", "tag_id", "tags", "posts", "post_id",
            ));

        let mesh = Mesh::new(input).expect("mesh");
        assert!(mesh.collection("posts_tags").is_some_and(Collection::is_junction));
        assert!(mesh.collection("posts").is_some_and(|c| !c.is_junction()));

        let visible: Vec<_> = mesh.content_collections(false).map(Collection::name).collect();
        assert_eq!(visible, vec!["posts", "tags"]);
        assert_eq!(mesh.content_collections(true).count(), 3);
    }

    #[test]
    fn surplus_junction_declarations_use_first_pair() {
        let input = MeshInput::default()
            .with_collection(keyed("posts"), Vec::new())
            .with_collection(keyed("tags"), Vec::new())
            .with_collection(keyed("posts_tags"), Vec::new())
            .with_relation(RelationDeclaration::junction(
                "posts_tags", "post_id", "posts", "tags", "tag_id",
            ))
            .with_relation(RelationDeclaration::junction(
                "posts_tags", "tag_id", "tags", "posts", "post_id",
            ))
            .with_relation(RelationDeclaration::junction(
                "posts_tags", "extra_id", "tags", "stale", "post_id",
            ));

        let mesh = Mesh::new(input).expect("mesh");
        assert_eq!(mesh.relations().len(), 1);
        assert!(matches!(
            mesh.relations()[0].kind,
            RelationKind::Junction { .. }
        ));
        assert!(matches!(
            &mesh.diagnostics()[0].kind,
            DiagnosticKind::SurplusJunctionDeclarations { count: 3, .. }
        ));
    }

    #[test]
    fn file_fields_without_file_collection_are_an_error() {
        let input = MeshInput::default().with_collection(
            CollectionSchema::new(
                "posts",
                vec![
                    FieldSchema::primary("id", "integer"),
                    FieldSchema::new("cover", "file"),
                ],
            ),
            vec![json!({"id": 1, "cover": {"id": 5}})],
        );

        let mesh = Mesh::new(input).expect("mesh");
        assert!(mesh.relations().is_empty());
        assert_eq!(mesh.diagnostics()[0].severity, Severity::Error);
        assert!(matches!(
            &mesh.diagnostics()[0].kind,
            DiagnosticKind::MissingFileCollection { fields: 1, .. }
        ));
    }

    #[test]
    fn no_file_fields_means_no_file_diagnostic() {
        let input = MeshInput::default().with_collection(keyed("posts"), vec![json!({"id": 1})]);
        let mesh = Mesh::new(input).expect("mesh");
        assert!(mesh.diagnostics().is_empty());
    }

    #[test]
    fn duplicate_primary_keys_are_reported() {
        let input = MeshInput::default()
            .with_collection(keyed("posts"), vec![json!({"id": 1}), json!({"id": 1})]);

        let mesh = Mesh::new(input).expect("mesh");
        assert_eq!(mesh.node_count(), 1);
        assert!(matches!(
            &mesh.diagnostics()[0].kind,
            DiagnosticKind::DuplicatePrimaryKey { key: PrimaryKey::Int(1), .. }
        ));
    }

    #[test]
    fn collection_of_returns_owner() {
        let input = MeshInput::default().with_collection(keyed("posts"), vec![json!({"id": 1})]);
        let mesh = Mesh::new(input).expect("mesh");

        let node = mesh.resolve(&NodeRef::new("posts", 1)).expect("node");
        assert_eq!(mesh.collection_of(node).map(Collection::name), Some("posts"));
        assert!(mesh.resolve(&NodeRef::new("posts", 2)).is_none());
        assert!(mesh.resolve(&NodeRef::new("missing", 1)).is_none());
    }
}
