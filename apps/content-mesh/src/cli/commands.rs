//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::{AppConfig, CliError, MeshSnapshot};
use content_mesh_core::{
    Collection, Mesh, MeshConfig, MeshInput, NodeRef, PrimaryKey, Related, Severity,
};
use std::path::{Path, PathBuf};

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum size of an input export (256 MB).
///
/// The whole document is held in memory while the mesh is built.
pub const MAX_INPUT_FILE_SIZE: u64 = 256 * 1024 * 1024;

/// Maximum size of a config file (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), CliError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| CliError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(CliError::IoError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Validate an input path.
///
/// Canonicalizes the path (resolving symlinks and "..") and ensures it
/// names an existing regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, CliError> {
    let canonical = path.canonicalize().map_err(|e| {
        CliError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(CliError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Validate an output path: the parent directory must exist.
fn validate_output_path(path: &Path) -> Result<PathBuf, CliError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        CliError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(CliError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| CliError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

// =============================================================================
// LOADING
// =============================================================================

/// Read and parse a TOML config file.
pub fn load_config(path: &Path) -> Result<AppConfig, CliError> {
    let validated_path = validate_file_path(path)?;
    validate_file_size(&validated_path, MAX_CONFIG_FILE_SIZE)?;

    let source = std::fs::read_to_string(&validated_path)
        .map_err(|e| CliError::IoError(format!("Read config: {}", e)))?;

    AppConfig::from_toml_str(&source)
}

/// Read a CMS export and build its mesh.
pub fn load_mesh(path: &Path, config: &MeshConfig) -> Result<Mesh, CliError> {
    let validated_path = validate_file_path(path)?;
    validate_file_size(&validated_path, MAX_INPUT_FILE_SIZE)?;

    let bytes = std::fs::read(&validated_path)
        .map_err(|e| CliError::IoError(format!("Read input: {}", e)))?;

    let input = MeshInput::from_json_slice(&bytes)?;
    let mesh = Mesh::build(input, config)?;

    tracing::info!(
        collections = mesh.collections().count(),
        nodes = mesh.node_count(),
        relations = mesh.relations().len(),
        "Mesh built from {}",
        validated_path.display()
    );

    Ok(mesh)
}

/// Surface build diagnostics and materialized relations through tracing.
pub fn log_build_report(mesh: &Mesh) {
    for diagnostic in mesh.diagnostics() {
        match diagnostic.severity {
            Severity::Notice => tracing::info!("{}", diagnostic.message),
            Severity::Warning => tracing::warn!("{}", diagnostic.message),
            Severity::Error => tracing::error!("{}", diagnostic.message),
        }
    }

    for relation in mesh.relations() {
        tracing::debug!("Relation {}", relation);
    }
}

fn print_json(value: &impl serde::Serialize) -> Result<(), CliError> {
    let output = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::SerializationError(e.to_string()))?;
    println!("{}", output);
    Ok(())
}

fn flags(collection: &Collection) -> String {
    let mut flags = Vec::new();
    if collection.is_internal() {
        flags.push("internal");
    }
    if collection.is_file_collection() {
        flags.push("file");
    }
    if collection.is_junction() {
        flags.push("junction");
    }
    if !collection.accepts_relations() {
        flags.push("read-only");
    }
    if !collection.schema().managed {
        flags.push("unmanaged");
    }
    flags.join(",")
}

fn collection_json(collection: &Collection) -> serde_json::Value {
    serde_json::json!({
        "name": collection.name(),
        "primary_key_field": collection.primary_key_field(),
        "nodes": collection.len(),
        "internal": collection.is_internal(),
        "file_collection": collection.is_file_collection(),
        "junction": collection.is_junction(),
        "accepts_relations": collection.accepts_relations(),
        "managed": collection.schema().managed,
        "fields": collection.fields().len(),
    })
}

// =============================================================================
// SUMMARY COMMAND
// =============================================================================

/// Show mesh summary.
pub fn cmd_summary(mesh: &Mesh, json_mode: bool, verbose: bool) -> Result<(), CliError> {
    if json_mode {
        let output = serde_json::json!({
            "config": mesh.config(),
            "collection_count": mesh.collections().count(),
            "node_count": mesh.node_count(),
            "edge_count": mesh.edge_count(),
            "relation_count": mesh.relations().len(),
            "collections": mesh.collections().map(collection_json).collect::<Vec<_>>(),
            "relations": mesh.relations().iter().map(ToString::to_string).collect::<Vec<_>>(),
            "diagnostics": mesh.diagnostics(),
        });
        return print_json(&output);
    }

    println!("Content Mesh Summary");
    println!("====================");
    println!("Collections: {}", mesh.collections().count());
    println!("Nodes:       {}", mesh.node_count());
    println!("Edges:       {}", mesh.edge_count());
    println!("Relations:   {}", mesh.relations().len());
    println!(
        "Config:      system prefix \"{}\", file collection \"{}\"",
        mesh.config().system_prefix,
        mesh.config().file_collection
    );
    println!();

    for collection in mesh.collections() {
        println!(
            "  {:<32} {:>8} nodes  {}",
            collection.name(),
            collection.len(),
            flags(collection)
        );
    }

    if verbose && !mesh.relations().is_empty() {
        println!();
        println!("Relations:");
        for relation in mesh.relations() {
            println!("  {}", relation);
        }
    }

    if !mesh.diagnostics().is_empty() {
        println!();
        println!("Diagnostics:");
        for diagnostic in mesh.diagnostics() {
            println!("  {}", diagnostic);
        }
    }

    Ok(())
}

// =============================================================================
// COLLECTIONS COMMAND
// =============================================================================

/// List collections with their classification.
pub fn cmd_collections(mesh: &Mesh, json_mode: bool) -> Result<(), CliError> {
    if json_mode {
        let output: Vec<_> = mesh.collections().map(collection_json).collect();
        return print_json(&output);
    }

    for collection in mesh.collections() {
        println!(
            "{} (pk: {}) [{}]",
            collection.name(),
            collection.primary_key_field(),
            flags(collection)
        );
    }

    Ok(())
}

// =============================================================================
// NODE COMMAND
// =============================================================================

/// Show one node, its raw contents and its resolved relations.
pub fn cmd_node(mesh: &Mesh, json_mode: bool, collection: &str, key: &str) -> Result<(), CliError> {
    if mesh.collection(collection).is_none() {
        return Err(CliError::CollectionNotFound(collection.to_string()));
    }

    let target = NodeRef::new(collection, PrimaryKey::from(key));
    let node = mesh
        .resolve(&target)
        .ok_or_else(|| CliError::NodeNotFound(target.to_string()))?;

    if json_mode {
        let relations: serde_json::Map<_, _> = node
            .relations()
            .iter()
            .map(|(field, relation)| {
                let targets: Vec<String> =
                    relation.related.targets().iter().map(ToString::to_string).collect();
                (field.clone(), serde_json::json!(targets))
            })
            .collect();
        let output = serde_json::json!({
            "node": target.to_string(),
            "contents": node.contents(),
            "relations": relations,
        });
        return print_json(&output);
    }

    println!("Node {}", target);
    println!();
    println!("Contents:");
    for (field, value) in node.contents() {
        println!("  {}: {}", field, value);
    }

    println!();
    println!("Relations:");
    if node.relations().is_empty() {
        println!("  (none)");
    }
    for (field, relation) in node.relations() {
        match &relation.related {
            Related::One(target) => println!("  {} -> {}", field, target),
            Related::Many(targets) => {
                let listed: Vec<String> = targets.iter().map(ToString::to_string).collect();
                println!("  {} -> [{}]", field, listed.join(", "));
            }
        }
    }

    Ok(())
}

// =============================================================================
// EXPORT COMMAND
// =============================================================================

/// Write a JSON snapshot of the resolved graph.
pub fn cmd_export(mesh: &Mesh, output: &Path, include_junctions: bool) -> Result<(), CliError> {
    let validated_output = validate_output_path(output)?;

    let snapshot = MeshSnapshot::capture(mesh, include_junctions);
    let data = serde_json::to_vec_pretty(&snapshot)
        .map_err(|e| CliError::SerializationError(e.to_string()))?;

    std::fs::write(&validated_output, &data)
        .map_err(|e| CliError::IoError(format!("Write file: {}", e)))?;

    println!("Exported {} bytes to {:?}", data.len(), validated_output);

    Ok(())
}

// =============================================================================
// CHECK COMMAND
// =============================================================================

/// Fail when any warning or error diagnostic was produced.
pub fn cmd_check(mesh: &Mesh, json_mode: bool) -> Result<(), CliError> {
    let problems = mesh.diagnostics().iter().filter(|d| d.is_problem()).count();

    if json_mode {
        print_json(&serde_json::json!({
            "ok": problems == 0,
            "problems": problems,
            "diagnostics": mesh.diagnostics(),
        }))?;
    } else if problems == 0 {
        println!("OK: {} relation(s) resolved", mesh.relations().len());
    } else {
        for diagnostic in mesh.diagnostics().iter().filter(|d| d.is_problem()) {
            println!("{}", diagnostic);
        }
    }

    if problems > 0 {
        return Err(CliError::CheckFailed(problems));
    }
    Ok(())
}
