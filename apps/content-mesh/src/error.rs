//! # CLI Errors

use content_mesh_core::MeshError;
use thiserror::Error;

/// Everything that can abort a CLI invocation.
#[derive(Debug, Error)]
pub enum CliError {
    /// The mesh could not be built.
    #[error(transparent)]
    Mesh(#[from] MeshError),

    /// Reading or writing a file failed.
    #[error("I/O error: {0}")]
    IoError(String),

    /// The config file is malformed.
    #[error("Config error: {0}")]
    ConfigError(String),

    /// Writing JSON output failed.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// No `--input` was given.
    #[error("No input file given (use --input <export.json>)")]
    MissingInput,

    /// The requested collection does not exist.
    #[error("Collection {0} not found")]
    CollectionNotFound(String),

    /// The requested node does not exist.
    #[error("Node {0} not found")]
    NodeNotFound(String),

    /// `check` found warnings or errors.
    #[error("Check failed: {0} problem(s) found")]
    CheckFailed(usize),
}
