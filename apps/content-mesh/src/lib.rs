//! # content-mesh (library half)
//!
//! The CLI, its configuration and the export snapshot are exposed as a
//! library so integration tests can drive them without spawning a process.

pub mod cli;
pub mod config;
pub mod error;
pub mod snapshot;

pub use config::{AppConfig, ConfigOverrides, OutputConfig};
pub use error::CliError;
pub use snapshot::{CollectionSnapshot, MeshSnapshot, NodeSnapshot};
