//! # content-mesh CLI Module
//!
//! This module implements the CLI interface for content-mesh.
//!
//! ## Available Commands
//!
//! - `summary` - Show counts, collections and diagnostics (default)
//! - `collections` - List collections with their classification
//! - `node` - Show one node and its resolved relations
//! - `export` - Write a JSON snapshot of the resolved graph
//! - `check` - Fail when the build produced warnings or errors

mod commands;

use crate::{AppConfig, CliError, ConfigOverrides};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// content-mesh - headless-CMS content graph
///
/// Builds a deduplicated, cross-referenced node graph from a CMS export and
/// reports on it.
#[derive(Parser, Debug)]
#[command(name = "content-mesh")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the CMS export (JSON)
    #[arg(short, long, global = true)]
    pub input: Option<PathBuf>,

    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Name prefix marking system collections
    #[arg(long, global = true)]
    pub system_prefix: Option<String>,

    /// Name of the file collection
    #[arg(long, global = true)]
    pub file_collection: Option<String>,

    /// Keep junction collections in output
    #[arg(long, global = true)]
    pub include_junctions: bool,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show mesh summary
    Summary,

    /// List collections and their classification
    Collections,

    /// Show one node and its relations
    Node {
        /// Collection name
        #[arg(short = 'C', long)]
        collection: String,

        /// Primary key value
        #[arg(short, long)]
        key: String,
    },

    /// Export the resolved graph as JSON
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Fail on any warning or error diagnostic
    Check,
}

impl Cli {
    /// Config file values with command-line overrides applied.
    pub fn resolve_config(&self) -> Result<AppConfig, CliError> {
        let base = match &self.config {
            Some(path) => load_config(path)?,
            None => AppConfig::default(),
        };

        Ok(base.with_overrides(ConfigOverrides {
            system_prefix: self.system_prefix.clone(),
            file_collection: self.file_collection.clone(),
            include_junctions: self.include_junctions,
        }))
    }
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), CliError> {
    let config = cli.resolve_config()?;
    let input = cli.input.as_deref().ok_or(CliError::MissingInput)?;
    let json_mode = cli.json_mode;

    let mesh = load_mesh(input, &config.mesh)?;
    log_build_report(&mesh);

    match cli.command {
        Some(Commands::Summary) | None => cmd_summary(&mesh, json_mode, cli.verbose),
        Some(Commands::Collections) => cmd_collections(&mesh, json_mode),
        Some(Commands::Node { collection, key }) => cmd_node(&mesh, json_mode, &collection, &key),
        Some(Commands::Export { output }) => {
            cmd_export(&mesh, &output, config.output.include_junctions)
        }
        Some(Commands::Check) => cmd_check(&mesh, json_mode),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from([
            "content-mesh",
            "node",
            "--collection",
            "posts",
            "--key",
            "1",
            "-i",
            "export.json",
            "--json-mode",
        ])
        .expect("parse");

        assert_eq!(cli.input, Some(PathBuf::from("export.json")));
        assert!(cli.json_mode);
        assert!(matches!(
            cli.command,
            Some(Commands::Node { ref collection, ref key }) if collection == "posts" && key == "1"
        ));
    }

    #[test]
    fn flags_override_defaults_without_config_file() {
        let cli = Cli::try_parse_from([
            "content-mesh",
            "--file-collection",
            "uploads",
            "--include-junctions",
        ])
        .expect("parse");

        let config = cli.resolve_config().expect("config");
        assert_eq!(config.mesh.file_collection, "uploads");
        assert_eq!(config.mesh.system_prefix, "directus");
        assert!(config.output.include_junctions);
        assert!(cli.command.is_none());
    }

    #[test]
    fn missing_input_is_reported() {
        let cli = Cli::try_parse_from(["content-mesh", "summary"]).expect("parse");
        assert!(matches!(execute(cli), Err(CliError::MissingInput)));
    }
}
