//! # Application Configuration
//!
//! Optional TOML file with two tables:
//!
//! ```toml
//! [mesh]
//! system_prefix = "directus"
//! file_collection = "directus_files"
//!
//! [output]
//! include_junctions = false
//! ```
//!
//! Every key is optional. Command-line flags override file values.

use crate::CliError;
use content_mesh_core::MeshConfig;
use serde::{Deserialize, Serialize};

/// Full application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Collection classification settings.
    pub mesh: MeshConfig,
    /// Output projection settings.
    pub output: OutputConfig,
}

/// How resolved collections are projected for output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Keep junction collections in exports.
    pub include_junctions: bool,
}

/// Values given on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub system_prefix: Option<String>,
    pub file_collection: Option<String>,
    pub include_junctions: bool,
}

impl AppConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, CliError> {
        toml::from_str(source).map_err(|e| CliError::ConfigError(e.to_string()))
    }

    /// Apply command-line overrides on top of file values.
    #[must_use]
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(prefix) = overrides.system_prefix {
            self.mesh.system_prefix = prefix;
        }
        if let Some(name) = overrides.file_collection {
            self.mesh.file_collection = name;
        }
        // A bare flag can only switch the option on.
        if overrides.include_junctions {
            self.output.include_junctions = true;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = AppConfig::from_toml_str("").expect("parse");
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.mesh.file_collection, "directus_files");
    }

    #[test]
    fn partial_tables_fill_in_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [mesh]
            file_collection = "uploads"
            "#,
        )
        .expect("parse");

        assert_eq!(config.mesh.system_prefix, "directus");
        assert_eq!(config.mesh.file_collection, "uploads");
        assert!(!config.output.include_junctions);
    }

    #[test]
    fn malformed_document_is_a_config_error() {
        let result = AppConfig::from_toml_str("[mesh\nsystem_prefix = 1");
        assert!(matches!(result, Err(CliError::ConfigError(_))));
    }

    #[test]
    fn overrides_win_over_file_values() {
        let config = AppConfig::from_toml_str(
            r#"
            [mesh]
            system_prefix = "cms"

            [output]
            include_junctions = true
            "#,
        )
        .expect("parse")
        .with_overrides(ConfigOverrides {
            system_prefix: Some("sys".to_string()),
            file_collection: None,
            include_junctions: false,
        });

        assert_eq!(config.mesh.system_prefix, "sys");
        assert_eq!(config.mesh.file_collection, "directus_files");
        assert!(config.output.include_junctions);
    }
}
