//! # Mesh Configuration
//!
//! Naming conventions that decide how collections are classified.

use crate::primitives::{FILE_COLLECTION, SYSTEM_PREFIX};
use serde::{Deserialize, Serialize};

/// Classification settings for a mesh build.
///
/// Deserializes with defaults so a partial config file is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshConfig {
    /// Collections whose name starts with this prefix are internal.
    pub system_prefix: String,
    /// Name of the designated file collection.
    pub file_collection: String,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            system_prefix: SYSTEM_PREFIX.to_string(),
            file_collection: FILE_COLLECTION.to_string(),
        }
    }
}

impl MeshConfig {
    /// Whether `name` belongs to the CMS's own system collections.
    ///
    /// The comparison ignores ASCII case.
    #[must_use]
    pub fn is_system_name(&self, name: &str) -> bool {
        let prefix = self.system_prefix.as_bytes();
        name.len() >= prefix.len() && name.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix)
    }

    /// Whether `name` is the designated file collection.
    #[must_use]
    pub fn is_file_collection(&self, name: &str) -> bool {
        name == self.file_collection
    }
}
