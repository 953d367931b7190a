//! # Naming Primitives
//!
//! Hardcoded conventions of the source CMS.
//!
//! These are the defaults; `MeshConfig` can override the system prefix and
//! the file collection name for renamed installations.

/// Prefix reserved for the CMS's own metadata collections.
///
/// Matched case-insensitively against collection names.
pub const SYSTEM_PREFIX: &str = "directus";

/// Name of the collection holding uploaded files.
pub const FILE_COLLECTION: &str = "directus_files";

/// Field type tag marking a single file attachment.
pub const FILE_FIELD_TYPE: &str = "file";
