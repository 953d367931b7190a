//! # Build Diagnostics
//!
//! Problems found while classifying relations are returned, never logged.
//! The caller decides how to surface them.

use crate::{PrimaryKey, RelationDeclaration};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How much attention a diagnostic deserves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Expected for partial exports; nothing to fix.
    Notice,
    /// A relation was skipped and probably should not have been.
    Warning,
    /// A whole class of relations could not be built.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Notice => "notice",
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

/// What went wrong.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A direct relation names a collection the mesh does not hold.
    MissingRelationEndpoint {
        relation: RelationDeclaration,
        missing: Vec<String>,
    },
    /// A junction bucket holds a single declaration.
    IncompleteJunction { junction: String },
    /// A junction bucket holds more than a pair; extras were ignored.
    SurplusJunctionDeclarations { junction: String, count: usize },
    /// A junction pair names collections the mesh does not hold.
    MissingJunctionCollections {
        junction: String,
        missing: Vec<String>,
    },
    /// File fields exist but the file collection does not.
    MissingFileCollection { name: String, fields: usize },
    /// The same primary key occurred more than once in a collection.
    DuplicatePrimaryKey { collection: String, key: PrimaryKey },
}

/// One reported problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    #[serde(flatten)]
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    /// Build a diagnostic, deriving the message from its kind.
    #[must_use]
    pub fn new(severity: Severity, kind: DiagnosticKind) -> Self {
        let message = describe(&kind);
        Self {
            severity,
            kind,
            message,
        }
    }

    /// Whether the diagnostic should fail a strict check.
    #[must_use]
    pub fn is_problem(&self) -> bool {
        self.severity >= Severity::Warning
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)
    }
}

fn describe(kind: &DiagnosticKind) -> String {
    match kind {
        DiagnosticKind::MissingRelationEndpoint { relation, missing } => format!(
            "Unable to resolve relation {relation}: missing collection(s) {}",
            missing.join(", ")
        ),
        DiagnosticKind::IncompleteJunction { junction } => {
            format!("Unable to resolve junction {junction}: missing paired declaration")
        }
        DiagnosticKind::SurplusJunctionDeclarations { junction, count } => format!(
            "Junction {junction} has {count} declarations; only the first two are used"
        ),
        DiagnosticKind::MissingJunctionCollections { junction, missing } => format!(
            "Unable to resolve junction {junction}: missing collection(s) {}",
            missing.join(", ")
        ),
        DiagnosticKind::MissingFileCollection { name, fields } => format!(
            "Unable to resolve the file collection {name}; {fields} file field(s) left unresolved"
        ),
        DiagnosticKind::DuplicatePrimaryKey { collection, key } => {
            format!("Collection {collection} holds primary key {key} more than once; the last record wins")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_orders_by_weight() {
        assert!(Severity::Notice < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
    }

    #[test]
    fn only_warnings_and_errors_are_problems() {
        let notice = Diagnostic::new(
            Severity::Notice,
            DiagnosticKind::IncompleteJunction {
                junction: "directus_presets".to_string(),
            },
        );
        let error = Diagnostic::new(
            Severity::Error,
            DiagnosticKind::MissingFileCollection {
                name: "directus_files".to_string(),
                fields: 2,
            },
        );

        assert!(!notice.is_problem());
        assert!(error.is_problem());
        assert_eq!(
            error.to_string(),
            "error: Unable to resolve the file collection directus_files; 2 file field(s) left unresolved"
        );
    }

    #[test]
    fn serializes_with_flattened_kind() {
        let diagnostic = Diagnostic::new(
            Severity::Warning,
            DiagnosticKind::IncompleteJunction {
                junction: "posts_tags".to_string(),
            },
        );
        let json = serde_json::to_value(&diagnostic).expect("serialize");

        assert_eq!(json["severity"], "warning");
        assert_eq!(json["kind"], "incomplete_junction");
        assert_eq!(json["junction"], "posts_tags");
    }
}
