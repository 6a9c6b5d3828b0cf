//! Error types for graph decoding and snapshot persistence

use std::path::PathBuf;
use thiserror::Error;

/// Malformed input handed to [`Graph::from_dict`](crate::Graph::from_dict).
///
/// `field` locates the offending value, e.g. `nodes[3].type`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("missing field `{field}`")]
    MissingField { field: String },

    #[error("invalid field `{field}`: expected {expected}")]
    InvalidField { field: String, expected: &'static str },

    #[error("unknown type tag `{value}` in field `{field}`")]
    UnknownType { field: String, value: String },
}

impl DecodeError {
    /// Locator of the offending field.
    pub fn field(&self) -> &str {
        match self {
            DecodeError::MissingField { field }
            | DecodeError::InvalidField { field, .. }
            | DecodeError::UnknownType { field, .. } => field,
        }
    }
}

/// Errors reading or writing persisted snapshots.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot decode snapshot {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_display_names_field() {
        let err = DecodeError::UnknownType {
            field: "nodes[2].type".to_string(),
            value: "WIDGET".to_string(),
        };
        assert_eq!(err.to_string(), "unknown type tag `WIDGET` in field `nodes[2].type`");
        assert_eq!(err.field(), "nodes[2].type");
    }

    #[test]
    fn test_decode_error_display_missing() {
        let err = DecodeError::MissingField { field: "relationships".to_string() };
        assert_eq!(err.to_string(), "missing field `relationships`");
    }

    #[test]
    fn test_snapshot_error_display() {
        let err = SnapshotError::Decode {
            path: PathBuf::from("/tmp/graph.jsonld"),
            source: DecodeError::MissingField { field: "nodes".to_string() },
        };
        assert_eq!(
            err.to_string(),
            "cannot decode snapshot /tmp/graph.jsonld: missing field `nodes`"
        );
    }
}
