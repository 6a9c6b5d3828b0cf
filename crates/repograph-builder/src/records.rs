//! Normalized records produced by discovery and extraction collaborators

use repograph_core::{AttrValue, Attributes, NodeType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Delta status of a discovered file relative to the previous run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Added,
    Changed,
    Unchanged,
    Removed,
}

impl FileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileStatus::Added => "added",
            FileStatus::Changed => "changed",
            FileStatus::Unchanged => "unchanged",
            FileStatus::Removed => "removed",
        }
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A discovered source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Repository-relative path.
    pub identifier: String,
    pub digest: String,
    pub size: u64,
    pub status: FileStatus,
}

/// Kind of code entity an extraction event declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKind {
    Module,
    Function,
    Class,
    Test,
}

impl EntityKind {
    pub fn node_type(&self) -> NodeType {
        match self {
            EntityKind::Module => NodeType::Module,
            EntityKind::Function => NodeType::Function,
            EntityKind::Class => NodeType::Class,
            EntityKind::Test => NodeType::Test,
        }
    }
}

/// One declaration found by the AST extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityEvent {
    /// Dotted module name owning the entity.
    pub module: String,
    pub node_type: EntityKind,
    pub name: String,
    pub file_path: String,
    pub lineno: u32,
    #[serde(default)]
    pub docstring: Option<String>,
    /// Imported names this entity references.
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default)]
    pub is_test: bool,
}

/// A declared dependency from a manifest file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyEntry {
    pub name: String,
    pub version: String,
    /// Manifest the entry came from, e.g. `requirements.txt`.
    pub source: String,
}

/// Something the run produced (a report, a bundle, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub identifier: String,
    pub path: String,
    pub digest: String,
    pub status: String,
}

/// Extraction result for a non-code asset (image, audio, PDF, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub identifier: String,
    pub path: String,
    pub asset_type: String,
    pub summary: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, AttrValue>,
}

/// A review card describing an extracted asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetCardRecord {
    pub identifier: String,
    pub asset_identifier: String,
    pub title: String,
    pub summary: String,
    pub checksum: String,
}

/// Everything one build consumes, in application order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildInput {
    pub run_id: String,
    #[serde(default)]
    pub metadata: Attributes,
    #[serde(default)]
    pub files: Vec<FileRecord>,
    #[serde(default)]
    pub entities: Vec<EntityEvent>,
    #[serde(default)]
    pub dependencies: Vec<DependencyEntry>,
    #[serde(default)]
    pub artifacts: Vec<ArtifactRecord>,
    #[serde(default)]
    pub assets: Vec<AssetRecord>,
    #[serde(default)]
    pub asset_cards: Vec<AssetCardRecord>,
}

impl BuildInput {
    pub fn new(run_id: impl Into<String>) -> Self {
        BuildInput {
            run_id: run_id.into(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_collections_default_to_empty() {
        let input: BuildInput = serde_json::from_str(r#"{"run_id": "r1"}"#).unwrap();
        assert_eq!(input, BuildInput::new("r1"));
    }

    #[test]
    fn test_entity_event_from_json() {
        let event: EntityEvent = serde_json::from_str(
            r#"{"module": "pkg.mod", "node_type": "FUNCTION", "name": "foo",
                "file_path": "pkg/mod.py", "lineno": 3}"#,
        )
        .unwrap();
        assert_eq!(event.node_type, EntityKind::Function);
        assert!(event.depends_on.is_empty());
        assert!(!event.is_test);
        assert_eq!(event.docstring, None);
    }

    #[test]
    fn test_file_status_tags() {
        let record: FileRecord = serde_json::from_str(
            r#"{"identifier": "a.py", "digest": "d", "size": 1, "status": "unchanged"}"#,
        )
        .unwrap();
        assert_eq!(record.status, FileStatus::Unchanged);
        assert!(serde_json::from_str::<FileStatus>("\"moved\"").is_err());
    }

    #[test]
    fn test_asset_metadata_values() {
        let asset: AssetRecord = serde_json::from_str(
            r#"{"identifier": "docs/x.png", "path": "docs/x.png", "asset_type": "image",
                "summary": "diagram", "metadata": {"width": 640, "ocr": true, "tags": ["a"]}}"#,
        )
        .unwrap();
        assert_eq!(asset.metadata["width"], AttrValue::Int(640));
        assert_eq!(asset.metadata["ocr"], AttrValue::Bool(true));
        assert_eq!(asset.metadata["tags"], AttrValue::List(vec!["a".to_string()]));
    }
}
