//! Snapshot persistence and previous-run discovery

use crate::error::SnapshotError;
use crate::export::to_linked_data_string;
use crate::graph::Graph;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default cache directory: .repograph/
pub const CACHE_DIR: &str = ".repograph";

/// Snapshot index file inside the cache directory
pub const SNAPSHOT_INDEX: &str = "index.json";

/// Pointer to the most recent persisted linked-data document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotIndex {
    pub latest_graph: PathBuf,
    pub run_id: String,
    pub recorded_at: String,
}

/// Tracks which linked-data document the next run should diff against.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    cache_dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        SnapshotStore {
            cache_dir: cache_dir.into(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn index_path(&self) -> PathBuf {
        self.cache_dir.join(SNAPSHOT_INDEX)
    }

    /// Read the snapshot index, if one has been recorded.
    pub fn index(&self) -> Result<Option<SnapshotIndex>, SnapshotError> {
        let path = self.index_path();
        if !path.exists() {
            return Ok(None);
        }
        let text = read(&path)?;
        let index = serde_json::from_str(&text).map_err(|source| SnapshotError::Json { path, source })?;
        Ok(Some(index))
    }

    /// Load the most recent snapshot.
    ///
    /// Returns `Ok(None)` on a first run or when the indexed document has
    /// been removed since.
    pub fn latest(&self) -> Result<Option<Graph>, SnapshotError> {
        let Some(index) = self.index()? else {
            tracing::debug!("No snapshot index at {}", self.index_path().display());
            return Ok(None);
        };
        if !index.latest_graph.exists() {
            tracing::warn!(
                "Snapshot index points at missing file {}",
                index.latest_graph.display()
            );
            return Ok(None);
        }
        let graph = load_graph(&index.latest_graph)?;
        tracing::debug!(
            "Previous snapshot {} loaded from {}",
            index.run_id,
            index.latest_graph.display()
        );
        Ok(Some(graph))
    }

    /// Point the index at a newly written linked-data document.
    pub fn record(&self, run_id: &str, graph_path: &Path) -> Result<(), SnapshotError> {
        ensure_dir(&self.cache_dir)?;
        let index = SnapshotIndex {
            latest_graph: graph_path.to_path_buf(),
            run_id: run_id.to_string(),
            recorded_at: chrono::Utc::now().to_rfc3339(),
        };
        let path = self.index_path();
        let text = serde_json::to_string_pretty(&index).map_err(|source| SnapshotError::Json {
            path: path.clone(),
            source,
        })?;
        write(&path, &text)?;
        tracing::debug!("Snapshot index updated: {}", path.display());
        Ok(())
    }

    /// Remove the cache directory.
    pub fn clear(&self) -> Result<(), SnapshotError> {
        if self.cache_dir.exists() {
            std::fs::remove_dir_all(&self.cache_dir).map_err(|source| SnapshotError::Io {
                path: self.cache_dir.clone(),
                source,
            })?;
        }
        Ok(())
    }
}

/// Decode a linked-data document from disk.
pub fn load_graph(path: &Path) -> Result<Graph, SnapshotError> {
    let text = read(path)?;
    let value: serde_json::Value = serde_json::from_str(&text).map_err(|source| SnapshotError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    Graph::from_dict(&value).map_err(|source| SnapshotError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

/// Write the linked-data document for `graph`, creating parent directories.
pub fn write_linked_data(graph: &Graph, path: &Path) -> Result<(), SnapshotError> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let text = to_linked_data_string(graph).map_err(|source| SnapshotError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    write(path, &text)
}

fn ensure_dir(dir: &Path) -> Result<(), SnapshotError> {
    std::fs::create_dir_all(dir).map_err(|source| SnapshotError::Io {
        path: dir.to_path_buf(),
        source,
    })
}

fn read(path: &Path) -> Result<String, SnapshotError> {
    std::fs::read_to_string(path).map_err(|source| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write(path: &Path, contents: &str) -> Result<(), SnapshotError> {
    std::fs::write(path, contents).map_err(|source| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    })
}
