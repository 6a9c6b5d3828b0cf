//! Build configuration loaded from `repograph.toml`

use anyhow::{Context, Result};
use repograph_core::CACHE_DIR;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default config file name looked up in the working directory.
pub const CONFIG_FILE: &str = "repograph.toml";

/// Where a build writes its outputs and finds the previous snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Each run writes into `<output_dir>/<run_id>/`.
    pub output_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub graph_file: String,
    pub graphml_file: String,
    pub diff_file: String,
    pub diff_report_file: String,
    pub validation_file: String,
    pub write_graphml: bool,
    /// Fail the run after persisting when the graph has violations.
    pub strict: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            output_dir: PathBuf::from("repograph-out"),
            cache_dir: PathBuf::from(CACHE_DIR),
            graph_file: "graph.jsonld".to_string(),
            graphml_file: "graph.graphml".to_string(),
            diff_file: "diff.json".to_string(),
            diff_report_file: "diff.md".to_string(),
            validation_file: "validation.json".to_string(),
            write_graphml: true,
            strict: false,
        }
    }
}

impl BuildConfig {
    /// Parse a TOML document. Unset keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid repograph configuration")
    }

    /// Load `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Directory holding one run's outputs.
    pub fn run_dir(&self, run_id: &str) -> PathBuf {
        self.output_dir.join(run_id)
    }
}
