//! One end-to-end build: load previous snapshot, build, persist, diff

use crate::builder::{BuiltGraph, build_graph};
use crate::config::BuildConfig;
use crate::records::BuildInput;
use anyhow::{Context, Result, bail};
use repograph_core::{Graph, GraphDiff, SnapshotStore, Violation, diff, to_graphml, write_linked_data};
use std::path::{Component, Path, PathBuf};
use tracing::info;

/// Files written by one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputPaths {
    pub graph: PathBuf,
    pub graphml: Option<PathBuf>,
    pub validation: PathBuf,
    pub diff: Option<PathBuf>,
    pub diff_report: Option<PathBuf>,
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub graph: Graph,
    pub violations: Vec<Violation>,
    /// `None` on a first run.
    pub diff: Option<GraphDiff>,
    pub paths: OutputPaths,
}

/// Build the graph for `input` and persist every output under `config`.
///
/// In strict mode an error is returned after all outputs are written when
/// the Validator reported violations.
pub fn run_build(input: &BuildInput, config: &BuildConfig) -> Result<BuildOutcome> {
    if input.run_id.trim().is_empty() {
        bail!("build input has an empty run_id");
    }
    let mut components = Path::new(&input.run_id).components();
    if !matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) {
        bail!("run_id {:?} is not a single path segment", input.run_id);
    }

    let store = SnapshotStore::new(&config.cache_dir);
    let previous = store
        .latest()
        .context("cannot load the previous snapshot")?;

    let BuiltGraph { graph, violations } = build_graph(input);

    let run_dir = config.run_dir(&input.run_id);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("cannot create output directory {}", run_dir.display()))?;

    let mut paths = OutputPaths {
        graph: run_dir.join(&config.graph_file),
        validation: run_dir.join(&config.validation_file),
        ..Default::default()
    };

    write_linked_data(&graph, &paths.graph)?;
    info!("Linked-data graph written to {}", paths.graph.display());

    if config.write_graphml {
        let path = run_dir.join(&config.graphml_file);
        write_text(&path, &to_graphml(&graph))?;
        info!("GraphML written to {}", path.display());
        paths.graphml = Some(path);
    }

    write_text(&paths.validation, &serde_json::to_string_pretty(&violations)?)?;

    let diff = match previous {
        Some(previous) => {
            let d = diff(&previous, &graph);
            let diff_path = run_dir.join(&config.diff_file);
            let report_path = run_dir.join(&config.diff_report_file);
            write_text(&diff_path, &serde_json::to_string_pretty(&d)?)?;
            write_text(&report_path, &d.render())?;
            info!("Diff against previous snapshot: {} change(s)", d.total());
            paths.diff = Some(diff_path);
            paths.diff_report = Some(report_path);
            Some(d)
        }
        None => {
            info!("No previous snapshot; skipping diff");
            None
        }
    };

    store
        .record(&input.run_id, &paths.graph)
        .context("cannot update the snapshot index")?;

    if config.strict && !violations.is_empty() {
        bail!(
            "graph for run {} has {} violation(s) (strict mode)",
            input.run_id,
            violations.len()
        );
    }

    Ok(BuildOutcome {
        graph,
        violations,
        diff,
        paths,
    })
}

fn write_text(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("cannot write {}", path.display()))
}
