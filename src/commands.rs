//! CLI command implementations

use anyhow::Context;
use repograph_builder::{BuildConfig, BuildInput, run_build};
use repograph_core::{SnapshotStore, load_graph};
use std::path::{Path, PathBuf};

pub fn build(config_path: &Path, input_path: PathBuf, out: Option<PathBuf>) -> anyhow::Result<()> {
    let mut config = BuildConfig::load(config_path)?;
    if let Some(out) = out {
        config.output_dir = out;
    }

    let text = std::fs::read_to_string(&input_path)
        .with_context(|| format!("cannot read records {}", input_path.display()))?;
    let input: BuildInput = serde_json::from_str(&text)
        .with_context(|| format!("malformed records in {}", input_path.display()))?;

    tracing::info!("Building graph for run {}", input.run_id);
    let outcome = run_build(&input, &config)?;

    println!(
        "{} nodes, {} relationships, {} violation(s)",
        outcome.graph.node_count(),
        outcome.graph.relationship_count(),
        outcome.violations.len()
    );
    println!("graph: {}", outcome.paths.graph.display());
    if let Some(d) = &outcome.diff {
        println!("diff: {} change(s)", d.total());
    }
    Ok(())
}

pub fn validate(graph_path: PathBuf) -> anyhow::Result<()> {
    let graph = load_graph(&graph_path)?;
    let violations = repograph_core::validate(&graph);

    for violation in &violations {
        println!("{}", violation);
    }
    if violations.is_empty() {
        println!("{}: valid", graph_path.display());
        Ok(())
    } else {
        anyhow::bail!("{} violation(s) in {}", violations.len(), graph_path.display())
    }
}

pub fn diff(previous: PathBuf, current: PathBuf) -> anyhow::Result<()> {
    let previous = load_graph(&previous)?;
    let current = load_graph(&current)?;
    print!("{}", repograph_core::diff(&previous, &current).render());
    Ok(())
}

pub fn clear(config_path: &Path) -> anyhow::Result<()> {
    let config = BuildConfig::load(config_path)?;
    tracing::info!("Clearing snapshot cache: {}", config.cache_dir.display());

    SnapshotStore::new(&config.cache_dir).clear()?;

    tracing::info!("Cache cleared");
    Ok(())
}
