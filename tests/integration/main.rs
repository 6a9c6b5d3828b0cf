//! Integration tests for Repograph
//!
//! These tests drive full runs through the builder pipeline and read the
//! persisted outputs back through the core crate.

use repograph_builder::*;
use repograph_core::{Graph, NodeType, load_graph, to_linked_data_string, validate};
use std::path::Path;
use tempfile::TempDir;

fn config(root: &Path) -> BuildConfig {
    BuildConfig {
        output_dir: root.join("out"),
        cache_dir: root.join(".repograph"),
        ..Default::default()
    }
}

fn file(path: &str, digest: &str, status: FileStatus) -> FileRecord {
    FileRecord {
        identifier: path.to_string(),
        digest: digest.to_string(),
        size: 64,
        status,
    }
}

fn entity(module: &str, kind: EntityKind, name: &str, file_path: &str, lineno: u32) -> EntityEvent {
    EntityEvent {
        module: module.to_string(),
        node_type: kind,
        name: name.to_string(),
        file_path: file_path.to_string(),
        lineno,
        docstring: None,
        depends_on: Vec::new(),
        is_test: false,
    }
}

/// A repository with a module, its test, a manifest and one asset.
fn repository(run_id: &str) -> BuildInput {
    let mut input = BuildInput::new(run_id);
    input.files = vec![
        file("pkg/client.py", "aa01", FileStatus::Added),
        file("tests/test_client.py", "bb02", FileStatus::Added),
        file("requirements.txt", "cc03", FileStatus::Added),
        file("docs/overview.png", "dd04", FileStatus::Added),
    ];
    input.dependencies = vec![DependencyEntry {
        name: "requests".to_string(),
        version: "2.31.0".to_string(),
        source: "requirements.txt".to_string(),
    }];

    let mut module = entity("pkg.client", EntityKind::Module, "pkg.client", "pkg/client.py", 1);
    module.depends_on = vec!["requests".to_string()];
    let mut fetch = entity("pkg.client", EntityKind::Function, "fetch", "pkg/client.py", 5);
    fetch.depends_on = vec!["requests.sessions".to_string()];
    fetch.docstring = Some("Fetch a <resource> & decode it.".to_string());
    let mut test = entity("tests.test_client", EntityKind::Function, "test_fetch", "tests/test_client.py", 3);
    test.is_test = true;
    let session = entity("pkg.client", EntityKind::Class, "Session", "pkg/client.py", 20);
    input.entities = vec![module, fetch, session, test];

    input.artifacts = vec![ArtifactRecord {
        identifier: "coverage".to_string(),
        path: "out/coverage.xml".to_string(),
        digest: "ee05".to_string(),
        status: "added".to_string(),
    }];
    input.assets = vec![AssetRecord {
        identifier: "docs/overview.png".to_string(),
        path: "docs/overview.png".to_string(),
        asset_type: "image".to_string(),
        summary: "Component overview".to_string(),
        metadata: Default::default(),
    }];
    input.asset_cards = vec![AssetCardRecord {
        identifier: "cards/overview".to_string(),
        asset_identifier: "docs/overview.png".to_string(),
        title: "Overview".to_string(),
        summary: "Client talks to API".to_string(),
        checksum: "ff06".to_string(),
    }];
    input
}

#[test]
fn test_full_run_is_valid_and_persisted() {
    let dir = TempDir::new().unwrap();
    let outcome = run_build(&repository("r1"), &config(dir.path())).unwrap();

    assert!(outcome.violations.is_empty(), "{:?}", outcome.violations);
    assert!(outcome.diff.is_none());

    let reloaded = load_graph(&outcome.paths.graph).unwrap();
    assert_eq!(reloaded, outcome.graph);
    assert!(validate(&reloaded).is_empty());

    for node_type in NodeType::ALL {
        assert!(
            reloaded.nodes_of_type(node_type).next().is_some(),
            "no {} node",
            node_type
        );
    }

    let graphml = std::fs::read_to_string(outcome.paths.graphml.unwrap()).unwrap();
    assert!(graphml.contains("Fetch a &lt;resource&gt; &amp; decode it."));

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(outcome.paths.validation).unwrap()).unwrap();
    assert_eq!(report, serde_json::json!([]));
}

#[test]
fn test_identical_inputs_give_identical_bytes() {
    let a = TempDir::new().unwrap();
    let b = TempDir::new().unwrap();
    let first = run_build(&repository("r1"), &config(a.path())).unwrap();
    let second = run_build(&repository("r1"), &config(b.path())).unwrap();

    let first_bytes = std::fs::read(&first.paths.graph).unwrap();
    let second_bytes = std::fs::read(&second.paths.graph).unwrap();
    assert_eq!(first_bytes, second_bytes);

    let first_xml = std::fs::read(first.paths.graphml.unwrap()).unwrap();
    let second_xml = std::fs::read(second.paths.graphml.unwrap()).unwrap();
    assert_eq!(first_xml, second_xml);
}

#[test]
fn test_incremental_run_produces_diff() {
    let dir = TempDir::new().unwrap();
    let config = config(dir.path());
    run_build(&repository("r1"), &config).unwrap();

    let mut next = repository("r2");
    next.files[0] = file("pkg/client.py", "aa99", FileStatus::Changed);
    next.entities.retain(|e| !e.is_test);
    next.files.retain(|f| f.identifier != "tests/test_client.py");

    let outcome = run_build(&next, &config).unwrap();
    let d = outcome.diff.expect("second run should diff");

    assert!(d.changed_nodes.contains("file:pkg/client.py"));
    assert!(d.removed_nodes.contains("test:tests.test_client.test_fetch"));
    assert!(d.removed_nodes.contains("file:tests/test_client.py"));
    assert!(d.removed_relationships.contains(
        "tests:test:tests.test_client.test_fetch->function:pkg.client.fetch"
    ));
    assert!(d.added_nodes.contains("run:r2"));

    let persisted: repograph_core::GraphDiff =
        serde_json::from_str(&std::fs::read_to_string(outcome.paths.diff.unwrap()).unwrap()).unwrap();
    assert_eq!(persisted, d);

    let report = std::fs::read_to_string(outcome.paths.diff_report.unwrap()).unwrap();
    assert!(report.starts_with("# Graph Diff\n"));
    assert!(report.contains("## Added relationships\n"));
}

#[test]
fn test_malformed_previous_snapshot_is_fatal() {
    let dir = TempDir::new().unwrap();
    let config = config(dir.path());
    let outcome = run_build(&repository("r1"), &config).unwrap();

    std::fs::write(&outcome.paths.graph, r#"{"nodes": "oops", "relationships": []}"#).unwrap();
    let err = run_build(&repository("r2"), &config).unwrap_err();
    assert!(format!("{:#}", err).contains("nodes"));
}

#[test]
fn test_linked_data_reproduces_from_reloaded_graph() {
    let dir = TempDir::new().unwrap();
    let outcome = run_build(&repository("r1"), &config(dir.path())).unwrap();

    let text = std::fs::read_to_string(&outcome.paths.graph).unwrap();
    let reloaded: Graph = load_graph(&outcome.paths.graph).unwrap();
    assert_eq!(to_linked_data_string(&reloaded).unwrap(), text);
}
