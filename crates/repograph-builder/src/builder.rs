//! Graph construction from normalized collaborator records

use crate::records::*;
use repograph_core::{
    AttrValue, Graph, Node, NodeType, Relationship, RelationshipType, Violation, hashed_node_id, node_id,
    validate,
};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;
use tracing::{debug, info, warn};

const BUILDER_PROVENANCE: &str = "builder";

/// A constructed graph together with its validation findings.
#[derive(Debug, Clone)]
pub struct BuiltGraph {
    pub graph: Graph,
    pub violations: Vec<Violation>,
}

/// Build, validate and log a graph for one run.
///
/// Violations are logged and returned, never raised.
pub fn build_graph(input: &BuildInput) -> BuiltGraph {
    let graph = GraphBuilder::new(&input.run_id).apply(input).finish();
    let violations = validate(&graph);

    for violation in &violations {
        warn!("Graph violation: {}", violation);
    }
    if violations.is_empty() {
        info!("Graph for run {} is structurally valid", input.run_id);
    } else {
        warn!(
            "Graph for run {} has {} violation(s); persisting anyway",
            input.run_id,
            violations.len()
        );
    }

    BuiltGraph { graph, violations }
}

/// Sole writer of a graph under construction.
///
/// Consuming the builder with [`GraphBuilder::finish`] hands out the graph,
/// after which no further mutation is possible through the builder.
pub struct GraphBuilder {
    graph: Graph,
    run: String,
    files: HashSet<String>,
    /// Normalized package name → DEPENDENCY node id.
    dependencies: BTreeMap<String, String>,
    /// (node id, short name) of every TEST node.
    tests: Vec<(String, String)>,
    /// Lowercased short name → FUNCTION/CLASS node ids.
    testable: BTreeMap<String, BTreeSet<String>>,
}

impl GraphBuilder {
    /// Start a graph anchored on one RUN node.
    pub fn new(run_id: &str) -> Self {
        let mut graph = Graph::new();
        let run = graph.add_node(
            Node::new(NodeType::Run, run_id, format!("run {}", run_id))
                .with_provenance(BUILDER_PROVENANCE)
                .with_attribute("run_id", run_id),
        );
        GraphBuilder {
            graph,
            run,
            files: HashSet::new(),
            dependencies: BTreeMap::new(),
            tests: Vec::new(),
            testable: BTreeMap::new(),
        }
    }

    /// Apply every record collection of `input` in the fixed phase order.
    pub fn apply(mut self, input: &BuildInput) -> Self {
        self.annotate_run(input);
        self.add_files(&input.files);
        self.add_dependencies(&input.dependencies);
        self.add_entities(&input.entities);
        self.link_modules_to_dependencies();
        self.link_tests();
        self.add_artifacts(&input.artifacts);
        self.add_assets(&input.assets);
        self.add_asset_cards(&input.asset_cards);
        self
    }

    pub fn finish(self) -> Graph {
        info!(
            "Built graph: {} nodes, {} relationships",
            self.graph.node_count(),
            self.graph.relationship_count()
        );
        self.graph
    }

    fn annotate_run(&mut self, input: &BuildInput) {
        let mut run = Node::with_id(self.run.clone(), NodeType::Run, format!("run {}", input.run_id));
        run.attributes
            .extend(input.metadata.iter().map(|(k, v)| (k.clone(), v.clone())));
        // Computed counts win over caller metadata
        let run = run
            .with_attribute("file_count", input.files.len())
            .with_attribute("entity_count", input.entities.len())
            .with_attribute("dependency_count", input.dependencies.len())
            .with_attribute("artifact_count", input.artifacts.len());
        self.graph.add_node(run);
    }

    pub fn add_files(&mut self, files: &[FileRecord]) {
        debug!("Adding {} file record(s)", files.len());
        for file in files {
            let id = self.graph.add_node(
                Node::new(NodeType::File, &file.identifier, file.identifier.clone())
                    .with_provenance(format!("discovery:{}", file.identifier))
                    .with_attribute("digest", file.digest.clone())
                    .with_attribute("size", i64::try_from(file.size).unwrap_or(i64::MAX))
                    .with_attribute("status", file.status.as_str()),
            );
            self.link(
                Relationship::new(RelationshipType::Contains, self.run.clone(), id.clone())
                    .with_attribute("status", file.status.as_str()),
            );
            self.files.insert(id);
        }
    }

    /// Register DEPENDENCY nodes, each declared by the CONFIG node of its manifest.
    pub fn add_dependencies(&mut self, entries: &[DependencyEntry]) {
        debug!("Adding {} dependency entr(ies)", entries.len());
        for entry in entries {
            let config = self.add_manifest(&entry.source);
            let key = normalize_package(&entry.name);
            let id = self.graph.add_node(
                Node::new(NodeType::Dependency, &key, entry.name.clone())
                    .with_provenance(format!("manifest:{}", entry.source))
                    .with_attribute("version", entry.version.clone())
                    .with_attribute("source", entry.source.clone()),
            );
            self.link(Relationship::new(RelationshipType::Declares, config, id.clone()));
            self.dependencies.insert(key, id);
        }
    }

    fn add_manifest(&mut self, source: &str) -> String {
        let id = self.graph.add_node(
            Node::new(NodeType::Config, source, source)
                .with_provenance(format!("manifest:{}", source))
                .with_attribute("kind", "manifest"),
        );
        let file = node_id(NodeType::File, source);
        if self.files.contains(&file) {
            self.link(Relationship::new(RelationshipType::Declares, file, id.clone()));
        } else {
            self.link(Relationship::new(RelationshipType::Contains, self.run.clone(), id.clone()));
        }
        id
    }

    pub fn add_entities(&mut self, events: &[EntityEvent]) {
        debug!("Adding {} entity event(s)", events.len());
        for event in events {
            let id = match event.node_type {
                EntityKind::Module => self.add_module(event),
                _ => self.add_declared_entity(event),
            };
            for name in &event.depends_on {
                match self.resolve_dependency(name) {
                    Some(dependency) => {
                        self.link(Relationship::new(RelationshipType::DependsOn, id.clone(), dependency));
                    }
                    None => debug!("No dependency matches `{}` referenced by {}", name, id),
                }
            }
        }
    }

    /// Create or merge the MODULE node for `event.module` and its FILE declaration.
    fn add_module(&mut self, event: &EntityEvent) -> String {
        let mut module = Node::new(NodeType::Module, &event.module, event.module.clone())
            .with_provenance(format!("ast:{}", event.file_path))
            .with_attribute("file_path", event.file_path.clone());
        if event.node_type == EntityKind::Module {
            module = module.with_attribute("lineno", event.lineno);
            if let Some(doc) = &event.docstring {
                module = module.with_attribute("docstring", doc.clone());
            }
            if event.is_test {
                module = module.with_attribute("is_test", true);
            }
        }
        let id = self.graph.add_node(module);
        self.link(Relationship::new(
            RelationshipType::Declares,
            node_id(NodeType::File, &event.file_path),
            id.clone(),
        ));
        id
    }

    fn add_declared_entity(&mut self, event: &EntityEvent) -> String {
        let module = self.add_module(event);
        let node_type = if event.is_test {
            NodeType::Test
        } else {
            event.node_type.node_type()
        };

        let reference = format!("{}.{}", event.module, event.name);
        let mut node = Node::new(node_type, &reference, event.name.clone())
            .with_provenance(format!("ast:{}:{}", event.file_path, event.lineno))
            .with_attribute("module", event.module.clone())
            .with_attribute("file_path", event.file_path.clone())
            .with_attribute("lineno", event.lineno)
            .with_attribute("is_test", event.is_test);
        if let Some(doc) = &event.docstring {
            node = node.with_attribute("docstring", doc.clone());
        }
        let id = self.graph.add_node(node);

        self.link(
            Relationship::new(RelationshipType::Declares, module, id.clone())
                .with_attribute("lineno", event.lineno),
        );

        let short = short_name(&event.name);
        match node_type {
            NodeType::Test => self.tests.push((id.clone(), short.to_string())),
            _ => {
                self.testable
                    .entry(short.to_lowercase())
                    .or_default()
                    .insert(id.clone());
            }
        }
        id
    }

    /// Best effort: a module whose leading dotted segment names a dependency depends on it.
    fn link_modules_to_dependencies(&mut self) {
        let links: Vec<(String, String)> = self
            .graph
            .nodes_of_type(NodeType::Module)
            .filter_map(|module| {
                let root = module.label.split('.').next()?;
                let dependency = self.dependencies.get(&normalize_package(root))?;
                Some((module.id.clone(), dependency.clone()))
            })
            .collect();
        for (module, dependency) in links {
            self.link(Relationship::new(RelationshipType::DependsOn, module, dependency));
        }
    }

    /// Best effort: `test_foo` / `TestFoo` tests every function or class named `foo`.
    fn link_tests(&mut self) {
        let mut links = Vec::new();
        for (test, name) in &self.tests {
            let Some(subject) = tested_name(name) else {
                continue;
            };
            if let Some(targets) = self.testable.get(&subject) {
                links.extend(targets.iter().map(|t| (test.clone(), t.clone())));
            }
        }
        for (test, target) in links {
            self.link(Relationship::new(RelationshipType::Tests, test, target));
        }
    }

    pub fn add_artifacts(&mut self, artifacts: &[ArtifactRecord]) {
        debug!("Adding {} artifact record(s)", artifacts.len());
        for artifact in artifacts {
            let id = self.graph.add_node(
                Node::new(NodeType::Artifact, &artifact.identifier, artifact.identifier.clone())
                    .with_provenance(format!("artifacts:{}", artifact.path))
                    .with_attribute("path", artifact.path.clone())
                    .with_attribute("digest", artifact.digest.clone())
                    .with_attribute("status", artifact.status.clone()),
            );
            self.link(Relationship::new(RelationshipType::Produces, self.run.clone(), id));
        }
    }

    pub fn add_assets(&mut self, assets: &[AssetRecord]) {
        debug!("Adding {} asset record(s)", assets.len());
        for asset in assets {
            let label = Path::new(&asset.path)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| asset.path.clone());

            let mut node = Node::with_id(
                hashed_node_id(NodeType::Asset, &asset.identifier),
                NodeType::Asset,
                label,
            )
            .with_provenance(format!("assets:{}", asset.path));
            node.attributes
                .extend(asset.metadata.iter().map(|(k, v)| (k.clone(), v.clone())));
            node = node
                .with_attribute("path", asset.path.clone())
                .with_attribute("asset_type", asset.asset_type.clone())
                .with_attribute("summary", asset.summary.clone());
            let id = self.graph.add_node(node);

            self.link(Relationship::new(RelationshipType::Produces, self.run.clone(), id.clone()));
            let file = node_id(NodeType::File, &asset.path);
            if self.files.contains(&file) {
                self.link(Relationship::new(RelationshipType::Derives, id, file));
            }
        }
    }

    pub fn add_asset_cards(&mut self, cards: &[AssetCardRecord]) {
        debug!("Adding {} asset card(s)", cards.len());
        for card in cards {
            let asset = hashed_node_id(NodeType::Asset, &card.asset_identifier);
            let id = self.graph.add_node(
                Node::with_id(
                    hashed_node_id(NodeType::AssetCard, &card.identifier),
                    NodeType::AssetCard,
                    card.title.clone(),
                )
                .with_provenance(format!("asset_cards:{}", card.identifier))
                .with_attribute("title", card.title.clone())
                .with_attribute("summary", card.summary.clone())
                .with_attribute("checksum", card.checksum.clone())
                .with_attribute("asset", AttrValue::from(asset.clone())),
            );
            if !self.graph.contains_node(&asset) {
                debug!("Asset card {} describes unknown asset {}", card.identifier, card.asset_identifier);
            }
            self.link(Relationship::new(RelationshipType::Produces, self.run.clone(), id.clone()));
            self.link(Relationship::new(RelationshipType::Describes, id, asset));
        }
    }

    fn resolve_dependency(&self, name: &str) -> Option<String> {
        let leading = name.split('.').next().unwrap_or(name);
        [name, leading]
            .into_iter()
            .find_map(|candidate| self.dependencies.get(&normalize_package(candidate)))
            .cloned()
    }

    fn link(&mut self, rel: Relationship) {
        self.graph.add_relationship(rel);
    }
}

/// Package names compare case-insensitively with `_` and `-` interchangeable.
pub fn normalize_package(name: &str) -> String {
    name.trim().to_lowercase().replace('_', "-")
}

fn short_name(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

/// `test_foo` → `foo`, `TestFoo` → `foo`.
fn tested_name(test: &str) -> Option<String> {
    let lower = test.to_lowercase();
    let subject = lower
        .strip_prefix("test_")
        .or_else(|| lower.strip_prefix("test"))?
        .trim_start_matches('_');
    (!subject.is_empty()).then(|| subject.to_string())
}
