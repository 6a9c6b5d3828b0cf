//! Structural validation of a built graph
//!
//! Checks run in a fixed order and every finding is reported; nothing
//! short-circuits. The graph is never mutated.

use crate::graph::Graph;
use crate::model::{NodeType, RelationshipType};
use petgraph::graphmap::DiGraphMap;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::fmt;

/// A structural problem found in a graph. Non-fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    /// A relationship points at node identifiers that do not exist.
    ReferentialIntegrity { relationship: String, missing: Vec<String> },
    /// A node carries no provenance.
    MissingProvenance { node: String },
    /// A back-edge in the containment/declaration subgraph, detected at `node`.
    Cycle { node: String },
    /// A non-root node that nothing declares or contains.
    Orphan { node: String, node_type: NodeType },
}

impl Violation {
    pub fn kind(&self) -> &'static str {
        match self {
            Violation::ReferentialIntegrity { .. } => "referential_integrity",
            Violation::MissingProvenance { .. } => "missing_provenance",
            Violation::Cycle { .. } => "cycle",
            Violation::Orphan { .. } => "orphan",
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::ReferentialIntegrity { relationship, missing } => write!(
                f,
                "relationship {} references missing node(s): {}",
                relationship,
                missing.join(", ")
            ),
            Violation::MissingProvenance { node } => write!(f, "node {} has no provenance", node),
            Violation::Cycle { node } => {
                write!(f, "containment cycle detected at node {}", node)
            }
            Violation::Orphan { node, node_type } => {
                write!(f, "{} node {} is not declared or contained by any node", node_type, node)
            }
        }
    }
}

/// Run every structural check against `graph`.
pub fn validate(graph: &Graph) -> Vec<Violation> {
    let mut violations = Vec::new();
    check_references(graph, &mut violations);
    check_provenance(graph, &mut violations);
    check_cycles(graph, &mut violations);
    check_orphans(graph, &mut violations);
    violations
}

fn check_references(graph: &Graph, out: &mut Vec<Violation>) {
    for rel in graph.relationships() {
        let mut missing = Vec::new();
        for endpoint in [&rel.source, &rel.target] {
            if !graph.contains_node(endpoint) && !missing.contains(endpoint) {
                missing.push(endpoint.clone());
            }
        }
        if !missing.is_empty() {
            out.push(Violation::ReferentialIntegrity {
                relationship: rel.id.clone(),
                missing,
            });
        }
    }
}

fn check_provenance(graph: &Graph, out: &mut Vec<Violation>) {
    out.extend(
        graph
            .nodes()
            .filter(|n| n.provenance.is_empty())
            .map(|n| Violation::MissingProvenance { node: n.id.clone() }),
    );
}

/// Iterative DFS over CONTAINS/DECLARES edges with an on-path set.
fn check_cycles(graph: &Graph, out: &mut Vec<Violation>) {
    let mut hierarchy: DiGraphMap<&str, RelationshipType> = DiGraphMap::new();
    for rel in graph.relationships().filter(|r| r.rel_type.is_hierarchical()) {
        hierarchy.add_edge(rel.source.as_str(), rel.target.as_str(), rel.rel_type);
    }

    // Every node with an outgoing hierarchy edge is a start point; trees may be disjoint.
    let starts: BTreeSet<&str> = hierarchy
        .nodes()
        .filter(|n| hierarchy.neighbors(*n).next().is_some())
        .collect();

    let mut finished: HashSet<&str> = HashSet::new();
    let mut on_path: HashSet<&str> = HashSet::new();

    for start in starts {
        if finished.contains(start) {
            continue;
        }

        let mut stack: Vec<(&str, Vec<&str>)> = vec![(start, children(&hierarchy, start))];
        on_path.insert(start);

        loop {
            let Some((node, pending)) = stack.last_mut() else {
                break;
            };
            let node = *node;
            match pending.pop() {
                Some(child) if on_path.contains(child) => {
                    out.push(Violation::Cycle { node: child.to_string() });
                }
                Some(child) => {
                    if !finished.contains(child) {
                        on_path.insert(child);
                        stack.push((child, children(&hierarchy, child)));
                    }
                }
                None => {
                    on_path.remove(node);
                    finished.insert(node);
                    stack.pop();
                }
            }
        }
    }
}

/// Children in reverse-sorted order so `pop` visits them ascending.
fn children<'a>(hierarchy: &DiGraphMap<&'a str, RelationshipType>, node: &'a str) -> Vec<&'a str> {
    let mut next: Vec<&str> = hierarchy.neighbors(node).collect();
    next.sort_unstable_by(|a, b| b.cmp(a));
    next
}

fn check_orphans(graph: &Graph, out: &mut Vec<Violation>) {
    let contained: HashSet<&str> = graph
        .relationships()
        .filter(|r| r.rel_type.is_hierarchical())
        .map(|r| r.target.as_str())
        .collect();

    out.extend(
        graph
            .nodes()
            .filter(|n| !n.node_type.is_root_like() && !contained.contains(n.id.as_str()))
            .map(|n| Violation::Orphan {
                node: n.id.clone(),
                node_type: n.node_type,
            }),
    );
}
