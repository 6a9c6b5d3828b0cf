//! Graph diff computation between two run snapshots

use crate::graph::Graph;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::Write as _;

/// Identifier-level changes between a previous and a current snapshot.
///
/// All sets are ordered and serialize as sorted lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphDiff {
    /// Nodes present only in the current snapshot.
    pub added_nodes: BTreeSet<String>,
    /// Nodes present only in the previous snapshot.
    pub removed_nodes: BTreeSet<String>,
    /// Relationships present only in the current snapshot.
    pub added_relationships: BTreeSet<String>,
    /// Relationships present only in the previous snapshot.
    pub removed_relationships: BTreeSet<String>,
    /// Nodes in both snapshots whose attributes or provenance differ.
    pub changed_nodes: BTreeSet<String>,
}

impl GraphDiff {
    /// Create an empty diff.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if this diff is empty (no changes).
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Number of entries across all five categories.
    pub fn total(&self) -> usize {
        self.added_nodes.len()
            + self.removed_nodes.len()
            + self.added_relationships.len()
            + self.removed_relationships.len()
            + self.changed_nodes.len()
    }

    /// Human-readable markdown rendering, one section per category.
    pub fn render(&self) -> String {
        let mut out = String::from("# Graph Diff\n");
        for (title, ids) in [
            ("Added nodes", &self.added_nodes),
            ("Removed nodes", &self.removed_nodes),
            ("Added relationships", &self.added_relationships),
            ("Removed relationships", &self.removed_relationships),
            ("Changed nodes", &self.changed_nodes),
        ] {
            let _ = write!(out, "\n## {}\n", title);
            if ids.is_empty() {
                out.push_str("- None\n");
            }
            for id in ids {
                let _ = writeln!(out, "- {}", id);
            }
        }
        out
    }
}

/// Compute the difference between two graph snapshots.
///
/// Relationship attribute changes are not reported: a relationship's
/// identity already encodes its type and endpoints. Provenance is compared
/// as a sequence.
pub fn diff(previous: &Graph, current: &Graph) -> GraphDiff {
    let mut diff = GraphDiff::new();

    for node in current.nodes() {
        match previous.node(&node.id) {
            None => {
                diff.added_nodes.insert(node.id.clone());
            }
            Some(old) => {
                if old.attributes != node.attributes || old.provenance != node.provenance {
                    diff.changed_nodes.insert(node.id.clone());
                }
            }
        }
    }

    diff.removed_nodes = previous
        .nodes()
        .filter(|n| !current.contains_node(&n.id))
        .map(|n| n.id.clone())
        .collect();

    diff.added_relationships = current
        .relationships()
        .filter(|r| previous.relationship(&r.id).is_none())
        .map(|r| r.id.clone())
        .collect();

    diff.removed_relationships = previous
        .relationships()
        .filter(|r| current.relationship(&r.id).is_none())
        .map(|r| r.id.clone())
        .collect();

    diff
}
