//! Graph container keyed by deterministic identifiers

use crate::model::*;
use std::collections::BTreeMap;

/// One run's knowledge graph — identifier-keyed node and relationship sets.
///
/// Both maps are ordered, so every iteration is identifier-sorted.
#[derive(Clone, Default, PartialEq)]
pub struct Graph {
    nodes: BTreeMap<String, Node>,
    relationships: BTreeMap<String, Relationship>,
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("node_count", &self.nodes.len())
            .field("relationship_count", &self.relationships.len())
            .finish()
    }
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node, merging into an existing node with the same identifier.
    ///
    /// Returns the node identifier.
    pub fn add_node(&mut self, node: Node) -> String {
        let id = node.id.clone();
        match self.nodes.get_mut(&id) {
            Some(existing) => existing.merge(node),
            None => {
                self.nodes.insert(id.clone(), node);
            }
        }
        id
    }

    /// Insert a relationship. Re-inserting a known identifier is a no-op.
    ///
    /// Returns `true` when the relationship was new.
    pub fn add_relationship(&mut self, rel: Relationship) -> bool {
        if self.relationships.contains_key(&rel.id) {
            return false;
        }
        self.relationships.insert(rel.id.clone(), rel);
        true
    }

    /// Get a node by identifier.
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Get a relationship by identifier.
    pub fn relationship(&self, id: &str) -> Option<&Relationship> {
        self.relationships.get(id)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.relationships.is_empty()
    }

    /// All nodes, sorted by identifier.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// All relationships, sorted by identifier.
    pub fn relationships(&self) -> impl Iterator<Item = &Relationship> {
        self.relationships.values()
    }

    /// Get all nodes of a specific type.
    pub fn nodes_of_type(&self, node_type: NodeType) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.values().filter(move |n| n.node_type == node_type)
    }

    /// Get all relationships leaving a node.
    pub fn relationships_from<'a>(&'a self, source: &'a str) -> impl Iterator<Item = &'a Relationship> + 'a {
        self.relationships.values().filter(move |r| r.source == source)
    }

    /// Get all relationships entering a node.
    pub fn relationships_to<'a>(&'a self, target: &'a str) -> impl Iterator<Item = &'a Relationship> + 'a {
        self.relationships.values().filter(move |r| r.target == target)
    }

    /// Check if a relationship of `rel_type` exists between two nodes.
    pub fn has_relationship(&self, rel_type: RelationshipType, source: &str, target: &str) -> bool {
        self.relationships
            .contains_key(&relationship_id(rel_type, source, target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relationship_insert_is_idempotent() {
        let mut graph = Graph::new();
        let rel = Relationship::new(RelationshipType::Contains, "run:r1", "file:a.py");

        assert!(graph.add_relationship(rel.clone()));
        assert_eq!(graph.relationship_count(), 1);

        let with_attrs = rel.with_attribute("status", "changed");
        assert!(!graph.add_relationship(with_attrs));
        assert_eq!(graph.relationship_count(), 1);

        // First insert wins
        let stored = graph.relationship("contains:run:r1->file:a.py").unwrap();
        assert!(stored.attributes.is_empty());
    }

    #[test]
    fn test_merge_never_loses_provenance() {
        let mut graph = Graph::new();
        graph.add_node(Node::new(NodeType::Class, "m.X", "X").with_provenance("a"));
        graph.add_node(Node::new(NodeType::Class, "m.X", "X").with_provenance("b"));

        assert_eq!(graph.node_count(), 1);
        let node = graph.node("class:m.x").unwrap();
        assert_eq!(node.provenance, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_iteration_is_sorted_by_identifier() {
        let mut graph = Graph::new();
        for name in ["zeta", "alpha", "mid"] {
            graph.add_node(Node::new(NodeType::Module, name, name).with_provenance("t"));
        }
        let ids: Vec<_> = graph.nodes().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["module:alpha", "module:mid", "module:zeta"]);
    }

    #[test]
    fn test_adjacency_queries() {
        let mut graph = Graph::new();
        graph.add_relationship(Relationship::new(RelationshipType::Declares, "module:m", "function:m.f"));
        graph.add_relationship(Relationship::new(RelationshipType::Declares, "module:m", "class:m.c"));
        graph.add_relationship(Relationship::new(RelationshipType::Contains, "file:m.py", "module:m"));

        assert_eq!(graph.relationships_from("module:m").count(), 2);
        assert_eq!(graph.relationships_to("module:m").count(), 1);
        assert!(graph.has_relationship(RelationshipType::Declares, "module:m", "class:m.c"));
        assert!(!graph.has_relationship(RelationshipType::Contains, "module:m", "class:m.c"));
    }

    #[test]
    fn test_empty_graph() {
        let graph = Graph::new();
        assert!(graph.is_empty());
        assert_eq!(format!("{:?}", graph), "Graph { node_count: 0, relationship_count: 0 }");
    }
}
