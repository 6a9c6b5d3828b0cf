//! Core data structures for the repository knowledge graph

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};
use sha2::{Digest, Sha256};

/// Width of the hashed reference used for path-keyed nodes.
const HASHED_REFERENCE_LEN: usize = 16;

/// Discriminates what kind of entity a node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeType {
    // ── Run anchor ──────────────────────────────────────────
    Run,

    // ── Source tree ─────────────────────────────────────────
    File,
    Module,
    Function,
    Class,
    Test,
    Config,

    // ── External / produced ─────────────────────────────────
    Dependency,
    Artifact,
    Asset,
    AssetCard,
}

impl NodeType {
    pub const ALL: [NodeType; 11] = [
        NodeType::Run,
        NodeType::File,
        NodeType::Module,
        NodeType::Function,
        NodeType::Class,
        NodeType::Test,
        NodeType::Config,
        NodeType::Dependency,
        NodeType::Artifact,
        NodeType::Asset,
        NodeType::AssetCard,
    ];

    /// Wire tag, e.g. `ASSET_CARD`.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Run => "RUN",
            NodeType::File => "FILE",
            NodeType::Module => "MODULE",
            NodeType::Function => "FUNCTION",
            NodeType::Class => "CLASS",
            NodeType::Test => "TEST",
            NodeType::Config => "CONFIG",
            NodeType::Dependency => "DEPENDENCY",
            NodeType::Artifact => "ARTIFACT",
            NodeType::Asset => "ASSET",
            NodeType::AssetCard => "ASSET_CARD",
        }
    }

    /// Node types that are allowed to have no containing parent.
    pub fn is_root_like(&self) -> bool {
        matches!(
            self,
            NodeType::Run | NodeType::Artifact | NodeType::Asset | NodeType::AssetCard
        )
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// What kind of relationship an edge represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipType {
    // ── Hierarchy (acyclic) ─────────────────────────────────
    Declares,
    Contains,

    // ── Cross references ────────────────────────────────────
    DependsOn,
    Tests,
    Produces,
    References,
    Derives,
    Describes,
}

impl RelationshipType {
    pub const ALL: [RelationshipType; 8] = [
        RelationshipType::Declares,
        RelationshipType::Contains,
        RelationshipType::DependsOn,
        RelationshipType::Tests,
        RelationshipType::Produces,
        RelationshipType::References,
        RelationshipType::Derives,
        RelationshipType::Describes,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipType::Declares => "DECLARES",
            RelationshipType::Contains => "CONTAINS",
            RelationshipType::DependsOn => "DEPENDS_ON",
            RelationshipType::Tests => "TESTS",
            RelationshipType::Produces => "PRODUCES",
            RelationshipType::References => "REFERENCES",
            RelationshipType::Derives => "DERIVES",
            RelationshipType::Describes => "DESCRIBES",
        }
    }

    /// Containment/declaration edges form the hierarchy that must stay acyclic.
    pub fn is_hierarchical(&self) -> bool {
        matches!(self, RelationshipType::Declares | RelationshipType::Contains)
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationshipType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RelationshipType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// A scalar or list attribute value.
///
/// JSON has no NaN or infinity, so a non-finite `Float` serializes as its
/// display string (`NaN`, `inf`, `-inf`) and reloads as a `String`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<String>),
}

impl Serialize for AttrValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AttrValue::Bool(b) => serializer.serialize_bool(*b),
            AttrValue::Int(i) => serializer.serialize_i64(*i),
            AttrValue::Float(x) if x.is_finite() => serializer.serialize_f64(*x),
            AttrValue::Float(x) => serializer.collect_str(x),
            AttrValue::String(s) => serializer.serialize_str(s),
            AttrValue::List(items) => items.serialize(serializer),
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Bool(b) => write!(f, "{}", b),
            AttrValue::Int(i) => write!(f, "{}", i),
            AttrValue::Float(x) => write!(f, "{}", x),
            AttrValue::String(s) => f.write_str(s),
            AttrValue::List(items) => f.write_str(&items.join(",")),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::String(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::String(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Int(value)
    }
}

impl From<u32> for AttrValue {
    fn from(value: u32) -> Self {
        AttrValue::Int(i64::from(value))
    }
}

impl From<usize> for AttrValue {
    fn from(value: usize) -> Self {
        AttrValue::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<f64> for AttrValue {
    /// Non-finite values become strings so the attribute survives a
    /// snapshot round trip and compares equal to itself.
    fn from(value: f64) -> Self {
        if value.is_finite() {
            AttrValue::Float(value)
        } else {
            AttrValue::String(value.to_string())
        }
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

impl From<Vec<String>> for AttrValue {
    fn from(value: Vec<String>) -> Self {
        AttrValue::List(value)
    }
}

/// Open-ended attribute map. Ordered so serialization is stable.
pub type Attributes = BTreeMap<String, AttrValue>;

/// Build a node identifier: `lowercase("{type}:{reference}")`.
pub fn node_id(node_type: NodeType, reference: &str) -> String {
    format!("{}:{}", node_type.as_str(), reference).to_lowercase()
}

/// Build a node identifier from a key that is unsafe to embed directly
/// (arbitrary paths). The key is reduced to a 16-hex-char SHA-256 prefix.
pub fn hashed_node_id(node_type: NodeType, natural_key: &str) -> String {
    node_id(node_type, &short_digest(natural_key))
}

/// Build a relationship identifier: `lowercase("{type}:{source}->{target}")`.
pub fn relationship_id(rel_type: RelationshipType, source: &str, target: &str) -> String {
    format!("{}:{}->{}", rel_type.as_str(), source, target).to_lowercase()
}

fn short_digest(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    format!("{:x}", hasher.finalize())[..HASHED_REFERENCE_LEN].to_string()
}

/// A single node in the knowledge graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub label: String,
    /// Collaborators and source locations that produced this node, in first-seen order.
    pub provenance: Vec<String>,
    pub attributes: Attributes,
}

impl Node {
    /// Create a node whose identifier is derived from `(node_type, reference)`.
    pub fn new(node_type: NodeType, reference: &str, label: impl Into<String>) -> Self {
        Self::with_id(node_id(node_type, reference), node_type, label)
    }

    /// Create a node with a precomputed identifier.
    pub fn with_id(id: String, node_type: NodeType, label: impl Into<String>) -> Self {
        Node {
            id,
            node_type,
            label: label.into(),
            provenance: Vec::new(),
            attributes: Attributes::new(),
        }
    }

    pub fn with_provenance(mut self, source: impl Into<String>) -> Self {
        self.add_provenance(source);
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Append a provenance entry unless it is already recorded.
    pub fn add_provenance(&mut self, source: impl Into<String>) {
        let source = source.into();
        if !self.provenance.contains(&source) {
            self.provenance.push(source);
        }
    }

    /// Fold a later observation of the same node into this one.
    ///
    /// Attributes from `other` overwrite existing keys; provenance is unioned.
    /// Type and label are left as first recorded.
    pub fn merge(&mut self, other: Node) {
        self.attributes.extend(other.attributes);
        for source in other.provenance {
            self.add_provenance(source);
        }
    }
}

/// A directed, typed edge between two node identifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub id: String,
    #[serde(rename = "type")]
    pub rel_type: RelationshipType,
    pub source: String,
    pub target: String,
    pub attributes: Attributes,
}

impl Relationship {
    pub fn new(rel_type: RelationshipType, source: impl Into<String>, target: impl Into<String>) -> Self {
        let source = source.into();
        let target = target.into();
        Relationship {
            id: relationship_id(rel_type, &source, &target),
            rel_type,
            source,
            target,
            attributes: Attributes::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_is_lowercased() {
        assert_eq!(node_id(NodeType::Module, "Pkg.Mod"), "module:pkg.mod");
        assert_eq!(node_id(NodeType::AssetCard, "X"), "asset_card:x");
    }

    #[test]
    fn test_hashed_node_id_is_fixed_width() {
        let id = hashed_node_id(NodeType::Asset, "/very/long/path with spaces/<odd>&.png");
        let (prefix, digest) = id.split_once(':').unwrap();
        assert_eq!(prefix, "asset");
        assert_eq!(digest.len(), 16);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));

        // Deterministic
        assert_eq!(id, hashed_node_id(NodeType::Asset, "/very/long/path with spaces/<odd>&.png"));
        assert_ne!(id, hashed_node_id(NodeType::Asset, "/other.png"));
    }

    #[test]
    fn test_relationship_id_format() {
        let rel = Relationship::new(RelationshipType::DependsOn, "function:a.b", "dependency:Requests");
        assert_eq!(rel.id, "depends_on:function:a.b->dependency:requests");
    }

    #[test]
    fn test_type_tags_round_trip() {
        for t in NodeType::ALL {
            assert_eq!(t.as_str().parse::<NodeType>(), Ok(t));
        }
        for t in RelationshipType::ALL {
            assert_eq!(t.as_str().parse::<RelationshipType>(), Ok(t));
        }
        assert!("WIDGET".parse::<NodeType>().is_err());
    }

    #[test]
    fn test_type_tags_match_serde() {
        let json = serde_json::to_string(&NodeType::AssetCard).unwrap();
        assert_eq!(json, "\"ASSET_CARD\"");
        let json = serde_json::to_string(&RelationshipType::DependsOn).unwrap();
        assert_eq!(json, "\"DEPENDS_ON\"");
    }

    #[test]
    fn test_merge_unions_provenance_and_overwrites_attributes() {
        let mut node = Node::new(NodeType::File, "a.py", "a.py")
            .with_provenance("a")
            .with_attribute("size", 1i64)
            .with_attribute("digest", "old");
        let later = Node::new(NodeType::File, "a.py", "a.py")
            .with_provenance("b")
            .with_provenance("a")
            .with_attribute("digest", "new");

        node.merge(later);

        assert_eq!(node.provenance, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(node.attributes["size"], AttrValue::Int(1));
        assert_eq!(node.attributes["digest"], AttrValue::from("new"));
    }

    #[test]
    fn test_non_finite_floats_become_strings() {
        assert_eq!(AttrValue::from(0.25), AttrValue::Float(0.25));
        assert_eq!(AttrValue::from(f64::NAN), AttrValue::from("NaN"));
        assert_eq!(AttrValue::from(f64::INFINITY), AttrValue::from("inf"));
        assert_eq!(AttrValue::from(f64::NEG_INFINITY), AttrValue::from("-inf"));

        let json = serde_json::to_value(AttrValue::Float(f64::INFINITY)).unwrap();
        assert_eq!(json, serde_json::json!("inf"));
        let json = serde_json::to_value(AttrValue::Float(1.5)).unwrap();
        assert_eq!(json, serde_json::json!(1.5));
    }

    #[test]
    fn test_attr_value_display() {
        assert_eq!(AttrValue::from(vec!["x".to_string(), "y".to_string()]).to_string(), "x,y");
        assert_eq!(AttrValue::Float(1.5).to_string(), "1.5");
        assert_eq!(AttrValue::Bool(true).to_string(), "true");
    }
}
