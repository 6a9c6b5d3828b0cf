//! Structural dictionary form of a graph
//!
//! `to_dict` emits `{"nodes": [...], "relationships": [...]}` with both lists
//! sorted by identifier. `from_dict` is the inverse and tolerates extra keys
//! (such as a linked-data `@context`).

use crate::error::DecodeError;
use crate::graph::Graph;
use crate::model::*;
use serde_json::{Map, Value, json};

impl Graph {
    /// Convert the graph to its structural dictionary form.
    pub fn to_dict(&self) -> Value {
        json!({
            "nodes": self.nodes().map(node_to_value).collect::<Vec<_>>(),
            "relationships": self.relationships().map(relationship_to_value).collect::<Vec<_>>(),
        })
    }

    /// Rebuild a graph from its structural dictionary form.
    ///
    /// Nodes sharing an identifier are merged and duplicate relationships are
    /// dropped, exactly as if they had been inserted one by one.
    pub fn from_dict(value: &Value) -> Result<Graph, DecodeError> {
        let root = value.as_object().ok_or_else(|| DecodeError::InvalidField {
            field: "$".to_string(),
            expected: "an object",
        })?;

        let mut graph = Graph::new();

        for (i, item) in array_field(root, "nodes", "")?.iter().enumerate() {
            graph.add_node(decode_node(item, &format!("nodes[{}]", i))?);
        }

        for (i, item) in array_field(root, "relationships", "")?.iter().enumerate() {
            graph.add_relationship(decode_relationship(item, &format!("relationships[{}]", i))?);
        }

        Ok(graph)
    }
}

fn node_to_value(node: &Node) -> Value {
    json!({
        "id": node.id,
        "type": node.node_type.as_str(),
        "label": node.label,
        "provenance": node.provenance,
        "attributes": node.attributes,
    })
}

fn relationship_to_value(rel: &Relationship) -> Value {
    json!({
        "id": rel.id,
        "type": rel.rel_type.as_str(),
        "source": rel.source,
        "target": rel.target,
        "attributes": rel.attributes,
    })
}

fn decode_node(value: &Value, path: &str) -> Result<Node, DecodeError> {
    let obj = as_object(value, path)?;
    let id = string_field(obj, "id", path)?;
    let type_tag = string_field(obj, "type", path)?;
    let node_type = type_tag
        .parse::<NodeType>()
        .map_err(|value| DecodeError::UnknownType {
            field: join(path, "type"),
            value,
        })?;
    let label = string_field(obj, "label", path)?;

    let mut node = Node::with_id(id, node_type, label);
    for (i, entry) in array_field(obj, "provenance", path)?.iter().enumerate() {
        let source = entry.as_str().ok_or_else(|| DecodeError::InvalidField {
            field: format!("{}[{}]", join(path, "provenance"), i),
            expected: "a string",
        })?;
        node.add_provenance(source);
    }
    node.attributes = attributes_field(obj, path)?;
    Ok(node)
}

fn decode_relationship(value: &Value, path: &str) -> Result<Relationship, DecodeError> {
    let obj = as_object(value, path)?;
    let id = string_field(obj, "id", path)?;
    let type_tag = string_field(obj, "type", path)?;
    let rel_type = type_tag
        .parse::<RelationshipType>()
        .map_err(|value| DecodeError::UnknownType {
            field: join(path, "type"),
            value,
        })?;

    Ok(Relationship {
        id,
        rel_type,
        source: string_field(obj, "source", path)?,
        target: string_field(obj, "target", path)?,
        attributes: attributes_field(obj, path)?,
    })
}

fn attributes_field(obj: &Map<String, Value>, path: &str) -> Result<Attributes, DecodeError> {
    let field = join(path, "attributes");
    let Some(value) = obj.get("attributes") else {
        return Ok(Attributes::new());
    };
    let map = value.as_object().ok_or_else(|| DecodeError::InvalidField {
        field: field.clone(),
        expected: "an object",
    })?;

    let mut attributes = Attributes::new();
    for (key, raw) in map {
        let parsed: AttrValue =
            serde_json::from_value(raw.clone()).map_err(|_| DecodeError::InvalidField {
                field: format!("{}.{}", field, key),
                expected: "a string, number, boolean or list of strings",
            })?;
        attributes.insert(key.clone(), parsed);
    }
    Ok(attributes)
}

fn as_object<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>, DecodeError> {
    value.as_object().ok_or_else(|| DecodeError::InvalidField {
        field: path.to_string(),
        expected: "an object",
    })
}

fn string_field(obj: &Map<String, Value>, key: &str, path: &str) -> Result<String, DecodeError> {
    let field = join(path, key);
    match obj.get(key) {
        None => Err(DecodeError::MissingField { field }),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(DecodeError::InvalidField { field, expected: "a string" }),
    }
}

fn array_field<'a>(obj: &'a Map<String, Value>, key: &str, path: &str) -> Result<&'a Vec<Value>, DecodeError> {
    let field = join(path, key);
    match obj.get(key) {
        None => Err(DecodeError::MissingField { field }),
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(DecodeError::InvalidField { field, expected: "an array" }),
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}
