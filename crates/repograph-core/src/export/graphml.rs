//! GraphML graph-exchange document (write-only)

use crate::graph::Graph;
use crate::model::{Attributes, Node, Relationship};
use std::collections::BTreeSet;
use std::fmt::Write as _;

/// Fixed node fields, declared as `node_{name}`.
const NODE_FIELDS: [&str; 3] = ["label", "type", "provenance"];

/// Attribute keys live under `node_attr_` / `edge_attr_` so they never
/// collide with the fixed fields.
const NODE_ATTR: &str = "node_attr";
const EDGE_ATTR: &str = "edge_attr";

/// Escape `&`, `<` and `>`. Quotes pass through unchanged.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render the graph as a GraphML document.
///
/// Every attribute value is stringified; list values are comma-joined.
pub fn to_graphml(graph: &Graph) -> String {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str("<graphml xmlns=\"http://graphml.graphdrawing.org/xmlns\">\n");

    for key in NODE_FIELDS {
        write_key(&mut out, "node", key, "node");
    }
    for key in attribute_keys(graph.nodes().map(|n| &n.attributes)) {
        write_key(&mut out, NODE_ATTR, key, "node");
    }
    write_key(&mut out, "edge", "type", "edge");
    for key in attribute_keys(graph.relationships().map(|r| &r.attributes)) {
        write_key(&mut out, EDGE_ATTR, key, "edge");
    }

    out.push_str("  <graph id=\"repograph\" edgedefault=\"directed\">\n");
    for node in graph.nodes() {
        write_node(&mut out, node);
    }
    for rel in graph.relationships() {
        write_edge(&mut out, rel);
    }
    out.push_str("  </graph>\n");
    out.push_str("</graphml>\n");
    out
}

fn attribute_keys<'a>(maps: impl Iterator<Item = &'a Attributes>) -> BTreeSet<&'a str> {
    maps.flat_map(|attrs| attrs.keys().map(String::as_str)).collect()
}

fn write_key(out: &mut String, prefix: &str, key: &str, domain: &str) {
    let _ = writeln!(
        out,
        "  <key id=\"{prefix}_{k}\" for=\"{domain}\" attr.name=\"{k}\" attr.type=\"string\"/>",
        k = escape(key)
    );
}

fn write_data(out: &mut String, prefix: &str, key: &str, value: &str) {
    let _ = writeln!(
        out,
        "      <data key=\"{}_{}\">{}</data>",
        prefix,
        escape(key),
        escape(value)
    );
}

fn write_node(out: &mut String, node: &Node) {
    let _ = writeln!(out, "    <node id=\"{}\">", escape(&node.id));
    write_data(out, "node", "label", &node.label);
    write_data(out, "node", "type", node.node_type.as_str());
    write_data(out, "node", "provenance", &node.provenance.join(","));
    for (key, value) in &node.attributes {
        write_data(out, NODE_ATTR, key, &value.to_string());
    }
    out.push_str("    </node>\n");
}

fn write_edge(out: &mut String, rel: &Relationship) {
    let _ = writeln!(
        out,
        "    <edge id=\"{}\" source=\"{}\" target=\"{}\">",
        escape(&rel.id),
        escape(&rel.source),
        escape(&rel.target)
    );
    write_data(out, "edge", "type", rel.rel_type.as_str());
    for (key, value) in &rel.attributes {
        write_data(out, EDGE_ATTR, key, &value.to_string());
    }
    out.push_str("    </edge>\n");
}
