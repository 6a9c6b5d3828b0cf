//! JSON linked-data document

use crate::graph::Graph;
use serde_json::{Value, json};

/// Vocabulary base for node and relationship type terms.
pub const LINKED_DATA_VOCAB: &str = "https://repograph.dev/vocab#";

fn context() -> Value {
    json!({
        "@vocab": LINKED_DATA_VOCAB,
        "id": "@id",
        "type": "@type",
        "source": {"@type": "@id"},
        "target": {"@type": "@id"},
        "nodes": {"@container": "@list"},
        "relationships": {"@container": "@list"},
    })
}

/// The graph's structural dictionary with a fixed `@context` attached.
///
/// [`Graph::from_dict`] accepts this document unchanged.
pub fn to_linked_data(graph: &Graph) -> Value {
    let mut doc = graph.to_dict();
    if let Value::Object(map) = &mut doc {
        map.insert("@context".to_string(), context());
    }
    doc
}

/// Pretty-printed linked-data document terminated by a newline.
pub fn to_linked_data_string(graph: &Graph) -> serde_json::Result<String> {
    let mut text = serde_json::to_string_pretty(&to_linked_data(graph))?;
    text.push('\n');
    Ok(text)
}
