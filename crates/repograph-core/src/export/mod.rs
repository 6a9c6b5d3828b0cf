//! External representations of a graph
//!
//! Both writers walk the identifier-sorted node and relationship sequences,
//! so output is byte-for-byte stable for a given graph.

pub mod graphml;
pub mod linked_data;

pub use graphml::to_graphml;
pub use linked_data::{LINKED_DATA_VOCAB, to_linked_data, to_linked_data_string};
