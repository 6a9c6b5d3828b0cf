//! Repograph Core — knowledge-graph model, validator, diff engine and serializers

pub mod codec;
pub mod diff;
pub mod error;
pub mod export;
pub mod graph;
pub mod model;
pub mod snapshot;
pub mod validate;


pub use diff::{GraphDiff, diff};
pub use error::{DecodeError, SnapshotError};
pub use export::{to_graphml, to_linked_data, to_linked_data_string};
pub use graph::Graph;
pub use model::{
    AttrValue, Attributes, Node, NodeType, Relationship, RelationshipType, hashed_node_id, node_id,
    relationship_id,
};
pub use snapshot::{CACHE_DIR, SNAPSHOT_INDEX, SnapshotIndex, SnapshotStore, load_graph, write_linked_data};
pub use validate::{Violation, validate};
