pub mod construction;
pub mod model;
pub mod serialization;

pub use construction::GraphLoader;
pub use model::{AdjacencyGraph, EdgeAttributes, GraphMetadata, NodeAttributes, NodeId};
pub use serialization::GraphWriter;
