//! Guidelines knowledge graph: layout, position cache, highlight projection
//! and the canvas surface that draws them.

mod component;
mod geometry;
mod highlight;
mod layout;
mod render;
mod state;
mod store;
mod types;

pub use component::KnowledgeGraph;
pub use store::SharedPositionStore;
pub use types::{GraphData, HighlightSet, NodeKind, PolicyEdge, PolicyNode};
