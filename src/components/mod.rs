pub mod guru;
pub mod knowledge_graph;
