//! Domain types for the guidelines knowledge graph.

use std::collections::{HashMap, HashSet};

use log::warn;

/// Identifier of a node, unique within a graph.
pub type NodeId = String;

/// The nodes a query response marked as relevant.
pub type HighlightSet = HashSet<NodeId>;

/// Tier of a policy node. Drives box size, colour and layout sector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
	/// Top-level policy.
	Policy,
	/// Policy category.
	Category,
	/// Category refinement.
	Subcategory,
	/// Concrete rule.
	Rule,
	/// Product type a rule applies to.
	ProductType,
	/// Missing or unrecognised type.
	#[default]
	Unknown,
}

/// Fill and stroke colours of a node tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Palette {
	/// Box fill.
	pub fill: &'static str,
	/// Box outline.
	pub stroke: &'static str,
}

impl NodeKind {
	/// The known tiers, in legend order.
	pub const KNOWN: [NodeKind; 5] = [
		NodeKind::Policy,
		NodeKind::Category,
		NodeKind::Subcategory,
		NodeKind::Rule,
		NodeKind::ProductType,
	];

	/// Parses a wire type name. Anything unrecognised maps to [`NodeKind::Unknown`].
	pub fn parse(name: &str) -> Self {
		match name {
			"Policy" => NodeKind::Policy,
			"Category" => NodeKind::Category,
			"Subcategory" => NodeKind::Subcategory,
			"Rule" => NodeKind::Rule,
			"ProductType" => NodeKind::ProductType,
			_ => NodeKind::Unknown,
		}
	}

	/// Display name of the tier.
	pub fn name(self) -> &'static str {
		match self {
			NodeKind::Policy => "Policy",
			NodeKind::Category => "Category",
			NodeKind::Subcategory => "Subcategory",
			NodeKind::Rule => "Rule",
			NodeKind::ProductType => "ProductType",
			NodeKind::Unknown => "unknown",
		}
	}

	/// Box size `(width, height)` in graph units.
	pub fn size(self) -> (f64, f64) {
		match self {
			NodeKind::Policy => (140.0, 60.0),
			NodeKind::Category => (120.0, 50.0),
			NodeKind::Subcategory => (110.0, 45.0),
			NodeKind::Rule | NodeKind::ProductType | NodeKind::Unknown => (100.0, 40.0),
		}
	}

	pub fn palette(self) -> Palette {
		let (fill, stroke) = match self {
			NodeKind::Policy => ("#4A90E2", "#2171C7"),
			NodeKind::Category => ("#E67E22", "#B35C0F"),
			NodeKind::Subcategory => ("#67B7DC", "#4295BA"),
			NodeKind::Rule => ("#E74C3C", "#B83024"),
			NodeKind::ProductType => ("#F5B041", "#D4932A"),
			NodeKind::Unknown => ("#999999", "#666666"),
		};
		Palette { fill, stroke }
	}
}

/// A node of the knowledge graph.
#[derive(Clone, Debug, PartialEq)]
pub struct PolicyNode {
	pub id: NodeId,
	pub label: String,
	pub kind: NodeKind,
	pub description: Option<String>,
}

impl PolicyNode {
	/// Creates a node, falling back to the id when the label is empty.
	pub fn new(id: impl Into<String>, label: impl Into<String>, kind: NodeKind) -> Self {
		let id = id.into();
		let label = label.into();
		let label = if label.trim().is_empty() { id.clone() } else { label };
		Self {
			id,
			label,
			kind,
			description: None,
		}
	}

	pub fn with_description(mut self, description: impl Into<String>) -> Self {
		let description = description.into();
		self.description = (!description.trim().is_empty()).then_some(description);
		self
	}

	/// Box size `(width, height)` of this node.
	pub fn size(&self) -> (f64, f64) {
		self.kind.size()
	}
}

/// A directed edge between two nodes.
#[derive(Clone, Debug, PartialEq)]
pub struct PolicyEdge {
	pub id: String,
	pub source: NodeId,
	pub target: NodeId,
	pub label: Option<String>,
}

impl PolicyEdge {
	pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			source: source.into(),
			target: target.into(),
			label: None,
		}
	}
}

/// A 2D coordinate in graph space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Position {
	pub x: f64,
	pub y: f64,
}

impl Position {
	pub fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}
}

/// Raw graph input, as supplied by the host. Edges may be dangling.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphData {
	pub nodes: Vec<PolicyNode>,
	pub edges: Vec<PolicyEdge>,
}

impl GraphData {
	/// The static graph shown until the backend graph arrives.
	pub fn seed() -> Self {
		let nodes = vec![
			PolicyNode::new("privacy", "Privacy", NodeKind::Policy),
			PolicyNode::new("pii", "PII Detection", NodeKind::Subcategory),
			PolicyNode::new("gdpr", "GDPR Compliance", NodeKind::Subcategory),
			PolicyNode::new("ethics", "Ethics", NodeKind::Category),
			PolicyNode::new("bias", "Bias Detection", NodeKind::ProductType),
			PolicyNode::new("fairness", "Fairness Metrics", NodeKind::ProductType),
			PolicyNode::new("content", "Content Safety", NodeKind::Rule),
		];
		let edges = [
			("privacy", "pii"),
			("privacy", "gdpr"),
			("ethics", "bias"),
			("ethics", "fairness"),
			("bias", "fairness"),
			("gdpr", "content"),
		]
		.into_iter()
		.map(|(s, t)| PolicyEdge::new(format!("{s}-{t}"), s, t))
		.collect();
		Self { nodes, edges }
	}
}

/// A validated graph: unique node ids, no dangling edges or self-loops, and an
/// incidence index so edge geometry can be refreshed per node.
#[derive(Clone, Debug, Default)]
pub struct PolicyGraph {
	nodes: Vec<PolicyNode>,
	edges: Vec<PolicyEdge>,
	index: HashMap<NodeId, usize>,
	incident: Vec<Vec<usize>>,
}

impl PolicyGraph {
	/// Builds the render set. Duplicate node ids keep their first
	/// occurrence; edges with a missing endpoint and self-loops are dropped.
	pub fn new(data: &GraphData) -> Self {
		let mut nodes = Vec::with_capacity(data.nodes.len());
		let mut index = HashMap::with_capacity(data.nodes.len());
		for node in &data.nodes {
			if index.contains_key(&node.id) {
				warn!("knowledge graph: duplicate node id {:?} ignored", node.id);
				continue;
			}
			index.insert(node.id.clone(), nodes.len());
			nodes.push(node.clone());
		}

		let mut graph = Self {
			incident: vec![Vec::new(); nodes.len()],
			nodes,
			edges: Vec::with_capacity(data.edges.len()),
			index,
		};
		for edge in &data.edges {
			let (Some(src), Some(tgt)) = (graph.node_index(&edge.source), graph.node_index(&edge.target))
			else {
				warn!(
					"knowledge graph: dropping edge {:?} ({} -> {}), endpoint missing",
					edge.id, edge.source, edge.target
				);
				continue;
			};
			if src == tgt {
				warn!("knowledge graph: dropping self-loop {:?} on {}", edge.id, edge.source);
				continue;
			}
			graph.incident[src].push(graph.edges.len());
			graph.incident[tgt].push(graph.edges.len());
			graph.edges.push(edge.clone());
		}
		graph
	}

	pub fn nodes(&self) -> &[PolicyNode] {
		&self.nodes
	}

	pub fn edges(&self) -> &[PolicyEdge] {
		&self.edges
	}

	pub fn node_index(&self, id: &str) -> Option<usize> {
		self.index.get(id).copied()
	}

	/// Indices into [`PolicyGraph::edges`] of the edges touching node `idx`.
	pub fn incident_edges(&self, idx: usize) -> &[usize] {
		self.incident.get(idx).map(Vec::as_slice).unwrap_or(&[])
	}

	/// `(source, target)` node indices of edge `edge_idx`.
	pub fn endpoints(&self, edge_idx: usize) -> (usize, usize) {
		let edge = &self.edges[edge_idx];
		(self.index[&edge.source], self.index[&edge.target])
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn sample() -> GraphData {
		GraphData {
			nodes: vec![
				PolicyNode::new("privacy", "Privacy", NodeKind::Policy),
				PolicyNode::new("pii", "PII Detection", NodeKind::Subcategory),
				PolicyNode::new("gdpr", "GDPR Compliance", NodeKind::Subcategory),
			],
			edges: vec![
				PolicyEdge::new("e1", "privacy", "pii"),
				PolicyEdge::new("e2", "privacy", "ghost"),
			],
		}
	}

	#[test]
	fn dangling_edges_are_excluded() {
		let graph = PolicyGraph::new(&sample());
		let ids: Vec<&str> = graph.edges().iter().map(|e| e.id.as_str()).collect();
		assert_eq!(ids, vec!["e1"]);
	}

	#[test]
	fn self_loops_are_excluded() {
		let mut data = sample();
		data.edges.push(PolicyEdge::new("loop", "gdpr", "gdpr"));
		let graph = PolicyGraph::new(&data);
		let ids: Vec<&str> = graph.edges().iter().map(|e| e.id.as_str()).collect();
		assert_eq!(ids, vec!["e1"]);
		let gdpr = graph.node_index("gdpr").unwrap();
		assert!(graph.incident_edges(gdpr).is_empty());
	}

	#[test]
	fn incidence_tracks_both_endpoints() {
		let graph = PolicyGraph::new(&sample());
		let privacy = graph.node_index("privacy").unwrap();
		let pii = graph.node_index("pii").unwrap();
		let gdpr = graph.node_index("gdpr").unwrap();
		assert_eq!(graph.incident_edges(privacy), &[0]);
		assert_eq!(graph.incident_edges(pii), &[0]);
		assert!(graph.incident_edges(gdpr).is_empty());
		assert_eq!(graph.endpoints(0), (privacy, pii));
	}

	#[test]
	fn duplicate_nodes_keep_first() {
		let mut data = sample();
		data.nodes.push(PolicyNode::new("pii", "Other", NodeKind::Rule));
		let graph = PolicyGraph::new(&data);
		assert_eq!(graph.nodes().len(), 3);
		let pii = graph.node_index("pii").unwrap();
		assert_eq!(graph.nodes()[pii].label, "PII Detection");
	}

	#[test]
	fn empty_label_falls_back_to_id() {
		let node = PolicyNode::new("gdpr", "  ", NodeKind::Unknown);
		assert_eq!(node.label, "gdpr");
	}

	#[rstest]
	#[case("Policy", NodeKind::Policy, (140.0, 60.0))]
	#[case("Category", NodeKind::Category, (120.0, 50.0))]
	#[case("Subcategory", NodeKind::Subcategory, (110.0, 45.0))]
	#[case("Rule", NodeKind::Rule, (100.0, 40.0))]
	#[case("ContentType", NodeKind::Unknown, (100.0, 40.0))]
	#[case("", NodeKind::Unknown, (100.0, 40.0))]
	fn kinds_parse_and_size(
		#[case] name: &str,
		#[case] kind: NodeKind,
		#[case] size: (f64, f64),
	) {
		assert_eq!(NodeKind::parse(name), kind);
		assert_eq!(kind.size(), size);
	}

	#[test]
	fn seed_graph_has_no_dangling_edges() {
		let seed = GraphData::seed();
		let graph = PolicyGraph::new(&seed);
		assert_eq!(graph.nodes().len(), 7);
		assert_eq!(graph.edges().len(), seed.edges.len());
	}
}
