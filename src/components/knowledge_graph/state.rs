use log::debug;

use super::geometry::{EdgeCurve, route_edge};
use super::highlight::{FocusConfig, Projection, ViewTransform, classify};
use super::layout::{Frame, LayoutConfig, layout};
use super::store::PositionStore;
use super::types::{GraphData, HighlightSet, PolicyGraph, Position};

pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 3.0;
/// Screen-space travel below which a press on a node counts as a click.
pub const CLICK_SLOP: f64 = 4.0;
/// Seconds the viewport takes to glide to a new focus.
pub const FOCUS_DURATION: f64 = 0.75;

fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

/// Per-node pointer interaction: `Idle → Dragging → Idle`.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum DragState {
	#[default]
	Idle,
	Dragging {
		node: usize,
		/// Graph-space offset between the pointer and the node centre.
		grab_offset: (f64, f64),
		/// Screen point of the press.
		press: (f64, f64),
		/// Forced position while the pointer holds the node.
		pinned: Position,
		moved: bool,
	},
}

/// How a drag ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DragEnd {
	/// Pointer never left the slop radius; carries the node id.
	Click(String),
	/// Node was moved and its position stored.
	Moved,
	/// No drag was in progress.
	None,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

#[derive(Clone, Debug)]
struct FocusAnimation {
	from: ViewTransform,
	to: ViewTransform,
	elapsed: f64,
}

/// Everything the canvas draws, plus the interaction state machine.
pub struct KnowledgeGraphState<S: PositionStore> {
	graph: PolicyGraph,
	store: S,
	positions: Vec<Position>,
	curves: Vec<Option<EdgeCurve>>,
	highlight: HighlightSet,
	projection: Projection,
	focus: Option<FocusAnimation>,
	layout_config: LayoutConfig,
	focus_config: FocusConfig,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub width: f64,
	pub height: f64,
	pub flow_time: f64,
}

impl<S: PositionStore> KnowledgeGraphState<S> {
	pub fn new(data: &GraphData, store: S, width: f64, height: f64) -> Self {
		Self::with_config(
			data,
			store,
			width,
			height,
			LayoutConfig::default(),
			FocusConfig::default(),
		)
	}

	pub fn with_config(
		data: &GraphData,
		store: S,
		width: f64,
		height: f64,
		layout_config: LayoutConfig,
		focus_config: FocusConfig,
	) -> Self {
		let mut state = Self {
			graph: PolicyGraph::default(),
			store,
			positions: Vec::new(),
			curves: Vec::new(),
			highlight: HighlightSet::new(),
			projection: Projection {
				nodes: Vec::new(),
				edges: Vec::new(),
				focus: None,
			},
			focus: None,
			layout_config,
			focus_config,
			transform: ViewTransform::default(),
			drag: DragState::Idle,
			pan: PanState::default(),
			width,
			height,
			flow_time: 0.0,
		};
		state.set_graph(data);
		state
	}

	fn frame(&self) -> Frame {
		Frame::new(self.width, self.height)
	}

	/// Replaces the graph. Only nodes the store has never seen are laid out.
	pub fn set_graph(&mut self, data: &GraphData) {
		self.graph = PolicyGraph::new(data);
		self.drag = DragState::Idle;
		let frame = self.frame();
		let outcome = layout(&self.graph, &mut self.store, frame, &self.layout_config);
		if outcome.placed > 0 {
			debug!(
				"knowledge graph: placed {} of {} nodes in {} iterations",
				outcome.placed,
				self.graph.nodes().len(),
				outcome.iterations
			);
		}
		let center = frame.center();
		self.positions = self
			.graph
			.nodes()
			.iter()
			.map(|n| self.store.get(&n.id).unwrap_or(center))
			.collect();
		self.curves = (0..self.graph.edges().len())
			.map(|e| self.route(e))
			.collect();
		self.reproject();
	}

	/// Restyles against a new highlight set and starts gliding to its focus.
	/// An empty set leaves the viewport where it is.
	pub fn set_highlight(&mut self, highlight: &HighlightSet) {
		self.highlight = highlight.clone();
		self.reproject();
		if let Some(to) = self.projection.focus {
			self.focus = Some(FocusAnimation {
				from: self.transform,
				to,
				elapsed: 0.0,
			});
		}
	}

	fn reproject(&mut self) {
		self.projection = classify(
			&self.graph,
			&self.highlight,
			&self.store,
			self.frame(),
			&self.focus_config,
		);
	}

	fn route(&self, edge_idx: usize) -> Option<EdgeCurve> {
		let (src, tgt) = self.graph.endpoints(edge_idx);
		let nodes = self.graph.nodes();
		route_edge(
			self.positions[src],
			nodes[src].size(),
			self.positions[tgt],
			nodes[tgt].size(),
		)
	}

	pub fn graph(&self) -> &PolicyGraph {
		&self.graph
	}

	pub fn projection(&self) -> &Projection {
		&self.projection
	}

	pub fn position(&self, idx: usize) -> Position {
		self.positions[idx]
	}

	pub fn curve(&self, edge_idx: usize) -> Option<&EdgeCurve> {
		self.curves.get(edge_idx).and_then(Option::as_ref)
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	/// Topmost node whose box contains the screen point.
	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<usize> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		self.graph
			.nodes()
			.iter()
			.enumerate()
			.rev()
			.find(|(i, node)| {
				let p = self.positions[*i];
				let (w, h) = node.size();
				(gx - p.x).abs() <= w / 2.0 && (gy - p.y).abs() <= h / 2.0
			})
			.map(|(i, _)| i)
	}

	pub fn begin_drag(&mut self, node: usize, sx: f64, sy: f64) {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let p = self.positions[node];
		self.focus = None;
		self.drag = DragState::Dragging {
			node,
			grab_offset: (gx - p.x, gy - p.y),
			press: (sx, sy),
			pinned: p,
			moved: false,
		};
	}

	/// Moves the held node under the pointer, storing the position live and
	/// re-routing only the edges that touch it.
	pub fn drag_to(&mut self, sx: f64, sy: f64) {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let DragState::Dragging {
			node,
			grab_offset,
			press,
			ref mut pinned,
			ref mut moved,
		} = self.drag
		else {
			return;
		};
		if !*moved && ((sx - press.0).powi(2) + (sy - press.1).powi(2)).sqrt() < CLICK_SLOP {
			return;
		}
		*moved = true;
		let p = Position::new(gx - grab_offset.0, gy - grab_offset.1);
		*pinned = p;
		self.move_node(node, p);
	}

	fn move_node(&mut self, node: usize, p: Position) {
		self.positions[node] = p;
		let id = self.graph.nodes()[node].id.clone();
		self.store.set(&id, p);
		for i in 0..self.graph.incident_edges(node).len() {
			let e = self.graph.incident_edges(node)[i];
			self.curves[e] = self.route(e);
		}
	}

	/// Releases the held node. The pin is dropped and no simulation resumes.
	pub fn end_drag(&mut self) -> DragEnd {
		match std::mem::take(&mut self.drag) {
			DragState::Idle => DragEnd::None,
			DragState::Dragging { node, moved, pinned, .. } => {
				if moved {
					self.move_node(node, pinned);
					DragEnd::Moved
				} else {
					DragEnd::Click(self.graph.nodes()[node].id.clone())
				}
			}
		}
	}

	pub fn begin_pan(&mut self, sx: f64, sy: f64) {
		self.focus = None;
		self.pan = PanState {
			active: true,
			start_x: sx,
			start_y: sy,
			transform_start_x: self.transform.x,
			transform_start_y: self.transform.y,
		};
	}

	pub fn pan_to(&mut self, sx: f64, sy: f64) {
		if self.pan.active {
			self.transform.x = self.pan.transform_start_x + (sx - self.pan.start_x);
			self.transform.y = self.pan.transform_start_y + (sy - self.pan.start_y);
		}
	}

	pub fn end_pan(&mut self) {
		self.pan.active = false;
	}

	/// Zooms about the screen point, keeping it fixed.
	pub fn zoom_at(&mut self, sx: f64, sy: f64, factor: f64) {
		self.focus = None;
		let new_k = (self.transform.k * factor).clamp(MIN_ZOOM, MAX_ZOOM);
		let ratio = new_k / self.transform.k;
		self.transform.x = sx - (sx - self.transform.x) * ratio;
		self.transform.y = sy - (sy - self.transform.y) * ratio;
		self.transform.k = new_k;
	}

	/// New surface size. Nodes stay where they are.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}

	pub fn tick(&mut self, dt: f64) {
		self.flow_time += dt;
		if let Some(anim) = &mut self.focus {
			anim.elapsed = (anim.elapsed + dt).min(FOCUS_DURATION);
			let t = ease_out_cubic(anim.elapsed / FOCUS_DURATION);
			self.transform = anim.from.lerp(&anim.to, t);
			if anim.elapsed >= FOCUS_DURATION {
				self.transform = anim.to;
				self.focus = None;
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::knowledge_graph::highlight::EdgeState;
	use crate::components::knowledge_graph::store::MemoryPositionStore;
	use crate::components::knowledge_graph::types::{NodeKind, PolicyEdge, PolicyNode};

	fn data() -> GraphData {
		GraphData {
			nodes: vec![
				PolicyNode::new("privacy", "Privacy", NodeKind::Policy),
				PolicyNode::new("pii", "PII Detection", NodeKind::Subcategory),
				PolicyNode::new("gdpr", "GDPR Compliance", NodeKind::Subcategory),
			],
			edges: vec![
				PolicyEdge::new("e1", "privacy", "pii"),
				PolicyEdge::new("e2", "privacy", "ghost"),
				PolicyEdge::new("e3", "privacy", "gdpr"),
			],
		}
	}

	fn state() -> KnowledgeGraphState<MemoryPositionStore> {
		KnowledgeGraphState::new(&data(), MemoryPositionStore::default(), 800.0, 600.0)
	}

	fn set(ids: &[&str]) -> HighlightSet {
		ids.iter().map(|s| s.to_string()).collect()
	}

	#[test]
	fn dragging_stores_exact_position_and_survives_relayout() {
		let mut s = state();
		s.transform = ViewTransform::default();
		let pii = s.graph().node_index("pii").unwrap();
		let start = s.position(pii);

		s.begin_drag(pii, start.x, start.y);
		s.drag_to(300.0, 300.0);
		assert_eq!(s.store.get("pii"), Some(Position::new(300.0, 300.0)));
		assert_eq!(s.end_drag(), DragEnd::Moved);
		assert_eq!(s.drag, DragState::Idle);
		assert_eq!(s.store.get("pii"), Some(Position::new(300.0, 300.0)));

		s.set_graph(&data());
		assert_eq!(s.position(pii), Position::new(300.0, 300.0));
	}

	#[test]
	fn drag_reroutes_only_incident_edges() {
		let mut s = state();
		s.transform = ViewTransform::default();
		let pii = s.graph().node_index("pii").unwrap();
		let before: Vec<_> = (0..s.graph().edges().len()).map(|e| s.curve(e).copied()).collect();
		let p = s.position(pii);
		s.begin_drag(pii, p.x, p.y);
		s.drag_to(p.x + 200.0, p.y + 200.0);
		// e1 touches pii, e3 does not
		assert_ne!(s.curve(0).copied(), before[0]);
		assert_eq!(s.curve(1).copied(), before[1]);
	}

	#[test]
	fn press_without_travel_is_a_click() {
		let mut s = state();
		let gdpr = s.graph().node_index("gdpr").unwrap();
		let p = s.position(gdpr);
		let (sx, sy) = (p.x * s.transform.k + s.transform.x, p.y * s.transform.k + s.transform.y);
		assert_eq!(s.node_at_position(sx, sy), Some(gdpr));
		s.begin_drag(gdpr, sx, sy);
		s.drag_to(sx + 1.0, sy);
		assert_eq!(s.end_drag(), DragEnd::Click("gdpr".into()));
		assert_eq!(s.position(gdpr), p);
	}

	#[test]
	fn remount_reuses_stored_layout() {
		let first = state();
		let mut store = MemoryPositionStore::default();
		for n in first.graph().nodes() {
			store.set(&n.id, first.store.get(&n.id).unwrap());
		}
		let second = KnowledgeGraphState::new(&data(), store, 1024.0, 768.0);
		for i in 0..3 {
			assert_eq!(first.position(i), second.position(i));
		}
	}

	#[test]
	fn highlight_glides_to_focus_and_empty_set_keeps_view() {
		let mut s = state();
		s.set_highlight(&set(&["privacy", "pii"]));
		assert_eq!(s.projection().edges[0].state, EdgeState::Active);
		let target = s.projection().focus.unwrap();
		assert!(s.focus.is_some());
		s.tick(FOCUS_DURATION);
		assert_eq!(s.transform, target);
		assert!(s.focus.is_none());

		s.set_highlight(&HighlightSet::new());
		s.tick(0.1);
		assert_eq!(s.transform, target);
	}

	#[test]
	fn resize_moves_nothing() {
		let mut s = state();
		let before: Vec<_> = (0..3).map(|i| s.position(i)).collect();
		s.resize(200.0, 100.0);
		let after: Vec<_> = (0..3).map(|i| s.position(i)).collect();
		assert_eq!(before, after);
		assert_eq!((s.width, s.height), (200.0, 100.0));
	}

	#[test]
	fn zoom_is_clamped() {
		let mut s = state();
		for _ in 0..50 {
			s.zoom_at(10.0, 10.0, 1.1);
		}
		assert_eq!(s.transform.k, MAX_ZOOM);
		for _ in 0..100 {
			s.zoom_at(10.0, 10.0, 0.9);
		}
		assert_eq!(s.transform.k, MIN_ZOOM);
	}
}
