//! Visual emphasis derived from the current highlight set.
//!
//! [`classify`] is a pure function of the graph, the highlight set and the
//! stored positions. The canvas recomputes it in full whenever the set
//! changes.

use super::layout::Frame;
use super::store::PositionStore;
use super::types::{HighlightSet, PolicyGraph};

/// Neutral stroke for edges that are not fully highlighted.
pub const NEUTRAL_STROKE: &str = "#aaaaaa";

/// Pan/zoom transform: `screen = world * k + (x, y)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			k: 1.0,
		}
	}
}

impl ViewTransform {
	/// Linear blend towards `to`, `t` in `[0, 1]`.
	pub fn lerp(&self, to: &ViewTransform, t: f64) -> ViewTransform {
		ViewTransform {
			x: self.x + (to.x - self.x) * t,
			y: self.y + (to.y - self.y) * t,
			k: self.k + (to.k - self.k) * t,
		}
	}
}

/// Focus viewport tunables.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FocusConfig {
	/// Padding around the highlighted boxes, in graph units.
	pub padding: f64,
	/// Zoom ceiling so a single node is not blown up.
	pub max_scale: f64,
}

impl Default for FocusConfig {
	fn default() -> Self {
		Self {
			padding: 50.0,
			max_scale: 1.5,
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeEmphasis {
	/// Nothing is highlighted.
	Resting,
	/// In the highlight set.
	Focused,
	/// Something else is highlighted.
	Dimmed,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeStyle {
	pub emphasis: NodeEmphasis,
	pub opacity: f64,
	pub stroke_width: f64,
	pub glow: bool,
	pub bold: bool,
}

impl NodeStyle {
	fn for_emphasis(emphasis: NodeEmphasis) -> Self {
		match emphasis {
			NodeEmphasis::Focused => Self {
				emphasis,
				opacity: 1.0,
				stroke_width: 2.0,
				glow: true,
				bold: true,
			},
			NodeEmphasis::Resting => Self {
				emphasis,
				opacity: 0.6,
				stroke_width: 1.0,
				glow: false,
				bold: false,
			},
			NodeEmphasis::Dimmed => Self {
				emphasis,
				opacity: 0.15,
				stroke_width: 1.0,
				glow: false,
				bold: false,
			},
		}
	}
}

/// Three-way edge classification against the highlight set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeState {
	/// Both endpoints highlighted.
	Active,
	/// Exactly one endpoint highlighted.
	Adjacent,
	/// Neither endpoint highlighted.
	Background,
}

impl EdgeState {
	pub fn of(source_highlighted: bool, target_highlighted: bool) -> Self {
		match (source_highlighted, target_highlighted) {
			(true, true) => EdgeState::Active,
			(false, false) => EdgeState::Background,
			_ => EdgeState::Adjacent,
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeStyle {
	pub state: EdgeState,
	pub stroke: &'static str,
	pub width: f64,
	pub opacity: f64,
	/// Draw the arrowhead in the stroke colour instead of grey.
	pub accent_arrow: bool,
	/// Animated dash along the edge.
	pub animated: bool,
}

/// Per-node and per-edge styles (indexed like the graph) plus the viewport
/// to focus, if any.
#[derive(Clone, Debug, PartialEq)]
pub struct Projection {
	pub nodes: Vec<NodeStyle>,
	pub edges: Vec<EdgeStyle>,
	/// `None` leaves the current viewport untouched.
	pub focus: Option<ViewTransform>,
}

/// Styles every node and edge against `highlight` and computes the focus
/// viewport over the highlighted nodes' boxes.
pub fn classify<S: PositionStore + ?Sized>(
	graph: &PolicyGraph,
	highlight: &HighlightSet,
	positions: &S,
	frame: Frame,
	config: &FocusConfig,
) -> Projection {
	let lit: Vec<bool> = graph
		.nodes()
		.iter()
		.map(|n| highlight.contains(&n.id))
		.collect();
	let any = lit.iter().any(|&l| l);

	let nodes = lit
		.iter()
		.map(|&l| {
			NodeStyle::for_emphasis(match (any, l) {
				(false, _) => NodeEmphasis::Resting,
				(true, true) => NodeEmphasis::Focused,
				(true, false) => NodeEmphasis::Dimmed,
			})
		})
		.collect();

	let edges = (0..graph.edges().len())
		.map(|e| {
			let (src, tgt) = graph.endpoints(e);
			let state = EdgeState::of(lit[src], lit[tgt]);
			match state {
				EdgeState::Active => EdgeStyle {
					state,
					stroke: graph.nodes()[src].kind.palette().fill,
					width: 2.0,
					opacity: 1.0,
					accent_arrow: true,
					animated: true,
				},
				EdgeState::Adjacent => EdgeStyle {
					state,
					stroke: NEUTRAL_STROKE,
					width: 1.0,
					opacity: 0.9,
					accent_arrow: false,
					animated: false,
				},
				EdgeState::Background => EdgeStyle {
					state,
					stroke: NEUTRAL_STROKE,
					width: 1.0,
					opacity: if any { 0.2 } else { 0.5 },
					accent_arrow: false,
					animated: false,
				},
			}
		})
		.collect();

	let focus = if any {
		focus_viewport(graph, &lit, positions, frame, config)
	} else {
		None
	};

	Projection {
		nodes,
		edges,
		focus,
	}
}

fn focus_viewport<S: PositionStore + ?Sized>(
	graph: &PolicyGraph,
	lit: &[bool],
	positions: &S,
	frame: Frame,
	config: &FocusConfig,
) -> Option<ViewTransform> {
	let mut bounds: Option<(f64, f64, f64, f64)> = None;
	for (node, _) in graph.nodes().iter().zip(lit).filter(|(_, l)| **l) {
		let Some(p) = positions.get(&node.id) else {
			continue;
		};
		let (hw, hh) = (node.size().0 / 2.0, node.size().1 / 2.0);
		let (x0, y0, x1, y1) = (p.x - hw, p.y - hh, p.x + hw, p.y + hh);
		bounds = Some(match bounds {
			None => (x0, y0, x1, y1),
			Some((a, b, c, d)) => (a.min(x0), b.min(y0), c.max(x1), d.max(y1)),
		});
	}

	let (min_x, min_y, max_x, max_y) = bounds?;
	let dx = max_x - min_x + config.padding * 2.0;
	let dy = max_y - min_y + config.padding * 2.0;
	let k = (frame.width / dx).min(frame.height / dy).min(config.max_scale);
	if !k.is_finite() || k <= 0.0 {
		return None;
	}
	let (cx, cy) = ((min_x + max_x) / 2.0, (min_y + max_y) / 2.0);
	Some(ViewTransform {
		x: frame.width / 2.0 - k * cx,
		y: frame.height / 2.0 - k * cy,
		k,
	})
}
