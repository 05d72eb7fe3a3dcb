//! Initial placement of nodes that have no cached position.
//!
//! Unplaced nodes start in an angular sector reserved for their tier, then a
//! force simulation (springs, charge, collision, centering) runs for a fixed
//! number of steps. Nodes that already have a stored position take part as
//! anchors and never move.

use std::f64::consts::PI;

use force_graph::{EdgeData, ForceGraph, NodeData, SimulationParameters};

use super::store::PositionStore;
use super::types::{NodeKind, PolicyGraph, Position};

/// Tunables of the layout pass.
#[derive(Clone, Debug)]
pub struct LayoutConfig {
	/// Number of simulation steps. The pass never checks for convergence.
	pub max_iterations: usize,
	/// Rest length of a link, in graph units.
	pub link_distance: f64,
	/// Spring stiffness along links.
	pub spring: f32,
	/// Mass of every node; with `spring` and `link_distance` it fixes the charge.
	pub node_mass: f32,
	/// Per-step force clamp.
	pub force_max: f32,
	pub node_speed: f32,
	pub damping: f32,
	/// Simulated seconds per step.
	pub time_step: f32,
	/// Fraction of a box overlap resolved per step, `0..=1`.
	pub collision_strength: f64,
	/// Base spread of the initial jitter inside a sector.
	pub type_spread: f64,
	/// Sector ring radius as a fraction of the smaller frame side.
	pub sector_radius_ratio: f64,
	/// Seed of the jitter generator.
	pub seed: u64,
}

impl Default for LayoutConfig {
	fn default() -> Self {
		Self {
			max_iterations: 100,
			link_distance: 150.0,
			spring: 0.05,
			node_mass: 10.0,
			force_max: 100.0,
			node_speed: 3000.0,
			damping: 0.9,
			time_step: 0.03,
			collision_strength: 1.0,
			type_spread: 50.0,
			sector_radius_ratio: 0.35,
			seed: 42,
		}
	}
}

impl LayoutConfig {
	/// Charge that balances one spring at exactly `link_distance`.
	///
	/// The spring pulls with `0.5 * spring * d` and the charge pushes with
	/// `charge * m² / d²`, so the two cancel at `d³ = 2 * charge * m² / spring`.
	pub fn charge(&self) -> f32 {
		let d = self.link_distance as f32;
		self.spring * d * d * d / (2.0 * self.node_mass * self.node_mass)
	}

	fn parameters(&self) -> SimulationParameters {
		SimulationParameters {
			force_charge: self.charge(),
			force_spring: self.spring,
			force_max: self.force_max,
			node_speed: self.node_speed,
			damping_factor: self.damping,
		}
	}
}

/// Size of the drawing surface the layout is centred in.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frame {
	pub width: f64,
	pub height: f64,
}

impl Frame {
	pub fn new(width: f64, height: f64) -> Self {
		Self { width, height }
	}

	pub fn center(&self) -> Position {
		Position::new(self.width / 2.0, self.height / 2.0)
	}
}

/// What a layout pass did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LayoutOutcome {
	/// Nodes that received a new position.
	pub placed: usize,
	/// Simulation steps run.
	pub iterations: usize,
}

/// Deterministic jitter source (`x' = (9301 x + 49297) mod 233280`).
struct Jitter(u64);

impl Jitter {
	fn new(seed: u64) -> Self {
		Self(seed % 233280)
	}

	/// Next value in `[0, 1)`.
	fn next(&mut self) -> f64 {
		self.0 = (self.0 * 9301 + 49297) % 233280;
		self.0 as f64 / 233280.0
	}
}

struct Body {
	radius: f64,
}

/// Runs the force layout for nodes missing from `store` and writes their
/// positions back. A no-op when every node is already placed.
pub fn layout<S: PositionStore + ?Sized>(
	graph: &PolicyGraph,
	store: &mut S,
	frame: Frame,
	config: &LayoutConfig,
) -> LayoutOutcome {
	let cached: Vec<Option<Position>> = graph.nodes().iter().map(|n| store.get(&n.id)).collect();
	let missing = cached.iter().filter(|p| p.is_none()).count();
	if missing == 0 {
		return LayoutOutcome::default();
	}

	let seeds = initial_positions(graph, &cached, frame, config);
	let mut sim: ForceGraph<Body, ()> = ForceGraph::new(config.parameters());
	let indices: Vec<_> = graph
		.nodes()
		.iter()
		.zip(&seeds)
		.zip(&cached)
		.map(|((node, start), fixed)| {
			let (w, h) = node.size();
			sim.add_node(NodeData {
				x: start.x as f32,
				y: start.y as f32,
				mass: config.node_mass,
				is_anchor: fixed.is_some(),
				user_data: Body {
					radius: w.max(h) / 1.5,
				},
			})
		})
		.collect();

	for edge_idx in 0..graph.edges().len() {
		let (src, tgt) = graph.endpoints(edge_idx);
		if src != tgt {
			sim.add_edge(indices[src], indices[tgt], EdgeData::default());
		}
	}

	let any_anchor = missing < cached.len();
	for _ in 0..config.max_iterations {
		sim.update(config.time_step);
		resolve_collisions(&mut sim, config.collision_strength);
		if !any_anchor {
			recenter(&mut sim, frame.center());
		}
	}

	let mut settled = seeds;
	sim.visit_nodes(|node| {
		let i = node.index().index();
		let (x, y) = (node.x() as f64, node.y() as f64);
		if x.is_finite() && y.is_finite() {
			settled[i] = Position::new(x, y);
		}
	});

	for ((node, fixed), position) in graph.nodes().iter().zip(&cached).zip(&settled) {
		if fixed.is_none() {
			store.set(&node.id, *position);
		}
	}

	LayoutOutcome {
		placed: missing,
		iterations: config.max_iterations,
	}
}

/// Cached nodes keep their position; the rest start jittered inside their
/// tier's sector. Sectors are handed out in order of first appearance.
fn initial_positions(
	graph: &PolicyGraph,
	cached: &[Option<Position>],
	frame: Frame,
	config: &LayoutConfig,
) -> Vec<Position> {
	let mut kinds: Vec<(NodeKind, usize)> = Vec::new();
	for node in graph.nodes() {
		match kinds.iter_mut().find(|(k, _)| *k == node.kind) {
			Some((_, count)) => *count += 1,
			None => kinds.push((node.kind, 1)),
		}
	}

	let sectors = kinds.len().max(NodeKind::KNOWN.len()) as f64;
	let center = frame.center();
	let radius = frame.width.min(frame.height) * config.sector_radius_ratio;
	let mut jitter = Jitter::new(config.seed);

	graph
		.nodes()
		.iter()
		.zip(cached)
		.map(|(node, fixed)| {
			if let Some(p) = fixed {
				return *p;
			}
			let (slot, count) = kinds
				.iter()
				.enumerate()
				.find(|(_, (k, _))| *k == node.kind)
				.map(|(slot, (_, count))| (slot, *count))
				.unwrap_or((0, 1));
			let angle = (slot + 1) as f64 / sectors * 2.0 * PI;
			let spread = config.type_spread * (count as f64).sqrt();
			Position::new(
				center.x + radius * angle.cos() + (jitter.next() - 0.5) * spread,
				center.y + radius * angle.sin() + (jitter.next() - 0.5) * spread,
			)
		})
		.collect()
}

/// Pushes overlapping bodies apart. Anchors never move; a free body
/// colliding with an anchor takes the whole correction.
fn resolve_collisions(sim: &mut ForceGraph<Body, ()>, strength: f64) {
	let mut bodies = Vec::new();
	sim.visit_nodes(|node| {
		bodies.push((
			node.index(),
			node.x() as f64,
			node.y() as f64,
			node.data.user_data.radius,
			node.data.is_anchor,
		));
	});

	let mut shift = vec![(0.0f64, 0.0f64); bodies.len()];
	for i in 0..bodies.len() {
		for j in (i + 1)..bodies.len() {
			let (_, xi, yi, ri, ai) = bodies[i];
			let (_, xj, yj, rj, aj) = bodies[j];
			if ai && aj {
				continue;
			}
			let (dx, dy) = (xj - xi, yj - yi);
			let dist = (dx * dx + dy * dy).sqrt();
			let min = ri + rj;
			if dist >= min {
				continue;
			}
			let (nx, ny) = if dist < 1e-6 {
				// coincident: separate along a fixed per-pair direction
				let angle = (i * 31 + j * 17) as f64;
				(angle.cos(), angle.sin())
			} else {
				(dx / dist, dy / dist)
			};
			let overlap = (min - dist) * strength;
			let (ux, uy) = (nx * overlap, ny * overlap);
			let (wi, wj) = match (ai, aj) {
				(true, false) => (0.0, 1.0),
				(false, true) => (1.0, 0.0),
				_ => {
					let total = ri * ri + rj * rj;
					(rj * rj / total, ri * ri / total)
				}
			};
			shift[i].0 -= ux * wi;
			shift[i].1 -= uy * wi;
			shift[j].0 += ux * wj;
			shift[j].1 += uy * wj;
		}
	}

	let moves: Vec<_> = bodies
		.iter()
		.zip(&shift)
		.filter(|((_, _, _, _, anchor), (sx, sy))| !anchor && (*sx != 0.0 || *sy != 0.0))
		.map(|((idx, ..), s)| (*idx, *s))
		.collect();
	if moves.is_empty() {
		return;
	}
	sim.visit_nodes_mut(|node| {
		if let Some((_, (sx, sy))) = moves.iter().find(|(idx, _)| *idx == node.index()) {
			node.data.x += *sx as f32;
			node.data.y += *sy as f32;
		}
	});
}

/// Translates every body so the centroid sits on `center`.
fn recenter(sim: &mut ForceGraph<Body, ()>, center: Position) {
	let (mut sx, mut sy, mut n) = (0.0f64, 0.0f64, 0usize);
	sim.visit_nodes(|node| {
		sx += node.x() as f64;
		sy += node.y() as f64;
		n += 1;
	});
	if n == 0 {
		return;
	}
	let (dx, dy) = (center.x - sx / n as f64, center.y - sy / n as f64);
	sim.visit_nodes_mut(|node| {
		node.data.x += dx as f32;
		node.data.y += dy as f32;
	});
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::knowledge_graph::store::MemoryPositionStore;
	use crate::components::knowledge_graph::types::GraphData;

	fn frame() -> Frame {
		Frame::new(800.0, 600.0)
	}

	fn positions(graph: &PolicyGraph, store: &MemoryPositionStore) -> Vec<Position> {
		graph
			.nodes()
			.iter()
			.map(|n| store.get(&n.id).expect("node placed"))
			.collect()
	}

	#[test]
	fn empty_graph_is_a_noop() {
		let graph = PolicyGraph::new(&GraphData::default());
		let mut store = MemoryPositionStore::default();
		let outcome = layout(&graph, &mut store, frame(), &LayoutConfig::default());
		assert_eq!(outcome, LayoutOutcome::default());
		assert_eq!(store.len(), 0);
	}

	#[test]
	fn places_every_node_once() {
		let graph = PolicyGraph::new(&GraphData::seed());
		let mut store = MemoryPositionStore::default();
		let outcome = layout(&graph, &mut store, frame(), &LayoutConfig::default());
		assert_eq!(outcome.placed, 7);
		assert_eq!(outcome.iterations, 100);
		assert_eq!(store.len(), 7);
		for p in positions(&graph, &store) {
			assert!(p.x.is_finite() && p.y.is_finite());
		}
	}

	#[test]
	fn cached_layout_is_idempotent() {
		let graph = PolicyGraph::new(&GraphData::seed());
		let mut store = MemoryPositionStore::default();
		layout(&graph, &mut store, frame(), &LayoutConfig::default());
		let before = positions(&graph, &store);

		let outcome = layout(&graph, &mut store, frame(), &LayoutConfig::default());
		assert_eq!(outcome.iterations, 0);
		assert_eq!(positions(&graph, &store), before);
	}

	#[test]
	fn same_seed_same_layout() {
		let graph = PolicyGraph::new(&GraphData::seed());
		let (mut a, mut b) = (MemoryPositionStore::default(), MemoryPositionStore::default());
		layout(&graph, &mut a, frame(), &LayoutConfig::default());
		layout(&graph, &mut b, frame(), &LayoutConfig::default());
		assert_eq!(positions(&graph, &a), positions(&graph, &b));
	}

	#[test]
	fn cached_nodes_stay_put_while_new_ones_are_placed() {
		let graph = PolicyGraph::new(&GraphData::seed());
		let mut store = MemoryPositionStore::default();
		store.set("pii", Position::new(300.0, 300.0));
		store.set("ethics", Position::new(-20.0, 40.0));

		let outcome = layout(&graph, &mut store, frame(), &LayoutConfig::default());
		assert_eq!(outcome.placed, 5);
		assert_eq!(store.get("pii"), Some(Position::new(300.0, 300.0)));
		assert_eq!(store.get("ethics"), Some(Position::new(-20.0, 40.0)));
		assert_eq!(store.len(), 7);
	}

	#[test]
	fn settled_nodes_do_not_stack() {
		let graph = PolicyGraph::new(&GraphData::seed());
		let mut store = MemoryPositionStore::default();
		layout(&graph, &mut store, frame(), &LayoutConfig::default());
		let ps = positions(&graph, &store);
		for i in 0..ps.len() {
			for j in (i + 1)..ps.len() {
				let d = ((ps[i].x - ps[j].x).powi(2) + (ps[i].y - ps[j].y).powi(2)).sqrt();
				assert!(d > 50.0, "nodes {i} and {j} only {d} apart");
			}
		}
	}

	#[test]
	fn charge_balances_spring_at_link_distance() {
		let config = LayoutConfig::default();
		let d = config.link_distance as f32;
		let spring = 0.5 * config.spring * d;
		let repel = config.charge() * config.node_mass * config.node_mass / (d * d);
		assert!((spring - repel).abs() < 1e-3);
	}

	#[test]
	fn jitter_is_reproducible() {
		let (mut a, mut b) = (Jitter::new(7), Jitter::new(7));
		for _ in 0..10 {
			let v = a.next();
			assert!((0.0..1.0).contains(&v));
			assert_eq!(v, b.next());
		}
	}
}
