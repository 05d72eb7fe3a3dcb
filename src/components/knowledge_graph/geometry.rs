//! Edge routing between node boxes.

use super::types::Position;

/// Bend of an edge: arc radius as a multiple of the chord length.
const ARC_RATIO: f64 = 1.2;

/// A curved edge from the source box outline to the target box outline,
/// drawn as a quadratic curve through `control`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeCurve {
	pub start: Position,
	pub control: Position,
	pub end: Position,
}

impl EdgeCurve {
	/// Point on the curve halfway between its ends. Edge labels sit here.
	pub fn midpoint(&self) -> Position {
		Position::new(
			0.25 * self.start.x + 0.5 * self.control.x + 0.25 * self.end.x,
			0.25 * self.start.y + 0.5 * self.control.y + 0.25 * self.end.y,
		)
	}

	/// Unit tangent at `end`, pointing into the target. Arrowheads follow it.
	pub fn end_direction(&self) -> (f64, f64) {
		let (dx, dy) = (self.end.x - self.control.x, self.end.y - self.control.y);
		let len = (dx * dx + dy * dy).sqrt();
		if len < 1e-9 {
			(1.0, 0.0)
		} else {
			(dx / len, dy / len)
		}
	}
}

/// Where the ray from `center` in direction `(ux, uy)` leaves an axis-aligned
/// box of half-extents `(hw, hh)`.
pub fn box_exit(center: Position, hw: f64, hh: f64, ux: f64, uy: f64) -> Position {
	let tx = if ux.abs() < 1e-12 { f64::INFINITY } else { hw / ux.abs() };
	let ty = if uy.abs() < 1e-12 { f64::INFINITY } else { hh / uy.abs() };
	let t = tx.min(ty);
	if !t.is_finite() {
		return center;
	}
	Position::new(center.x + ux * t, center.y + uy * t)
}

/// Routes an edge between two boxes given their centres and sizes.
///
/// Returns `None` when the boxes overlap so much that the outline points
/// cross over; nothing sensible can be drawn then.
pub fn route_edge(
	source: Position,
	source_size: (f64, f64),
	target: Position,
	target_size: (f64, f64),
) -> Option<EdgeCurve> {
	let (dx, dy) = (target.x - source.x, target.y - source.y);
	let dist = (dx * dx + dy * dy).sqrt();
	if dist < 1e-6 {
		return None;
	}
	let (ux, uy) = (dx / dist, dy / dist);
	let start = box_exit(source, source_size.0 / 2.0, source_size.1 / 2.0, ux, uy);
	let end = box_exit(target, target_size.0 / 2.0, target_size.1 / 2.0, -ux, -uy);

	let (cx, cy) = (end.x - start.x, end.y - start.y);
	let chord = (cx * cx + cy * cy).sqrt();
	if chord < 1e-6 || cx * ux + cy * uy <= 0.0 {
		return None;
	}

	// Sagitta of a circular arc of radius ARC_RATIO * chord; a quadratic
	// control point at twice the sagitta puts the curve's apex on the arc.
	let r = ARC_RATIO * chord;
	let half = chord / 2.0;
	let sagitta = r - (r * r - half * half).sqrt();
	// bulge to the left of travel in screen space (y down)
	let (nx, ny) = (cy / chord, -cx / chord);
	let mid = Position::new((start.x + end.x) / 2.0, (start.y + end.y) / 2.0);
	let control = Position::new(mid.x + nx * 2.0 * sagitta, mid.y + ny * 2.0 * sagitta);

	Some(EdgeCurve {
		start,
		control,
		end,
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	fn close(a: Position, b: Position) -> bool {
		(a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
	}

	#[test]
	fn horizontal_edge_leaves_through_the_sides() {
		let curve = route_edge(
			Position::new(0.0, 0.0),
			(140.0, 60.0),
			Position::new(400.0, 0.0),
			(100.0, 40.0),
		)
		.unwrap();
		assert!(close(curve.start, Position::new(70.0, 0.0)));
		assert!(close(curve.end, Position::new(350.0, 0.0)));
		// bulges upwards on screen when travelling right
		assert!(curve.control.y < 0.0);
	}

	#[test]
	fn midpoint_lies_between_chord_and_control() {
		let curve = route_edge(
			Position::new(0.0, 0.0),
			(140.0, 60.0),
			Position::new(400.0, 0.0),
			(100.0, 40.0),
		)
		.unwrap();
		let mid = curve.midpoint();
		assert!((mid.x - (curve.start.x + curve.end.x) / 2.0).abs() < 1e-9);
		assert!(mid.y < 0.0 && mid.y > curve.control.y);
	}

	#[test]
	fn steep_edge_leaves_through_top_and_bottom() {
		let curve = route_edge(
			Position::new(0.0, 0.0),
			(100.0, 40.0),
			Position::new(10.0, 300.0),
			(100.0, 40.0),
		)
		.unwrap();
		assert!((curve.start.y - 20.0).abs() < 1e-9);
		assert!((curve.end.y - 280.0).abs() < 1e-9);
	}

	#[test]
	fn arrow_points_towards_target() {
		let curve = route_edge(
			Position::new(0.0, 0.0),
			(100.0, 40.0),
			Position::new(300.0, 200.0),
			(100.0, 40.0),
		)
		.unwrap();
		let (ux, uy) = curve.end_direction();
		assert!(ux > 0.0 && uy > 0.0);
		assert!(((ux * ux + uy * uy) - 1.0).abs() < 1e-9);
	}

	#[test]
	fn overlapping_boxes_are_not_routed() {
		assert!(route_edge(
			Position::new(0.0, 0.0),
			(140.0, 60.0),
			Position::new(20.0, 5.0),
			(140.0, 60.0),
		)
		.is_none());
		assert!(route_edge(Position::default(), (10.0, 10.0), Position::default(), (10.0, 10.0)).is_none());
	}
}
