use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::highlight::{EdgeState, NEUTRAL_STROKE, NodeEmphasis};
use super::state::KnowledgeGraphState;
use super::store::PositionStore;

const BACKGROUND: &str = "#121212";
const CORNER_RADIUS: f64 = 5.0;
const LABEL_LINE_HEIGHT: f64 = 14.0;
const ARROW_SIZE: f64 = 8.0;
const EDGE_LABEL: &str = "#b0b0b0";
const EDGE_LABEL_FONT: &str = "10px sans-serif";

pub fn render<S: PositionStore>(state: &KnowledgeGraphState<S>, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);
	draw_edges(state, ctx);
	draw_nodes(state, ctx);
	ctx.restore();
}

fn edge_rank(state: EdgeState) -> u8 {
	match state {
		EdgeState::Background => 0,
		EdgeState::Adjacent => 1,
		EdgeState::Active => 2,
	}
}

fn draw_edges<S: PositionStore>(state: &KnowledgeGraphState<S>, ctx: &CanvasRenderingContext2d) {
	let styles = &state.projection().edges;
	let mut order: Vec<usize> = (0..styles.len()).collect();
	order.sort_by_key(|&e| edge_rank(styles[e].state));

	let (dash, gap) = (8.0, 4.0);
	let dash_offset = -(state.flow_time * 30.0) % (dash + gap);

	for e in order {
		let Some(curve) = state.curve(e) else {
			continue;
		};
		let style = styles[e];
		let (ux, uy) = curve.end_direction();
		// stop the stroke where the arrowhead begins
		let (stop_x, stop_y) = (curve.end.x - ux * ARROW_SIZE, curve.end.y - uy * ARROW_SIZE);

		ctx.set_global_alpha(style.opacity);
		ctx.set_stroke_style_str(style.stroke);
		ctx.set_line_width(style.width);
		if style.animated {
			let _ = ctx.set_line_dash(&js_sys::Array::of2(
				&JsValue::from_f64(dash),
				&JsValue::from_f64(gap),
			));
			ctx.set_line_dash_offset(dash_offset);
		} else {
			let _ = ctx.set_line_dash(&js_sys::Array::new());
		}
		ctx.begin_path();
		ctx.move_to(curve.start.x, curve.start.y);
		ctx.quadratic_curve_to(curve.control.x, curve.control.y, stop_x, stop_y);
		ctx.stroke();

		let _ = ctx.set_line_dash(&js_sys::Array::new());
		ctx.set_fill_style_str(if style.accent_arrow { style.stroke } else { NEUTRAL_STROKE });
		let (back_x, back_y) = (curve.end.x - ux * ARROW_SIZE, curve.end.y - uy * ARROW_SIZE);
		let (px, py) = (-uy * ARROW_SIZE * 0.5, ux * ARROW_SIZE * 0.5);
		ctx.begin_path();
		ctx.move_to(curve.end.x, curve.end.y);
		ctx.line_to(back_x + px, back_y + py);
		ctx.line_to(back_x - px, back_y - py);
		ctx.close_path();
		ctx.fill();

		if let Some(label) = state.graph().edges()[e].label.as_deref().filter(|l| !l.is_empty()) {
			let mid = curve.midpoint();
			ctx.set_fill_style_str(EDGE_LABEL);
			ctx.set_font(EDGE_LABEL_FONT);
			ctx.set_text_align("center");
			ctx.set_text_baseline("middle");
			let _ = ctx.fill_text(label, mid.x, mid.y);
		}
	}
	let _ = ctx.set_line_dash(&js_sys::Array::new());
	ctx.set_global_alpha(1.0);
}

fn rounded_rect(ctx: &CanvasRenderingContext2d, x: f64, y: f64, w: f64, h: f64, r: f64) {
	ctx.begin_path();
	ctx.move_to(x + r, y);
	let _ = ctx.arc_to(x + w, y, x + w, y + h, r);
	let _ = ctx.arc_to(x + w, y + h, x, y + h, r);
	let _ = ctx.arc_to(x, y + h, x, y, r);
	let _ = ctx.arc_to(x, y, x + w, y, r);
	ctx.close_path();
}

fn draw_nodes<S: PositionStore>(state: &KnowledgeGraphState<S>, ctx: &CanvasRenderingContext2d) {
	let styles = &state.projection().nodes;
	let nodes = state.graph().nodes();
	let mut order: Vec<usize> = (0..nodes.len()).collect();
	order.sort_by_key(|&i| styles[i].emphasis == NodeEmphasis::Focused);

	for i in order {
		let node = &nodes[i];
		let style = styles[i];
		let p = state.position(i);
		let (w, h) = node.size();
		let (x, y) = (p.x - w / 2.0, p.y - h / 2.0);
		let palette = node.kind.palette();

		ctx.set_global_alpha(style.opacity);
		if style.glow {
			ctx.set_shadow_color(palette.fill);
			ctx.set_shadow_blur(12.0);
		}
		rounded_rect(ctx, x, y, w, h, CORNER_RADIUS);
		ctx.set_fill_style_str(palette.fill);
		ctx.fill();
		ctx.set_shadow_blur(0.0);
		ctx.set_stroke_style_str(palette.stroke);
		ctx.set_line_width(style.stroke_width);
		ctx.stroke();

		ctx.set_fill_style_str("white");
		ctx.set_text_align("center");
		ctx.set_text_baseline("top");
		ctx.set_font("bold 8px sans-serif");
		let _ = ctx.fill_text(&node.kind.name().to_uppercase(), p.x, y + 3.0);

		let weight = if style.bold { "bold " } else { "" };
		ctx.set_font(&format!("{weight}12px sans-serif"));
		ctx.set_text_baseline("middle");
		let lines = wrap_label(&node.label, w - 10.0, |s| {
			ctx.measure_text(s).map(|m| m.width()).unwrap_or(0.0)
		});
		let top = p.y + 3.0 - (lines.len() as f64 - 1.0) * LABEL_LINE_HEIGHT / 2.0;
		for (n, line) in lines.iter().enumerate() {
			let _ = ctx.fill_text(line, p.x, top + n as f64 * LABEL_LINE_HEIGHT);
		}
	}
	ctx.set_global_alpha(1.0);
}

/// Greedy word wrap. A single word wider than `max_width` gets its own line.
pub fn wrap_label(label: &str, max_width: f64, measure: impl Fn(&str) -> f64) -> Vec<String> {
	let mut lines = Vec::new();
	let mut line = String::new();
	for word in label.split_whitespace() {
		if line.is_empty() {
			line.push_str(word);
			continue;
		}
		let candidate = format!("{line} {word}");
		if measure(&candidate) > max_width {
			lines.push(std::mem::replace(&mut line, word.to_owned()));
		} else {
			line = candidate;
		}
	}
	if !line.is_empty() {
		lines.push(line);
	}
	lines
}

#[cfg(test)]
mod tests {
	use super::*;

	fn chars(s: &str) -> f64 {
		s.chars().count() as f64
	}

	#[test]
	fn wraps_on_word_boundaries() {
		assert_eq!(
			wrap_label("GDPR Compliance Review Board", 16.0, chars),
			vec!["GDPR Compliance", "Review Board"]
		);
	}

	#[test]
	fn short_labels_stay_on_one_line() {
		assert_eq!(wrap_label("Privacy", 90.0, chars), vec!["Privacy"]);
		assert!(wrap_label("   ", 90.0, chars).is_empty());
	}

	#[test]
	fn overlong_word_is_not_split() {
		assert_eq!(
			wrap_label("Pseudonymisation rules", 5.0, chars),
			vec!["Pseudonymisation", "rules"]
		);
	}
}
