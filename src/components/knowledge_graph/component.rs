use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use leptos::ev;
use leptos::prelude::*;
use log::{debug, info};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent};

use super::render;
use super::state::{DragEnd, KnowledgeGraphState};
use super::store::SharedPositionStore;
use super::types::{GraphData, HighlightSet};

type SharedState = Rc<RefCell<Option<KnowledgeGraphState<SharedPositionStore>>>>;

fn canvas_point(canvas: &HtmlCanvasElement, ev: &MouseEvent) -> (f64, f64) {
	let rect = canvas.get_bounding_client_rect();
	(
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	)
}

fn surface_size(canvas: &HtmlCanvasElement, width: Option<f64>, height: Option<f64>) -> (f64, f64) {
	let parent = canvas.parent_element();
	(
		width.unwrap_or_else(|| {
			parent
				.as_ref()
				.map(|p| p.client_width() as f64)
				.filter(|w| *w > 0.0)
				.unwrap_or(800.0)
		}),
		height.unwrap_or_else(|| {
			parent
				.as_ref()
				.map(|p| p.client_height() as f64)
				.filter(|h| *h > 0.0)
				.unwrap_or(600.0)
		}),
	)
}

/// Canvas view of the guidelines graph.
///
/// Node positions live in the [`SharedPositionStore`] from context (a fresh
/// one if none was provided), so remounting keeps the arrangement. Clicking a
/// node forwards its id to `on_node_click`.
#[component]
pub fn KnowledgeGraph(
	#[prop(into)] data: Signal<GraphData>,
	#[prop(into)] highlighted: Signal<HighlightSet>,
	#[prop(into)] on_node_click: Callback<String>,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let store = use_context::<SharedPositionStore>().unwrap_or_default();
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: SharedState = Rc::new(RefCell::new(None));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_listener: Arc<Mutex<Option<WindowListenerHandle>>> = Arc::new(Mutex::new(None));
	let alive = Arc::new(AtomicBool::new(true));

	{
		let (alive, resize_listener) = (alive.clone(), resize_listener.clone());
		on_cleanup(move || {
			alive.store(false, Ordering::Relaxed);
			let handle = resize_listener
				.lock()
				.unwrap_or_else(PoisonError::into_inner)
				.take();
			if let Some(handle) = handle {
				handle.remove();
			}
		});
	}

	let (state_init, animate_init, resize_listener_init, alive_init) =
		(state.clone(), animate.clone(), resize_listener.clone(), alive.clone());
	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		if state_init.borrow().is_some() {
			return;
		}
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = surface_size(&canvas, width, height);
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let Some(ctx) = canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
		else {
			log::warn!("knowledge graph: 2d context unavailable");
			return;
		};

		let initial = data.get_untracked();
		info!(
			"knowledge graph: mounting with {} nodes, {} edges, {} cached positions",
			initial.nodes.len(),
			initial.edges.len(),
			store.len()
		);
		let mut graph_state = KnowledgeGraphState::new(&initial, store.clone(), w, h);
		graph_state.set_highlight(&highlighted.get_untracked());
		*state_init.borrow_mut() = Some(graph_state);

		let (state_resize, canvas_resize, alive_resize) =
			(state_init.clone(), canvas.clone(), alive_init.clone());
		let handle = window_event_listener(ev::resize, move |_| {
			if !alive_resize.load(Ordering::Relaxed) {
				return;
			}
			let (nw, nh) = surface_size(&canvas_resize, width, height);
			canvas_resize.set_width(nw as u32);
			canvas_resize.set_height(nh as u32);
			if let Some(ref mut s) = *state_resize.borrow_mut() {
				s.resize(nw, nh);
			}
		});
		// listener is removed by the component's cleanup, not this effect's
		let previous = resize_listener_init
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.replace(handle);
		if let Some(previous) = previous {
			previous.remove();
		}

		let (state_anim, animate_inner, alive_anim) =
			(state_init.clone(), animate_init.clone(), alive_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if !alive_anim.load(Ordering::Relaxed) {
				debug!("knowledge graph: unmounted, stopping frame loop");
				return;
			}
			if let Some(ref mut s) = *state_anim.borrow_mut() {
				s.tick(0.016);
				render::render(s, &ctx);
			}
			if let (Some(cb), Some(win)) = (&*animate_inner.borrow(), web_sys::window()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let state_data = state.clone();
	Effect::new(move |_| {
		let next = data.get();
		if let Some(ref mut s) = *state_data.borrow_mut() {
			s.set_graph(&next);
		}
	});

	let state_hl = state.clone();
	Effect::new(move |_| {
		let set = highlighted.get();
		if let Some(ref mut s) = *state_hl.borrow_mut() {
			s.set_highlight(&set);
		}
	});

	let canvas_el = move || -> Option<HtmlCanvasElement> { canvas_ref.get().map(Into::into) };

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some(canvas) = canvas_el() else {
			return;
		};
		let (x, y) = canvas_point(&canvas, &ev);
		if let Some(ref mut s) = *state_md.borrow_mut() {
			match s.node_at_position(x, y) {
				Some(idx) => s.begin_drag(idx, x, y),
				None => s.begin_pan(x, y),
			}
		}
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some(canvas) = canvas_el() else {
			return;
		};
		let (x, y) = canvas_point(&canvas, &ev);
		if let Some(ref mut s) = *state_mm.borrow_mut() {
			s.drag_to(x, y);
			s.pan_to(x, y);
		}
	};

	let state_mu = state.clone();
	let on_mouseup = move |_: MouseEvent| {
		let ended = match *state_mu.borrow_mut() {
			Some(ref mut s) => {
				s.end_pan();
				s.end_drag()
			}
			None => DragEnd::None,
		};
		// run the host callback with the state borrow released
		if let DragEnd::Click(id) = ended {
			on_node_click.run(id);
		}
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_ml.borrow_mut() {
			s.end_drag();
			s.end_pan();
		}
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some(canvas) = canvas_el() else {
			return;
		};
		let (x, y) = canvas_point(&canvas, &ev);
		if let Some(ref mut s) = *state_wh.borrow_mut() {
			let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
			s.zoom_at(x, y, factor);
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="knowledge-graph-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			style="display: block; cursor: grab;"
		/>
	}
}
