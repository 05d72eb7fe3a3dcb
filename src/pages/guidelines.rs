use leptos::prelude::*;

use crate::components::guru::GuidelinesGuru;

/// Guidelines explorer: policy graph plus the chat assistant.
#[component]
pub fn Guidelines() -> impl IntoView {
	view! {
		<div class="guidelines-page">
			<div class="page-header">
				<h1>"AI Guidelines"</h1>
				<p class="subtitle">
					"Ask about a policy or click a node. Drag nodes to reposition, scroll to zoom, drag the background to pan."
				</p>
			</div>
			<GuidelinesGuru />
		</div>
	}
}
