use leptos::ev::SubmitEvent;
use leptos::prelude::*;
use log::{info, warn};
use wasm_bindgen_futures::spawn_local;

use super::chat::{ChatMessage, Conversation, Sender, question_for_node};
use super::feedback::FeedbackForm;
use crate::api::ApiClient;
use crate::components::knowledge_graph::{GraphData, HighlightSet, KnowledgeGraph, NodeKind};
use crate::config::AppConfig;

fn now() -> String {
	js_sys::Date::new_0().to_locale_time_string("en-US").into()
}

#[component]
fn MessageBubble(message: ChatMessage, on_feedback: Callback<u32>) -> impl IntoView {
	let id = message.id;
	let class = match message.sender {
		Sender::User => "message message-user",
		Sender::Ai => "message message-ai",
	};
	let rateable = message.sender == Sender::Ai;
	let references = message
		.references
		.iter()
		.map(|r| view! { <span class="reference-chip">{r.to_string()}</span> })
		.collect_view();

	view! {
		<div class=class>
			<p class="message-text">{message.text}</p>
			<div class="message-references">{references}</div>
			<div class="message-meta">
				<span class="message-time">{message.timestamp}</span>
				{rateable
					.then(|| {
						view! {
							<button class="feedback-button" on:click=move |_| on_feedback.run(id)>
								"Feedback"
							</button>
						}
					})}
			</div>
		</div>
	}
}

#[component]
fn Legend() -> impl IntoView {
	let items = NodeKind::KNOWN
		.into_iter()
		.map(|kind| {
			view! {
				<li>
					<span class="legend-swatch" style=format!("background: {}", kind.palette().fill) />
					{kind.name()}
				</li>
			}
		})
		.collect_view();
	view! { <ul class="graph-legend">{items}</ul> }
}

/// Chat assistant beside the guidelines graph.
///
/// Answers highlight the nodes they are about; clicking a node drafts a
/// question about it. The seed graph is shown until the backend provides a
/// non-empty one.
#[component]
pub fn GuidelinesGuru() -> impl IntoView {
	let client = ApiClient::new(use_context::<AppConfig>().unwrap_or_default());
	let conversation = RwSignal::new(Conversation::new(now()));
	let input = RwSignal::new(String::new());
	let typing = RwSignal::new(false);
	let graph = RwSignal::new(GraphData::seed());
	let highlight = RwSignal::new(HighlightSet::new());
	let feedback_target = RwSignal::new(None::<u32>);

	{
		let client = client.clone();
		spawn_local(async move {
			match client.fetch_graph().await {
				Ok(data) if !data.nodes.is_empty() => graph.set(data),
				Ok(_) => warn!("guru: backend graph is empty, keeping seed graph"),
				Err(e) => warn!("guru: keeping seed graph: {e}"),
			}
		});
	}

	let on_submit = move |ev: SubmitEvent| {
		ev.prevent_default();
		let question = input.get_untracked();
		if question.trim().is_empty() {
			return;
		}
		let history = conversation.with_untracked(Conversation::history);
		conversation.update(|c| {
			c.push_user(&question, now());
		});
		input.set(String::new());
		typing.set(true);
		highlight.set(HighlightSet::new());

		let client = client.clone();
		spawn_local(async move {
			let result = client.query(&question, &history).await;
			typing.set(false);
			match result {
				Ok(response) => {
					let nodes = conversation
						.try_update(|c| {
							let answer = c.push_ai_answer(response, now());
							answer.highlighted_nodes.iter().cloned().collect::<HighlightSet>()
						})
						.unwrap_or_default();
					info!("guru: answer received, {} nodes highlighted", nodes.len());
					if !nodes.is_empty() {
						highlight.set(nodes);
					}
				}
				Err(e) => {
					warn!("guru: query failed: {e}");
					conversation.update(|c| {
						c.push_ai_error(now());
					});
				}
			}
		});
	};

	let on_node_click = Callback::new(move |id: String| {
		let node = graph.with_untracked(|g| g.nodes.iter().find(|n| n.id == id).cloned());
		if let Some(node) = node {
			input.set(question_for_node(&node));
		}
	});

	let on_feedback = Callback::new(move |id: u32| feedback_target.set(Some(id)));

	view! {
		<div class="guru">
			<section class="guru-chat">
				<header class="guru-header">
					<h2>"Guidelines Guru"</h2>
				</header>
				<div class="guru-messages">
					{move || {
						conversation
							.with(|c| {
								c.messages()
									.iter()
									.cloned()
									.map(|message| view! { <MessageBubble message=message on_feedback=on_feedback /> })
									.collect_view()
							})
					}}
					<Show when=move || typing.get()>
						<div class="typing-indicator">"Guru is typing..."</div>
					</Show>
				</div>
				<form class="guru-input" on:submit=on_submit>
					<input
						type="text"
						placeholder="Ask about our AI guidelines..."
						prop:value=move || input.get()
						on:input=move |ev| input.set(event_target_value(&ev))
					/>
					<button type="submit" prop:disabled=move || input.get().trim().is_empty()>
						"Send"
					</button>
				</form>
			</section>
			<section class="guru-graph">
				<KnowledgeGraph data=graph highlighted=highlight on_node_click=on_node_click />
				<Legend />
			</section>
			{move || {
				feedback_target
					.get()
					.map(|id| {
						view! {
							<FeedbackForm
								message_id=id
								on_close=Callback::new(move |()| feedback_target.set(None))
							/>
						}
					})
			}}
		</div>
	}
}
