use leptos::ev::SubmitEvent;
use leptos::prelude::*;
use log::{info, warn};
use wasm_bindgen_futures::spawn_local;

use super::chat::FeedbackKind;
use crate::api::ApiClient;
use crate::config::AppConfig;

/// Rating form for one assistant message. Submitting closes the form
/// whether or not the backend accepts it.
#[component]
pub fn FeedbackForm(message_id: u32, #[prop(into)] on_close: Callback<()>) -> impl IntoView {
	let client = ApiClient::new(use_context::<AppConfig>().unwrap_or_default());
	let kind = RwSignal::new(None::<FeedbackKind>);
	let comment = RwSignal::new(String::new());

	let on_submit = move |ev: SubmitEvent| {
		ev.prevent_default();
		let Some(kind) = kind.get_untracked() else {
			return;
		};
		let request = kind.request(message_id, comment.get_untracked());
		let client = client.clone();
		spawn_local(async move {
			match client.submit_feedback(&request).await {
				Ok(()) => info!(
					"feedback: {} recorded for message {}",
					request.feedback_type, request.message_id
				),
				Err(e) => warn!("feedback: submit failed: {e}"),
			}
		});
		on_close.run(());
	};

	let choices = FeedbackKind::ALL
		.into_iter()
		.map(|choice| {
			view! {
				<label class="feedback-choice">
					<input
						type="radio"
						name="feedback-kind"
						value=choice.as_str()
						prop:checked=move || kind.get() == Some(choice)
						on:change=move |ev| kind.set(FeedbackKind::parse(&event_target_value(&ev)))
					/>
					{choice.title()}
				</label>
			}
		})
		.collect_view();

	view! {
		<div class="feedback-backdrop">
			<form class="feedback-form" on:submit=on_submit>
				<h3>"Provide Feedback"</h3>
				<p class="feedback-hint">
					"Your feedback helps us improve the accuracy and relevance of our responses."
				</p>
				<div class="feedback-choices">{choices}</div>
				<textarea
					class="feedback-comment"
					rows="3"
					placeholder="Additional comments"
					prop:value=move || comment.get()
					on:input=move |ev| comment.set(event_target_value(&ev))
				/>
				<div class="feedback-actions">
					<button type="button" on:click=move |_| on_close.run(())>
						"Cancel"
					</button>
					<button type="submit" prop:disabled=move || kind.get().is_none()>
						"Submit"
					</button>
				</div>
			</form>
		</div>
	}
}
