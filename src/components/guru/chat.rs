//! Conversation model for the guidelines assistant.
//!
//! Messages are append-only. Ids are `len + 1`, so the welcome message is
//! always id 1 and is never sent back to the backend as history.

use serde::Deserialize;

use crate::api::{FeedbackRequest, HistoryTurn, QueryResponse};
use crate::components::knowledge_graph::{NodeKind, PolicyNode};

pub const WELCOME_ID: u32 = 1;

pub const WELCOME: &str = "Welcome to Guidelines Guru! I'm here to help you understand and navigate our AI guidelines and policies. What would you like to know?";
pub const NO_ANSWER: &str = "I'm sorry, I couldn't find an answer to that question.";
pub const ERROR_REPLY: &str =
	"I'm sorry, there was an error processing your request. Please try again.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sender {
	User,
	Ai,
}

impl Sender {
	/// Role name the query endpoint expects.
	pub fn role(self) -> &'static str {
		match self {
			Sender::User => "user",
			Sender::Ai => "assistant",
		}
	}
}

/// Policy section an answer cites.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
	pub policy_id: String,
	pub section: String,
}

impl std::fmt::Display for Reference {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{} - {}", self.policy_id, self.section)
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatMessage {
	pub id: u32,
	pub sender: Sender,
	pub text: String,
	/// Wall-clock time as shown to the user.
	pub timestamp: String,
	pub references: Vec<Reference>,
	pub highlighted_nodes: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Conversation {
	messages: Vec<ChatMessage>,
}

impl Conversation {
	/// A conversation holding only the welcome message.
	pub fn new(timestamp: impl Into<String>) -> Self {
		Self {
			messages: vec![ChatMessage {
				id: WELCOME_ID,
				sender: Sender::Ai,
				text: WELCOME.to_owned(),
				timestamp: timestamp.into(),
				references: Vec::new(),
				highlighted_nodes: Vec::new(),
			}],
		}
	}

	pub fn messages(&self) -> &[ChatMessage] {
		&self.messages
	}

	/// Prior turns for a query, oldest first, without the welcome message.
	pub fn history(&self) -> Vec<HistoryTurn> {
		self.messages
			.iter()
			.filter(|m| m.id != WELCOME_ID)
			.map(|m| HistoryTurn {
				role: m.sender.role(),
				content: m.text.clone(),
			})
			.collect()
	}

	fn push(&mut self, sender: Sender, text: String, timestamp: String) -> &mut ChatMessage {
		let id = self.messages.len() as u32 + 1;
		self.messages.push(ChatMessage {
			id,
			sender,
			text,
			timestamp,
			references: Vec::new(),
			highlighted_nodes: Vec::new(),
		});
		let last = self.messages.len() - 1;
		&mut self.messages[last]
	}

	/// Appends a user question. Blank input is ignored and returns `None`.
	pub fn push_user(&mut self, text: &str, timestamp: impl Into<String>) -> Option<&ChatMessage> {
		if text.trim().is_empty() {
			return None;
		}
		Some(&*self.push(Sender::User, text.to_owned(), timestamp.into()))
	}

	/// Appends the assistant's answer, keeping the ids it highlighted.
	pub fn push_ai_answer(&mut self, response: QueryResponse, timestamp: impl Into<String>) -> &ChatMessage {
		let text = response
			.answer
			.filter(|a| !a.is_empty())
			.unwrap_or_else(|| NO_ANSWER.to_owned());
		let message = self.push(Sender::Ai, text, timestamp.into());
		message.references = response.references;
		message.highlighted_nodes = response.highlighted_nodes;
		message
	}

	pub fn push_ai_error(&mut self, timestamp: impl Into<String>) -> &ChatMessage {
		self.push(Sender::Ai, ERROR_REPLY.to_owned(), timestamp.into())
	}
}

/// How an assistant answer missed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeedbackKind {
	Irrelevant,
	Outdated,
	Unclear,
}

impl FeedbackKind {
	pub const ALL: [FeedbackKind; 3] = [
		FeedbackKind::Irrelevant,
		FeedbackKind::Outdated,
		FeedbackKind::Unclear,
	];

	pub fn as_str(self) -> &'static str {
		match self {
			FeedbackKind::Irrelevant => "irrelevant",
			FeedbackKind::Outdated => "outdated",
			FeedbackKind::Unclear => "unclear",
		}
	}

	pub fn title(self) -> &'static str {
		match self {
			FeedbackKind::Irrelevant => "Irrelevant answer",
			FeedbackKind::Outdated => "Outdated policy",
			FeedbackKind::Unclear => "Unclear response",
		}
	}

	pub fn parse(value: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|k| k.as_str() == value)
	}

	/// Feedback payload rating message `message_id`.
	pub fn request(self, message_id: u32, comment: impl Into<String>) -> FeedbackRequest {
		FeedbackRequest {
			message_id: message_id.to_string(),
			feedback_type: self.as_str().to_owned(),
			comment: comment.into(),
		}
	}
}

/// Question put in the input box when a node is clicked.
pub fn question_for_node(node: &PolicyNode) -> String {
	let mut question = format!("Tell me about {}", node.label);
	if node.kind != NodeKind::Unknown {
		question.push(' ');
		question.push_str(&node.kind.name().to_lowercase());
	}
	if let Some(description) = node.description.as_deref().filter(|d| !d.is_empty()) {
		question.push_str(&format!(". The description says: \"{description}\""));
	}
	question
}

#[cfg(test)]
mod tests {
	use rstest::rstest;

	use super::*;

	#[test]
	fn starts_with_welcome() {
		let chat = Conversation::new("10:00");
		assert_eq!(chat.messages().len(), 1);
		assert_eq!(chat.messages()[0].id, WELCOME_ID);
		assert_eq!(chat.messages()[0].sender, Sender::Ai);
		assert!(chat.history().is_empty());
	}

	#[test]
	fn ids_follow_length() {
		let mut chat = Conversation::new("10:00");
		assert_eq!(chat.push_user("What is PII?", "10:01").map(|m| m.id), Some(2));
		let answer = QueryResponse {
			answer: Some("Personal data.".into()),
			highlighted_nodes: vec!["pii".into()],
			..Default::default()
		};
		let reply = chat.push_ai_answer(answer, "10:01");
		assert_eq!(reply.id, 3);
		assert_eq!(reply.highlighted_nodes, vec!["pii"]);
		assert_eq!(chat.push_ai_error("10:02").id, 4);
	}

	#[test]
	fn blank_input_is_ignored() {
		let mut chat = Conversation::new("10:00");
		assert!(chat.push_user("  \n", "10:01").is_none());
		assert_eq!(chat.messages().len(), 1);
	}

	#[test]
	fn history_skips_welcome_and_maps_roles() {
		let mut chat = Conversation::new("10:00");
		chat.push_user("What is PII?", "10:01");
		chat.push_ai_answer(
			QueryResponse {
				answer: Some("Personal data.".into()),
				..Default::default()
			},
			"10:01",
		);
		let history = chat.history();
		assert_eq!(history.len(), 2);
		assert_eq!(history[0].role, "user");
		assert_eq!(history[1].role, "assistant");
		assert_eq!(history[1].content, "Personal data.");
	}

	#[test]
	fn missing_answer_gets_fallback_text() {
		let mut chat = Conversation::new("10:00");
		assert_eq!(chat.push_ai_answer(QueryResponse::default(), "10:01").text, NO_ANSWER);
		assert_eq!(chat.push_ai_error("10:01").text, ERROR_REPLY);
	}

	#[test]
	fn reference_chip_text() {
		let reference = Reference {
			policy_id: "POL-7".into(),
			section: "3.2".into(),
		};
		assert_eq!(reference.to_string(), "POL-7 - 3.2");
	}

	#[rstest]
	#[case(PolicyNode::new("gdpr", "GDPR", NodeKind::Category), "Tell me about GDPR category")]
	#[case(PolicyNode::new("x", "Misc", NodeKind::Unknown), "Tell me about Misc")]
	#[case(
		PolicyNode::new("pii", "PII", NodeKind::Subcategory).with_description("Personal data"),
		"Tell me about PII subcategory. The description says: \"Personal data\""
	)]
	#[case(
		PolicyNode::new("r1", "No faces", NodeKind::ProductType).with_description(""),
		"Tell me about No faces producttype"
	)]
	fn node_questions(#[case] node: PolicyNode, #[case] expected: &str) {
		assert_eq!(question_for_node(&node), expected);
	}

	#[rstest]
	#[case("irrelevant", Some(FeedbackKind::Irrelevant))]
	#[case("unclear", Some(FeedbackKind::Unclear))]
	#[case("", None)]
	fn feedback_kinds_parse(#[case] value: &str, #[case] expected: Option<FeedbackKind>) {
		assert_eq!(FeedbackKind::parse(value), expected);
	}

	#[test]
	fn feedback_payload_carries_message_id_as_text() {
		let request = FeedbackKind::Outdated.request(3, "Superseded by v2");
		assert_eq!(request.message_id, "3");
		assert_eq!(request.feedback_type, "outdated");
		assert_eq!(request.comment, "Superseded by v2");
	}
}
