//! Client for the guidelines backend: graph fetch, chat query, feedback.
//!
//! Calls are fire-and-forget from the UI's point of view: no retry, no
//! timeout, no cancellation. Callers decide how to degrade on error.

use gloo_net::http::{Request, Response};
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::components::guru::chat::Reference;
use crate::components::knowledge_graph::{GraphData, NodeKind, PolicyEdge, PolicyNode};
use crate::config::AppConfig;

#[derive(Debug, Error)]
pub enum ApiError {
	#[error("request to {url} failed: {message}")]
	Network { url: String, message: String },
	#[error("{url} answered with HTTP {status}")]
	Status { url: String, status: u16 },
	#[error("could not decode response from {url}: {source}")]
	Decode {
		url: String,
		#[source]
		source: serde_json::Error,
	},
}

/// Missing and `null` both decode to the default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
	D: Deserializer<'de>,
	T: Default + Deserialize<'de>,
{
	Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[derive(Debug, Default, Deserialize)]
struct WireGraph {
	#[serde(default, deserialize_with = "null_as_default")]
	nodes: Vec<WireNode>,
	#[serde(default, deserialize_with = "null_as_default")]
	edges: Vec<WireEdge>,
}

#[derive(Debug, Deserialize)]
struct WireNode {
	id: String,
	#[serde(default, deserialize_with = "null_as_default")]
	data: WireNodeData,
}

#[derive(Debug, Default, Deserialize)]
struct WireNodeData {
	#[serde(default)]
	label: Option<String>,
	#[serde(rename = "type", default)]
	kind: Option<String>,
	#[serde(default)]
	description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireEdge {
	#[serde(default)]
	id: Option<String>,
	source: String,
	target: String,
	#[serde(default)]
	label: Option<String>,
}

impl From<WireGraph> for GraphData {
	fn from(wire: WireGraph) -> Self {
		let nodes = wire
			.nodes
			.into_iter()
			.map(|n| {
				let kind = n.data.kind.as_deref().map(NodeKind::parse).unwrap_or_default();
				let node = PolicyNode::new(n.id, n.data.label.unwrap_or_default(), kind);
				match n.data.description {
					Some(d) => node.with_description(d),
					None => node,
				}
			})
			.collect();
		let edges = wire
			.edges
			.into_iter()
			.map(|e| {
				let id = e.id.unwrap_or_else(|| format!("{}-{}", e.source, e.target));
				PolicyEdge {
					id,
					source: e.source,
					target: e.target,
					label: e.label.filter(|l| !l.is_empty()),
				}
			})
			.collect();
		GraphData { nodes, edges }
	}
}

/// One prior turn sent along with a question.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HistoryTurn {
	/// `"user"` or `"assistant"`.
	pub role: &'static str,
	pub content: String,
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
	question: &'a str,
	conversation_history: &'a [HistoryTurn],
}

/// Answer to a chat question.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct QueryResponse {
	#[serde(default)]
	pub answer: Option<String>,
	/// Ids of the nodes the answer is about.
	#[serde(default, deserialize_with = "null_as_default")]
	pub highlighted_nodes: Vec<String>,
	#[serde(default, deserialize_with = "null_as_default")]
	pub references: Vec<Reference>,
}

/// Rating of an assistant message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FeedbackRequest {
	pub message_id: String,
	pub feedback_type: String,
	pub comment: String,
}

fn decode<T: DeserializeOwned>(url: &str, body: &str) -> Result<T, ApiError> {
	serde_json::from_str(body).map_err(|source| ApiError::Decode {
		url: url.to_owned(),
		source,
	})
}

/// Backend client. Cheap to clone.
#[derive(Clone, Debug)]
pub struct ApiClient {
	config: AppConfig,
}

impl ApiClient {
	pub fn new(config: AppConfig) -> Self {
		Self { config }
	}

	/// `GET /api/graph`.
	pub async fn fetch_graph(&self) -> Result<GraphData, ApiError> {
		let url = self.config.endpoint("/api/graph");
		let request = Request::get(&url).build().map_err(|e| network(&url, e))?;
		let body = read_body(&url, send(&url, request).await?).await?;
		let wire: WireGraph = decode(&url, &body)?;
		info!(
			"api: graph with {} nodes, {} edges",
			wire.nodes.len(),
			wire.edges.len()
		);
		Ok(wire.into())
	}

	/// `POST /api/query` with the question and the prior turns.
	pub async fn query(
		&self,
		question: &str,
		history: &[HistoryTurn],
	) -> Result<QueryResponse, ApiError> {
		let url = self.config.endpoint("/api/query");
		let request = json_post(
			&url,
			&QueryRequest {
				question,
				conversation_history: history,
			},
		)?;
		let body = read_body(&url, send(&url, request).await?).await?;
		let response: QueryResponse = decode(&url, &body)?;
		debug!(
			"api: answer with {} highlighted nodes",
			response.highlighted_nodes.len()
		);
		Ok(response)
	}

	/// `POST /api/feedback`. The response body is ignored.
	pub async fn submit_feedback(&self, feedback: &FeedbackRequest) -> Result<(), ApiError> {
		let url = self.config.endpoint("/api/feedback");
		let response = send(&url, json_post(&url, feedback)?).await?;
		if !response.ok() {
			return Err(ApiError::Status {
				url,
				status: response.status(),
			});
		}
		Ok(())
	}
}

fn json_post<T: Serialize + ?Sized>(url: &str, body: &T) -> Result<Request, ApiError> {
	Request::post(url).json(body).map_err(|e| network(url, e))
}

fn network(url: &str, e: gloo_net::Error) -> ApiError {
	ApiError::Network {
		url: url.to_owned(),
		message: e.to_string(),
	}
}

async fn send(url: &str, request: Request) -> Result<Response, ApiError> {
	request.send().await.map_err(|e| network(url, e))
}

async fn read_body(url: &str, response: Response) -> Result<String, ApiError> {
	if !response.ok() {
		return Err(ApiError::Status {
			url: url.to_owned(),
			status: response.status(),
		});
	}
	response.text().await.map_err(|e| network(url, e))
}
