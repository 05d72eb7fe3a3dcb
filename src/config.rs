//! Application configuration.
//!
//! The backend base URL is baked in at build time from
//! `POLICY_GRAPH_API_BASE` and can be overridden per deployment with
//! `<meta name="policy-graph-api" content="https://...">` in `index.html`.

use log::info;
use wasm_bindgen::JsCast;
use web_sys::HtmlMetaElement;

/// Used when neither the build environment nor the page names a backend.
pub const DEFAULT_API_BASE: &str = "http://localhost:8000";

const API_META_SELECTOR: &str = "meta[name=\"policy-graph-api\"]";

/// Settings shared through Leptos context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
	/// Backend origin without a trailing slash.
	pub api_base: String,
}

impl Default for AppConfig {
	fn default() -> Self {
		Self::with_api_base(option_env!("POLICY_GRAPH_API_BASE").unwrap_or(DEFAULT_API_BASE))
	}
}

impl AppConfig {
	pub fn with_api_base(base: impl Into<String>) -> Self {
		let base: String = base.into();
		Self {
			api_base: base.trim().trim_end_matches('/').to_owned(),
		}
	}

	/// Build-time defaults, overridden by the page's meta tag when present.
	pub fn load() -> Self {
		match meta_api_base() {
			Some(base) => {
				info!("config: api base from page meta: {base}");
				Self::with_api_base(base)
			}
			None => Self::default(),
		}
	}

	/// Absolute URL of an API path such as `/api/graph`.
	pub fn endpoint(&self, path: &str) -> String {
		format!("{}/{}", self.api_base, path.trim_start_matches('/'))
	}
}

fn meta_api_base() -> Option<String> {
	let document = web_sys::window()?.document()?;
	let element = document.query_selector(API_META_SELECTOR).ok()??;
	let meta: HtmlMetaElement = element.dyn_into().ok()?;
	let content = meta.content();
	(!content.trim().is_empty()).then_some(content)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn endpoints_join_with_one_slash() {
		let config = AppConfig::with_api_base("https://policy.example/ ");
		assert_eq!(config.api_base, "https://policy.example");
		assert_eq!(config.endpoint("/api/graph"), "https://policy.example/api/graph");
		assert_eq!(config.endpoint("api/query"), "https://policy.example/api/query");
	}
}
