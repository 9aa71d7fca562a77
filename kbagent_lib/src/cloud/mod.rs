//! Cloud service drivers: rulesets, conversation memory, structure run events.

mod ruleset;
mod memory;
mod events;

use serde_json::{json, Value};
use crate::error::Error;

pub use ruleset::CloudRulesetDriver;
pub use ruleset::Ruleset;
pub use memory::CloudConversationMemory;
pub use events::StructureRunReporter;

/// Default cloud endpoint.
pub const DEFAULT_BASE_URL: &str = "https://cloud.griptape.ai";

/// Cloud endpoint and credentials.
#[derive(Debug, Clone)]
pub struct CloudAuth {
    /// Base URL without trailing slash.
    pub base_url: String,
    /// API key.
    pub api_key: String,
}

impl CloudAuth {

    /// Create credentials, `base_url` falls back to [`DEFAULT_BASE_URL`].
    pub fn new(api_key: String, base_url: Option<String>) -> Self {
        let base_url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());
        CloudAuth {
            base_url: base_url.trim_end_matches('/').to_owned(),
            api_key,
        }
    }

    /// Full URL of an API path (without the `/api/` prefix).
    pub fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Authorization header value.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.api_key)
    }
}

/// Turn an `error` field of a cloud response into an error.
pub(crate) fn check_for_error(response: &Value) -> Result<(), Error> {
    if let Some(error) = response.get("error") {
        let message = match error {
            Value::String(s) => s.clone(),
            other => other["message"].as_str().map(str::to_owned).unwrap_or_else(|| other.to_string()),
        };
        return Err(Error::CloudErrorMessage(message));
    }
    Ok(())
}

/// Text of an artifact. Stored artifacts are serialized JSON strings,
/// anything that does not decode is taken as plain text.
pub(crate) fn artifact_text(artifact: &Value) -> Option<String> {
    match artifact {
        Value::String(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(decoded @ Value::Object(_)) => artifact_text(&decoded),
            _ => Some(raw.clone()),
        },
        Value::Object(_) => artifact["value"].as_str().map(str::to_owned),
        _ => None,
    }
}

pub(crate) fn text_artifact(value: &str) -> Value {
    json!({
        "type": "TextArtifact",
        "value": value,
    })
}
