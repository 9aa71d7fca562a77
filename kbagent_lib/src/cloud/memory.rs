use std::rc::Rc;
use serde::Deserialize;
use serde_json::json;
use crate::error::Error;
use crate::memory::{ConversationMemory, Run};
use crate::request::Client;
use super::{artifact_text, check_for_error, text_artifact, CloudAuth};

#[derive(Deserialize)]
struct MessageList {
    #[serde(default)]
    messages: Vec<MessageRecord>,
}

#[derive(Deserialize)]
struct MessageRecord {
    #[serde(default)]
    message_id: String,
    #[serde(default)]
    input: serde_json::Value,
    #[serde(default)]
    output: serde_json::Value,
    #[serde(default)]
    index: i64,
    #[serde(default)]
    metadata: serde_json::Value,
}

/// Conversation memory kept in a cloud thread.
pub struct CloudConversationMemory {
    auth: CloudAuth,
    client: Rc<dyn Client>,
    thread_id: String,
    next_index: usize,
}

impl CloudConversationMemory {

    /// Create memory bound to a thread.
    pub fn new(auth: CloudAuth, client: Rc<dyn Client>, thread_id: String) -> Self {
        CloudConversationMemory {
            auth,
            client,
            thread_id,
            next_index: 0,
        }
    }

    fn messages_url(&self) -> String {
        self.auth.url(&format!("threads/{}/messages", self.thread_id))
    }
}

impl ConversationMemory for CloudConversationMemory {

    fn load(&mut self) -> Result<Vec<Run>, Error> {
        let bearer = self.auth.bearer();
        let response = self.client.get_json(&self.messages_url(), &[("Authorization", bearer.as_str())], &[])?;
        check_for_error(&response)?;

        let mut list: MessageList = serde_json::from_value(response)?;
        list.messages.sort_by_key(|m| m.index);

        self.next_index = list.messages.len();

        tracing::debug!(thread_id = %self.thread_id, runs = self.next_index, "conversation memory loaded");

        Ok(list.messages
            .into_iter()
            .map(|m| Run {
                id: m.metadata["run_id"].as_str().map(str::to_owned).unwrap_or(m.message_id),
                input: artifact_text(&m.input).unwrap_or_default(),
                output: artifact_text(&m.output).unwrap_or_default(),
            })
            .collect())
    }

    fn store(&mut self, run: &Run) -> Result<(), Error> {
        let bearer = self.auth.bearer();
        let payload = json!({
            "input": text_artifact(&run.input).to_string(),
            "output": text_artifact(&run.output).to_string(),
            "index": self.next_index,
            "metadata": {
                "run_id": run.id,
            }
        });

        let response = self.client.make_json_request(&self.messages_url(), payload, &[("Authorization", bearer.as_str())], &[])?;
        check_for_error(&response)?;

        self.next_index += 1;
        Ok(())
    }
}
