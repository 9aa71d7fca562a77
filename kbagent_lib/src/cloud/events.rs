use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};
use serde_json::{json, Value};
use crate::error::Error;
use crate::request::Client;
use super::{check_for_error, text_artifact, CloudAuth};

/// Publishes run lifecycle events when the program runs as a cloud structure run.
pub struct StructureRunReporter {
    auth: CloudAuth,
    client: Rc<dyn Client>,
    run_id: String,
}

impl StructureRunReporter {

    /// Create reporter for the structure run.
    pub fn new(auth: CloudAuth, client: Rc<dyn Client>, run_id: String) -> Self {
        StructureRunReporter { auth, client, run_id }
    }

    /// Report that the run started processing `input`.
    pub fn start(&self, input: &str) -> Result<(), Error> {
        self.publish("StartStructureRunEvent", json!({
            "input_task_input": text_artifact(input),
        }))
    }

    /// Report the final output.
    pub fn finish(&self, output: &str) -> Result<(), Error> {
        self.publish("FinishStructureRunEvent", json!({
            "output_task_output": text_artifact(output),
        }))
    }

    fn publish(&self, event_type: &str, mut payload: Value) -> Result<(), Error> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or_default();

        payload["type"] = Value::String(event_type.to_owned());
        payload["timestamp"] = json!(timestamp);

        let events = json!([{
            "type": event_type,
            "timestamp": timestamp,
            "payload": payload,
        }]);

        let url = self.auth.url(&format!("structure-runs/{}/events", self.run_id));
        let bearer = self.auth.bearer();

        tracing::debug!(event_type, run_id = %self.run_id, "publishing structure run event");

        let response = self.client.make_json_request(&url, events, &[("Authorization", bearer.as_str())], &[])?;
        check_for_error(&response)
    }
}
