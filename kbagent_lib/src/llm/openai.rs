use std::rc::Rc;
use crate::llm::util::{role_to_llm, tool_params_to_value};
use crate::llm::LLMChat;
use crate::config::Config;
use crate::error::Error;
use crate::tools::{ToolChoice, ToolSpec};
use crate::val_as_str;
use serde_json::{json, Value};
use crate::request::Client;
use super::messages::Text;
use super::{Message, Role, ToolCall};
use super::sse;
use super::util::{self, call_params, llm_to_role, parse_streamed_args};

// upper bound for the tool call index of a stream delta
const MAX_STREAMED_CALLS: usize = 64;

pub struct OpenAIChat {
    system_prompt: String,
    history: Vec<Value>,
    config: Config,
    client: Rc<dyn Client>,
    tools: Vec<ToolSpec>,
}

/// Tool call assembled from stream deltas.
#[derive(Default)]
struct PartialCall {
    id: String,
    name: String,
    arguments: String,
}

impl OpenAIChat {
    pub(super) fn new(config: Config, client: Rc<dyn Client>, tools: Vec<ToolSpec>) -> Self {
        OpenAIChat {
            system_prompt: String::new(),
            history: vec![],
            config,
            client,
            tools,
        }
    }

    fn prep_payload(&mut self, messages: &[Message], tools: ToolChoice) -> Value {

        let mut payload = json!({
            "model": self.config.name
        });

        for message in messages {
            match message {
                Message::Text(txt) => self.history.push(json!({
                    "role": role_to_llm(self.config.provider, txt.role),
                    "content": txt.message
                })),
                Message::ToolResult(res) => self.history.push(json!({
                    "role": "tool",
                    "content": res.result,
                    "tool_call_id": res.call_id
                })),
                Message::ToolCall(_) => {}
            }
        }

        payload["messages"] = Value::Array(self.history.clone());

        util::set_f64_param(&mut payload, "frequency_penalty", &self.config.frequency_penalty);
        util::set_f64_param(&mut payload, "presence_penalty", &self.config.presence_penalty);
        util::set_i64_param(&mut payload, "n", &self.config.n);
        util::set_f64_param(&mut payload, "top_p", &self.config.top_p);
        util::set_f64_param(&mut payload, "temperature", &self.config.temperature);
        util::set_i64_param(&mut payload, "max_completion_tokens", &self.config.max_tokens);

        if let Some(val) = &self.config.stop_sequence {
            payload["stop"] = Value::String(val.clone());
        }

        self.prep_tool_use(&mut payload, tools);

        payload
    }

    fn prep_tool_use(&self, payload: &mut Value, tools: ToolChoice) {
        match tools {
            // parallel_tool_calls is rejected unless tools are sent
            ToolChoice::None => return,
            ToolChoice::Auto => {
                payload["tool_choice"] = Value::String("auto".to_owned());
            },
            ToolChoice::CallOne => {
                payload["tool_choice"] = Value::String("required".to_owned());
            },
            ToolChoice::Force(tool) => {
                payload["tool_choice"] = json!({
                    "type": "function",
                    "function": {
                        "name": tool
                    }
                });
            },
        };
        self.add_tools(payload);
        payload["parallel_tool_calls"] = Value::Bool(false);
    }

    fn add_tools(&self, payload: &mut Value) {
        let mut arr = Vec::with_capacity(self.tools.len());
        for spec in self.tools.iter() {
            arr.push(json!({
                "type": "function",
                "function": {
                    "description": spec.description,
                    "name": spec.name,
                    "parameters": tool_params_to_value(&spec.params, self.config.provider),
                    "strict": true
                }
            }));
        }
        payload["tools"] = Value::Array(arr);
    }

    fn headers(&self) -> String {
        format!("Bearer {}", self.config.api_key)
    }

    fn check_for_error(&self, response: &Value) -> Result<(), Error> {
        if let Some(error) = response.get("error") {
            let errmes = val_as_str!(error["message"], "error message").to_owned();
            return Err(Error::LLMErrorMessage(errmes));
        }
        Ok(())
    }

    fn process_response(&mut self, response: Value) -> Result<Vec<Message>, Error> {

        self.check_for_error(&response)?;

        let mut result = Vec::new();

        for choice in response["choices"].as_array()
            .ok_or(Error::LLMResponseError("unexpected answer format, can't enumerate response messages."))?
        {
            let msg = &choice["message"];

            self.history.push(msg.clone());

            let role = llm_to_role(val_as_str!(msg["role"], "message role"))?;

            if !msg["content"].is_null() {
                let content = val_as_str!(msg["content"], "message content").to_owned();
                result.push(Message::Text(Text{role, message: content}));
            }

            if !msg["refusal"].is_null() {
                let content = val_as_str!(msg["refusal"], "refusal content").to_owned();
                result.push(Message::Text(Text{role, message: content}));
            }

            if !msg["tool_calls"].is_null() {
                for call in msg["tool_calls"].as_array()
                    .ok_or(Error::LLMResponseError("unexpected answer format, can't enumerate tool call requests."))?
                {
                    let call_id = val_as_str!(call["id"], "tool call id").to_owned();
                    let name = val_as_str!(call["function"]["name"], "tool name").to_owned();
                    let arguments = val_as_str!(call["function"]["arguments"], "tool arguments");

                    let args_obj = serde_json::from_str::<Value>(arguments)?;
                    let params = call_params(&args_obj)?;

                    result.push(Message::ToolCall(ToolCall{call_id, name, params}));
                }
            }
        }

        Ok(result)
    }

    fn process_stream(&mut self, reader: Box<dyn std::io::BufRead>, on_token: &mut dyn FnMut(&str)) -> Result<Vec<Message>, Error> {
        let mut content = String::new();
        let mut calls: Vec<PartialCall> = Vec::new();
        let mut role = Role::Model;

        sse::for_each_event(reader, |event| {
            if event.data == "[DONE]" {
                return Ok(false);
            }

            let chunk = event.json()?;
            self.check_for_error(&chunk)?;

            let Some(delta) = chunk["choices"].get(0).map(|c| &c["delta"]) else {
                return Ok(true);
            };

            if let Some(r) = delta["role"].as_str() {
                role = llm_to_role(r)?;
            }

            if let Some(text) = delta["content"].as_str() {
                on_token(text);
                content.push_str(text);
            }

            if let Some(deltas) = delta["tool_calls"].as_array() {
                for call in deltas {
                    let index = call["index"].as_u64().unwrap_or(0) as usize;
                    if index >= MAX_STREAMED_CALLS {
                        return Err(Error::LLMResponseError("tool call index in the stream is out of range."));
                    }
                    if calls.len() <= index {
                        calls.resize_with(index + 1, PartialCall::default);
                    }
                    let partial = &mut calls[index];
                    if let Some(id) = call["id"].as_str() {
                        partial.id = id.to_owned();
                    }
                    if let Some(name) = call["function"]["name"].as_str() {
                        partial.name.push_str(name);
                    }
                    if let Some(args) = call["function"]["arguments"].as_str() {
                        partial.arguments.push_str(args);
                    }
                }
            }

            Ok(true)
        })?;

        let mut result = Vec::new();
        let mut message = json!({
            "role": role_to_llm(self.config.provider, role),
            "content": Value::Null,
        });

        if !content.is_empty() {
            message["content"] = Value::String(content.clone());
            result.push(Message::text(role, content));
        }

        if !calls.is_empty() {
            let mut tool_calls = Vec::with_capacity(calls.len());
            for call in calls {
                tool_calls.push(json!({
                    "id": call.id,
                    "type": "function",
                    "function": {
                        "name": call.name,
                        "arguments": call.arguments,
                    }
                }));
                let params = call_params(&parse_streamed_args(&call.arguments)?)?;
                result.push(Message::ToolCall(ToolCall{call_id: call.id, name: call.name, params}));
            }
            message["tool_calls"] = Value::Array(tool_calls);
        }

        self.history.push(message);

        Ok(result)
    }
}

impl LLMChat for OpenAIChat {

    fn get_inference(&mut self, messages: &[Message], tools: ToolChoice) -> Result<Vec<Message>, Error> {
        let payload = self.prep_payload(messages, tools);

        let token = self.headers();
        let headers = &[("Authorization", token.as_ref())];

        let response = self.client.make_json_request(&self.config.api_url, payload, headers, &[])?;

        self.process_response(response)
    }

    fn get_inference_stream(&mut self, messages: &[Message], tools: ToolChoice, on_token: &mut dyn FnMut(&str)) -> Result<Vec<Message>, Error> {
        let mut payload = self.prep_payload(messages, tools);
        payload["stream"] = Value::Bool(true);

        let token = self.headers();
        let headers = &[("Authorization", token.as_ref())];

        let reader = self.client.make_stream_request(&self.config.api_url, payload, headers, &[])?;

        self.process_stream(reader, on_token)
    }

    fn clear_history(&mut self) {
        self.history.clear();
        if !self.system_prompt.is_empty() {
            self.set_system_prompt(self.system_prompt.clone());
        }
    }

    fn set_system_prompt(&mut self, prompt: String) {
        self.system_prompt = prompt;
        let val = json!({
            "role": "system",
            "content": self.system_prompt.clone(),
        });

        if self.history.is_empty() {
            self.history.push(val);
        } else {
            self.history[0] = val;
        }
    }
}
