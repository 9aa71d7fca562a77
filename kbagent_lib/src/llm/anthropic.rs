use std::rc::Rc;
use crate::llm::util::tool_params_to_value;
use crate::llm::{LLMChat, Role};
use crate::config::Config;
use crate::error::Error;
use crate::tools::{ToolChoice, ToolSpec};
use crate::val_as_str;
use serde_json::{json, Value};
use crate::request::Client;
use super::messages::Text;
use super::{Message, ToolCall};
use super::sse;
use super::util::{self, call_params, llm_to_role, parse_streamed_args, role_to_llm};

pub struct AnthropicChat {
    system_prompt: String,
    history: Vec<Value>,
    config: Config,
    client: Rc<dyn Client>,
    tools: Vec<ToolSpec>,
}

/// Content block assembled from stream deltas.
enum PartialBlock {
    Text(String),
    ToolUse { id: String, name: String, input: String },
}

impl AnthropicChat {
    pub(super) fn new(config: Config, client: Rc<dyn Client>, tools: Vec<ToolSpec>) -> Result<Self, Error> {
        if config.api_version.is_none() {
            return Err(Error::MissingArgError("api-version is mandatory for anthropic."))
        }
        if config.max_tokens.is_none() {
            return Err(Error::MissingArgError("max-tokens is mandatory for anthropic."))
        }

        Ok(AnthropicChat {
            system_prompt: String::new(),
            history: vec![],
            config,
            client,
            tools,
        })
    }

    fn push_tool_result(&mut self, call_id: &str, result: &str) {
        let block = json!({
            "type": "tool_result",
            "tool_use_id": call_id,
            "content": result
        });

        // results of one turn share a single user message
        if let Some(last) = self.history.last_mut() {
            let is_result_turn = last["role"] == "user"
                && last["content"].as_array().is_some_and(|blocks| {
                    blocks.iter().all(|b| b["type"] == "tool_result")
                });
            if is_result_turn {
                if let Some(blocks) = last["content"].as_array_mut() {
                    blocks.push(block);
                    return;
                }
            }
        }

        self.history.push(json!({
            "role": role_to_llm(self.config.provider, Role::User),
            "content": [block]
        }));
    }

    fn prep_payload(&mut self, messages: &[Message], tools: ToolChoice) -> Value {

        for message in messages {
            match message {
                Message::Text(txt) => self.history.push(json!({
                    "role": role_to_llm(self.config.provider, txt.role),
                    "content": txt.message
                })),
                Message::ToolResult(res) => self.push_tool_result(&res.call_id, &res.result),
                Message::ToolCall(_) => {}
            }
        }

        let mut payload = json!({
            "model": self.config.name,
            "system": self.system_prompt,
        });

        payload["messages"] = Value::Array(self.history.clone());

        util::set_i64_param(&mut payload, "max_tokens", &self.config.max_tokens);
        util::set_f64_param(&mut payload, "top_p", &self.config.top_p);
        util::set_i64_param(&mut payload, "top_k", &self.config.top_k);
        util::set_f64_param(&mut payload, "temperature", &self.config.temperature);

        if let Some(val) = &self.config.stop_sequence {
            payload["stop_sequences"] = Value::Array(vec![Value::String(val.clone())]);
        }

        self.prep_tool_use(&mut payload, tools);

        payload
    }

    fn prep_tool_use(&self, payload: &mut Value, tools: ToolChoice) {
        match tools {
            ToolChoice::None => {},
            ToolChoice::Auto => {
                payload["tool_choice"] = json!({
                    "type": "auto",
                    "disable_parallel_tool_use": true,
                });
                self.add_tools(payload);
            },
            ToolChoice::CallOne => {
                payload["tool_choice"] = json!({
                    "type": "any",
                    "disable_parallel_tool_use": true,
                });
                self.add_tools(payload);
            },
            ToolChoice::Force(tool) => {
                payload["tool_choice"] = json!({
                    "type": "tool",
                    "name": tool,
                    "disable_parallel_tool_use": true,
                });
                self.add_tools(payload);
            },
        };
    }

    fn add_tools(&self, payload: &mut Value) {
        let mut arr = Vec::with_capacity(self.tools.len());
        for spec in self.tools.iter() {
            arr.push(json!({
                "description": spec.description,
                "name": spec.name,
                "input_schema": tool_params_to_value(&spec.params, self.config.provider)
            }));
        }
        payload["tools"] = Value::Array(arr);
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

        let role = val_as_str!(response["role"], "role");
        let role = llm_to_role(role)?;

        let blocks = response["content"]
            .as_array()
            .ok_or(Error::LLMResponseError("can't enumerate messages in the response."))?;

        for msg in blocks {
            let msg_type = val_as_str!(msg["type"], "message type");

            if "text" == msg_type {

                let text = val_as_str!(msg["text"], "text").to_owned();

                result.push(Message::Text(Text{role, message: text}));

            } else if "tool_use" == msg_type {

                let call_id = val_as_str!(msg["id"], "tool call id").to_owned();
                let name = val_as_str!(msg["name"], "tool name").to_owned();
                let params = call_params(&msg["input"])?;

                result.push(Message::ToolCall(ToolCall{call_id, name, params}));

            } else {
                return Err(Error::LLMResponseError("unexpected message type."))
            }
        }

        self.history.push(json!({
            "role": &response["role"],
            "content": blocks,
        }));

        Ok(result)
    }

    fn process_stream(&mut self, reader: Box<dyn std::io::BufRead>, on_token: &mut dyn FnMut(&str)) -> Result<Vec<Message>, Error> {
        let mut blocks: Vec<PartialBlock> = Vec::new();

        sse::for_each_event(reader, |event| {
            let data = event.json()?;

            match event.name.as_str() {
                "error" => {
                    self.check_for_error(&data)?;
                },
                "content_block_start" => {
                    let block = &data["content_block"];
                    match val_as_str!(block["type"], "content block type") {
                        "text" => {
                            let text = block["text"].as_str().unwrap_or_default();
                            if !text.is_empty() {
                                on_token(text);
                            }
                            blocks.push(PartialBlock::Text(text.to_owned()));
                        },
                        "tool_use" => blocks.push(PartialBlock::ToolUse {
                            id: val_as_str!(block["id"], "tool call id").to_owned(),
                            name: val_as_str!(block["name"], "tool name").to_owned(),
                            input: String::new(),
                        }),
                        _ => return Err(Error::LLMResponseError("unexpected content block type.")),
                    }
                },
                "content_block_delta" => {
                    let delta = &data["delta"];
                    match (blocks.last_mut(), val_as_str!(delta["type"], "delta type")) {
                        (Some(PartialBlock::Text(text)), "text_delta") => {
                            let fragment = val_as_str!(delta["text"], "text delta");
                            on_token(fragment);
                            text.push_str(fragment);
                        },
                        (Some(PartialBlock::ToolUse { input, .. }), "input_json_delta") => {
                            input.push_str(val_as_str!(delta["partial_json"], "input json delta"));
                        },
                        _ => return Err(Error::LLMResponseError("content block delta does not match the open block.")),
                    }
                },
                "message_stop" => return Ok(false),
                _ => {},
            }

            Ok(true)
        })?;

        let mut result = Vec::with_capacity(blocks.len());
        let mut content = Vec::with_capacity(blocks.len());

        for block in blocks {
            match block {
                // empty text blocks are rejected when sent back
                PartialBlock::Text(text) if text.is_empty() => {},
                PartialBlock::Text(text) => {
                    content.push(json!({"type": "text", "text": text}));
                    result.push(Message::text(Role::Model, text));
                },
                PartialBlock::ToolUse { id, name, input } => {
                    let input = parse_streamed_args(&input)?;
                    let params = call_params(&input)?;
                    content.push(json!({"type": "tool_use", "id": id, "name": name, "input": input}));
                    result.push(Message::ToolCall(ToolCall{call_id: id, name, params}));
                },
            }
        }

        self.history.push(json!({
            "role": role_to_llm(self.config.provider, Role::Model),
            "content": content,
        }));

        Ok(result)
    }

    fn api_version(&self) -> Result<&str, Error> {
        self.config.api_version.as_deref()
            .ok_or(Error::MissingArgError("api-version is mandatory for anthropic."))
    }
}

impl LLMChat for AnthropicChat {

    fn get_inference(&mut self, messages: &[Message], tools: ToolChoice) -> Result<Vec<Message>, Error> {

        let payload = self.prep_payload(messages, tools);

        let api_ver = self.api_version()?;
        let headers = &[
            ("x-api-key", self.config.api_key.as_ref()),
            ("anthropic-version", api_ver),
        ];

        let response = self.client.make_json_request(&self.config.api_url, payload, headers, &[])?;

        self.process_response(response)
    }

    fn get_inference_stream(&mut self, messages: &[Message], tools: ToolChoice, on_token: &mut dyn FnMut(&str)) -> Result<Vec<Message>, Error> {

        let mut payload = self.prep_payload(messages, tools);
        payload["stream"] = Value::Bool(true);

        let api_ver = self.api_version()?;
        let headers = &[
            ("x-api-key", self.config.api_key.as_ref()),
            ("anthropic-version", api_ver),
        ];

        let reader = self.client.make_stream_request(&self.config.api_url, payload, headers, &[])?;

        self.process_stream(reader, on_token)
    }

    fn clear_history(&mut self) {
        self.history.clear();
    }

    fn set_system_prompt(&mut self, prompt: String) {
        self.system_prompt = prompt;
    }
}
