use std::rc::Rc;
use crate::llm::util::{role_to_llm, tool_params_to_value};
use crate::llm::{LLMChat, Role};
use crate::config::Config;
use crate::error::Error;
use crate::tools::{ToolChoice, ToolSpec};
use crate::val_as_str;
use serde_json::{json, Value};
use crate::request::Client;
use super::{Message, ToolCall};
use super::sse;
use super::util::{self, call_params, llm_to_role};

const GENERATE: &str = ":generateContent";
const STREAM_GENERATE: &str = ":streamGenerateContent";

pub struct GoogleChat {
    system_prompt: String,
    history: Vec<Value>,
    config: Config,
    client: Rc<dyn Client>,
    tools: Vec<ToolSpec>,
}

impl GoogleChat {
    pub(super) fn new(config: Config, client: Rc<dyn Client>,  tools: Vec<ToolSpec>) -> Result<Self, Error> {
        Ok(GoogleChat {
            system_prompt: String::new(),
            history: vec![],
            config,
            client,
            tools,
        })
    }

    fn push_function_response(&mut self, name: &str, result: &str) {
        let part = json!({
            "functionResponse": {
                "name": name,
                "response": {
                    "name": name,
                    "content": result
                }
            }
        });

        if let Some(last) = self.history.last_mut() {
            let is_response_turn = last["role"] == "user"
                && last["parts"].as_array().is_some_and(|parts| {
                    parts.iter().all(|p| p["functionResponse"].is_object())
                });
            if is_response_turn {
                if let Some(parts) = last["parts"].as_array_mut() {
                    parts.push(part);
                    return;
                }
            }
        }

        self.history.push(json!({
            "role": "user",
            "parts": [part]
        }));
    }

    fn prep_payload(&mut self, messages: &[Message], tools: ToolChoice) -> Value {

        let mut payload = json!({});

        if !self.system_prompt.is_empty() {
            payload["systemInstruction"] = json!({
                "parts":
                  { "text": self.system_prompt }
            });
        }

        for message in messages {
            match message {
                Message::Text(txt) => self.history.push(json!({
                    "role": role_to_llm(self.config.provider, txt.role),
                    "parts": [{"text": txt.message}]
                })),
                Message::ToolResult(res) => self.push_function_response(&res.name, &res.result),
                Message::ToolCall(_) => {}
            }
        }

        payload["contents"] = Value::Array(self.history.clone());

        payload["generationConfig"] = json!({});

        util::set_i64_param(&mut payload["generationConfig"], "maxOutputTokens", &self.config.max_tokens);
        util::set_f64_param(&mut payload["generationConfig"], "topP", &self.config.top_p);
        util::set_i64_param(&mut payload["generationConfig"], "topK", &self.config.top_k);
        util::set_f64_param(&mut payload["generationConfig"], "temperature", &self.config.temperature);
        util::set_f64_param(&mut payload["generationConfig"], "presencePenalty", &self.config.presence_penalty);
        util::set_f64_param(&mut payload["generationConfig"], "frequencyPenalty", &self.config.frequency_penalty);

        if let Some(val) = &self.config.stop_sequence {
            payload["generationConfig"]["stopSequences"] = Value::Array(vec![Value::String(val.clone())]);
        }

        self.prep_tool_use(&mut payload, tools);

        payload
    }

    fn prep_tool_use(&self, payload: &mut Value, tools: ToolChoice) {
        match tools {
            ToolChoice::None => {},
            ToolChoice::Auto => {
                payload["tool_config"] = json!({
                    "function_calling_config": {
                        "mode": "AUTO"
                    }
                });
                self.add_tools(payload);
            },
            ToolChoice::CallOne => {
                payload["tool_config"] = json!({
                    "function_calling_config": {
                        "mode": "ANY"
                    }
                });
                self.add_tools(payload);
            },
            ToolChoice::Force(tool) => {
                payload["tool_config"] = json!({
                    "function_calling_config": {
                      "mode": "ANY",
                      "allowed_function_names": [tool]
                    },
                });
                self.add_tools(payload);
            },
        };
    }

    fn add_tools(&self, payload: &mut Value) {
        let mut arr = Vec::with_capacity(self.tools.len());
        for spec in self.tools.iter() {
            arr.push(json!({
                "name": spec.name,
                "description": spec.description,
                "parameters": tool_params_to_value(&spec.params, self.config.provider)
            }));
        }
        payload["tools"] = json!([{
            "function_declarations": arr
        }]);
    }

    fn stream_url(&self) -> String {
        self.config.api_url.replace(GENERATE, STREAM_GENERATE)
    }

    fn check_for_error(&self, response: &Value) -> Result<(), Error> {
        if let Some(error) = response.get("error") {
            let errmes = val_as_str!(error["message"], "error message").to_owned();
            return Err(Error::LLMErrorMessage(errmes));
        }
        Ok(())
    }

    /// Convert one candidate part into a message.
    fn part_to_message(role: Role, part: &Value) -> Result<Message, Error> {
        if part["functionCall"].is_object() {
            let name = val_as_str!(part["functionCall"]["name"], "tool name").to_owned();
            let params = match part["functionCall"].get("args") {
                Some(args) => call_params(args)?,
                None => vec![],
            };

            Ok(Message::ToolCall(ToolCall{call_id: String::new(), name, params}))
        } else if let Some(text) = part["text"].as_str() {
            Ok(Message::text(role, text.to_owned()))
        } else {
            Err(Error::LLMResponseError("unexpected message type."))
        }
    }

    fn process_response(&mut self, response: Value) -> Result<Vec<Message>, Error> {

        self.check_for_error(&response)?;

        let mut result = Vec::new();

        for candidate in response["candidates"]
            .as_array()
            .ok_or(Error::LLMResponseError("can't enumerate messages in the response."))?
        {
            self.history.push(candidate["content"].clone());

            let role = llm_to_role(val_as_str!(candidate["content"]["role"], "message role"))?;

            for part in candidate["content"]["parts"]
                .as_array()
                .ok_or(Error::LLMResponseError("unexpected answer format, can't enumerate message parts."))?
            {
                result.push(Self::part_to_message(role, part)?);
            }
        }

        Ok(result)
    }

    fn process_stream(&mut self, reader: Box<dyn std::io::BufRead>, on_token: &mut dyn FnMut(&str)) -> Result<Vec<Message>, Error> {
        let mut parts: Vec<Value> = Vec::new();

        sse::for_each_event(reader, |event| {
            let chunk = event.json()?;
            self.check_for_error(&chunk)?;

            let Some(candidate) = chunk["candidates"].get(0) else {
                return Ok(true);
            };

            let Some(chunk_parts) = candidate["content"]["parts"].as_array() else {
                return Ok(true);
            };

            for part in chunk_parts {
                if let Some(text) = part["text"].as_str() {
                    on_token(text);
                    // consecutive text fragments form one part
                    if let Some(Value::String(prev)) = parts.last_mut().and_then(|p| p.get_mut("text")) {
                        prev.push_str(text);
                        continue;
                    }
                }
                parts.push(part.clone());
            }

            Ok(true)
        })?;

        let mut result = Vec::with_capacity(parts.len());
        for part in parts.iter() {
            result.push(Self::part_to_message(Role::Model, part)?);
        }

        self.history.push(json!({
            "role": role_to_llm(self.config.provider, Role::Model),
            "parts": parts,
        }));

        Ok(result)
    }
}

impl LLMChat for GoogleChat {

    fn get_inference(&mut self, messages: &[Message], tools: ToolChoice) -> Result<Vec<Message>, Error> {

        let payload = self.prep_payload(messages, tools);

        let params = &[("key", self.config.api_key.as_ref())];

        let response = self.client.make_json_request(&self.config.api_url, payload, &[], params)?;

        self.process_response(response)
    }

    fn get_inference_stream(&mut self, messages: &[Message], tools: ToolChoice, on_token: &mut dyn FnMut(&str)) -> Result<Vec<Message>, Error> {

        let payload = self.prep_payload(messages, tools);

        let url = self.stream_url();
        let params = &[("key", self.config.api_key.as_ref()), ("alt", "sse")];

        let reader = self.client.make_stream_request(&url, payload, &[], params)?;

        self.process_stream(reader, on_token)
    }

    fn clear_history(&mut self) {
        self.history.clear();
    }

    fn set_system_prompt(&mut self, prompt: String) {
        self.system_prompt = prompt;
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::stub::{Exchange, StubClient};
    use crate::tools::{ParamType, ToolParam};

    const URL: &str = "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";

    fn test_config() -> Config {
        let mut config = Config::new(
            "google".try_into().expect("determine model provider"),
            "gemini-2.0-flash".to_owned(),
            "<api-key>".to_owned(),
            URL.to_owned(),
        );
        config.max_tokens = Some(1024);
        config
    }

    fn kb_tool() -> ToolSpec {
        ToolSpec {
            name: "KnowledgeBase_1".to_owned(),
            description: "Psychedelic Alpha: Contains specialized information and documents".to_owned(),
            params: vec![
                ToolParam {
                    name: "query".to_string(),
                    description: "search query".to_string(),
                    data_type: ParamType::String,
                    required: true
                },
            ]
        }
    }

    #[test]
    fn test_request_response_ok() {
        let sys_msg = "test sys message";

        let expected_payload = json!({
            "systemInstruction": {
                "parts": { "text": sys_msg }
            },
            "contents": [
                {"role": "user", "parts": [{"text": "user message 1"}]},
                {"role": "model", "parts": [{"text": "model message 1"}]},
                {"role": "user", "parts": [{"text": "user message 2"}]},
            ],
            "generationConfig": {
                "maxOutputTokens": 1024,
            },
        });

        let response_body = json!({
            "candidates": [{
                "content": {
                    "parts": [{"text": "model message 2"}],
                    "role": "model"
                },
                "finishReason": "STOP",
                "index": 0
            }],
            "usageMetadata": {"promptTokenCount": 10, "candidatesTokenCount": 4}
        });

        let client = Rc::new(StubClient::sequence(vec![
            Exchange::post(response_body)
                .url(URL)
                .payload(expected_payload)
                .params(&[("key", "<api-key>")]),
        ]));

        let mut chat = GoogleChat::new(test_config(), client, vec![]).expect("create chat");
        chat.set_system_prompt(sys_msg.to_owned());

        let messages = vec![
            Message::text(Role::User, "user message 1".to_owned()),
            Message::text(Role::Model, "model message 1".to_owned()),
            Message::text(Role::User, "user message 2".to_owned()),
        ];

        let response = chat.get_inference(&messages, ToolChoice::None).expect("receive response");

        assert_eq!(response.len(), 1);
        assert!(matches!(&response[0], Message::Text(txt) if txt.role == Role::Model && txt.message == "model message 2"));
    }

    #[test]
    fn test_function_call_and_response() {
        let call_response = json!({
            "candidates": [{
                "content": {
                    "parts": [{"functionCall": {"name": "KnowledgeBase_1", "args": {"query": "microdosing"}}}],
                    "role": "model"
                }
            }]
        });

        let expected_second_payload = json!({
            "contents": [
                {"role": "user", "parts": [{"text": "microdosing?"}]},
                {"role": "model", "parts": [{"functionCall": {"name": "KnowledgeBase_1", "args": {"query": "microdosing"}}}]},
                {"role": "user", "parts": [{"functionResponse": {
                    "name": "KnowledgeBase_1",
                    "response": {"name": "KnowledgeBase_1", "content": "articles"}
                }}]},
            ],
            "generationConfig": {"maxOutputTokens": 1024},
            "tool_config": {"function_calling_config": {"mode": "AUTO"}},
            "tools": [{"function_declarations": [{
                "name": "KnowledgeBase_1",
                "description": "Psychedelic Alpha: Contains specialized information and documents",
                "parameters": {
                    "type": "object",
                    "properties": {"query": {"type": "string", "description": "search query"}},
                    "required": ["query"]
                }
            }]}]
        });

        let final_response = json!({
            "candidates": [{"content": {"parts": [{"text": "Microdosing is..."}], "role": "model"}}]
        });

        let client = Rc::new(StubClient::sequence(vec![
            Exchange::post(call_response),
            Exchange::post(final_response).payload(expected_second_payload),
        ]));

        let mut chat = GoogleChat::new(test_config(), client, vec![kb_tool()]).expect("create chat");

        let response = chat.get_inference(&[Message::text(Role::User, "microdosing?".to_owned())], ToolChoice::Auto).expect("receive response");
        let Message::ToolCall(call) = &response[0] else { panic!("type mismatch") };
        assert_eq!(call.name, "KnowledgeBase_1");
        assert_eq!(call.params[0].value, json!("microdosing"));

        let result = Message::tool_result(String::new(), "KnowledgeBase_1".to_owned(), "articles".to_owned());
        let response = chat.get_inference(&[result], ToolChoice::Auto).expect("receive response");
        assert!(matches!(&response[0], Message::Text(txt) if txt.message == "Microdosing is..."));
    }

    #[test]
    fn test_stream() {
        let body = concat!(
            "data: {\"candidates\": [{\"content\": {\"parts\": [{\"text\": \"Psychedelic \"}],\"role\": \"model\"}}]}\r\n\r\n",
            "data: {\"candidates\": [{\"content\": {\"parts\": [{\"text\": \"Alpha tracks \"}],\"role\": \"model\"}}]}\r\n\r\n",
            "data: {\"candidates\": [{\"content\": {\"parts\": [{\"text\": \"the industry.\"}],\"role\": \"model\"},\"finishReason\": \"STOP\"}]}\r\n\r\n",
        );

        let client = Rc::new(StubClient::sequence(vec![
            Exchange::stream(body)
                .url("https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:streamGenerateContent")
                .params(&[("key", "<api-key>"), ("alt", "sse")]),
        ]));

        let mut chat = GoogleChat::new(test_config(), client, vec![]).expect("create chat");

        let mut tokens = Vec::new();
        let response = chat.get_inference_stream(
            &[Message::text(Role::User, "what is it?".to_owned())],
            ToolChoice::None,
            &mut |t: &str| tokens.push(t.to_owned()),
        ).expect("receive response");

        assert_eq!(tokens.len(), 3);
        assert_eq!(response.len(), 1);
        assert!(matches!(&response[0], Message::Text(txt) if txt.message == "Psychedelic Alpha tracks the industry."));
        assert_eq!(chat.history[1], json!({"role": "model", "parts": [{"text": "Psychedelic Alpha tracks the industry."}]}));
    }

    #[test]
    fn test_stream_function_call() {
        let body = concat!(
            "data: {\"candidates\": [{\"content\": {\"parts\": [{\"text\": \"Let me check.\"}],\"role\": \"model\"}}]}\r\n\r\n",
            "data: {\"candidates\": [{\"content\": {\"parts\": [{\"functionCall\": {\"name\": \"KnowledgeBase_1\", \"args\": {\"query\": \"ketamine\"}}}],\"role\": \"model\"},\"finishReason\": \"STOP\"}]}\r\n\r\n",
        );

        let client = Rc::new(StubClient::sequence(vec![Exchange::stream(body)]));
        let mut chat = GoogleChat::new(test_config(), client, vec![kb_tool()]).expect("create chat");

        let mut tokens = Vec::new();
        let response = chat.get_inference_stream(
            &[Message::text(Role::User, "ketamine?".to_owned())],
            ToolChoice::Auto,
            &mut |t: &str| tokens.push(t.to_owned()),
        ).expect("receive response");

        assert_eq!(tokens, vec!["Let me check.".to_owned()]);
        assert_eq!(response.len(), 2);
        assert!(matches!(&response[0], Message::Text(txt) if txt.message == "Let me check."));
        let Message::ToolCall(call) = &response[1] else { panic!("type mismatch") };
        assert_eq!(call.name, "KnowledgeBase_1");
        assert_eq!(call.params[0].value, json!("ketamine"));

        assert_eq!(chat.history[1], json!({"role": "model", "parts": [
            {"text": "Let me check."},
            {"functionCall": {"name": "KnowledgeBase_1", "args": {"query": "ketamine"}}}
        ]}));
    }

    #[test]
    fn test_tool_choice_and_clear_history() {
        let answer = |text: &str| json!({
            "candidates": [{"content": {"parts": [{"text": text}], "role": "model"}}]
        });
        let tools = json!([{"function_declarations": [{
            "name": "KnowledgeBase_1",
            "description": "Psychedelic Alpha: Contains specialized information and documents",
            "parameters": {
                "type": "object",
                "properties": {"query": {"type": "string", "description": "search query"}},
                "required": ["query"]
            }
        }]}]);

        let client = Rc::new(StubClient::sequence(vec![
            Exchange::post(answer("a1")).payload(json!({
                "contents": [{"role": "user", "parts": [{"text": "q1"}]}],
                "generationConfig": {"maxOutputTokens": 1024},
                "tool_config": {"function_calling_config": {"mode": "ANY"}},
                "tools": tools,
            })),
            Exchange::post(answer("a2")).payload(json!({
                "contents": [
                    {"role": "user", "parts": [{"text": "q1"}]},
                    {"role": "model", "parts": [{"text": "a1"}]},
                    {"role": "user", "parts": [{"text": "q2"}]},
                ],
                "generationConfig": {"maxOutputTokens": 1024},
                "tool_config": {"function_calling_config": {"mode": "ANY", "allowed_function_names": ["KnowledgeBase_1"]}},
                "tools": tools,
            })),
            Exchange::post(answer("a3")).payload(json!({
                "contents": [{"role": "user", "parts": [{"text": "q3"}]}],
                "generationConfig": {"maxOutputTokens": 1024},
            })),
        ]));

        let mut chat = GoogleChat::new(test_config(), client.clone(), vec![kb_tool()]).expect("create chat");

        chat.get_inference(&[Message::text(Role::User, "q1".to_owned())], ToolChoice::CallOne).expect("receive response");
        chat.get_inference(&[Message::text(Role::User, "q2".to_owned())], ToolChoice::Force("KnowledgeBase_1".to_owned())).expect("receive response");

        chat.clear_history();
        chat.get_inference(&[Message::text(Role::User, "q3".to_owned())], ToolChoice::None).expect("receive response");

        assert_eq!(client.remaining(), 0);
    }
}
