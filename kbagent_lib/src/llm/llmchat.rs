use std::rc::Rc;
use crate::config::ModelProvider;
use crate::llm::openai::OpenAIChat;
use crate::config::Config;
use crate::error::Error;
use crate::request::Client;
use crate::tools::{ToolChoice, ToolSpec};
use super::anthropic::AnthropicChat;
use super::google::GoogleChat;
use super::Message;

/// Chat with LLM with storing history.
pub trait LLMChat {

    /// Add input messages to the message history.
    /// Input messages contains user message(s), and tool call results.
    /// Returns n messages as the result, and/or tool call requests.
    fn get_inference(&mut self, messages: &[Message], tools: ToolChoice) -> Result<Vec<Message>, Error>;

    /// Same as `get_inference`, but the response is streamed and every text
    /// fragment is passed to `on_token` as soon as it arrives.
    fn get_inference_stream(&mut self, messages: &[Message], tools: ToolChoice, on_token: &mut dyn FnMut(&str)) -> Result<Vec<Message>, Error>;

    /// Clear chat history.
    fn clear_history(&mut self);

    /// Update system prompt.
    fn set_system_prompt(&mut self, prompt: String);
}

/// Create LLMChat instance.
pub fn get_llm_chat(config: Config, client: Rc<dyn Client>, tools: Vec<ToolSpec>) -> Result<Box<dyn LLMChat>, Error> {
    Ok(match config.provider {
        ModelProvider::OpenAI => Box::new(OpenAIChat::new(config, client, tools)),
        ModelProvider::Anthropic => Box::new(AnthropicChat::new(config, client, tools)?),
        ModelProvider::Google => Box::new(GoogleChat::new(config, client, tools)?),
    })
}
