//! Tool-calling agent.

use std::rc::Rc;
use crate::config::Config;
use crate::error::Error;
use crate::llm::{get_llm_chat, LLMChat, Message, ToolCall};
use crate::memory::{ConversationMemory, Run};
use crate::request::Client;
use crate::tools::{Tool, ToolChoice};

/// Maximum number of model calls per run.
pub const MAX_STEPS: usize = 20;

/// Agent: chat, tools, and optional conversation memory.
pub struct Agent {
    chat: Box<dyn LLMChat>,
    tools: Vec<Box<dyn Tool>>,
    memory: Option<Box<dyn ConversationMemory>>,
    stream: bool,
}

impl Agent {

    /// Create new agent.
    pub fn new(config: Config,
        client: Rc<dyn Client>,
        tools: Vec<Box<dyn Tool>>,
        system_prompt: String,
        memory: Option<Box<dyn ConversationMemory>>,
        stream: bool) -> Result<Self, Error>
    {
        let specs = tools.iter().map(|t| t.get_tool_spec()).collect();
        let mut chat = get_llm_chat(config, client, specs)?;

        if !system_prompt.is_empty() {
            chat.set_system_prompt(system_prompt);
        }

        Ok(Agent {
            chat,
            tools,
            memory,
            stream,
        })
    }

    /// Names of the attached tools.
    pub fn tool_names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.get_tool_spec().name).collect()
    }

    /// Answer the query. In streaming mode every text fragment is passed to `on_token`.
    pub fn run(&mut self, query: &str, on_token: &mut dyn FnMut(&str)) -> Result<String, Error> {
        let mut next_messages = self.load_memory()?;
        next_messages.push(Message::user(query.to_owned()));

        let tool_choice = if self.tools.is_empty() { ToolChoice::None } else { ToolChoice::Auto };

        for step in 1..=MAX_STEPS {
            let response = if self.stream {
                self.chat.get_inference_stream(&next_messages, tool_choice.clone(), on_token)?
            } else {
                self.chat.get_inference(&next_messages, tool_choice.clone())?
            };

            let mut answer = Vec::new();
            let mut tool_results = Vec::new();

            for message in response {
                match message {
                    Message::Text(text) => answer.push(text.message),
                    Message::ToolCall(call) => tool_results.push(self.process_tool_call(&call)?),
                    Message::ToolResult(_) => {
                        return Err(Error::LLMResponseError("unexpected \"tool result\" message from LLM."))
                    }
                }
            }

            if tool_results.is_empty() {
                let answer = answer.join("\n");
                tracing::debug!(step, "agent answered");
                self.store_memory(query, &answer)?;
                return Ok(answer);
            }

            next_messages = tool_results;
        }

        Err(Error::StepLimit(MAX_STEPS))
    }

    fn process_tool_call(&self, tool_call: &ToolCall) -> Result<Message, Error> {
        tracing::info!(tool = %tool_call.name, call_id = %tool_call.call_id, "tool call requested");

        let result = match self.tools.iter().find(|t| t.get_tool_spec().name == tool_call.name) {
            Some(tool) => tool.call_tool(&tool_call.params)?,
            None => {
                tracing::warn!(tool = %tool_call.name, "unknown tool requested");
                format!("Unknown tool \"{}\" was requested.", tool_call.name)
            }
        };

        Ok(Message::tool_result(tool_call.call_id.clone(), tool_call.name.clone(), result))
    }

    fn load_memory(&mut self) -> Result<Vec<Message>, Error> {
        let Some(memory) = self.memory.as_mut() else {
            return Ok(vec![]);
        };

        let runs = memory.load()?;
        tracing::debug!(runs = runs.len(), "loaded conversation memory");

        let mut messages = Vec::with_capacity(runs.len() * 2);
        for run in runs {
            messages.push(Message::user(run.input));
            messages.push(Message::model(run.output));
        }
        Ok(messages)
    }

    fn store_memory(&mut self, query: &str, answer: &str) -> Result<(), Error> {
        if let Some(memory) = self.memory.as_mut() {
            memory.store(&Run::new(query.to_owned(), answer.to_owned()))?;
        }
        Ok(())
    }
}
