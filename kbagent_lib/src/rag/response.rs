use std::rc::Rc;
use crate::config::Config;
use crate::error::Error;
use crate::llm::{get_llm_chat, Message};
use crate::request::Client;
use crate::tools::ToolChoice;
use super::{Entry, ResponseModule};

/// Answer returned when retrieval found nothing.
pub const NO_CONTEXT_ANSWER: &str = "I could not find any relevant information to answer the question.";

const SYSTEM_PROMPT: &str = "You are an expert Q&A system. \
Answer the user's question using ONLY the information in the context below. \
Do not use prior knowledge. \
If the context does not contain the answer, say that you don't know.\n\n\
Context:\n";

/// Response stage asking the model to answer from the retrieved context.
pub struct PromptResponse {
    config: Config,
    client: Rc<dyn Client>,
}

impl PromptResponse {

    /// Create response module.
    pub fn new(config: Config, client: Rc<dyn Client>) -> Self {
        PromptResponse { config, client }
    }

    fn system_prompt(entries: &[Entry]) -> String {
        let context: Vec<&str> = entries.iter().map(|e| e.text.as_str()).collect();
        format!("{SYSTEM_PROMPT}{}", context.join("\n\n"))
    }
}

impl ResponseModule for PromptResponse {

    fn respond(&self, query: &str, entries: &[Entry]) -> Result<String, Error> {
        if entries.is_empty() {
            return Ok(NO_CONTEXT_ANSWER.to_owned());
        }

        // every answer starts from a clean history
        let mut chat = get_llm_chat(self.config.clone(), self.client.clone(), vec![])?;
        chat.set_system_prompt(Self::system_prompt(entries));

        let response = chat.get_inference(&[Message::user(query.to_owned())], ToolChoice::None)?;

        let answer: Vec<String> = response.into_iter()
            .filter_map(Message::into_text)
            .collect();

        if answer.is_empty() {
            return Err(Error::LLMResponseError("model returned no text for the retrieved context"));
        }

        Ok(answer.join("\n"))
    }
}
