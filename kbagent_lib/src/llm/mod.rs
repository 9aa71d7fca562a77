//! LLM interface
mod llmchat;
mod openai;
mod anthropic;
mod google;
mod sse;
mod util;
mod messages;

pub use llmchat::LLMChat;
pub use messages::Message;
pub use messages::Role;
pub use messages::Text;
pub use messages::ToolCall;
pub use messages::CallParam;
pub use messages::ToolResult;
pub use llmchat::get_llm_chat;
