//! Agent tools.

mod tool;
mod rag_tool;

pub use tool::ParamType;
pub use tool::ToolSpec;
pub use tool::ToolParam;
pub use tool::ToolChoice;
pub use tool::Tool;
pub use rag_tool::RagTool;
