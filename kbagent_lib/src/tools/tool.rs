use serde::Serialize;
use crate::error::Error;
use crate::llm::CallParam;

/// Tool parameter data types.
#[derive(Debug, Clone, Copy)]
pub enum ParamType {
    /// String.
    String,
    /// Integer.
    Integer,
    /// Number.
    Number,
    /// Boolean.
    Boolean,
}

impl Serialize for ParamType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where S: serde::Serializer {
        match &self {
            ParamType::String => serializer.serialize_str("string"),
            ParamType::Integer => serializer.serialize_str("integer"),
            ParamType::Number => serializer.serialize_str("number"),
            ParamType::Boolean => serializer.serialize_str("boolean"),
        }
    }
}

/// Tool parameter specification.
#[derive(Debug, Clone)]
pub struct ToolParam {
    /// Parameter name.
    pub name: String,
    /// Parameter description.
    pub description: String,
    /// Parameter data type.
    pub data_type: ParamType,
    /// Value is required.
    pub required: bool,
}

/// Tool specification.
#[derive(Debug, Clone)]
pub struct ToolSpec {
    /// Tool/function name.
    pub name: String,
    /// Tool description.
    pub description: String,
    /// Tool parameters.
    pub params: Vec<ToolParam>,
}

/// Tool choice settings.
#[derive(Debug, Clone)]
pub enum ToolChoice {
    /// Do not use tools.
    None,
    /// LLM decide whether to call any of provided tools or not.
    Auto,
    /// LLM must use any one of the provided tools.
    CallOne,
    /// LLM must call specified tool (name).
    Force(String)
}

/// Something the agent can call.
pub trait Tool {
    /// Return tool specification.
    fn get_tool_spec(&self) -> ToolSpec;

    /// Check params and execute tool.
    /// Invalid input is reported back to the model as text, not as an error.
    fn call_tool(&self, params: &[CallParam]) -> Result<String, Error>;
}
