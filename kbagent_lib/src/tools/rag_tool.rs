use crate::error::Error;
use crate::llm::CallParam;
use crate::rag::RagEngine;
use super::{ParamType, Tool, ToolParam, ToolSpec};

const PARAM_ERROR: &str = "expect 1 parameter called \"query\" of type string.";

/// Knowledge-base tool: answers a query through its RAG engine.
pub struct RagTool {
    name: String,
    description: String,
    engine: RagEngine,
}

impl RagTool {

    /// Create an instance.
    pub fn new(name: String, description: String, engine: RagEngine) -> Self {
        RagTool {
            name,
            description,
            engine,
        }
    }
}

impl Tool for RagTool {

    fn get_tool_spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name.clone(),
            description: self.description.clone(),
            params: vec![
                ToolParam {
                    name: "query".to_string(),
                    description: "natural language search query".to_string(),
                    data_type: ParamType::String,
                    required: true
                }
            ]
        }
    }

    fn call_tool(&self, params: &[CallParam]) -> Result<String, Error> {
        if params.len() != 1 {
            return Ok(format!("wrong number of input parameters, {PARAM_ERROR}"));
        }

        let param = &params[0];
        if param.name != "query" {
            return Ok(format!("wrong parameter name, {PARAM_ERROR}"));
        }

        match param.value.as_str() {
            Some(query) => {
                tracing::info!(tool = %self.name, query, "querying knowledge base");
                self.engine.process(query)
            },
            None => Ok(format!("wrong parameter value type, {PARAM_ERROR}")),
        }
    }
}
