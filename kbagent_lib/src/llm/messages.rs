use serde_json::Value;

/// Speaker of a text message. Providers name the roles differently,
/// the discriminant indexes their role tables.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Role {
    /// Instructions for the model.
    System = 0,
    /// The model.
    Model = 1,
    /// The person asking.
    User = 2,
}

/// One item of a chat exchange.
#[derive(Debug, Clone)]
pub enum Message {
    /// Text message.
    Text(Text),
    /// The model asks to call a tool.
    ToolCall(ToolCall),
    /// Output of a tool call sent back to the model.
    ToolResult(ToolResult),
}

impl Message {
    /// Create text message.
    pub fn text(role: Role, message: String) -> Self {
        Message::Text(Text { role, message })
    }

    /// Question from the user.
    pub fn user(message: String) -> Self {
        Message::text(Role::User, message)
    }

    /// Earlier answer of the model.
    pub fn model(message: String) -> Self {
        Message::text(Role::Model, message)
    }

    /// Create tool result message.
    pub fn tool_result(call_id: String, name: String, result: String) -> Self {
        Message::ToolResult(ToolResult { call_id, name, result })
    }

    #[cfg(test)]
    pub(crate) fn tool_use(call_id: String, name: String, params: Vec<CallParam>) -> Self {
        Message::ToolCall(ToolCall { call_id, name, params })
    }

    /// Text content, `None` for tool traffic.
    pub fn into_text(self) -> Option<String> {
        match self {
            Message::Text(text) => Some(text.message),
            _ => None,
        }
    }
}

/// Text message.
#[derive(Debug, Clone)]
pub struct Text {
    /// Role.
    pub role: Role,
    /// Message content.
    pub message: String,
}

/// Tool call result.
#[derive(Debug, Clone)]
pub struct ToolResult {
    /// Id of the call this result answers. Empty for providers without call ids.
    pub call_id: String,
    /// Tool name.
    pub name: String,
    /// Call result.
    pub result: String
}

/// Tool call request.
#[derive(Debug, Clone)]
pub struct ToolCall {
    /// Call id.
    pub call_id: String,
    /// Tool name.
    pub name: String,
    /// Arguments in the order the model sent them.
    pub params: Vec<CallParam>,
}

/// Argument of a tool call.
#[derive(Debug, Clone)]
pub struct CallParam {
    /// Parameter name.
    pub name: String,
    /// Value.
    pub value: Value,
}
