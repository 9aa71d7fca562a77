use thiserror::Error as ThisError;

/// Library errors.
#[derive(ThisError, Debug)]
pub enum Error {
    /// Missing arguments.
    #[error("Missing mandatory arguments: {0}\nTry `kbagent --help` for more information.")]
    MissingArgError(&'static str),

    /// LLM call error.
    #[error("Failed to call LLM: {0}")]
    LLMCallError(#[from] reqwest::Error),

    /// LLM call error.
    #[error("Failed to process JSON payload: {0}")]
    LLMJsonError(#[from] serde_json::Error),

    /// LLM call error.
    #[error("Failed to parse LLM response: {0}")]
    LLMResponseError(&'static str),

    /// Reading a streamed response failed.
    #[error("Failed to read response stream: {0}")]
    StreamError(#[from] std::io::Error),

    /// Non-success HTTP status without a structured error body.
    #[error("Request failed with status {0}: {1}")]
    HttpStatus(u16, String),

    /// General error.
    #[error("{0}")]
    Error(String),

    /// LLM response error message.
    #[error("LLM provider responded with error: {0}")]
    LLMErrorMessage(String),

    /// Cloud API error message.
    #[error("Cloud API responded with error: {0}")]
    CloudErrorMessage(String),

    /// Cloud response has an unexpected shape.
    #[error("Unexpected cloud API response: {0}")]
    CloudResponseError(&'static str),

    /// Remote object lookup failed.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The agent did not produce an answer in time.
    #[error("Agent exceeded the limit of {0} steps without answering")]
    StepLimit(usize),

    /// LLM response error message.
    #[cfg(test)]
    #[error("Test error: {0}")]
    ForTests(&'static str),
}
