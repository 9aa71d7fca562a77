use std::fmt::Display;

use crate::error::Error;

/// Model providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelProvider {
    /// Open AI.
    OpenAI,
    /// Anthropic.
    Anthropic,
    /// Google (Gemini).
    Google,
}

impl ModelProvider {
    /// All providers in the order they are listed on the command line.
    pub const ALL: [ModelProvider; 3] = [ModelProvider::OpenAI, ModelProvider::Anthropic, ModelProvider::Google];

    /// Name used on the command line and in config files.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelProvider::OpenAI => "openai",
            ModelProvider::Anthropic => "anthropic",
            ModelProvider::Google => "google",
        }
    }
}

impl Display for ModelProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ModelProvider {
    type Error = Error;

    fn try_from(val: &str) -> Result<Self, Self::Error> {
        match val {
            "openai" => Ok(ModelProvider::OpenAI),
            "anthropic" => Ok(ModelProvider::Anthropic),
            "google" => Ok(ModelProvider::Google),
            _ => Err(Error::Error(format!("unknown provider: {val}"))),
        }
    }
}

/// Model parameters.
#[derive(Clone, Debug)]
pub struct Config {
    /// Model provider.
    pub provider: ModelProvider,
    /// Model name.
    pub name: String,
    /// API key.
    pub api_key: String,
    /// Model API URL.
    pub api_url: String,
    /// Model API version.
    pub api_version: Option<String>,
    /// Maximum number of tokens that will be generated.
    pub max_tokens: Option<i64>,
    /// Number of variants to generate.
    pub n: Option<i64>,
    /// Level of randomization when choosing tokens.
    pub temperature: Option<f64>,
    /// Only the tokens comprising the top_p probability mass will be considered.
    pub top_p: Option<f64>,
    /// Only k tokens with the most probability will be considered.
    pub top_k: Option<i64>,
    /// Penalize new tokens based on their existing frequency.
    pub frequency_penalty: Option<f64>,
    /// Penalize new tokens based on whether they appear in the text so far.
    pub presence_penalty: Option<f64>,
    /// Sequences at which model will stop generating.
    pub stop_sequence: Option<String>,
}


impl Config {

    /// Create minimal config using provider, model name, API key, and API URL.
    pub fn new(provider: ModelProvider, name: String, api_key: String, api_url: String) -> Self {
        Config {
            provider,
            name,
            api_key,
            api_url,
            api_version: None,
            max_tokens: None,
            n: None,
            temperature: None,
            top_p: None,
            top_k: None,
            frequency_penalty: None,
            presence_penalty: None,
            stop_sequence: None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_names() {
        for provider in ModelProvider::ALL {
            let parsed = ModelProvider::try_from(provider.as_str()).expect("parse provider name");
            assert_eq!(parsed, provider);
        }
        assert!(matches!(ModelProvider::try_from("gcp"), Err(Error::Error(_))));
        assert!(matches!(ModelProvider::try_from("OpenAI"), Err(Error::Error(_))));
    }
}
