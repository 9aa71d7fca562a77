use kbagent_lib::ModelProvider;

/// Anthropic API version used when none is configured.
pub const ANTHROPIC_API_VERSION: &str = "2023-06-01";

/// Anthropic requires max_tokens, this is used when none is configured.
pub const ANTHROPIC_MAX_TOKENS: i64 = 4096;

/// API URL by provider.
pub fn api_url_for_provider(provider: ModelProvider, model: &str) -> String {
    match provider {
        ModelProvider::OpenAI => "https://api.openai.com/v1/chat/completions".into(),
        ModelProvider::Anthropic => "https://api.anthropic.com/v1/messages".into(),
        ModelProvider::Google => format!("https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent", model),
    }
}

/// Default model by provider.
pub fn default_model(provider: ModelProvider) -> &'static str {
    match provider {
        ModelProvider::OpenAI => "gpt-4o",
        ModelProvider::Anthropic => "claude-3-7-sonnet-latest",
        ModelProvider::Google => "gemini-2.0-flash",
    }
}

/// Environment variable holding the provider API key.
pub fn api_key_env(provider: ModelProvider) -> &'static str {
    match provider {
        ModelProvider::OpenAI => "OPENAI_API_KEY",
        ModelProvider::Anthropic => "ANTHROPIC_API_KEY",
        ModelProvider::Google => "GOOGLE_API_KEY",
    }
}

/// UUID-shaped string: 36 characters with four dashes.
pub fn looks_like_uuid(s: &str) -> bool {
    s.len() == 36 && s.matches('-').count() == 4
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn test_provider_defaults() {
        assert_eq!(api_url_for_provider(ModelProvider::Google, "gemini-2.0-flash"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent");
        assert_eq!(default_model(ModelProvider::Anthropic), "claude-3-7-sonnet-latest");
        assert_eq!(api_key_env(ModelProvider::OpenAI), "OPENAI_API_KEY");
    }

    #[test]
    fn test_looks_like_uuid() {
        assert!(looks_like_uuid("8be6dfd9-ecaf-4e2b-8414-01aecb67e147"));
        assert!(!looks_like_uuid("MAPS"));
        assert!(!looks_like_uuid("8be6dfd9ecaf4e2b841401aecb67e147"));
    }
}
