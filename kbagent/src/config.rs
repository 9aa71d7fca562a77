use kbagent_lib::cloud::CloudAuth;
use kbagent_lib::Config as ModelParams;
use kbagent_lib::ModelProvider;

use crate::catalog::Catalog;
use crate::error::AppError;
use crate::options::Options;
use crate::util::{api_key_env, api_url_for_provider, default_model, ANTHROPIC_API_VERSION, ANTHROPIC_MAX_TOKENS};

/// Query used when none is given.
pub const DEFAULT_QUERY: &str = "Hello! What information can you help me with?";

/// App config
#[derive(Clone, Debug)]
pub struct Config {
    /// Model parameters
    pub model_params: ModelParams,
    /// Selected knowledge base ids, in selection order
    pub knowledge_base_ids: Vec<String>,
    /// Knowledge base catalog
    pub catalog: Catalog,
    /// User query
    pub query: String,
    /// Cloud ruleset alias
    pub ruleset_alias: Option<String>,
    /// Stream the answer
    pub stream: bool,
    /// Cloud thread id
    pub thread_id: Option<String>,
    /// Cloud credentials, if the cloud API key is set
    pub cloud: Option<CloudAuth>,
    /// Cloud structure run id
    pub structure_run_id: Option<String>,
}

impl TryFrom<Options> for Config {
    type Error = AppError;

    fn try_from(options: Options) -> Result<Self, AppError> {
        let provider: ModelProvider = match &options.provider {
            Some(p) => p.as_str().try_into()
                .map_err(|_| AppError::InvalidArgError("provider must be one of: openai, anthropic, google"))?,
            None => ModelProvider::Google,
        };

        let file = options.provider_settings.get(provider.as_str()).cloned().unwrap_or_default();

        let api_key = match provider {
            ModelProvider::OpenAI => options.openai_api_key,
            ModelProvider::Anthropic => options.anthropic_api_key,
            ModelProvider::Google => options.google_api_key,
        }.ok_or_else(|| AppError::Error(format!("{} is not set for provider {}", api_key_env(provider), provider)))?;

        let model = options.model.or(file.model).unwrap_or_else(|| default_model(provider).to_owned());
        let api_url = options.api_url.or(file.api_url).unwrap_or_else(|| api_url_for_provider(provider, &model));

        let mut model_params = ModelParams::new(provider, model, api_key, api_url);
        model_params.api_version = options.api_version.or(file.api_version);
        model_params.max_tokens = options.max_tokens.or(file.max_tokens);
        model_params.temperature = options.temperature.or(file.temperature);

        if provider == ModelProvider::Anthropic {
            model_params.api_version.get_or_insert_with(|| ANTHROPIC_API_VERSION.to_owned());
            model_params.max_tokens.get_or_insert(ANTHROPIC_MAX_TOKENS);
        }

        let catalog = Catalog::new(options.knowledge_bases);
        let knowledge_base_ids = options.knowledge_base_ids
            .map(|s| catalog.parse_selection(&s))
            .unwrap_or_default();

        let cloud = options.cloud_api_key.map(|key| CloudAuth::new(key, options.cloud_base_url));

        Ok(Config {
            model_params,
            knowledge_base_ids,
            catalog,
            query: options.query.unwrap_or_else(|| DEFAULT_QUERY.to_owned()),
            ruleset_alias: options.ruleset_alias,
            stream: options.stream.unwrap_or(false),
            thread_id: options.thread_id,
            cloud,
            structure_run_id: options.structure_run_id,
        })
    }
}
