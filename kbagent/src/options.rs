//! App initialization functions.

use anstyle::Style;
use clap::parser::ValueSource;
use clap::Arg;
use clap::ArgAction;
use clap::ArgMatches;
use clap::builder::FalseyValueParser;
use clap::Command;
use std::collections::HashMap;
use std::ffi::OsString;
use std::str::FromStr;
use crate::catalog::KnowledgeBase;
use crate::error::AppError;
use crate::toml_parser::parse_toml_config;
use dirs::home_dir;

/// Config file looked up in the home directory.
pub const CONFIG_FILE_NAME: &str = ".kbagent.toml";

/// Model settings of one provider from the config file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderSettings {
    /// Model name.
    pub model: Option<String>,
    /// Model API URL.
    pub api_url: Option<String>,
    /// Model API version.
    pub api_version: Option<String>,
    /// Maximum number of tokens that will be generated.
    pub max_tokens: Option<i64>,
    /// Level of randomization when choosing tokens.
    pub temperature: Option<f64>,
}

/// App options.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Model provider.
    pub provider: Option<String>,
    /// Knowledge base selection: ids, names, or `all`.
    pub knowledge_base_ids: Option<String>,
    /// User query.
    pub query: Option<String>,
    /// Cloud ruleset alias.
    pub ruleset_alias: Option<String>,
    /// Stream the answer.
    pub stream: Option<bool>,
    /// Cloud thread id for conversation memory.
    pub thread_id: Option<String>,
    /// Print the knowledge base catalog and exit.
    pub list_kb: bool,
    /// Model name.
    pub model: Option<String>,
    /// Model API URL.
    pub api_url: Option<String>,
    /// Model API version.
    pub api_version: Option<String>,
    /// Maximum number of tokens that will be generated.
    pub max_tokens: Option<i64>,
    /// Level of randomization when choosing tokens.
    pub temperature: Option<f64>,
    /// OpenAI API key.
    pub openai_api_key: Option<String>,
    /// Anthropic API key.
    pub anthropic_api_key: Option<String>,
    /// Google API key.
    pub google_api_key: Option<String>,
    /// Cloud API key.
    pub cloud_api_key: Option<String>,
    /// Cloud API base URL.
    pub cloud_base_url: Option<String>,
    /// Structure run id, set when running inside the cloud runtime.
    pub structure_run_id: Option<String>,
    /// Per-provider settings from the config file.
    pub provider_settings: HashMap<String, ProviderSettings>,
    /// Knowledge bases added by the config file.
    pub knowledge_bases: Vec<KnowledgeBase>,
}


macro_rules! check_and_set_float_arg {
    ($arg:literal, $m:ident, $option:expr) => {
        if let Some(x) = $m.get_one::<String>($arg) {
            if let Ok(val) = f64::from_str(x) {
                $option.replace(val);  
            } else {
                return Err(AppError::InvalidArgError(concat!($arg, " must be floating point number")));
            }
        }
    }
}

macro_rules! set_str_arg {
    ($arg:literal, $m:ident, $option:expr) => {
        if let Some(x) = $m.get_one::<String>($arg) {
            $option.replace(x.clone());
        }
    }
}

fn secret_arg(name: &'static str, env: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .env(env)
        .hide(true)
        .hide_env_values(true)
        .required(false)
}

impl Options {

    fn argument_parser<T>(args: impl IntoIterator<Item = T>) -> Result<ArgMatches, AppError> where T: Into<OsString> + Clone {
        let bold_underline = Style::new().underline().bold();
        let bold = Style::new().bold();

        Ok(Command::new("kbagent")
            .about("Ask an agent backed by one or more cloud knowledge bases.")
            .version(env!("CARGO_PKG_VERSION"))
            .arg(
                Arg::new("provider")
                .long("provider")
                .help("Model provider, one of: openai, anthropic, google [default: google]")
                .short('p')
                .env("KBAGENT_PROVIDER")
                .required(false)
            ).arg(
                Arg::new("knowledge-base-ids")
                .long("knowledge-base-ids")
                .help("Comma-separated knowledge base IDs or names, or 'all'")
                .short('k')
                .env("KBAGENT_KNOWLEDGE_BASE_IDS")
                .required(false)
            ).arg(
                Arg::new("list-kb")
                .long("list-kb")
                .help("List available knowledge bases and exit")
                .action(ArgAction::SetTrue)
            ).arg(
                Arg::new("query")
                .long("query")
                .help("The query to ask across the knowledge bases")
                .short('q')
                .env("KBAGENT_QUERY")
                .required(false)
            ).arg(
                Arg::new("ruleset-alias")
                .long("ruleset-alias")
                .help("Cloud ruleset alias")
                .short('r')
                .env("KBAGENT_RULESET_ALIAS")
                .required(false)
            ).arg(
                Arg::new("stream")
                .long("stream")
                .help("Stream the answer as it is generated")
                .short('s')
                .env("KBAGENT_STREAM")
                .action(ArgAction::SetTrue)
                .value_parser(FalseyValueParser::new())
            ).arg(
                Arg::new("thread-id")
                .long("thread-id")
                .help("Cloud thread ID used for conversation memory")
                .short('t')
                .env("KBAGENT_THREAD_ID")
                .required(false)
            ).arg(
                Arg::new("config")
                .long("config")
                .help("Config file path")
                .short('c')
                .env("KBAGENT_CONFIG")
                .required(false)
            ).arg(
                Arg::new("model")
                .long("model")
                .help("Inference model name")
                .short('m')
                .env("KBAGENT_MODEL")
                .required(false)
            ).arg(
                Arg::new("api-url")
                .long("api-url")
                .help("Model API URL")
                .short('u')
                .env("KBAGENT_API_URL")
                .required(false)
            ).arg(
                Arg::new("api-version")
                .long("api-version")
                .help("Model API version")
                .env("KBAGENT_API_VERSION")
                .required(false)
            ).arg(
                Arg::new("max-tokens")
                .long("max-tokens")
                .help("Maximum number of tokens that will be generated")
                .env("KBAGENT_MAX_TOKENS")
                .required(false)
            ).arg(
                Arg::new("temperature")
                .long("temperature")
                .help("Level of randomization when LLM choose tokens")
                .env("KBAGENT_TEMPERATURE")
                .required(false)
            )
            .arg(secret_arg("openai-api-key", "OPENAI_API_KEY"))
            .arg(secret_arg("anthropic-api-key", "ANTHROPIC_API_KEY"))
            .arg(secret_arg("google-api-key", "GOOGLE_API_KEY"))
            .arg(secret_arg("cloud-api-key", "GT_CLOUD_API_KEY"))
            .arg(secret_arg("cloud-base-url", "GT_CLOUD_BASE_URL"))
            .arg(secret_arg("structure-run-id", "GT_CLOUD_STRUCTURE_RUN_ID"))
            .after_help(format!("{bold_underline}Examples:{bold_underline:#} {bold}

    kbagent -p openai -k \"Blossom Analysis,MAPS\" -q \"What is known about psilocybin?\"
    kbagent -k all -s -t <thread-id> -r <ruleset-alias>{bold:#}

API keys are read from OPENAI_API_KEY, ANTHROPIC_API_KEY, GOOGLE_API_KEY, and GT_CLOUD_API_KEY (a .env file is loaded if present).
kbagent uses the configuration file {CONFIG_FILE_NAME} from user's home directory, or the one specified with -c option.
The configuration options can be overridden with the command line arguments or environment variables."))
            .try_get_matches_from(args)?)
    }

    fn load_config_file(path: Option<&str>) -> Result<Option<String>, std::io::Error> {
        Ok(if let Some(p) = path {
            Some(std::fs::read_to_string(p)?)
        } else if let Some(mut p) = home_dir() {
            p.push(CONFIG_FILE_NAME);
            if std::fs::exists(p.as_path())? {
                Some(std::fs::read_to_string(p.as_path())?)
            } else {
                None
            }
        } else {
            None
        })
    }

    /// Load and validate options from env, command line arguments, config file.
    pub fn load<T>(args: impl IntoIterator<Item = T>) -> Result<Self, AppError> 
        where T: Into<OsString> + Clone 
    {
        let m = Self::argument_parser(args)?;

        let config_path = m.get_one("config").map(|s: &String| s.as_ref());

        let content = Self::load_config_file(config_path)
            .map_err(|err| AppError::Error(format!("Error loading config file: {}", err)))?;

        Self::from_matches(&m, content.as_deref())
    }

    fn from_matches(m: &ArgMatches, config_content: Option<&str>) -> Result<Self, AppError> {
        let mut options = Options::default();

        if let Some(content) = config_content {
            parse_toml_config(content, &mut options)?;
        }

        set_str_arg!("provider", m, options.provider);
        set_str_arg!("knowledge-base-ids", m, options.knowledge_base_ids);
        set_str_arg!("query", m, options.query);
        set_str_arg!("ruleset-alias", m, options.ruleset_alias);
        set_str_arg!("thread-id", m, options.thread_id);
        set_str_arg!("model", m, options.model);
        set_str_arg!("api-url", m, options.api_url);
        set_str_arg!("api-version", m, options.api_version);
        set_str_arg!("openai-api-key", m, options.openai_api_key);
        set_str_arg!("anthropic-api-key", m, options.anthropic_api_key);
        set_str_arg!("google-api-key", m, options.google_api_key);
        set_str_arg!("cloud-api-key", m, options.cloud_api_key);
        set_str_arg!("cloud-base-url", m, options.cloud_base_url);
        set_str_arg!("structure-run-id", m, options.structure_run_id);

        if m.value_source("stream").is_some_and(|s| s != ValueSource::DefaultValue) {
            options.stream.replace(m.get_flag("stream"));
        }

        options.list_kb = m.get_flag("list-kb");

        if let Some(x) = m.get_one::<String>("max-tokens") {
            if let Ok(val) = x.parse::<i64>() {
                if val < 0 { return Err(AppError::InvalidArgError("max-tokens must be non-negative")) };
                options.max_tokens.replace(val);
            } else {
                return Err(AppError::InvalidArgError("max-tokens must be integer"));
            }
        }

        check_and_set_float_arg!("temperature", m, options.temperature);

        Ok(options)
    }
}
