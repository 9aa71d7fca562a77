use toml::Table;
use toml::Value;
use kbagent_lib::ModelProvider;
use kbagent_lib::rag::RetrievalMode;
use crate::catalog::KnowledgeBase;
use crate::options::{Options, ProviderSettings};
use crate::error::AppError;

fn get_str_val<'a>(val: &'a Value, err: &'static str) -> Result<&'a str, AppError> {
    val.as_str().ok_or(AppError::ConfigParseError(err))
}

fn get_int_val(val: &Value, err: &'static str) -> Result<i64, AppError> {
    val.as_integer().ok_or(AppError::ConfigParseError(err))
}

// integers are accepted where a float is expected
fn get_float_val(val: &Value, err: &'static str) -> Result<f64, AppError> {
    match val {
        Value::Float(f) => Ok(*f),
        Value::Integer(i) => Ok(*i as f64),
        _ => Err(AppError::ConfigParseError(err)),
    }
}

fn get_bool_val(val: &Value, err: &'static str) -> Result<bool, AppError> {
    val.as_bool().ok_or(AppError::ConfigParseError(err))
}

fn get_table<'a>(val: &'a Value, err: &'static str) -> Result<&'a Table, AppError> {
    val.as_table().ok_or(AppError::ConfigParseError(err))
}

fn parse_provider_settings(pt: &Table) -> Result<ProviderSettings, AppError> {
    let mut settings = ProviderSettings::default();

    if let Some(val) = pt.get("model") {
        settings.model.replace(get_str_val(val, "model must be a string value")?.to_owned());
    }

    if let Some(val) = pt.get("api_url") {
        settings.api_url.replace(get_str_val(val, "api_url must be a string value")?.to_owned());
    }

    if let Some(val) = pt.get("api_version") {
        settings.api_version.replace(get_str_val(val, "api_version must be a string value")?.to_owned());
    }

    if let Some(val) = pt.get("max_tokens") {
        let max_tokens = get_int_val(val, "max_tokens must be an integer value")?;
        if max_tokens < 0 {
            return Err(AppError::ConfigParseError("max_tokens must be non-negative"));
        }
        settings.max_tokens.replace(max_tokens);
    }

    if let Some(val) = pt.get("temperature") {
        settings.temperature.replace(get_float_val(val, "temperature must be a float value")?);
    }

    Ok(settings)
}

fn parse_knowledge_base(val: &Value) -> Result<KnowledgeBase, AppError> {
    let kb = get_table(val, "knowledge_bases must be an array of tables")?;

    let id = kb.get("id").ok_or(AppError::ConfigParseError("knowledge base id is not specified"))?;
    let name = kb.get("name").ok_or(AppError::ConfigParseError("knowledge base name is not specified"))?;

    let org_url = match kb.get("org_url") {
        Some(val) => get_str_val(val, "knowledge base org_url must be a string value")?.to_owned(),
        None => String::new(),
    };

    let mode = match kb.get("mode") {
        Some(val) => RetrievalMode::try_from(get_str_val(val, "knowledge base mode must be a string value")?)
            .map_err(|_| AppError::ConfigParseError("knowledge base mode must be one of query, search"))?,
        None => RetrievalMode::Query,
    };

    Ok(KnowledgeBase {
        id: get_str_val(id, "knowledge base id must be a string value")?.to_owned(),
        name: get_str_val(name, "knowledge base name must be a string value")?.to_owned(),
        org_url,
        mode,
    })
}

pub fn parse_toml_config(content: &str, options: &mut Options) -> Result<(), AppError> {

    let toml_config: Table = toml::from_str(content)?;

    if let Some(defaults) = toml_config.get("defaults") {
        let dt = get_table(defaults, "defaults must be a table")?;

        if let Some(val) = dt.get("provider") {
            options.provider.replace(get_str_val(val, "provider must be a string value")?.to_owned());
        }

        if let Some(val) = dt.get("stream") {
            options.stream.replace(get_bool_val(val, "stream must be a boolean value")?);
        }
    }

    if let Some(providers) = toml_config.get("providers") {
        let pt = get_table(providers, "providers must be a table")?;

        for (name, section) in pt.iter() {
            if ModelProvider::try_from(name.as_str()).is_err() {
                return Err(AppError::ConfigParseError("providers section must be one of openai, anthropic, google"));
            }
            let section = get_table(section, "provider settings must be a table")?;
            options.provider_settings.insert(name.clone(), parse_provider_settings(section)?);
        }
    }

    if let Some(cloud) = toml_config.get("cloud") {
        let ct = get_table(cloud, "cloud must be a table")?;

        if let Some(val) = ct.get("base_url") {
            options.cloud_base_url.replace(get_str_val(val, "cloud base_url must be a string value")?.to_owned());
        }
    }

    if let Some(kbs) = toml_config.get("knowledge_bases") {
        let arr = kbs.as_array().ok_or(AppError::ConfigParseError("knowledge_bases must be an array of tables"))?;
        for kb in arr {
            options.knowledge_bases.push(parse_knowledge_base(kb)?);
        }
    }

    Ok(())
}
