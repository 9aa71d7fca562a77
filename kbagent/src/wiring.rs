//! Builds the agent and its collaborators from the app config, then runs the query.

use std::io::Write;
use std::rc::Rc;
use kbagent_lib::agent::Agent;
use kbagent_lib::cloud::{CloudConversationMemory, CloudRulesetDriver, Ruleset, StructureRunReporter};
use kbagent_lib::memory::ConversationMemory;
use kbagent_lib::rag::{CloudKnowledgeBase, PromptResponse, RagEngine};
use kbagent_lib::request::{get_reqwest_client, Client};
use kbagent_lib::tools::{RagTool, Tool};
use crate::config::Config;
use crate::error::AppError;
use crate::prompts::Prompts;
use crate::term::Term;

/// One retrieval tool per selected knowledge base. None without cloud credentials.
pub fn knowledge_base_tools(config: &Config, client: &Rc<dyn Client>) -> Vec<Box<dyn Tool>> {
    if config.knowledge_base_ids.is_empty() {
        return vec![];
    }

    let Some(auth) = &config.cloud else {
        tracing::warn!("GT_CLOUD_API_KEY not found, knowledge base queries are disabled");
        return vec![];
    };

    let mut tools: Vec<Box<dyn Tool>> = Vec::with_capacity(config.knowledge_base_ids.len());

    for (i, id) in config.knowledge_base_ids.iter().enumerate() {
        let retrieval = CloudKnowledgeBase::new(auth.clone(), client.clone(), id.clone())
            .with_mode(config.catalog.mode(id));
        let response = PromptResponse::new(config.model_params.clone(), client.clone());
        let engine = RagEngine::new(vec![Box::new(retrieval)], Box::new(response));

        tools.push(Box::new(RagTool::new(
            format!("KnowledgeBase_{}", i + 1),
            config.catalog.description(id, i),
            engine,
        )));
    }

    tools
}

/// Cloud conversation memory when a thread id is given.
pub fn conversation_memory(config: &Config, client: &Rc<dyn Client>) -> Result<Option<Box<dyn ConversationMemory>>, AppError> {
    let Some(thread_id) = &config.thread_id else {
        return Ok(None);
    };

    let auth = config.cloud.clone()
        .ok_or(AppError::MissingArgError("GT_CLOUD_API_KEY is required for conversation memory."))?;

    Ok(Some(Box::new(CloudConversationMemory::new(auth, client.clone(), thread_id.clone()))))
}

/// Rulesets fetched from the cloud when an alias is given.
pub fn rulesets(config: &Config, client: &Rc<dyn Client>) -> Result<Vec<Ruleset>, AppError> {
    let Some(alias) = &config.ruleset_alias else {
        return Ok(vec![]);
    };

    let auth = config.cloud.clone()
        .ok_or(AppError::MissingArgError("GT_CLOUD_API_KEY is required for rulesets."))?;

    Ok(vec![CloudRulesetDriver::new(auth, client.clone()).load(alias)?])
}

fn structure_run_reporter(config: &Config, client: &Rc<dyn Client>) -> Option<StructureRunReporter> {
    let run_id = config.structure_run_id.as_ref()?;
    match &config.cloud {
        Some(auth) => Some(StructureRunReporter::new(auth.clone(), client.clone(), run_id.clone())),
        None => {
            tracing::warn!(run_id = %run_id, "GT_CLOUD_API_KEY not found, structure run events are not published");
            None
        }
    }
}

/// Run the query with the HTTP transport, printing to stdout.
pub fn run(config: Config) -> Result<(), AppError> {
    let client = get_reqwest_client()?;
    let mut term = Term::new();
    run_with(config, client, &mut term)
}

/// Run the query using `client` and printing to `term`.
pub fn run_with<W: Write>(config: Config, client: Rc<dyn Client>, term: &mut Term<W>) -> Result<(), AppError> {
    let reporter = structure_run_reporter(&config, &client);
    if let Some(reporter) = &reporter {
        reporter.start(&config.query)?;
    }

    let tools = knowledge_base_tools(&config, &client);
    let memory = conversation_memory(&config, &client)?;
    let prompts = Prompts::new(&rulesets(&config, &client)?, !tools.is_empty());

    if !config.knowledge_base_ids.is_empty() {
        term.print_session(
            config.model_params.provider,
            &config.catalog,
            &config.knowledge_base_ids,
            config.thread_id.as_deref())?;
    }

    let mut agent = Agent::new(
        config.model_params.clone(),
        client,
        tools,
        prompts.system().to_owned(),
        memory,
        config.stream)?;

    tracing::info!(provider = %config.model_params.provider, tools = ?agent.tool_names(), "running agent");

    let answer = if config.stream {
        let mut write_error = None;
        let answer = agent.run(&config.query, &mut |token: &str| {
            if write_error.is_none() {
                write_error = term.print_token(token).err();
            }
        })?;
        if let Some(err) = write_error {
            return Err(err.into());
        }
        term.end_stream()?;
        answer
    } else {
        let answer = agent.run(&config.query, &mut |_: &str| {})?;
        term.print_answer(&answer)?;
        answer
    };

    if let Some(reporter) = &reporter {
        reporter.finish(&answer)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use kbagent_lib::cloud::CloudAuth;
    use kbagent_lib::request::stub::{Exchange, StubClient};
    use kbagent_lib::llm::CallParam;
    use kbagent_lib::rag::RetrievalMode;
    use kbagent_lib::ModelProvider;
    use crate::catalog::KnowledgeBase;
    use crate::options::Options;

    fn config(options: Options) -> Config {
        Config::try_from(Options {
            openai_api_key: Some("sk".into()),
            google_api_key: Some("google-key".into()),
            ..options
        }).expect("create config")
    }

    fn stub(exchanges: Vec<Exchange>) -> (Rc<StubClient>, Rc<dyn Client>) {
        let stub = Rc::new(StubClient::sequence(exchanges));
        let client: Rc<dyn Client> = stub.clone();
        (stub, client)
    }

    fn output(term: Term<Vec<u8>>) -> String {
        String::from_utf8(term.into_inner()).expect("utf-8 output")
    }

    #[test]
    fn test_no_flags() {
        let config = config(Options::default());
        let (_, client) = stub(vec![]);

        assert_eq!(config.model_params.provider, ModelProvider::Google);
        assert!(knowledge_base_tools(&config, &client).is_empty());
        assert!(conversation_memory(&config, &client).expect("memory").is_none());
        assert!(rulesets(&config, &client).expect("rulesets").is_empty());
    }

    #[test]
    fn test_tools_per_knowledge_base() {
        let config = config(Options {
            knowledge_base_ids: Some("MAPS,11111111-2222-3333-4444-555555555555".into()),
            cloud_api_key: Some("gt-key".into()),
            ..Options::default()
        });
        let (_, client) = stub(vec![]);

        let tools = knowledge_base_tools(&config, &client);
        let specs: Vec<_> = tools.iter().map(|t| t.get_tool_spec()).collect();

        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].name, "KnowledgeBase_1");
        assert!(specs[0].description.starts_with("MAPS:"));
        assert_eq!(specs[1].name, "KnowledgeBase_2");
        assert!(specs[1].description.starts_with("Knowledge base #2"));
    }

    #[test]
    fn test_search_mode_from_catalog() {
        let config = config(Options {
            provider: Some("openai".into()),
            api_url: Some("https://llm.test/chat".into()),
            knowledge_base_ids: Some("Handbook".into()),
            knowledge_bases: vec![KnowledgeBase {
                id: "00000000-0000-0000-0000-000000000002".into(),
                name: "Handbook".into(),
                org_url: String::new(),
                mode: RetrievalMode::Search,
            }],
            cloud_api_key: Some("gt-key".into()),
            cloud_base_url: Some("https://cloud.test".into()),
            ..Options::default()
        });

        let (stub, client) = stub(vec![
            Exchange::post(json!({"response": ["Vacation is 25 days."]}))
                .url("https://cloud.test/api/knowledge-bases/00000000-0000-0000-0000-000000000002/search")
                .payload(json!({"query": "vacation", "count": 5})),
            Exchange::post(json!({
                "choices": [{
                    "index": 0,
                    "message": { "role": "assistant", "content": "25 days." },
                    "finish_reason": "stop"
                }]
            })).url("https://llm.test/chat"),
        ]);

        let tools = knowledge_base_tools(&config, &client);
        let answer = tools[0].call_tool(&[CallParam { name: "query".into(), value: json!("vacation") }]).expect("answer");

        assert_eq!(answer, "25 days.");
        assert_eq!(stub.remaining(), 0);
    }

    #[test]
    fn test_no_tools_without_cloud_key() {
        let config = config(Options {
            knowledge_base_ids: Some("all".into()),
            ..Options::default()
        });
        let (_, client) = stub(vec![]);

        assert_eq!(config.knowledge_base_ids.len(), 5);
        assert!(knowledge_base_tools(&config, &client).is_empty());
    }

    #[test]
    fn test_memory_and_rulesets_need_cloud_key() {
        let config = config(Options {
            thread_id: Some("th".into()),
            ruleset_alias: Some("tone".into()),
            ..Options::default()
        });
        let (_, client) = stub(vec![]);

        assert!(matches!(conversation_memory(&config, &client), Err(AppError::MissingArgError(_))));
        assert!(matches!(rulesets(&config, &client), Err(AppError::MissingArgError(_))));
    }

    #[test]
    fn test_rulesets_loaded() {
        let config = config(Options {
            ruleset_alias: Some("tone".into()),
            cloud_api_key: Some("gt-key".into()),
            ..Options::default()
        });
        let (stub, client) = stub(vec![
            Exchange::get(json!({"rulesets": [{"ruleset_id": "rs-1"}]})).params(&[("alias", "tone")]),
            Exchange::get(json!({"rules": [{"rule": "Be brief."}]})).params(&[("ruleset_id", "rs-1")]),
        ]);

        let rulesets = rulesets(&config, &client).expect("rulesets");
        assert_eq!(rulesets, vec![Ruleset { name: "tone".into(), rules: vec!["Be brief.".into()] }]);
        assert_eq!(stub.remaining(), 0);
    }

    #[test]
    fn test_run_blocking() {
        let config = config(Options {
            provider: Some("openai".into()),
            api_url: Some("https://llm.test/chat".into()),
            query: Some("Hi".into()),
            ..Options::default()
        });

        let (stub, client) = stub(vec![
            Exchange::post(json!({
                "choices": [{
                    "index": 0,
                    "message": { "role": "assistant", "content": "Hello!" },
                    "finish_reason": "stop"
                }]
            })).url("https://llm.test/chat"),
        ]);

        let mut term = Term::with_writer(Vec::new(), true);
        run_with(config, client, &mut term).expect("run");

        assert_eq!(output(term), "Hello!\n");
        assert_eq!(stub.remaining(), 0);
    }

    #[test]
    fn test_run_streaming_with_memory_and_events() {
        let config = config(Options {
            provider: Some("openai".into()),
            api_url: Some("https://llm.test/chat".into()),
            query: Some("Again?".into()),
            stream: Some(true),
            thread_id: Some("th-1".into()),
            cloud_api_key: Some("gt-key".into()),
            cloud_base_url: Some("https://cloud.test".into()),
            structure_run_id: Some("run-1".into()),
            ..Options::default()
        });

        let body = concat!(
            "data: {\"choices\":[{\"index\":0,\"delta\":{\"role\":\"assistant\",\"content\":\"Sure\"}}]}\n\n",
            "data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\" thing\"}}]}\n\n",
            "data: [DONE]\n\n",
        );

        let (stub, client) = stub(vec![
            Exchange::post(json!({})).url("https://cloud.test/api/structure-runs/run-1/events"),
            Exchange::get(json!({"messages": []})).url("https://cloud.test/api/threads/th-1/messages"),
            Exchange::stream(body).url("https://llm.test/chat"),
            Exchange::post(json!({})).url("https://cloud.test/api/threads/th-1/messages"),
            Exchange::post(json!({})).url("https://cloud.test/api/structure-runs/run-1/events"),
        ]);

        let mut term = Term::with_writer(Vec::new(), true);
        run_with(config, client, &mut term).expect("run");

        assert_eq!(output(term), "Sure thing\n");
        assert_eq!(stub.remaining(), 0);
    }

    #[test]
    fn test_session_printed_for_knowledge_bases() {
        let config = config(Options {
            provider: Some("openai".into()),
            api_url: Some("https://llm.test/chat".into()),
            knowledge_base_ids: Some("MAPS".into()),
            cloud_api_key: Some("gt-key".into()),
            ..Options::default()
        });

        let (_, client) = stub(vec![
            Exchange::post(json!({
                "choices": [{
                    "index": 0,
                    "message": { "role": "assistant", "content": "Ask me about MAPS." },
                    "finish_reason": "stop"
                }]
            })),
        ]);

        let mut term = Term::with_writer(Vec::new(), true);
        run_with(config, client, &mut term).expect("run");

        let out = output(term);
        assert!(out.starts_with("Using model provider: openai\nKnowledge bases loaded:\n  - MAPS (f88d9d45-f25e-4051-8a84-a8d7873622b8)\n"));
        assert!(out.ends_with("Ask me about MAPS.\n"));
    }

    #[test]
    fn test_cloud_auth_from_config() {
        let config = config(Options {
            cloud_api_key: Some("gt-key".into()),
            ..Options::default()
        });
        let auth: Option<CloudAuth> = config.cloud;
        assert_eq!(auth.map(|a| a.base_url), Some(kbagent_lib::cloud::DEFAULT_BASE_URL.to_owned()));
    }
}
