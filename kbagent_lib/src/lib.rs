//! Kbagent-lib is a library for building knowledge-base agents.
//! It allows to create a chat with an LLM, attach retrieval tools backed by
//! cloud knowledge bases, and keep conversation memory in the cloud.
//! 
//! ### Features
//! 
//!  - several providers, blocking and streaming
//!  - tool-calling agent loop
//!  - retrieval-augmented generation over cloud knowledge bases
//!  - cloud rulesets and conversation memory
//! 
//! ### Providers
//! 
//! - Anthropic (Claude models)
//! - OpenAI (GPT models)
//! - Google (Gemini)
//! 
//! ### Examples
//! 
//! ```rust no_run
//! use kbagent_lib::agent::Agent;
//! use kbagent_lib::cloud::CloudAuth;
//! use kbagent_lib::rag::{CloudKnowledgeBase, PromptResponse, RagEngine};
//! use kbagent_lib::request::get_reqwest_client;
//! use kbagent_lib::tools::{RagTool, Tool};
//! use kbagent_lib::{Config, ModelProvider};
//!
//! let config = Config::new(ModelProvider::OpenAI, "gpt-4o".into(), "<api-key>".into(), "https://api.openai.com/v1/chat/completions".into());
//! let client = get_reqwest_client().expect("transport created");
//! let auth = CloudAuth::new("<cloud-api-key>".into(), None);
//!
//! let engine = RagEngine::new(
//!     vec![Box::new(CloudKnowledgeBase::new(auth, client.clone(), "<knowledge-base-id>".into()))],
//!     Box::new(PromptResponse::new(config.clone(), client.clone())),
//! );
//! let tools: Vec<Box<dyn Tool>> = vec![Box::new(RagTool::new("KnowledgeBase_1".into(), "Company documents".into(), engine))];
//!
//! let mut agent = Agent::new(config, client, tools, String::new(), None, false).expect("agent created");
//! let answer = agent.run("What is our vacation policy?", &mut |_| {}).expect("answer");
//! println!("{answer}");
//! ```

#![deny(missing_docs)]
#![deny(clippy::suspicious)]
#![allow(clippy::comparison_chain)]
#![allow(clippy::collapsible_else_if)]
#![allow(clippy::collapsible_if)]

mod error;
mod config;
pub mod agent;
pub mod cloud;
pub mod llm;
pub mod memory;
pub mod rag;
pub mod tools;
pub mod request;

pub use error::Error;
pub use config::Config;
pub use config::ModelProvider;
