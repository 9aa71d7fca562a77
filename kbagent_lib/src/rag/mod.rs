//! Retrieval-augmented generation.
//!
//! A [`RagEngine`] runs every retrieval module for the query, concatenates
//! the entries, and hands them to the response stage.

mod knowledge_base;
mod response;

use crate::error::Error;

pub use knowledge_base::CloudKnowledgeBase;
pub use knowledge_base::RetrievalMode;
pub use response::PromptResponse;

/// One retrieved chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    /// Chunk text.
    pub text: String,
    /// Relevance score, if the backend reports one.
    pub score: Option<f64>,
}

/// Retrieval stage.
pub trait RetrievalModule {
    /// Return entries relevant to the query.
    fn retrieve(&self, query: &str) -> Result<Vec<Entry>, Error>;
}

/// Response stage.
pub trait ResponseModule {
    /// Produce the answer from the query and retrieved entries.
    fn respond(&self, query: &str, entries: &[Entry]) -> Result<String, Error>;
}

/// Retrieval followed by response.
pub struct RagEngine {
    retrieval: Vec<Box<dyn RetrievalModule>>,
    response: Box<dyn ResponseModule>,
}

impl RagEngine {

    /// Create engine.
    pub fn new(retrieval: Vec<Box<dyn RetrievalModule>>, response: Box<dyn ResponseModule>) -> Self {
        RagEngine { retrieval, response }
    }

    /// Answer the query.
    pub fn process(&self, query: &str) -> Result<String, Error> {
        let mut entries = vec![];
        for module in self.retrieval.iter() {
            entries.extend(module.retrieve(query)?);
        }

        tracing::debug!(query, entries = entries.len(), "retrieval finished");

        self.response.respond(query, &entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Vec<&'static str>);

    impl RetrievalModule for Fixed {
        fn retrieve(&self, _query: &str) -> Result<Vec<Entry>, Error> {
            Ok(self.0.iter().map(|t| Entry { text: t.to_string(), score: None }).collect())
        }
    }

    struct Failing;

    impl RetrievalModule for Failing {
        fn retrieve(&self, _query: &str) -> Result<Vec<Entry>, Error> {
            Err(Error::ForTests("retrieval"))
        }
    }

    struct Join;

    impl ResponseModule for Join {
        fn respond(&self, query: &str, entries: &[Entry]) -> Result<String, Error> {
            let texts: Vec<&str> = entries.iter().map(|e| e.text.as_str()).collect();
            Ok(format!("{query}: {}", texts.join("|")))
        }
    }

    #[test]
    fn test_engine_concatenates_modules() {
        let engine = RagEngine::new(vec![
            Box::new(Fixed(vec!["a", "b"])),
            Box::new(Fixed(vec!["c"])),
        ], Box::new(Join));

        assert_eq!(engine.process("q").expect("answer"), "q: a|b|c");
    }

    #[test]
    fn test_engine_retrieval_error() {
        let engine = RagEngine::new(vec![Box::new(Failing)], Box::new(Join));
        assert!(matches!(engine.process("q"), Err(Error::ForTests(_))));
    }
}
