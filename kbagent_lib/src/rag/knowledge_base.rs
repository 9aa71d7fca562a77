use std::rc::Rc;
use serde_json::{json, Value};
use crate::cloud::{artifact_text, check_for_error, CloudAuth};
use crate::error::Error;
use crate::request::Client;
use super::{Entry, RetrievalModule};

const DEFAULT_COUNT: u32 = 5;

/// Which knowledge-base endpoint to use.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RetrievalMode {
    /// Vector query returning scored entries.
    Query,
    /// Search returning plain text chunks.
    Search,
}

impl TryFrom<&str> for RetrievalMode {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "query" => Ok(RetrievalMode::Query),
            "search" => Ok(RetrievalMode::Search),
            _ => Err(Error::Error(format!("unknown retrieval mode \"{value}\", expected \"query\" or \"search\""))),
        }
    }
}

/// Knowledge base hosted in the cloud.
pub struct CloudKnowledgeBase {
    auth: CloudAuth,
    client: Rc<dyn Client>,
    id: String,
    mode: RetrievalMode,
    count: u32,
}

impl CloudKnowledgeBase {

    /// Create retrieval module for the knowledge base `id`.
    pub fn new(auth: CloudAuth, client: Rc<dyn Client>, id: String) -> Self {
        CloudKnowledgeBase {
            auth,
            client,
            id,
            mode: RetrievalMode::Query,
            count: DEFAULT_COUNT,
        }
    }

    /// Switch the endpoint.
    pub fn with_mode(mut self, mode: RetrievalMode) -> Self {
        self.mode = mode;
        self
    }

    /// Number of entries to request.
    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    fn parse_query_response(response: &Value) -> Result<Vec<Entry>, Error> {
        let entries = response["entries"].as_array()
            .ok_or(Error::CloudResponseError("knowledge base response has no entries"))?;

        let mut result = Vec::with_capacity(entries.len());
        for entry in entries {
            let meta = &entry["meta"];
            let text = artifact_text(&meta["artifact"])
                .or_else(|| meta["content"].as_str().map(str::to_owned));

            match text {
                Some(text) => result.push(Entry { text, score: entry["score"].as_f64() }),
                None => tracing::warn!(entry = %entry["id"], "skipping knowledge base entry without text"),
            }
        }
        Ok(result)
    }

    fn parse_search_response(response: &Value) -> Result<Vec<Entry>, Error> {
        let chunks = response["response"].as_array()
            .ok_or(Error::CloudResponseError("knowledge base search response has no results"))?;

        Ok(chunks.iter()
            .filter_map(|c| c.as_str())
            .map(|text| Entry { text: text.to_owned(), score: None })
            .collect())
    }
}

impl RetrievalModule for CloudKnowledgeBase {

    fn retrieve(&self, query: &str) -> Result<Vec<Entry>, Error> {
        let endpoint = match self.mode {
            RetrievalMode::Query => "query",
            RetrievalMode::Search => "search",
        };
        let url = self.auth.url(&format!("knowledge-bases/{}/{}", self.id, endpoint));
        let bearer = self.auth.bearer();

        let payload = json!({
            "query": query,
            "count": self.count,
        });

        tracing::debug!(knowledge_base = %self.id, endpoint, "querying knowledge base");

        let response = self.client.make_json_request(&url, payload, &[("Authorization", bearer.as_str())], &[])?;
        check_for_error(&response)?;

        match self.mode {
            RetrievalMode::Query => Self::parse_query_response(&response),
            RetrievalMode::Search => Self::parse_search_response(&response),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::stub::{Exchange, StubClient};

    fn auth() -> CloudAuth {
        CloudAuth::new("gt-key".to_owned(), Some("https://cloud.test".to_owned()))
    }

    #[test]
    fn test_query() {
        let response = json!({
            "entries": [
                {
                    "id": "e1",
                    "score": 0.91,
                    "meta": { "artifact": "{\"type\": \"TextArtifact\", \"value\": \"first chunk\"}" }
                },
                {
                    "id": "e2",
                    "meta": { "artifact": { "type": "TextArtifact", "value": "second chunk" } }
                },
                {
                    "id": "e3",
                    "meta": { "content": "third chunk" }
                },
                {
                    "id": "e4",
                    "meta": {}
                }
            ]
        });

        let client = Rc::new(StubClient::sequence(vec![
            Exchange::post(response)
                .url("https://cloud.test/api/knowledge-bases/kb-1/query")
                .headers(&[("Authorization", "Bearer gt-key")])
                .payload(json!({"query": "what is rust", "count": 5})),
        ]));

        let kb = CloudKnowledgeBase::new(auth(), client.clone(), "kb-1".to_owned());
        let entries = kb.retrieve("what is rust").expect("entries");

        assert_eq!(entries, vec![
            Entry { text: "first chunk".to_owned(), score: Some(0.91) },
            Entry { text: "second chunk".to_owned(), score: None },
            Entry { text: "third chunk".to_owned(), score: None },
        ]);
        assert_eq!(client.remaining(), 0);
    }

    #[test]
    fn test_search() {
        let client = Rc::new(StubClient::sequence(vec![
            Exchange::post(json!({"response": ["one", "two"]}))
                .url("https://cloud.test/api/knowledge-bases/kb-2/search")
                .payload(json!({"query": "q", "count": 2})),
        ]));

        let kb = CloudKnowledgeBase::new(auth(), client, "kb-2".to_owned())
            .with_mode(RetrievalMode::Search)
            .with_count(2);

        let entries = kb.retrieve("q").expect("entries");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].text, "two");
    }

    #[test]
    fn test_query_errors() {
        let client = Rc::new(StubClient::sequence(vec![
            Exchange::post(json!({"error": "Knowledge base not found"})),
            Exchange::post(json!({"unexpected": true})),
        ]));

        let kb = CloudKnowledgeBase::new(auth(), client, "missing".to_owned());
        assert!(matches!(kb.retrieve("q"), Err(Error::CloudErrorMessage(_))));
        assert!(matches!(kb.retrieve("q"), Err(Error::CloudResponseError(_))));
    }

    #[test]
    fn test_mode_names() {
        assert_eq!(RetrievalMode::try_from("search").ok(), Some(RetrievalMode::Search));
        assert_eq!(RetrievalMode::try_from("query").ok(), Some(RetrievalMode::Query));
        assert!(RetrievalMode::try_from("hybrid").is_err());
    }
}
