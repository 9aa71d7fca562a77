//! Known knowledge bases and selection parsing.

use kbagent_lib::rag::RetrievalMode;
use crate::util::looks_like_uuid;

/// Knowledge base catalog entry.
#[derive(Debug, Clone, PartialEq)]
pub struct KnowledgeBase {
    /// Knowledge base id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Organization web site.
    pub org_url: String,
    /// Endpoint used for retrieval.
    pub mode: RetrievalMode,
}

const BUILTIN: [(&str, &str, &str); 5] = [
    ("8be6dfd9-ecaf-4e2b-8414-01aecb67e147", "Blossom Analysis", "https://blossomanalysis.com"),
    ("f73bbef9-ea3b-4f78-956d-b5fc38de7699", "Lucid News", "https://lucidnews.com"),
    ("f88d9d45-f25e-4051-8a84-a8d7873622b8", "MAPS", "https://maps.org"),
    ("5f6e1ea5-1f3f-431a-8759-b66810582b73", "Psychedelic Alpha", "https://psychedelicalpha.com"),
    ("c34bc3da-d466-4a2d-94c3-2e6fffbe6d1d", "Psychedelics Today", "https://psychedelictoday.com"),
];

/// Knowledge base catalog.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<KnowledgeBase>,
}

impl Catalog {

    /// Built-in entries followed by `extra` ones. Extra entries with a known id are skipped.
    pub fn new(extra: Vec<KnowledgeBase>) -> Self {
        let mut entries: Vec<KnowledgeBase> = BUILTIN.iter()
            .map(|(id, name, org_url)| KnowledgeBase {
                id: id.to_string(),
                name: name.to_string(),
                org_url: org_url.to_string(),
                mode: RetrievalMode::Query,
            })
            .collect();

        for kb in extra {
            if entries.iter().any(|e| e.id == kb.id) {
                tracing::warn!(id = %kb.id, "duplicate knowledge base in config file ignored");
            } else {
                entries.push(kb);
            }
        }

        Catalog { entries }
    }

    /// All entries.
    pub fn entries(&self) -> &[KnowledgeBase] {
        &self.entries
    }

    /// Find entry by id.
    pub fn by_id(&self, id: &str) -> Option<&KnowledgeBase> {
        self.entries.iter().find(|kb| kb.id == id)
    }

    /// Find entry by name, case-insensitive.
    pub fn by_name(&self, name: &str) -> Option<&KnowledgeBase> {
        let name = name.to_lowercase();
        self.entries.iter().find(|kb| kb.name.to_lowercase() == name)
    }

    /// Retrieval mode of a knowledge base, ids outside the catalog use queries.
    pub fn mode(&self, id: &str) -> RetrievalMode {
        self.by_id(id).map_or(RetrievalMode::Query, |kb| kb.mode)
    }

    /// Resolve a selection string into knowledge base ids.
    ///
    /// Accepts `all`, or a comma-separated list of ids and names.
    /// Unknown names are skipped with a warning.
    pub fn parse_selection(&self, selection: &str) -> Vec<String> {
        let selection = selection.trim();
        if selection.is_empty() {
            return vec![];
        }

        if selection.eq_ignore_ascii_case("all") {
            return self.entries.iter().map(|kb| kb.id.clone()).collect();
        }

        let mut ids = vec![];
        for item in selection.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if looks_like_uuid(item) {
                ids.push(item.to_owned());
            } else if let Some(kb) = self.by_name(item) {
                ids.push(kb.id.clone());
            } else {
                tracing::warn!("knowledge base '{item}' not found");
            }
        }
        ids
    }

    /// Tool description for the knowledge base at position `index` of the selection.
    pub fn description(&self, id: &str, index: usize) -> String {
        match self.by_id(id) {
            Some(kb) => format!("{}: Contains specialized information and documents from {}", kb.name, kb.org_url),
            None => format!("Knowledge base #{}: Contains specialized information and documents", index + 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::new(vec![KnowledgeBase {
            id: "00000000-0000-0000-0000-000000000001".to_owned(),
            name: "Company Wiki".to_owned(),
            org_url: "https://wiki.example.com".to_owned(),
            mode: RetrievalMode::Search,
        }])
    }

    #[test]
    fn test_lookup() {
        let catalog = catalog();
        assert_eq!(catalog.entries().len(), 6);
        assert_eq!(catalog.by_name("maps").map(|kb| kb.id.as_str()), Some("f88d9d45-f25e-4051-8a84-a8d7873622b8"));
        assert_eq!(catalog.by_name("COMPANY WIKI").map(|kb| kb.org_url.as_str()), Some("https://wiki.example.com"));
        assert!(catalog.by_id("f73bbef9-ea3b-4f78-956d-b5fc38de7699").is_some());
        assert!(catalog.by_name("Unknown").is_none());

        assert_eq!(catalog.mode("00000000-0000-0000-0000-000000000001"), RetrievalMode::Search);
        assert_eq!(catalog.mode("f88d9d45-f25e-4051-8a84-a8d7873622b8"), RetrievalMode::Query);
        assert_eq!(catalog.mode("11111111-2222-3333-4444-555555555555"), RetrievalMode::Query);
    }

    #[test]
    fn test_duplicate_extra_ignored() {
        let catalog = Catalog::new(vec![KnowledgeBase {
            id: "f88d9d45-f25e-4051-8a84-a8d7873622b8".to_owned(),
            name: "MAPS again".to_owned(),
            org_url: String::new(),
            mode: RetrievalMode::Search,
        }]);
        assert_eq!(catalog.entries().len(), 5);
        assert_eq!(catalog.mode("f88d9d45-f25e-4051-8a84-a8d7873622b8"), RetrievalMode::Query);
    }

    #[test]
    fn test_parse_selection() {
        let catalog = catalog();

        assert!(catalog.parse_selection("").is_empty());
        assert!(catalog.parse_selection(" , ").is_empty());
        assert_eq!(catalog.parse_selection("ALL").len(), 6);

        assert_eq!(catalog.parse_selection("Blossom Analysis, maps"), vec![
            "8be6dfd9-ecaf-4e2b-8414-01aecb67e147".to_owned(),
            "f88d9d45-f25e-4051-8a84-a8d7873622b8".to_owned(),
        ]);

        assert_eq!(catalog.parse_selection("11111111-2222-3333-4444-555555555555,Nope,,Lucid News"), vec![
            "11111111-2222-3333-4444-555555555555".to_owned(),
            "f73bbef9-ea3b-4f78-956d-b5fc38de7699".to_owned(),
        ]);
    }

    #[test]
    fn test_description() {
        let catalog = catalog();
        assert_eq!(catalog.description("f88d9d45-f25e-4051-8a84-a8d7873622b8", 0),
            "MAPS: Contains specialized information and documents from https://maps.org");
        assert_eq!(catalog.description("11111111-2222-3333-4444-555555555555", 1),
            "Knowledge base #2: Contains specialized information and documents");
    }
}
