//! Conversation memory.

use crate::error::Error;

/// One finished exchange of a conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    /// Run id.
    pub id: String,
    /// User input.
    pub input: String,
    /// Final agent answer.
    pub output: String,
}

impl Run {
    /// Create a run with a fresh id.
    pub fn new(input: String, output: String) -> Self {
        Run {
            id: uuid::Uuid::new_v4().simple().to_string(),
            input,
            output,
        }
    }
}

/// Persistent storage of conversation runs.
pub trait ConversationMemory {
    /// Load previous runs, oldest first.
    fn load(&mut self) -> Result<Vec<Run>, Error>;

    /// Append a run.
    fn store(&mut self, run: &Run) -> Result<(), Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_run_ids_differ() {
        let a = Run::new("q".to_owned(), "a".to_owned());
        let b = Run::new("q".to_owned(), "a".to_owned());
        assert_ne!(a.id, b.id);
        assert_eq!(a.id.len(), 32);
    }
}
