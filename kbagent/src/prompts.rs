use kbagent_lib::cloud::Ruleset;

const PROMPTS: [&str;3] = [
"You are a helpful assistant. Answer the user's question clearly and concisely.",
"
You have access to knowledge base tools. Each tool searches one knowledge base and answers a natural language query from its documents.
Use the tools whenever the question may be covered by the knowledge bases, and base your answer on what they return.
If the knowledge bases do not contain the answer, say so instead of guessing.",
"

When responding, always use rules from the following rulesets. Rulesets can override and complement each other:
"
];

/// System prompt.
pub struct Prompts {
    system: String,
}

impl Prompts {

    /// Create a new instance.
    pub fn new(rulesets: &[Ruleset], with_tools: bool) -> Self {
        let mut sys = PROMPTS[0].to_owned();

        if with_tools {
            sys += PROMPTS[1];
        }

        if !rulesets.is_empty() {
            sys += PROMPTS[2];
            for ruleset in rulesets {
                sys += &format!("\nRuleset name: {}\nRules:\n", ruleset.name);
                for rule in ruleset.rules.iter() {
                    sys += &format!("- {}\n", rule);
                }
            }
        }

        Prompts {
            system: sys,
        }
    }

    /// System prompt text.
    pub fn system(&self) -> &str {
        &self.system
    }
}
