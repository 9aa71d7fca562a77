use std::rc::Rc;
use serde::Deserialize;
use crate::error::Error;
use crate::request::Client;
use super::{check_for_error, CloudAuth};

/// Named set of rules the agent must follow.
#[derive(Debug, Clone, PartialEq)]
pub struct Ruleset {
    /// Ruleset name.
    pub name: String,
    /// Rules in the order they were defined.
    pub rules: Vec<String>,
}

#[derive(Deserialize)]
struct RulesetList {
    #[serde(default)]
    rulesets: Vec<RulesetRecord>,
}

#[derive(Deserialize)]
struct RulesetRecord {
    ruleset_id: String,
}

#[derive(Deserialize)]
struct RuleList {
    #[serde(default)]
    rules: Vec<RuleRecord>,
}

#[derive(Deserialize)]
struct RuleRecord {
    rule: String,
}

/// Loads rulesets by alias from the cloud.
pub struct CloudRulesetDriver {
    auth: CloudAuth,
    client: Rc<dyn Client>,
}

impl CloudRulesetDriver {

    /// Create driver.
    pub fn new(auth: CloudAuth, client: Rc<dyn Client>) -> Self {
        CloudRulesetDriver { auth, client }
    }

    /// Resolve the alias and fetch its rules. The ruleset is named after the alias.
    pub fn load(&self, alias: &str) -> Result<Ruleset, Error> {
        let bearer = self.auth.bearer();
        let headers = &[("Authorization", bearer.as_str())];

        let response = self.client.get_json(&self.auth.url("rulesets"), headers, &[("alias", alias)])?;
        check_for_error(&response)?;

        let list: RulesetList = serde_json::from_value(response)?;
        let record = list.rulesets
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound(format!("ruleset with alias \"{alias}\"")))?;

        let response = self.client.get_json(&self.auth.url("rules"), headers, &[("ruleset_id", record.ruleset_id.as_str())])?;
        check_for_error(&response)?;

        let rules: RuleList = serde_json::from_value(response)?;

        tracing::debug!(alias, rules = rules.rules.len(), "ruleset loaded");

        Ok(Ruleset {
            name: alias.to_owned(),
            rules: rules.rules.into_iter().map(|r| r.rule).collect(),
        })
    }
}
