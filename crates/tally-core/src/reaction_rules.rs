//! Rule configuration and first-match-wins rule selection.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::reaction_event::ReactionAddedEvent;

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Maps a reaction name, optionally scoped to a channel id, to a target
/// repository.
pub struct Rule {
    pub reaction_name: String,
    pub github_repository: String,
    #[serde(default)]
    pub channel: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// The narrowed shape handed to callers after a match: repository routing
/// only, never the channel constraint the rule matched through.
pub struct MatchedRule {
    pub github_repository: String,
}

impl From<&Rule> for MatchedRule {
    fn from(rule: &Rule) -> Self {
        Self {
            github_repository: rule.github_repository.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
/// On-disk rules file: an ordered rule list plus the reaction that marks a
/// message as already filed.
pub struct RulesDocument {
    pub success_reaction: String,
    pub rules: Vec<Rule>,
}

impl RulesDocument {
    pub fn validate(&self) -> Result<()> {
        if self.success_reaction.trim().is_empty() {
            bail!("rules file must set a non-empty success_reaction");
        }
        if self.rules.is_empty() {
            bail!("rules file must configure at least one rule");
        }
        for (index, rule) in self.rules.iter().enumerate() {
            if rule.reaction_name.trim().is_empty() {
                bail!("rule {index} has an empty reaction_name");
            }
            if rule.github_repository.trim().is_empty() {
                bail!("rule {index} has an empty github_repository");
            }
        }
        Ok(())
    }
}

/// Select the first configured rule matching the event.
///
/// Rules are scanned in configuration order; the order is semantically
/// meaningful, so the scan is never reordered. A rule without a channel
/// constraint matches any channel.
pub fn find_matching_rule(event: &ReactionAddedEvent, rules: &[Rule]) -> Option<MatchedRule> {
    rules
        .iter()
        .find(|rule| {
            rule.reaction_name == event.reaction
                && rule
                    .channel
                    .as_deref()
                    .map_or(true, |channel| channel == event.item.channel)
        })
        .map(MatchedRule::from)
}
