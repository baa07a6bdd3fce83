//! Typed view of Slack reaction-added event payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const REACTION_ADDED_TYPE: &str = "reaction_added";

#[derive(Debug, Clone, Deserialize)]
/// A reaction-added event as delivered by the platform, read-only to the core.
pub struct ReactionAddedEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub reaction: String,
    pub user: String,
    pub item: ReactionItem,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReactionItem {
    pub channel: String,
    pub message: ReactionMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReactionMessage {
    #[serde(default)]
    pub text: String,
    pub ts: String,
    #[serde(default)]
    pub reactions: Vec<MessageReaction>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// One entry of a message's reaction list.
pub struct MessageReaction {
    pub name: String,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub users: Vec<String>,
}

impl ReactionMessage {
    /// Return true when any user already attached the given reaction name.
    pub fn has_reaction(&self, name: &str) -> bool {
        self.reactions.iter().any(|reaction| reaction.name == name)
    }
}

/// Parse a raw event payload into its typed view.
///
/// Wrong-type, truncated, or otherwise malformed payloads are expected
/// traffic and yield `None`, never an error.
pub fn parse_reaction_event(raw: &Value) -> Option<ReactionAddedEvent> {
    if raw.get("type").and_then(Value::as_str) != Some(REACTION_ADDED_TYPE) {
        return None;
    }
    serde_json::from_value(raw.clone()).ok()
}
