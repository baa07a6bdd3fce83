//! Core matching and deduplication engine for the tally reaction bridge.
//!
//! Turns raw Slack reaction-added events into at-most-one GitHub issue-filing
//! attempt per message. Transport, credentials, and the HTTP calls themselves
//! live behind the collaborator traits in [`bridge_collaborators`].

pub mod bridge_collaborators;
pub mod reaction_bridge;
pub mod reaction_event;
pub mod reaction_metadata;
pub mod reaction_rules;

pub use bridge_collaborators::{BridgeLogger, IssueFiler, MessageReplier, StdoutLogger};
pub use reaction_bridge::{Dispatch, ReactionBridge, SkipReason, TOOL_NAME};
pub use reaction_event::{parse_reaction_event, MessageReaction, ReactionAddedEvent};
pub use reaction_metadata::{extract_metadata, Metadata};
pub use reaction_rules::{find_matching_rule, MatchedRule, Rule, RulesDocument};
