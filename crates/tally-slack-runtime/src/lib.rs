//! Slack Socket Mode transport for the tally reaction bridge.
//!
//! Connects to Slack, normalizes reaction-added envelopes, and feeds them to
//! the core execution engine; replies are posted back through the same API
//! client.

pub mod slack_runtime;

pub use slack_runtime::{run_slack_reaction_bridge, SlackApiClient, SlackReactionRuntimeConfig};
