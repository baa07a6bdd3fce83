//! GitHub REST backend for the tally reaction bridge.
//!
//! Provides the issue-creation client behind the core's `IssueFiler` seam and
//! the transport retry helpers it shares with the Slack client.

pub mod github_issue_client;
pub mod github_transport_helpers;

pub use github_issue_client::GithubIssueClient;
