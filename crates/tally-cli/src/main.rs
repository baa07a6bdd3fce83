//! tally: files GitHub tracking issues when configured Slack reactions land.

mod bootstrap_helpers;
mod bridge_config_file;
mod cli_args;

use std::{sync::Arc, time::Duration};

use anyhow::Result;
use clap::Parser;

use tally_core::{ReactionBridge, StdoutLogger};
use tally_github::GithubIssueClient;
use tally_slack_runtime::{
    run_slack_reaction_bridge, SlackApiClient, SlackReactionRuntimeConfig,
};

use crate::bootstrap_helpers::init_tracing;
use crate::bridge_config_file::load_rules_document;
use crate::cli_args::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    run(cli).await
}

async fn run(cli: Cli) -> Result<()> {
    let rules = load_rules_document(&cli.rules_file)?;
    println!(
        "tally loaded {} rule(s), success reaction :{}:",
        rules.rules.len(),
        rules.success_reaction
    );

    let github = Arc::new(GithubIssueClient::new(
        cli.github_api_base.clone(),
        cli.github_token.clone(),
        cli.github_owner.clone(),
        cli.request_timeout_ms,
        cli.retry_max_attempts,
        cli.retry_base_delay_ms,
    )?);
    let replier = Arc::new(SlackApiClient::new(
        cli.slack_api_base.clone(),
        cli.slack_app_token.clone(),
        cli.slack_bot_token.clone(),
        cli.request_timeout_ms,
        cli.retry_max_attempts,
        cli.retry_base_delay_ms,
    )?);

    let bridge = Arc::new(ReactionBridge::new(
        rules.rules,
        rules.success_reaction,
        cli.github_owner.clone(),
        github,
        replier,
        Arc::new(StdoutLogger),
    ));

    let runtime_config = SlackReactionRuntimeConfig {
        api_base: cli.slack_api_base,
        app_token: cli.slack_app_token,
        bot_token: cli.slack_bot_token,
        request_timeout_ms: cli.request_timeout_ms,
        retry_max_attempts: cli.retry_max_attempts,
        retry_base_delay_ms: cli.retry_base_delay_ms,
        reconnect_delay: Duration::from_millis(cli.reconnect_delay_ms),
    };

    run_slack_reaction_bridge(runtime_config, bridge).await
}
