use std::path::PathBuf;

use clap::Parser;

fn parse_positive_usize(value: &str) -> Result<usize, String> {
    let parsed = value
        .parse::<usize>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

fn parse_positive_u64(value: &str) -> Result<u64, String> {
    let parsed = value
        .parse::<u64>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

#[derive(Debug, Parser)]
#[command(
    name = "tally",
    about = "Slack reaction bridge that files GitHub tracking issues",
    version
)]
pub struct Cli {
    #[arg(
        long,
        env = "TALLY_RULES_FILE",
        default_value = "tally-rules.json",
        help = "JSON rules file mapping reactions (optionally per channel) to repositories."
    )]
    pub rules_file: PathBuf,

    #[arg(
        long,
        env = "TALLY_SLACK_API_BASE",
        default_value = "https://slack.com/api",
        help = "Slack Web API base URL."
    )]
    pub slack_api_base: String,

    #[arg(
        long,
        env = "TALLY_SLACK_APP_TOKEN",
        help = "Slack app-level token used to open the Socket Mode connection."
    )]
    pub slack_app_token: String,

    #[arg(
        long,
        env = "TALLY_SLACK_BOT_TOKEN",
        help = "Slack bot token used for message snapshots and replies."
    )]
    pub slack_bot_token: String,

    #[arg(
        long,
        env = "TALLY_GITHUB_API_BASE",
        default_value = "https://api.github.com",
        help = "GitHub REST API base URL."
    )]
    pub github_api_base: String,

    #[arg(
        long,
        env = "TALLY_GITHUB_TOKEN",
        help = "GitHub token with permission to create issues."
    )]
    pub github_token: String,

    #[arg(
        long,
        env = "TALLY_GITHUB_OWNER",
        help = "GitHub user or organization owning the target repositories."
    )]
    pub github_owner: String,

    #[arg(
        long,
        env = "TALLY_REQUEST_TIMEOUT_MS",
        default_value = "10000",
        value_parser = parse_positive_u64,
        help = "Per-request timeout for Slack and GitHub API calls."
    )]
    pub request_timeout_ms: u64,

    #[arg(
        long,
        env = "TALLY_RETRY_MAX_ATTEMPTS",
        default_value = "3",
        value_parser = parse_positive_usize,
        help = "Maximum HTTP attempts per API call, including the first."
    )]
    pub retry_max_attempts: usize,

    #[arg(
        long,
        env = "TALLY_RETRY_BASE_DELAY_MS",
        default_value = "250",
        value_parser = parse_positive_u64,
        help = "Base delay for exponential HTTP retry backoff."
    )]
    pub retry_base_delay_ms: u64,

    #[arg(
        long,
        env = "TALLY_RECONNECT_DELAY_MS",
        default_value = "5000",
        value_parser = parse_positive_u64,
        help = "Delay before reopening the Socket Mode connection after a session ends."
    )]
    pub reconnect_delay_ms: u64,
}
