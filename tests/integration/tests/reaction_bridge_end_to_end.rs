//! End-to-end bridge tests against mock Slack and GitHub backends.

use std::{sync::Arc, time::Duration};

use httpmock::prelude::*;
use serde_json::json;

use tally_core::{Dispatch, ReactionBridge, Rule, SkipReason, StdoutLogger};
use tally_github::GithubIssueClient;
use tally_slack_runtime::SlackApiClient;

const ISSUE_URL: &str = "https://github.com/18F/handbook/issues/42";

fn reaction_event() -> serde_json::Value {
    json!({
        "type": "reaction_added",
        "reaction": "evergreen_tree",
        "user": "U5150OU812",
        "item": {
            "channel": "C5150OU812",
            "message": {
                "text": "fix the handbook",
                "ts": "1360782804.083113",
                "reactions": [
                    { "name": "evergreen_tree", "count": 1, "users": ["U5150OU812"] }
                ]
            }
        }
    })
}

fn bridge_for(github_base: &str, slack_base: &str) -> Arc<ReactionBridge> {
    let github = GithubIssueClient::new(
        github_base.to_string(),
        "ghp-test".to_string(),
        "18F".to_string(),
        3_000,
        1,
        5,
    )
    .expect("github client should build");
    let slack = SlackApiClient::new(
        slack_base.to_string(),
        "xapp-test".to_string(),
        "xoxb-test".to_string(),
        3_000,
        1,
        5,
    )
    .expect("slack client should build");

    Arc::new(ReactionBridge::new(
        vec![Rule {
            reaction_name: "evergreen_tree".to_string(),
            github_repository: "handbook".to_string(),
            channel: None,
        }],
        "heavy_check_mark".to_string(),
        "18F".to_string(),
        Arc::new(github),
        Arc::new(slack),
        Arc::new(StdoutLogger),
    ))
}

#[tokio::test]
async fn integration_matching_reaction_files_issue_and_replies_with_url() {
    let github_server = MockServer::start();
    let slack_server = MockServer::start();

    let issue_mock = github_server.mock(|when, then| {
        when.method(POST)
            .path("/repos/18F/handbook/issues")
            .json_body(json!({
                "title": "fix the handbook",
                "body": "https://slack.com/archives/C5150OU812/p1360782804083113"
            }));
        then.status(201).json_body(json!({ "html_url": ISSUE_URL }));
    });
    let reply_mock = slack_server.mock(|when, then| {
        when.method(POST)
            .path("/chat.postMessage")
            .json_body(json!({
                "channel": "C5150OU812",
                "text": format!("created: {ISSUE_URL}")
            }));
        then.status(200).json_body(json!({ "ok": true, "ts": "1.2" }));
    });

    let bridge = bridge_for(&github_server.base_url(), &slack_server.base_url());
    let Dispatch::Dispatched(handle) = bridge.execute(&reaction_event()) else {
        panic!("matching event should dispatch");
    };
    handle.await.expect("pipeline should complete");

    issue_mock.assert();
    reply_mock.assert();
}

#[tokio::test]
async fn integration_backend_failure_is_reported_through_the_reply_channel() {
    let github_server = MockServer::start();
    let slack_server = MockServer::start();

    let issue_mock = github_server.mock(|when, then| {
        when.method(POST).path("/repos/18F/handbook/issues");
        then.status(422).body("Validation Failed");
    });
    let reply_mock = slack_server.mock(|when, then| {
        when.method(POST)
            .path("/chat.postMessage")
            .body_includes("failed to create a GitHub issue in 18F/handbook");
        then.status(200).json_body(json!({ "ok": true, "ts": "1.2" }));
    });

    let bridge = bridge_for(&github_server.base_url(), &slack_server.base_url());
    let Dispatch::Dispatched(handle) = bridge.execute(&reaction_event()) else {
        panic!("matching event should dispatch");
    };
    handle.await.expect("pipeline should absorb the failure");

    issue_mock.assert();
    reply_mock.assert();
}

#[tokio::test]
async fn integration_duplicate_delivery_files_exactly_one_issue() {
    let github_server = MockServer::start();
    let slack_server = MockServer::start();

    let issue_mock = github_server.mock(|when, then| {
        when.method(POST).path("/repos/18F/handbook/issues");
        then.status(201)
            .delay(Duration::from_millis(200))
            .json_body(json!({ "html_url": ISSUE_URL }));
    });
    slack_server.mock(|when, then| {
        when.method(POST).path("/chat.postMessage");
        then.status(200).json_body(json!({ "ok": true, "ts": "1.2" }));
    });

    let bridge = bridge_for(&github_server.base_url(), &slack_server.base_url());
    let event = reaction_event();

    let Dispatch::Dispatched(handle) = bridge.execute(&event) else {
        panic!("first delivery should dispatch");
    };
    let duplicate = bridge.execute(&event);
    assert_eq!(duplicate.skip_reason(), Some(SkipReason::InProgress));

    handle.await.expect("pipeline should complete");
    assert_eq!(issue_mock.hits(), 1);
}
