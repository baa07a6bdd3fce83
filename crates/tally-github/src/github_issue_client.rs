//! GitHub issue-creation client.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use tally_core::{IssueFiler, Metadata};

use crate::github_transport_helpers::{
    is_retryable_github_status, is_retryable_transport_error, parse_retry_after, retry_delay,
    truncate_for_error, truncate_for_title,
};

const ISSUE_TITLE_MAX_CHARS: usize = 200;

#[derive(Debug, Clone, Deserialize)]
struct GithubIssueCreateResponse {
    html_url: String,
}

/// Files issues through the GitHub REST API. One instance per configured
/// owner; repositories are routed per call by the matched rule.
#[derive(Clone)]
pub struct GithubIssueClient {
    http: reqwest::Client,
    api_base: String,
    owner: String,
    retry_max_attempts: usize,
    retry_base_delay_ms: u64,
}

impl GithubIssueClient {
    pub fn new(
        api_base: String,
        token: String,
        owner: String,
        request_timeout_ms: u64,
        retry_max_attempts: usize,
        retry_base_delay_ms: u64,
    ) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("tally-reaction-bridge"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "x-github-api-version",
            reqwest::header::HeaderValue::from_static("2022-11-28"),
        );
        let auth_header = format!("Bearer {}", token.trim());
        headers.insert(
            reqwest::header::AUTHORIZATION,
            reqwest::header::HeaderValue::from_str(&auth_header)
                .context("invalid github authorization header")?,
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(request_timeout_ms.max(1)))
            .build()
            .context("failed to create github api client")?;

        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            owner: owner.trim().to_string(),
            retry_max_attempts: retry_max_attempts.max(1),
            retry_base_delay_ms: retry_base_delay_ms.max(1),
        })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// `POST /repos/{owner}/{repo}/issues`, returning the created issue's
    /// html URL.
    pub async fn create_issue(&self, repository: &str, title: &str, body: &str) -> Result<String> {
        let payload = json!({ "title": title, "body": body });
        let response: GithubIssueCreateResponse = self
            .request_json("create issue", || {
                self.http
                    .post(format!(
                        "{}/repos/{}/{}/issues",
                        self.api_base, self.owner, repository
                    ))
                    .json(&payload)
            })
            .await?;
        Ok(response.html_url)
    }

    async fn request_json<T, F>(&self, operation: &str, mut request_builder: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: FnMut() -> reqwest::RequestBuilder,
    {
        let mut attempt = 0_usize;
        loop {
            attempt = attempt.saturating_add(1);
            let response = request_builder().send().await;
            match response {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response
                            .json::<T>()
                            .await
                            .with_context(|| format!("failed to decode github {operation} body"));
                    }

                    let retry_after = parse_retry_after(response.headers());
                    let body = response.text().await.unwrap_or_default();
                    if attempt < self.retry_max_attempts
                        && is_retryable_github_status(status.as_u16())
                    {
                        tokio::time::sleep(retry_delay(
                            self.retry_base_delay_ms,
                            attempt,
                            retry_after,
                        ))
                        .await;
                        continue;
                    }

                    bail!(
                        "github api {operation} failed with status {}: {}",
                        status.as_u16(),
                        truncate_for_error(&body, 800)
                    );
                }
                Err(error) => {
                    if attempt < self.retry_max_attempts && is_retryable_transport_error(&error) {
                        tokio::time::sleep(retry_delay(self.retry_base_delay_ms, attempt, None))
                            .await;
                        continue;
                    }
                    return Err(error)
                        .with_context(|| format!("github api {operation} request failed"));
                }
            }
        }
    }
}

#[async_trait]
impl IssueFiler for GithubIssueClient {
    async fn file_issue(
        &self,
        metadata: &Metadata,
        repository: &str,
        text: &str,
    ) -> Result<String> {
        let title = truncate_for_title(text, ISSUE_TITLE_MAX_CHARS);
        self.create_issue(repository, &title, &metadata.permalink)
            .await
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::GithubIssueClient;
    use tally_core::{IssueFiler, Metadata};

    fn test_client(base_url: &str, retry_max_attempts: usize) -> GithubIssueClient {
        GithubIssueClient::new(
            base_url.to_string(),
            "ghp-test".to_string(),
            "18F".to_string(),
            3_000,
            retry_max_attempts,
            5,
        )
        .expect("client should build")
    }

    fn test_metadata() -> Metadata {
        Metadata {
            channel_id: "C5150OU812".to_string(),
            user_id: "U5150OU812".to_string(),
            message_id: "C5150OU812:1360782804.083113".to_string(),
            permalink: "https://slack.com/archives/C5150OU812/p1360782804083113".to_string(),
            message_text: "fix the handbook".to_string(),
        }
    }

    #[tokio::test]
    async fn functional_create_issue_posts_title_and_body() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/repos/18F/handbook/issues")
                .header("authorization", "Bearer ghp-test")
                .header("accept", "application/vnd.github+json")
                .json_body(json!({
                    "title": "fix the handbook",
                    "body": "https://slack.com/archives/C5150OU812/p1360782804083113"
                }));
            then.status(201).json_body(json!({
                "html_url": "https://github.com/18F/handbook/issues/42"
            }));
        });

        let client = test_client(&server.base_url(), 1);
        let url = client
            .file_issue(&test_metadata(), "handbook", "fix the handbook")
            .await
            .expect("issue should be created");

        mock.assert();
        assert_eq!(url, "https://github.com/18F/handbook/issues/42");
    }

    #[tokio::test]
    async fn functional_file_issue_truncates_multiline_titles() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/repos/18F/handbook/issues")
                .json_body_includes(r#"{ "title": "first line" }"#);
            then.status(201).json_body(json!({
                "html_url": "https://github.com/18F/handbook/issues/43"
            }));
        });

        let client = test_client(&server.base_url(), 1);
        client
            .file_issue(&test_metadata(), "handbook", "first line\nsecond line")
            .await
            .expect("issue should be created");
        mock.assert();
    }

    #[tokio::test]
    async fn functional_create_issue_surfaces_non_retryable_failures() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/repos/18F/handbook/issues");
            then.status(422).body("Validation Failed");
        });

        let client = test_client(&server.base_url(), 3);
        let error = client
            .create_issue("handbook", "title", "body")
            .await
            .expect_err("422 should fail without retry");

        assert_eq!(mock.hits(), 1);
        let message = error.to_string();
        assert!(message.contains("status 422"), "unexpected error: {message}");
        assert!(message.contains("Validation Failed"));
    }

    #[tokio::test]
    async fn regression_create_issue_retries_server_errors_up_to_the_cap() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/repos/18F/handbook/issues");
            then.status(502).body("bad gateway");
        });

        let client = test_client(&server.base_url(), 3);
        let error = client
            .create_issue("handbook", "title", "body")
            .await
            .expect_err("exhausted retries should fail");

        assert_eq!(mock.hits(), 3);
        assert!(error.to_string().contains("status 502"));
    }
}
