//! Socket Mode transport loop that feeds reaction events to the engine.

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};

use tally_core::{Dispatch, ReactionBridge};

mod slack_api_client;
mod slack_socket_events;

pub use slack_api_client::SlackApiClient;
use slack_socket_events::{
    inject_message_snapshot, parse_socket_envelope, reaction_event_from_envelope,
    reaction_item_coordinates, SlackSocketEnvelope,
};

#[derive(Clone)]
/// Transport configuration for the Socket Mode loop.
pub struct SlackReactionRuntimeConfig {
    pub api_base: String,
    pub app_token: String,
    pub bot_token: String,
    pub request_timeout_ms: u64,
    pub retry_max_attempts: usize,
    pub retry_base_delay_ms: u64,
    pub reconnect_delay: Duration,
}

#[derive(Debug, Default)]
struct CycleReport {
    discovered: usize,
    dispatched: usize,
    skipped: usize,
    completed: usize,
    fetch_failures: usize,
}

impl CycleReport {
    fn is_empty(&self) -> bool {
        self.discovered == 0
            && self.dispatched == 0
            && self.skipped == 0
            && self.completed == 0
            && self.fetch_failures == 0
    }
}

/// Runs the Socket Mode loop until shutdown, reconnecting on session errors.
pub async fn run_slack_reaction_bridge(
    config: SlackReactionRuntimeConfig,
    bridge: Arc<ReactionBridge>,
) -> Result<()> {
    let mut runtime = SlackReactionRuntime::new(config, bridge)?;
    runtime.run().await
}

struct SlackReactionRuntime {
    config: SlackReactionRuntimeConfig,
    slack_client: SlackApiClient,
    bridge: Arc<ReactionBridge>,
    in_flight: Vec<JoinHandle<()>>,
}

impl SlackReactionRuntime {
    fn new(config: SlackReactionRuntimeConfig, bridge: Arc<ReactionBridge>) -> Result<Self> {
        let slack_client = SlackApiClient::new(
            config.api_base.clone(),
            config.app_token.clone(),
            config.bot_token.clone(),
            config.request_timeout_ms,
            config.retry_max_attempts,
            config.retry_base_delay_ms,
        )?;
        Ok(Self {
            config,
            slack_client,
            bridge,
            in_flight: Vec::new(),
        })
    }

    async fn run(&mut self) -> Result<()> {
        loop {
            let socket_url = match self.slack_client.open_socket_connection().await {
                Ok(url) => url,
                Err(error) => {
                    eprintln!("tally slack runtime failed to open socket connection: {error}");
                    tokio::select! {
                        _ = tokio::signal::ctrl_c() => {
                            println!("tally slack runtime shutdown requested");
                            return Ok(());
                        }
                        _ = tokio::time::sleep(self.config.reconnect_delay) => {}
                    }
                    continue;
                }
            };

            println!("tally slack runtime socket connected");
            if let Err(error) = self.run_socket_session(&socket_url).await {
                eprintln!("tally slack runtime socket session error: {error}");
            }

            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    println!("tally slack runtime shutdown requested");
                    return Ok(());
                }
                _ = tokio::time::sleep(self.config.reconnect_delay) => {}
            }
        }
    }

    async fn run_socket_session(&mut self, socket_url: &str) -> Result<()> {
        let (stream, _response) = connect_async(socket_url)
            .await
            .context("failed to connect slack socket mode websocket")?;
        let (mut sink, mut source) = stream.split();

        loop {
            let mut report = CycleReport::default();
            self.drain_finished(&mut report).await;

            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    return Ok(());
                }
                maybe_message = source.next() => {
                    let Some(message_result) = maybe_message else {
                        return Ok(());
                    };
                    let message = message_result.context("failed reading slack websocket message")?;
                    if let Some(envelope) = parse_socket_envelope(message)? {
                        self.ack_envelope(&mut sink, &envelope.envelope_id).await?;
                        self.handle_envelope(envelope, &mut report).await;
                    }
                }
                _ = tokio::time::sleep(Duration::from_millis(50)) => {
                }
            }

            if !report.is_empty() {
                println!(
                    "tally slack cycle: discovered={} dispatched={} skipped={} completed={} fetch_failures={}",
                    report.discovered,
                    report.dispatched,
                    report.skipped,
                    report.completed,
                    report.fetch_failures,
                );
            }
        }
    }

    async fn ack_envelope<S>(&self, sink: &mut S, envelope_id: &str) -> Result<()>
    where
        S: futures_util::Sink<WsMessage> + Unpin,
        S::Error: std::error::Error + Send + Sync + 'static,
    {
        let ack = json!({ "envelope_id": envelope_id }).to_string();
        sink.send(WsMessage::Text(ack.into()))
            .await
            .context("failed to send slack socket ack")
    }

    async fn handle_envelope(&mut self, envelope: SlackSocketEnvelope, report: &mut CycleReport) {
        let Some(mut event) = reaction_event_from_envelope(&envelope) else {
            return;
        };
        report.discovered = report.discovered.saturating_add(1);

        let Some((channel, ts)) = reaction_item_coordinates(&event) else {
            report.skipped = report.skipped.saturating_add(1);
            return;
        };

        // The reaction payload does not embed the message body; fetch it
        // fresh so the already-processed gate sees the current reactions.
        let snapshot = match self.slack_client.get_message_snapshot(&channel, &ts).await {
            Ok(snapshot) => snapshot,
            Err(error) => {
                eprintln!("tally slack runtime failed to fetch message {channel}:{ts}: {error}");
                report.fetch_failures = report.fetch_failures.saturating_add(1);
                return;
            }
        };
        inject_message_snapshot(&mut event, snapshot);

        match self.bridge.execute(&event) {
            Dispatch::Dispatched(handle) => {
                self.in_flight.push(handle);
                report.dispatched = report.dispatched.saturating_add(1);
            }
            Dispatch::NotHandled(_) => {
                report.skipped = report.skipped.saturating_add(1);
            }
        }
    }

    async fn drain_finished(&mut self, report: &mut CycleReport) {
        let mut remaining = Vec::with_capacity(self.in_flight.len());
        for handle in self.in_flight.drain(..) {
            if !handle.is_finished() {
                remaining.push(handle);
                continue;
            }
            match handle.await {
                Ok(()) => report.completed = report.completed.saturating_add(1),
                Err(error) => {
                    eprintln!("tally slack runtime pipeline join error: {error}");
                }
            }
        }
        self.in_flight = remaining;
    }
}
