//! Execution engine: gate checks, dedup tracking, and the filing pipeline.

use std::{
    collections::HashSet,
    sync::{Arc, Mutex, MutexGuard},
};

use serde_json::Value;
use tokio::task::JoinHandle;

use crate::bridge_collaborators::{BridgeLogger, IssueFiler, MessageReplier};
use crate::reaction_event::parse_reaction_event;
use crate::reaction_metadata::{extract_metadata, Metadata};
use crate::reaction_rules::{find_matching_rule, Rule};

/// Fixed identifier prefixed to every log line the engine emits.
pub const TOOL_NAME: &str = "tally";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Why an event produced no filing attempt.
pub enum SkipReason {
    /// Wrong event type, unknown reaction, or unsatisfied channel constraint.
    NoMatch,
    /// The message already carries the configured success reaction.
    AlreadyFiled,
    /// A filing call for this message id is still outstanding.
    InProgress,
}

/// Outcome of one `execute` call. The handle is the awaitable completion
/// signal for the asynchronous filing pipeline; callers that only care about
/// the dispatch decision can drop down to `is_dispatched`.
pub enum Dispatch {
    NotHandled(SkipReason),
    Dispatched(JoinHandle<()>),
}

impl Dispatch {
    pub fn is_dispatched(&self) -> bool {
        matches!(self, Self::Dispatched(_))
    }

    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self {
            Self::NotHandled(reason) => Some(*reason),
            Self::Dispatched(_) => None,
        }
    }
}

/// Matches reaction events against configured rules and guarantees at most
/// one issue-filing attempt per message, even under concurrent delivery.
///
/// Each instance owns its in-progress set, so independent bridges never share
/// tracking state.
pub struct ReactionBridge {
    rules: Vec<Rule>,
    success_reaction: String,
    github_owner: String,
    github: Arc<dyn IssueFiler>,
    replier: Arc<dyn MessageReplier>,
    logger: Arc<dyn BridgeLogger>,
    in_progress: Mutex<HashSet<String>>,
}

impl ReactionBridge {
    pub fn new(
        rules: Vec<Rule>,
        success_reaction: String,
        github_owner: String,
        github: Arc<dyn IssueFiler>,
        replier: Arc<dyn MessageReplier>,
        logger: Arc<dyn BridgeLogger>,
    ) -> Self {
        Self {
            rules,
            success_reaction,
            github_owner,
            github,
            replier,
            logger,
            in_progress: Mutex::new(HashSet::new()),
        }
    }

    /// Run the gate sequence for one raw event and, when it passes, dispatch
    /// the filing pipeline.
    ///
    /// The whole gate sequence is synchronous: no suspension point exists
    /// between the already-filed check and the in-progress insert, so two
    /// deliveries of the same reaction can never both pass the gate.
    pub fn execute(self: &Arc<Self>, raw: &Value) -> Dispatch {
        let Some(event) = parse_reaction_event(raw) else {
            return Dispatch::NotHandled(SkipReason::NoMatch);
        };
        let Some(matched) = find_matching_rule(&event, &self.rules) else {
            return Dispatch::NotHandled(SkipReason::NoMatch);
        };
        let metadata = extract_metadata(&event);

        if event.item.message.has_reaction(&self.success_reaction) {
            self.logger
                .info(&format!("{TOOL_NAME}: {}: already processed", metadata.message_id));
            return Dispatch::NotHandled(SkipReason::AlreadyFiled);
        }

        // Gate check and transition in one insert under the lock.
        if !self.in_progress_guard().insert(metadata.message_id.clone()) {
            self.logger.info(&format!(
                "{TOOL_NAME}: {}: already in progress",
                metadata.message_id
            ));
            return Dispatch::NotHandled(SkipReason::InProgress);
        }

        self.logger.info(&format!(
            "{TOOL_NAME}: making GitHub request for {}",
            metadata.permalink
        ));

        let bridge = Arc::clone(self);
        let repository = matched.github_repository;
        Dispatch::Dispatched(tokio::spawn(async move {
            bridge.file_and_reply(metadata, repository).await;
        }))
    }

    /// Steps 5–7 of the pipeline: file the issue, report the outcome through
    /// the reply channel, and release the in-progress entry. Backend failure
    /// is absorbed here; this future always resolves.
    async fn file_and_reply(&self, metadata: Metadata, repository: String) {
        let outcome = self
            .github
            .file_issue(&metadata, &repository, &metadata.message_text)
            .await;

        let reply_text = match outcome {
            Ok(url) => {
                self.logger
                    .info(&format!("{TOOL_NAME}: GitHub success: {url}"));
                format!("created: {url}")
            }
            Err(error) => {
                self.logger
                    .info(&format!("{TOOL_NAME}: GitHub error: {error}"));
                format!(
                    "failed to create a GitHub issue in {}/{repository}: {error}",
                    self.github_owner
                )
            }
        };

        if let Err(error) = self.replier.reply(&metadata.channel_id, &reply_text).await {
            self.logger
                .info(&format!("{TOOL_NAME}: failed to send reply: {error}"));
        }

        self.in_progress_guard().remove(&metadata.message_id);
    }

    fn in_progress_guard(&self) -> MutexGuard<'_, HashSet<String>> {
        // The set only ever sees insert/remove, so a poisoned lock still
        // holds a coherent set; recover it rather than wedging the gate.
        match self.in_progress.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
