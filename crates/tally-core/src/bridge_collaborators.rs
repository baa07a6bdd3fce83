//! Collaborator seams between the engine and the outside world.

use anyhow::Result;
use async_trait::async_trait;

use crate::reaction_metadata::Metadata;

#[async_trait]
/// Files one tracking issue per call. Opaque: full success with the created
/// issue URL, or full failure with a human-readable reason.
pub trait IssueFiler: Send + Sync {
    async fn file_issue(&self, metadata: &Metadata, repository: &str, text: &str)
        -> Result<String>;
}

#[async_trait]
/// Posts one outcome message back to the originating channel.
pub trait MessageReplier: Send + Sync {
    async fn reply(&self, channel_id: &str, text: &str) -> Result<()>;
}

/// Emits one line per significant engine transition. The exact line text is
/// part of the observable contract; tests assert on it literally.
pub trait BridgeLogger: Send + Sync {
    fn info(&self, line: &str);
}

/// Default logger used by the binary.
pub struct StdoutLogger;

impl BridgeLogger for StdoutLogger {
    fn info(&self, line: &str) {
        println!("{line}");
    }
}
