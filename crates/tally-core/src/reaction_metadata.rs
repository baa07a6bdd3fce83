//! Stable identifying metadata derived from a reaction event.

use serde::Serialize;

use crate::reaction_event::ReactionAddedEvent;

const PERMALINK_BASE: &str = "https://slack.com/archives";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Identifying and display data for the reacted message. Created fresh per
/// event and immutable afterwards.
pub struct Metadata {
    pub channel_id: String,
    pub user_id: String,
    pub message_id: String,
    pub permalink: String,
    pub message_text: String,
}

/// Derive metadata from a parsed event.
///
/// The message id is a composite of channel id and message timestamp so that
/// duplicate deliveries of the same logical event produce the same id. Pure
/// and deterministic.
pub fn extract_metadata(event: &ReactionAddedEvent) -> Metadata {
    let channel_id = event.item.channel.clone();
    let ts = event.item.message.ts.as_str();
    Metadata {
        message_id: format!("{channel_id}:{ts}"),
        permalink: format!("{PERMALINK_BASE}/{channel_id}/p{}", ts.replace('.', "")),
        user_id: event.user.clone(),
        message_text: event.item.message.text.clone(),
        channel_id,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::extract_metadata;
    use crate::reaction_event::parse_reaction_event;

    fn test_event() -> serde_json::Value {
        json!({
            "type": "reaction_added",
            "reaction": "evergreen_tree",
            "user": "U5150OU812",
            "item": {
                "channel": "C5150OU812",
                "message": {
                    "text": "fix the handbook",
                    "ts": "1360782804.083113"
                }
            }
        })
    }

    #[test]
    fn unit_extract_metadata_derives_message_id_and_permalink() {
        let event = parse_reaction_event(&test_event()).expect("event should parse");
        let metadata = extract_metadata(&event);

        assert_eq!(metadata.channel_id, "C5150OU812");
        assert_eq!(metadata.user_id, "U5150OU812");
        assert_eq!(metadata.message_id, "C5150OU812:1360782804.083113");
        assert_eq!(
            metadata.permalink,
            "https://slack.com/archives/C5150OU812/p1360782804083113"
        );
        assert_eq!(metadata.message_text, "fix the handbook");
    }

    #[test]
    fn functional_extract_metadata_is_idempotent() {
        let event = parse_reaction_event(&test_event()).expect("event should parse");
        assert_eq!(extract_metadata(&event), extract_metadata(&event));
    }
}
