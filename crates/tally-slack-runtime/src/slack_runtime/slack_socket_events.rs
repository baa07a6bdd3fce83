//! Socket Mode envelope parsing and reaction-event normalization.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use tokio_tungstenite::tungstenite::Message as WsMessage;

#[derive(Debug, Clone, Deserialize)]
pub struct SlackSocketEnvelope {
    pub envelope_id: String,
    #[serde(rename = "type")]
    pub envelope_type: String,
    #[serde(default)]
    pub payload: Value,
}

#[derive(Debug, Deserialize)]
struct SlackEventCallbackEnvelope {
    #[serde(rename = "type")]
    callback_type: String,
    event: Value,
}

pub fn parse_socket_envelope(message: WsMessage) -> Result<Option<SlackSocketEnvelope>> {
    match message {
        WsMessage::Text(text) => {
            let envelope = serde_json::from_str::<SlackSocketEnvelope>(&text)
                .context("failed to parse slack socket envelope")?;
            Ok(Some(envelope))
        }
        WsMessage::Binary(bytes) => {
            let text =
                String::from_utf8(bytes.to_vec()).context("invalid utf-8 slack socket payload")?;
            let envelope = serde_json::from_str::<SlackSocketEnvelope>(&text)
                .context("failed to parse slack socket envelope")?;
            Ok(Some(envelope))
        }
        WsMessage::Ping(_) | WsMessage::Pong(_) => Ok(None),
        WsMessage::Close(_) => Ok(None),
        WsMessage::Frame(_) => Ok(None),
    }
}

/// Pull the raw reaction-added event out of an events_api envelope. Anything
/// else (hello, disconnect, other event kinds) yields `None`.
pub fn reaction_event_from_envelope(envelope: &SlackSocketEnvelope) -> Option<Value> {
    if envelope.envelope_type != "events_api" {
        return None;
    }
    let callback =
        serde_json::from_value::<SlackEventCallbackEnvelope>(envelope.payload.clone()).ok()?;
    if callback.callback_type != "event_callback" {
        return None;
    }
    if callback.event.get("type").and_then(Value::as_str) != Some("reaction_added") {
        return None;
    }
    Some(callback.event)
}

/// Channel id and message timestamp of the reacted item, needed to fetch the
/// message snapshot.
pub fn reaction_item_coordinates(event: &Value) -> Option<(String, String)> {
    let item = event.get("item")?;
    let channel = item.get("channel")?.as_str()?;
    let ts = item.get("ts")?.as_str()?;
    Some((channel.to_string(), ts.to_string()))
}

/// Graft the freshly fetched message onto the raw event so it carries the
/// shape the engine expects (`item.message` with text and reactions). The
/// item timestamp backfills `message.ts` when the snapshot omits it.
pub fn inject_message_snapshot(event: &mut Value, mut snapshot: Value) {
    let item_ts = event
        .get("item")
        .and_then(|item| item.get("ts"))
        .cloned();
    if snapshot.get("ts").and_then(Value::as_str).is_none() {
        if let (Some(object), Some(ts)) = (snapshot.as_object_mut(), item_ts) {
            object.insert("ts".to_string(), ts);
        }
    }
    if let Some(item) = event.get_mut("item").and_then(Value::as_object_mut) {
        item.insert("message".to_string(), snapshot);
    }
}
