//! Turns broker messages into match events and feeds them to the worker pool.
//!
//! Messages arrive one per line, as JSON objects of the form
//!
//! ```json
//! {"type": "MATCH", "subType": "UNWINDIA_MATCH_READY_ALL", "data": {"msId": "M100", "matchTitle": "Alpha vs Beta", ...}}
//! ```
//!
//! `data` is decoded leniently. The match id is taken from `msId`, `MsID` or `match_id` and may be a string or a
//! number. The title is taken from `matchTitle`, `MatchTitle` or `match_title`. The whole `data` object becomes the
//! event payload, so that the post template can use any of it. Lines that cannot be decoded are logged and skipped.
use forum_sync_engine::{EventProducer, MatchEvent};
use log::*;
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

const MATCH_ID_FIELDS: [&str; 3] = ["msId", "MsID", "match_id"];
const MATCH_TITLE_FIELDS: [&str; 3] = ["matchTitle", "MatchTitle", "match_title"];

#[derive(Debug, Clone, Error)]
pub enum IngestError {
    #[error("The message is not valid JSON. {0}")]
    InvalidJson(String),
    #[error("The message carries no match data")]
    MissingData,
    #[error("The match data has no {0}")]
    MissingField(&'static str),
    #[error("The match data has an unusable {0}: {1}")]
    InvalidField(&'static str, String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct BrokerMessage {
    #[serde(rename = "type", default)]
    pub message_type: Option<String>,
    #[serde(rename = "subType", default)]
    pub sub_type: Option<String>,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub published: usize,
    pub skipped: usize,
}

pub fn decode_message(line: &str) -> Result<MatchEvent, IngestError> {
    let message = serde_json::from_str::<BrokerMessage>(line).map_err(|e| IngestError::InvalidJson(e.to_string()))?;
    trace!(
        "📥️ Decoding {} / {} message",
        message.message_type.as_deref().unwrap_or("untyped"),
        message.sub_type.as_deref().unwrap_or("-")
    );
    let data = message.data.as_object().ok_or(IngestError::MissingData)?;
    let raw_id = first_field(data, &MATCH_ID_FIELDS).ok_or(IngestError::MissingField("match id"))?;
    let match_id = weak_string(raw_id)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| IngestError::InvalidField("match id", raw_id.to_string()))?;
    let match_title = match first_field(data, &MATCH_TITLE_FIELDS).and_then(weak_string) {
        Some(title) if !title.trim().is_empty() => title,
        _ => {
            debug!("📥️ Match {match_id} has no title. Using a generated one.");
            format!("Match {match_id}")
        },
    };
    Ok(MatchEvent::new(match_id.into(), match_title).with_payload(message.data))
}

/// Reads broker messages from `reader` until it is exhausted, publishing every decodable one to `producer`.
///
/// The producer is dropped when this returns, which lets the worker pool shut down once the queue has drained.
pub async fn run_ingestion<R>(reader: R, producer: EventProducer<MatchEvent>) -> IngestStats
where R: AsyncBufRead + Unpin {
    let mut stats = IngestStats::default();
    let mut lines = reader.lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                error!("📥️ Could not read from the message feed. Ingestion stops. {e}");
                break;
            },
        };
        if line.trim().is_empty() {
            continue;
        }
        match decode_message(&line) {
            Ok(event) => {
                debug!("📥️ Queueing event for match {}", event.match_id);
                producer.publish_event(event).await;
                stats.published += 1;
            },
            Err(e) => {
                warn!("📥️ Skipping message. {e}");
                trace!("📥️ Skipped message: {line}");
                stats.skipped += 1;
            },
        }
    }
    info!("📥️ Message feed closed. {} events queued, {} messages skipped.", stats.published, stats.skipped);
    stats
}

fn first_field<'a>(data: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|name| data.get(*name)).filter(|v| !v.is_null())
}

fn weak_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
