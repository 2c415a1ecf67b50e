use crate::error::RecordError;
use crate::flatten::layouts::{decode_items, RowLayout};
use crate::flatten::types::{Expansion, RowDraft};
use crate::source::Record;
use crate::value::format_json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

/// Batched events: `eventGroups[].events[]`, one row per event
///
/// The event payload is kept whole as compact JSON in the `payload` column.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventBatchLayout {
    /// Add `event_time_utc` and `event_timestamp_ref_utc` after `timestamp`
    pub utc_timestamps: bool,
}

#[derive(Debug, Deserialize)]
struct EventBatch {
    #[serde(rename = "playerID", default)]
    player_id: Value,
    #[serde(rename = "gameID", default)]
    game_id: Value,
    #[serde(default)]
    country: Value,
    #[serde(rename = "batchID", default)]
    batch_id: Value,
    #[serde(rename = "sdkVersion", default)]
    sdk_version: Value,
    #[serde(rename = "eventGroups", default)]
    event_groups: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct EventGroup {
    #[serde(default)]
    player_id: Value,
    #[serde(default)]
    session_id: Value,
    #[serde(default)]
    device_id: Value,
    #[serde(default)]
    device_os: Value,
    #[serde(default)]
    device_model: Value,
    #[serde(default)]
    app_version: Value,
    #[serde(default)]
    events: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct Event {
    #[serde(default)]
    id: Value,
    #[serde(default)]
    event_name: Value,
    #[serde(default)]
    timestamp: Value,
    #[serde(default)]
    timestamp_ref_utc: Value,
    #[serde(default)]
    scene_name: Value,
    #[serde(default)]
    payload: Value,
}

impl RowLayout for EventBatchLayout {
    fn name(&self) -> &'static str {
        "event-batch"
    }

    fn fixed_columns(&self) -> Vec<&'static str> {
        let mut columns = vec![
            "playerID",
            "gameID",
            "country",
            "batchID",
            "sdkVersion",
            "player_id",
            "session_id",
            "device_id",
            "device_os",
            "device_model",
            "app_version",
            "event_id",
            "event_name",
            "timestamp",
        ];
        if self.utc_timestamps {
            columns.extend(["event_time_utc", "event_timestamp_ref_utc"]);
        }
        columns.extend(["scene_name", "payload"]);
        columns
    }

    fn expand(&self, record: &Record) -> Result<Expansion, RecordError> {
        let batch: EventBatch = record.parse()?;
        let mut expansion = Expansion::default();

        let parent = [
            format_json(&batch.player_id),
            format_json(&batch.game_id),
            format_json(&batch.country),
            format_json(&batch.batch_id),
            format_json(&batch.sdk_version),
        ];

        let groups = batch.event_groups.unwrap_or_default();
        let groups: Vec<EventGroup> = decode_items("eventGroups", &groups, &mut expansion.skipped);

        for group in groups {
            let events = group.events.unwrap_or_default();
            let events: Vec<Event> = decode_items("events", &events, &mut expansion.skipped);

            for event in events {
                let mut row = Vec::with_capacity(18);
                row.extend(parent.iter().cloned());
                row.extend([
                    format_json(&group.player_id),
                    format_json(&group.session_id),
                    format_json(&group.device_id),
                    format_json(&group.device_os),
                    format_json(&group.device_model),
                    format_json(&group.app_version),
                    format_json(&event.id),
                    format_json(&event.event_name),
                    format_json(&event.timestamp),
                ]);
                if self.utc_timestamps {
                    row.push(utc_from_millis(&event.timestamp));
                    row.push(format_json(&event.timestamp_ref_utc));
                }
                row.push(format_json(&event.scene_name));
                row.push(payload_text(&event.payload));

                expansion.rows.push(RowDraft::new(row));
            }
        }

        Ok(expansion)
    }
}

/// The event payload as compact JSON, `{}` when absent
fn payload_text(payload: &Value) -> String {
    if payload.is_null() {
        return "{}".to_string();
    }
    payload.to_string()
}

/// Render a millisecond epoch timestamp as RFC 3339 UTC
///
/// Empty for missing, zero or unparseable timestamps.
fn utc_from_millis(timestamp: &Value) -> String {
    let millis = match timestamp {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match millis {
        Some(ms) if ms.is_finite() && ms != 0.0 => {
            let micros = (ms * 1000.0).round() as i64;
            DateTime::<Utc>::from_timestamp_micros(micros)
                .map(|dt| dt.to_rfc3339())
                .unwrap_or_default()
        }
        _ => String::new(),
    }
}
