use crate::error::RecordError;
use crate::flatten::layouts::{decode_items, dynamic_fields, format_fields, DynamicFields, RowLayout};
use crate::flatten::types::{ColumnGroup, Expansion, RowDraft};
use crate::source::Record;
use crate::value::format_json;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

const GROUPS: &[ColumnGroup] = &[ColumnGroup {
    name: "payload",
    prefix: "payload_",
}];

/// Metric batches: one row per `metricMessage` item
///
/// Every key of an item's `payload` object becomes a `payload_<key>` column.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsLayout;

#[derive(Debug, Deserialize)]
struct MetricsBatch {
    #[serde(rename = "_id", default)]
    id: Value,
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
    #[serde(rename = "metricMessage", default)]
    metric_message: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct MetricMessage {
    #[serde(default)]
    id: Value,
    #[serde(default)]
    metric_name: Value,
    #[serde(default)]
    timestamp: Value,
    #[serde(default)]
    payload: Value,
}

impl RowLayout for MetricsLayout {
    fn name(&self) -> &'static str {
        "metrics"
    }

    fn fixed_columns(&self) -> Vec<&'static str> {
        vec![
            "_id",
            "playerID",
            "gameID",
            "country",
            "batchID",
            "sdkVersion",
            "metric_id",
            "metric_name",
            "timestamp",
        ]
    }

    fn groups(&self) -> &'static [ColumnGroup] {
        GROUPS
    }

    fn expand(&self, record: &Record) -> Result<Expansion, RecordError> {
        let batch: MetricsBatch = record.parse()?;
        let mut expansion = Expansion::default();

        let parent = [
            object_id(&batch.id),
            format_json(&batch.player_id),
            format_json(&batch.game_id),
            format_json(&batch.country),
            format_json(&batch.batch_id),
            format_json(&batch.sdk_version),
        ];

        let items = batch.metric_message.unwrap_or_default();
        let messages: Vec<MetricMessage> =
            decode_items("metricMessage", &items, &mut expansion.skipped);

        for (index, message) in messages.into_iter().enumerate() {
            let mut row = Vec::with_capacity(9);
            row.extend(parent.iter().cloned());
            row.extend([
                format_json(&message.id),
                format_json(&message.metric_name),
                format_json(&message.timestamp),
            ]);

            let payload = match dynamic_fields(&message.payload) {
                DynamicFields::Fields(fields) => format_fields(&fields),
                DynamicFields::Absent => BTreeMap::new(),
                DynamicFields::Malformed => {
                    expansion.warnings.push(RecordError::MalformedDynamic {
                        collection: "metricMessage",
                        index,
                        field: "payload",
                    });
                    BTreeMap::new()
                }
            };

            expansion.rows.push(RowDraft::new(row).with_group(payload));
        }

        Ok(expansion)
    }
}

/// The `$oid` of a document id, or the id itself when it is a plain value
fn object_id(id: &Value) -> String {
    match id {
        Value::Object(fields) => fields.get("$oid").map(format_json).unwrap_or_default(),
        other => format_json(other),
    }
}
