//! Record layouts
//!
//! A layout knows the shape of one kind of record: which scalar fields are
//! copied into every row, which nested collection is expanded one row per
//! item, and which free-form collections contribute discovered columns.

mod analytics;
mod event_batch;
mod generic;
mod metrics;

pub use analytics::AnalyticsLayout;
pub use event_batch::EventBatchLayout;
pub use generic::GenericLayout;
pub use metrics::MetricsLayout;

use crate::error::RecordError;
use crate::flatten::plan::KeyAccumulator;
use crate::flatten::types::{ColumnGroup, Expansion};
use crate::source::Record;
use crate::value::format_json;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::collections::BTreeMap;

/// Projection rules for one record shape
pub trait RowLayout {
    fn name(&self) -> &'static str;

    /// Columns present in every row, before the discovered ones
    fn fixed_columns(&self) -> Vec<&'static str>;

    /// Groups of discovered columns, in header order
    fn groups(&self) -> &'static [ColumnGroup] {
        &[]
    }

    /// Expand one record into row drafts, one per child item
    fn expand(&self, record: &Record) -> Result<Expansion, RecordError>;

    /// Feed the dynamic keys of one record into the discovery pass
    ///
    /// Records that do not expand contribute nothing.
    fn collect_keys(&self, record: &Record, keys: &mut KeyAccumulator) {
        if self.groups().is_empty() {
            return;
        }
        if let Ok(expansion) = self.expand(record) {
            for row in &expansion.rows {
                keys.observe(row);
            }
        }
    }
}

/// Decode each element of a child collection, reporting the ones that fail
pub(crate) fn decode_items<T: DeserializeOwned>(
    collection: &'static str,
    items: &[Value],
    skipped: &mut Vec<RecordError>,
) -> Vec<T> {
    let mut decoded = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        match T::deserialize(item) {
            Ok(value) => decoded.push(value),
            Err(source) => skipped.push(RecordError::InvalidItem {
                collection,
                index,
                source,
            }),
        }
    }
    decoded
}

/// A free-form key/value field as found on a child item
pub(crate) enum DynamicFields<'a> {
    Absent,
    Fields(Cow<'a, Map<String, Value>>),
    Malformed,
}

/// Interpret a free-form field
///
/// Objects are used directly. A string holding a JSON object (a
/// double-encoded payload) is parsed. Null means no keys; anything else is
/// malformed.
pub(crate) fn dynamic_fields(value: &Value) -> DynamicFields<'_> {
    match value {
        Value::Null => DynamicFields::Absent,
        Value::Object(map) => DynamicFields::Fields(Cow::Borrowed(map)),
        Value::String(text) => match serde_json::from_str::<Map<String, Value>>(text) {
            Ok(map) => DynamicFields::Fields(Cow::Owned(map)),
            Err(_) => DynamicFields::Malformed,
        },
        _ => DynamicFields::Malformed,
    }
}

/// Format every value of a free-form field
pub(crate) fn format_fields(fields: &Map<String, Value>) -> BTreeMap<String, String> {
    fields
        .iter()
        .map(|(key, value)| (key.clone(), format_json(value)))
        .collect()
}
