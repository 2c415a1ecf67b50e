//! Record sources
//!
//! Reads input files into an in-memory [`RecordBuffer`]. Three file formats
//! are understood:
//!
//! - Avro object container files written by a storage sink, where each
//!   record's `message` field holds a JSON document
//! - newline-delimited JSON, one document per line
//! - a single top-level JSON array
//!
//! ## Buffering
//!
//! The CSV path needs two passes over the input (discover columns, then
//! emit rows), so every decoded record is held in memory until the output
//! is written. Memory use grows with the input size.

pub mod avro;
pub mod input;
pub mod json;
pub mod types;

pub use avro::{read_avro, record_from_avro, MESSAGE_FIELD};
pub use input::InputSet;
pub use json::{read_json_array, read_ndjson};
pub use types::{ArrayElement, InputFormat, Record, ScanStats, SourceConfig};

use base64::Engine;
use serde::de::IgnoredAny;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

/// Anything that can supply a finite, ordered sequence of records
pub trait RecordSource {
    /// Append every decodable record to `records` and report what was skipped
    fn read_into(&self, records: &mut Vec<Record>) -> ScanStats;
}

/// Records read from files on disk
#[derive(Debug, Clone)]
pub struct FileSource {
    input: InputSet,
    config: SourceConfig,
}

impl FileSource {
    pub fn new(input: InputSet, config: SourceConfig) -> Self {
        FileSource { input, config }
    }
}

impl RecordSource for FileSource {
    fn read_into(&self, records: &mut Vec<Record>) -> ScanStats {
        let mut stats = ScanStats::default();

        for path in &self.input.files {
            debug!(file = %path.display(), "Processing");

            let content = match std::fs::read(path) {
                Ok(content) => content,
                Err(err) => {
                    warn!(file = %path.display(), "Error reading file: {}", err);
                    stats.files_skipped += 1;
                    continue;
                }
            };

            let start = records.len();
            let result = match self.config.input_format.resolve(&content) {
                InputFormat::Avro => read_avro(&content, path, records),
                InputFormat::JsonArray => read_json_array(&content, path, records),
                InputFormat::Ndjson | InputFormat::Auto => Ok(read_ndjson(&content, records)),
            };

            match result {
                Ok(file_stats) => {
                    info!(
                        file = %path.display(),
                        decoded = file_stats.records_decoded,
                        skipped = file_stats.records_skipped,
                        "Decoded {} messages",
                        file_stats.records_decoded
                    );
                    stats.merge(file_stats);
                    stats.files_read += 1;
                }
                Err(err) => {
                    warn!(file = %path.display(), "Cannot decode file: {}", err);
                    records.truncate(start);
                    stats.files_skipped += 1;
                    continue;
                }
            }

            if self.config.decode_payloads {
                for record in &mut records[start..] {
                    decode_payload(record);
                }
            }
        }

        stats
    }
}

/// Replace an encoded payload with the JSON document it carries
///
/// Tried in order on payloads that are not already JSON: a MessagePack map,
/// then base64 text holding JSON, then base64 text holding a MessagePack map.
/// Payloads that match none of these are left alone.
pub fn decode_payload(record: &mut Record) {
    let Record::Payload(bytes) = record else {
        return;
    };

    if is_json(bytes) {
        return;
    }

    if let Some(json) = msgpack_to_json(bytes) {
        *bytes = json;
        return;
    }

    let decoded = {
        let text = String::from_utf8_lossy(bytes);
        base64::engine::general_purpose::STANDARD.decode(text.trim())
    };

    if let Ok(decoded) = decoded {
        if is_json(&decoded) {
            *bytes = decoded;
        } else if let Some(json) = msgpack_to_json(&decoded) {
            *bytes = json;
        }
    }
}

fn is_json(bytes: &[u8]) -> bool {
    serde_json::from_slice::<IgnoredAny>(bytes).is_ok()
}

/// Re-encode a MessagePack map as JSON text
///
/// The map must span the whole payload.
fn msgpack_to_json(bytes: &[u8]) -> Option<Vec<u8>> {
    let mut rest = bytes;
    let value = Value::deserialize(&mut rmp_serde::Deserializer::new(&mut rest)).ok()?;
    if !rest.is_empty() || !value.is_object() {
        return None;
    }
    serde_json::to_vec(&value).ok()
}

/// Every record of a run, materialized once for both passes
#[derive(Debug, Clone, Default)]
pub struct RecordBuffer {
    records: Vec<Record>,
    stats: ScanStats,
}

impl RecordBuffer {
    /// Drain a source into memory
    pub fn load<S: RecordSource + ?Sized>(source: &S) -> Self {
        let mut records = Vec::new();
        let stats = source.read_into(&mut records);
        RecordBuffer { records, stats }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn stats(&self) -> ScanStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl From<Vec<Record>> for RecordBuffer {
    fn from(records: Vec<Record>) -> Self {
        let stats = ScanStats {
            records_decoded: records.len(),
            ..ScanStats::default()
        };
        RecordBuffer { records, stats }
    }
}
