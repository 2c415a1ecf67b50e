use crate::error::RecordError;
use crate::source::types::{Record, ScanStats};
use serde_json::Value;
use std::path::Path;
use tracing::debug;

/// Split newline-delimited JSON into one payload record per non-blank line
///
/// Lines are not parsed here; a bad line surfaces when it is flattened or
/// written out.
pub fn read_ndjson(content: &[u8], records: &mut Vec<Record>) -> ScanStats {
    let mut stats = ScanStats::default();

    for line in content.split(|b| *b == b'\n') {
        let line = trim_ascii(line);
        if line.is_empty() {
            continue;
        }
        records.push(Record::payload(line));
        stats.records_decoded += 1;
    }

    stats
}

/// Read a top-level JSON array, one structured record per element
pub fn read_json_array(
    content: &[u8],
    origin: &Path,
    records: &mut Vec<Record>,
) -> Result<ScanStats, RecordError> {
    // simd-json parses in place, keep the original for the fallback
    let mut scratch = content.to_vec();
    let elements: Vec<Value> = match simd_json::serde::from_slice(&mut scratch) {
        Ok(elements) => elements,
        Err(err) => {
            debug!(file = %origin.display(), "SIMD parse failed ({}), falling back to serde_json", err);
            serde_json::from_slice(content)?
        }
    };

    let stats = ScanStats {
        records_decoded: elements.len(),
        ..ScanStats::default()
    };
    records.extend(elements.into_iter().map(Record::Structured));

    Ok(stats)
}

fn trim_ascii(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &bytes[start..end]
}
