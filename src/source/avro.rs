use crate::error::RecordError;
use crate::source::types::{Record, ScanStats};
use crate::value::CellValue;
use apache_avro::types::Value as AvroValue;
use apache_avro::Reader;
use std::path::Path;
use tracing::warn;

/// Field of a sink record that carries the embedded JSON payload
pub const MESSAGE_FIELD: &str = "message";

/// Decode every record of an Avro object container file
///
/// A record that decodes but has no usable payload is logged and skipped. A
/// damaged block ends the read: the reader cannot resynchronize, so the rest
/// of the file is counted as truncated. Only a broken file header fails the
/// whole file.
pub fn read_avro(
    content: &[u8],
    origin: &Path,
    records: &mut Vec<Record>,
) -> Result<ScanStats, RecordError> {
    let reader = Reader::new(content)?;
    let mut stats = ScanStats::default();

    for (index, item) in reader.enumerate() {
        let value = match item {
            Ok(value) => value,
            Err(err) => {
                warn!(
                    file = %origin.display(),
                    index,
                    "Unreadable block, ignoring the rest of the file: {}",
                    err
                );
                stats.files_truncated += 1;
                break;
            }
        };

        match record_from_avro(value) {
            Ok(record) => {
                records.push(record);
                stats.records_decoded += 1;
            }
            Err(err) => {
                warn!(file = %origin.display(), index, "Skipping record: {}", err);
                stats.records_skipped += 1;
            }
        }
    }

    Ok(stats)
}

/// Turn one decoded Avro value into a record
///
/// The `message` field becomes an opaque payload. A record without that
/// field is kept whole as a structured document.
pub fn record_from_avro(value: AvroValue) -> Result<Record, RecordError> {
    let fields = match value {
        AvroValue::Record(fields) => fields,
        other => return Err(RecordError::NotARecord(kind(&other).to_string())),
    };

    if !fields.iter().any(|(name, _)| name == MESSAGE_FIELD) {
        let document = CellValue::from(AvroValue::Record(fields));
        return Ok(Record::Structured(document.into()));
    }

    let message = fields
        .into_iter()
        .find(|(name, _)| name == MESSAGE_FIELD)
        .map(|(_, value)| unwrap_union(value));

    match message {
        Some(AvroValue::Bytes(bytes)) | Some(AvroValue::Fixed(_, bytes)) => Ok(Record::Payload(bytes)),
        Some(AvroValue::String(text)) => Ok(Record::Payload(text.into_bytes())),
        Some(other) => Err(RecordError::UnexpectedMessage(kind(&other).to_string())),
        None => Err(RecordError::UnexpectedMessage("missing".to_string())),
    }
}

fn unwrap_union(value: AvroValue) -> AvroValue {
    match value {
        AvroValue::Union(_, inner) => unwrap_union(*inner),
        other => other,
    }
}

fn kind(value: &AvroValue) -> &'static str {
    match value {
        AvroValue::Null => "null",
        AvroValue::Boolean(_) => "boolean",
        AvroValue::Int(_) => "int",
        AvroValue::Long(_) => "long",
        AvroValue::Float(_) => "float",
        AvroValue::Double(_) => "double",
        AvroValue::Bytes(_) => "bytes",
        AvroValue::String(_) => "string",
        AvroValue::Fixed(..) => "fixed",
        AvroValue::Enum(..) => "enum",
        AvroValue::Union(..) => "union",
        AvroValue::Array(_) => "array",
        AvroValue::Map(_) => "map",
        AvroValue::Record(_) => "record",
        _ => "logical type",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apache_avro::{Schema, Writer};
    use serde_json::json;

    const SINK_SCHEMA: &str = r#"{
        "type": "record",
        "name": "SinkRecord",
        "fields": [
            {"name": "key", "type": ["null", "string"]},
            {"name": "message", "type": "bytes"}
        ]
    }"#;

    fn container(payloads: &[&[u8]]) -> Vec<u8> {
        let schema = Schema::parse_str(SINK_SCHEMA).unwrap();
        let mut writer = Writer::new(&schema, Vec::new());
        for payload in payloads {
            writer
                .append(AvroValue::Record(vec![
                    ("key".to_string(), AvroValue::Union(0, Box::new(AvroValue::Null))),
                    ("message".to_string(), AvroValue::Bytes(payload.to_vec())),
                ]))
                .unwrap();
        }
        writer.into_inner().unwrap()
    }

    #[test]
    fn test_reads_message_payloads() {
        let content = container(&[br#"{"a":1}"#.as_slice(), b"not json".as_slice()]);
        let mut records = Vec::new();

        let stats = read_avro(&content, Path::new("sink.avro"), &mut records).unwrap();

        assert_eq!(stats.records_decoded, 2);
        assert_eq!(stats.records_skipped, 0);
        assert_eq!(records[0], Record::payload(r#"{"a":1}"#));
        assert_eq!(records[1], Record::payload("not json"));
    }

    #[test]
    fn test_damaged_block_truncates_file() {
        let schema = Schema::parse_str(SINK_SCHEMA).unwrap();
        let mut writer = Writer::new(&schema, Vec::new());
        for n in 0..5 {
            writer
                .append(AvroValue::Record(vec![
                    ("key".to_string(), AvroValue::Union(0, Box::new(AvroValue::Null))),
                    ("message".to_string(), AvroValue::Bytes(format!("{{\"n\":{}}}", n).into_bytes())),
                ]))
                .unwrap();
            writer.flush().unwrap();
        }
        let mut content = writer.into_inner().unwrap();

        // every block ends with the 16-byte sync marker that closes the header
        let marker = content[content.len() - 16..].to_vec();
        let positions: Vec<usize> = content
            .windows(16)
            .enumerate()
            .filter(|(_, window)| *window == marker.as_slice())
            .map(|(i, _)| i)
            .collect();
        assert_eq!(positions.len(), 6);
        content[positions[3]] ^= 0xff;

        let mut records = Vec::new();
        let stats = read_avro(&content, Path::new("sink.avro"), &mut records).unwrap();

        assert_eq!(stats.files_truncated, 1);
        assert!(stats.records_decoded < 5);
        assert_eq!(records.len(), stats.records_decoded);
        for (n, record) in records.iter().enumerate() {
            assert_eq!(*record, Record::payload(format!("{{\"n\":{}}}", n)));
        }
    }

    #[test]
    fn test_broken_header_fails_file() {
        let mut records = Vec::new();
        assert!(read_avro(b"Obj\x01garbage", Path::new("x"), &mut records).is_err());
        assert!(records.is_empty());
    }

    #[test]
    fn test_record_without_message_is_structured() {
        let value = AvroValue::Record(vec![
            ("id".to_string(), AvroValue::Long(9)),
            ("name".to_string(), AvroValue::String("n".into())),
        ]);

        let record = record_from_avro(value).unwrap();
        assert_eq!(record, Record::Structured(json!({"id": 9, "name": "n"})));
    }

    #[test]
    fn test_message_inside_union_and_as_string() {
        let value = AvroValue::Record(vec![(
            "message".to_string(),
            AvroValue::Union(1, Box::new(AvroValue::String("{}".into()))),
        )]);
        assert_eq!(record_from_avro(value).unwrap(), Record::payload("{}"));
    }

    #[test]
    fn test_unexpected_shapes() {
        assert!(matches!(
            record_from_avro(AvroValue::Long(1)),
            Err(RecordError::NotARecord(kind)) if kind == "long"
        ));

        let value = AvroValue::Record(vec![("message".to_string(), AvroValue::Int(3))]);
        assert!(matches!(
            record_from_avro(value),
            Err(RecordError::UnexpectedMessage(kind)) if kind == "int"
        ));
    }
}
