use crate::error::RecordError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::value::RawValue;
use serde_json::Value;
use std::borrow::Cow;

/// One decoded unit from an input file
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    /// Bytes expected to hold UTF-8 JSON text
    Payload(Vec<u8>),

    /// An already-decoded nested structure
    Structured(Value),
}

impl Record {
    pub fn payload(bytes: impl Into<Vec<u8>>) -> Self {
        Record::Payload(bytes.into())
    }

    /// Decode the record into a typed structure
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, RecordError> {
        match self {
            Record::Payload(bytes) => Ok(serde_json::from_slice(bytes)?),
            Record::Structured(value) => Ok(T::deserialize(value)?),
        }
    }

    /// Decode the record as a JSON document
    pub fn document(&self) -> Result<Cow<'_, Value>, RecordError> {
        match self {
            Record::Payload(bytes) => Ok(Cow::Owned(serde_json::from_slice(bytes)?)),
            Record::Structured(value) => Ok(Cow::Borrowed(value)),
        }
    }

    /// The record as text, replacing invalid UTF-8 sequences
    pub fn lossy_text(&self) -> Cow<'_, str> {
        match self {
            Record::Payload(bytes) => String::from_utf8_lossy(bytes),
            Record::Structured(value) => Cow::Owned(value.to_string()),
        }
    }

    /// The element this record contributes to a JSON array output
    ///
    /// A valid JSON payload is embedded verbatim. Anything else is an error;
    /// callers fall back to [`ArrayElement::Text`].
    pub fn array_element(&self) -> Result<ArrayElement<'_>, RecordError> {
        match self {
            Record::Payload(bytes) => {
                let text = String::from_utf8(bytes.clone())?;
                Ok(ArrayElement::Raw(RawValue::from_string(text)?))
            }
            Record::Structured(value) => Ok(ArrayElement::Document(value)),
        }
    }
}

/// A single element of the JSON array output
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ArrayElement<'a> {
    /// Original payload text, unmodified
    Raw(Box<RawValue>),

    /// A structured record
    Document(&'a Value),

    /// A payload that was not JSON, kept as a string literal
    Text(String),
}

/// How to decode an input file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum InputFormat {
    /// Detect from the file contents
    #[default]
    Auto,
    /// Avro object container file
    Avro,
    /// One JSON document per line
    Ndjson,
    /// A single top-level JSON array
    JsonArray,
}

const AVRO_MAGIC: &[u8] = b"Obj\x01";

impl InputFormat {
    /// Resolve `Auto` by looking at the file contents
    pub fn resolve(self, content: &[u8]) -> InputFormat {
        if self != InputFormat::Auto {
            return self;
        }

        if content.starts_with(AVRO_MAGIC) {
            return InputFormat::Avro;
        }

        match content.iter().find(|b| !b.is_ascii_whitespace()) {
            Some(b'[') => InputFormat::JsonArray,
            _ => InputFormat::Ndjson,
        }
    }
}

/// Configuration for reading records
#[derive(Debug, Clone, Default)]
pub struct SourceConfig {
    /// Input file format, detected per file when `Auto`
    pub input_format: InputFormat,

    /// Replace MessagePack or base64-encoded payloads with the JSON they carry
    pub decode_payloads: bool,
}

/// Counters accumulated while reading input files
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub files_read: usize,
    pub files_skipped: usize,
    pub records_decoded: usize,
    pub records_skipped: usize,
    /// Files whose tail could not be read; records after the damage are lost
    pub files_truncated: usize,
}

impl ScanStats {
    pub fn merge(&mut self, other: ScanStats) {
        self.files_read += other.files_read;
        self.files_skipped += other.files_skipped;
        self.records_decoded += other.records_decoded;
        self.records_skipped += other.records_skipped;
        self.files_truncated += other.files_truncated;
    }
}
