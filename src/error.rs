//! Error types
//!
//! Two families: [`Error`] aborts a run and maps to a process exit status,
//! [`RecordError`] describes a single record or item that was skipped.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors that abort an export before or while writing output
#[derive(Error, Debug)]
pub enum Error {
    #[error("Input path not found: {}", path.display())]
    InputNotFound { path: PathBuf },

    #[error("Cannot read input {}: {source}", path.display())]
    InputUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("No files found in input directory: {}", path.display())]
    NoInputFiles { path: PathBuf },

    #[error("Output file must have a .json or .csv extension: {}", path.display())]
    UnsupportedOutput { path: PathBuf },

    #[error("Cannot create output location {}: {source}", path.display())]
    OutputCreate {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write output {}: {message}", path.display())]
    Write { path: PathBuf, message: String },
}

impl Error {
    /// Process exit status for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::InputNotFound { .. } | Error::InputUnreadable { .. } => 2,
            Error::NoInputFiles { .. } => 3,
            Error::UnsupportedOutput { .. } => 4,
            Error::OutputCreate { .. } | Error::Write { .. } => 5,
        }
    }

    pub fn write(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Error::Write {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

/// Process exit status for any error returned by an entry point
///
/// Errors that are not an [`Error`] map to 1.
pub fn exit_status(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<Error>().map_or(1, Error::exit_code)
}

/// A recoverable problem with one record or one child item
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("avro record could not be read: {0}")]
    Avro(#[from] apache_avro::Error),

    #[error("expected an Avro record, found {0}")]
    NotARecord(String),

    #[error("message field is {0}, expected bytes")]
    UnexpectedMessage(String),

    #[error("{collection}[{index}] could not be decoded: {source}")]
    InvalidItem {
        collection: &'static str,
        index: usize,
        source: serde_json::Error,
    },

    #[error("{collection}[{index}].{field} is malformed; no dynamic columns taken from it")]
    MalformedDynamic {
        collection: &'static str,
        index: usize,
        field: &'static str,
    },
}
