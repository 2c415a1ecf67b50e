//! Output encodings
//!
//! JSON array output keeps each record's payload as-is. CSV output writes the
//! rows produced by [`crate::flatten`]. Both are written through an
//! [`OutputFile`] so a failed run leaves no partial file behind.

pub mod format;
pub mod writer;

pub use format::OutputFormat;
pub use writer::{write_json_array, ArrayStats, OutputFile, TableWriter};
