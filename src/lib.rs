//! # Smelter - Event Export Toolkit
//!
//! Turns exported event records (Avro sink containers, NDJSON or JSON array
//! files) into a single JSON array file or a flattened CSV table.
//!
//! ## Modules
//!
//! - **source**: Discover input files and decode them into records
//! - **flatten**: Expand nested records into rows with discovered columns
//! - **output**: JSON array and CSV encodings, atomic output files
//! - **pipeline**: Run a whole export, chosen by output extension
//! - **cli**: Command-line arguments for the `smelter` and `smelter-csv` binaries
//!
//! ## Quick Start
//!
//! ### Flattening records
//!
//! ```rust
//! use smelter::flatten::{FlattenConfig, Layout};
//! use smelter::pipeline::write_table;
//! use smelter::source::Record;
//! use serde_json::json;
//!
//! # fn main() -> anyhow::Result<()> {
//! let records = vec![Record::Structured(json!({
//!     "playerID": "p1",
//!     "metricMessage": [
//!         {"id": "m1", "metric_name": "fps", "payload": {"avg": 59.5}},
//!         {"id": "m2", "metric_name": "fps", "payload": {"min": 30}}
//!     ]
//! }))];
//!
//! let config = FlattenConfig {
//!     layout: Layout::Metrics,
//!     ..FlattenConfig::default()
//! };
//!
//! let mut csv = Vec::new();
//! let report = write_table(&mut csv, &records, &config)?;
//! assert_eq!(report.rows_written, 2);
//! // header ends with payload_avg,payload_min
//! # Ok(())
//! # }
//! ```
//!
//! ### Exporting a directory
//!
//! ```no_run
//! use smelter::{export, ExportConfig};
//! use std::path::Path;
//!
//! # fn main() -> anyhow::Result<()> {
//! let report = export(
//!     Path::new("input"),
//!     Path::new("output/all-events.json"),
//!     &ExportConfig::default(),
//! )?;
//! println!("{} records", report.records_decoded);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod error;
pub mod flatten;
pub mod output;
pub mod pipeline;
pub mod source;
pub mod value;

// Re-export commonly used types for convenience
pub use error::{Error, RecordError};
pub use flatten::{ColumnPlan, FlattenConfig, Layout, RowLayout, RowProjector};
pub use output::OutputFormat;
pub use pipeline::{export, ExportConfig, RunReport};
pub use source::{InputFormat, Record, RecordBuffer, SourceConfig};
pub use value::{format_json, CellValue};
