//! Command-line arguments shared by the binaries
//!
//! Each binary parses one of these structs and turns it into an
//! [`ExportConfig`]; keeping them here lets the defaults be tested.

use crate::flatten::{FlattenConfig, Layout};
use crate::pipeline::ExportConfig;
use crate::source::{InputFormat, SourceConfig};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "smelter")]
#[command(about = "Export event records to a JSON array or a flattened CSV", long_about = None)]
pub struct ExportArgs {
    /// Input file or directory
    #[arg(long, short = 'i', default_value = "input")]
    pub input: PathBuf,

    /// Output file, .json or .csv
    #[arg(long, short = 'o', default_value = "output/all-events.json")]
    pub output: PathBuf,

    /// Compact JSON output (no indentation)
    #[arg(long)]
    pub compact: bool,

    /// Record layout used for CSV output
    #[arg(long, value_enum, default_value_t = Layout::EventBatch)]
    pub layout: Layout,

    /// Input file format
    #[arg(long, value_enum, default_value_t = InputFormat::Auto)]
    pub input_format: InputFormat,

    /// Replace characters outside [A-Za-z0-9_] in discovered column names
    #[arg(long)]
    pub sanitize_keys: bool,

    /// Add event_time_utc and event_timestamp_ref_utc columns (event-batch layout)
    #[arg(long)]
    pub utc_timestamps: bool,

    /// Decode MessagePack and base64-encoded payloads into JSON
    #[arg(long, alias = "decode-base64")]
    pub decode_payloads: bool,
}

impl ExportArgs {
    pub fn config(&self) -> ExportConfig {
        ExportConfig {
            flatten: FlattenConfig {
                layout: self.layout,
                sanitize_keys: self.sanitize_keys,
                utc_timestamps: self.utc_timestamps,
            },
            source: SourceConfig {
                input_format: self.input_format,
                decode_payloads: self.decode_payloads,
            },
            pretty: !self.compact,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "smelter-csv")]
#[command(about = "Flatten a JSON export into CSV", long_about = None)]
pub struct ConvertArgs {
    /// Input file
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output CSV file (defaults to the input path with a .csv extension)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Record layout
    #[arg(long, value_enum, default_value_t = Layout::Analytics)]
    pub layout: Layout,

    /// Input file format
    #[arg(long, value_enum, default_value_t = InputFormat::Auto)]
    pub input_format: InputFormat,

    /// Replace characters outside [A-Za-z0-9_] in discovered column names
    #[arg(long)]
    pub sanitize_keys: bool,

    /// Add event_time_utc and event_timestamp_ref_utc columns (event-batch layout)
    #[arg(long)]
    pub utc_timestamps: bool,
}

impl ConvertArgs {
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.input.with_extension("csv"))
    }

    pub fn config(&self) -> ExportConfig {
        ExportConfig {
            flatten: FlattenConfig {
                layout: self.layout,
                sanitize_keys: self.sanitize_keys,
                utc_timestamps: self.utc_timestamps,
            },
            source: SourceConfig {
                input_format: self.input_format,
                decode_payloads: false,
            },
            pretty: false,
        }
    }
}

/// Log to stderr at `info`, or at whatever `RUST_LOG` asks for
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}
