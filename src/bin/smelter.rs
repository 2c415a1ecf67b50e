//! smelter: Export event records to a JSON array or a flattened CSV table
//!
//! The output extension picks the encoding.
//!
//! Usage:
//!   # Every file under ./input into one JSON array
//!   smelter
//!
//!   # Avro sink files into a CSV of metric rows
//!   smelter --input exports/ --output metrics.csv --layout metrics
//!
//!   # NDJSON to compact JSON
//!   smelter --input events.jsonl --output out/events.json --compact

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::Parser;
use smelter::cli::{init_tracing, ExportArgs};
use smelter::error::exit_status;
use smelter::export;
use std::process::ExitCode;
use tracing::error;

fn main() -> ExitCode {
    init_tracing();
    let args = ExportArgs::parse();

    match export(&args.input, &args.output, &args.config()) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            ExitCode::from(exit_status(&err) as u8)
        }
    }
}
