//! smelter-csv: Flatten a JSON export into CSV
//!
//! Usage:
//!   # analytics export (NDJSON) into events.csv next to it
//!   smelter-csv events.json
//!
//!   # any JSON objects, one column per top-level key
//!   smelter-csv dump.json --layout generic --output flat.csv --sanitize-keys

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::Parser;
use smelter::cli::{init_tracing, ConvertArgs};
use smelter::error::exit_status;
use smelter::export;
use std::process::ExitCode;
use tracing::{error, info};

fn main() -> ExitCode {
    init_tracing();
    let args = ConvertArgs::parse();
    let output = args.output_path();

    match export(&args.input, &output, &args.config()) {
        Ok(report) => {
            info!(
                rows = report.rows_written,
                columns_renamed = report.collisions,
                "Converted {} to {}",
                args.input.display(),
                output.display()
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{:#}", err);
            ExitCode::from(exit_status(&err) as u8)
        }
    }
}
