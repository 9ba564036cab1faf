#![cfg(not(tarpaulin_include))]

use inventory::{app, config, loader};
use std::env;
use std::path::PathBuf;

/// Main entry point for the web application
///
/// Usage: `website [workbook] [addr] [snapshot]`
///
/// * `workbook` - CSV directory, CSV file or `.bin.gz` snapshot (default `demos/workbook`)
/// * `addr` - listen address (default `127.0.0.1:3000`)
/// * `snapshot` - where writes are persisted; defaults to the workbook itself when
///   it is a snapshot, otherwise writes stay in memory
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    let workbook = PathBuf::from(args.get(1).map(String::as_str).unwrap_or("demos/workbook"));
    let addr = args.get(2).cloned().unwrap_or_else(|| "127.0.0.1:3000".to_string());

    let is_snapshot = workbook
        .extension()
        .is_some_and(|ext| ext == "gz" || ext == "bin");
    let snapshot = match args.get(3) {
        Some(path) => Some(PathBuf::from(path)),
        None if is_snapshot => Some(workbook.clone()),
        None => {
            log::warn!("No snapshot path given; writes are kept in memory only");
            None
        }
    };

    let config = config::load_config(None)?;
    let store = loader::load_spreadsheet(&workbook)?;
    log::info!(
        "Serving workbook '{}' with {} worksheets",
        store.title,
        store.sheets.len()
    );

    app::run(config, store, snapshot, &addr).await
}
