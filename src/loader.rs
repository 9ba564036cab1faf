use crate::cell::CellValue;
use crate::error::{InventoryError, Result};
use crate::saving;
use crate::spreadsheet::{Spreadsheet, Worksheet};
use std::path::Path;

/// Reads a CSV cell: blank is empty, finite numbers are numbers, anything else is text.
fn parse_cell(raw: &str) -> CellValue {
    if raw.trim().is_empty() {
        return CellValue::Empty;
    }
    match raw.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => CellValue::Number(n),
        _ => CellValue::Text(raw.to_string()),
    }
}

/// Load a worksheet from a CSV file
///
/// CSV row `i` becomes worksheet row `i` (1-based). Rows may have different lengths.
///
/// # Examples
/// ```no_run
/// use inventory::loader::from_csv;
///
/// match from_csv("demos/workbook/BD_productos.csv", "BD_productos") {
///     Ok(sheet) => println!("Loaded {} rows", sheet.rows),
///     Err(e) => eprintln!("Error loading CSV: {}", e),
/// }
/// ```
pub fn from_csv(filepath: impl AsRef<Path>, title: &str) -> Result<Worksheet> {
    let path = filepath.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| InventoryError::DataSource(format!("{}: {}", path.display(), e)))?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record =
            record.map_err(|e| InventoryError::DataSource(format!("{}: {}", path.display(), e)))?;
        rows.push(record.iter().map(parse_cell).collect());
    }

    Ok(Worksheet::from_rows(title, rows))
}

/// Load a workbook from a directory of CSV files
///
/// Every `*.csv` file becomes one worksheet named after the file stem, in file
/// name order.
pub fn from_csv_dir(dir: impl AsRef<Path>) -> Result<Spreadsheet> {
    let dir = dir.as_ref();
    let mut paths: Vec<_> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
        })
        .collect();
    paths.sort();

    if paths.is_empty() {
        return Err(InventoryError::DataSource(format!(
            "no CSV files in {}",
            dir.display()
        )));
    }

    let title = dir
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("workbook");
    let mut book = Spreadsheet::new(title);
    for path in paths {
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        book.add_worksheet(from_csv(&path, stem)?);
    }
    log::info!("Loaded {} worksheets from {}", book.sheets.len(), dir.display());
    Ok(book)
}

/// Detect the source type and load the workbook
///
/// - a directory: one worksheet per CSV file
/// - `*.csv`: a single-worksheet workbook
/// - `*.gz` / `*.bin`: a snapshot written by [`saving::save_spreadsheet`]
///
/// # Examples
/// ```no_run
/// use inventory::loader::load_spreadsheet;
///
/// match load_spreadsheet("demos/workbook") {
///     Ok(book) => println!("Loaded {} worksheets", book.sheets.len()),
///     Err(e) => eprintln!("Error loading workbook: {}", e),
/// }
/// ```
pub fn load_spreadsheet(filepath: impl AsRef<Path>) -> Result<Spreadsheet> {
    let path = filepath.as_ref();
    if path.is_dir() {
        return from_csv_dir(path);
    }

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase());

    match extension.as_deref() {
        Some("csv") => {
            let title = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("Sheet1");
            let mut book = Spreadsheet::new(title);
            book.add_worksheet(from_csv(path, title)?);
            Ok(book)
        }
        Some("gz") | Some("bin") => saving::load_spreadsheet(path),
        Some(ext) => Err(InventoryError::DataSource(format!(
            "unsupported file extension: {}",
            ext
        ))),
        None => Err(InventoryError::DataSource(format!(
            "{} has no extension",
            path.display()
        ))),
    }
}
