//! Turns staged quantities (or a zero-fill) into addressed cell writes.
//!
//! Only the closed, open, bottles and date columns resolved by the locator are
//! ever written, plus the comment cell. Any other column, in particular the
//! formula-driven inventory value column, is left untouched.
//!
//! Writes go out as one batch per call. The batch is not atomic: if the store
//! fails part way, some cells are written and others are not, and nothing is
//! rolled back.

use crate::cell::{CellRef, CellValue};
use crate::config::MissingProductPolicy;
use crate::error::{InventoryError, Result};
use crate::locator::SheetCoordinates;
use crate::preview::PreviewRow;
use crate::store::{CellUpdate, SheetStore};
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt::Write;

/// Outcome of a commit.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SaveReport {
    pub rows_written: usize,
    pub cells_written: usize,
    /// Previewed products with no row in the destination sheet.
    pub missing_products: Vec<String>,
}

/// Formats the inventory date for storage (`DD-MM-YYYY` by default).
///
/// An unknown specifier in `format` is a configuration error.
pub fn format_date(date: NaiveDate, format: &str) -> Result<String> {
    let mut out = String::new();
    write!(out, "{}", date.format(format))
        .map_err(|_| InventoryError::Config(format!("invalid date_format '{}'", format)))?;
    Ok(out)
}

fn address(col: u32, row: u32) -> String {
    CellRef::new(row, col).address()
}

/// Builds the commit batch without touching the store.
pub fn save_updates(
    rows: &[PreviewRow],
    coords: &SheetCoordinates,
    date: &str,
) -> (Vec<CellUpdate>, SaveReport) {
    let mut updates = Vec::new();
    let mut report = SaveReport::default();

    for preview in rows {
        let Some(row) = coords.row_of(&preview.product) else {
            report.missing_products.push(preview.product.clone());
            continue;
        };
        let before = updates.len();
        if let Some(col) = coords.closed_col {
            updates.push(CellUpdate::new(address(col, row), preview.closed));
        }
        if let Some(col) = coords.open_col {
            updates.push(CellUpdate::new(address(col, row), preview.open));
        }
        if coords.sheet.area.is_bar() {
            if let (Some(col), Some(bottles)) = (coords.bottles_col, preview.bottles) {
                updates.push(CellUpdate::new(address(col, row), bottles));
            }
        }
        if let Some(col) = coords.date_col {
            updates.push(CellUpdate::new(address(col, row), CellValue::text(date)));
        }
        if updates.len() > before {
            report.rows_written += 1;
        }
    }

    report.cells_written = updates.len();
    (updates, report)
}

/// Writes the previewed quantities and the date into the area's worksheet.
pub fn save<S: SheetStore + ?Sized>(
    store: &mut S,
    rows: &[PreviewRow],
    coords: &SheetCoordinates,
    date: &str,
    policy: MissingProductPolicy,
) -> Result<SaveReport> {
    let (updates, report) = save_updates(rows, coords, date);

    if !report.missing_products.is_empty() {
        match policy {
            MissingProductPolicy::Skip => log::debug!(
                "Skipping {} products not present in '{}'",
                report.missing_products.len(),
                coords.sheet.title
            ),
            MissingProductPolicy::Warn => log::warn!(
                "Products not present in '{}': {}",
                coords.sheet.title,
                report.missing_products.join(", ")
            ),
            MissingProductPolicy::Reject => {
                return Err(InventoryError::MissingProducts(report.missing_products));
            }
        }
    }

    if !updates.is_empty() {
        store.batch_update(&coords.sheet.title, &updates)?;
    }
    log::info!(
        "Saved {} rows ({} cells) to '{}'",
        report.rows_written,
        report.cells_written,
        coords.sheet.title
    );
    Ok(report)
}

/// Zero-fill for every product row of the sheet plus the comment clear.
pub fn reset_updates(coords: &SheetCoordinates) -> Vec<CellUpdate> {
    let mut rows: Vec<u32> = coords.rows.values().copied().collect();
    rows.sort_unstable();

    let mut updates = Vec::with_capacity(rows.len() * coords.recognized_columns() + 1);
    for row in rows {
        for col in [coords.closed_col, coords.open_col, coords.bottles_col]
            .into_iter()
            .flatten()
        {
            updates.push(CellUpdate::new(address(col, row), 0.0));
        }
        if let Some(col) = coords.date_col {
            updates.push(CellUpdate::new(address(col, row), CellValue::Empty));
        }
    }
    updates.push(CellUpdate::new(coords.comment_cell.address(), CellValue::Empty));
    updates
}

/// Clears the whole area: every row in the row map, whatever the active filters are.
///
/// Irreversible. Returns the number of cell writes issued.
pub fn reset<S: SheetStore + ?Sized>(store: &mut S, coords: &SheetCoordinates) -> Result<usize> {
    let updates = reset_updates(coords);
    store.batch_update(&coords.sheet.title, &updates)?;
    log::info!(
        "Reset {} rows ({} cells) in '{}'",
        coords.rows.len(),
        updates.len(),
        coords.sheet.title
    );
    Ok(updates.len())
}

/// Overwrites the general comment cell.
pub fn save_comment<S: SheetStore + ?Sized>(
    store: &mut S,
    coords: &SheetCoordinates,
    text: &str,
) -> Result<()> {
    store.update(
        &coords.sheet.title,
        &coords.comment_cell.address(),
        CellValue::from(text),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Area;
    use crate::locator::WorksheetHandle;
    use std::collections::HashMap;

    fn coords(area: Area) -> SheetCoordinates {
        SheetCoordinates {
            sheet: WorksheetHandle {
                area,
                title: "S".to_string(),
            },
            product_col: 1,
            closed_col: Some(3),
            open_col: Some(4),
            bottles_col: Some(5),
            date_col: Some(7),
            rows: HashMap::from([("RON BLANCO".to_string(), 5), ("VODKA".to_string(), 6)]),
            comment_cell: CellRef::new(3, 3),
        }
    }

    fn preview(product: &str, closed: f64, open: f64, bottles: Option<f64>) -> PreviewRow {
        PreviewRow {
            product: product.to_string(),
            unit: "ML".to_string(),
            uom_quantity: 750.0,
            closed,
            open,
            bottles,
            price: 100.0,
            cost: 50.0,
            value: 0.0,
        }
    }

    #[test]
    fn save_addresses_only_known_columns() {
        let rows = vec![preview("Ron Blanco", 2.0, 1.0, Some(3.0))];
        let (updates, report) = save_updates(&rows, &coords(Area::Bar), "18-10-2026");
        assert_eq!(
            updates,
            vec![
                CellUpdate::new("C5", 2.0),
                CellUpdate::new("D5", 1.0),
                CellUpdate::new("E5", 3.0),
                CellUpdate::new("G5", CellValue::text("18-10-2026")),
            ]
        );
        assert_eq!(report.rows_written, 1);
        assert_eq!(report.cells_written, 4);
        assert!(updates.iter().all(|u| !u.range.starts_with('F')));
    }

    #[test]
    fn bottles_are_not_written_outside_the_bar() {
        let rows = vec![preview("Vodka", 1.0, 0.0, None)];
        let (updates, _) = save_updates(&rows, &coords(Area::Kitchen), "01-01-2026");
        assert_eq!(updates.len(), 3);
        assert!(updates.iter().all(|u| !u.range.starts_with('E')));
    }

    #[test]
    fn unknown_products_are_reported_not_written() {
        let rows = vec![preview("Gin", 1.0, 0.0, Some(0.0)), preview("Vodka", 1.0, 0.0, Some(0.0))];
        let (updates, report) = save_updates(&rows, &coords(Area::Bar), "01-01-2026");
        assert_eq!(report.rows_written, 1);
        assert_eq!(report.missing_products, vec!["Gin"]);
        assert!(updates.iter().all(|u| u.range.ends_with('6')));
    }

    #[test]
    fn reset_covers_every_row_and_the_comment() {
        let updates = reset_updates(&coords(Area::Bar));
        assert_eq!(updates.len(), 2 * 4 + 1);
        assert_eq!(updates.last().unwrap(), &CellUpdate::new("C3", CellValue::Empty));
        assert!(updates.contains(&CellUpdate::new("E6", 0.0)));
        assert!(updates.contains(&CellUpdate::new("G5", CellValue::Empty)));
    }

    #[test]
    fn date_format() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        assert_eq!(format_date(date, "%d-%m-%Y").unwrap(), "07-03-2026");
        assert!(matches!(
            format_date(date, "%d-%Q"),
            Err(InventoryError::Config(_))
        ));
    }
}
