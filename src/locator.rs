//! Maps an area to its destination worksheet and that worksheet's labels to coordinates.
//!
//! Maps are rebuilt for every write so that rows inserted in the sheet by
//! someone else since the last operation are picked up. A change made between
//! the read here and the write that follows is not detected.

use crate::catalog::normalize_header;
use crate::cell::CellRef;
use crate::config::{Config, SheetsConfig};
use crate::error::{InventoryError, Result};
use crate::filter::Area;
use crate::store::SheetStore;
use std::collections::HashMap;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorksheetHandle {
    pub area: Area,
    pub title: String,
}

/// Finds the destination tab for `area`. Tab titles are matched case-insensitively.
pub fn resolve_sheet<S: SheetStore + ?Sized>(
    store: &S,
    area: &str,
    sheets: &SheetsConfig,
) -> Result<WorksheetHandle> {
    let area = Area::parse(area)?;
    let wanted = area.sheet_title(sheets).to_uppercase();
    store
        .worksheet_titles()?
        .into_iter()
        .find(|t| t.to_uppercase() == wanted)
        .map(|title| WorksheetHandle { area, title })
        .ok_or_else(|| {
            InventoryError::DataSource(format!(
                "worksheet '{}' for area {} not found",
                area.sheet_title(sheets),
                area
            ))
        })
}

/// Upper-cased header label -> 1-based column. Blank header cells are skipped.
pub fn header_map<S: SheetStore + ?Sized>(
    store: &S,
    sheet: &WorksheetHandle,
    header_row: u32,
) -> Result<HashMap<String, u32>> {
    Ok(store
        .row_values(&sheet.title, header_row)?
        .iter()
        .enumerate()
        .filter_map(|(i, cell)| {
            let label = normalize_header(&cell.as_text());
            (!label.is_empty()).then_some((label, i as u32 + 1))
        })
        .collect())
}

/// Upper-cased product name -> 1-based row, reading the product column from `data_start_row`.
///
/// Blank cells are skipped. A duplicated name keeps its last row.
pub fn row_map<S: SheetStore + ?Sized>(
    store: &S,
    sheet: &WorksheetHandle,
    product_col: u32,
    data_start_row: u32,
) -> Result<HashMap<String, u32>> {
    let values = store.col_values(&sheet.title, product_col)?;
    let mut rows = HashMap::new();
    for (i, cell) in values.iter().enumerate() {
        let row = i as u32 + 1;
        if row < data_start_row || cell.is_blank() {
            continue;
        }
        rows.insert(cell.as_text().trim().to_uppercase(), row);
    }
    Ok(rows)
}

/// Everything a commit or reset needs to address cells in one worksheet.
#[derive(Clone, Debug)]
pub struct SheetCoordinates {
    pub sheet: WorksheetHandle,
    pub product_col: u32,
    pub closed_col: Option<u32>,
    pub open_col: Option<u32>,
    pub bottles_col: Option<u32>,
    pub date_col: Option<u32>,
    pub rows: HashMap<String, u32>,
    pub comment_cell: CellRef,
}

impl SheetCoordinates {
    /// Reads the header row and the product column of the area's worksheet.
    pub fn locate<S: SheetStore + ?Sized>(
        store: &S,
        area: &str,
        config: &Config,
    ) -> Result<SheetCoordinates> {
        let layout = &config.layout;
        let sheet = resolve_sheet(store, area, &config.sheets)?;
        let headers = header_map(store, &sheet, layout.header_row)?;
        let column = |label: &str| headers.get(&normalize_header(label)).copied();

        let product_col = column(&layout.product_header).ok_or_else(|| {
            InventoryError::DataSource(format!(
                "header '{}' not found in row {} of '{}'",
                layout.product_header, layout.header_row, sheet.title
            ))
        })?;

        let coords = SheetCoordinates {
            product_col,
            closed_col: column(&layout.closed_header),
            open_col: column(&layout.open_header),
            bottles_col: column(&layout.bottles_header),
            date_col: column(&layout.date_header),
            rows: row_map(store, &sheet, product_col, layout.data_start_row)?,
            comment_cell: config.comment_cell()?,
            sheet,
        };
        if coords.recognized_columns() == 0 {
            return Err(InventoryError::DataSource(format!(
                "no quantity or date headers found in row {} of '{}'",
                layout.header_row, coords.sheet.title
            )));
        }
        log::debug!(
            "Located '{}': {} product rows, {} writable columns",
            coords.sheet.title,
            coords.rows.len(),
            coords.recognized_columns()
        );
        Ok(coords)
    }

    pub fn row_of(&self, product: &str) -> Option<u32> {
        self.rows.get(&product.trim().to_uppercase()).copied()
    }

    /// How many of the closed/open/bottles/date columns were found.
    pub fn recognized_columns(&self) -> usize {
        [self.closed_col, self.open_col, self.bottles_col, self.date_col]
            .iter()
            .filter(|c| c.is_some())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellValue;
    use crate::spreadsheet::{Spreadsheet, Worksheet};

    fn bar_sheet() -> Worksheet {
        let mut sheet = Worksheet::create("INVENTARIO_BARRA", 10, 6);
        sheet.set(3, 3, CellValue::text("old comment"));
        for (c, label) in [
            "producto genérico ",
            "",
            "CANTIDAD CERRADO",
            "CANTIDAD ABIERTO (PESO)",
            "VALOR INVENTARIO",
            "FECHA",
        ]
        .iter()
        .enumerate()
        {
            sheet.set(4, c as u32 + 1, CellValue::from(*label));
        }
        for (r, name) in ["Ron Blanco", "", "Vodka", "ron blanco"].iter().enumerate() {
            sheet.set(5 + r as u32, 1, CellValue::from(*name));
        }
        sheet
    }

    fn store() -> Spreadsheet {
        let mut book = Spreadsheet::new("doc");
        book.add_worksheet(bar_sheet());
        book
    }

    #[test]
    fn resolves_area_to_tab() {
        let config = Config::default();
        let handle = resolve_sheet(&store(), "barra", &config.sheets).unwrap();
        assert_eq!(handle.title, "INVENTARIO_BARRA");
        assert_eq!(handle.area, Area::Bar);

        assert!(matches!(
            resolve_sheet(&store(), "COCINA", &config.sheets),
            Err(InventoryError::DataSource(_))
        ));
        assert!(matches!(
            resolve_sheet(&store(), "TERRAZA", &config.sheets),
            Err(InventoryError::InvalidArea(_))
        ));
    }

    #[test]
    fn header_map_skips_blanks() {
        let config = Config::default();
        let store = store();
        let handle = resolve_sheet(&store, "BARRA", &config.sheets).unwrap();
        let headers = header_map(&store, &handle, 4).unwrap();
        assert_eq!(headers.get("PRODUCTO GENÉRICO"), Some(&1));
        assert_eq!(headers.get("FECHA"), Some(&6));
        assert_eq!(headers.len(), 5);
    }

    #[test]
    fn row_map_keeps_last_duplicate() {
        let config = Config::default();
        let store = store();
        let handle = resolve_sheet(&store, "BARRA", &config.sheets).unwrap();
        let rows = row_map(&store, &handle, 1, 5).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows.get("RON BLANCO"), Some(&8));
        assert_eq!(rows.get("VODKA"), Some(&7));
    }

    #[test]
    fn locate_resolves_known_columns_only() {
        let coords = SheetCoordinates::locate(&store(), "BARRA", &Config::default()).unwrap();
        assert_eq!(coords.product_col, 1);
        assert_eq!(coords.closed_col, Some(3));
        assert_eq!(coords.open_col, Some(4));
        assert_eq!(coords.bottles_col, None);
        assert_eq!(coords.date_col, Some(6));
        assert_eq!(coords.recognized_columns(), 3);
        assert_eq!(coords.row_of("Vodka"), Some(7));
        assert_eq!(coords.comment_cell.address(), "C3");
    }

    #[test]
    fn missing_product_header_is_fatal() {
        let mut store = store();
        store
            .worksheet_mut("INVENTARIO_BARRA")
            .unwrap()
            .set(4, 1, CellValue::text("NOMBRE"));
        assert!(matches!(
            SheetCoordinates::locate(&store, "BARRA", &Config::default()),
            Err(InventoryError::DataSource(_))
        ));
    }
}
