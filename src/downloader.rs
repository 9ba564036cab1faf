use crate::error::{InventoryError, Result};
use crate::spreadsheet::Worksheet;

/// Convert a worksheet to CSV format
///
/// Rows are written up to the last non-blank row and column; quoting of
/// commas, quotes and newlines is left to the `csv` writer.
///
/// # Examples
/// ```
/// use inventory::cell::CellValue;
/// use inventory::downloader::to_csv;
/// use inventory::spreadsheet::Worksheet;
///
/// let mut sheet = Worksheet::create("S", 2, 2);
/// sheet.set(1, 1, CellValue::text("RON, BLANCO"));
/// sheet.set(1, 2, CellValue::Number(2.0));
/// assert_eq!(to_csv(&sheet).unwrap(), "\"RON, BLANCO\",2\n");
/// ```
pub fn to_csv(sheet: &Worksheet) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());

    for row in sheet.all_values() {
        writer
            .write_record(row.iter().map(|cell| cell.as_text()))
            .map_err(|e| InventoryError::DataSource(e.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| InventoryError::DataSource(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| InventoryError::DataSource(e.to_string()))
}

/// Convert a worksheet to XLSX format
///
/// Numbers stay numbers and text stays text, so the file opens in any
/// spreadsheet application with the same layout.
#[cfg(feature = "web")]
pub fn to_xlsx(sheet: &Worksheet) -> Result<Vec<u8>> {
    use crate::cell::CellValue;
    use rust_xlsxwriter::Workbook;

    let xlsx_err = |e: rust_xlsxwriter::XlsxError| InventoryError::DataSource(e.to_string());

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(&sheet.title).map_err(xlsx_err)?;

    for (r, row) in sheet.all_values().iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            match cell {
                CellValue::Number(n) => {
                    worksheet
                        .write_number(r as u32, c as u16, *n)
                        .map_err(xlsx_err)?;
                }
                CellValue::Text(s) => {
                    worksheet
                        .write_string(r as u32, c as u16, s)
                        .map_err(xlsx_err)?;
                }
                CellValue::Empty => {}
            }
        }
    }

    workbook.save_to_buffer().map_err(xlsx_err)
}
