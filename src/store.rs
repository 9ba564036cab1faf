use crate::cell::CellValue;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// One addressed write: a 1x1 range such as `"D17"` and the value to put there.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct CellUpdate {
    pub range: String,
    pub value: CellValue,
}

impl CellUpdate {
    pub fn new(range: impl Into<String>, value: impl Into<CellValue>) -> Self {
        CellUpdate {
            range: range.into(),
            value: value.into(),
        }
    }
}

/// The external spreadsheet that acts as system of record.
///
/// Rows and columns are 1-based. Reads return what the sheet holds at call
/// time; nothing is cached on this side. All calls are blocking.
pub trait SheetStore {
    /// Titles of every worksheet in the document, in document order.
    fn worksheet_titles(&self) -> Result<Vec<String>>;

    /// Full read of one worksheet, row by row. Trailing blank rows are not returned.
    fn get_all_values(&self, title: &str) -> Result<Vec<Vec<CellValue>>>;

    /// Cells of a single row, up to the last non-blank cell.
    fn row_values(&self, title: &str, row: u32) -> Result<Vec<CellValue>>;

    /// Cells of a single column from row 1, up to the last non-blank cell.
    fn col_values(&self, title: &str, col: u32) -> Result<Vec<CellValue>>;

    /// Applies each update independently.
    ///
    /// There is no atomicity across cells: a failure part way through can leave
    /// earlier cells written and later ones not. Callers do not roll back.
    fn batch_update(&mut self, title: &str, updates: &[CellUpdate]) -> Result<()>;

    /// Single-cell write.
    fn update(&mut self, title: &str, range: &str, value: CellValue) -> Result<()> {
        self.batch_update(title, &[CellUpdate::new(range, value)])
    }
}
