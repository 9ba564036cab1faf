use crate::cell::{CellRef, CellValue, column_letter};
use crate::error::{InventoryError, Result};
use crate::store::{CellUpdate, SheetStore};
use serde::{Deserialize, Serialize};

/// A single tab: a growable row-major grid of cells.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Worksheet {
    pub title: String,
    pub rows: u32,
    pub cols: u32,
    pub cells: Vec<CellValue>,
}

/// An in-memory workbook holding worksheets in document order.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct Spreadsheet {
    pub title: String,
    pub sheets: Vec<Worksheet>,
}

impl Worksheet {
    pub fn create(title: &str, rows: u32, cols: u32) -> Self {
        Worksheet {
            title: title.to_string(),
            rows,
            cols,
            cells: vec![CellValue::Empty; rows as usize * cols as usize],
        }
    }

    /// Builds a sheet whose row `i + 1` holds `rows[i]`.
    pub fn from_rows(title: &str, rows: Vec<Vec<CellValue>>) -> Self {
        let cols = rows.iter().map(Vec::len).max().unwrap_or(0) as u32;
        let mut sheet = Worksheet::create(title, rows.len() as u32, cols);
        for (r, row) in rows.into_iter().enumerate() {
            for (c, value) in row.into_iter().enumerate() {
                sheet.set(r as u32 + 1, c as u32 + 1, value);
            }
        }
        sheet
    }

    fn index(&self, row: u32, col: u32) -> usize {
        (row - 1) as usize * self.cols as usize + (col - 1) as usize
    }

    fn grow(&mut self, rows: u32, cols: u32) {
        let new_rows = rows.max(self.rows);
        let new_cols = cols.max(self.cols);
        if new_rows == self.rows && new_cols == self.cols {
            return;
        }
        let mut cells = vec![CellValue::Empty; new_rows as usize * new_cols as usize];
        for r in 1..=self.rows {
            for c in 1..=self.cols {
                let old = self.index(r, c);
                let new = (r - 1) as usize * new_cols as usize + (c - 1) as usize;
                cells[new] = std::mem::take(&mut self.cells[old]);
            }
        }
        self.rows = new_rows;
        self.cols = new_cols;
        self.cells = cells;
    }

    pub fn get(&self, row: u32, col: u32) -> Option<&CellValue> {
        if row == 0 || col == 0 || row > self.rows || col > self.cols {
            return None;
        }
        self.cells.get(self.index(row, col))
    }

    pub fn set(&mut self, row: u32, col: u32, value: CellValue) {
        if row == 0 || col == 0 {
            return;
        }
        self.grow(row, col);
        let index = self.index(row, col);
        self.cells[index] = value;
    }

    pub fn set_ref(&mut self, cell: CellRef, value: CellValue) {
        self.set(cell.row, cell.col, value);
    }

    pub fn row_values(&self, row: u32) -> Vec<CellValue> {
        let mut values: Vec<CellValue> = (1..=self.cols)
            .map(|c| self.get(row, c).cloned().unwrap_or_default())
            .collect();
        trim_trailing_blanks(&mut values);
        values
    }

    pub fn col_values(&self, col: u32) -> Vec<CellValue> {
        let mut values: Vec<CellValue> = (1..=self.rows)
            .map(|r| self.get(r, col).cloned().unwrap_or_default())
            .collect();
        trim_trailing_blanks(&mut values);
        values
    }

    /// Rectangular read up to the last non-blank row and column.
    pub fn all_values(&self) -> Vec<Vec<CellValue>> {
        let last_col = (1..=self.cols)
            .rev()
            .find(|&c| (1..=self.rows).any(|r| self.get(r, c).is_some_and(|v| !v.is_blank())))
            .unwrap_or(0);
        let mut rows: Vec<Vec<CellValue>> = (1..=self.rows)
            .map(|r| {
                (1..=last_col)
                    .map(|c| self.get(r, c).cloned().unwrap_or_default())
                    .collect()
            })
            .collect();
        while rows
            .last()
            .is_some_and(|row: &Vec<CellValue>| row.iter().all(CellValue::is_blank))
        {
            rows.pop();
        }
        rows
    }

    /// Prints a window of at most 10x10 cells starting at (`view_row` + 1, `view_col` + 1).
    pub fn display(&self, view_row: u32, view_col: u32) {
        let end_row = (view_row + 10).min(self.rows);
        let end_col = (view_col + 10).min(self.cols);

        print!("\t");
        for col in (view_col + 1)..=end_col {
            print!("{:<16}", column_letter(col));
        }
        println!();
        for row in (view_row + 1)..=end_row {
            print!("{}\t", row);
            for col in (view_col + 1)..=end_col {
                let text = self.get(row, col).map(CellValue::as_text).unwrap_or_default();
                let text: String = text.chars().take(15).collect();
                print!("{:<16}", text);
            }
            println!();
        }
    }
}

fn trim_trailing_blanks(values: &mut Vec<CellValue>) {
    while values.last().is_some_and(CellValue::is_blank) {
        values.pop();
    }
}

impl Spreadsheet {
    pub fn new(title: &str) -> Self {
        Spreadsheet {
            title: title.to_string(),
            sheets: Vec::new(),
        }
    }

    /// Adds a worksheet, replacing any existing one with the same title.
    pub fn add_worksheet(&mut self, sheet: Worksheet) {
        match self.sheets.iter_mut().find(|s| s.title == sheet.title) {
            Some(existing) => *existing = sheet,
            None => self.sheets.push(sheet),
        }
    }

    pub fn worksheet(&self, title: &str) -> Result<&Worksheet> {
        self.sheets
            .iter()
            .find(|s| s.title == title)
            .ok_or_else(|| InventoryError::DataSource(format!("worksheet '{}' not found", title)))
    }

    pub fn worksheet_mut(&mut self, title: &str) -> Result<&mut Worksheet> {
        self.sheets
            .iter_mut()
            .find(|s| s.title == title)
            .ok_or_else(|| InventoryError::DataSource(format!("worksheet '{}' not found", title)))
    }
}

impl SheetStore for Spreadsheet {
    fn worksheet_titles(&self) -> Result<Vec<String>> {
        Ok(self.sheets.iter().map(|s| s.title.clone()).collect())
    }

    fn get_all_values(&self, title: &str) -> Result<Vec<Vec<CellValue>>> {
        Ok(self.worksheet(title)?.all_values())
    }

    fn row_values(&self, title: &str, row: u32) -> Result<Vec<CellValue>> {
        Ok(self.worksheet(title)?.row_values(row))
    }

    fn col_values(&self, title: &str, col: u32) -> Result<Vec<CellValue>> {
        Ok(self.worksheet(title)?.col_values(col))
    }

    fn batch_update(&mut self, title: &str, updates: &[CellUpdate]) -> Result<()> {
        let sheet = self.worksheet_mut(title)?;
        for update in updates {
            let cell: CellRef = update.range.parse()?;
            sheet.set_ref(cell, update.value.clone());
        }
        Ok(())
    }
}
