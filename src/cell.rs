use crate::error::{InventoryError, Result};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

lazy_static! {
    static ref CELL_REF_REGEX: Regex = Regex::new(r"^([A-Za-z]+)([0-9]+)$").unwrap();
}

/// Raw content of one spreadsheet cell.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn text(s: impl Into<String>) -> Self {
        CellValue::Text(s.into())
    }

    /// Empty cells and whitespace-only text both count as blank.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Number(_) => false,
        }
    }

    /// Formatted value, the way the sheet would display it.
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => format_number(*n),
        }
    }

    /// Numeric reading of the cell; never fails, see [`safe_float`].
    pub fn as_f64(&self) -> f64 {
        match self {
            CellValue::Number(n) if n.is_finite() => *n,
            CellValue::Number(_) | CellValue::Empty => 0.0,
            CellValue::Text(s) => safe_float(Some(s)),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(s.to_string())
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Total coercion of user or sheet input to a float.
///
/// `None`, the empty string, the literal `"None"` and anything that does not
/// parse as a finite number all become `0.0`. Thousands separators (`,`) are
/// stripped before parsing. This function never fails.
pub fn safe_float(raw: Option<&str>) -> f64 {
    let Some(raw) = raw else {
        return 0.0;
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "None" {
        return 0.0;
    }
    match trimmed.replace(',', "").parse::<f64>() {
        Ok(n) if n.is_finite() => n,
        _ => 0.0,
    }
}

/// Converts a 1-based column index to its letters (1 -> "A", 27 -> "AA").
///
/// Index 0 has no letter form and yields an empty string.
pub fn column_letter(col: u32) -> String {
    let mut n = col;
    let mut result = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        n = (n - 1) / 26;
        result.push((b'A' + rem as u8) as char);
    }
    result.iter().rev().collect()
}

/// Inverse of [`column_letter`]. Returns `None` for empty, non-alphabetic or overflowing input.
pub fn column_index(letters: &str) -> Option<u32> {
    if letters.is_empty() {
        return None;
    }
    letters.chars().try_fold(0u32, |acc, c| {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        let digit = (c.to_ascii_uppercase() as u8 - b'A' + 1) as u32;
        acc.checked_mul(26)?.checked_add(digit)
    })
}

/// A 1-based cell coordinate, rendered as `<ColumnLetter><RowNumber>`.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
pub struct CellRef {
    pub row: u32,
    pub col: u32,
}

impl CellRef {
    pub fn new(row: u32, col: u32) -> Self {
        CellRef { row, col }
    }

    pub fn address(&self) -> String {
        format!("{}{}", column_letter(self.col), self.row)
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_letter(self.col), self.row)
    }
}

impl FromStr for CellRef {
    type Err = InventoryError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || InventoryError::InvalidAddress(s.to_string());
        let captures = CELL_REF_REGEX.captures(s.trim()).ok_or_else(invalid)?;
        let col = column_index(&captures[1]).ok_or_else(invalid)?;
        let row = captures[2].parse::<u32>().map_err(|_| invalid())?;
        if row == 0 {
            return Err(invalid());
        }
        Ok(CellRef { row, col })
    }
}
