use bincode::{deserialize_from, serialize_into};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::error::{InventoryError, Result};
use crate::spreadsheet::Spreadsheet;

/// Writes a gzip-compressed bincode snapshot of the workbook.
pub fn save_spreadsheet(spreadsheet: &Spreadsheet, filename: impl AsRef<Path>) -> Result<()> {
    let file = File::create(filename)?;
    write_snapshot(spreadsheet, file)
}

pub fn load_spreadsheet(filename: impl AsRef<Path>) -> Result<Spreadsheet> {
    let file = File::open(filename)?;
    read_snapshot(file)
}

pub fn write_snapshot<W: Write>(spreadsheet: &Spreadsheet, out: W) -> Result<()> {
    let encoder = GzEncoder::new(out, Compression::default());
    let mut writer = BufWriter::new(encoder);

    serialize_into(&mut writer, spreadsheet)
        .map_err(|e| InventoryError::Snapshot(e.to_string()))?;

    let encoder = writer
        .into_inner()
        .map_err(|e| InventoryError::Io(e.into_error()))?;
    encoder.finish()?;
    Ok(())
}

pub fn read_snapshot<R: Read>(input: R) -> Result<Spreadsheet> {
    let decoder = GzDecoder::new(input);
    let mut reader = BufReader::new(decoder);

    let spreadsheet: Spreadsheet =
        deserialize_from(&mut reader).map_err(|e| InventoryError::Snapshot(e.to_string()))?;

    Ok(spreadsheet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellValue;
    use crate::spreadsheet::Worksheet;

    #[test]
    fn snapshot_survives_a_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inventario.bin.gz");

        let mut book = Spreadsheet::new("doc");
        let mut sheet = Worksheet::create("INVENTARIO_BARRA", 5, 3);
        sheet.set(5, 1, CellValue::text("RON BLANCO"));
        sheet.set(5, 3, CellValue::Number(2.5));
        book.add_worksheet(sheet);

        save_spreadsheet(&book, &path).unwrap();
        let loaded = load_spreadsheet(&path).unwrap();
        assert_eq!(loaded, book);
    }

    #[test]
    fn garbage_is_a_snapshot_error() {
        let err = read_snapshot(&b"not a snapshot"[..]).unwrap_err();
        assert!(matches!(err, InventoryError::Snapshot(_) | InventoryError::Io(_)));
    }
}
