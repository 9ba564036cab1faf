/*!
# Daily Inventory

A daily physical-inventory entry pipeline for a restaurant, backed by a
spreadsheet as the system of record.

## Overview

A user picks an area (kitchen, supplies or bar), narrows the product catalog
down by category, sub-family and product, types quantities into an editable
grid, previews the computed valuation and commits the values back to the
area's worksheet by column-letter/row-number addressing. A two-step reset
zeroes the quantity columns of the whole area and clears the general comment.

## Architecture

Control flow, leaf first:

- **Catalog** - reads the product master tab once per process and caches it
- **Filter chain** - area -> category -> sub-family -> product narrowing
- **Edit buffer** - staged quantities keyed by (area, product), kept across filter changes
- **Preview** - `price * closed + cost * open`, rounded to cents, non-zero rows only
- **Locator** - area -> worksheet, header labels -> columns, product names -> rows
- **Writer** - commit and reset as batches of addressed single-cell writes

The spreadsheet itself sits behind the [`store::SheetStore`] trait. The crate
ships an in-memory [`spreadsheet::Spreadsheet`] implementation which can be
loaded from CSV files or a compressed snapshot and saved back.

### Known limitations

- Batch writes are not atomic. A failure part way leaves some cells written.
- The row map is read right before each write; edits made to the sheet by
  someone else in between are not detected.

## Modules

- **cell**: cell values, addresses, column letters and numeric coercion
- **store**: the external spreadsheet seam
- **spreadsheet**: in-memory workbook implementing the store
- **saving**: workbook snapshots with compression
- **loader**: workbook import from CSV files or snapshots
- **downloader**: worksheet export (CSV, XLSX)
- **config**: TOML configuration with an embedded default
- **catalog**, **filter**, **edit_buffer**, **preview**, **locator**, **writer**: the pipeline
- **session**: per-user context driving the pipeline
- **app**: JSON API (feature `web`)
*/

pub mod catalog;
pub mod cell;
pub mod config;
pub mod downloader;
pub mod edit_buffer;
pub mod error;
pub mod filter;
pub mod loader;
pub mod locator;
pub mod preview;
pub mod saving;
pub mod session;
pub mod spreadsheet;
pub mod store;
pub mod writer;

#[cfg(feature = "web")]
pub mod app;

pub use error::{InventoryError, Result};
