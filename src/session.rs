//! Per-user session context: the active filters, the staged quantities, the
//! inventory date and the two-step reset flow.
//!
//! A session is created when the user starts working and dropped at the end;
//! nothing in it survives a restart.

use crate::catalog::CatalogEntry;
use crate::config::Config;
use crate::edit_buffer::{EditBuffer, EditField};
use crate::error::{InventoryError, Result};
use crate::filter::{self, Area, FilterSelection};
use crate::locator::SheetCoordinates;
use crate::preview::{self, PreviewRow};
use crate::store::SheetStore;
use crate::writer::{self, SaveReport};
use chrono::{Local, NaiveDate};
use serde::Serialize;

/// `Idle -> AwaitingConfirmation -> Idle`, whether confirmed or cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "area", rename_all = "snake_case")]
pub enum ResetState {
    Idle,
    AwaitingConfirmation(Area),
}

/// One line of the editable grid: identity columns plus the staged quantities.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditRow {
    pub product: String,
    pub unit: String,
    pub uom_quantity: f64,
    pub closed: f64,
    pub open: f64,
    /// Only present in the bar.
    pub bottles: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct InventorySession {
    selection: Option<FilterSelection>,
    buffer: EditBuffer,
    reset: ResetState,
    pub date: NaiveDate,
}

impl Default for InventorySession {
    fn default() -> Self {
        InventorySession::new()
    }
}

impl InventorySession {
    /// New session dated today.
    pub fn new() -> Self {
        InventorySession::with_date(Local::now().date_naive())
    }

    pub fn with_date(date: NaiveDate) -> Self {
        InventorySession {
            selection: None,
            buffer: EditBuffer::new(),
            reset: ResetState::Idle,
            date,
        }
    }

    pub fn buffer(&self) -> &EditBuffer {
        &self.buffer
    }

    pub fn reset_state(&self) -> ResetState {
        self.reset
    }

    pub fn selection(&self) -> Option<&FilterSelection> {
        self.selection.as_ref()
    }

    /// Replaces the active filters. Staged quantities are kept.
    pub fn select(&mut self, selection: FilterSelection) -> Result<Area> {
        let area = selection.area()?;
        self.selection = Some(selection);
        Ok(area)
    }

    fn active(&self) -> Result<(&FilterSelection, Area)> {
        let selection = self
            .selection
            .as_ref()
            .ok_or_else(|| InventoryError::InvalidArea("no area selected".to_string()))?;
        Ok((selection, selection.area()?))
    }

    pub fn working_set<'a>(&self, catalog: &'a [CatalogEntry]) -> Result<Vec<&'a CatalogEntry>> {
        let (selection, _) = self.active()?;
        filter::working_set(catalog, selection)
    }

    /// Rows of the editable grid for the current working set.
    pub fn edit_rows(&mut self, catalog: &[CatalogEntry]) -> Result<Vec<EditRow>> {
        let area = self.active()?.1;
        let set = self.working_set(catalog)?;
        Ok(set
            .into_iter()
            .map(|entry| {
                let record = self.buffer.get_or_create(area, &entry.product);
                EditRow {
                    product: entry.product.clone(),
                    unit: entry.unit.clone(),
                    uom_quantity: entry.uom_quantity,
                    closed: record.closed,
                    open: record.open,
                    bottles: area.is_bar().then_some(record.bottles),
                }
            })
            .collect())
    }

    /// Stages one edited value for a product of the selected area.
    pub fn edit(&mut self, product: &str, field: EditField, raw: Option<&str>) -> Result<()> {
        let area = self.active()?.1;
        self.buffer.update(area, product, field, raw);
        Ok(())
    }

    /// Valuation preview of the current working set.
    pub fn preview(&mut self, catalog: &[CatalogEntry]) -> Result<Vec<PreviewRow>> {
        let area = self.active()?.1;
        let set = self.working_set(catalog)?;
        Ok(preview::compute_preview(area, &set, &mut self.buffer))
    }

    /// Commits the rows of [`InventorySession::preview`]. Staged values of
    /// products outside the current filters stay in the buffer unsaved.
    pub fn save<S: SheetStore + ?Sized>(
        &mut self,
        store: &mut S,
        catalog: &[CatalogEntry],
        config: &Config,
    ) -> Result<SaveReport> {
        let rows = self.preview(catalog)?;
        let area = self.active()?.1;
        let coords = SheetCoordinates::locate(&*store, &area.to_string(), config)?;
        let date = writer::format_date(self.date, &config.layout.date_format)?;
        writer::save(store, &rows, &coords, &date, config.missing_products)
    }

    pub fn save_comment<S: SheetStore + ?Sized>(
        &self,
        store: &mut S,
        config: &Config,
        text: &str,
    ) -> Result<()> {
        let area = self.active()?.1;
        let coords = SheetCoordinates::locate(&*store, &area.to_string(), config)?;
        writer::save_comment(store, &coords, text)
    }

    /// First step of the reset flow. Nothing is written yet.
    pub fn request_reset(&mut self) -> Result<Area> {
        let area = self.active()?.1;
        self.reset = ResetState::AwaitingConfirmation(area);
        Ok(area)
    }

    pub fn cancel_reset(&mut self) -> Result<()> {
        match self.reset {
            ResetState::AwaitingConfirmation(_) => {
                self.reset = ResetState::Idle;
                Ok(())
            }
            ResetState::Idle => Err(InventoryError::ResetNotRequested),
        }
    }

    /// Second step: wipes the requested area and its staged quantities.
    ///
    /// The flow returns to idle whether or not the write succeeds.
    pub fn confirm_reset<S: SheetStore + ?Sized>(
        &mut self,
        store: &mut S,
        config: &Config,
    ) -> Result<usize> {
        let ResetState::AwaitingConfirmation(area) = self.reset else {
            return Err(InventoryError::ResetNotRequested);
        };
        self.reset = ResetState::Idle;

        let coords = SheetCoordinates::locate(&*store, &area.to_string(), config)?;
        let written = writer::reset(store, &coords)?;
        self.buffer.clear_area(area);
        Ok(written)
    }
}
