use crate::catalog::CatalogEntry;
use crate::edit_buffer::EditBuffer;
use crate::filter::Area;
use serde::{Deserialize, Serialize};

/// One line of the valuation preview. Derived on every render, never stored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PreviewRow {
    pub product: String,
    pub unit: String,
    pub uom_quantity: f64,
    pub closed: f64,
    pub open: f64,
    /// `None` outside the bar.
    pub bottles: Option<f64>,
    pub price: f64,
    pub cost: f64,
    pub value: f64,
}

/// Rounds half-up to two decimals.
pub fn round2(value: f64) -> f64 {
    // Snap binary noise first so 2.345 * 100 = 234.49999... still rounds up.
    let scaled = (value * 100.0 * 1e6).round() / 1e6;
    (scaled + 0.5).floor() / 100.0
}

/// `price * closed + cost * open`, rounded to cents.
pub fn valuation(price: f64, cost: f64, closed: f64, open: f64) -> f64 {
    round2(price * closed + cost * open)
}

/// Joins the working set with the staged quantities.
///
/// Missing records are created zeroed. Only rows with a non-zero closed or
/// open quantity (or open bottles, in the bar) are returned.
pub fn compute_preview(
    area: Area,
    working_set: &[&CatalogEntry],
    buffer: &mut EditBuffer,
) -> Vec<PreviewRow> {
    working_set
        .iter()
        .filter_map(|entry| {
            let record = buffer.get_or_create(area, &entry.product);
            let bottles = area.is_bar().then_some(record.bottles);
            let visible = record.closed != 0.0
                || record.open != 0.0
                || bottles.is_some_and(|b| b != 0.0);
            visible.then(|| PreviewRow {
                product: entry.product.clone(),
                unit: entry.unit.clone(),
                uom_quantity: entry.uom_quantity,
                closed: record.closed,
                open: record.open,
                bottles,
                price: entry.price,
                cost: entry.cost,
                value: valuation(entry.price, entry.cost, record.closed, record.open),
            })
        })
        .collect()
}

/// Sum of the preview values, rounded to cents.
pub fn preview_total(rows: &[PreviewRow]) -> f64 {
    round2(rows.iter().map(|r| r.value).sum())
}
