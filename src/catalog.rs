//! Product master list, read once from the catalog tab and cached.
//!
//! Staleness policy: the cache never expires on its own. A reload only happens
//! after an explicit [`CatalogCache::invalidate`].

use crate::cell::CellValue;
use crate::config::CatalogConfig;
use crate::error::{InventoryError, Result};
use crate::store::SheetStore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// One row of the product master.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub product: String,
    pub area: String,
    pub category: String,
    pub sub_family: String,
    /// Unit-of-measure label.
    pub unit: String,
    pub uom_quantity: f64,
    pub price: f64,
    pub cost: f64,
}

impl CatalogEntry {
    /// Key used by the edit buffer and the destination row map.
    pub fn key(&self) -> String {
        self.product.trim().to_uppercase()
    }
}

/// Upper-cases and trims a header label.
pub fn normalize_header(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Numeric catalog field: separators stripped, anything unparseable or negative becomes 0.0.
fn coerce_amount(value: &CellValue, column: &str, product: &str) -> f64 {
    let n = value.as_f64();
    let text = value.as_text();
    if !value.is_blank() && text.trim().replace(',', "").parse::<f64>().is_err() {
        log::debug!(
            "coerced '{}' to 0 in column {} for product {}",
            value.as_text(),
            column,
            product
        );
    }
    n.max(0.0)
}

/// Reads the whole catalog tab. The first row is the header row. The tab title
/// is matched case-insensitively, like the destination tabs.
pub fn load_catalog<S: SheetStore + ?Sized>(
    store: &S,
    config: &CatalogConfig,
) -> Result<Vec<CatalogEntry>> {
    let wanted = config.tab.trim().to_uppercase();
    let tab = store
        .worksheet_titles()?
        .into_iter()
        .find(|t| t.to_uppercase() == wanted)
        .ok_or_else(|| {
            InventoryError::DataSource(format!("catalog tab '{}' not found", config.tab))
        })?;

    let raw = store.get_all_values(&tab)?;
    if raw.len() < 2 {
        return Err(InventoryError::DataSource(format!(
            "catalog tab '{}' has no product rows",
            tab
        )));
    }

    let headers: HashMap<String, usize> = raw[0]
        .iter()
        .enumerate()
        .map(|(i, h)| (normalize_header(&h.as_text()), i))
        .filter(|(h, _)| !h.is_empty())
        .collect();

    let column = |name: &str| -> Result<usize> {
        headers.get(&normalize_header(name)).copied().ok_or_else(|| {
            InventoryError::DataSource(format!(
                "catalog column '{}' not found in tab '{}'",
                name, tab
            ))
        })
    };

    let c_product = column(&config.product)?;
    let c_area = column(&config.area)?;
    let c_category = column(&config.category)?;
    let c_sub_family = column(&config.sub_family)?;
    let c_unit = column(&config.unit)?;
    let c_uom = column(&config.uom_quantity)?;
    let c_price = column(&config.price)?;
    let c_cost = column(&config.cost)?;

    let mut entries = Vec::with_capacity(raw.len() - 1);
    for row in &raw[1..] {
        let cell = |i: usize| row.get(i).cloned().unwrap_or_default();
        let text = |i: usize| cell(i).as_text().trim().to_string();

        let product = text(c_product);
        if product.is_empty() {
            continue;
        }
        entries.push(CatalogEntry {
            area: text(c_area),
            category: text(c_category),
            sub_family: text(c_sub_family),
            unit: text(c_unit),
            uom_quantity: coerce_amount(&cell(c_uom), &config.uom_quantity, &product),
            price: coerce_amount(&cell(c_price), &config.price, &product),
            cost: coerce_amount(&cell(c_cost), &config.cost, &product),
            product,
        });
    }

    log::info!("Loaded {} catalog entries from '{}'", entries.len(), tab);
    Ok(entries)
}

/// Process-lifetime cache of the catalog.
#[derive(Debug, Default)]
pub struct CatalogCache {
    entries: RwLock<Option<Arc<Vec<CatalogEntry>>>>,
}

impl CatalogCache {
    pub fn new() -> Self {
        CatalogCache::default()
    }

    /// Returns the cached catalog, loading it on first use.
    pub fn get_or_load<S: SheetStore + ?Sized>(
        &self,
        store: &S,
        config: &CatalogConfig,
    ) -> Result<Arc<Vec<CatalogEntry>>> {
        if let Some(entries) = self.entries.read().unwrap_or_else(|e| e.into_inner()).as_ref() {
            return Ok(Arc::clone(entries));
        }

        let mut slot = self.entries.write().unwrap_or_else(|e| e.into_inner());
        if let Some(entries) = slot.as_ref() {
            return Ok(Arc::clone(entries));
        }
        let entries = Arc::new(load_catalog(store, config)?);
        *slot = Some(Arc::clone(&entries));
        Ok(entries)
    }

    pub fn invalidate(&self) {
        log::info!("Catalog cache invalidated");
        *self.entries.write().unwrap_or_else(|e| e.into_inner()) = None;
    }

    pub fn is_loaded(&self) -> bool {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }
}
