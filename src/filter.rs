//! The area -> category -> sub-family -> product filter chain.
//!
//! Every step is a pure function over the catalog. Steps after the area accept
//! the `ALL` pseudo-value, which returns the input unchanged.

use crate::catalog::CatalogEntry;
use crate::config::SheetsConfig;
use crate::error::{InventoryError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Label offered at the top of the category, sub-family and product lists.
pub const ALL_LABEL: &str = "ALL";

/// An inventory zone with its own destination worksheet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Area {
    Kitchen,
    Supplies,
    Bar,
}

impl Area {
    /// Accepts the Spanish labels used in the catalog as well as English names.
    pub fn parse(raw: &str) -> Result<Area> {
        match raw.trim().to_uppercase().as_str() {
            "COCINA" | "KITCHEN" => Ok(Area::Kitchen),
            "SUMINISTROS" | "CONSUMIBLE" | "CONSUMIBLES" | "SUPPLIES" | "CONSUMABLE"
            | "CONSUMABLES" => Ok(Area::Supplies),
            "BARRA" | "BAR" => Ok(Area::Bar),
            _ => Err(InventoryError::InvalidArea(raw.to_string())),
        }
    }

    pub fn is_bar(self) -> bool {
        self == Area::Bar
    }

    pub fn sheet_title(self, sheets: &SheetsConfig) -> &str {
        match self {
            Area::Kitchen => &sheets.kitchen,
            Area::Supplies => &sheets.supplies,
            Area::Bar => &sheets.bar,
        }
    }
}

impl FromStr for Area {
    type Err = InventoryError;

    fn from_str(s: &str) -> Result<Self> {
        Area::parse(s)
    }
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Area::Kitchen => "kitchen",
            Area::Supplies => "supplies",
            Area::Bar => "bar",
        };
        f.write_str(name)
    }
}

/// A dropdown value: either a concrete label or the `ALL` pseudo-value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Choice {
    #[default]
    All,
    Value(String),
}

impl Choice {
    /// `ALL`, `TODOS` and the empty string select everything.
    pub fn parse(raw: &str) -> Choice {
        let trimmed = raw.trim();
        if trimmed.is_empty()
            || trimmed.eq_ignore_ascii_case(ALL_LABEL)
            || trimmed.eq_ignore_ascii_case("TODOS")
        {
            Choice::All
        } else {
            Choice::Value(trimmed.to_string())
        }
    }

    fn matches(&self, field: &str) -> bool {
        match self {
            Choice::All => true,
            Choice::Value(v) => same_label(v, field),
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Choice::All => f.write_str(ALL_LABEL),
            Choice::Value(v) => f.write_str(v),
        }
    }
}

fn same_label(a: &str, b: &str) -> bool {
    a.trim().to_uppercase() == b.trim().to_uppercase()
}

/// Current state of the four dropdowns.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSelection {
    pub area: String,
    pub category: Choice,
    pub sub_family: Choice,
    pub product: Choice,
}

impl FilterSelection {
    pub fn new(area: &str) -> Self {
        FilterSelection {
            area: area.trim().to_string(),
            category: Choice::All,
            sub_family: Choice::All,
            product: Choice::All,
        }
    }

    pub fn area(&self) -> Result<Area> {
        Area::parse(&self.area)
    }
}

fn unique_sorted<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Areas present in the catalog, minus the excluded sentinels (`GASTO`, `EXPENSE`).
pub fn areas(catalog: &[CatalogEntry], excluded: &[String]) -> Vec<String> {
    unique_sorted(catalog.iter().map(|e| e.area.as_str()))
        .into_iter()
        .filter(|a| !excluded.iter().any(|x| same_label(x, a)))
        .collect()
}

pub fn categories(set: &[&CatalogEntry]) -> Vec<String> {
    unique_sorted(set.iter().map(|e| e.category.as_str()))
}

pub fn sub_families(set: &[&CatalogEntry]) -> Vec<String> {
    unique_sorted(set.iter().map(|e| e.sub_family.as_str()))
}

pub fn products(set: &[&CatalogEntry]) -> Vec<String> {
    unique_sorted(set.iter().map(|e| e.product.as_str()))
}

/// Prepends the `ALL` pseudo-value to an option list.
pub fn with_all(options: Vec<String>) -> Vec<String> {
    std::iter::once(ALL_LABEL.to_string())
        .chain(options)
        .collect()
}

/// Entries of one area. Any accepted spelling of the area selects the same entries.
pub fn by_area<'a>(catalog: &'a [CatalogEntry], area: &str) -> Result<Vec<&'a CatalogEntry>> {
    let area = Area::parse(area)?;
    Ok(catalog
        .iter()
        .filter(|e| Area::parse(&e.area).is_ok_and(|a| a == area))
        .collect())
}

pub fn by_category<'a>(set: Vec<&'a CatalogEntry>, choice: &Choice) -> Vec<&'a CatalogEntry> {
    narrow(set, choice, |e| e.category.as_str())
}

pub fn by_sub_family<'a>(set: Vec<&'a CatalogEntry>, choice: &Choice) -> Vec<&'a CatalogEntry> {
    narrow(set, choice, |e| e.sub_family.as_str())
}

pub fn by_product<'a>(set: Vec<&'a CatalogEntry>, choice: &Choice) -> Vec<&'a CatalogEntry> {
    narrow(set, choice, |e| e.product.as_str())
}

fn narrow<'a>(
    set: Vec<&'a CatalogEntry>,
    choice: &Choice,
    field: impl Fn(&CatalogEntry) -> &str,
) -> Vec<&'a CatalogEntry> {
    if *choice == Choice::All {
        return set;
    }
    set.into_iter().filter(|e| choice.matches(field(*e))).collect()
}

/// Runs the whole chain. An empty result halts the pipeline.
pub fn working_set<'a>(
    catalog: &'a [CatalogEntry],
    selection: &FilterSelection,
) -> Result<Vec<&'a CatalogEntry>> {
    let set = by_area(catalog, &selection.area)?;
    let set = by_category(set, &selection.category);
    let set = by_sub_family(set, &selection.sub_family);
    let set = by_product(set, &selection.product);
    if set.is_empty() {
        return Err(InventoryError::NoProductsMatch);
    }
    Ok(set)
}
