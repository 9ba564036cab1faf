use crate::cell::safe_float;
use crate::filter::Area;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Staged quantities for one product in one area.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct EditRecord {
    pub closed: f64,
    /// Open or weighed quantity.
    pub open: f64,
    /// Open-bottle count, only meaningful in the bar.
    pub bottles: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditField {
    Closed,
    Open,
    Bottles,
}

impl EditField {
    pub fn parse(raw: &str) -> Option<EditField> {
        match raw.trim().to_lowercase().as_str() {
            "closed" | "cerrado" => Some(EditField::Closed),
            "open" | "abierto" | "peso" => Some(EditField::Open),
            "bottles" | "botellas" => Some(EditField::Bottles),
            _ => None,
        }
    }
}

/// Quantities typed by the user, keyed by (area, upper-cased product name).
///
/// Lives as long as the user session. Records are only removed by
/// [`EditBuffer::clear_area`], so changing filters never loses typed values.
#[derive(Clone, Debug, Default)]
pub struct EditBuffer {
    records: HashMap<(Area, String), EditRecord>,
}

fn product_key(product: &str) -> String {
    product.trim().to_uppercase()
}

impl EditBuffer {
    pub fn new() -> Self {
        EditBuffer::default()
    }

    /// Returns the record, creating a zeroed one on first access.
    pub fn get_or_create(&mut self, area: Area, product: &str) -> EditRecord {
        *self
            .records
            .entry((area, product_key(product)))
            .or_default()
    }

    pub fn get(&self, area: Area, product: &str) -> Option<EditRecord> {
        self.records.get(&(area, product_key(product))).copied()
    }

    /// Stores a quantity. Negative and non-finite values become 0.0.
    pub fn set(&mut self, area: Area, product: &str, field: EditField, value: f64) {
        let value = if value.is_finite() { value.max(0.0) } else { 0.0 };
        let record = self
            .records
            .entry((area, product_key(product)))
            .or_default();
        match field {
            EditField::Closed => record.closed = value,
            EditField::Open => record.open = value,
            EditField::Bottles => record.bottles = value,
        }
    }

    /// Stores raw user input after [`safe_float`] coercion. Never fails.
    pub fn update(&mut self, area: Area, product: &str, field: EditField, raw: Option<&str>) {
        self.set(area, product, field, safe_float(raw));
    }

    /// Drops every record of `area`. Returns how many were removed.
    pub fn clear_area(&mut self, area: Area) -> usize {
        let before = self.records.len();
        self.records.retain(|(a, _), _| *a != area);
        before - self.records.len()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_or_create_is_idempotent() {
        let mut buffer = EditBuffer::new();
        let first = buffer.get_or_create(Area::Bar, "Ron Blanco");
        let second = buffer.get_or_create(Area::Bar, "RON BLANCO ");
        assert_eq!(first, EditRecord::default());
        assert_eq!(first, second);
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn update_coerces_bad_input_to_zero() {
        let mut buffer = EditBuffer::new();
        buffer.update(Area::Kitchen, "Sal", EditField::Closed, Some("3"));
        buffer.update(Area::Kitchen, "Sal", EditField::Open, Some("1,5"));
        assert_eq!(buffer.get(Area::Kitchen, "sal").unwrap().closed, 3.0);
        assert_eq!(buffer.get(Area::Kitchen, "sal").unwrap().open, 15.0);

        for raw in [None, Some(""), Some("None"), Some("abc"), Some("-2")] {
            buffer.update(Area::Kitchen, "Sal", EditField::Closed, raw);
            assert_eq!(buffer.get(Area::Kitchen, "Sal").unwrap().closed, 0.0);
        }
    }

    #[test]
    fn last_write_wins() {
        let mut buffer = EditBuffer::new();
        buffer.set(Area::Bar, "Vodka", EditField::Bottles, 2.0);
        buffer.set(Area::Bar, "vodka", EditField::Bottles, 4.0);
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.get(Area::Bar, "VODKA").unwrap().bottles, 4.0);
    }

    #[test]
    fn areas_are_independent_and_cleared_separately() {
        let mut buffer = EditBuffer::new();
        buffer.set(Area::Bar, "Limón", EditField::Closed, 1.0);
        buffer.set(Area::Kitchen, "Limón", EditField::Closed, 7.0);
        buffer.set(Area::Kitchen, "Sal", EditField::Open, 2.0);

        assert_eq!(buffer.clear_area(Area::Kitchen), 2);
        assert_eq!(buffer.get(Area::Kitchen, "Limón"), None);
        assert_eq!(buffer.get(Area::Bar, "LIMÓN").unwrap().closed, 1.0);
    }

    #[test]
    fn field_names_parse() {
        assert_eq!(EditField::parse("CERRADO"), Some(EditField::Closed));
        assert_eq!(EditField::parse("open"), Some(EditField::Open));
        assert_eq!(EditField::parse("botellas"), Some(EditField::Bottles));
        assert_eq!(EditField::parse("value"), None);
    }
}
