use crate::cell::CellRef;
use crate::error::{InventoryError, Result};
use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What to do with previewed products that have no row in the destination sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MissingProductPolicy {
    /// Skip silently.
    #[default]
    Skip,
    /// Skip, log a warning and list them in the save report.
    Warn,
    /// Refuse the whole save before writing anything.
    Reject,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub sheets: SheetsConfig,
    pub layout: LayoutConfig,
    #[serde(default)]
    pub missing_products: MissingProductPolicy,
}

/// Product master tab and the headers it is read by (matched upper-cased and trimmed).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub tab: String,
    pub product: String,
    pub area: String,
    pub category: String,
    pub sub_family: String,
    pub unit: String,
    pub uom_quantity: String,
    pub price: String,
    pub cost: String,
    /// Areas never offered as a choice.
    pub excluded_areas: Vec<String>,
}

/// Destination tab per area.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetsConfig {
    pub kitchen: String,
    pub supplies: String,
    pub bar: String,
}

/// Fixed layout of the destination tabs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub header_row: u32,
    pub data_start_row: u32,
    pub comment_cell: String,
    pub product_header: String,
    pub closed_header: String,
    pub open_header: String,
    pub bottles_header: String,
    pub date_header: String,
    pub date_format: String,
}

/// Default configuration embedded in the binary
pub const DEFAULT_CONFIG: &str = r#"
missing_products = "skip"

[catalog]
tab = "BD_productos"
product = "PRODUCTO GENÉRICO"
area = "ÁREA"
category = "CATEGORIA"
sub_family = "SUB FAMILIA"
unit = "UNIDAD RECETA"
uom_quantity = "CANTIDAD DE UNIDAD DE MEDIDA"
price = "PRECIO NETO"
cost = "COSTO X UNIDAD"
excluded_areas = ["GASTO", "EXPENSE"]

[sheets]
kitchen = "INVENTARIO_COCINA"
supplies = "INVENTARIO_SUMINISTROS"
bar = "INVENTARIO_BARRA"

[layout]
header_row = 4
data_start_row = 5
comment_cell = "C3"
product_header = "PRODUCTO GENÉRICO"
closed_header = "CANTIDAD CERRADO"
open_header = "CANTIDAD ABIERTO (PESO)"
bottles_header = "CANTIDAD BOTELLAS ABIERTAS"
date_header = "FECHA"
date_format = "%d-%m-%Y"
"#;

impl Default for Config {
    fn default() -> Self {
        // The embedded default is checked by `default_config_loads`.
        toml::from_str(DEFAULT_CONFIG).expect("embedded default config is valid")
    }
}

impl Config {
    pub fn from_toml(contents: &str) -> Result<Config> {
        let config: Config =
            toml::from_str(contents).map_err(|e| InventoryError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let layout = &self.layout;
        if layout.header_row == 0 {
            return Err(InventoryError::Config("header_row must be at least 1".into()));
        }
        if layout.data_start_row <= layout.header_row {
            return Err(InventoryError::Config(format!(
                "data_start_row ({}) must be below header_row ({})",
                layout.data_start_row, layout.header_row
            )));
        }
        layout
            .comment_cell
            .parse::<CellRef>()
            .map_err(|e| InventoryError::Config(e.to_string()))?;
        if StrftimeItems::new(&layout.date_format).any(|item| matches!(item, Item::Error)) {
            return Err(InventoryError::Config(format!(
                "invalid date_format '{}'",
                layout.date_format
            )));
        }
        Ok(())
    }

    pub fn comment_cell(&self) -> Result<CellRef> {
        self.layout.comment_cell.parse()
    }
}

/// Load configuration from a TOML file
///
/// Search order:
/// 1. The explicit `path`, if given (missing file is an error)
/// 2. `inventory.toml` in the working directory
/// 3. Falls back to the embedded default config
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    if let Some(path) = path {
        log::info!("Loading config from: {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        return Config::from_toml(&contents);
    }

    let local = Path::new("inventory.toml");
    if local.exists() {
        log::info!("Loading config from: {}", local.display());
        let contents = std::fs::read_to_string(local)?;
        return Config::from_toml(&contents);
    }

    log::info!("Using default embedded configuration");
    Config::from_toml(DEFAULT_CONFIG)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_loads() {
        let config = Config::from_toml(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.catalog.tab, "BD_productos");
        assert_eq!(config.layout.header_row, 4);
        assert_eq!(config.layout.data_start_row, 5);
        assert_eq!(config.comment_cell().unwrap().address(), "C3");
        assert_eq!(config.missing_products, MissingProductPolicy::Skip);
    }

    #[test]
    fn rows_are_configurable() {
        let contents = DEFAULT_CONFIG
            .replace("header_row = 4", "header_row = 3")
            .replace("data_start_row = 5", "data_start_row = 4")
            .replace(r#"missing_products = "skip""#, r#"missing_products = "warn""#);
        let config = Config::from_toml(&contents).unwrap();
        assert_eq!(config.layout.header_row, 3);
        assert_eq!(config.layout.data_start_row, 4);
        assert_eq!(config.missing_products, MissingProductPolicy::Warn);
    }

    #[test]
    fn data_must_start_below_header() {
        let contents = DEFAULT_CONFIG.replace("data_start_row = 5", "data_start_row = 4");
        assert!(matches!(
            Config::from_toml(&contents),
            Err(InventoryError::Config(_))
        ));
    }

    #[test]
    fn bad_comment_cell_is_rejected() {
        let contents = DEFAULT_CONFIG.replace(r#"comment_cell = "C3""#, r#"comment_cell = "3C""#);
        assert!(Config::from_toml(&contents).is_err());
    }

    #[test]
    fn bad_date_format_is_rejected() {
        let contents = DEFAULT_CONFIG.replace("%d-%m-%Y", "%d-%Q");
        assert!(matches!(
            Config::from_toml(&contents),
            Err(InventoryError::Config(_))
        ));
    }

    #[test]
    fn explicit_path_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, DEFAULT_CONFIG.replace("BD_productos", "CATALOGO")).unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.catalog.tab, "CATALOGO");
    }
}
