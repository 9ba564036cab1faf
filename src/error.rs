use thiserror::Error;

/// Errors raised by the inventory pipeline.
///
/// Everything here is fatal for the operation that produced it. Unparseable
/// numbers are not errors: they are coerced to `0.0` (see [`crate::cell::safe_float`]).
#[derive(Debug, Error)]
pub enum InventoryError {
    /// The document, a required tab, or a required column is missing, or a read failed.
    #[error("data source error: {0}")]
    DataSource(String),

    #[error("invalid area: {0}")]
    InvalidArea(String),

    #[error("no products match the current filters")]
    NoProductsMatch,

    /// Only raised when the missing-product policy is `reject`.
    #[error("products not found in destination sheet: {}", .0.join(", "))]
    MissingProducts(Vec<String>),

    #[error("invalid cell address: {0}")]
    InvalidAddress(String),

    /// Malformed user input other than quantities (field names, dates).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("no reset is awaiting confirmation")]
    ResetNotRequested,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("snapshot error: {0}")]
    Snapshot(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, InventoryError>;
