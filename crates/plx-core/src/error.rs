//! Error types for plx-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Decimal parse error: {0}")]
    DecimalParse(#[from] rust_decimal::Error),

    #[error("Invalid decimal: {0}")]
    InvalidDecimal(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
