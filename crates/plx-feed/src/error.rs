//! Feed error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Missing field: {0}")]
    MissingField(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Malformed message: {0}")]
    Structure(String),

    #[error("Invalid trade date {date:?}: {source}")]
    TimestampParse {
        date: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("Decimal error: {0}")]
    Decimal(#[from] plx_core::CoreError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type FeedResult<T> = Result<T, FeedError>;
