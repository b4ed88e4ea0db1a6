// Typed errors for the sheet pipeline and the snapshot store.
// Process wiring (main, config, workers) uses anyhow on top of these.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Doubled quote inside a quoted field. Quotes only toggle quoted state; escapes are not supported.
    #[error("unsupported escaped quote at row {row}, column {column}")]
    EscapedQuote { row: usize, column: usize },
}

impl ParseError {
    /// 1-based line the error was found on.
    pub fn row(&self) -> usize {
        match self {
            ParseError::EscapedQuote { row, .. } => *row,
        }
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("sheet request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("sheet responded with HTTP {0}")]
    Status(u16),
}

/// Why a persisted record blob was not trusted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("blob is not valid JSON: {0}")]
    NotJson(String),
    #[error("expected an array of records")]
    NotAnArray,
    #[error("record {index} is not an object")]
    NotAnObject { index: usize },
    #[error("record {index} is missing `{field}`")]
    MissingField { index: usize, field: &'static str },
    #[error("record {index} field `{field}` must be a {expected}")]
    WrongType {
        index: usize,
        field: &'static str,
        expected: &'static str,
    },
    #[error("record {index} field `{field}` is out of range")]
    OutOfRange { index: usize, field: &'static str },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid snapshot id: {0:?}")]
    InvalidId(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("corrupt snapshot row: {0}")]
    Corrupt(String),
}
