use crate::core::WaitCondition;
use thiserror::Error;

/// Failures reported by a [`PageDriver`](crate::core::PageDriver) implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DriverError {
    #[error("Element not found: {0}")]
    NotFound(String),

    #[error("Stale element reference: {0}")]
    StaleElement(String),

    #[error("Timed out after {waited_ms}ms waiting for '{selector}' to {condition}")]
    Timeout {
        selector: String,
        condition: WaitCondition,
        waited_ms: u64,
    },

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Browser session error: {0}")]
    Session(String),
}

impl DriverError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, DriverError::Timeout { .. })
    }

    pub fn session<E: std::fmt::Display>(err: E) -> Self {
        DriverError::Session(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum TableError {
    #[error("Row '{0}' not found in table")]
    RowNotFound(String),

    #[error("Header '{0}' not found in table")]
    HeaderNotFound(String),

    #[error("No cell for column '{column}' (selector '{selector}'); check the header mapping")]
    CellNotFound { column: String, selector: String },

    #[error("Row key '{0}' is rendered more than once")]
    DuplicateRowKey(String),

    #[error("Column '{column}' did not reach {expected} order (observed {observed})")]
    SortNotReached {
        column: String,
        expected: String,
        observed: String,
    },

    #[error("Invalid table layout: {0}")]
    InvalidLayout(String),

    #[error("Browser session could not be started after {attempts} attempts: {last_error}")]
    SessionBootstrapFailure { attempts: u32, last_error: String },

    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Anyhow error: {0}")]
    AnyhowError(String),
}

pub type Result<T> = std::result::Result<T, TableError>;

pub type DriverResult<T> = std::result::Result<T, DriverError>;

// headless_chrome reports everything through anyhow
impl From<anyhow::Error> for TableError {
    fn from(err: anyhow::Error) -> Self {
        TableError::AnyhowError(err.to_string())
    }
}
