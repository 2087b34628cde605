//! Error types for the board engine

use thiserror::Error;

/// Result type for board operations
pub type Result<T> = std::result::Result<T, BoardError>;

/// Errors raised by the board engine.
///
/// Every variant is a contract violation: ids are always sourced from the
/// current store, so none of these should occur at runtime in a correctly
/// wired client. They are returned rather than repaired.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BoardError {
    /// Card not found in the store
    #[error("card not found: {id}")]
    CardNotFound { id: String },

    /// Column not found in the store
    #[error("column not found: {id}")]
    ColumnNotFound { id: String },

    /// The same id appears twice in one sequence
    #[error("duplicate {item_type} ID: {id}")]
    DuplicateId { item_type: String, id: String },

    /// Index outside the sequence bounds
    #[error("index {index} out of bounds for sequence of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// The item at the given index is not the expected one
    #[error("expected {expected} at index {index}, found {found}")]
    ItemMismatch {
        expected: String,
        found: String,
        index: usize,
    },

    /// Invalid configuration value
    #[error("invalid value for {field}: {message}")]
    InvalidConfig { field: String, message: String },
}

impl BoardError {
    /// Create a card-not-found error
    pub fn card_not_found(id: impl ToString) -> Self {
        Self::CardNotFound { id: id.to_string() }
    }

    /// Create a column-not-found error
    pub fn column_not_found(id: impl ToString) -> Self {
        Self::ColumnNotFound { id: id.to_string() }
    }

    /// Create a duplicate ID error
    pub fn duplicate_id(item_type: impl Into<String>, id: impl ToString) -> Self {
        Self::DuplicateId {
            item_type: item_type.into(),
            id: id.to_string(),
        }
    }

    /// Create an invalid config error
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Whether this error is a precondition violation in the ordering model
    pub fn is_contract_violation(&self) -> bool {
        !matches!(self, Self::InvalidConfig { .. })
    }
}
