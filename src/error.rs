//! Error types for emberkv
//!
//! Provides a unified error type for all operations.
//!
//! Not everything that can go wrong is representable here on purpose:
//! internal-consistency violations (an index entry pointing at bytes that do
//! not parse as a live record, for example) indicate a broken invariant and
//! abort via panic instead of surfacing as a recoverable error.

use thiserror::Error;

/// Result type alias using EmberError
pub type Result<T> = std::result::Result<T, EmberError>;

/// Unified error type for emberkv operations
#[derive(Debug, Error)]
pub enum EmberError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Lookup Errors
    // -------------------------------------------------------------------------
    #[error("Key not found")]
    KeyNotFound,

    // -------------------------------------------------------------------------
    // Input Validation Errors
    // -------------------------------------------------------------------------
    #[error("Key too large: {0} bytes (max {1})")]
    KeyTooLarge(usize, usize),

    #[error("Value too large: {0} bytes (max {1})")]
    ValueTooLarge(usize, usize),

    // -------------------------------------------------------------------------
    // Log Errors
    // -------------------------------------------------------------------------
    #[error("Log corruption detected: {0}")]
    Corruption(String),
}

impl EmberError {
    /// Whether this error means the requested key does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, EmberError::KeyNotFound)
    }
}
