//! Custom error types for the common library
//!
//! This module defines the error type shared by the document store and the
//! services built on top of it.

use thiserror::Error;

/// Custom error type for document store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// A unique index rejected an insert or update
    #[error("Duplicate value for unique field(s) {fields:?} in collection '{collection}'")]
    Duplicate {
        /// Collection whose index rejected the write
        collection: String,
        /// Fields covered by the violated index
        fields: Vec<String>,
    },

    /// The document or patch was not a JSON object
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// The named collection was never registered with the store
    #[error("Unknown collection: {0}")]
    UnknownCollection(String),
}

/// Type alias for Result with StoreError
pub type StoreResult<T> = Result<T, StoreError>;
