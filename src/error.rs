//! Error types for store operations.

use thiserror::Error;

/// Errors returned by [`Store`](crate::Store) and [`Writer`](crate::Writer) writes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The partial value could not be merged field-wise into the aggregate.
    #[error("Invalid partial state: {0}")]
    InvalidPartial(String),

    /// The write target does not hold a state value: either the factory is
    /// still building the initial state or the store has been dropped.
    #[error("Store not initialized")]
    Uninitialized,
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
