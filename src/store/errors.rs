//! # Store Errors
//!
//! Error types for the ordered keyed store contract.

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors reported by an ordered keyed store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No item under the requested key or index value, or the handle's
    /// item has since been deleted
    #[error("Item not found")]
    ItemNotFound,

    /// Key or index value collides with an existing sibling
    #[error("Item already exists")]
    AlreadyExists,

    /// The store's lock was poisoned by a panicking writer
    #[error("Storage error: lock poisoned")]
    LockPoisoned,
}

impl StoreError {
    /// Returns the stable error code string
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::ItemNotFound => "ACCOUNTDB_STORE_ITEM_NOT_FOUND",
            StoreError::AlreadyExists => "ACCOUNTDB_STORE_ALREADY_EXISTS",
            StoreError::LockPoisoned => "ACCOUNTDB_STORE_LOCK_POISONED",
        }
    }
}
