//! # Account Errors
//!
//! Error types for the account directory.

use thiserror::Error;

use crate::store::StoreError;

/// Result type for account operations
pub type AccountResult<T> = Result<T, AccountError>;

/// Account directory errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountError {
    // ==================
    // Lookup Errors
    // ==================

    /// No account or named value under the requested ID, email or name
    #[error("Not found")]
    NotFound,

    /// Key or email collides with an existing account, or the named value
    /// was created concurrently
    #[error("Already exists")]
    AlreadyExists,

    /// Every creation attempt collided
    #[error("Attempted to create new account {attempts} times")]
    AlreadyExistsAfterRetries { attempts: u32 },

    /// The largest assigned ID is `u32::MAX`
    #[error("Account ID space exhausted")]
    IdSpaceExhausted,

    // ==================
    // Invalid State
    // ==================

    /// Stored account key is not exactly 4 bytes
    #[error("Invalid account ID in database: key is {len} bytes")]
    InvalidIdInDatabase { len: usize },

    /// Stored account record does not carry exactly one index value
    #[error("Invalid account record: {count} index values, expected 1")]
    InvalidIndexCount { count: usize },

    /// Stored email index value is not UTF-8
    #[error("Invalid account email in database: not UTF-8")]
    InvalidEmailInDatabase,

    /// A required argument is absent
    #[error("Argument is nil: {0}")]
    NilArgument(&'static str),

    // ==================
    // Credential Errors
    // ==================

    /// Password does not match, or the stored hash is malformed
    #[error("Invalid credentials")]
    CredentialMismatch,

    /// Password hashing failed
    #[error("Internal error: password hashing failed")]
    HashingFailed,

    // ==================
    // Internal Errors
    // ==================

    /// Detail blob could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid directory configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Store failure other than not-found or already-exists
    #[error("Storage error: {0}")]
    Storage(String),
}

impl AccountError {
    /// Returns the stable error code string
    pub fn code(&self) -> &'static str {
        match self {
            AccountError::NotFound => "ACCOUNTDB_NOT_FOUND",
            AccountError::AlreadyExists => "ACCOUNTDB_ALREADY_EXISTS",
            AccountError::AlreadyExistsAfterRetries { .. } => "ACCOUNTDB_CREATE_RETRIES_EXHAUSTED",
            AccountError::IdSpaceExhausted => "ACCOUNTDB_ID_SPACE_EXHAUSTED",
            AccountError::InvalidIdInDatabase { .. } => "ACCOUNTDB_INVALID_ID",
            AccountError::InvalidIndexCount { .. } => "ACCOUNTDB_INVALID_INDEX_COUNT",
            AccountError::InvalidEmailInDatabase => "ACCOUNTDB_INVALID_EMAIL",
            AccountError::NilArgument(_) => "ACCOUNTDB_NIL_ARGUMENT",
            AccountError::CredentialMismatch => "ACCOUNTDB_CREDENTIAL_MISMATCH",
            AccountError::HashingFailed => "ACCOUNTDB_HASHING_FAILED",
            AccountError::Serialization(_) => "ACCOUNTDB_SERIALIZATION",
            AccountError::Config(_) => "ACCOUNTDB_CONFIG",
            AccountError::Storage(_) => "ACCOUNTDB_STORAGE",
        }
    }

    /// Returns whether the stored data violates an account invariant
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            AccountError::InvalidIdInDatabase { .. }
                | AccountError::InvalidIndexCount { .. }
                | AccountError::InvalidEmailInDatabase
        )
    }

    /// Returns whether the error was caused by the caller's input rather
    /// than by the store or the stored data
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AccountError::NotFound
                | AccountError::AlreadyExists
                | AccountError::AlreadyExistsAfterRetries { .. }
                | AccountError::NilArgument(_)
                | AccountError::CredentialMismatch
                | AccountError::Config(_)
        )
    }
}

impl From<StoreError> for AccountError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::ItemNotFound => AccountError::NotFound,
            StoreError::AlreadyExists => AccountError::AlreadyExists,
            other => AccountError::Storage(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for AccountError {
    fn from(e: serde_json::Error) -> Self {
        AccountError::Serialization(e.to_string())
    }
}
