//! # Account Details
//!
//! The detail blob stored as an account record's value.
//!
//! Password changes are staged: `with_password` and `update_password`
//! only change the in-memory value. Nothing reaches the store until the
//! caller passes the details to `Account::update`, so several edits can be
//! persisted in one write.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::crypto::{hash_password, verify_password};
use super::errors::AccountResult;

/// Mutable profile fields of an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountDetails {
    /// Application-defined authorization level
    pub auth_level: u32,

    /// Argon2id password hash (never plaintext)
    pub password_hash: String,

    /// When the account was created
    pub created: DateTime<Utc>,

    /// When the account was last accessed, maintained by the caller
    pub last_access: DateTime<Utc>,
}

impl AccountDetails {
    /// Details for a new account: hashed password, both timestamps now
    pub fn new(auth_level: u32, password: &str) -> AccountResult<Self> {
        let password_hash = hash_password(password)?;
        let now = Utc::now();

        Ok(Self {
            auth_level,
            password_hash,
            created: now,
            last_access: now,
        })
    }

    /// Verify a password against the hash held by these details
    pub fn check_password(&self, password: &str) -> AccountResult<()> {
        verify_password(password, &self.password_hash)
    }

    /// A copy of these details with a freshly hashed password
    pub fn with_password(&self, password: &str) -> AccountResult<Self> {
        Ok(Self {
            password_hash: hash_password(password)?,
            ..self.clone()
        })
    }

    /// Replace the password hash in place. Does not persist.
    pub fn update_password(&mut self, password: &str) -> AccountResult<()> {
        self.password_hash = hash_password(password)?;
        Ok(())
    }

    /// A copy of these details with `last_access` set to now
    pub fn touched(&self) -> Self {
        Self {
            last_access: Utc::now(),
            ..self.clone()
        }
    }

    pub(crate) fn encode(&self) -> AccountResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub(crate) fn decode(value: &[u8]) -> AccountResult<Self> {
        Ok(serde_json::from_slice(value)?)
    }
}
