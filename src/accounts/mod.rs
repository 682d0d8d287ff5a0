//! # Accounts
//!
//! Account identity and indexing over an ordered keyed store.
//!
//! ## Invariants
//! - An account key is always exactly 4 bytes (big-endian ID)
//! - An account record always carries exactly one index value, its email
//! - Emails are normalized (trimmed, lower-cased) before storage or lookup
//! - Named values are unique by name within an account

mod account;
mod crypto;
mod details;
mod directory;
mod errors;
mod keys;

pub use account::Account;
pub use crypto::{hash_password, verify_password};
pub use details::AccountDetails;
pub use directory::{AccountDirectory, EMAIL_INDEX};
pub use errors::{AccountError, AccountResult};
pub use keys::{id_to_key, key_to_id, normalize_email, ID_KEY_LEN, MAX_ID_KEY};
