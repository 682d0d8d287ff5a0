//! Account key and email encoding
//!
//! Account records are keyed by the big-endian encoding of their ID, so
//! byte order of keys equals numeric order of IDs.

use super::errors::{AccountError, AccountResult};

/// Length of an account record key
pub const ID_KEY_LEN: usize = 4;

/// Greatest possible account key, the start of a reverse scan for the
/// current maximum ID
pub const MAX_ID_KEY: [u8; ID_KEY_LEN] = [0xff; ID_KEY_LEN];

/// Encode an account ID as its record key
pub fn id_to_key(id: u32) -> [u8; ID_KEY_LEN] {
    id.to_be_bytes()
}

/// Decode an account record key.
///
/// Any length other than 4 means the record was not written by this layer.
pub fn key_to_id(key: &[u8]) -> AccountResult<u32> {
    let bytes: [u8; ID_KEY_LEN] = key
        .try_into()
        .map_err(|_| AccountError::InvalidIdInDatabase { len: key.len() })?;
    Ok(u32::from_be_bytes(bytes))
}

/// Trim and lower-case an email before storage or comparison
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
