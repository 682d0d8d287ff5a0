//! # Account Record
//!
//! An account is a child record of the directory root:
//!
//! - key: 4-byte big-endian account ID
//! - value: serialized `AccountDetails`
//! - index 0: normalized email
//!
//! Named values are children of the account record, keyed by the UTF-8
//! bytes of their name, with no index.

use crate::store::{Item, RangeBy, StoreError};

use super::details::AccountDetails;
use super::errors::{AccountError, AccountResult};
use super::keys::key_to_id;

/// Handle to one account in a directory
#[derive(Debug, Clone)]
pub struct Account<I: Item> {
    item: I,
}

impl<I: Item> Account<I> {
    pub(crate) fn new(item: I) -> Self {
        Self { item }
    }

    /// The account's ID, decoded from its record key
    pub fn id(&self) -> AccountResult<u32> {
        key_to_id(&self.item.key())
    }

    /// The account's normalized email
    pub fn email(&self) -> AccountResult<String> {
        let count = self.item.index_count();
        let email = match self.item.index(0) {
            Some(email) if count == 1 => email,
            _ => return Err(AccountError::InvalidIndexCount { count }),
        };
        String::from_utf8(email.to_vec()).map_err(|_| AccountError::InvalidEmailInDatabase)
    }

    /// The account's details as held by this handle
    pub fn details(&self) -> AccountResult<AccountDetails> {
        AccountDetails::decode(self.item.value())
    }

    /// Persist `details` as the account's value. ID and email are untouched.
    pub fn update(&mut self, details: &AccountDetails) -> AccountResult<()> {
        let value = details.encode()?;
        self.item.update_value(&value)?;
        Ok(())
    }

    /// Persist a `last_access` bump and return the new details
    pub fn touch(&mut self) -> AccountResult<AccountDetails> {
        let details = self.details()?.touched();
        self.update(&details)?;
        Ok(details)
    }

    /// Remove the account and all of its named values
    pub fn delete(&self) -> AccountResult<()> {
        self.item.delete()?;
        Ok(())
    }

    /// Verify a password against the hash held by this handle.
    ///
    /// A handle loaded before another writer changed the password still
    /// checks the old hash; read the account again for the current one.
    pub fn check_password(&self, password: &str) -> AccountResult<()> {
        self.details()?.check_password(password)
    }

    /// Create or overwrite a named value.
    ///
    /// Not atomic: two writers racing to create the same name can make one
    /// of them fail with `AlreadyExists`.
    pub fn write_named_value(&self, name: &str, value: &[u8]) -> AccountResult<()> {
        match self.item.read_child(name.as_bytes()) {
            Ok(mut child) => child.update_value(value)?,
            Err(StoreError::ItemNotFound) => self.item.quick_child(name.as_bytes(), value)?,
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    /// Read a named value
    pub fn read_named_value(&self, name: &str) -> AccountResult<Vec<u8>> {
        let child = self.item.read_child(name.as_bytes())?;
        Ok(child.value().to_vec())
    }

    /// Visit named values in name order until `visit` returns false
    pub fn range_named_values<F>(&self, mut visit: F) -> AccountResult<()>
    where
        F: FnMut(&str, &[u8]) -> bool,
    {
        self.item.range_children(None, RangeBy::Key, false, |child| {
            let key = child.key();
            let name = String::from_utf8_lossy(&key);
            visit(&name, child.value())
        })?;
        Ok(())
    }

    /// Delete a named value
    pub fn delete_named_value(&self, name: &str) -> AccountResult<()> {
        let child = self.item.read_child(name.as_bytes())?;
        child.delete()?;
        Ok(())
    }
}
