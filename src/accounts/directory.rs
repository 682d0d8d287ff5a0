//! # Account Directory
//!
//! All accounts live as children of a single root record.
//!
//! ## ID allocation
//!
//! New IDs are allocated optimistically: each attempt reverse-scans from
//! the greatest possible key to find the current maximum ID and tries to
//! create the record at `max + 1`. Two creators racing for the same ID, or
//! a creator reusing a registered email, are both rejected by the store's
//! create-time uniqueness checks. A rejected attempt recomputes against the
//! new maximum, up to the configured number of attempts.

use crate::config::DirectoryConfig;
use crate::store::{Item, RangeBy, RootStore};

use super::account::Account;
use super::details::AccountDetails;
use super::errors::{AccountError, AccountResult};
use super::keys::{id_to_key, key_to_id, normalize_email, MAX_ID_KEY};

/// Index slot holding an account's normalized email
pub const EMAIL_INDEX: usize = 0;

/// Directory of accounts rooted at one store record
#[derive(Debug, Clone)]
pub struct AccountDirectory<I: Item> {
    root: I,
    max_create_attempts: u32,
}

impl<I: Item> AccountDirectory<I> {
    /// Open the directory described by `config`, creating its root record
    /// on first use
    pub fn open<S>(store: &S, config: &DirectoryConfig) -> AccountResult<Self>
    where
        S: RootStore<Item = I>,
    {
        config.validate()?;
        let root = store.root_item(&config.root_name, &config.root_description)?;

        Ok(Self {
            root,
            max_create_attempts: config.max_create_attempts,
        })
    }

    /// Open the directory with the default configuration
    pub fn new<S>(store: &S) -> AccountResult<Self>
    where
        S: RootStore<Item = I>,
    {
        Self::open(store, &DirectoryConfig::default())
    }

    /// Create an account with the next free ID.
    ///
    /// The email is normalized first. A collision on key or email is
    /// retried; once every attempt has collided the result is
    /// `AlreadyExistsAfterRetries`, which is also what a duplicate email
    /// produces.
    pub fn create_account(
        &self,
        email: &str,
        password: &str,
        auth_level: u32,
    ) -> AccountResult<Account<I>> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(AccountError::NilArgument("email"));
        }

        // The hash does not depend on the ID, so it is computed once.
        let value = AccountDetails::new(auth_level, password)?.encode()?;

        for attempt in 1..=self.max_create_attempts {
            match self.try_create_account(&email, &value) {
                Ok(account) => {
                    let id = account.id()?;
                    tracing::debug!(id, attempt, "account created");
                    return Ok(account);
                }
                Err(AccountError::AlreadyExists) => {
                    tracing::debug!(attempt, "account creation collided");
                }
                Err(e) => return Err(e),
            }
        }

        tracing::warn!(
            attempts = self.max_create_attempts,
            "account creation collided on every attempt"
        );
        Err(AccountError::AlreadyExistsAfterRetries {
            attempts: self.max_create_attempts,
        })
    }

    fn try_create_account(&self, email: &str, value: &[u8]) -> AccountResult<Account<I>> {
        let mut max_key = None;
        self.root
            .range_children(Some(MAX_ID_KEY.as_slice()), RangeBy::Key, true, |item| {
                max_key = Some(item.key());
                false
            })?;

        let max_id = match max_key {
            Some(key) => key_to_id(&key)?,
            None => 0,
        };
        let id = max_id.checked_add(1).ok_or(AccountError::IdSpaceExhausted)?;

        let item = self
            .root
            .create_child(&id_to_key(id), value, &[email.as_bytes()])?;
        Ok(Account::new(item))
    }

    /// Read an account by ID
    pub fn read_account(&self, id: u32) -> AccountResult<Account<I>> {
        let item = self.root.read_child(&id_to_key(id))?;
        Ok(Account::new(item))
    }

    /// Read an account by email. The email is normalized first.
    pub fn read_account_by_email(&self, email: &str) -> AccountResult<Account<I>> {
        let email = normalize_email(email);
        let item = self.root.read_child_by_index(EMAIL_INDEX, email.as_bytes())?;
        Ok(Account::new(item))
    }

    /// Visit accounts in ID order starting at `start_id`, until `visit`
    /// returns false
    pub fn range_accounts<F>(&self, start_id: u32, reverse: bool, mut visit: F) -> AccountResult<()>
    where
        F: FnMut(Account<I>) -> bool,
    {
        self.root
            .range_children(
                Some(id_to_key(start_id).as_slice()),
                RangeBy::Key,
                reverse,
                |item| visit(Account::new(item)),
            )?;
        Ok(())
    }

    /// Visit accounts in email order, starting at `start_email` or at the
    /// open end when `None`
    pub fn range_accounts_by_email<F>(
        &self,
        start_email: Option<&str>,
        reverse: bool,
        mut visit: F,
    ) -> AccountResult<()>
    where
        F: FnMut(Account<I>) -> bool,
    {
        let start = start_email.map(normalize_email);
        self.root.range_children(
            start.as_deref().map(str::as_bytes),
            RangeBy::Index(EMAIL_INDEX),
            reverse,
            |item| visit(Account::new(item)),
        )?;
        Ok(())
    }

    /// Number of accounts in the directory
    pub fn count_accounts(&self) -> AccountResult<usize> {
        let mut count = 0;
        self.root.range_children(None, RangeBy::Key, false, |_| {
            count += 1;
            true
        })?;
        Ok(count)
    }

    /// Look up an account by email and verify its password.
    ///
    /// An unknown email and a wrong password are indistinguishable.
    pub fn authenticate(&self, email: &str, password: &str) -> AccountResult<Account<I>> {
        let account = match self.read_account_by_email(email) {
            Ok(account) => account,
            Err(AccountError::NotFound) => return Err(AccountError::CredentialMismatch),
            Err(e) => return Err(e),
        };
        account.check_password(password)?;
        Ok(account)
    }
}
