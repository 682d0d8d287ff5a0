//! accountdb - An account directory over an ordered, hierarchical key-value store
//!
//! Accounts are records keyed by a monotonically allocated 32-bit ID, found
//! by ID or by unique email, each owning a detail blob and any number of
//! named values.

pub mod accounts;
pub mod config;
pub mod store;

pub use accounts::{Account, AccountDetails, AccountDirectory, AccountError, AccountResult};
pub use config::DirectoryConfig;
pub use store::{Item, MemoryItem, MemoryStore, RangeBy, RootStore, StoreError, StoreResult};
