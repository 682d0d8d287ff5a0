//! # Ordered Keyed Store
//!
//! The record contract the account layer is written against, plus an
//! in-memory engine implementing it.
//!
//! # Contract
//!
//! - Records form a hierarchy; every record may own ordered children
//! - Children are ordered by raw key bytes
//! - Single-record create/update/delete are atomic
//! - Index values are unique per slot among siblings, enforced on create
//! - Deleting a record deletes all of its descendants

mod errors;
mod item;
mod memory;

pub use errors::{StoreError, StoreResult};
pub use item::{Item, RangeBy, RootStore};
pub use memory::{MemoryItem, MemoryStore};
