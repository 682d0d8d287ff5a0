//! Store contract
//!
//! The account layer only talks to the store through these two traits.
//! Any ordered, hierarchical key-value engine that can enforce
//! per-sibling index uniqueness on create can back an account directory.

use super::errors::StoreResult;

/// Ordering used by `Item::range_children`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeBy {
    /// Primary key order, no index
    Key,
    /// Order of the given index slot; the start bound is an index value
    Index(usize),
}

/// Handle to a single record in an ordered keyed store.
///
/// A handle carries a snapshot of the record's value and index values taken
/// when it was produced. `update_value` refreshes the snapshot.
pub trait Item: Clone + Send + Sync + Sized {
    /// Copy of this record's key
    fn key(&self) -> Vec<u8>;

    /// This record's value
    fn value(&self) -> &[u8];

    /// Overwrite this record's value
    fn update_value(&mut self, value: &[u8]) -> StoreResult<()>;

    /// Remove this record and all of its descendants
    fn delete(&self) -> StoreResult<()>;

    /// Number of secondary index values carried by this record
    fn index_count(&self) -> usize;

    /// Index value in slot `n`
    fn index(&self, n: usize) -> Option<&[u8]>;

    /// Create a child record.
    ///
    /// Fails with `AlreadyExists` when `key` already exists under this
    /// record, or when any index value collides with the same slot of an
    /// existing sibling.
    fn create_child(&self, key: &[u8], value: &[u8], indexes: &[&[u8]]) -> StoreResult<Self>;

    /// Create a child record with no secondary index
    fn quick_child(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        self.create_child(key, value, &[]).map(|_| ())
    }

    /// Read a child by key
    fn read_child(&self, key: &[u8]) -> StoreResult<Self>;

    /// Read a child by the value it carries in index slot `n`
    fn read_child_by_index(&self, n: usize, value: &[u8]) -> StoreResult<Self>;

    /// Visit children in order starting at `start` (inclusive).
    ///
    /// `None` starts from the open end in the requested direction. In
    /// reverse the first child visited is the greatest one `<= start`.
    /// Iteration stops when `visit` returns false. The visitor may call
    /// back into the store.
    fn range_children<F>(
        &self,
        start: Option<&[u8]>,
        by: RangeBy,
        reverse: bool,
        visit: F,
    ) -> StoreResult<()>
    where
        F: FnMut(Self) -> bool;
}

/// Access to the named top-level records of a store
pub trait RootStore {
    /// Handle type produced by this store
    type Item: Item;

    /// Open the root record called `name`, creating it on first use
    fn root_item(&self, name: &str, description: &str) -> StoreResult<Self::Item>;
}
