//! In-memory ordered keyed store
//!
//! Records form a tree under named roots. Each record keeps its children
//! in a `BTreeMap` keyed by raw bytes, so iteration order is byte order
//! and deterministic. Each index slot of a parent keeps its own
//! `BTreeMap<index value, child key>`, which is what enforces per-sibling
//! index uniqueness and backs index lookups and index-ordered ranges.
//!
//! Every record gets a store-wide unique generation when it is created.
//! Handles address records by key path plus generation, so a handle to a
//! deleted record never resolves to a later record created under the same
//! key.
//!
//! Nothing here is persisted.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::errors::{StoreError, StoreResult};
use super::item::{Item, RangeBy, RootStore};

/// Children handed to a range visitor per lock acquisition
const RANGE_BATCH: usize = 64;

/// One step of a handle's path: child key and the generation it was
/// created with
type Step = (Vec<u8>, u64);

#[derive(Debug, Default)]
struct Node {
    generation: u64,
    value: Vec<u8>,
    indexes: Vec<Vec<u8>>,
    children: BTreeMap<Vec<u8>, Node>,
    /// Per index slot: index value -> child key
    index_maps: Vec<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl Node {
    fn descend(&self, path: &[Step]) -> Option<&Node> {
        path.iter().try_fold(self, |node, (key, generation)| {
            node.children
                .get(key)
                .filter(|child| child.generation == *generation)
        })
    }

    fn descend_mut(&mut self, path: &[Step]) -> Option<&mut Node> {
        path.iter().try_fold(self, |node, (key, generation)| {
            node.children
                .get_mut(key)
                .filter(|child| child.generation == *generation)
        })
    }

    fn index_taken(&self, slot: usize, value: &[u8]) -> bool {
        self.index_maps
            .get(slot)
            .is_some_and(|map| map.contains_key(value))
    }
}

#[derive(Debug, Default)]
struct Tree {
    roots: BTreeMap<String, Node>,
    last_generation: u64,
}

impl Tree {
    fn next_generation(&mut self) -> u64 {
        self.last_generation += 1;
        self.last_generation
    }

    fn resolve(&self, root: &str, root_generation: u64, path: &[Step]) -> Option<&Node> {
        self.roots
            .get(root)
            .filter(|node| node.generation == root_generation)
            .and_then(|node| node.descend(path))
    }

    fn resolve_mut(&mut self, root: &str, root_generation: u64, path: &[Step]) -> Option<&mut Node> {
        self.roots
            .get_mut(root)
            .filter(|node| node.generation == root_generation)
            .and_then(|node| node.descend_mut(path))
    }
}

/// Thread-safe in-memory store. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tree: Arc<RwLock<Tree>>,
}

impl MemoryStore {
    /// Creates a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of all root records, in order
    pub fn root_names(&self) -> StoreResult<Vec<String>> {
        let tree = self.tree.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(tree.roots.keys().cloned().collect())
    }
}

impl RootStore for MemoryStore {
    type Item = MemoryItem;

    fn root_item(&self, name: &str, description: &str) -> StoreResult<MemoryItem> {
        let mut guard = self.tree.write().map_err(|_| StoreError::LockPoisoned)?;
        let tree = &mut *guard;

        if !tree.roots.contains_key(name) {
            tracing::debug!(root = name, "creating root item");
            let generation = tree.next_generation();
            tree.roots.insert(
                name.to_string(),
                Node {
                    generation,
                    value: description.as_bytes().to_vec(),
                    ..Node::default()
                },
            );
        }
        let root = tree.roots.get(name).ok_or(StoreError::ItemNotFound)?;

        Ok(MemoryItem {
            tree: Arc::clone(&self.tree),
            root: name.to_string(),
            root_generation: root.generation,
            path: Vec::new(),
            value: root.value.clone(),
            indexes: Vec::new(),
        })
    }
}

/// Handle to a record in a `MemoryStore`
#[derive(Debug, Clone)]
pub struct MemoryItem {
    tree: Arc<RwLock<Tree>>,
    root: String,
    root_generation: u64,
    /// Steps from the root down to this record; empty for the root itself
    path: Vec<Step>,
    value: Vec<u8>,
    indexes: Vec<Vec<u8>>,
}

impl MemoryItem {
    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tree>> {
        self.tree.read().map_err(|_| StoreError::LockPoisoned)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tree>> {
        self.tree.write().map_err(|_| StoreError::LockPoisoned)
    }

    /// This handle's record, if it still exists
    fn locate<'t>(&self, tree: &'t Tree) -> StoreResult<&'t Node> {
        tree.resolve(&self.root, self.root_generation, &self.path)
            .ok_or(StoreError::ItemNotFound)
    }

    fn locate_mut<'t>(&self, tree: &'t mut Tree) -> StoreResult<&'t mut Node> {
        tree.resolve_mut(&self.root, self.root_generation, &self.path)
            .ok_or(StoreError::ItemNotFound)
    }

    fn child_handle(&self, key: &[u8], node: &Node) -> MemoryItem {
        let mut path = self.path.clone();
        path.push((key.to_vec(), node.generation));
        MemoryItem {
            tree: Arc::clone(&self.tree),
            root: self.root.clone(),
            root_generation: self.root_generation,
            path,
            value: node.value.clone(),
            indexes: node.indexes.clone(),
        }
    }

    /// Collect up to `limit` children past `cursor`, paired with the
    /// cursor key to resume from.
    fn collect_batch(
        &self,
        by: RangeBy,
        cursor: &Bound<Vec<u8>>,
        reverse: bool,
        limit: usize,
    ) -> StoreResult<Vec<(Vec<u8>, MemoryItem)>> {
        let tree = self.read()?;
        let parent = self.locate(&tree)?;

        let cursor = slice_bound(cursor);
        let bounds = if reverse {
            (Bound::Unbounded, cursor)
        } else {
            (cursor, Bound::Unbounded)
        };

        let batch = match by {
            RangeBy::Key => {
                let range = parent.children.range::<[u8], _>(bounds);
                let entries: Box<dyn Iterator<Item = (&Vec<u8>, &Node)> + '_> = if reverse {
                    Box::new(range.rev())
                } else {
                    Box::new(range)
                };
                entries
                    .take(limit)
                    .map(|(key, node)| (key.clone(), self.child_handle(key, node)))
                    .collect()
            }
            RangeBy::Index(slot) => {
                let Some(map) = parent.index_maps.get(slot) else {
                    return Ok(Vec::new());
                };
                let range = map.range::<[u8], _>(bounds);
                let entries: Box<dyn Iterator<Item = (&Vec<u8>, &Vec<u8>)> + '_> = if reverse {
                    Box::new(range.rev())
                } else {
                    Box::new(range)
                };
                entries
                    .take(limit)
                    .filter_map(|(index_value, key)| {
                        parent
                            .children
                            .get(key)
                            .map(|node| (index_value.clone(), self.child_handle(key, node)))
                    })
                    .collect()
            }
        };

        Ok(batch)
    }
}

fn slice_bound(bound: &Bound<Vec<u8>>) -> Bound<&[u8]> {
    match bound {
        Bound::Included(key) => Bound::Included(key.as_slice()),
        Bound::Excluded(key) => Bound::Excluded(key.as_slice()),
        Bound::Unbounded => Bound::Unbounded,
    }
}

impl Item for MemoryItem {
    fn key(&self) -> Vec<u8> {
        match self.path.last() {
            Some((key, _)) => key.clone(),
            None => self.root.as_bytes().to_vec(),
        }
    }

    fn value(&self) -> &[u8] {
        &self.value
    }

    fn update_value(&mut self, value: &[u8]) -> StoreResult<()> {
        {
            let mut tree = self.write()?;
            let node = self.locate_mut(&mut tree)?;
            node.value = value.to_vec();
        }
        self.value = value.to_vec();
        Ok(())
    }

    fn delete(&self) -> StoreResult<()> {
        let mut tree = self.write()?;

        let Some(((key, generation), parent_path)) = self.path.split_last() else {
            // Locate first so a stale root handle cannot remove a newer root
            self.locate(&tree)?;
            tree.roots.remove(&self.root);
            return Ok(());
        };

        let parent = tree
            .resolve_mut(&self.root, self.root_generation, parent_path)
            .ok_or(StoreError::ItemNotFound)?;
        if !parent
            .children
            .get(key)
            .is_some_and(|child| child.generation == *generation)
        {
            return Err(StoreError::ItemNotFound);
        }
        let removed = parent
            .children
            .remove(key)
            .ok_or(StoreError::ItemNotFound)?;

        for (slot, index_value) in removed.indexes.iter().enumerate() {
            if let Some(map) = parent.index_maps.get_mut(slot) {
                map.remove(index_value);
            }
        }

        Ok(())
    }

    fn index_count(&self) -> usize {
        self.indexes.len()
    }

    fn index(&self, n: usize) -> Option<&[u8]> {
        self.indexes.get(n).map(Vec::as_slice)
    }

    fn create_child(&self, key: &[u8], value: &[u8], indexes: &[&[u8]]) -> StoreResult<Self> {
        let mut tree = self.write()?;
        let generation = tree.next_generation();
        let parent = self.locate_mut(&mut tree)?;

        if parent.children.contains_key(key) {
            return Err(StoreError::AlreadyExists);
        }
        if indexes
            .iter()
            .enumerate()
            .any(|(slot, index_value)| parent.index_taken(slot, index_value))
        {
            return Err(StoreError::AlreadyExists);
        }

        if parent.index_maps.len() < indexes.len() {
            parent.index_maps.resize_with(indexes.len(), BTreeMap::new);
        }
        for (slot, index_value) in indexes.iter().enumerate() {
            parent.index_maps[slot].insert(index_value.to_vec(), key.to_vec());
        }

        let node = Node {
            generation,
            value: value.to_vec(),
            indexes: indexes.iter().map(|v| v.to_vec()).collect(),
            ..Node::default()
        };
        let handle = self.child_handle(key, &node);
        parent.children.insert(key.to_vec(), node);

        Ok(handle)
    }

    fn read_child(&self, key: &[u8]) -> StoreResult<Self> {
        let tree = self.read()?;
        let node = self
            .locate(&tree)?
            .children
            .get(key)
            .ok_or(StoreError::ItemNotFound)?;
        Ok(self.child_handle(key, node))
    }

    fn read_child_by_index(&self, n: usize, value: &[u8]) -> StoreResult<Self> {
        let tree = self.read()?;
        let parent = self.locate(&tree)?;
        let key = parent
            .index_maps
            .get(n)
            .and_then(|map| map.get(value))
            .ok_or(StoreError::ItemNotFound)?;
        let node = parent.children.get(key).ok_or(StoreError::ItemNotFound)?;
        Ok(self.child_handle(key, node))
    }

    fn range_children<F>(
        &self,
        start: Option<&[u8]>,
        by: RangeBy,
        reverse: bool,
        mut visit: F,
    ) -> StoreResult<()>
    where
        F: FnMut(Self) -> bool,
    {
        let mut cursor = match start {
            Some(key) => Bound::Included(key.to_vec()),
            None => Bound::Unbounded,
        };

        // The lock is released between batches so visitors can write.
        loop {
            let batch = self.collect_batch(by, &cursor, reverse, RANGE_BATCH)?;
            let exhausted = batch.len() < RANGE_BATCH;

            for (resume_key, item) in batch {
                cursor = Bound::Excluded(resume_key);
                if !visit(item) {
                    return Ok(());
                }
            }

            if exhausted {
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys_of(root: &MemoryItem, start: Option<&[u8]>, by: RangeBy, reverse: bool) -> Vec<Vec<u8>> {
        let mut keys = Vec::new();
        root.range_children(start, by, reverse, |item| {
            keys.push(item.key());
            true
        })
        .unwrap();
        keys
    }

    #[test]
    fn test_root_item_reopens_same_root() {
        let store = MemoryStore::new();
        let root = store.root_item("app", "first").unwrap();
        root.quick_child(b"a", b"1").unwrap();

        let reopened = store.root_item("app", "second").unwrap();
        assert_eq!(reopened.value(), b"first");
        assert_eq!(reopened.read_child(b"a").unwrap().value(), b"1");
        assert_eq!(reopened.key(), b"app".to_vec());
        assert_eq!(store.root_names().unwrap(), vec!["app".to_string()]);
    }

    #[test]
    fn test_create_child_rejects_duplicate_key() {
        let store = MemoryStore::new();
        let root = store.root_item("app", "").unwrap();

        root.create_child(b"k", b"v", &[b"x".as_slice()]).unwrap();
        assert_eq!(
            root.create_child(b"k", b"other", &[b"y".as_slice()]).unwrap_err(),
            StoreError::AlreadyExists
        );
    }

    #[test]
    fn test_create_child_rejects_duplicate_index() {
        let store = MemoryStore::new();
        let root = store.root_item("app", "").unwrap();

        root.create_child(b"k1", b"v", &[b"x".as_slice()]).unwrap();
        assert_eq!(
            root.create_child(b"k2", b"v", &[b"x".as_slice()]).unwrap_err(),
            StoreError::AlreadyExists
        );
        // Rejected create leaves nothing behind
        assert_eq!(root.read_child(b"k2").unwrap_err(), StoreError::ItemNotFound);
    }

    #[test]
    fn test_index_lookup_and_release_on_delete() {
        let store = MemoryStore::new();
        let root = store.root_item("app", "").unwrap();

        let child = root.create_child(b"k1", b"v", &[b"x".as_slice()]).unwrap();
        assert_eq!(child.index_count(), 1);
        assert_eq!(child.index(0), Some(&b"x"[..]));
        assert_eq!(root.read_child_by_index(0, b"x").unwrap().key(), b"k1".to_vec());

        child.delete().unwrap();
        assert_eq!(root.read_child_by_index(0, b"x").unwrap_err(), StoreError::ItemNotFound);

        // Index value is free again
        root.create_child(b"k2", b"v", &[b"x".as_slice()]).unwrap();
    }

    #[test]
    fn test_delete_removes_descendants() {
        let store = MemoryStore::new();
        let root = store.root_item("app", "").unwrap();

        let child = root.create_child(b"parent", b"", &[]).unwrap();
        child.quick_child(b"a", b"1").unwrap();
        child.delete().unwrap();

        let recreated = root.create_child(b"parent", b"", &[]).unwrap();
        assert_eq!(recreated.read_child(b"a").unwrap_err(), StoreError::ItemNotFound);

        // The old handle does not see children added to the new record
        recreated.quick_child(b"a", b"2").unwrap();
        assert_eq!(child.read_child(b"a").unwrap_err(), StoreError::ItemNotFound);
        assert_eq!(recreated.read_child(b"a").unwrap().value(), b"2");
    }

    #[test]
    fn test_handle_to_deleted_item_never_reaches_its_replacement() {
        let store = MemoryStore::new();
        let root = store.root_item("app", "").unwrap();

        let mut old = root.create_child(b"k", b"old", &[b"x".as_slice()]).unwrap();
        old.delete().unwrap();
        let replacement = root.create_child(b"k", b"new", &[b"y".as_slice()]).unwrap();

        assert_eq!(old.update_value(b"stale").unwrap_err(), StoreError::ItemNotFound);
        assert_eq!(old.quick_child(b"a", b"").unwrap_err(), StoreError::ItemNotFound);
        assert_eq!(old.read_child(b"a").unwrap_err(), StoreError::ItemNotFound);
        assert_eq!(
            old.range_children(None, RangeBy::Key, false, |_| true).unwrap_err(),
            StoreError::ItemNotFound
        );
        assert_eq!(old.delete().unwrap_err(), StoreError::ItemNotFound);

        let current = root.read_child(b"k").unwrap();
        assert_eq!(current.value(), b"new");
        assert_eq!(current.index(0), Some(&b"y"[..]));
        assert_eq!(replacement.read_child(b"a").unwrap_err(), StoreError::ItemNotFound);
    }

    #[test]
    fn test_handle_to_deleted_root_never_reaches_its_replacement() {
        let store = MemoryStore::new();
        let old = store.root_item("app", "first").unwrap();
        old.delete().unwrap();

        let replacement = store.root_item("app", "second").unwrap();
        assert_eq!(old.quick_child(b"a", b"").unwrap_err(), StoreError::ItemNotFound);
        assert_eq!(old.delete().unwrap_err(), StoreError::ItemNotFound);

        assert_eq!(replacement.value(), b"second");
        assert_eq!(store.root_names().unwrap(), vec!["app".to_string()]);
    }

    #[test]
    fn test_update_value_refreshes_handle() {
        let store = MemoryStore::new();
        let root = store.root_item("app", "").unwrap();

        let mut child = root.create_child(b"k", b"old", &[]).unwrap();
        let stale = child.clone();
        child.update_value(b"new").unwrap();

        assert_eq!(child.value(), b"new");
        assert_eq!(stale.value(), b"old");
        assert_eq!(root.read_child(b"k").unwrap().value(), b"new");
    }

    #[test]
    fn test_operations_on_deleted_item_fail() {
        let store = MemoryStore::new();
        let root = store.root_item("app", "").unwrap();

        let mut child = root.create_child(b"k", b"v", &[]).unwrap();
        child.delete().unwrap();

        assert_eq!(child.update_value(b"x").unwrap_err(), StoreError::ItemNotFound);
        assert_eq!(child.delete().unwrap_err(), StoreError::ItemNotFound);
        assert_eq!(child.quick_child(b"a", b"").unwrap_err(), StoreError::ItemNotFound);
    }

    #[test]
    fn test_range_by_key_both_directions() {
        let store = MemoryStore::new();
        let root = store.root_item("app", "").unwrap();
        for key in [b"b", b"d", b"a", b"c"] {
            root.quick_child(key.as_slice(), b"").unwrap();
        }

        assert_eq!(
            keys_of(&root, None, RangeBy::Key, false),
            vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec(), b"d".to_vec()]
        );
        assert_eq!(
            keys_of(&root, None, RangeBy::Key, true),
            vec![b"d".to_vec(), b"c".to_vec(), b"b".to_vec(), b"a".to_vec()]
        );
        assert_eq!(
            keys_of(&root, Some(b"b".as_slice()), RangeBy::Key, false),
            vec![b"b".to_vec(), b"c".to_vec(), b"d".to_vec()]
        );
        assert_eq!(
            keys_of(&root, Some(b"bz".as_slice()), RangeBy::Key, true),
            vec![b"b".to_vec(), b"a".to_vec()]
        );
    }

    #[test]
    fn test_range_by_index_orders_by_index_value() {
        let store = MemoryStore::new();
        let root = store.root_item("app", "").unwrap();
        root.create_child(b"1", b"", &[b"zed".as_slice()]).unwrap();
        root.create_child(b"2", b"", &[b"amy".as_slice()]).unwrap();
        root.create_child(b"3", b"", &[b"max".as_slice()]).unwrap();

        assert_eq!(
            keys_of(&root, None, RangeBy::Index(0), false),
            vec![b"2".to_vec(), b"3".to_vec(), b"1".to_vec()]
        );
        assert_eq!(
            keys_of(&root, Some(b"max".as_slice()), RangeBy::Index(0), true),
            vec![b"3".to_vec(), b"2".to_vec()]
        );
        assert!(keys_of(&root, None, RangeBy::Index(1), false).is_empty());
    }

    #[test]
    fn test_range_stops_early() {
        let store = MemoryStore::new();
        let root = store.root_item("app", "").unwrap();
        for i in 0u8..10 {
            root.quick_child(&[i], b"").unwrap();
        }

        let mut seen = 0;
        root.range_children(None, RangeBy::Key, false, |_| {
            seen += 1;
            seen < 3
        })
        .unwrap();
        assert_eq!(seen, 3);
    }

    #[test]
    fn test_range_spans_batches_and_allows_writes() {
        let store = MemoryStore::new();
        let root = store.root_item("app", "").unwrap();
        let total = RANGE_BATCH * 2 + 5;
        for i in 0..total as u32 {
            root.quick_child(&i.to_be_bytes(), b"").unwrap();
        }

        let mut seen = Vec::new();
        root.range_children(None, RangeBy::Key, false, |item| {
            item.quick_child(b"attr", b"x").unwrap();
            seen.push(item.key());
            true
        })
        .unwrap();

        assert_eq!(seen.len(), total);
        assert!(seen.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(
            root.read_child(&0u32.to_be_bytes())
                .unwrap()
                .read_child(b"attr")
                .unwrap()
                .value(),
            b"x"
        );
    }
}
