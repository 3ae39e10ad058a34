//! Reference-identity keyed memoization.
//!
//! Both engines walk graphs that may reach the same node along several paths, including paths
//! that loop back into a node whose output is still being produced. [`IdentityMemo`] maps a
//! node's *identity* (the address of its shared allocation, never its content) to the output
//! produced for it.
//!
//! The load-bearing rule for callers is ordering: register a node **before** descending into
//! its children. A descendant that loops back then finds the registered, not-yet-finished
//! output and hands it out instead of recursing again.
//!
//! ```rust
//! use std::{cell::RefCell, rc::Rc};
//! use reweave_core::identity::{Identity, IdentityMemo, NodeId};
//!
//! #[derive(Clone)]
//! struct Node(Rc<RefCell<Vec<Node>>>);
//!
//! impl Identity for Node {
//!     fn node_id(&self) -> NodeId {
//!         NodeId::of_rc(&self.0)
//!     }
//! }
//!
//! let a = Node(Rc::default());
//! let mut memo: IdentityMemo<Node, usize> = IdentityMemo::new();
//! memo.register(&a, 1);
//! assert_eq!(memo.get(&a.clone()), Some(1));
//! assert_eq!(memo.get(&Node(Rc::default())), None);
//! ```

use std::{
    collections::{btree_map::Entry as BTreeEntry, BTreeMap},
    fmt,
    rc::Rc,
};

/// Identity of a shared node: the address of its allocation.
///
/// Only meaningful while the allocation is alive. [`IdentityMemo`] keeps a clone of every key
/// it holds, so ids stored in a memo cannot be recycled by the allocator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn of_rc<T: ?Sized>(rc: &Rc<T>) -> Self {
        NodeId(Rc::as_ptr(rc) as *const () as usize)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// A cheap-clone handle whose clones all share one identity.
pub trait Identity: Clone {
    fn node_id(&self) -> NodeId;

    fn same_node(&self, other: &Self) -> bool {
        self.node_id() == other.node_id()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    /// Registered, children still being visited.
    InProgress,
    Complete,
}

/// Marks the memo length at the start of a top-level traversal. See [IdentityMemo::rollback].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint(usize);

struct MemoEntry<K, V> {
    // Held so the key's allocation (and therefore its NodeId) outlives the entry.
    _key: K,
    value: V,
    state: EntryState,
}

pub struct IdentityMemo<K, V> {
    entries: BTreeMap<NodeId, MemoEntry<K, V>>,
    order: Vec<NodeId>,
}

impl<K, V> Default for IdentityMemo<K, V> {
    fn default() -> Self {
        IdentityMemo {
            entries: BTreeMap::default(),
            order: Vec::default(),
        }
    }
}

impl<K: Identity, V: Clone> fmt::Debug for IdentityMemo<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityMemo")
            .field("len", &self.len())
            .field("in_progress", &self.in_progress_count())
            .finish()
    }
}

impl<K: Identity, V: Clone> IdentityMemo<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(&key.node_id())
    }

    /// Returns the memoized output for `key`, whether or not it is complete.
    pub fn get(&self, key: &K) -> Option<V> {
        self.entries
            .get(&key.node_id())
            .map(|entry| entry.value.clone())
    }

    /// `None` when `key` was never registered.
    pub fn state(&self, key: &K) -> Option<EntryState> {
        self.entries.get(&key.node_id()).map(|entry| entry.state)
    }

    pub fn is_complete(&self, key: &K) -> bool {
        self.state(key) == Some(EntryState::Complete)
    }

    pub fn in_progress_count(&self) -> usize {
        self.entries
            .values()
            .filter(|entry| entry.state == EntryState::InProgress)
            .count()
    }

    /// Registers `value` as the in-progress output for `key`.
    ///
    /// Returns false and leaves the memo untouched if `key` is already registered; the first
    /// registration always wins so that every holder of the earlier output keeps seeing the
    /// shared object.
    pub fn register(&mut self, key: &K, value: V) -> bool {
        let id = key.node_id();
        match self.entries.entry(id) {
            BTreeEntry::Vacant(slot) => {
                slot.insert(MemoEntry {
                    _key: key.clone(),
                    value,
                    state: EntryState::InProgress,
                });
                self.order.push(id);
                true
            }
            BTreeEntry::Occupied(_) => {
                tracing::warn!("[IdentityMemo::register] node {id} is already registered");
                false
            }
        }
    }

    /// Marks `key`'s output as fully populated.
    pub fn complete(&mut self, key: &K) {
        if let Some(entry) = self.entries.get_mut(&key.node_id()) {
            entry.state = EntryState::Complete;
        }
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.order.len())
    }

    /// Removes every entry registered after `checkpoint`, returning how many were dropped.
    ///
    /// Entries registered before the checkpoint (results of earlier, successful traversals
    /// that share this memo) are kept.
    pub fn rollback(&mut self, checkpoint: Checkpoint) -> usize {
        let keep = checkpoint.0.min(self.order.len());
        let dropped = self.order.split_off(keep);
        for id in dropped.iter() {
            self.entries.remove(id);
        }
        dropped.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    /// Outputs in registration order.
    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.order
            .iter()
            .filter_map(|id| self.entries.get(id).map(|entry| &entry.value))
    }
}
