//! Red-Black Tree based ordered multiset.
//!
//! [`RbMultiset`] stores keys in ascending order and keeps every inserted entry,
//! including entries whose keys compare equal. Nodes live in a single arena owned
//! by the tree and refer to each other by index, with the cell at index 0 acting
//! as the shared black sentinel that terminates every path.
//!
//! ```
//! use rbmultiset::RbMultiset;
//!
//! let mut tree = RbMultiset::new();
//! for key in [5, 3, 8, 3, 1] {
//!     tree.insert(key).unwrap();
//! }
//!
//! let mut out = [0; 5];
//! assert_eq!(tree.to_ordered_sequence(&mut out), Ok(5));
//! assert_eq!(out, [1, 3, 3, 5, 8]);
//! ```

#![no_std]

extern crate alloc;

mod error;
mod handle;
mod insert;
mod iter;
mod remove;
mod validate;

use core::cmp::Ordering;
use core::mem;

use alloc::vec::Vec;
use log::debug;

pub use error::{Error, Result};
pub use handle::NodeHandle;
pub use iter::SortedIter;
pub use validate::InvariantViolation;

use handle::TreeId;

/*
free arena cells are kept in a linked list threaded through their `parent` field, the head of the list being
stored in the tree itself:
- a new node takes the head cell, the new head is storage[head].parent
- a released cell becomes the new head, storage[cell].parent = old head

each release bumps the cell generation, which is how handles to erased nodes get rejected.
*/

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum NodeColor {
    #[default]
    Red,
    Black,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeIndex(pub(crate) usize);

const SENTINEL: NodeIndex = NodeIndex(0);

/// Which child slot of a node is meant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Side {
    Left,
    Right,
}

impl Side {
    pub(crate) fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

#[derive(Debug)]
pub(crate) struct Node<K> {
    pub(crate) key: K,
    pub(crate) color: NodeColor,
    pub(crate) parent: NodeIndex,
    pub(crate) left: NodeIndex,
    pub(crate) right: NodeIndex,
    generation: u32,
}

impl<K> Node<K> {
    fn new_isolated(key: K) -> Self {
        Self {
            key,
            color: NodeColor::default(),
            parent: SENTINEL,
            left: SENTINEL,
            right: SENTINEL,
            generation: 0,
        }
    }

    pub(crate) fn child(&self, side: Side) -> NodeIndex {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    pub(crate) fn child_mut(&mut self, side: Side) -> &mut NodeIndex {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }
}

impl<K: Default> Node<K> {
    fn sentinel() -> Self {
        Self {
            color: NodeColor::Black,
            ..Self::new_isolated(K::default())
        }
    }
}

/// An ordered multiset backed by a red-black tree.
///
/// Every [`insert`](RbMultiset::insert) adds a new entry, even when an equal key
/// is already stored; equal keys are kept in insertion order. Entries are
/// addressed through [`NodeHandle`]s.
///
/// The tree holds no internal synchronization: mutation goes through `&mut self`,
/// so sharing a tree between threads requires an external lock.
#[derive(Debug)]
pub struct RbMultiset<K: Ord> {
    storage: Vec<Node<K>>,
    root: NodeIndex,
    free_head: NodeIndex,
    len: usize,
    id: TreeId,
}

impl<K: Ord> RbMultiset<K> {
    pub(crate) const NIL: NodeIndex = SENTINEL;

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root == Self::NIL
    }

    /// Number of entries the tree can hold before its arena reallocates.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.storage.capacity() - 1
    }

    /// Returns a handle to an entry whose key equals `key`.
    ///
    /// When several entries share the key, the first one met on the way down from
    /// the root is returned, which is not necessarily the oldest.
    pub fn find(&self, key: &K) -> Option<NodeHandle> {
        let mut current_node = self.root;

        while current_node != Self::NIL {
            let curr_node_storage = self.get_node_by_idx(current_node);

            match key.cmp(&curr_node_storage.key) {
                Ordering::Less => {
                    current_node = curr_node_storage.left;
                }
                Ordering::Equal => {
                    return Some(self.handle_for(current_node));
                }
                Ordering::Greater => {
                    current_node = curr_node_storage.right;
                }
            }
        }

        None
    }

    pub fn contains(&self, key: &K) -> bool {
        self.find(key).is_some()
    }

    /// Handle to an entry holding the smallest key.
    pub fn min(&self) -> Result<NodeHandle> {
        if self.root == Self::NIL {
            return Err(Error::EmptyTree);
        }

        Ok(self.handle_for(self.subtree_extreme(self.root, Side::Left)))
    }

    /// Handle to an entry holding the largest key.
    pub fn max(&self) -> Result<NodeHandle> {
        if self.root == Self::NIL {
            return Err(Error::EmptyTree);
        }

        Ok(self.handle_for(self.subtree_extreme(self.root, Side::Right)))
    }

    /// Key stored behind `handle`, or `None` if the handle is stale or foreign.
    pub fn get(&self, handle: NodeHandle) -> Option<&K> {
        self.resolve(handle)
            .ok()
            .map(|idx| &self.get_node_by_idx(idx).key)
    }

    pub(crate) fn get_node_by_idx(&self, node_idx: NodeIndex) -> &Node<K> {
        &self.storage[node_idx.0]
    }

    pub(crate) fn get_node_by_idx_mut(&mut self, node_idx: NodeIndex) -> &mut Node<K> {
        &mut self.storage[node_idx.0]
    }

    pub(crate) fn root_idx(&self) -> NodeIndex {
        self.root
    }

    pub(crate) fn handle_for(&self, node_idx: NodeIndex) -> NodeHandle {
        NodeHandle {
            tree: self.id,
            index: node_idx,
            generation: self.get_node_by_idx(node_idx).generation,
        }
    }

    pub(crate) fn resolve(&self, handle: NodeHandle) -> Result<NodeIndex> {
        if handle.tree != self.id {
            return Err(Error::ForeignHandle);
        }

        match self.storage.get(handle.index.0) {
            Some(node) if handle.index != Self::NIL && node.generation == handle.generation => {
                Ok(handle.index)
            }
            _ => Err(Error::StaleHandle),
        }
    }

    pub(crate) fn parent_of(&self, node_idx: NodeIndex) -> NodeIndex {
        self.get_node_by_idx(node_idx).parent
    }

    pub(crate) fn child_of(&self, node_idx: NodeIndex, side: Side) -> NodeIndex {
        self.get_node_by_idx(node_idx).child(side)
    }

    /// Side of `parent` under which `node_idx` hangs.
    ///
    /// Also valid for the sentinel standing in for a missing child, as long as the
    /// other child of `parent` is a real node.
    pub(crate) fn side_under(&self, parent: NodeIndex, node_idx: NodeIndex) -> Side {
        if self.get_node_by_idx(parent).left == node_idx {
            Side::Left
        } else {
            Side::Right
        }
    }

    pub(crate) fn color(&self, node_idx: NodeIndex) -> NodeColor {
        self.get_node_by_idx(node_idx).color
    }

    pub(crate) fn is_red(&self, node_idx: NodeIndex) -> bool {
        matches!(self.color(node_idx), NodeColor::Red)
    }

    pub(crate) fn set_color(&mut self, node_idx: NodeIndex, color: NodeColor) {
        debug_assert!(
            node_idx != Self::NIL || color == NodeColor::Black,
            "the sentinel must stay black"
        );
        self.get_node_by_idx_mut(node_idx).color = color;
    }

    pub(crate) fn subtree_extreme(&self, mut node_idx: NodeIndex, side: Side) -> NodeIndex {
        while self.child_of(node_idx, side) != Self::NIL {
            node_idx = self.child_of(node_idx, side);
        }

        node_idx
    }

    /// Moves the child of `center` on `side` into `center`'s place.
    ///
    /// `center` becomes the pivot's child on the opposite side and takes over the
    /// pivot's inner subtree. In-order sequence and colors are preserved.
    pub(crate) fn rotate(&mut self, center: NodeIndex, side: Side) {
        let grandparent_idx = self.parent_of(center);
        let pivot_idx = self.child_of(center, side);
        debug_assert_ne!(pivot_idx, Self::NIL, "rotation pivot must be a real node");

        let inner_idx = self.child_of(pivot_idx, side.opposite());

        *self.get_node_by_idx_mut(center).child_mut(side) = inner_idx;
        if inner_idx != Self::NIL {
            self.get_node_by_idx_mut(inner_idx).parent = center;
        }

        *self.get_node_by_idx_mut(pivot_idx).child_mut(side.opposite()) = center;
        self.get_node_by_idx_mut(center).parent = pivot_idx;
        self.get_node_by_idx_mut(pivot_idx).parent = grandparent_idx;

        self.replace_child(grandparent_idx, center, pivot_idx);
    }

    /// Puts `replacement` where `target` hangs. Children of both are left untouched.
    ///
    /// The parent link of `replacement` is written even for the sentinel, since the
    /// deletion fix-up reads it.
    pub(crate) fn transplant(&mut self, target: NodeIndex, replacement: NodeIndex) {
        let parent_idx = self.parent_of(target);

        self.replace_child(parent_idx, target, replacement);
        self.get_node_by_idx_mut(replacement).parent = parent_idx;
    }

    fn replace_child(&mut self, parent_idx: NodeIndex, old_child: NodeIndex, new_child: NodeIndex) {
        if parent_idx == Self::NIL {
            self.root = new_child;
        } else if self.get_node_by_idx(parent_idx).left == old_child {
            self.get_node_by_idx_mut(parent_idx).left = new_child;
        } else {
            self.get_node_by_idx_mut(parent_idx).right = new_child;
        }
    }

    /// Releases every node below `top` (included), children before parents.
    fn release_subtree(&mut self, top: NodeIndex) -> usize
    where
        K: Default,
    {
        let mut released = 0;
        let mut stack = Vec::new();
        let mut last_released = Self::NIL;
        let mut curr = top;

        while curr != Self::NIL || !stack.is_empty() {
            if curr != Self::NIL {
                stack.push(curr);
                curr = self.get_node_by_idx(curr).child(Side::Left);
                continue;
            }

            let Some(&node) = stack.last() else {
                break;
            };
            let right = self.get_node_by_idx(node).child(Side::Right);

            if right != Self::NIL && right != last_released {
                curr = right;
            } else {
                stack.pop();
                drop(self.release_node(node));
                last_released = node;
                released += 1;
            }
        }

        released
    }
}

impl<K: Default + Ord> RbMultiset<K> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            storage: alloc::vec![Node::sentinel()],
            root: Self::NIL,
            free_head: Self::NIL,
            len: 0,
            id: TreeId::next(),
        }
    }

    /// Creates an empty tree able to hold `capacity` entries without reallocating.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let mut storage = Vec::with_capacity(capacity.saturating_add(1));
        storage.push(Node::sentinel());

        Self {
            storage,
            root: Self::NIL,
            free_head: Self::NIL,
            len: 0,
            id: TreeId::next(),
        }
    }

    /// Makes room for at least `additional` more entries.
    pub fn reserve(&mut self, additional: usize) -> Result<()> {
        let free_cells = self.storage.len() - 1 - self.len;
        if additional <= free_cells {
            return Ok(());
        }

        self.storage
            .try_reserve(additional - free_cells)
            .map_err(|_| Error::AllocationFailed)?;
        debug!("node arena grown to {} cells", self.storage.capacity());

        Ok(())
    }

    /// Removes every entry, keeping the arena for reuse.
    ///
    /// Handles obtained before the call become stale.
    pub fn clear(&mut self) {
        let released = self.release_subtree(self.root);
        self.root = Self::NIL;
        self.len = 0;

        debug!("cleared tree, released {released} nodes");
    }

    /// Tears the tree down, releasing every node children-first, then the sentinel.
    ///
    /// Returns how many entries were released.
    pub fn destroy(mut self) -> usize {
        let released = self.release_subtree(self.root);

        debug!(
            "destroyed tree, released {released} nodes out of {} arena cells",
            self.storage.len() - 1
        );

        released
    }

    pub(crate) fn allocate_node(&mut self, key: K) -> Result<NodeIndex> {
        if self.free_head != Self::NIL {
            let node_idx = self.free_head;
            let cell = self.get_node_by_idx_mut(node_idx);
            let next_free = cell.parent;

            cell.key = key;
            cell.color = NodeColor::Red;
            cell.parent = Self::NIL;
            cell.left = Self::NIL;
            cell.right = Self::NIL;
            self.free_head = next_free;

            return Ok(node_idx);
        }

        let previous_capacity = self.storage.capacity();
        self.storage
            .try_reserve(1)
            .map_err(|_| Error::AllocationFailed)?;
        if self.storage.capacity() != previous_capacity {
            debug!("node arena grown to {} cells", self.storage.capacity());
        }

        let node_idx = NodeIndex(self.storage.len());
        self.storage.push(Node::new_isolated(key));

        Ok(node_idx)
    }

    pub(crate) fn release_node(&mut self, node_idx: NodeIndex) -> K {
        debug_assert_ne!(node_idx, Self::NIL, "the sentinel is never released");

        let free_head = self.free_head;
        let cell = self.get_node_by_idx_mut(node_idx);

        cell.generation = cell.generation.wrapping_add(1);
        cell.color = NodeColor::Black;
        cell.parent = free_head;
        cell.left = Self::NIL;
        cell.right = Self::NIL;
        let key = mem::take(&mut cell.key);

        self.free_head = node_idx;

        key
    }
}

impl<K: Default + Ord> Default for RbMultiset<K> {
    fn default() -> Self {
        Self::new()
    }
}
