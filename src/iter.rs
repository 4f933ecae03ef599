use core::iter::FusedIterator;

use alloc::vec::Vec;

use crate::{Error, NodeIndex, RbMultiset, Result, Side};

/// Ascending in-order iterator over the keys of an [`RbMultiset`].
///
/// Walks the tree with an explicit stack, so its depth is bounded by the height
/// of the tree rather than by the call stack.
#[derive(Debug)]
pub struct SortedIter<'a, K: Ord> {
    pub(crate) tree: &'a RbMultiset<K>,
    pub(crate) curr: NodeIndex,
    pub(crate) stack: Vec<NodeIndex>,
    pub(crate) remaining: usize,
}

impl<'a, K: Ord> Iterator for SortedIter<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        while self.curr != RbMultiset::<K>::NIL {
            self.stack.push(self.curr);
            self.curr = self.tree.get_node_by_idx(self.curr).child(Side::Left);
        }

        if let Some(node) = self.stack.pop() {
            self.curr = self.tree.get_node_by_idx(node).child(Side::Right);
            self.remaining -= 1;

            return Some(&self.tree.get_node_by_idx(node).key);
        }

        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K: Ord> ExactSizeIterator for SortedIter<'_, K> {}

impl<K: Ord> FusedIterator for SortedIter<'_, K> {}

impl<'a, K: Ord> IntoIterator for &'a RbMultiset<K> {
    type Item = &'a K;
    type IntoIter = SortedIter<'a, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: Ord> RbMultiset<K> {
    /// Iterates over every key in ascending order, duplicates included.
    pub fn iter(&self) -> SortedIter<'_, K> {
        SortedIter {
            tree: self,
            curr: self.root_idx(),
            stack: Vec::new(),
            remaining: self.len(),
        }
    }
}

impl<K: Clone + Ord> RbMultiset<K> {
    /// Writes the smallest keys, in ascending order, into `out`.
    ///
    /// At most `out.len()` keys are written; slots past the returned count are
    /// left untouched. Returns the number of keys written, which is
    /// `min(self.len(), out.len())`.
    pub fn to_ordered_sequence(&self, out: &mut [K]) -> Result<usize> {
        if out.is_empty() {
            return Err(Error::ZeroCapacity);
        }

        let mut written = 0;
        for (slot, key) in out.iter_mut().zip(self.iter()) {
            slot.clone_from(key);
            written += 1;
        }

        Ok(written)
    }

    /// Collects at most `capacity` of the smallest keys in ascending order.
    pub fn ordered_keys(&self, capacity: usize) -> Result<Vec<K>> {
        if capacity == 0 {
            return Err(Error::ZeroCapacity);
        }

        Ok(self.iter().take(capacity).cloned().collect())
    }
}
