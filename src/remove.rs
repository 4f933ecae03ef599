use log::trace;

use crate::{NodeColor, NodeHandle, NodeIndex, RbMultiset, Result, Side};

impl<K: Default + Ord> RbMultiset<K> {
    /// Removes the entry behind `handle` and returns its key.
    ///
    /// Fails with [`Error::ForeignHandle`](crate::Error::ForeignHandle) or
    /// [`Error::StaleHandle`](crate::Error::StaleHandle) without touching the tree
    /// when the handle does not designate a live entry of this tree.
    pub fn erase(&mut self, handle: NodeHandle) -> Result<K> {
        let node_idx = self.resolve(handle)?;

        let left = self.get_node_by_idx(node_idx).child(Side::Left);
        let right = self.get_node_by_idx(node_idx).child(Side::Right);
        let mut removed_color = self.color(node_idx);
        let fixup_node;

        if left == Self::NIL {
            fixup_node = right;
            self.transplant(node_idx, right);
        } else if right == Self::NIL {
            fixup_node = left;
            self.transplant(node_idx, left);
        } else {
            let successor = self.subtree_extreme(right, Side::Left);
            removed_color = self.color(successor);
            fixup_node = self.get_node_by_idx(successor).child(Side::Right);

            if self.parent_of(successor) == node_idx {
                // may be the sentinel, the fix-up still walks up from it
                self.get_node_by_idx_mut(fixup_node).parent = successor;
            } else {
                self.transplant(successor, fixup_node);
                self.get_node_by_idx_mut(successor).right = right;
                self.get_node_by_idx_mut(right).parent = successor;
            }

            self.transplant(node_idx, successor);
            self.get_node_by_idx_mut(successor).left = left;
            self.get_node_by_idx_mut(left).parent = successor;
            let color = self.color(node_idx);
            self.set_color(successor, color);
        }

        if removed_color == NodeColor::Black {
            self.fix_double_black(fixup_node);
        }
        self.get_node_by_idx_mut(Self::NIL).parent = Self::NIL;

        self.len -= 1;
        let key = self.release_node(node_idx);

        trace!("erased node {}", node_idx.0);

        debug_assert!(!self.is_red(self.root), "root must be black");
        #[cfg(test)]
        self.assert_invariants("removal");

        Ok(key)
    }

    /// Removes one entry equal to `key`, if any, and returns the stored key.
    pub fn remove(&mut self, key: &K) -> Option<K> {
        let handle = self.find(key)?;
        let removed = self.erase(handle);
        debug_assert!(removed.is_ok(), "handle returned by find must be live");

        removed.ok()
    }

    /// Restores equal black counts after a black node left the path through
    /// `start_node_idx`, which carries the missing black.
    fn fix_double_black(&mut self, start_node_idx: NodeIndex) {
        let mut curr_node = start_node_idx;

        while curr_node != self.root && !self.is_red(curr_node) {
            let parent_idx = self.parent_of(curr_node);
            let side = self.side_under(parent_idx, curr_node);
            let mut sibling = self.child_of(parent_idx, side.opposite());

            if self.is_red(sibling) {
                self.set_color(sibling, NodeColor::Black);
                self.set_color(parent_idx, NodeColor::Red);
                self.rotate(parent_idx, side.opposite());

                sibling = self.child_of(parent_idx, side.opposite());
            }

            let near_nephew = self.child_of(sibling, side);
            let far_nephew = self.child_of(sibling, side.opposite());

            if !self.is_red(near_nephew) && !self.is_red(far_nephew) {
                self.set_color(sibling, NodeColor::Red);
                curr_node = parent_idx;
                continue;
            }

            if !self.is_red(far_nephew) {
                self.set_color(near_nephew, NodeColor::Black);
                self.set_color(sibling, NodeColor::Red);
                self.rotate(sibling, side);

                sibling = self.child_of(parent_idx, side.opposite());
            }

            let parent_color = self.color(parent_idx);
            let far_nephew = self.child_of(sibling, side.opposite());
            self.set_color(sibling, parent_color);
            self.set_color(parent_idx, NodeColor::Black);
            self.set_color(far_nephew, NodeColor::Black);
            self.rotate(parent_idx, side.opposite());

            curr_node = self.root;
        }

        self.set_color(curr_node, NodeColor::Black);
    }
}
