use log::trace;

use crate::{NodeColor, NodeHandle, NodeIndex, RbMultiset, Result, Side};

impl<K: Default + Ord> RbMultiset<K> {
    /// Adds a new entry for `key` and returns its handle.
    ///
    /// Keys equal to an existing one are placed after it, so equal keys come out
    /// of ordered traversals in insertion order. Fails only when the node arena
    /// cannot grow, in which case the tree is left unchanged.
    pub fn insert(&mut self, key: K) -> Result<NodeHandle> {
        let mut current_node = self.root;
        let mut parent_node = Self::NIL;
        let mut side = Side::Left;

        while current_node != Self::NIL {
            parent_node = current_node;
            let curr_node_storage = self.get_node_by_idx(current_node);

            side = if key < curr_node_storage.key {
                Side::Left
            } else {
                Side::Right
            };
            current_node = curr_node_storage.child(side);
        }

        let new_node = self.allocate_node(key)?;
        self.get_node_by_idx_mut(new_node).parent = parent_node;

        if parent_node == Self::NIL {
            self.root = new_node;
        } else {
            *self.get_node_by_idx_mut(parent_node).child_mut(side) = new_node;
        }
        self.len += 1;

        trace!("inserted node {} under {}", new_node.0, parent_node.0);

        self.fix_red_violation(new_node);

        debug_assert!(!self.is_red(self.root), "root must be black");
        #[cfg(test)]
        self.assert_invariants("insertion");

        Ok(self.handle_for(new_node))
    }

    fn fix_red_violation(&mut self, start_node_idx: NodeIndex) {
        let mut curr_node = start_node_idx;

        // the sentinel above the root is black, so the root always ends the loop
        while self.is_red(self.parent_of(curr_node)) {
            let parent_idx = self.parent_of(curr_node);
            let grandparent_idx = self.parent_of(parent_idx);

            let parent_side = self.side_under(grandparent_idx, parent_idx);
            let uncle = self.child_of(grandparent_idx, parent_side.opposite());

            if self.is_red(uncle) {
                self.set_color(parent_idx, NodeColor::Black);
                self.set_color(uncle, NodeColor::Black);
                self.set_color(grandparent_idx, NodeColor::Red);

                curr_node = grandparent_idx;
                continue;
            }

            if self.side_under(parent_idx, curr_node) != parent_side {
                curr_node = parent_idx;
                self.rotate(curr_node, parent_side.opposite());
            }

            let parent_idx = self.parent_of(curr_node);
            self.set_color(parent_idx, NodeColor::Black);
            self.set_color(grandparent_idx, NodeColor::Red);
            self.rotate(grandparent_idx, parent_side);
        }

        let root = self.root;
        self.set_color(root, NodeColor::Black);
    }
}
