use core::fmt;

use crate::{NodeColor, NodeIndex, RbMultiset};

/// First red-black rule found broken by [`RbMultiset::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvariantViolation {
    /// The shared sentinel is not black.
    RedSentinel,
    /// The root is red or has a parent.
    MisplacedRoot,
    /// A red node has a red child.
    RedChildOfRed,
    /// Two paths from the same node down to the sentinel cross a different
    /// number of black nodes.
    UnequalBlackHeight,
    /// A key is out of order with respect to one of its ancestors.
    KeyOutOfOrder,
    /// A child does not point back at its parent.
    BrokenParentLink,
    /// The number of reachable nodes differs from the recorded length.
    LengthMismatch,
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = match self {
            InvariantViolation::RedSentinel => "sentinel is red",
            InvariantViolation::MisplacedRoot => "root is red or has a parent",
            InvariantViolation::RedChildOfRed => "red node with a red child",
            InvariantViolation::UnequalBlackHeight => "unequal black heights",
            InvariantViolation::KeyOutOfOrder => "keys out of order",
            InvariantViolation::BrokenParentLink => "child not linked back to its parent",
            InvariantViolation::LengthMismatch => "node count differs from length",
        };

        write!(f, "red-black invariant violated: {rule}")
    }
}

impl core::error::Error for InvariantViolation {}

impl<K: Ord> RbMultiset<K> {
    /// Walks the whole tree and checks every red-black rule.
    ///
    /// Returns the black-height of the tree: the number of black nodes on any path
    /// from the root down to the sentinel, the sentinel excluded.
    pub fn validate(&self) -> Result<usize, InvariantViolation> {
        if self.color(Self::NIL) != NodeColor::Black {
            return Err(InvariantViolation::RedSentinel);
        }

        let root = self.root_idx();
        if root != Self::NIL
            && (self.is_red(root) || self.get_node_by_idx(root).parent != Self::NIL)
        {
            return Err(InvariantViolation::MisplacedRoot);
        }

        let mut count = 0;
        let black_height = self.check_subtree(root, None, None, &mut count)?;

        if count != self.len() {
            return Err(InvariantViolation::LengthMismatch);
        }

        Ok(black_height - 1)
    }

    /// Full check run by unit tests after every mutation. Too slow for bulk loads
    /// in ordinary debug builds, where only the root color is checked.
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self, operation: &str) {
        if let Err(violation) = self.validate() {
            panic!("{violation} after {operation}");
        }
    }

    fn check_subtree<'a>(
        &'a self,
        node_idx: NodeIndex,
        lower: Option<&'a K>,
        upper: Option<&'a K>,
        count: &mut usize,
    ) -> Result<usize, InvariantViolation> {
        if node_idx == Self::NIL {
            return Ok(1);
        }

        let node = self.get_node_by_idx(node_idx);

        if lower.is_some_and(|bound| node.key < *bound)
            || upper.is_some_and(|bound| node.key > *bound)
        {
            return Err(InvariantViolation::KeyOutOfOrder);
        }

        for child in [node.left, node.right] {
            if child == Self::NIL {
                continue;
            }
            if self.get_node_by_idx(child).parent != node_idx {
                return Err(InvariantViolation::BrokenParentLink);
            }
            if self.is_red(node_idx) && self.is_red(child) {
                return Err(InvariantViolation::RedChildOfRed);
            }
        }

        *count += 1;

        let left_height = self.check_subtree(node.left, lower, Some(&node.key), count)?;
        let right_height = self.check_subtree(node.right, Some(&node.key), upper, count)?;

        if left_height != right_height {
            return Err(InvariantViolation::UnequalBlackHeight);
        }

        if self.is_red(node_idx) {
            Ok(left_height)
        } else {
            Ok(left_height + 1)
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{InvariantViolation, NodeColor, RbMultiset, Side};

    fn three_nodes() -> RbMultiset<u32> {
        let mut tree = RbMultiset::new();
        for key in [20, 10, 30] {
            tree.insert(key).unwrap();
        }

        tree
    }

    #[test]
    pub fn valid_tree_reports_black_height() {
        assert_eq!(RbMultiset::<u32>::new().validate(), Ok(0));
        assert_eq!(three_nodes().validate(), Ok(1));
    }

    #[test]
    pub fn detects_red_root() {
        let mut tree = three_nodes();
        let root = tree.root_idx();
        tree.set_color(root, NodeColor::Red);

        assert_eq!(tree.validate(), Err(InvariantViolation::MisplacedRoot));
    }

    #[test]
    pub fn detects_red_red_edge() {
        let mut tree = three_nodes();
        let leaf = tree.insert(5).unwrap();
        let parent = tree.parent_of(leaf.index);
        tree.set_color(parent, NodeColor::Red);

        assert_eq!(tree.validate(), Err(InvariantViolation::RedChildOfRed));
    }

    #[test]
    pub fn detects_black_height_mismatch() {
        let mut tree = three_nodes();
        let left = tree.child_of(tree.root_idx(), Side::Left);
        tree.set_color(left, NodeColor::Black);

        assert_eq!(tree.validate(), Err(InvariantViolation::UnequalBlackHeight));
    }

    #[test]
    pub fn detects_key_disorder() {
        let mut tree = three_nodes();
        let left = tree.child_of(tree.root_idx(), Side::Left);
        tree.get_node_by_idx_mut(left).key = 25;

        assert_eq!(tree.validate(), Err(InvariantViolation::KeyOutOfOrder));
    }

    #[test]
    #[should_panic(expected = "red node with a red child after insertion")]
    pub fn mutations_report_broken_invariants() {
        let mut tree = three_nodes();
        let left = tree.child_of(tree.root_idx(), Side::Left);
        let right = tree.child_of(tree.root_idx(), Side::Right);
        tree.set_color(left, NodeColor::Black);
        tree.set_color(right, NodeColor::Black);
        tree.insert(5).unwrap();
        tree.set_color(left, NodeColor::Red);

        tree.insert(40).unwrap();
    }
}
