use core::sync::atomic::{AtomicU64, Ordering};

use crate::NodeIndex;

static NEXT_TREE_ID: AtomicU64 = AtomicU64::new(0);

/// Identity of a single tree instance, stamped into every handle it hands out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct TreeId(u64);

impl TreeId {
    pub(crate) fn next() -> Self {
        Self(NEXT_TREE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Reference to one entry of an [`RbMultiset`](crate::RbMultiset).
///
/// Returned by `insert`, `find`, `min` and `max`, and consumed by `erase`.
/// A handle stays valid until its entry is erased or the tree is cleared or
/// destroyed. Afterwards every operation taking it reports
/// [`Error::StaleHandle`](crate::Error::StaleHandle), even if the underlying
/// cell has since been reused by a new entry.
///
/// Two handles compare equal only if they designate the same entry of the same
/// tree, so duplicate keys always yield distinct handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandle {
    pub(crate) tree: TreeId,
    pub(crate) index: NodeIndex,
    pub(crate) generation: u32,
}
