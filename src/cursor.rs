//! Traversal over a table: detached [`Cursor`] positions and the borrowing
//! [`Iter`].
//!
//! Both walk buckets in ascending index order and, within a bucket, follow
//! the chain from its head. A cursor stays usable across erasures of other
//! nodes; growing the bucket array invalidates every cursor.

use crate::buckets::{Buckets, NodeKey};
use crate::hash_table::{HashTable, Node};
use crate::key::ExtractKey;
use core::iter::FusedIterator;
use slotmap::SlotMap;

/// A position in a [`HashTable`]: one node, or the end sentinel.
///
/// Cursors do not borrow the table, so they can be handed back to
/// [`HashTable::erase_at`] and [`HashTable::erase_range`]. Reading through
/// a cursor whose node was erased yields `None`.
#[derive(Copy, Clone, Debug)]
pub struct Cursor {
    pub(crate) pos: Option<(NodeKey, usize)>,
}

impl Cursor {
    /// Past-the-last position. Equal to every other end cursor.
    pub const END: Cursor = Cursor { pos: None };

    #[inline]
    pub(crate) fn at(node: NodeKey, bucket: usize) -> Self {
        Self {
            pos: Some((node, bucket)),
        }
    }

    #[inline]
    pub fn is_end(&self) -> bool {
        self.pos.is_none()
    }

    /// Bucket the cursor's node lives in, `None` at the end.
    #[inline]
    pub fn bucket(&self) -> Option<usize> {
        self.pos.map(|(_, b)| b)
    }

    pub fn value<'a, V, K: ?Sized, S, X, E>(
        &self,
        table: &'a HashTable<V, K, S, X, E>,
    ) -> Option<&'a V> {
        table.get_at(*self)
    }

    /// Mutable access to the value. The key part must not change in a way
    /// that alters its hash or equality.
    pub fn value_mut<'a, V, K: ?Sized, S, X, E>(
        &self,
        table: &'a mut HashTable<V, K, S, X, E>,
    ) -> Option<&'a mut V> {
        table.get_at_mut(*self)
    }

    pub fn key<'a, V, K: ?Sized, S, X, E>(
        &self,
        table: &'a HashTable<V, K, S, X, E>,
    ) -> Option<&'a K>
    where
        X: ExtractKey<V, K>,
    {
        table.key_at(*self)
    }

    /// The position after this one.
    pub fn next<V, K: ?Sized, S, X, E>(&self, table: &HashTable<V, K, S, X, E>) -> Cursor {
        table.advance(*self)
    }
}

impl PartialEq for Cursor {
    fn eq(&self, other: &Self) -> bool {
        self.pos.map(|(n, _)| n) == other.pos.map(|(n, _)| n)
    }
}

impl Eq for Cursor {}

/// Moves one node forward: along the chain, else to the head of the next
/// occupied bucket.
pub(crate) fn step<V>(
    nodes: &SlotMap<NodeKey, Node<V>>,
    buckets: &Buckets,
    node: NodeKey,
    bucket: usize,
) -> Option<(NodeKey, usize)> {
    match nodes.get(node).and_then(|n| n.next) {
        Some(next) => Some((next, bucket)),
        None => buckets.first_occupied_from(bucket + 1),
    }
}

/// Borrowing iterator over every value in traversal order.
pub struct Iter<'a, V> {
    pub(crate) nodes: &'a SlotMap<NodeKey, Node<V>>,
    pub(crate) buckets: &'a Buckets,
    pub(crate) pos: Option<(NodeKey, usize)>,
    pub(crate) remaining: usize,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = &'a V;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let (node, bucket) = self.pos?;
        let value = &self.nodes.get(node)?.value;
        self.pos = step(self.nodes, self.buckets, node, bucket);
        self.remaining = self.remaining.saturating_sub(1);
        Some(value)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for Iter<'_, V> {}
impl<V> FusedIterator for Iter<'_, V> {}

impl<V> Clone for Iter<'_, V> {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes,
            buckets: self.buckets,
            pos: self.pos,
            remaining: self.remaining,
        }
    }
}
