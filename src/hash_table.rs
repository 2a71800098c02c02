//! HashTable: separate-chaining storage with unique keys.
//!
//! Values live in a generational node arena; each bucket slot holds the key
//! of its chain head and each node the key of its successor. Growth relinks
//! existing nodes into a fresh bucket array and never moves a value.

use crate::buckets::{bucket_index, next_capacity, Buckets, NodeKey, MAX_BUCKETS};
use crate::cursor::{step, Cursor, Iter};
use crate::error::TableError;
use crate::key::{DefaultEq, ExtractKey, Identity, KeyEq};
use crate::reentrancy::ReentrancyCheck;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::marker::PhantomData;
use hashbrown::hash_map::DefaultHashBuilder;
use log::{debug, trace};
use slotmap::SlotMap;

/// slotmap refuses to hold `u32::MAX` live entries.
const MAX_NODES: usize = (u32::MAX - 1) as usize;

#[derive(Debug)]
pub(crate) struct Node<V> {
    pub(crate) value: V,
    pub(crate) next: Option<NodeKey>,
}

/// A hash table of `V` values keyed by `K`, with pluggable hashing (`S`),
/// key extraction (`X`) and key equality (`E`).
///
/// At most one value per key is stored; inserting a value whose key is
/// already present leaves the table untouched and reports the existing
/// entry. The bucket count always comes from
/// [`PRIME_SCHEDULE`](crate::buckets::PRIME_SCHEDULE).
pub struct HashTable<V, K: ?Sized, S = DefaultHashBuilder, X = Identity, E = DefaultEq> {
    hasher: S,
    extract: X,
    key_eq: E,
    buckets: Buckets,
    nodes: SlotMap<NodeKey, Node<V>>,
    max_load_factor: f32,
    reentrancy: ReentrancyCheck,
    _key: PhantomData<fn(&K)>,
}

struct Chain<'a, V> {
    nodes: &'a SlotMap<NodeKey, Node<V>>,
    cur: Option<NodeKey>,
}

impl<'a, V> Iterator for Chain<'a, V> {
    type Item = (NodeKey, &'a Node<V>);

    fn next(&mut self) -> Option<Self::Item> {
        let k = self.cur?;
        let node = self.nodes.get(k)?;
        self.cur = node.next;
        Some((k, node))
    }
}

impl<V, K: ?Sized, S: Default, X: Default, E: Default> HashTable<V, K, S, X, E> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Empty table whose bucket count is the first scheduled capacity
    /// `>= bucket_hint`.
    pub fn with_capacity(bucket_hint: usize) -> Self {
        Self::with_parts(bucket_hint, S::default(), X::default(), E::default())
    }
}

impl<V, K: ?Sized, S, X: Default, E: Default> HashTable<V, K, S, X, E> {
    pub fn with_capacity_and_hasher(bucket_hint: usize, hasher: S) -> Self {
        Self::with_parts(bucket_hint, hasher, X::default(), E::default())
    }
}

impl<V, K: ?Sized, S: Default, X: Default, E: Default> Default for HashTable<V, K, S, X, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, K: ?Sized, S, X, E> HashTable<V, K, S, X, E> {
    pub fn with_parts(bucket_hint: usize, hasher: S, extract: X, key_eq: E) -> Self {
        Self {
            hasher,
            extract,
            key_eq,
            buckets: Buckets::new(next_capacity(bucket_hint)),
            nodes: SlotMap::with_key(),
            max_load_factor: 1.0,
            reentrancy: ReentrancyCheck::new(),
            _key: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Most values a table can hold.
    pub fn max_len(&self) -> usize {
        MAX_NODES
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn max_bucket_count(&self) -> usize {
        MAX_BUCKETS
    }

    /// Chain length of `bucket`.
    ///
    /// # Panics
    /// If `bucket >= self.bucket_count()`.
    pub fn bucket_size(&self, bucket: usize) -> usize {
        self.chain(bucket).count()
    }

    pub fn load_factor(&self) -> f32 {
        self.len() as f32 / self.bucket_count() as f32
    }

    pub fn max_load_factor(&self) -> f32 {
        self.max_load_factor
    }

    /// Records the advisory load factor. Growth is driven by element count
    /// alone, so this never resizes.
    pub fn set_max_load_factor(&mut self, factor: f32) {
        debug_assert!(factor > 0.0, "load factor must be positive");
        self.max_load_factor = factor;
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    /// Cursor at the head of the first occupied bucket, or [`Cursor::END`].
    pub fn begin(&self) -> Cursor {
        Cursor {
            pos: self.buckets.first_occupied_from(0),
        }
    }

    pub fn end(&self) -> Cursor {
        Cursor::END
    }

    /// Cursor following `cursor`. The end cursor advances to itself.
    pub fn advance(&self, cursor: Cursor) -> Cursor {
        Cursor {
            pos: cursor
                .pos
                .and_then(|(node, bucket)| step(&self.nodes, &self.buckets, node, bucket)),
        }
    }

    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            nodes: &self.nodes,
            buckets: &self.buckets,
            pos: self.buckets.first_occupied_from(0),
            remaining: self.len(),
        }
    }

    pub fn get_at(&self, cursor: Cursor) -> Option<&V> {
        let (node, _) = cursor.pos?;
        self.nodes.get(node).map(|n| &n.value)
    }

    /// See [`Cursor::value_mut`] for the constraint on key mutation.
    pub fn get_at_mut(&mut self, cursor: Cursor) -> Option<&mut V> {
        let (node, _) = cursor.pos?;
        self.nodes.get_mut(node).map(|n| &mut n.value)
    }

    /// Destroys every value. The bucket count is kept.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.buckets.clear();
    }

    /// Removes the value at `cursor` and returns the cursor that followed
    /// it, so `c = table.erase_at(c)` keeps a traversal going.
    pub fn erase_at(&mut self, cursor: Cursor) -> Cursor {
        let Some((node, bucket)) = cursor.pos else {
            return Cursor::END;
        };
        let next = self.advance(cursor);
        self.unlink_node(bucket, node);
        next
    }

    /// Removes every value in the traversal range `[first, last)` and
    /// returns `last`.
    ///
    /// `first` must not come after `last`.
    pub fn erase_range(&mut self, first: Cursor, last: Cursor) -> Cursor {
        if first == last {
            return last;
        }
        let Some((first_node, first_bucket)) = first.pos else {
            return last;
        };
        let (last_node, last_bucket) = match last.pos {
            Some((node, bucket)) => (Some(node), bucket),
            None => (None, self.buckets.len()),
        };
        debug_assert!(first_bucket <= last_bucket, "erase_range: first after last");
        if first_bucket > last_bucket {
            return last;
        }

        let before = self.len();
        if first_bucket == last_bucket {
            self.erase_segment(first_bucket, first_node, last_node);
        } else {
            self.erase_segment(first_bucket, first_node, None);
            for bucket in first_bucket + 1..last_bucket {
                self.clear_bucket(bucket);
            }
            if let Some(last_node) = last_node {
                if let Some(head) = self.buckets.head(last_bucket) {
                    self.erase_segment(last_bucket, head, Some(last_node));
                }
            }
        }
        trace!(
            "erase_range removed {} values across buckets {first_bucket}..={last_bucket}",
            before - self.len()
        );
        last
    }

    fn chain(&self, bucket: usize) -> Chain<'_, V> {
        Chain {
            nodes: &self.nodes,
            cur: self.buckets.head(bucket),
        }
    }

    fn relink(&mut self, bucket: usize, prev: Option<NodeKey>, next: Option<NodeKey>) {
        match prev.and_then(|p| self.nodes.get_mut(p)) {
            Some(prev) => prev.next = next,
            None => self.buckets.set_head(bucket, next),
        }
    }

    /// `Some(predecessor)` when `target` is linked in `bucket`.
    fn predecessor(&self, bucket: usize, target: NodeKey) -> Option<Option<NodeKey>> {
        let mut prev = None;
        for (k, _) in self.chain(bucket) {
            if k == target {
                return Some(prev);
            }
            prev = Some(k);
        }
        None
    }

    fn unlink_node(&mut self, bucket: usize, target: NodeKey) -> Option<V> {
        let prev = self.predecessor(bucket, target)?;
        let node = self.nodes.remove(target)?;
        self.relink(bucket, prev, node.next);
        Some(node.value)
    }

    /// Removes the chain run starting at `from` up to, not including,
    /// `until` (or to the chain's end).
    fn erase_segment(&mut self, bucket: usize, from: NodeKey, until: Option<NodeKey>) {
        let Some(prev) = self.predecessor(bucket, from) else {
            return;
        };
        let mut cur = Some(from);
        while let Some(k) = cur {
            if Some(k) == until {
                break;
            }
            cur = self.nodes.remove(k).and_then(|n| n.next);
        }
        self.relink(bucket, prev, cur);
    }

    fn clear_bucket(&mut self, bucket: usize) {
        let mut cur = self.buckets.head(bucket);
        while let Some(k) = cur {
            cur = self.nodes.remove(k).and_then(|n| n.next);
        }
        self.buckets.set_head(bucket, None);
    }
}

impl<V, K: ?Sized, S, X: ExtractKey<V, K>, E> HashTable<V, K, S, X, E> {
    pub fn key_at(&self, cursor: Cursor) -> Option<&K> {
        self.get_at(cursor).map(|v| self.extract.key(v))
    }
}

impl<V, K, S, X, E> HashTable<V, K, S, X, E>
where
    K: ?Sized + Hash,
    S: BuildHasher,
    X: ExtractKey<V, K>,
    E: KeyEq<K>,
{
    #[inline]
    fn bucket_for(&self, key: &K, capacity: usize) -> usize {
        bucket_index(self.hasher.hash_one(key), capacity)
    }

    fn find_in_bucket(&self, bucket: usize, key: &K) -> Option<NodeKey> {
        self.chain(bucket)
            .find(|(_, node)| self.key_eq.eq(self.extract.key(&node.value), key))
            .map(|(k, _)| k)
    }

    /// Bucket index `key` maps to at the current bucket count.
    pub fn bucket(&self, key: &K) -> usize {
        let _g = self.reentrancy.enter();
        self.bucket_for(key, self.buckets.len())
    }

    /// Cursor to the value with `key`, or [`Cursor::END`].
    pub fn find(&self, key: &K) -> Cursor {
        let _g = self.reentrancy.enter();
        let bucket = self.bucket_for(key, self.buckets.len());
        match self.find_in_bucket(bucket, key) {
            Some(node) => Cursor::at(node, bucket),
            None => Cursor::END,
        }
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        let cursor = self.find(key);
        self.get_at(cursor)
    }

    /// The value with `key`. The key part must stay as it is.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let cursor = self.find(key);
        self.get_at_mut(cursor)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        !self.find(key).is_end()
    }

    /// 0 or 1; keys are unique.
    pub fn count(&self, key: &K) -> usize {
        usize::from(self.contains_key(key))
    }

    /// Inserts `value` unless its key is already present.
    ///
    /// Returns a cursor to the stored value and whether `value` was
    /// inserted. On a duplicate the cursor points at the existing value and
    /// `value` is dropped. The bucket array grows, if needed, before the
    /// key is looked up.
    pub fn insert_unique(&mut self, value: V) -> Result<(Cursor, bool), TableError> {
        self.resize(self.len().saturating_add(1))?;
        let (node, bucket, inserted) = self.insert_node(value)?;
        Ok((Cursor::at(node, bucket), inserted))
    }

    /// Value whose key matches `value`'s, inserting `value` when absent.
    /// Growth works as in [`insert_unique`](Self::insert_unique).
    pub fn find_or_insert(&mut self, value: V) -> Result<&mut V, TableError> {
        self.resize(self.len().saturating_add(1))?;
        let (node, _, _) = self.insert_node(value)?;
        Ok(&mut self.nodes[node].value)
    }

    /// Inserts every value with a single growth step sized for all of them.
    /// Returns how many were new.
    ///
    /// Values are inserted one after another; if an insertion fails the
    /// ones before it stay in the table.
    pub fn insert_unique_all<I>(&mut self, values: I) -> Result<usize, TableError>
    where
        I: IntoIterator<Item = V>,
        I::IntoIter: ExactSizeIterator,
    {
        let values = values.into_iter();
        let incoming = values.len();
        self.resize(self.len().saturating_add(incoming))?;
        trace!(
            "bulk insert of {incoming} values into {} buckets",
            self.buckets.len()
        );

        let mut inserted = 0;
        for value in values {
            if self.insert_node(value)?.2 {
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    /// Looks up `value`'s key and prepends a new node when it is absent.
    /// Never grows the bucket array.
    fn insert_node(&mut self, value: V) -> Result<(NodeKey, usize, bool), TableError> {
        let key = self.extract.key(&value);
        let bucket = self.bucket_for(key, self.buckets.len());
        if let Some(existing) = self.find_in_bucket(bucket, key) {
            return Ok((existing, bucket, false));
        }
        if self.nodes.len() >= MAX_NODES {
            return Err(TableError::CapacityOverflow(MAX_NODES));
        }

        let next = self.buckets.head(bucket);
        let node = self.nodes.insert(Node { value, next });
        self.buckets.set_head(bucket, Some(node));
        Ok((node, bucket, true))
    }

    /// Removes the value with `key`; returns how many were removed (0 or 1).
    pub fn erase(&mut self, key: &K) -> usize {
        usize::from(self.remove(key).is_some())
    }

    /// Removes and returns the value with `key`.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let bucket = self.bucket_for(key, self.buckets.len());
        let node = self.find_in_bucket(bucket, key)?;
        self.unlink_node(bucket, node)
    }

    /// Grows the bucket array when `requested` exceeds the bucket count.
    ///
    /// The new count is the first scheduled capacity `>= requested`. Nodes
    /// are relinked, not copied; every outstanding cursor is invalidated.
    /// On allocation failure the table is unchanged.
    pub fn resize(&mut self, requested: usize) -> Result<(), TableError> {
        let current = self.buckets.len();
        if requested <= current {
            return Ok(());
        }
        let capacity = next_capacity(requested);
        if capacity <= current {
            return Ok(());
        }

        let mut fresh = Buckets::try_new(capacity)?;
        for bucket in 0..current {
            let mut cur = self.buckets.head(bucket);
            while let Some(k) = cur {
                let Some(node) = self.nodes.get_mut(k) else {
                    break;
                };
                cur = node.next;
                let target = bucket_index(
                    self.hasher.hash_one(self.extract.key(&node.value)),
                    capacity,
                );
                node.next = fresh.head(target);
                fresh.set_head(target, Some(k));
            }
        }
        self.buckets = fresh;
        debug!(
            "hash table grew from {current} to {capacity} buckets ({} values)",
            self.len()
        );
        Ok(())
    }
}

/// Lookups by a borrowed form of the key (`String` keys queried with `&str`).
///
/// Only available with [`DefaultEq`]: a custom equality has no way to
/// compare a stored key against some other `Q`.
impl<V, K, S, X> HashTable<V, K, S, X, DefaultEq>
where
    K: ?Sized + Hash + Eq,
    S: BuildHasher,
    X: ExtractKey<V, K>,
{
    fn locate<Q>(&self, q: &Q) -> (usize, Option<NodeKey>)
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let bucket = bucket_index(self.hasher.hash_one(q), self.buckets.len());
        let node = self
            .chain(bucket)
            .find(|(_, node)| Borrow::<Q>::borrow(self.extract.key(&node.value)) == q)
            .map(|(k, _)| k);
        (bucket, node)
    }

    /// [`find`](Self::find) by a borrowed form of the key.
    pub fn find_borrowed<Q>(&self, q: &Q) -> Cursor
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        match self.locate(q) {
            (bucket, Some(node)) => Cursor::at(node, bucket),
            (_, None) => Cursor::END,
        }
    }

    pub fn bucket_borrowed<Q>(&self, q: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        bucket_index(self.hasher.hash_one(q), self.buckets.len())
    }

    /// [`remove`](Self::remove) by a borrowed form of the key.
    pub fn remove_borrowed<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let (bucket, node) = self.locate(q);
        self.unlink_node(bucket, node?)
    }
}

impl<V: Clone, K: ?Sized, S: Clone, X: Clone, E: Clone> Clone for HashTable<V, K, S, X, E> {
    /// Deep copy with the same bucket count and the same chain order in
    /// every bucket.
    fn clone(&self) -> Self {
        let mut nodes = SlotMap::with_capacity_and_key(self.nodes.len());
        let mut buckets = Buckets::new(self.buckets.len());
        for bucket in 0..self.buckets.len() {
            let mut tail: Option<NodeKey> = None;
            for (_, node) in self.chain(bucket) {
                let k = nodes.insert(Node {
                    value: node.value.clone(),
                    next: None,
                });
                match tail.and_then(|t| nodes.get_mut(t)) {
                    Some(prev) => prev.next = Some(k),
                    None => buckets.set_head(bucket, Some(k)),
                }
                tail = Some(k);
            }
        }
        Self {
            hasher: self.hasher.clone(),
            extract: self.extract.clone(),
            key_eq: self.key_eq.clone(),
            buckets,
            nodes,
            max_load_factor: self.max_load_factor,
            reentrancy: ReentrancyCheck::new(),
            _key: PhantomData,
        }
    }
}

impl<V: fmt::Debug, K: ?Sized, S, X, E> fmt::Debug for HashTable<V, K, S, X, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<'a, V, K: ?Sized, S, X, E> IntoIterator for &'a HashTable<V, K, S, X, E> {
    type Item = &'a V;
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::First;
    use std::collections::BTreeSet;
    use std::hash::Hasher;

    type PairTable = HashTable<(u32, &'static str), u32, DefaultHashBuilder, First>;

    /// Hashes every key to the integer value itself, so bucket placement
    /// is predictable: key `k` lands in bucket `k % bucket_count`.
    #[derive(Clone, Default)]
    struct IdentityBuildHasher;
    struct IdentityHasher(u64);
    impl BuildHasher for IdentityBuildHasher {
        type Hasher = IdentityHasher;
        fn build_hasher(&self) -> Self::Hasher {
            IdentityHasher(0)
        }
    }
    impl Hasher for IdentityHasher {
        fn write(&mut self, bytes: &[u8]) {
            for b in bytes {
                self.0 = (self.0 << 8) | u64::from(*b);
            }
        }
        fn write_u32(&mut self, n: u32) {
            self.0 = u64::from(n);
        }
        fn finish(&self) -> u64 {
            self.0
        }
    }

    type IdTable = HashTable<u32, u32, IdentityBuildHasher>;

    fn id_table(keys: &[u32]) -> IdTable {
        let mut t = IdTable::new();
        for &k in keys {
            assert!(t.insert_unique(k).unwrap().1);
        }
        t
    }

    /// Invariant: every node reachable from bucket `i` hashes to `i`, and the
    /// reachable node count equals `len()`.
    fn assert_structure<V, K, S, X, E>(t: &HashTable<V, K, S, X, E>)
    where
        K: ?Sized + Hash,
        S: BuildHasher,
        X: ExtractKey<V, K>,
        E: KeyEq<K>,
    {
        let mut reachable = 0;
        for bucket in 0..t.bucket_count() {
            for (_, node) in t.chain(bucket) {
                assert_eq!(t.bucket(t.extract.key(&node.value)), bucket);
                reachable += 1;
            }
        }
        assert_eq!(reachable, t.len());
    }

    #[test]
    fn new_table_uses_first_scheduled_capacity() {
        let t: PairTable = HashTable::with_capacity(8);
        assert_eq!(t.bucket_count(), 53);
        assert_eq!(t.len(), 0);
        assert!(t.is_empty());
        assert!(t.begin().is_end());
        assert_eq!(t.begin(), t.end());
        assert_eq!(t.max_bucket_count(), MAX_BUCKETS);

        let t: PairTable = HashTable::with_capacity(100);
        assert_eq!(t.bucket_count(), 193);
    }

    /// Invariant: a duplicate insert returns the existing entry and leaves
    /// the stored value alone.
    #[test]
    fn duplicate_insert_keeps_first_value() {
        let mut t = PairTable::new();
        let (c1, inserted) = t.insert_unique((1, "a")).unwrap();
        assert!(inserted);
        let (c2, inserted) = t.insert_unique((1, "b")).unwrap();
        assert!(!inserted);
        assert_eq!(c1, c2);
        assert_eq!(c2.value(&t), Some(&(1, "a")));
        assert_eq!(t.len(), 1);
        assert_eq!(t.count(&1), 1);
        assert_eq!(t.count(&2), 0);
    }

    /// Invariant: new entries are prepended, so the newest value in a
    /// bucket is found first during traversal.
    #[test]
    fn insert_prepends_to_chain() {
        let t = id_table(&[5, 58, 111]);
        assert_eq!(t.bucket_size(5), 3);
        let order: Vec<u32> = t.iter().copied().collect();
        assert_eq!(order, vec![111, 58, 5]);
        assert_structure(&t);
    }

    /// Invariant: traversal is bucket-ascending, then chain order.
    #[test]
    fn iteration_order_follows_buckets() {
        let t = id_table(&[40, 2, 55, 17]);
        // 55 % 53 == 2, inserted after 2, so it heads bucket 2.
        let order: Vec<u32> = t.iter().copied().collect();
        assert_eq!(order, vec![55, 2, 17, 40]);
        assert_eq!(t.iter().len(), 4);

        let mut via_cursor = Vec::new();
        let mut c = t.begin();
        while c != t.end() {
            via_cursor.push(*c.value(&t).unwrap());
            c = c.next(&t);
        }
        assert_eq!(via_cursor, order);
    }

    /// Invariant: growth happens when the element count would pass the
    /// bucket count, and relinks without losing entries.
    #[test]
    fn growth_preserves_entries() {
        let mut t = IdTable::new();
        for k in 0..53 {
            t.insert_unique(k).unwrap();
        }
        assert_eq!(t.bucket_count(), 53);
        t.insert_unique(53).unwrap();
        assert_eq!(t.bucket_count(), 97);
        assert_eq!(t.len(), 54);
        for k in 0..54 {
            assert!(t.contains_key(&k), "missing {k}");
        }
        assert_structure(&t);
    }

    #[test]
    fn resize_jumps_to_satisfying_capacity() {
        let mut t = IdTable::new();
        t.resize(1000).unwrap();
        assert_eq!(t.bucket_count(), 1543);
        t.resize(10).unwrap();
        assert_eq!(t.bucket_count(), 1543);
    }

    /// Invariant: a growth step whose bucket array cannot be allocated
    /// reports the failure and leaves buckets and entries as they were.
    #[test]
    fn failed_growth_leaves_table_unchanged() {
        let keys = [1, 2, 3, 54];
        let mut t = id_table(&keys);
        assert!(matches!(t.resize(usize::MAX), Err(TableError::Alloc(_))));
        assert_eq!(t.bucket_count(), 53);
        assert_eq!(t.len(), keys.len());
        for k in keys {
            assert!(t.contains_key(&k), "missing {k}");
        }
        assert_structure(&t);
    }

    #[test]
    fn borrowed_lookup_with_str() {
        let mut t: HashTable<String, String> = HashTable::new();
        t.insert_unique("alpha".to_string()).unwrap();
        t.insert_unique("beta".to_string()).unwrap();

        let c = t.find_borrowed("alpha");
        assert_eq!(c.value(&t).map(String::as_str), Some("alpha"));
        assert_eq!(c, t.find(&"alpha".to_string()));
        assert!(t.find_borrowed("gamma").is_end());
        assert_eq!(t.bucket_borrowed("beta"), t.bucket(&"beta".to_string()));

        assert_eq!(t.remove_borrowed("beta").as_deref(), Some("beta"));
        assert_eq!(t.remove_borrowed("beta"), None);
        assert_eq!(t.len(), 1);
        assert_structure(&t);
    }

    #[test]
    fn bulk_insert_grows_once_and_counts_new() {
        let mut t = IdTable::new();
        t.insert_unique(3).unwrap();
        let inserted = t.insert_unique_all(vec![1, 2, 3, 4, 5, 100, 200]).unwrap();
        assert_eq!(inserted, 6);
        assert_eq!(t.len(), 7);
        assert_eq!(t.bucket_count(), 53);

        let inserted = t.insert_unique_all(1000..1200).unwrap();
        assert_eq!(inserted, 200);
        assert_eq!(t.bucket_count(), 389);
        assert_structure(&t);
    }

    /// Invariant: erasing a chain head, interior node and tail all keep the
    /// rest of the chain reachable.
    #[test]
    fn erase_by_key_relinks_chain() {
        // All in bucket 1; chain order 160, 107, 54, 1.
        let mut t = id_table(&[1, 54, 107, 160]);
        assert_eq!(t.erase(&160), 1);
        assert_eq!(t.iter().copied().collect::<Vec<_>>(), vec![107, 54, 1]);
        assert_eq!(t.erase(&54), 1);
        assert_eq!(t.iter().copied().collect::<Vec<_>>(), vec![107, 1]);
        assert_eq!(t.erase(&1), 1);
        assert_eq!(t.iter().copied().collect::<Vec<_>>(), vec![107]);
        assert_eq!(t.erase(&1), 0);
        assert_eq!(t.len(), 1);
        assert!(t.find(&1).is_end());
        assert_structure(&t);
    }

    #[test]
    fn erase_at_returns_successor() {
        let mut t = id_table(&[1, 54, 9]);
        let begin = t.begin();
        let expected = t.advance(begin);
        let next = t.erase_at(begin);
        assert_eq!(next, expected);
        assert_eq!(t.len(), 2);
        assert!(begin.value(&t).is_none());

        let mut c = t.begin();
        while !c.is_end() {
            c = t.erase_at(c);
        }
        assert!(t.is_empty());
        assert_eq!(t.erase_at(Cursor::END), Cursor::END);
    }

    /// Invariant: erasing one node leaves cursors to other nodes usable.
    #[test]
    fn erase_keeps_unrelated_cursors() {
        let mut t = id_table(&[1, 54, 107, 9]);
        let c54 = t.find(&54);
        let c9 = t.find(&9);
        t.erase(&107);
        t.erase(&1);
        assert_eq!(c54.value(&t), Some(&54));
        assert_eq!(c9.value(&t), Some(&9));
        assert_eq!(c54.next(&t), c9);
    }

    #[test]
    fn erase_range_within_one_bucket() {
        // Bucket 1 chain: 160, 107, 54, 1.
        let mut t = id_table(&[1, 54, 107, 160, 20]);
        let first = t.find(&107);
        let last = t.find(&1);
        let ret = t.erase_range(first, last);
        assert_eq!(ret, last);
        assert_eq!(t.iter().copied().collect::<Vec<_>>(), vec![160, 1, 20]);
        assert_structure(&t);
    }

    #[test]
    fn erase_range_across_buckets() {
        // Buckets: 1 -> [54, 1], 3 -> [3], 5 -> [58, 5], 7 -> [7].
        let mut t = id_table(&[1, 54, 3, 5, 58, 7]);
        let first = t.find(&1);
        let last = t.find(&5);
        t.erase_range(first, last);
        assert_eq!(t.iter().copied().collect::<Vec<_>>(), vec![54, 5, 7]);
        assert!(t.contains_key(&7));
        assert!(!t.contains_key(&58));
        assert!(!t.contains_key(&3));
        assert_eq!(t.len(), 3);
        assert_structure(&t);
    }

    #[test]
    fn erase_range_to_end_and_empty_range() {
        let mut t = id_table(&[1, 2, 3, 4]);
        let c = t.find(&3);
        assert_eq!(t.erase_range(c, c), c);
        assert_eq!(t.len(), 4);

        t.erase_range(c, t.end());
        assert_eq!(t.iter().copied().collect::<Vec<_>>(), vec![1, 2]);

        let (b, e) = (t.begin(), t.end());
        t.erase_range(b, e);
        assert!(t.is_empty());
        assert_eq!(t.bucket_count(), 53);
    }

    #[test]
    fn clear_keeps_bucket_count() {
        let mut t = id_table(&(0..100).collect::<Vec<_>>());
        let buckets = t.bucket_count();
        t.clear();
        assert!(t.is_empty());
        assert_eq!(t.bucket_count(), buckets);
        assert!(t.begin().is_end());
        assert!(t.insert_unique(7).unwrap().1);
    }

    /// Invariant: a clone mirrors bucket count and per-bucket chain order,
    /// and is independent of the source afterwards.
    #[test]
    fn clone_preserves_layout() {
        let mut t = id_table(&[1, 54, 107, 2, 60]);
        let copy = t.clone();
        assert_eq!(copy.bucket_count(), t.bucket_count());
        assert_eq!(
            copy.iter().collect::<Vec<_>>(),
            t.iter().collect::<Vec<_>>()
        );
        t.erase(&54);
        assert!(copy.contains_key(&54));
        assert_structure(&copy);

        let mut assigned = IdTable::new();
        assigned.insert_unique(999).unwrap();
        assigned.clone_from(&copy);
        assert!(!assigned.contains_key(&999));
        assert_eq!(assigned.len(), 5);
    }

    /// Invariant: `find_or_insert` hands back the stored value and only
    /// stores the candidate when the key is new.
    #[test]
    fn find_or_insert_returns_stored_value() {
        let mut t = PairTable::new();
        t.find_or_insert((1, "one")).unwrap().1 = "uno";
        let v = t.find_or_insert((1, "ignored")).unwrap();
        assert_eq!(*v, (1, "uno"));
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn load_factor_is_advisory() {
        let mut t = id_table(&[1, 2, 3]);
        assert!((t.load_factor() - 3.0 / 53.0).abs() < f32::EPSILON);
        assert_eq!(t.max_load_factor(), 1.0);
        t.set_max_load_factor(0.01);
        assert_eq!(t.max_load_factor(), 0.01);
        assert_eq!(t.bucket_count(), 53);
    }

    #[test]
    fn mutable_access_through_cursor() {
        let mut t = PairTable::new();
        let (c, _) = t.insert_unique((4, "four")).unwrap();
        *c.value_mut(&mut t).unwrap() = (4, "FOUR");
        assert_eq!(t.get(&4), Some(&(4, "FOUR")));
        assert_eq!(c.key(&t), Some(&4));
        t.get_mut(&4).unwrap().1 = "iv";
        assert_eq!(t.remove(&4), Some((4, "iv")));
        assert!(c.value(&t).is_none());
    }

    /// Invariant: custom extractor and equality functions decide key
    /// identity, with an unsized key type.
    #[test]
    fn custom_key_capabilities() {
        #[derive(Clone, Default)]
        struct CaseFold;
        struct CaseFoldHasher(std::collections::hash_map::DefaultHasher);
        impl BuildHasher for CaseFold {
            type Hasher = CaseFoldHasher;
            fn build_hasher(&self) -> Self::Hasher {
                CaseFoldHasher(Default::default())
            }
        }
        impl Hasher for CaseFoldHasher {
            fn write(&mut self, bytes: &[u8]) {
                for b in bytes {
                    self.0.write_u8(b.to_ascii_lowercase());
                }
            }
            fn finish(&self) -> u64 {
                self.0.finish()
            }
        }
        fn name(v: &(String, u8)) -> &str {
            &v.0
        }
        fn ignore_case(a: &str, b: &str) -> bool {
            a.eq_ignore_ascii_case(b)
        }

        type Extract = fn(&(String, u8)) -> &str;
        type Equal = fn(&str, &str) -> bool;
        let mut t: HashTable<(String, u8), str, CaseFold, Extract, Equal> =
            HashTable::with_parts(0, CaseFold, name, ignore_case);
        assert!(t.insert_unique(("Alpha".to_string(), 1)).unwrap().1);
        assert!(!t.insert_unique(("ALPHA".to_string(), 2)).unwrap().1);
        assert!(t.insert_unique(("beta".to_string(), 3)).unwrap().1);
        assert_eq!(t.get("alpha"), Some(&("Alpha".to_string(), 1)));
        assert_eq!(t.bucket("BETA"), t.bucket("beta"));
        assert_eq!(t.erase("BeTa"), 1);
        assert_eq!(t.len(), 1);
        assert_structure(&t);
    }

    #[cfg(debug_assertions)]
    #[test]
    fn reentrant_find_from_equality_panics() {
        use std::cell::Cell;
        use std::rc::Rc;

        type TableRef = Rc<Cell<*const HashTable<u32, u32, IdentityBuildHasher, Identity, Eqf>>>;
        struct Eqf(TableRef);
        impl KeyEq<u32> for Eqf {
            fn eq(&self, a: &u32, b: &u32) -> bool {
                let p = self.0.get();
                if !p.is_null() {
                    // Re-enter the table while a lookup is in progress.
                    let _ = unsafe { (*p).find(&0) };
                }
                a == b
            }
        }

        let table_ref: TableRef = Rc::new(Cell::new(core::ptr::null()));
        let mut t: HashTable<u32, u32, _, _, _> =
            HashTable::with_parts(0, IdentityBuildHasher, Identity, Eqf(table_ref.clone()));
        t.insert_unique(1).unwrap();
        table_ref.set(&t as *const _);
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = t.find(&1);
        }));
        assert!(res.is_err(), "expected reentrancy to panic in debug builds");
    }

    #[test]
    fn debug_lists_values() {
        let t = id_table(&[3]);
        assert_eq!(format!("{t:?}"), "{3}");
        let seen: BTreeSet<u32> = (&t).into_iter().copied().collect();
        assert_eq!(seen, BTreeSet::from([3]));
    }
}
