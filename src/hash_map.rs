//! HashMap: key/value front end over [`HashTable`] storing `(K, M)` pairs.

use crate::cursor::{self, Cursor};
use crate::error::TableError;
use crate::hash_table::HashTable;
use crate::key::{DefaultEq, First};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_map::DefaultHashBuilder;

/// The table behind a [`HashMap`].
pub type MapTable<K, M, S> = HashTable<(K, M), K, S, First, DefaultEq>;

/// Map with unique keys. Inserting an existing key keeps the stored value.
#[derive(Clone)]
pub struct HashMap<K, M, S = DefaultHashBuilder> {
    table: MapTable<K, M, S>,
}

impl<K, M> HashMap<K, M> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(bucket_hint: usize) -> Self {
        Self {
            table: HashTable::with_capacity(bucket_hint),
        }
    }
}

impl<K, M> Default for HashMap<K, M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, M, S> HashMap<K, M, S> {
    pub fn with_capacity_and_hasher(bucket_hint: usize, hasher: S) -> Self {
        Self {
            table: HashTable::with_capacity_and_hasher(bucket_hint, hasher),
        }
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Most entries a map can hold.
    pub fn max_len(&self) -> usize {
        self.table.max_len()
    }

    pub fn clear(&mut self) {
        self.table.clear();
    }

    pub fn bucket_count(&self) -> usize {
        self.table.bucket_count()
    }

    pub fn max_bucket_count(&self) -> usize {
        self.table.max_bucket_count()
    }

    pub fn bucket_size(&self, bucket: usize) -> usize {
        self.table.bucket_size(bucket)
    }

    pub fn load_factor(&self) -> f32 {
        self.table.load_factor()
    }

    pub fn max_load_factor(&self) -> f32 {
        self.table.max_load_factor()
    }

    pub fn set_max_load_factor(&mut self, factor: f32) {
        self.table.set_max_load_factor(factor);
    }

    /// Entries in bucket order.
    pub fn iter(&self) -> Iter<'_, K, M> {
        Iter {
            inner: self.table.iter(),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &M> + '_ {
        self.iter().map(|(_, m)| m)
    }

    /// The underlying table, for cursor traversal and bucket introspection.
    pub fn table(&self) -> &MapTable<K, M, S> {
        &self.table
    }

    /// Mutable access to the underlying table, e.g. for
    /// [`HashTable::erase_at`]. Stored keys must not be altered.
    pub fn table_mut(&mut self) -> &mut MapTable<K, M, S> {
        &mut self.table
    }
}

impl<K, M, S> HashMap<K, M, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Stores `value` under `key` unless `key` is present. Returns a cursor
    /// to the stored entry and whether the pair was inserted.
    pub fn insert(&mut self, key: K, value: M) -> Result<(Cursor, bool), TableError> {
        self.table.insert_unique((key, value))
    }

    /// Inserts all pairs with one up-front growth step; returns how many
    /// keys were new.
    pub fn insert_all<I>(&mut self, pairs: I) -> Result<usize, TableError>
    where
        I: IntoIterator<Item = (K, M)>,
        I::IntoIter: ExactSizeIterator,
    {
        self.table.insert_unique_all(pairs)
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&M>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get_key_value(key).map(|(_, m)| m)
    }

    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &M)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let cursor = self.table.find_borrowed(key);
        self.table.get_at(cursor).map(|(k, m)| (k, m))
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut M>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let cursor = self.table.find_borrowed(key);
        self.table.get_at_mut(cursor).map(|(_, m)| m)
    }

    /// Value under `key`, inserting `M::default()` first when absent.
    pub fn get_or_insert_default(&mut self, key: K) -> Result<&mut M, TableError>
    where
        M: Default,
    {
        self.table
            .find_or_insert((key, M::default()))
            .map(|(_, m)| m)
    }

    pub fn find<Q>(&self, key: &Q) -> Cursor
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.find_borrowed(key)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        !self.find(key).is_end()
    }

    /// 0 or 1; keys are unique.
    pub fn count<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        usize::from(self.contains_key(key))
    }

    pub fn bucket<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.bucket_borrowed(key)
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<M>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.remove_borrowed(key).map(|(_, m)| m)
    }

    /// Removes `key`; returns how many entries were removed (0 or 1).
    pub fn erase<Q>(&mut self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        usize::from(self.remove(key).is_some())
    }
}

impl<K: fmt::Debug, M: fmt::Debug, S> fmt::Debug for HashMap<K, M, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Iterator over `(&K, &M)` in bucket order.
pub struct Iter<'a, K, M> {
    inner: cursor::Iter<'a, (K, M)>,
}

impl<'a, K, M> Iterator for Iter<'a, K, M> {
    type Item = (&'a K, &'a M);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, m)| (k, m))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, M> ExactSizeIterator for Iter<'_, K, M> {}

impl<'a, K, M, S> IntoIterator for &'a HashMap<K, M, S> {
    type Item = (&'a K, &'a M);
    type IntoIter = Iter<'a, K, M>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
