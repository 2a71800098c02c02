//! Key extraction and key equality capabilities plugged into a table.
//!
//! Hashing uses `core::hash::BuildHasher`. Extraction and equality are the
//! two traits below; plain functions and closures implement both.

/// Projects the key out of a stored value.
pub trait ExtractKey<V, K: ?Sized> {
    fn key<'a>(&self, value: &'a V) -> &'a K;
}

/// Decides whether two keys are the same key.
pub trait KeyEq<K: ?Sized> {
    fn eq(&self, a: &K, b: &K) -> bool;
}

/// The value is its own key (set-style tables).
#[derive(Copy, Clone, Debug, Default)]
pub struct Identity;

impl<K> ExtractKey<K, K> for Identity {
    #[inline]
    fn key<'a>(&self, value: &'a K) -> &'a K {
        value
    }
}

/// Key is the first field of a `(K, M)` pair (map-style tables).
#[derive(Copy, Clone, Debug, Default)]
pub struct First;

impl<K, M> ExtractKey<(K, M), K> for First {
    #[inline]
    fn key<'a>(&self, value: &'a (K, M)) -> &'a K {
        &value.0
    }
}

impl<V, K: ?Sized, F> ExtractKey<V, K> for F
where
    F: Fn(&V) -> &K,
{
    #[inline]
    fn key<'a>(&self, value: &'a V) -> &'a K {
        self(value)
    }
}

/// Equality through `K: Eq`.
#[derive(Copy, Clone, Debug, Default)]
pub struct DefaultEq;

impl<K: ?Sized + Eq> KeyEq<K> for DefaultEq {
    #[inline]
    fn eq(&self, a: &K, b: &K) -> bool {
        a == b
    }
}

impl<K: ?Sized, F> KeyEq<K> for F
where
    F: Fn(&K, &K) -> bool,
{
    #[inline]
    fn eq(&self, a: &K, b: &K) -> bool {
        self(a, b)
    }
}
