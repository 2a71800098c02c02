//! Bucket array and the prime capacity schedule it grows along.

use crate::error::TableError;

slotmap::new_key_type! {
    /// Arena key of a chain node.
    pub(crate) struct NodeKey;
}

/// Every capacity a bucket array may take, ascending.
pub const PRIME_SCHEDULE: [usize; 28] = [
    53, 97, 193, 389, 769, 1543, 3079, 6151, 12289, 24593, 49157, 98317, 196613, 393241, 786433,
    1572869, 3145739, 6291469, 12582917, 25165843, 50331653, 100663319, 201326611, 402653189,
    805306457, 1610612741, 3221225473, 4294967291,
];

/// Largest capacity in the schedule.
pub const MAX_BUCKETS: usize = PRIME_SCHEDULE[PRIME_SCHEDULE.len() - 1];

/// Smallest scheduled capacity `>= requested`, saturating at [`MAX_BUCKETS`].
pub fn next_capacity(requested: usize) -> usize {
    let pos = PRIME_SCHEDULE.partition_point(|&p| p < requested);
    PRIME_SCHEDULE.get(pos).copied().unwrap_or(MAX_BUCKETS)
}

/// Bucket a hash falls into for a given capacity.
#[inline]
pub fn bucket_index(hash: u64, capacity: usize) -> usize {
    (hash % capacity as u64) as usize
}

/// Chain heads, one slot per bucket. Holds navigation only; nodes live in
/// the table's arena.
#[derive(Clone, Debug)]
pub(crate) struct Buckets {
    heads: Vec<Option<NodeKey>>,
}

impl Buckets {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            heads: vec![None; capacity],
        }
    }

    /// Allocates `capacity` empty slots, reporting allocation failure.
    pub(crate) fn try_new(capacity: usize) -> Result<Self, TableError> {
        let mut heads = Vec::new();
        heads.try_reserve_exact(capacity)?;
        heads.resize(capacity, None);
        Ok(Self { heads })
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.heads.len()
    }

    #[inline]
    pub(crate) fn head(&self, bucket: usize) -> Option<NodeKey> {
        self.heads[bucket]
    }

    #[inline]
    pub(crate) fn set_head(&mut self, bucket: usize, head: Option<NodeKey>) {
        self.heads[bucket] = head;
    }

    /// Head and index of the first non-empty bucket at or after `from`.
    pub(crate) fn first_occupied_from(&self, from: usize) -> Option<(NodeKey, usize)> {
        self.heads
            .get(from..)?
            .iter()
            .enumerate()
            .find_map(|(i, h)| h.map(|k| (k, from + i)))
    }

    pub(crate) fn clear(&mut self) {
        self.heads.fill(None);
    }
}
