//! chained-hashtable: a single-threaded, separate-chaining hash table with
//! unique keys, prime-scheduled growth and cursor-based erasure.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: an associative container whose structure (buckets, chains,
//!   growth) is explicit and inspectable, with the map as a thin layer on
//!   top.
//! - Layers:
//!   - Buckets + size schedule: the array of chain heads and the fixed,
//!     ascending list of prime capacities it may take.
//!   - HashTable<V, K, S, X, E>: owns every value as a chain node; insert,
//!     find, erase (by key, cursor or cursor range), clear, resize, copy.
//!   - HashMap<K, M, S>: `(K, M)` pairs over HashTable with `First` as the
//!     key extractor.
//!
//! Storage
//! - Nodes live in a `slotmap` arena. Bucket slots and `next` links hold
//!   arena keys, never pointers; an erased node's key stops resolving
//!   because of the slot generation.
//! - New nodes are prepended to their chain, so the newest value in a
//!   bucket is compared first.
//! - Growth allocates a fresh bucket array, relinks every node into it and
//!   drops the old one. Values never move.
//!
//! Growth policy
//! - Before each insert the table asks for room for `len + 1` values; bulk
//!   inserts ask once for `len + n`. When that exceeds the bucket count the
//!   array jumps to the first scheduled capacity at or above the request.
//! - `max_load_factor` is recorded but advisory; only element count drives
//!   growth.
//!
//! Traversal
//! - Ascending bucket index, then chain order. `Cursor` is a detached,
//!   `Copy` position for erase-while-iterating loops; `Iter` borrows the
//!   table. Growth invalidates cursors. Erasing one node leaves cursors to
//!   other nodes valid.
//!
//! Failure model
//! - Allocation failure while growing, or a full node arena, surfaces as
//!   `TableError` with the table unchanged. Missing keys and duplicate
//!   inserts are ordinary results.
//! - Cursor misuse (reading past the end, using an erased position) yields
//!   `None` rather than touching freed memory.
//!
//! Reentrancy
//! - Hashing, key extraction and equality are user code run mid-lookup. In
//!   debug builds shared-access lookups carry a guard that panics if that
//!   code calls back into the same table.
//!
//! Notes and non-goals
//! - Not `Sync`; callers sharing a table across threads must lock it.
//! - No open addressing and no multi-key (non-unique) insertion.

pub mod buckets;
pub mod cursor;
pub mod error;
pub mod hash_map;
pub mod hash_table;
mod hash_table_proptest;
pub mod key;
mod reentrancy;

// Public surface
pub use buckets::{next_capacity, MAX_BUCKETS, PRIME_SCHEDULE};
pub use cursor::Cursor;
pub use error::TableError;
pub use hash_map::HashMap;
pub use hash_table::HashTable;
pub use key::{DefaultEq, ExtractKey, First, Identity, KeyEq};
