#![cfg(test)]

// Property tests for HashTable kept inside the crate so they can check
// bucket placement directly.

use crate::hash_table::HashTable;
use crate::key::First;
use hashbrown::hash_map::DefaultHashBuilder;
use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap};
use std::hash::{BuildHasher, Hasher};

#[derive(Clone, Debug)]
enum Op {
    Insert(u16, i32),
    InsertAll(Vec<(u16, i32)>),
    Erase(u16),
    Find(u16),
    EraseBegin,
    EraseRange(usize, usize),
    Iterate,
    Clear,
}

fn arb_ops() -> impl Strategy<Value = Vec<Op>> {
    let key = 0u16..300;
    let op = prop_oneof![
        6 => (key.clone(), any::<i32>()).prop_map(|(k, v)| Op::Insert(k, v)),
        1 => proptest::collection::vec((key.clone(), any::<i32>()), 0..40).prop_map(Op::InsertAll),
        3 => key.clone().prop_map(Op::Erase),
        2 => key.prop_map(Op::Find),
        1 => Just(Op::EraseBegin),
        1 => (0usize..64, 0usize..64).prop_map(|(a, b)| Op::EraseRange(a.min(b), a.max(b))),
        1 => Just(Op::Iterate),
        1 => Just(Op::Clear),
    ];
    proptest::collection::vec(op, 1..120)
}

type Table<S> = HashTable<(u16, i32), u16, S, First>;

fn run_ops<S: BuildHasher>(
    mut sut: Table<S>,
    ops: Vec<Op>,
) -> Result<(), TestCaseError> {
    let mut model: HashMap<u16, i32> = HashMap::new();
    for op in ops {
        match op {
            Op::Insert(k, v) => {
                let before = sut.bucket_count();
                let (c, inserted) = sut.insert_unique((k, v)).expect("insert");
                prop_assert_eq!(inserted, !model.contains_key(&k));
                model.entry(k).or_insert(v);
                prop_assert_eq!(c.value(&sut), Some(&(k, model[&k])));
                prop_assert!(sut.bucket_count() >= before);
            }
            Op::InsertAll(pairs) => {
                let fresh: BTreeSet<u16> = pairs
                    .iter()
                    .map(|(k, _)| *k)
                    .filter(|k| !model.contains_key(k))
                    .collect();
                let n = sut.insert_unique_all(pairs.clone()).expect("bulk insert");
                prop_assert_eq!(n, fresh.len());
                for (k, v) in pairs {
                    model.entry(k).or_insert(v);
                }
            }
            Op::Erase(k) => {
                let expected = usize::from(model.remove(&k).is_some());
                prop_assert_eq!(sut.erase(&k), expected);
                prop_assert!(sut.find(&k).is_end());
            }
            Op::Find(k) => {
                prop_assert_eq!(sut.get(&k).map(|(_, v)| *v), model.get(&k).copied());
            }
            Op::EraseBegin => {
                let begin = sut.begin();
                let expected = sut.advance(begin);
                if let Some(&(k, _)) = begin.value(&sut) {
                    model.remove(&k);
                }
                prop_assert_eq!(sut.erase_at(begin), expected);
            }
            Op::EraseRange(a, b) => {
                let order: Vec<u16> = sut.iter().map(|(k, _)| *k).collect();
                let a = a.min(order.len());
                let b = b.min(order.len());
                let cursor_at = |i: usize| {
                    order.get(i).map_or(sut.end(), |k| sut.find(k))
                };
                let (first, last) = (cursor_at(a), cursor_at(b));
                prop_assert_eq!(sut.erase_range(first, last), last);
                for k in &order[a..b] {
                    model.remove(k);
                }
                let mut remaining = order.clone();
                remaining.drain(a..b);
                let now: Vec<u16> = sut.iter().map(|(k, _)| *k).collect();
                prop_assert_eq!(now, remaining);
            }
            Op::Iterate => {
                let keys: Vec<u16> = sut.iter().map(|(k, _)| *k).collect();
                let unique: BTreeSet<u16> = keys.iter().copied().collect();
                prop_assert_eq!(keys.len(), unique.len());
                prop_assert_eq!(unique, model.keys().copied().collect::<BTreeSet<_>>());
                let buckets: Vec<usize> = keys.iter().map(|k| sut.bucket(k)).collect();
                prop_assert!(buckets.windows(2).all(|w| w[0] <= w[1]));
            }
            Op::Clear => {
                let buckets = sut.bucket_count();
                sut.clear();
                model.clear();
                prop_assert_eq!(sut.bucket_count(), buckets);
            }
        }

        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        prop_assert!(crate::buckets::PRIME_SCHEDULE.contains(&sut.bucket_count()));
        let per_bucket: usize = (0..sut.bucket_count()).map(|b| sut.bucket_size(b)).sum();
        prop_assert_eq!(per_bucket, sut.len());
    }
    Ok(())
}

// Property: HashTable agrees with std::collections::HashMap under random
// insert/erase/traversal sequences.
// - Duplicate inserts never overwrite and report `inserted == false`.
// - Cursor and range erasure remove exactly the traversed entries.
// - Traversal visits each entry once in ascending bucket order.
// - Chain lengths sum to `len()`; the bucket count stays on the schedule.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine(ops in arb_ops()) {
        run_ops(Table::<DefaultHashBuilder>::with_capacity(8), ops)?;
    }
}

// Every key hashes to 0: all values share bucket 0, exercising chain
// relinking on head, interior and tail erasure.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions(ops in arb_ops()) {
        run_ops(Table::<ConstBuildHasher>::new(), ops)?;
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 32, .. ProptestConfig::default() })]
    /// Growth keeps every key findable and the count unchanged.
    #[test]
    fn prop_growth_preserves_contents(keys in proptest::collection::btree_set(any::<u32>(), 0..600)) {
        let mut t: HashTable<u32, u32> = HashTable::with_capacity(0);
        for (i, &k) in keys.iter().enumerate() {
            let before = t.len();
            prop_assert!(t.insert_unique(k).expect("insert").1);
            prop_assert_eq!(t.len(), before + 1);
            prop_assert!(t.len() <= t.bucket_count() || t.bucket_count() == crate::MAX_BUCKETS);
            prop_assert_eq!(i + 1, t.len());
        }
        for k in &keys {
            prop_assert!(t.contains_key(k));
        }
        let copy = t.clone();
        prop_assert_eq!(copy.iter().collect::<Vec<_>>(), t.iter().collect::<Vec<_>>());
    }
}
