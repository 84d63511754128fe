#![cfg(test)]

// Property tests for IncrementalMap kept inside the crate next to the
// implementation; they run a random operation sequence against a
// hashbrown::HashMap model.

use crate::incremental::IncrementalMap;
use crate::key::{Key, StringKey};
use hashbrown::HashMap;
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::collections::BTreeSet;
use std::fmt;

// Key whose hash is constant: every entry shares one bucket.
#[derive(Clone, Debug, PartialEq, Eq)]
struct CollidingKey(String);

impl fmt::Display for CollidingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Key for CollidingKey {
    fn hash_code(&self) -> u32 {
        0
    }
}

#[derive(Clone, Debug)]
enum Op {
    Put(usize, i32),
    Get(usize),
    Mutate(usize, i32),
    Delete(usize),
    Remove(usize),
    Contains(String),
    Iterate,
    Finish,
}

impl Op {
    // Operations that advance a running migration.
    fn steps(&self) -> bool {
        matches!(
            self,
            Op::Put(..) | Op::Get(_) | Op::Mutate(..) | Op::Delete(_) | Op::Remove(_)
        )
    }
}

fn arb_scenario() -> impl Strategy<Value = (usize, Vec<String>, Vec<Op>)> {
    let buckets = proptest::sample::select(vec![1usize, 2, 4, 8]);
    let pool = proptest::collection::vec("[a-z0-9]{0,4}", 1..=24);
    (buckets, pool).prop_flat_map(|(buckets, pool)| {
        let idx = 0..pool.len();
        let op = prop_oneof![
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Put(i, v)),
            2 => idx.clone().prop_map(Op::Get),
            1 => (idx.clone(), -100i32..100).prop_map(|(i, d)| Op::Mutate(i, d)),
            2 => idx.clone().prop_map(Op::Delete),
            1 => idx.clone().prop_map(Op::Remove),
            1 => "[a-z0-9]{0,4}".prop_map(Op::Contains),
            1 => Just(Op::Iterate),
            1 => Just(Op::Finish),
        ];
        proptest::collection::vec(op, 1..120).prop_map(move |ops| (buckets, pool.clone(), ops))
    })
}

// State-machine equivalence against the model. After every operation:
// - `len`/`is_empty` match the model;
// - iteration yields each model key exactly once (no key in both tables);
// - a stepping operation during a migration advances the cursor, which
//   bounds a migration by the old table's bucket count.
fn run_state_machine<K, F>(
    make: F,
    buckets: usize,
    pool: &[String],
    ops: Vec<Op>,
) -> Result<(), TestCaseError>
where
    K: Key + Clone + fmt::Debug,
    F: Fn(&str) -> K,
{
    let mut sut: IncrementalMap<K, i32> =
        IncrementalMap::with_buckets(buckets).expect("power of two");
    let mut model: HashMap<String, i32> = HashMap::new();

    for op in ops {
        let before = sut.migration_cursor();
        match &op {
            Op::Put(i, v) => {
                let new = sut.put(make(pool[*i].as_str()), *v);
                let prev = model.insert(pool[*i].clone(), *v);
                prop_assert_eq!(new, prev.is_none());
            }
            Op::Get(i) => {
                prop_assert_eq!(sut.get(&make(pool[*i].as_str())), model.get(&pool[*i]));
            }
            Op::Mutate(i, d) => {
                let got = sut.get_mut(&make(pool[*i].as_str())).map(|v| {
                    *v = v.saturating_add(*d);
                    *v
                });
                let expected = model.get_mut(&pool[*i]).map(|v| {
                    *v = v.saturating_add(*d);
                    *v
                });
                prop_assert_eq!(got, expected);
            }
            Op::Delete(i) => {
                let removed = sut.delete(&make(pool[*i].as_str()));
                prop_assert_eq!(removed, model.remove(&pool[*i]).is_some());
            }
            Op::Remove(i) => {
                prop_assert_eq!(sut.remove(&make(pool[*i].as_str())), model.remove(&pool[*i]));
            }
            Op::Contains(s) => {
                prop_assert_eq!(sut.contains_key(&make(s.as_str())), model.contains_key(s));
            }
            Op::Iterate => {
                let seen: Vec<String> = sut.iter().map(|(k, _)| k.to_string()).collect();
                let unique: BTreeSet<String> = seen.iter().cloned().collect();
                prop_assert_eq!(seen.len(), unique.len(), "key yielded twice");
                let expected: BTreeSet<String> = model.keys().cloned().collect();
                prop_assert_eq!(unique, expected);
            }
            Op::Finish => {
                sut.finish_migration();
                prop_assert!(!sut.is_migrating());
            }
        }

        if let (Some(c0), Some(c1)) = (before, sut.migration_cursor()) {
            if op.steps() {
                prop_assert!(c1 > c0, "cursor did not advance: {} -> {}", c0, c1);
            }
        }
        if let Some(c) = sut.migration_cursor() {
            prop_assert!(c < sut.bucket_count());
        }
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        prop_assert_eq!(sut.iter().count(), model.len());
    }

    sut.finish_migration();
    for (k, v) in &model {
        prop_assert_eq!(sut.peek(&make(k.as_str())), Some(v));
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((buckets, pool, ops) in arb_scenario()) {
        run_state_machine(|s| StringKey::new(s), buckets, &pool, ops)?;
    }
}

// Same properties with every key colliding into one bucket, which stresses
// chain scans, multi-node deletes and whole-chain migration moves.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((buckets, pool, ops) in arb_scenario()) {
        run_state_machine(|s| CollidingKey(s.to_string()), buckets, &pool, ops)?;
    }
}
