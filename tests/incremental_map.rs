// IncrementalMap integration suite.
//
// Each test documents the behavior it verifies. Core properties:
// - Round-trip: put then get returns the value in any migration state.
// - Upsert: a second put for a key replaces the value and counts once.
// - Delete completeness: after a successful delete the key is gone and a
//   second delete reports false.
// - Migration completion: any mix of operations returns the map to stable
//   within the old table's bucket count.
// - No loss under growth.
use rehash_map::{Config, ConfigError, IncrementalMap, Key, StringKey};

fn key(i: usize) -> StringKey {
    StringKey::new(format!("key-{}", i))
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// Test: the four-bucket walkthrough.
// Verifies: keys "0".."4" cross the threshold on the fifth put; every
// lookup succeeds; the map is stable with eight buckets within four ops.
#[test]
fn four_buckets_five_keys() {
    init_logging();
    let mut m = IncrementalMap::with_buckets(4).unwrap();
    for i in 0..5 {
        m.put(StringKey::new(i.to_string()), i);
    }
    assert!(m.is_migrating());
    assert_eq!(m.len(), 5);

    let mut ops = 0;
    while m.is_migrating() {
        let i = ops % 5;
        assert_eq!(m.get(&StringKey::new(i.to_string())), Some(&i));
        ops += 1;
    }
    assert!(ops <= 4, "migration took {} operations", ops);
    assert_eq!(m.bucket_count(), 8);
    for i in 0..5 {
        assert_eq!(m.get(&StringKey::new(i.to_string())), Some(&i));
    }
}

// Test: round-trip across every state a lookup can observe.
// Verifies: each value is readable right after its own put, and again
// after later puts have triggered and advanced migrations.
#[test]
fn round_trip_through_migrations() {
    let mut m = IncrementalMap::with_buckets(2).unwrap();
    let mut saw_migrating = false;
    for i in 0..300 {
        m.put(key(i), i * 10);
        saw_migrating |= m.is_migrating();
        assert_eq!(m.get(&key(i)), Some(&(i * 10)));
        if i > 0 {
            assert_eq!(m.get(&key(i / 2)), Some(&(i / 2 * 10)));
        }
    }
    assert!(saw_migrating);
    for i in 0..300 {
        assert_eq!(m.get(&key(i)), Some(&(i * 10)));
    }
}

// Test: upsert idempotence.
// Verifies: put(k, v1); put(k, v2) yields v2 and grows len by one.
#[test]
fn upsert_replaces_value_and_counts_once() {
    let mut m = IncrementalMap::new();
    let k = StringKey::from("k");
    assert!(m.put(k.clone(), "v1"));
    assert!(!m.put(k.clone(), "v2"));
    assert_eq!(m.len(), 1);
    assert_eq!(m.get(&k), Some(&"v2"));
}

// Test: delete completeness, including keys that have not been migrated yet.
#[test]
fn delete_then_absent() {
    let mut m = IncrementalMap::with_buckets(8).unwrap();
    for i in 0..9 {
        m.put(key(i), i);
    }
    assert!(m.is_migrating());
    for i in 0..9 {
        assert!(m.delete(&key(i)));
        assert_eq!(m.get(&key(i)), None);
        assert!(!m.delete(&key(i)));
    }
    assert!(m.is_empty());
    assert!(!m.delete(&StringKey::from("never inserted")));
}

// Test: migration completion bound under a mix of operations.
// Verifies: counting from the put that starts a migration, at most
// `old bucket count` further operations end it, for several table sizes.
#[test]
fn migration_ends_within_bucket_count_operations() {
    for buckets in [1usize, 2, 4, 16, 64] {
        let mut m = IncrementalMap::with_buckets(buckets).unwrap();
        for i in 0..=buckets {
            m.put(key(i), i);
        }
        assert!(m.is_migrating(), "buckets={}", buckets);

        let mut ops = 0;
        while m.is_migrating() {
            match ops % 3 {
                0 => {
                    m.get(&key(ops));
                }
                1 => {
                    m.delete(&StringKey::from("absent"));
                }
                _ => {
                    m.put(key(1000 + ops), ops);
                }
            }
            ops += 1;
        }
        assert!(ops <= buckets, "buckets={} ops={}", buckets, ops);
        assert_eq!(m.bucket_count(), buckets * 2);
        for i in 0..=buckets {
            assert_eq!(m.peek(&key(i)), Some(&i));
        }
    }
}

// Test: no loss under growth.
// Verifies: N keys, last-written values, all retrievable once stable.
#[test]
fn no_loss_under_growth() {
    init_logging();
    const N: usize = 10_000;
    let mut m = IncrementalMap::with_buckets(4).unwrap();
    for i in 0..N {
        m.put(key(i), i);
    }
    for i in (0..N).filter(|i| i % 7 == 0) {
        m.put(key(i), i + N);
    }
    m.finish_migration();
    assert!(!m.is_migrating());
    assert_eq!(m.len(), N);
    for i in 0..N {
        let expected = if i % 7 == 0 { i + N } else { i };
        assert_eq!(m.peek(&key(i)), Some(&expected));
    }
    assert_eq!(m.iter().count(), N);
}

// Test: peek and contains_key never advance a migration.
#[test]
fn shared_lookups_do_not_step() {
    let mut m = IncrementalMap::with_buckets(4).unwrap();
    for i in 0..5 {
        m.put(key(i), i);
    }
    let cursor = m.migration_cursor();
    assert!(cursor.is_some());
    for i in 0..5 {
        assert_eq!(m.peek(&key(i)), Some(&i));
        assert!(m.contains_key(&key(i)));
    }
    assert_eq!(m.migration_cursor(), cursor);
}

// Test: user-defined keys work through the Key capability alone.
#[test]
fn custom_key_type() {
    #[derive(PartialEq, Eq)]
    struct Id(u32);
    impl std::fmt::Display for Id {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "#{}", self.0)
        }
    }
    impl Key for Id {
        fn hash_code(&self) -> u32 {
            self.0
        }
    }

    let mut m = IncrementalMap::with_buckets(1).unwrap();
    for i in 0..100 {
        m.put(Id(i), i);
    }
    m.finish_migration();
    assert!(m.bucket_count() >= 128);
    for i in 0..100 {
        assert_eq!(m.get(&Id(i)), Some(&i));
    }
}

#[test]
fn construction_errors() {
    assert!(matches!(
        IncrementalMap::<StringKey, ()>::with_buckets(0),
        Err(ConfigError::BucketsNotPowerOfTwo(0))
    ));
    let config = Config::default().with_load_factor(0);
    let err = IncrementalMap::<StringKey, ()>::with_config(config).unwrap_err();
    assert_eq!(err, ConfigError::ZeroLoadFactor);
}
