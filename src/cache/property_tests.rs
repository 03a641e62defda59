//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check key derivation and the set/get/clear contract.

use proptest::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::cache::{format_key, ClearOutcome, NamespacedCache, ParamValue, Params};
use crate::store::{HashStore, MemoryHashStore};

// == Test Configuration ==
const TEST_NAMESPACE: &str = "model.test";
const TEST_EXPIRE: u64 = 300;

// == Strategies ==
/// Parameter names as call sites write them
fn name_strategy() -> impl Strategy<Value = String> {
    "[a-z]{1,8}"
}

/// Non-empty values that survive normalization unchanged
fn plain_value_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9]{1,8}"
}

fn pairs_strategy() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::btree_map(name_strategy(), plain_value_strategy(), 1..6)
        .prop_map(|map| map.into_iter().collect())
}

fn cache_over(store: Arc<MemoryHashStore>) -> NamespacedCache {
    NamespacedCache::new(store, TEST_NAMESPACE, TEST_EXPIRE, false)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Insertion order of named params never changes the key.
    #[test]
    fn prop_key_ignores_insertion_order(pairs in pairs_strategy()) {
        let forward = Params::map(pairs.iter().cloned());
        let backward = Params::map(pairs.iter().rev().cloned());

        prop_assert_eq!(
            format_key("getvalues", &forward),
            format_key("getvalues", &backward)
        );
    }

    // Keys are pure functions of their inputs.
    #[test]
    fn prop_key_is_deterministic(pairs in pairs_strategy()) {
        let params = Params::map(pairs);
        prop_assert_eq!(
            format_key("getvalues", &params),
            format_key("getvalues", &params.clone())
        );
    }

    // Different named params give different keys.
    #[test]
    fn prop_distinct_params_distinct_keys(a in pairs_strategy(), b in pairs_strategy()) {
        let map_a: BTreeMap<String, ParamValue> =
            a.into_iter().map(|(k, v)| (k, ParamValue::from(v))).collect();
        let map_b: BTreeMap<String, ParamValue> =
            b.into_iter().map(|(k, v)| (k, ParamValue::from(v))).collect();
        prop_assume!(map_a != map_b);

        prop_assert_ne!(
            format_key("getvalues", &Params::Map(map_a)),
            format_key("getvalues", &Params::Map(map_b))
        );
    }

    // Different list params give different keys.
    #[test]
    fn prop_distinct_lists_distinct_keys(
        a in prop::collection::vec(plain_value_strategy(), 0..6),
        b in prop::collection::vec(plain_value_strategy(), 0..6)
    ) {
        prop_assume!(a != b);
        prop_assert_ne!(
            format_key("getvalues", &Params::list(a)),
            format_key("getvalues", &Params::list(b))
        );
    }

    // What set stores under params, get returns unchanged.
    #[test]
    fn prop_set_then_get_roundtrip(
        pairs in pairs_strategy(),
        value in prop::collection::vec(any::<i64>(), 0..8)
    ) {
        let cache = cache_over(Arc::new(MemoryHashStore::new()));
        let params = Params::map(pairs);

        let cached: Option<Vec<i64>> = tokio_test::block_on(async {
            cache.set("getvalues", &params, &value).await.unwrap();
            cache.get("getvalues", &params).await.unwrap()
        });

        prop_assert_eq!(cached, Some(value));
    }

    // Clearing a prefix removes exactly the fields that start with it.
    #[test]
    fn prop_clear_prefix_is_exact(
        targeted in prop::collection::btree_set(plain_value_strategy(), 1..5),
        untouched in prop::collection::btree_set(plain_value_strategy(), 1..5)
    ) {
        let store = Arc::new(MemoryHashStore::new());
        let cache = cache_over(store.clone());

        let (outcome, remaining) = tokio_test::block_on(async {
            for id in &targeted {
                cache.set("getvalues", Params::map([("id", id.as_str())]), &1).await.unwrap();
            }
            for id in &untouched {
                cache.set("other", Params::map([("id", id.as_str())]), &2).await.unwrap();
            }
            let outcome = cache.clear(Some("getvalues")).await.unwrap();
            let remaining = store.hash_get_all(TEST_NAMESPACE).await.unwrap();
            (outcome, remaining)
        });

        prop_assert_eq!(outcome, Some(ClearOutcome::Fields(vec![1; targeted.len()])));
        prop_assert_eq!(remaining.len(), untouched.len());
        prop_assert!(remaining.keys().all(|k| k.starts_with("other")));
    }
}
