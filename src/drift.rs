//! Generic drift detection between the last-applied state and the desired
//! config for one resource kind.

use std::collections::BTreeMap;

/// The four disjoint partitions of a drift run. Callers must not rely on
/// the order of items within a partition.
#[derive(Debug, Clone)]
pub struct Drift<T> {
    pub created: Vec<T>,
    pub updated: Vec<T>,
    pub deleted: Vec<T>,
    pub unchanged: Vec<T>,
}

// Written out so `Drift<T>` is available for any item type; a derive
// would demand `T: Default` even though no `T` is ever constructed.
impl<T> Default for Drift<T> {
    fn default() -> Self {
        Self {
            created: Vec::new(),
            updated: Vec::new(),
            deleted: Vec::new(),
            unchanged: Vec::new(),
        }
    }
}

/// Partition `(state, config)` into create/update/delete/unchanged.
///
/// Identity is copied from the state item into the config item (via
/// `get_id`/`set_id`) before `is_equal` runs, so an ID difference alone
/// never produces a spurious update. `is_equal` must be reflexive and
/// `key` must be total; duplicate keys within one input keep the last
/// occurrence.
pub fn detect<T, K, G, S, E>(state: Vec<T>, config: Vec<T>, key: K, get_id: G, set_id: S, is_equal: E) -> Drift<T>
where
    T: Clone,
    K: Fn(&T) -> String,
    G: Fn(&T) -> Option<String>,
    S: Fn(&mut T, Option<String>),
    E: Fn(&T, &T) -> bool,
{
    let mut state_by_key: BTreeMap<String, T> = state.into_iter().map(|item| (key(&item), item)).collect();

    let mut drift = Drift::default();
    for mut item in config {
        match state_by_key.remove(&key(&item)) {
            None => drift.created.push(item),
            Some(state_item) => {
                set_id(&mut item, get_id(&state_item));
                if is_equal(&state_item, &item) {
                    drift.unchanged.push(item);
                } else {
                    drift.updated.push(item);
                }
            }
        }
    }

    drift.deleted = state_by_key.into_values().collect();
    drift
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        name: String,
        id: Option<String>,
        value: i64,
    }

    fn item(name: &str, id: Option<&str>, value: i64) -> Item {
        Item {
            name: name.to_owned(),
            id: id.map(str::to_owned),
            value,
        }
    }

    fn run(state: Vec<Item>, config: Vec<Item>) -> Drift<Item> {
        detect(
            state,
            config,
            |i| i.name.clone(),
            |i| i.id.clone(),
            |i, id| i.id = id,
            |a, b| a.value == b.value,
        )
    }

    #[test]
    fn test_create_when_missing_from_state() {
        let drift = run(vec![], vec![item("a", None, 1)]);
        assert_eq!(drift.created.len(), 1);
        assert!(drift.updated.is_empty() && drift.deleted.is_empty() && drift.unchanged.is_empty());
    }

    #[test]
    fn test_delete_when_missing_from_config() {
        let drift = run(vec![item("a", Some("x-1"), 1)], vec![]);
        assert_eq!(drift.deleted.len(), 1);
        assert_eq!(drift.deleted[0].id.as_deref(), Some("x-1"));
    }

    #[test]
    fn test_identity_copied_before_equality() {
        let drift = run(vec![item("a", Some("x-1"), 1)], vec![item("a", None, 1)]);
        assert_eq!(drift.unchanged.len(), 1);
        assert_eq!(drift.unchanged[0].id.as_deref(), Some("x-1"));
    }

    #[test]
    fn test_value_change_is_an_update_with_state_identity() {
        let drift = run(vec![item("a", Some("x-1"), 1)], vec![item("a", None, 2)]);
        assert_eq!(drift.updated.len(), 1);
        assert_eq!(drift.updated[0].id.as_deref(), Some("x-1"));
        assert_eq!(drift.updated[0].value, 2);
    }

    proptest! {
        #[test]
        fn prop_partitions_cover_inputs_and_are_disjoint(
            state_keys in proptest::collection::btree_map("[a-e]", 0i64..3, 0..6),
            config_keys in proptest::collection::btree_map("[a-e]", 0i64..3, 0..6),
        ) {
            let state: Vec<Item> = state_keys.iter().map(|(k, v)| item(k, Some(&format!("id-{k}")), *v)).collect();
            let config: Vec<Item> = config_keys.iter().map(|(k, v)| item(k, None, *v)).collect();

            let drift = run(state, config);

            let mut seen = BTreeSet::new();
            for part in [&drift.created, &drift.updated, &drift.deleted, &drift.unchanged] {
                for i in part {
                    prop_assert!(seen.insert(i.name.clone()), "key {} in two partitions", i.name);
                }
            }

            let all_keys: BTreeSet<String> = state_keys.keys().chain(config_keys.keys()).cloned().collect();
            prop_assert_eq!(seen, all_keys);

            for i in drift.unchanged.iter().chain(&drift.updated) {
                prop_assert_eq!(i.id.clone(), Some(format!("id-{}", i.name)));
            }

            for i in &drift.created {
                prop_assert!(!state_keys.contains_key(&i.name));
            }
            for i in &drift.deleted {
                prop_assert!(!config_keys.contains_key(&i.name));
            }
        }
    }
}
