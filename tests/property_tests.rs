//! Property tests for the generic partition primitive every pipeline stage
//! is built on.

use proptest::prelude::*;

use relink::duplicates::{discard_singletons, partition_by};

proptest! {
    /// Partitioning never loses or invents items.
    #[test]
    fn partition_preserves_all_items(items in prop::collection::vec(0u8..20, 0..200)) {
        let groups = partition_by(items.clone(), |n| *n);
        let mut flattened: Vec<u8> = groups.iter().flatten().copied().collect();
        let mut expected = items;
        flattened.sort_unstable();
        expected.sort_unstable();
        prop_assert_eq!(flattened, expected);
    }

    /// Every member of a group shares the group's key, and no two groups
    /// share a key.
    #[test]
    fn groups_are_keyed_consistently(items in prop::collection::vec((0u8..10, any::<u16>()), 0..100)) {
        let groups = partition_by(items, |(key, _)| *key);
        let mut seen_keys = std::collections::HashSet::new();
        for group in &groups {
            prop_assert!(!group.is_empty());
            let key = group[0].0;
            prop_assert!(group.iter().all(|(k, _)| *k == key));
            prop_assert!(seen_keys.insert(key));
        }
    }

    /// Dropping singleton groups accounts for every item exactly once.
    #[test]
    fn discarded_and_kept_items_sum_to_total(items in prop::collection::vec(0u8..10, 0..100)) {
        let total = items.len();
        let (survivors, discarded) = discard_singletons(partition_by(items, |n| *n));
        let kept: usize = survivors.iter().map(Vec::len).sum();
        prop_assert_eq!(kept + discarded, total);
        prop_assert!(survivors.iter().all(|group| group.len() > 1));
    }
}
