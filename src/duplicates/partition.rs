//! Generic partition-by-key primitive.
//!
//! Every pipeline stage is the same operation with a different
//! discriminator: split a collection into groups sharing a key, then drop
//! the groups that cannot contain duplicates. Implemented once here and
//! reused for size, device, inode, and both digest stages.

use std::collections::HashMap;
use std::hash::Hash;

/// Partition `items` into groups sharing the same key.
///
/// Groups appear in order of first key occurrence and items keep their
/// input order within each group, so the output is deterministic for a
/// given input order.
pub fn partition_by<T, K, F>(items: Vec<T>, mut key: F) -> Vec<Vec<T>>
where
    K: Eq + Hash,
    F: FnMut(&T) -> K,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<Vec<T>> = Vec::new();

    for item in items {
        let slot = *index.entry(key(&item)).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(item);
    }

    groups
}

/// Drop groups that cannot contain duplicates, returning the survivors and
/// the number of items discarded with singleton groups.
#[must_use]
pub fn discard_singletons<T>(groups: Vec<Vec<T>>) -> (Vec<Vec<T>>, usize) {
    let mut discarded = 0;
    let survivors = groups
        .into_iter()
        .filter(|group| {
            if group.len() > 1 {
                true
            } else {
                discarded += group.len();
                false
            }
        })
        .collect();
    (survivors, discarded)
}
