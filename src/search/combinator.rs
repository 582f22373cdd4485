//! Intersection of derived-criterion id sets

use std::collections::HashSet;
use uuid::Uuid;

/// Deduplicated set of store ids produced by one resolver
pub type StoreIdSet = HashSet<Uuid>;

/// Intersect one or more id sets
///
/// Taking the first set by value makes a call without any set impossible.
/// Each step retains the smaller side, and the loop stops as soon as the
/// running intersection is empty.
pub fn combine(first: StoreIdSet, rest: impl IntoIterator<Item = StoreIdSet>) -> StoreIdSet {
    let mut acc = first;
    for set in rest {
        if acc.is_empty() {
            break;
        }
        let (mut small, large) = if set.len() < acc.len() {
            (set, acc)
        } else {
            (acc, set)
        };
        small.retain(|id| large.contains(id));
        acc = small;
    }
    acc
}

/// Intersect every set of the list, or `None` when the list is empty
pub fn combine_all(sets: Vec<StoreIdSet>) -> Option<StoreIdSet> {
    let mut sets = sets.into_iter();
    sets.next().map(|first| combine(first, sets))
}
