use std::collections::HashSet;
use std::hash::Hash;

/// Keep the first item for every distinct key, in their original order.
///
/// Later duplicates are dropped silently; applying `unique` twice is the same
/// as applying it once.
pub fn unique<T, K, F>(items: impl IntoIterator<Item = T>, mut key: F) -> Vec<T>
where
    K: Eq + Hash,
    F: FnMut(&T) -> K,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(key(item)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_first_occurrence_in_order() {
        let items = vec![("a", 1), ("b", 2), ("a", 3), ("c", 4), ("b", 5)];
        let out = unique(items, |(k, _)| *k);
        assert_eq!(out, vec![("a", 1), ("b", 2), ("c", 4)]);
    }

    #[test]
    fn empty_input() {
        let out: Vec<u8> = unique(Vec::new(), |x: &u8| *x);
        assert!(out.is_empty());
    }

    #[test]
    fn is_idempotent() {
        let once = unique(vec![3, 1, 3, 2, 1], |x| *x);
        let twice = unique(once.clone(), |x| *x);
        assert_eq!(once, vec![3, 1, 2]);
        assert_eq!(once, twice);
    }
}
