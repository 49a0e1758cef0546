//! Streaming top-N selection.

use crate::{model::CountedEntry, order::KeyOrder};
use std::{
    cmp::{Ordering, Reverse},
    collections::BinaryHeap,
};

/// Picks the `n` highest-ranked entries from `entries`.
///
/// Entries rank by `count`, highest first; equal counts rank by key,
/// smallest first under `order`.  The result is sorted best first.
///
/// Input is consumed in one pass while holding at most `n` candidates in a
/// heap whose root is the worst candidate retained.  An incoming entry is
/// admitted only if it outranks that root, which it then replaces.  Because
/// admission compares full rank rather than count alone, the result does
/// not depend on the order of `entries`.
///
/// ## Correctness
///
/// * `order` must be a total order consistent with `Eq` for `K`, and keys
///   must be distinct, for the result to be unique.
pub fn top_n<K, I, O>(entries: I, n: usize, order: &O) -> Vec<CountedEntry<K>>
where
    I: IntoIterator<Item = CountedEntry<K>>,
    O: KeyOrder<K> + ?Sized,
{
    if n == 0 {
        return Vec::new();
    }

    let mut entries = entries.into_iter();
    let mut heap = BinaryHeap::with_capacity(n.min(entries.size_hint().0.max(1)));

    for entry in entries.by_ref() {
        heap.push(Reverse(Candidate::new(entry, order)));
        if heap.len() == n {
            break;
        }
    }

    for entry in entries {
        let candidate = Reverse(Candidate::new(entry, order));
        if let Some(mut worst) = heap.peek_mut() {
            if candidate < *worst {
                *worst = candidate;
            }
        }
    }

    // Ascending `Reverse` order is descending rank.
    heap.into_sorted_vec()
        .into_iter()
        .map(|Reverse(candidate)| candidate.entry)
        .collect()
}

/// Heap element ordered by rank: greater means better.
struct Candidate<'a, K, O: ?Sized> {
    entry: CountedEntry<K>,
    order: &'a O,
}

impl<'a, K, O> Candidate<'a, K, O>
where
    O: KeyOrder<K> + ?Sized,
{
    fn new(entry: CountedEntry<K>, order: &'a O) -> Self {
        Self { entry, order }
    }
}

impl<K, O> Ord for Candidate<'_, K, O>
where
    O: KeyOrder<K> + ?Sized,
{
    fn cmp(&self, other: &Self) -> Ordering {
        self.entry
            .count
            .cmp(&other.entry.count)
            .then_with(|| KeyOrder::cmp(self.order, &other.entry.key, &self.entry.key))
    }
}

impl<K, O> PartialOrd for Candidate<'_, K, O>
where
    O: KeyOrder<K> + ?Sized,
{
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K, O> PartialEq for Candidate<'_, K, O>
where
    O: KeyOrder<K> + ?Sized,
{
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<K, O> Eq for Candidate<'_, K, O> where O: KeyOrder<K> + ?Sized {}

#[cfg(test)]
mod tests {
    use super::top_n;
    use crate::{
        model::{CountedEntry, VisitorKey},
        order::{KeyOrder, NaturalOrder, VisitorOrder},
    };
    use pretty_assertions::assert_eq;
    use proptest::{collection, prelude::*};
    use rstest::rstest;
    use std::collections::BTreeMap;

    fn entries(counts: &[(u32, u64)]) -> Vec<CountedEntry<u32>> {
        counts
            .iter()
            .map(|(k, c)| CountedEntry::new(*k, *c))
            .collect()
    }

    #[rstest]
    #[case(0, vec![])]
    #[case(1, vec![(3, 9)])]
    #[case(3, vec![(3, 9), (1, 5), (4, 5)])]
    #[case(10, vec![(3, 9), (1, 5), (4, 5), (2, 1)])]
    fn bounds(#[case] n: usize, #[case] expected: Vec<(u32, u64)>) {
        let input = entries(&[(1, 5), (2, 1), (3, 9), (4, 5)]);
        assert_eq!(top_n(input, n, &NaturalOrder), entries(&expected));
    }

    #[test]
    fn empty_input() {
        assert!(top_n(Vec::<CountedEntry<u32>>::new(), 20, &NaturalOrder).is_empty());
    }

    #[test]
    fn twenty_five_unique_counts() {
        let input: Vec<_> = (1..=25u64).map(|c| CountedEntry::new(c as u32, c)).collect();
        let result = top_n(input, 20, &NaturalOrder);

        let counts: Vec<u64> = result.iter().map(|e| e.count).collect();
        assert_eq!(counts, (6..=25u64).rev().collect::<Vec<_>>());
    }

    #[test]
    fn ties_resolved_by_key_order_regardless_of_arrival() {
        let keys = [
            VisitorKey::new("Bo", "Ng"),
            VisitorKey::new("Amy", "Lee"),
            VisitorKey::new("Cy", "Abe"),
        ];
        let forward: Vec<_> = keys.iter().cloned().map(|k| CountedEntry::new(k, 1)).collect();
        let backward: Vec<_> = forward.iter().cloned().rev().collect();

        let order = VisitorOrder::LastThenFirst;
        let a = top_n(forward, 2, &order);
        let b = top_n(backward, 2, &order);
        assert_eq!(a, b);
        assert_eq!(a[0].key, VisitorKey::new("Cy", "Abe"));
        assert_eq!(a[1].key, VisitorKey::new("Amy", "Lee"));
    }

    /// Distinct keys with arbitrary counts.
    fn keyed_counts() -> impl Strategy<Value = Vec<CountedEntry<u32>>> {
        collection::btree_map(0u32..500, 1u64..20, 0..100).prop_map(|m: BTreeMap<u32, u64>| {
            m.into_iter().map(|(k, c)| CountedEntry::new(k, c)).collect()
        })
    }

    proptest! {
        #[test]
        fn size_and_dominance(input in keyed_counts(), n in 0usize..30) {
            let result = top_n(input.clone(), n, &NaturalOrder);
            prop_assert_eq!(result.len(), n.min(input.len()));

            for pair in result.windows(2) {
                prop_assert!(pair[0].count >= pair[1].count);
                if pair[0].count == pair[1].count {
                    prop_assert!(NaturalOrder.is_less(&pair[0].key, &pair[1].key));
                }
            }

            for entry in &result {
                prop_assert!(input.contains(entry));
            }

            if let Some(min) = result.last() {
                for entry in input.iter().filter(|e| !result.contains(e)) {
                    prop_assert!(entry.count <= min.count);
                }
            }
        }

        #[test]
        fn idempotent(input in keyed_counts(), n in 0usize..30) {
            let once = top_n(input, n, &NaturalOrder);
            let twice = top_n(once.clone(), n, &NaturalOrder);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn independent_of_input_order(
            (input, reordered) in keyed_counts()
                .prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle())),
            n in 0usize..30,
        ) {
            prop_assert_eq!(
                top_n(input, n, &NaturalOrder),
                top_n(reordered, n, &NaturalOrder)
            );
        }
    }
}
