//! Canonical orientation of joined visitor pairs.

use crate::{
    model::{PairKey, VisitRecord, VisitorKey},
    order::KeyOrder,
};

/// Reduces the output of [`SameDateJoiner`](super::SameDateJoiner) to one
/// [`PairKey`] per unordered pair of distinct visitors.
///
/// The joiner produces both `(a, b)` and `(b, a)` for every pair of records
/// sharing a date.  Only the orientation with `visitor(a) < visitor(b)`
/// survives; the mirror and every pair of records of the same visitor are
/// dropped.  Each pair of distinct records sharing a date therefore
/// contributes exactly one instance.
#[derive(Clone, Debug, Default)]
pub struct PairCanonicalizer<O> {
    order: O,
}

impl<O> PairCanonicalizer<O>
where
    O: KeyOrder<VisitorKey>,
{
    pub fn new(order: O) -> Self {
        Self { order }
    }

    /// Orders two visitors, or returns `None` if they are the same visitor.
    pub fn canonical_pair(&self, a: VisitorKey, b: VisitorKey) -> Option<PairKey> {
        if a == b {
            return None;
        }
        if self.order.is_less(&a, &b) {
            Some(PairKey::new_unchecked(a, b))
        } else {
            Some(PairKey::new_unchecked(b, a))
        }
    }

    /// Keeps a joined pair only in its canonical orientation.
    pub fn canonicalize(&self, left: &VisitRecord, right: &VisitRecord) -> Option<PairKey> {
        let (a, b) = (left.visitor(), right.visitor());
        (a != b && self.order.is_less(&a, &b)).then(|| PairKey::new_unchecked(a, b))
    }

    /// Applies [`canonicalize`](Self::canonicalize) to a stream of joined
    /// pairs.
    pub fn filter_pairs<'a, I>(&'a self, pairs: I) -> impl Iterator<Item = PairKey> + 'a
    where
        I: IntoIterator<Item = (&'a VisitRecord, &'a VisitRecord)>,
        I::IntoIter: 'a,
    {
        pairs
            .into_iter()
            .filter_map(move |(left, right)| self.canonicalize(left, right))
    }
}

#[cfg(test)]
mod tests {
    use super::PairCanonicalizer;
    use crate::{
        model::{VisitRecord, VisitorKey},
        operator::{join, DatePartition, GroupedCounter},
        order::{KeyOrder, VisitorOrder},
    };
    use proptest::{collection, prelude::*};
    use std::collections::{BTreeMap, BTreeSet};

    fn visit(first: &str, last: &str, date: &str) -> VisitRecord {
        VisitRecord::new(first, last, date)
    }

    fn joined(
        partitions: &[DatePartition],
    ) -> impl Iterator<Item = (&VisitRecord, &VisitRecord)> + '_ {
        partitions.iter().flat_map(DatePartition::pairs)
    }

    #[test]
    fn drops_mirror_and_self_pairs() {
        let canon = PairCanonicalizer::new(VisitorOrder::default());
        let amy = visit("Amy", "Lee", "d1");
        let bo = visit("Bo", "Ng", "d1");

        let pair = canon.canonicalize(&amy, &bo).unwrap();
        assert_eq!(pair.left(), &amy.visitor());
        assert_eq!(pair.right(), &bo.visitor());

        assert!(canon.canonicalize(&bo, &amy).is_none());
        assert!(canon.canonicalize(&amy, &amy).is_none());
    }

    #[test]
    fn same_visitor_on_same_date_never_pairs() {
        let records = vec![
            visit("Amy", "Lee", "d1"),
            visit("Amy", "Lee", "d1"),
            visit("Amy", "Lee", "d1"),
        ];
        let partitions = join(records);
        let canon = PairCanonicalizer::new(VisitorOrder::default());
        assert_eq!(canon.filter_pairs(joined(&partitions)).count(), 0);
    }

    #[test]
    fn orientation_follows_configured_order() {
        let a = visit("Amy", "Zhu", "d1");
        let b = visit("Bo", "Adams", "d1");

        let by_last = PairCanonicalizer::new(VisitorOrder::LastThenFirst);
        let pair = by_last.canonical_pair(a.visitor(), b.visitor()).unwrap();
        assert_eq!(pair.left().first_name.as_str(), "Bo");

        let by_first = PairCanonicalizer::new(VisitorOrder::FirstThenLast);
        let pair = by_first.canonical_pair(a.visitor(), b.visitor()).unwrap();
        assert_eq!(pair.left().first_name.as_str(), "Amy");
    }

    #[test]
    fn canonical_pair_is_symmetric() {
        let canon = PairCanonicalizer::new(VisitorOrder::default());
        let a = VisitorKey::new("Amy", "Lee");
        let b = VisitorKey::new("Bo", "Ng");
        assert_eq!(
            canon.canonical_pair(a.clone(), b.clone()),
            canon.canonical_pair(b, a.clone())
        );
        assert_eq!(canon.canonical_pair(a.clone(), a), None);
    }

    #[test]
    fn duplicate_records_multiply() {
        // Amy twice and Bo once on d1: two distinct record pairs.
        let partitions = join(vec![
            visit("Amy", "Lee", "d1"),
            visit("Bo", "Ng", "d1"),
            visit("Amy", "Lee", "d1"),
        ]);
        let canon = PairCanonicalizer::new(VisitorOrder::default());
        let counts = GroupedCounter::count(canon.filter_pairs(joined(&partitions)), |p| p);
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[0].count, 2);
    }

    fn records() -> impl Strategy<Value = Vec<VisitRecord>> {
        collection::vec(("[abc]", "[xy]", "[1-4]"), 0..40).prop_map(|rows| {
            rows.into_iter()
                .map(|(f, l, d)| visit(&f, &l, &d))
                .collect()
        })
    }

    fn any_order() -> impl Strategy<Value = VisitorOrder> {
        prop_oneof![
            Just(VisitorOrder::ConcatenatedName),
            Just(VisitorOrder::LastThenFirst),
            Just(VisitorOrder::FirstThenLast),
        ]
    }

    proptest! {
        #[test]
        fn pair_key_invariant(input in records(), order in any_order()) {
            let partitions = join(input);
            let canon = PairCanonicalizer::new(order);
            let pairs: BTreeSet<_> = canon.filter_pairs(joined(&partitions)).collect();

            for pair in &pairs {
                prop_assert_ne!(pair.left(), pair.right());
                prop_assert!(order.is_less(pair.left(), pair.right()));

                let (left, right) = (pair.left().clone(), pair.right().clone());
                let mirrored = pairs.iter().any(|p| p.left() == &right && p.right() == &left);
                prop_assert!(!mirrored);
            }
        }

        #[test]
        fn one_instance_per_distinct_record_pair(input in records(), order in any_order()) {
            let partitions = join(input.clone());
            let canon = PairCanonicalizer::new(order);
            let counts: BTreeMap<_, u64> =
                GroupedCounter::count(canon.filter_pairs(joined(&partitions)), |p| p)
                    .into_iter()
                    .map(|e| (e.key.into_parts(), e.count))
                    .collect();

            // Brute force over unordered pairs of record positions.
            let mut expected: BTreeMap<(VisitorKey, VisitorKey), u64> = BTreeMap::new();
            for i in 0..input.len() {
                for j in i + 1..input.len() {
                    let (a, b) = (&input[i], &input[j]);
                    if a.date != b.date || a.visitor() == b.visitor() {
                        continue;
                    }
                    let key = if order.is_less(&a.visitor(), &b.visitor()) {
                        (a.visitor(), b.visitor())
                    } else {
                        (b.visitor(), a.visitor())
                    };
                    *expected.entry(key).or_insert(0) += 1;
                }
            }

            prop_assert_eq!(counts, expected);
        }
    }
}
