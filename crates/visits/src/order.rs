//! Total orders over keys.
//!
//! The pair canonicalizer and the top-N tie-break both need a total order
//! over visitors that may be chosen at run time, so orders are values
//! implementing [`KeyOrder`] rather than `Ord` impls on the key types.

use crate::model::{PairKey, VisitorKey};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Custom comparison function.
///
/// ## Correctness
///
/// Implementations must establish a _total_ order over `K`, consistent with
/// `impl Eq for K`, i.e., `cmp(k1, k2) == Equal <=> k1.eq(k2)`.
pub trait KeyOrder<K>: Send + Sync {
    fn cmp(&self, left: &K, right: &K) -> Ordering;

    fn is_less(&self, left: &K, right: &K) -> bool {
        self.cmp(left, right) == Ordering::Less
    }
}

/// Orders keys by their `Ord` impl.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NaturalOrder;

impl<K: Ord> KeyOrder<K> for NaturalOrder {
    fn cmp(&self, left: &K, right: &K) -> Ordering {
        left.cmp(right)
    }
}

/// Configurable order over [`VisitorKey`]s, extended to [`PairKey`]s by
/// comparing `left` and then `right`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum VisitorOrder {
    /// Lexicographic on the concatenation `last_name + first_name`.
    ///
    /// Distinct visitors can concatenate to the same string ("Ab"+"c" and
    /// "A"+"bc"); those are ordered by `(last_name, first_name)`.
    #[default]
    ConcatenatedName,
    /// Lexicographic on `(last_name, first_name)`.
    LastThenFirst,
    /// Lexicographic on `(first_name, last_name)`.
    FirstThenLast,
}

impl VisitorOrder {
    fn last_then_first(left: &VisitorKey, right: &VisitorKey) -> Ordering {
        left.last_name
            .cmp(&right.last_name)
            .then_with(|| left.first_name.cmp(&right.first_name))
    }
}

impl KeyOrder<VisitorKey> for VisitorOrder {
    fn cmp(&self, left: &VisitorKey, right: &VisitorKey) -> Ordering {
        match self {
            Self::ConcatenatedName => {
                let l = left.last_name.bytes().chain(left.first_name.bytes());
                let r = right.last_name.bytes().chain(right.first_name.bytes());
                l.cmp(r)
                    .then_with(|| Self::last_then_first(left, right))
            }
            Self::LastThenFirst => Self::last_then_first(left, right),
            Self::FirstThenLast => left
                .first_name
                .cmp(&right.first_name)
                .then_with(|| left.last_name.cmp(&right.last_name)),
        }
    }
}

impl KeyOrder<PairKey> for VisitorOrder {
    fn cmp(&self, left: &PairKey, right: &PairKey) -> Ordering {
        KeyOrder::<VisitorKey>::cmp(self, left.left(), right.left())
            .then_with(|| KeyOrder::<VisitorKey>::cmp(self, left.right(), right.right()))
    }
}
