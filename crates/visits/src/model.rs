//! Records, keys and report rows.
//!
//! Names and dates are held as [`ArcStr`] so that deriving keys from records
//! and fanning records out to workers only bumps reference counts.

use arcstr::ArcStr;
use serde::{Deserialize, Serialize};

/// One normalized visit: a single visitor on a single appointment date.
///
/// Dates are opaque and only ever compared for equality.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VisitRecord {
    pub first_name: ArcStr,
    pub last_name: ArcStr,
    pub date: ArcStr,
}

impl VisitRecord {
    pub fn new(
        first_name: impl Into<ArcStr>,
        last_name: impl Into<ArcStr>,
        date: impl Into<ArcStr>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            date: date.into(),
        }
    }

    /// Identity of the person behind this visit.
    pub fn visitor(&self) -> VisitorKey {
        VisitorKey {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
        }
    }
}

/// A person, identified by exact first and last name.
///
/// Two people sharing a name collapse into one key.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VisitorKey {
    pub first_name: ArcStr,
    pub last_name: ArcStr,
}

impl VisitorKey {
    pub fn new(first_name: impl Into<ArcStr>, last_name: impl Into<ArcStr>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }
}

/// An unordered pair of distinct visitors in canonical orientation.
///
/// `left` sorts strictly before `right` under the order the pair was
/// canonicalized with.  The only constructor is
/// [`PairCanonicalizer`](crate::operator::PairCanonicalizer), which is what
/// keeps `(a, b)` and `(b, a)` from being counted separately.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey {
    left: VisitorKey,
    right: VisitorKey,
}

impl PairKey {
    pub(crate) fn new_unchecked(left: VisitorKey, right: VisitorKey) -> Self {
        debug_assert_ne!(left, right);
        Self { left, right }
    }

    pub fn left(&self) -> &VisitorKey {
        &self.left
    }

    pub fn right(&self) -> &VisitorKey {
        &self.right
    }

    pub fn into_parts(self) -> (VisitorKey, VisitorKey) {
        (self.left, self.right)
    }
}

/// A distinct key together with the number of records that mapped to it.
///
/// Produced by [`GroupedCounter`](crate::operator::GroupedCounter); `count`
/// is never zero.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CountedEntry<K> {
    pub key: K,
    pub count: u64,
}

impl<K> CountedEntry<K> {
    pub fn new(key: K, count: u64) -> Self {
        Self { key, count }
    }
}

/// Row of the visitor frequency report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitorFrequency {
    #[serde(rename = "namefirst")]
    pub first_name: ArcStr,
    #[serde(rename = "namelast")]
    pub last_name: ArcStr,
    pub visits_count: u64,
}

impl VisitorFrequency {
    /// Column names of the report, in field order.
    pub const HEADER: [&'static str; 3] = ["namefirst", "namelast", "visits_count"];

    pub fn new(first_name: &str, last_name: &str, visits_count: u64) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            visits_count,
        }
    }
}

impl From<CountedEntry<VisitorKey>> for VisitorFrequency {
    fn from(entry: CountedEntry<VisitorKey>) -> Self {
        Self {
            first_name: entry.key.first_name,
            last_name: entry.key.last_name,
            visits_count: entry.count,
        }
    }
}

/// Row of the visitor pair frequency report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairFrequency {
    #[serde(rename = "leftnamefirst")]
    pub left_first_name: ArcStr,
    #[serde(rename = "leftnamelast")]
    pub left_last_name: ArcStr,
    #[serde(rename = "rightnamefirst")]
    pub right_first_name: ArcStr,
    #[serde(rename = "rightnamelast")]
    pub right_last_name: ArcStr,
    pub visitor_pair_count: u64,
}

impl PairFrequency {
    /// Column names of the report, in field order.
    pub const HEADER: [&'static str; 5] = [
        "leftnamefirst",
        "leftnamelast",
        "rightnamefirst",
        "rightnamelast",
        "visitor_pair_count",
    ];

    pub fn new(
        left_first_name: &str,
        left_last_name: &str,
        right_first_name: &str,
        right_last_name: &str,
        visitor_pair_count: u64,
    ) -> Self {
        Self {
            left_first_name: left_first_name.into(),
            left_last_name: left_last_name.into(),
            right_first_name: right_first_name.into(),
            right_last_name: right_last_name.into(),
            visitor_pair_count,
        }
    }
}

impl From<CountedEntry<PairKey>> for PairFrequency {
    fn from(entry: CountedEntry<PairKey>) -> Self {
        let (left, right) = entry.key.into_parts();
        Self {
            left_first_name: left.first_name,
            left_last_name: left.last_name,
            right_first_name: right.first_name,
            right_last_name: right.last_name,
            visitor_pair_count: entry.count,
        }
    }
}
