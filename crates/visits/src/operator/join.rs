//! Self-join of visit records on equal dates.

use crate::{
    error::{Result, VisitError},
    model::VisitRecord,
};
use arcstr::ArcStr;
use indexmap::{IndexMap, IndexSet};

/// All records sharing one date.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatePartition {
    date: ArcStr,
    records: Vec<VisitRecord>,
}

impl DatePartition {
    pub fn date(&self) -> &ArcStr {
        &self.date
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of pairs [`pairs`](Self::pairs) produces: `M²` for `M`
    /// records.
    pub fn joined_len(&self) -> u64 {
        (self.records.len() as u64).pow(2)
    }

    /// Every ordered pair `(a, b)` of records in the partition, including
    /// each record paired with itself.
    pub fn pairs(&self) -> impl Iterator<Item = (&VisitRecord, &VisitRecord)> + '_ {
        self.records
            .iter()
            .flat_map(move |a| self.records.iter().map(move |b| (a, b)))
    }
}

/// Equi-join of a record stream with itself on `date`.
///
/// A partition has to be fully materialized before it can be joined
/// against itself.  The joiner runs in one of two modes:
///
/// * buffered ([`new`](Self::new)): every partition stays open until
///   [`finish`](Self::finish), so records may arrive in any order and
///   memory is bounded by the whole input;
/// * date-grouped ([`date_grouped`](Self::date_grouped)): a record with a
///   new date seals the open partition, which [`insert`](Self::insert)
///   hands back for joining and then forgets.  Memory is bounded by the
///   largest partition.  A sealed date may not appear again.
///
/// Join output is quadratic in partition size and is produced lazily by
/// [`DatePartition::pairs`].
#[derive(Clone, Debug, Default)]
pub struct SameDateJoiner {
    date_grouped: bool,
    open: IndexMap<ArcStr, Vec<VisitRecord>>,
    sealed: IndexSet<ArcStr>,
    records: u64,
    max_partition_len: usize,
}

/// Partitions `records` by date, ready to be joined.
pub fn join<I>(records: I) -> Vec<DatePartition>
where
    I: IntoIterator<Item = VisitRecord>,
{
    let mut joiner = SameDateJoiner::new();
    for record in records {
        joiner.push(record);
    }
    joiner.finish().collect()
}

impl SameDateJoiner {
    pub fn new() -> Self {
        Self::default()
    }

    /// A joiner for input whose records are grouped by date.
    pub fn date_grouped() -> Self {
        Self {
            date_grouped: true,
            ..Self::default()
        }
    }

    /// Adds a record.
    ///
    /// In date-grouped mode, a record opening a new date returns the
    /// partition it sealed, and a record for an already sealed date fails
    /// with [`VisitError::DateOrder`].
    pub fn insert(&mut self, record: VisitRecord) -> Result<Option<DatePartition>> {
        if !self.date_grouped || self.open.contains_key(&record.date) {
            self.push(record);
            return Ok(None);
        }
        if self.sealed.contains(&record.date) {
            return Err(VisitError::DateOrder {
                date: record.date.to_string(),
            });
        }

        let sealed = self.open.pop().map(|(date, records)| {
            self.sealed.insert(date.clone());
            DatePartition { date, records }
        });
        self.push(record);
        Ok(sealed)
    }

    fn push(&mut self, record: VisitRecord) {
        let partition = self.open.entry(record.date.clone()).or_default();
        partition.push(record);
        self.max_partition_len = self.max_partition_len.max(partition.len());
        self.records += 1;
    }

    /// Number of records inserted.
    pub fn len(&self) -> u64 {
        self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records == 0
    }

    /// Number of distinct dates seen.
    pub fn date_count(&self) -> usize {
        self.open.len() + self.sealed.len()
    }

    /// Number of partitions currently held in memory.
    pub fn retained_partitions(&self) -> usize {
        self.open.len()
    }

    /// Size of the largest date partition seen.
    pub fn max_partition_len(&self) -> usize {
        self.max_partition_len
    }

    /// Seals and returns every open partition, in order of first
    /// appearance.
    pub fn finish(self) -> impl Iterator<Item = DatePartition> {
        self.open
            .into_iter()
            .map(|(date, records)| DatePartition { date, records })
    }
}
