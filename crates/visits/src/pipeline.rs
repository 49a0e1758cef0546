//! Assembly of the two reports from a single pass over the input.
//!
//! ```text
//! rows ─▶ Normalizer ─┬─▶ GroupedCounter<VisitorKey> ─────────────────────────────────▶ top_n ─▶ visitors
//!                     └─▶ SameDateJoiner ─▶ PairCanonicalizer ─▶ GroupedCounter<PairKey> ─▶ top_n ─▶ pairs
//! ```
//!
//! With more than one worker, the reading thread routes visitor keys by
//! visitor hash and records by date hash to worker threads over bounded
//! channels.  Every date partition therefore lives on exactly one worker.
//! Each worker returns partial counts, which are summed per key before
//! either top-N selection runs.
//!
//! With [`AnalysisConfig::date_grouped`] set, each date is joined, counted
//! and released as soon as the next date starts, so a run holds at most
//! one date's visits per worker.

use crate::{
    config::{AnalysisConfig, MalformedPolicy},
    error::{Result, VisitError},
    hash::shard_of,
    io::RecordSink,
    model::{CountedEntry, PairFrequency, PairKey, VisitRecord, VisitorFrequency, VisitorKey},
    operator::{
        top_n, DatePartition, GroupedCounter, Normalizer, PairCanonicalizer, RawRow,
        SameDateJoiner,
    },
    order::VisitorOrder,
};
use crossbeam::channel::bounded;
use serde::Serialize;
use std::thread;
use tracing::{debug, info, warn};

/// Counters describing one run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Rows pulled from the source.
    pub rows_read: u64,
    /// Rows successfully normalized.
    pub records: u64,
    /// Malformed rows dropped under [`MalformedPolicy::Skip`].
    pub malformed_skipped: u64,
    pub distinct_visitors: u64,
    pub distinct_dates: u64,
    /// Size of the largest date partition.
    pub max_date_partition: u64,
    /// Pairs produced by the same-date join, self pairs and mirrors included.
    pub joined_pairs: u64,
    /// Pairs left after canonicalization.
    pub canonical_pairs: u64,
    pub distinct_pairs: u64,
    pub visitor_rows_written: u64,
    pub pair_rows_written: u64,
}

/// Both reports, best entry first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnalysisOutput {
    pub top_visitors: Vec<CountedEntry<VisitorKey>>,
    pub top_pairs: Vec<CountedEntry<PairKey>>,
    pub stats: RunStats,
}

impl AnalysisOutput {
    /// Writes both reports, best row first, and finishes both sinks.
    pub fn write<VS, PS>(self, mut visitor_sink: VS, mut pair_sink: PS) -> Result<RunStats>
    where
        VS: RecordSink<VisitorFrequency>,
        PS: RecordSink<PairFrequency>,
    {
        let mut stats = self.stats;

        for entry in self.top_visitors {
            visitor_sink.accept(entry.into())?;
            stats.visitor_rows_written += 1;
        }
        visitor_sink.finish()?;

        for entry in self.top_pairs {
            pair_sink.accept(entry.into())?;
            stats.pair_rows_written += 1;
        }
        pair_sink.finish()?;

        info!(
            visitor_rows_written = stats.visitor_rows_written,
            pair_rows_written = stats.pair_rows_written,
            "reports written"
        );
        Ok(stats)
    }
}

/// The visit analysis pipeline.
#[derive(Clone, Debug)]
pub struct VisitAnalysis {
    config: AnalysisConfig,
    normalizer: Normalizer,
    canonicalizer: PairCanonicalizer<VisitorOrder>,
}

impl VisitAnalysis {
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            normalizer: Normalizer::new(config.fields.clone()),
            canonicalizer: PairCanonicalizer::new(config.visitor_order),
            config,
        })
    }

    /// Computes both reports from `rows`.
    ///
    /// Fails on the first source error, schema error, or (under
    /// [`MalformedPolicy::Abort`]) malformed row.
    pub fn analyze<I>(&self, rows: I) -> Result<AnalysisOutput>
    where
        I: IntoIterator<Item = Result<RawRow>>,
    {
        info!(
            "starting visit analysis: top_n={}, workers={}, order={:?}",
            self.config.top_n, self.config.workers, self.config.visitor_order
        );

        let mut stats = RunStats::default();
        let counts = if self.config.workers == 1 {
            self.count_sequential(rows, &mut stats)?
        } else {
            self.count_sharded(rows, &mut stats)?
        };

        stats.distinct_visitors = counts.visitors.len() as u64;
        stats.distinct_dates = counts.distinct_dates;
        stats.max_date_partition = counts.max_date_partition;
        stats.joined_pairs = counts.joined_pairs;
        stats.canonical_pairs = counts.pairs.total();
        stats.distinct_pairs = counts.pairs.len() as u64;
        debug!(
            "counted {} visitors over {} dates (largest date has {} visits), {} distinct pairs",
            stats.distinct_visitors,
            stats.distinct_dates,
            stats.max_date_partition,
            stats.distinct_pairs
        );

        let order = &self.config.visitor_order;
        let top_visitors = top_n(counts.visitors.into_entries(), self.config.top_n, order);
        let top_pairs = top_n(counts.pairs.into_entries(), self.config.top_n, order);

        info!(
            rows_read = stats.rows_read,
            records = stats.records,
            malformed_skipped = stats.malformed_skipped,
            joined_pairs = stats.joined_pairs,
            canonical_pairs = stats.canonical_pairs,
            "visit analysis complete"
        );

        Ok(AnalysisOutput {
            top_visitors,
            top_pairs,
            stats,
        })
    }

    /// Computes both reports and writes them to the given sinks.
    pub fn run<I, VS, PS>(&self, rows: I, visitor_sink: VS, pair_sink: PS) -> Result<RunStats>
    where
        I: IntoIterator<Item = Result<RawRow>>,
        VS: RecordSink<VisitorFrequency>,
        PS: RecordSink<PairFrequency>,
    {
        self.analyze(rows)?.write(visitor_sink, pair_sink)
    }

    /// Pulls every row from `rows`, passing normalized records to `emit`.
    fn read_records<I, F>(&self, rows: I, stats: &mut RunStats, mut emit: F) -> Result<()>
    where
        I: IntoIterator<Item = Result<RawRow>>,
        F: FnMut(VisitRecord) -> Result<()>,
    {
        for row in rows {
            let row = row?;
            stats.rows_read += 1;
            match self.normalizer.normalize(&row) {
                Ok(record) => {
                    stats.records += 1;
                    emit(record)?;
                }
                Err(e) if e.is_malformed() && self.config.malformed == MalformedPolicy::Skip => {
                    warn!("skipping row: {e}");
                    stats.malformed_skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn count_sequential<I>(&self, rows: I, stats: &mut RunStats) -> Result<PartialCounts>
    where
        I: IntoIterator<Item = Result<RawRow>>,
    {
        let mut shard = Shard::new(&self.canonicalizer, self.config.date_grouped);
        self.read_records(rows, stats, |record| {
            shard.push(ShardInput::Visitor(record.visitor()))?;
            shard.push(ShardInput::Visit(record))
        })?;
        Ok(shard.finish())
    }

    fn count_sharded<I>(&self, rows: I, stats: &mut RunStats) -> Result<PartialCounts>
    where
        I: IntoIterator<Item = Result<RawRow>>,
    {
        let workers = self.config.workers;
        let canonicalizer = &self.canonicalizer;
        let date_grouped = self.config.date_grouped;

        thread::scope(|scope| -> Result<PartialCounts> {
            let mut senders = Vec::with_capacity(workers);
            let mut handles = Vec::with_capacity(workers);

            for worker in 0..workers {
                let (sender, receiver) = bounded::<ShardInput>(self.config.channel_capacity);
                let handle = thread::Builder::new()
                    .name(format!("visits-shard-{worker}"))
                    .spawn_scoped(scope, move || -> Result<PartialCounts> {
                        let mut shard = Shard::new(canonicalizer, date_grouped);
                        for input in receiver {
                            shard.push(input)?;
                        }
                        Ok(shard.finish())
                    })
                    .map_err(|e| {
                        VisitError::Worker(format!("failed to spawn shard {worker}: {e}"))
                    })?;
                senders.push(sender);
                handles.push(handle);
            }

            let read = self.read_records(rows, stats, |record| {
                let visitor = record.visitor();
                let by_visitor = shard_of(&visitor, workers);
                let by_date = shard_of(&record.date, workers);
                senders[by_visitor]
                    .send(ShardInput::Visitor(visitor))
                    .map_err(|_| shard_gone(by_visitor))?;
                senders[by_date]
                    .send(ShardInput::Visit(record))
                    .map_err(|_| shard_gone(by_date))
            });

            // Closing the channels lets the workers run their joins.
            drop(senders);

            // A worker's own error outranks the reader's send failure.
            let mut merged = PartialCounts::default();
            let mut failure = None;
            for (worker, handle) in handles.into_iter().enumerate() {
                match handle.join() {
                    Ok(Ok(partial)) => merged.merge(partial),
                    Ok(Err(e)) => {
                        failure.get_or_insert(e);
                    }
                    Err(_) => {
                        let panicked = VisitError::Worker(format!("shard {worker} panicked"));
                        failure.get_or_insert(panicked);
                    }
                }
            }
            if let Some(e) = failure {
                return Err(e);
            }

            read?;
            Ok(merged)
        })
    }
}

fn shard_gone(worker: usize) -> VisitError {
    VisitError::Worker(format!("shard {worker} stopped accepting input"))
}

enum ShardInput {
    Visitor(VisitorKey),
    Visit(VisitRecord),
}

/// State owned by one worker.
struct Shard<'a> {
    canonicalizer: &'a PairCanonicalizer<VisitorOrder>,
    visitors: GroupedCounter<VisitorKey>,
    joiner: SameDateJoiner,
    pairs: GroupedCounter<PairKey>,
    joined_pairs: u64,
}

impl<'a> Shard<'a> {
    fn new(canonicalizer: &'a PairCanonicalizer<VisitorOrder>, date_grouped: bool) -> Self {
        let joiner = if date_grouped {
            SameDateJoiner::date_grouped()
        } else {
            SameDateJoiner::new()
        };
        Self {
            canonicalizer,
            visitors: GroupedCounter::new(),
            joiner,
            pairs: GroupedCounter::new(),
            joined_pairs: 0,
        }
    }

    fn push(&mut self, input: ShardInput) -> Result<()> {
        match input {
            ShardInput::Visitor(visitor) => self.visitors.insert(visitor),
            ShardInput::Visit(record) => {
                if let Some(partition) = self.joiner.insert(record)? {
                    self.count_pairs(&partition);
                }
            }
        }
        Ok(())
    }

    fn count_pairs(&mut self, partition: &DatePartition) {
        self.joined_pairs += partition.joined_len();
        self.pairs.extend(self.canonicalizer.filter_pairs(partition.pairs()));
    }

    fn finish(mut self) -> PartialCounts {
        let joiner = std::mem::take(&mut self.joiner);
        let distinct_dates = joiner.date_count() as u64;
        let max_date_partition = joiner.max_partition_len() as u64;
        for partition in joiner.finish() {
            self.count_pairs(&partition);
        }

        PartialCounts {
            visitors: self.visitors,
            pairs: self.pairs,
            joined_pairs: self.joined_pairs,
            distinct_dates,
            max_date_partition,
        }
    }
}

#[derive(Default)]
struct PartialCounts {
    visitors: GroupedCounter<VisitorKey>,
    pairs: GroupedCounter<PairKey>,
    joined_pairs: u64,
    distinct_dates: u64,
    max_date_partition: u64,
}

impl PartialCounts {
    /// Date partitions never span workers, so date statistics add up.
    fn merge(&mut self, other: Self) {
        self.visitors.merge(other.visitors);
        self.pairs.merge(other.pairs);
        self.joined_pairs += other.joined_pairs;
        self.distinct_dates += other.distinct_dates;
        self.max_date_partition = self.max_date_partition.max(other.max_date_partition);
    }
}
