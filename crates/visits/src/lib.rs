//! Visit log analytics.
//!
//! Computes two reports over a log of visit records (first name, last name,
//! appointment date):
//!
//! * the `N` most frequent visitors, and
//! * the `N` most frequent pairs of distinct visitors seen on the same date.
//!
//! The computation is a batch pipeline assembled from a handful of
//! operators in [`operator`]: a record normalizer, a generic grouped
//! counter, a same-date self-join, a pair canonicalizer and a bounded top-N
//! selector.  [`pipeline::VisitAnalysis`] wires them together, either on the
//! calling thread or sharded across worker threads.
//!
//! ```
//! use visits::{io::VecSink, pipeline::VisitAnalysis, operator::RawRow, AnalysisConfig};
//!
//! let rows = RawRow::from_table(
//!     &["NAMEFIRST", "NAMELAST", "APPT_START_DATE"],
//!     &[
//!         &["Amy", "Lee", "2015-01-01"],
//!         &["Bo", "Ng", "2015-01-01"],
//!     ],
//! );
//!
//! let mut visitors = VecSink::new();
//! let mut pairs = VecSink::new();
//! VisitAnalysis::new(AnalysisConfig::default())
//!     .unwrap()
//!     .run(rows.into_iter().map(Ok), &mut visitors, &mut pairs)
//!     .unwrap();
//!
//! assert_eq!(visitors.rows().len(), 2);
//! assert_eq!(pairs.rows()[0].visitor_pair_count, 1);
//! ```

pub mod config;
pub mod error;
pub mod hash;
pub mod io;
pub mod logging;
pub mod model;
pub mod operator;
pub mod order;
pub mod pipeline;

pub use config::{AnalysisConfig, FieldMapping, MalformedPolicy};
pub use error::{Result, VisitError};
pub use model::{CountedEntry, PairKey, VisitRecord, VisitorKey};
pub use order::{KeyOrder, NaturalOrder, VisitorOrder};
pub use pipeline::{AnalysisOutput, RunStats, VisitAnalysis};
