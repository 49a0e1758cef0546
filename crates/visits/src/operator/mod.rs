//! Pipeline operators.
//!
//! Each operator consumes and produces plain iterators or owns a small
//! amount of per-key state; composition happens in
//! [`pipeline`](crate::pipeline).

mod count;
mod join;
mod normalize;
mod pairs;
mod topk;

pub use count::GroupedCounter;
pub use join::{join, DatePartition, SameDateJoiner};
pub use normalize::{Normalizer, RawRow};
pub use pairs::PairCanonicalizer;
pub use topk::top_n;
