//! Boundaries of the pipeline: where rows come from and where reports go.
//!
//! A record source is any iterator of `Result<RawRow>`; iterating it once
//! must visit every row.  Reports are pushed into [`RecordSink`]s, best row
//! first.

mod delimited;

pub use delimited::{DelimitedSink, DelimitedSource};

use crate::error::Result;

/// Consumer of report rows.
pub trait RecordSink<T> {
    /// Accepts the next row.
    fn accept(&mut self, row: T) -> Result<()>;

    /// Called once after the last row.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<T, S> RecordSink<T> for &mut S
where
    S: RecordSink<T> + ?Sized,
{
    fn accept(&mut self, row: T) -> Result<()> {
        (**self).accept(row)
    }

    fn finish(&mut self) -> Result<()> {
        (**self).finish()
    }
}

/// Sink that keeps rows in memory.
#[derive(Clone, Debug)]
pub struct VecSink<T> {
    rows: Vec<T>,
    finished: bool,
}

impl<T> Default for VecSink<T> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            finished: false,
        }
    }
}

impl<T> VecSink<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<T> {
        self.rows
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl<T> RecordSink<T> for VecSink<T> {
    fn accept(&mut self, row: T) -> Result<()> {
        self.rows.push(row);
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        Ok(())
    }
}
