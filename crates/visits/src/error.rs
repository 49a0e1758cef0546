//! Errors reported by the visit analysis pipeline.

use thiserror::Error;

pub type Result<T, E = VisitError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum VisitError {
    /// A required field is absent from a row.  Always aborts the run.
    #[error("row {position}: required field `{field}` is missing")]
    Schema { position: u64, field: String },

    /// A required field is present but unusable (e.g. an empty name).
    #[error("row {position}: field `{field}` is malformed: {reason}")]
    MalformedRecord {
        position: u64,
        field: String,
        reason: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("delimited text error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    /// A date reappeared after its partition was joined, in a run that
    /// assumes input grouped by date.
    #[error("date `{date}` reappears after its visits were joined; input is not grouped by date")]
    DateOrder { date: String },

    #[error("shard worker failed: {0}")]
    Worker(String),
}

impl VisitError {
    pub fn schema(position: u64, field: impl Into<String>) -> Self {
        Self::Schema {
            position,
            field: field.into(),
        }
    }

    pub fn malformed(position: u64, field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            position,
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Returns `true` for errors that the skip policy is allowed to swallow.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedRecord { .. })
    }

    /// Position of the offending row, for row-level errors.
    pub fn position(&self) -> Option<u64> {
        match self {
            Self::Schema { position, .. } | Self::MalformedRecord { position, .. } => {
                Some(*position)
            }
            _ => None,
        }
    }
}
