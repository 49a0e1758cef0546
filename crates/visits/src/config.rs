//! Configuration options for a visit analysis run.

use crate::{
    error::{Result, VisitError},
    order::VisitorOrder,
};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Number of entries kept in each report unless configured otherwise.
pub const DEFAULT_TOP_N: usize = 20;

/// Bounded queue length between the reader and each shard worker.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 10_000;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Maximum number of rows in each report.
    pub top_n: usize,

    /// Names of the required input fields.
    pub fields: FieldMapping,

    /// Order used to canonicalize pairs and to break count ties.
    pub visitor_order: VisitorOrder,

    /// What to do with rows whose required fields are present but unusable.
    pub malformed: MalformedPolicy,

    /// Number of shard workers. `1` runs everything on the calling thread.
    pub workers: usize,

    /// Capacity of the channel feeding each shard worker.
    pub channel_capacity: usize,

    /// Input is grouped by date: all visits of a date are contiguous.
    /// Each date is joined and released as soon as the next one starts,
    /// bounding memory by the largest date.  A date that reappears fails
    /// the run.
    pub date_grouped: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            fields: FieldMapping::default(),
            visitor_order: VisitorOrder::default(),
            malformed: MalformedPolicy::default(),
            workers: 1,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            date_grouped: false,
        }
    }
}

impl AnalysisConfig {
    /// Reads a configuration from a YAML file.  Missing keys take their
    /// default values.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
            .map_err(|e| VisitError::Config(format!("{}: {e}", path.display())))
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).map_err(|e| VisitError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(VisitError::Config("`workers` must be at least 1".into()));
        }
        if self.channel_capacity == 0 {
            return Err(VisitError::Config(
                "`channel_capacity` must be at least 1".into(),
            ));
        }
        for (what, name) in [
            ("first name", &self.fields.first_name),
            ("last name", &self.fields.last_name),
            ("date", &self.fields.date),
        ] {
            if name.trim().is_empty() {
                return Err(VisitError::Config(format!(
                    "field name for {what} must not be empty"
                )));
            }
        }
        Ok(())
    }
}

/// Input field names for the three required values.
///
/// Names are matched against the input header ignoring ASCII case, so the
/// default mapping accepts both `namefirst` and `NAMEFIRST`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldMapping {
    pub first_name: String,
    pub last_name: String,
    pub date: String,
}

impl Default for FieldMapping {
    fn default() -> Self {
        Self {
            first_name: "namefirst".to_string(),
            last_name: "namelast".to_string(),
            date: "appt_start_date".to_string(),
        }
    }
}

/// Handling of malformed rows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum MalformedPolicy {
    /// Drop the row and count it in the run statistics.
    #[default]
    Skip,
    /// Fail the run on the first malformed row.
    Abort,
}
