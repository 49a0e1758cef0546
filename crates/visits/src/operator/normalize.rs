//! Projection of raw input rows onto [`VisitRecord`]s.

use crate::{
    config::FieldMapping,
    error::{Result, VisitError},
    model::VisitRecord,
};
use arcstr::ArcStr;
use std::sync::Arc;

/// A raw input row: a sequence of named fields.
///
/// All rows read from one source share a single header.  A row may have
/// fewer values than the header has names; the trailing fields are then
/// absent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawRow {
    position: u64,
    header: Arc<[String]>,
    values: Vec<ArcStr>,
}

impl RawRow {
    /// Creates a row.  `position` identifies the row in error messages.
    pub fn new(position: u64, header: Arc<[String]>, values: Vec<ArcStr>) -> Self {
        Self {
            position,
            header,
            values,
        }
    }

    /// Builds rows from a literal table, numbering them from 1.
    pub fn from_table(header: &[&str], rows: &[&[&str]]) -> Vec<Self> {
        let header: Arc<[String]> = header.iter().map(|name| name.to_string()).collect();
        rows.iter()
            .zip(1..)
            .map(|(values, position)| {
                Self::new(
                    position,
                    header.clone(),
                    values.iter().map(|v| ArcStr::from(*v)).collect(),
                )
            })
            .collect()
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    /// Looks up a field by name, ignoring ASCII case and surrounding
    /// whitespace in the header.
    pub fn get(&self, name: &str) -> Option<&ArcStr> {
        let index = self
            .header
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))?;
        self.values.get(index)
    }
}

/// Selects the first name, last name and date fields of each row and drops
/// everything else.
#[derive(Clone, Debug, Default)]
pub struct Normalizer {
    fields: FieldMapping,
}

impl Normalizer {
    pub fn new(fields: FieldMapping) -> Self {
        Self { fields }
    }

    /// Projects `row` onto a [`VisitRecord`].
    ///
    /// Fails with [`VisitError::Schema`] if a required field is absent and
    /// with [`VisitError::MalformedRecord`] if one is blank.  Values are
    /// otherwise kept exactly as read.
    pub fn normalize(&self, row: &RawRow) -> Result<VisitRecord> {
        let first_name = self.field(row, &self.fields.first_name)?;
        let last_name = self.field(row, &self.fields.last_name)?;
        let date = self.field(row, &self.fields.date)?;

        Ok(VisitRecord {
            first_name,
            last_name,
            date,
        })
    }

    fn field(&self, row: &RawRow, name: &str) -> Result<ArcStr> {
        let value = row
            .get(name)
            .ok_or_else(|| VisitError::schema(row.position(), name))?;
        if value.trim().is_empty() {
            return Err(VisitError::malformed(row.position(), name, "empty value"));
        }
        Ok(value.clone())
    }
}
