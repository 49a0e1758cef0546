//! Delimited text (CSV, TSV) sources and sinks.

use super::RecordSink;
use crate::{
    error::{Result, VisitError},
    operator::RawRow,
};
use arcstr::ArcStr;
use csv::{
    Reader as CsvReader, ReaderBuilder as CsvReaderBuilder, StringRecord,
    Writer as CsvWriter, WriterBuilder as CsvWriterBuilder,
};
use serde::Serialize;
use std::{
    fs::File,
    io::{Read, Write},
    path::Path,
    sync::Arc,
};
use tracing::debug;

/// Reads rows from delimited text with a header line.
///
/// Fields may be quoted with `"`.  Rows may be shorter or longer than the
/// header; a missing required field is reported by the normalizer, not here.
/// Rows are numbered from 1, not counting the header.
pub struct DelimitedSource<R> {
    reader: CsvReader<R>,
    header: Arc<[String]>,
    record: StringRecord,
    position: u64,
}

impl DelimitedSource<File> {
    pub fn from_path(path: impl AsRef<Path>, delimiter: u8) -> Result<Self> {
        let path = path.as_ref();
        debug!("reading visits from {}", path.display());
        Self::from_reader(File::open(path)?, delimiter)
    }
}

impl<R> DelimitedSource<R>
where
    R: Read,
{
    pub fn from_reader(reader: R, delimiter: u8) -> Result<Self> {
        let mut reader = CsvReaderBuilder::new()
            .delimiter(delimiter)
            .quote(b'"')
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        let header = reader.headers()?.iter().map(String::from).collect();

        Ok(Self {
            reader,
            header,
            record: StringRecord::new(),
            position: 0,
        })
    }
}

impl<R> Iterator for DelimitedSource<R>
where
    R: Read,
{
    type Item = Result<RawRow>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.read_record(&mut self.record) {
            Ok(false) => None,
            Ok(true) => {
                self.position += 1;
                let values = self.record.iter().map(ArcStr::from).collect();
                Some(Ok(RawRow::new(self.position, self.header.clone(), values)))
            }
            Err(e) => Some(Err(e.into())),
        }
    }
}

/// Writes rows as delimited text, starting with a header line.
///
/// The header is written up front, so an empty report still produces a
/// header-only file.
pub struct DelimitedSink<W: Write> {
    writer: CsvWriter<W>,
    rows: u64,
}

impl DelimitedSink<File> {
    pub fn create(path: impl AsRef<Path>, delimiter: u8, header: &[&str]) -> Result<Self> {
        Self::from_writer(File::create(path)?, delimiter, header)
    }
}

impl<W> DelimitedSink<W>
where
    W: Write,
{
    pub fn from_writer(writer: W, delimiter: u8, header: &[&str]) -> Result<Self> {
        let mut writer = CsvWriterBuilder::new()
            .delimiter(delimiter)
            .quote(b'"')
            .has_headers(false)
            .from_writer(writer);
        writer.write_record(header)?;

        Ok(Self { writer, rows: 0 })
    }

    /// Number of rows written, excluding the header.
    pub fn rows_written(&self) -> u64 {
        self.rows
    }

    /// Flushes and returns the underlying writer.
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| VisitError::from(e.into_error()))
    }
}

impl<T, W> RecordSink<T> for DelimitedSink<W>
where
    T: Serialize,
    W: Write,
{
    fn accept(&mut self, row: T) -> Result<()> {
        self.writer.serialize(row)?;
        self.rows += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{DelimitedSink, DelimitedSource};
    use crate::{
        error::VisitError,
        io::RecordSink,
        model::{PairFrequency, VisitorFrequency},
    };
    use pretty_assertions::assert_eq;

    #[test]
    fn reads_quoted_csv_with_header() {
        let input = "NAMELAST,NAMEFIRST,APPT_START_DATE\n\
                     \"Lee, Jr.\",Amy,1/1/15\n\
                     Ng,Bo,1/2/15,extra\n";
        let rows: Vec<_> = DelimitedSource::from_reader(input.as_bytes(), b',')
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].position(), 1);
        assert_eq!(rows[0].get("namelast").unwrap().as_str(), "Lee, Jr.");
        assert_eq!(rows[1].position(), 2);
        assert_eq!(rows[1].get("appt_start_date").unwrap().as_str(), "1/2/15");
    }

    #[test]
    fn short_rows_are_passed_through() {
        let input = "namefirst,namelast,appt_start_date\nAmy,Lee\n";
        let mut source = DelimitedSource::from_reader(input.as_bytes(), b',').unwrap();
        let row = source.next().unwrap().unwrap();
        assert!(row.get("appt_start_date").is_none());
        assert!(source.next().is_none());
    }

    #[test]
    fn invalid_utf8_is_an_error() {
        let input: &[u8] = b"namefirst,namelast,appt_start_date\n\xff,Lee,d1\n";
        let mut source = DelimitedSource::from_reader(input, b',').unwrap();
        assert!(matches!(source.next(), Some(Err(VisitError::Csv(_)))));
    }

    #[test]
    fn writes_tsv_with_header() {
        let mut sink = DelimitedSink::from_writer(
            Vec::new(),
            b'\t',
            &["namefirst", "namelast", "visits_count"],
        )
        .unwrap();
        sink.accept(VisitorFrequency::new("Amy", "Lee", 2)).unwrap();
        sink.accept(VisitorFrequency::new("Bo", "Ng", 1)).unwrap();
        RecordSink::<VisitorFrequency>::finish(&mut sink).unwrap();
        assert_eq!(sink.rows_written(), 2);

        let text = String::from_utf8(sink.into_inner().unwrap()).unwrap();
        assert_eq!(
            text,
            "namefirst\tnamelast\tvisits_count\nAmy\tLee\t2\nBo\tNg\t1\n"
        );
    }

    #[test]
    fn empty_report_still_has_header() {
        let sink = DelimitedSink::from_writer(
            Vec::new(),
            b'\t',
            &[
                "leftnamefirst",
                "leftnamelast",
                "rightnamefirst",
                "rightnamelast",
                "visitor_pair_count",
            ],
        )
        .unwrap();
        let text = String::from_utf8(sink.into_inner().unwrap()).unwrap();
        assert_eq!(
            text,
            "leftnamefirst\tleftnamelast\trightnamefirst\trightnamelast\tvisitor_pair_count\n"
        );
    }

    #[test]
    fn pair_rows_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pairs.tsv");

        let mut sink = DelimitedSink::create(&path, b'\t', &["a", "b", "c", "d", "n"]).unwrap();
        sink.accept(PairFrequency::new("Amy", "Lee", "Bo", "Ng", 3))
            .unwrap();
        RecordSink::<PairFrequency>::finish(&mut sink).unwrap();
        drop(sink);

        let rows: Vec<_> = DelimitedSource::from_path(&path, b'\t')
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("N").unwrap().as_str(), "3");
        assert_eq!(rows[0].get("c").unwrap().as_str(), "Bo");
    }
}
