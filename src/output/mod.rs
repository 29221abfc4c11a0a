//! Module for the record sink: turns completed records into delimited rows.

use std::io::Write;

use csv::{QuoteStyle, Terminator, Writer, WriterBuilder};

use crate::{Error, domain::Record};


/// Builds a writer for a table in the crate's row format. Quoting is left to the sink,
/// which quotes the identity column and nothing else.
pub(crate) fn table_writer<W: Write>(writer: W, delimiter: u8) -> Writer<W> {
    WriterBuilder::new()
        .delimiter(delimiter)
        .quote_style(QuoteStyle::Never)
        .terminator(Terminator::Any(b'\n'))
        .has_headers(false)
        .from_writer(writer)
}

/// Writes the header row of record type `R`.
pub(crate) fn write_header<R: Record, W: Write>(writer: &mut Writer<W>) -> Result<(), Error> {
    writer.write_record(R::HEADER)?;
    Ok(())
}

fn quote(identity: &str) -> String {
    format!("\"{}\"", identity.replace('"', "\"\""))
}

/// Writes every record to a primary table and, optionally, to an aggregate table shared between inputs.
pub struct RecordSink<W: Write> {
    primary: Writer<W>,
    aggregate: Option<Writer<W>>,
    rows: u64,
}

impl<W: Write> RecordSink<W> {
    /// Creates the sink and writes the header of the primary table.
    /// The aggregate header is written only if `aggregate_needs_header` is set.
    pub fn new<R: Record>(
        primary: W,
        aggregate: Option<(W, bool)>,
        delimiter: u8,
    ) -> Result<Self, Error> {
        let mut primary = table_writer(primary, delimiter);
        write_header::<R, _>(&mut primary)?;

        let aggregate = match aggregate {
            Some((writer, needs_header)) => {
                let mut writer = table_writer(writer, delimiter);
                if needs_header {
                    write_header::<R, _>(&mut writer)?;
                }
                Some(writer)
            }
            None => None,
        };

        Ok(Self {
            primary,
            aggregate,
            rows: 0,
        })
    }

    pub fn write<R: Record>(&mut self, record: &R) -> Result<(), Error> {
        let row: Vec<String> = std::iter::once(quote(record.identity()))
            .chain(record.values())
            .collect();

        self.primary.write_record(&row)?;
        if let Some(aggregate) = self.aggregate.as_mut() {
            aggregate.write_record(&row)?;
        }
        self.rows += 1;
        Ok(())
    }

    /// Number of rows written to the primary table, header excluded.
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Flushes both tables and hands back the underlying writers.
    pub fn finish(self) -> Result<(W, Option<W>), Error> {
        let primary = into_inner(self.primary)?;
        let aggregate = self.aggregate.map(into_inner).transpose()?;
        Ok((primary, aggregate))
    }
}

fn into_inner<W: Write>(mut writer: Writer<W>) -> Result<W, Error> {
    writer.flush()?;
    writer
        .into_inner()
        .map_err(|e| Error::Stream(std::io::Error::new(e.error().kind(), e.error().to_string())))
}
