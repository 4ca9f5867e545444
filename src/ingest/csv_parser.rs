//! Positional CSV parsing for uploads and CSV serialization for exports

use super::record::{ParseError, Record, EXPORT_HEADER};
use csv::{ReaderBuilder, WriterBuilder};
use std::io::{Read, Write};

/// Parse one uploaded CSV member into validated records
///
/// The first row is treated as a header: it is logged and skipped, never
/// checked against expected column names. Any bad row aborts the whole
/// member, so callers only ever see a complete batch or an error.
///
/// A header-only (or empty) member yields an empty batch.
pub fn parse_records<R: Read>(input: R) -> Result<Vec<Record>, ParseError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        // Column counts are checked per row by `Record::from_fields`
        .flexible(true)
        .from_reader(input);

    let header = reader.headers()?.clone();
    log::debug!("CSV header: {:?}", header);

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let line = row.position().map(|p| p.line()).unwrap_or(0);
        let fields: Vec<&str> = row.iter().collect();

        let record = Record::from_fields(&fields, line)?;
        log::trace!("   ├─ line {}: id={} category={}", line, record.id, record.category);
        records.push(record);
    }

    Ok(records)
}

/// Write records as an export CSV: fixed header, then one row per record
///
/// The header is always written, so an empty slice still produces a valid
/// single-line file.
pub fn write_records<W: Write>(output: W, records: &[Record]) -> Result<W, csv::Error> {
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(output);

    writer.write_record(EXPORT_HEADER)?;
    for record in records {
        writer.serialize(record)?;
    }

    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}
