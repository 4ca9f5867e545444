//! Store export: rows → CSV → single-entry zip
//!
//! The archive is assembled in memory so the HTTP layer knows the exact
//! `Content-Length` before any byte of the response is committed.

use crate::ingest::csv_parser::write_records;
use crate::ingest::record::Record;
use crate::store::{PersistenceError, PriceStore};
use std::io::Cursor;
use thiserror::Error;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Name of the CSV entry inside the export archive
pub const EXPORT_ENTRY_NAME: &str = "data.csv";

/// `Content-Disposition` offered to the client
pub const EXPORT_DISPOSITION: &str = "attachment; filename=data.zip";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to read rows: {0}")]
    Read(#[from] PersistenceError),

    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to build archive: {0}")]
    Zip(#[from] ZipError),

    #[error("export worker failed: {0}")]
    Worker(String),
}

/// Serialize `records` to CSV and wrap them in a zip holding `data.csv`
pub fn build_archive(records: &[Record]) -> Result<Vec<u8>, ExportError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file(EXPORT_ENTRY_NAME, options)?;
    write_records(&mut zip, records)?;

    let bytes = zip.finish()?.into_inner();
    Ok(bytes)
}

/// Snapshot the whole store into an export archive
pub async fn export_archive(store: &dyn PriceStore) -> Result<Vec<u8>, ExportError> {
    let records = store.all_rows().await?;
    let row_count = records.len();

    let bytes = tokio::task::spawn_blocking(move || build_archive(&records))
        .await
        .map_err(|e| ExportError::Worker(e.to_string()))??;

    log::info!("📦 Export ready: {} rows, {} bytes", row_count, bytes.len());
    Ok(bytes)
}
