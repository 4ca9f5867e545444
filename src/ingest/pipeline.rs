//! End-to-end ingestion of one uploaded archive

use super::archive::{self, ArchiveError};
use super::csv_parser::parse_records;
use super::record::{ParseError, Record};
use crate::store::{AggregateSnapshot, PersistenceError, PriceStore};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Stages an upload passes through, in order
///
/// `Parsed` and `Validated` are reached per member. `Inserted` and
/// `Aggregated` happen inside the same store transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IngestStage {
    Received,
    Staged,
    Extracted,
    Parsed,
    Validated,
    Inserted,
    Aggregated,
    Responded,
}

impl IngestStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            IngestStage::Received => "received",
            IngestStage::Staged => "staged",
            IngestStage::Extracted => "extracted",
            IngestStage::Parsed => "parsed",
            IngestStage::Validated => "validated",
            IngestStage::Inserted => "inserted",
            IngestStage::Aggregated => "aggregated",
            IngestStage::Responded => "responded",
        }
    }
}

impl fmt::Display for IngestStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error("member {member}: {source}")]
    Parse {
        member: String,
        #[source]
        source: ParseError,
    },

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("ingestion worker failed: {0}")]
    Worker(String),
}

impl IngestError {
    /// Last stage that was reached before the failure
    ///
    /// A worker failure can happen anywhere between staging and parsing, so
    /// only `Received` is certain.
    pub fn failed_after(&self) -> IngestStage {
        match self {
            IngestError::Archive(ArchiveError::Staging { .. }) => IngestStage::Received,
            IngestError::Archive(_) => IngestStage::Staged,
            IngestError::Parse {
                source: ParseError::Csv { .. },
                ..
            } => IngestStage::Extracted,
            IngestError::Parse { .. } => IngestStage::Parsed,
            IngestError::Persistence(_) => IngestStage::Validated,
            IngestError::Worker(_) => IngestStage::Received,
        }
    }
}

/// Validated rows from one CSV member
#[derive(Debug, Clone)]
pub struct MemberBatch {
    pub member: String,
    pub records: Vec<Record>,
}

/// Stage, extract and parse an upload without touching the store
///
/// Blocking: does file I/O and decompression. Members that decompress past
/// `max_member_bytes` fail the upload.
pub fn prepare_batches(
    staging_dir: &Path,
    upload: &[u8],
    max_member_bytes: u64,
) -> Result<Vec<MemberBatch>, IngestError> {
    let staged = archive::stage_upload(staging_dir, upload)?;
    let members = archive::extract_csv_members(staged.path(), max_member_bytes)?;

    if members.is_empty() {
        log::warn!("⚠️  Archive contains no CSV members");
    }

    let mut batches = Vec::with_capacity(members.len());
    for member in members {
        log::info!("🔎 Parsing CSV: {}", member.name);

        let records = parse_records(member.contents.as_slice()).map_err(|source| {
            log::error!("❌ Rejecting {}: {}", member.name, source);
            IngestError::Parse {
                member: member.name.clone(),
                source,
            }
        })?;

        log::info!("   └─ {} rows {}", records.len(), IngestStage::Validated);
        batches.push(MemberBatch {
            member: member.name,
            records,
        });
    }

    Ok(batches)
}

/// Ingest one uploaded archive and return the post-insert aggregates
///
/// All CSV members are validated first; then every record of the upload is
/// inserted in one store transaction. When the upload holds no data rows the
/// store is not touched and a zeroed snapshot is returned.
pub async fn ingest_upload(
    store: &dyn PriceStore,
    staging_dir: &Path,
    upload: Vec<u8>,
    max_member_bytes: u64,
) -> Result<AggregateSnapshot, IngestError> {
    log::debug!("Ingestion {} ({} bytes)", IngestStage::Received, upload.len());

    let staging_dir: PathBuf = staging_dir.to_path_buf();
    let batches = tokio::task::spawn_blocking(move || {
        prepare_batches(&staging_dir, &upload, max_member_bytes)
    })
    .await
    .map_err(|e| IngestError::Worker(e.to_string()))??;

    let records: Vec<Record> = batches.into_iter().flat_map(|b| b.records).collect();
    let row_count = records.len();
    log::debug!("Ingestion {}: {} rows ready", IngestStage::Validated, row_count);

    let snapshot = store.insert_batch(records).await?.unwrap_or_default();
    log::debug!(
        "Ingestion {} ({} rows), {}",
        IngestStage::Inserted,
        row_count,
        IngestStage::Aggregated
    );

    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::archive::DEFAULT_MAX_MEMBER_BYTES;
    use crate::store::SqlitePriceStore;
    use std::io::{Cursor, Write};
    use tempfile::tempdir;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    const HEADER: &str = "product_id,name,category,price,created_at\n";

    fn zip_of(entries: &[(&str, String)]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, body) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn test_prepare_batches_per_member() {
        let dir = tempdir().unwrap();
        let upload = zip_of(&[
            ("a.csv", format!("{}1,Widget,tools,9.99,2024-01-01\n", HEADER)),
            ("skip.json", "{}".to_string()),
            ("b.csv", HEADER.to_string()),
        ]);

        let batches = prepare_batches(dir.path(), &upload, DEFAULT_MAX_MEMBER_BYTES).unwrap();

        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].member, "a.csv");
        assert_eq!(batches[0].records.len(), 1);
        assert!(batches[1].records.is_empty());
    }

    #[test]
    fn test_parse_error_names_member() {
        let dir = tempdir().unwrap();
        let upload = zip_of(&[("bad.csv", format!("{}oops,Widget,tools,9.99,2024\n", HEADER))]);

        let err = prepare_batches(dir.path(), &upload, DEFAULT_MAX_MEMBER_BYTES).unwrap_err();
        assert_eq!(err.failed_after(), IngestStage::Parsed);
        assert_eq!(err.to_string(), "member bad.csv: line 2: invalid product_id 'oops'");
    }

    #[tokio::test]
    async fn test_bad_second_member_persists_nothing() {
        let dir = tempdir().unwrap();
        let store = SqlitePriceStore::open_in_memory().unwrap();
        let upload = zip_of(&[
            ("good.csv", format!("{}1,Widget,tools,9.99,2024-01-01\n", HEADER)),
            ("bad.csv", format!("{}2,Gadget,tools,abc,2024-01-02\n", HEADER)),
        ]);

        let result = ingest_upload(&store, dir.path(), upload, DEFAULT_MAX_MEMBER_BYTES).await;

        assert!(matches!(result, Err(IngestError::Parse { .. })));
        assert_eq!(store.row_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_multiple_members_single_snapshot() {
        let dir = tempdir().unwrap();
        let store = SqlitePriceStore::open_in_memory().unwrap();
        let upload = zip_of(&[
            ("one.csv", format!("{}1,Widget,tools,1.00,2024-01-01\n", HEADER)),
            ("two.csv", format!("{}2,Ball,toys,2.00,2024-01-02\n3,Kite,toys,3.00,2024-01-03\n", HEADER)),
        ]);

        let snapshot = ingest_upload(&store, dir.path(), upload, DEFAULT_MAX_MEMBER_BYTES)
            .await
            .unwrap();

        assert_eq!(snapshot.total_items, 3);
        assert_eq!(snapshot.total_categories, 2);
        assert!((snapshot.total_price - 6.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_header_only_upload_returns_zeroed_snapshot() {
        let dir = tempdir().unwrap();
        let store = SqlitePriceStore::open_in_memory().unwrap();
        store
            .insert_batch(vec![Record {
                id: 1,
                created_at: "t".to_string(),
                name: "n".to_string(),
                category: "c".to_string(),
                price: 4.0,
            }])
            .await
            .unwrap();

        let upload = zip_of(&[("data.csv", HEADER.to_string())]);
        let snapshot = ingest_upload(&store, dir.path(), upload, DEFAULT_MAX_MEMBER_BYTES)
            .await
            .unwrap();

        assert_eq!(snapshot, AggregateSnapshot::default());
        assert_eq!(store.row_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_upload_is_archive_error() {
        let dir = tempdir().unwrap();
        let store = SqlitePriceStore::open_in_memory().unwrap();

        let err = ingest_upload(&store, dir.path(), b"not a zip".to_vec(), DEFAULT_MAX_MEMBER_BYTES)
            .await
            .unwrap_err();

        assert!(matches!(err, IngestError::Archive(ArchiveError::Corrupt(_))));
        assert_eq!(err.failed_after(), IngestStage::Staged);
    }

    #[tokio::test]
    async fn test_staging_dir_left_clean() {
        let dir = tempdir().unwrap();
        let store = SqlitePriceStore::open_in_memory().unwrap();
        let upload = zip_of(&[("data.csv", format!("{}1,Widget,tools,9.99,2024-01-01\n", HEADER))]);

        ingest_upload(&store, dir.path(), upload, DEFAULT_MAX_MEMBER_BYTES).await.unwrap();

        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_undecodable_member_fails_after_extracted() {
        let dir = tempdir().unwrap();
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("latin1.csv", SimpleFileOptions::default()).unwrap();
        zip.write_all(b"h1,h2,h3,h4,h5\n1,Caf\xe9,food,2.50,t\n").unwrap();
        let upload = zip.finish().unwrap().into_inner();

        let err = prepare_batches(dir.path(), &upload, DEFAULT_MAX_MEMBER_BYTES).unwrap_err();
        assert!(matches!(
            err,
            IngestError::Parse {
                source: ParseError::Csv { line: Some(2), .. },
                ..
            }
        ));
        assert_eq!(err.failed_after(), IngestStage::Extracted);
    }

    #[test]
    fn test_bad_column_count_fails_after_parsed() {
        let dir = tempdir().unwrap();
        let upload = zip_of(&[("short.csv", format!("{}1,Widget\n", HEADER))]);

        let err = prepare_batches(dir.path(), &upload, DEFAULT_MAX_MEMBER_BYTES).unwrap_err();
        assert_eq!(err.failed_after(), IngestStage::Parsed);
    }

    #[tokio::test]
    async fn test_duplicate_id_fails_after_validated() {
        let dir = tempdir().unwrap();
        let store = SqlitePriceStore::open_in_memory().unwrap();
        let upload = zip_of(&[(
            "dup.csv",
            format!("{}1,Widget,tools,1.00,t\n1,Widget,tools,1.00,t\n", HEADER),
        )]);

        let err = ingest_upload(&store, dir.path(), upload, DEFAULT_MAX_MEMBER_BYTES)
            .await
            .unwrap_err();

        assert!(matches!(err, IngestError::Persistence(_)));
        assert_eq!(err.failed_after(), IngestStage::Validated);
        assert_eq!(store.row_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_oversized_member_persists_nothing() {
        let dir = tempdir().unwrap();
        let store = SqlitePriceStore::open_in_memory().unwrap();
        let mut csv = HEADER.to_string();
        for id in 1..200 {
            csv.push_str(&format!("{},Widget,tools,1.00,2024-01-01\n", id));
        }
        let upload = zip_of(&[("big.csv", csv)]);

        let err = ingest_upload(&store, dir.path(), upload, 512).await.unwrap_err();

        assert!(matches!(
            err,
            IngestError::Archive(ArchiveError::MemberTooLarge { limit: 512, .. })
        ));
        assert_eq!(err.failed_after(), IngestStage::Staged);
        assert_eq!(store.row_count().await.unwrap(), 0);
    }

    #[test]
    fn test_stages_are_ordered() {
        assert!(IngestStage::Received < IngestStage::Validated);
        assert!(IngestStage::Inserted < IngestStage::Aggregated);
        assert!(IngestStage::Aggregated < IngestStage::Responded);
        assert_eq!(IngestStage::Responded.to_string(), "responded");
    }
}
