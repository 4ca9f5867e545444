//! Upload staging and zip member selection

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use thiserror::Error;
use zip::result::ZipError;
use zip::ZipArchive;

/// Default cap on the decompressed size of a single CSV member
pub const DEFAULT_MAX_MEMBER_BYTES: u64 = 256 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("failed to stage upload in {dir}: {source}")]
    Staging {
        dir: String,
        #[source]
        source: std::io::Error,
    },

    #[error("upload is not a readable zip archive: {0}")]
    Corrupt(#[from] ZipError),

    #[error("failed to read archive member {member}: {source}")]
    Member {
        member: String,
        #[source]
        source: std::io::Error,
    },

    #[error("archive member {member} expands beyond {limit} bytes")]
    MemberTooLarge { member: String, limit: u64 },
}

/// One `.csv` entry pulled out of an uploaded archive
#[derive(Debug, Clone)]
pub struct CsvMember {
    pub name: String,
    pub contents: Vec<u8>,
}

/// Write the uploaded bytes to a fresh file under `staging_dir`
///
/// The file is a working buffer only: it is removed when the returned
/// handle is dropped.
pub fn stage_upload(staging_dir: &Path, bytes: &[u8]) -> Result<NamedTempFile, ArchiveError> {
    let staging_err = |source| ArchiveError::Staging {
        dir: staging_dir.display().to_string(),
        source,
    };

    fs::create_dir_all(staging_dir).map_err(staging_err)?;

    let prefix = format!("upload-{}-", chrono::Utc::now().format("%Y%m%d%H%M%S"));
    let mut staged = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(".zip")
        .tempfile_in(staging_dir)
        .map_err(staging_err)?;

    staged.write_all(bytes).map_err(staging_err)?;
    staged.flush().map_err(staging_err)?;

    log::info!("💾 Upload staged: {} ({} bytes)", staged.path().display(), bytes.len());
    Ok(staged)
}

/// Open a staged archive and return every member whose name ends in `.csv`
///
/// Other members are skipped silently. Members come back in archive order.
/// Each member is decompressed up to `max_member_bytes`; the size recorded
/// in the archive is not trusted.
pub fn extract_csv_members(
    path: &Path,
    max_member_bytes: u64,
) -> Result<Vec<CsvMember>, ArchiveError> {
    let file = File::open(path).map_err(|source| ArchiveError::Member {
        member: path.display().to_string(),
        source,
    })?;
    let mut archive = ZipArchive::new(file)?;

    let mut members = Vec::new();
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        if entry.is_dir() || !entry.name().ends_with(".csv") {
            log::debug!("Skipping non-CSV member: {}", entry.name());
            continue;
        }

        let name = entry.name().to_string();
        log::info!("📄 CSV detected: {}", name);

        // One byte past the cap tells an oversized member from an exact fit
        let mut contents = Vec::new();
        entry
            .by_ref()
            .take(max_member_bytes.saturating_add(1))
            .read_to_end(&mut contents)
            .map_err(|source| ArchiveError::Member {
                member: name.clone(),
                source,
            })?;

        if contents.len() as u64 > max_member_bytes {
            log::error!("❌ {} exceeds {} bytes once decompressed", name, max_member_bytes);
            return Err(ArchiveError::MemberTooLarge {
                member: name,
                limit: max_member_bytes,
            });
        }

        members.push(CsvMember { name, contents });
    }

    Ok(members)
}
