//! Shared handler state

use crate::ingest::archive::DEFAULT_MAX_MEMBER_BYTES;
use crate::store::PriceStore;
use std::path::PathBuf;
use std::sync::Arc;

/// Dependencies injected into every handler
///
/// Built once at startup; cloning only bumps the store's refcount.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PriceStore>,
    pub staging_dir: PathBuf,
    /// Decompressed size limit for each CSV member of an upload
    pub max_member_bytes: u64,
}

impl AppState {
    pub fn new(store: Arc<dyn PriceStore>, staging_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            staging_dir: staging_dir.into(),
            max_member_bytes: DEFAULT_MAX_MEMBER_BYTES,
        }
    }

    pub fn with_max_member_bytes(mut self, max_member_bytes: u64) -> Self {
        self.max_member_bytes = max_member_bytes;
        self
    }
}
