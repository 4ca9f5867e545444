//! Price store: the only durable owner of records
//!
//! Pipeline components never touch SQL directly. They receive an
//! `Arc<dyn PriceStore>` built once at startup, so tests can run the whole
//! pipeline against a scratch database.

pub mod aggregator;
pub mod schema;
pub mod sqlite_pragma;
pub mod sqlite_store;

use crate::ingest::record::Record;
use async_trait::async_trait;

pub use aggregator::AggregateSnapshot;
pub use sqlite_store::{PersistenceError, SqlitePriceStore};

#[async_trait]
pub trait PriceStore: Send + Sync {
    /// Insert a batch and recompute aggregates in one transaction
    ///
    /// Returns `None` without opening a transaction when `records` is empty.
    /// Any failure (duplicate id, insert error, aggregate query error) rolls
    /// back every insert of the batch.
    async fn insert_batch(
        &self,
        records: Vec<Record>,
    ) -> Result<Option<AggregateSnapshot>, PersistenceError>;

    /// Current store-wide aggregates (`total_items` is zero)
    async fn aggregates(&self) -> Result<AggregateSnapshot, PersistenceError>;

    /// Every stored row, ordered by id
    async fn all_rows(&self) -> Result<Vec<Record>, PersistenceError>;

    async fn row_count(&self) -> Result<u64, PersistenceError>;
}
