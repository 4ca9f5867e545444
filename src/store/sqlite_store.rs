//! SQLite implementation of `PriceStore`

use super::aggregator::{self, AggregateSnapshot};
use super::schema::apply_schema;
use super::sqlite_pragma::apply_pragmas;
use super::PriceStore;
use crate::ingest::record::Record;
use async_trait::async_trait;
use rusqlite::{params, Connection, TransactionBehavior};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Ids are client-supplied; an id already stored (or repeated inside
    /// the batch) is rejected, never overwritten
    #[error("duplicate id {0}")]
    DuplicateId(i64),

    #[error("failed to prepare database location: {0}")]
    Io(#[from] std::io::Error),

    #[error("store connection unavailable (lock poisoned)")]
    Unavailable,

    #[error("store worker failed: {0}")]
    Worker(String),
}

/// SQLite-backed store
///
/// A single connection guarded by a mutex: transactions from concurrent
/// requests are serialized, and a connection is never held across requests.
#[derive(Clone)]
pub struct SqlitePriceStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqlitePriceStore {
    /// Open (or create) the database file and ensure the schema exists
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(db_path)?;
        apply_pragmas(&conn)?;
        apply_schema(&conn)?;

        log::info!("✅ Price store ready: {}", db_path.display());
        Ok(Self::from_connection(conn))
    }

    /// Scratch store that lives as long as this handle
    pub fn open_in_memory() -> Result<Self, PersistenceError> {
        let conn = Connection::open_in_memory()?;
        apply_schema(&conn)?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Run `op` against the connection on the blocking pool
    async fn with_conn<T, F>(&self, op: F) -> Result<T, PersistenceError>
    where
        F: FnOnce(&mut Connection) -> Result<T, PersistenceError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|_| PersistenceError::Unavailable)?;
            op(&mut guard)
        })
        .await
        .map_err(|e| PersistenceError::Worker(e.to_string()))?
    }
}

#[async_trait]
impl PriceStore for SqlitePriceStore {
    async fn insert_batch(
        &self,
        records: Vec<Record>,
    ) -> Result<Option<AggregateSnapshot>, PersistenceError> {
        if records.is_empty() {
            log::info!("No rows to insert, skipping database transaction");
            return Ok(None);
        }

        self.with_conn(move |conn| insert_and_aggregate(conn, &records).map(Some))
            .await
    }

    async fn aggregates(&self) -> Result<AggregateSnapshot, PersistenceError> {
        self.with_conn(|conn| Ok(aggregator::compute(conn)?)).await
    }

    async fn all_rows(&self) -> Result<Vec<Record>, PersistenceError> {
        self.with_conn(|conn| load_rows(conn)).await
    }

    async fn row_count(&self) -> Result<u64, PersistenceError> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM prices", [], |row| row.get(0))?;
            Ok(count as u64)
        })
        .await
    }
}

/// Insert `records` and read aggregates inside one IMMEDIATE transaction
///
/// The write lock is taken when the transaction opens, so the aggregate
/// read reflects exactly this batch on top of previously committed rows.
/// Returning early drops the transaction, which rolls it back.
pub fn insert_and_aggregate(
    conn: &mut Connection,
    records: &[Record],
) -> Result<AggregateSnapshot, PersistenceError> {
    insert_with_aggregate(conn, records, aggregator::compute)
}

fn insert_with_aggregate<F>(
    conn: &mut Connection,
    records: &[Record],
    aggregate: F,
) -> Result<AggregateSnapshot, PersistenceError>
where
    F: FnOnce(&Connection) -> rusqlite::Result<AggregateSnapshot>,
{
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    {
        let mut exists = tx.prepare("SELECT 1 FROM prices WHERE id = ?1")?;
        let mut insert = tx.prepare(
            "INSERT INTO prices (id, created_at, name, category, price)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;

        let mut seen = HashSet::with_capacity(records.len());
        for record in records {
            if !seen.insert(record.id) || exists.exists(params![record.id])? {
                log::warn!("⚠️  Rejecting batch: duplicate id {}", record.id);
                return Err(PersistenceError::DuplicateId(record.id));
            }

            insert
                .execute(params![
                    record.id,
                    record.created_at,
                    record.name,
                    record.category,
                    record.price,
                ])
                .map_err(|e| {
                    log::error!("❌ Insert failed for id {}: {}", record.id, e);
                    e
                })?;
        }
    }

    let mut snapshot = aggregate(&*tx).map_err(|e| {
        log::error!("❌ Failed to calculate statistics: {}", e);
        e
    })?;
    snapshot.total_items = records.len() as u64;

    tx.commit()?;

    log::info!(
        "✅ Inserted {} rows (categories={}, total_price={:.2})",
        snapshot.total_items,
        snapshot.total_categories,
        snapshot.total_price
    );
    Ok(snapshot)
}

/// Read every row for export, ordered by id
pub fn load_rows(conn: &Connection) -> Result<Vec<Record>, PersistenceError> {
    let mut stmt =
        conn.prepare("SELECT id, created_at, name, category, price FROM prices ORDER BY id")?;

    let rows = stmt
        .query_map([], |row| {
            Ok(Record {
                id: row.get(0)?,
                created_at: row.get(1)?,
                name: row.get(2)?,
                category: row.get(3)?,
                price: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(rows)
}
