//! Store-wide aggregate statistics
//!
//! Aggregates are never maintained incrementally: every call recomputes them
//! from the full `prices` table. Called with a `Transaction` (which derefs to
//! `Connection`) the read sees that transaction's own uncommitted inserts.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

/// Distinct category count and price sum across the whole store
pub const AGGREGATE_SQL: &str =
    "SELECT COUNT(DISTINCT category), COALESCE(SUM(price), 0.0) FROM prices";

/// Response payload for an ingestion request
///
/// `total_items` is batch-scoped (rows inserted by this request); the other
/// two fields describe the whole store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateSnapshot {
    pub total_items: u64,
    pub total_categories: u64,
    pub total_price: f64,
}

/// Run the aggregate query; `total_items` is left at zero for the caller to fill
pub fn compute(conn: &Connection) -> rusqlite::Result<AggregateSnapshot> {
    conn.query_row(AGGREGATE_SQL, [], |row| {
        let categories: i64 = row.get(0)?;
        Ok(AggregateSnapshot {
            total_items: 0,
            total_categories: categories as u64,
            total_price: row.get(1)?,
        })
    })
}
