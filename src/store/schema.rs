//! Idempotent schema setup for the `prices` table

use rusqlite::Connection;

/// Schema shipped with the crate (`sql/01_prices.sql`)
pub const PRICES_SCHEMA: &str = include_str!("../../sql/01_prices.sql");

/// Create the `prices` table and its index if they do not exist yet
pub fn apply_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(PRICES_SCHEMA)?;
    log::debug!("Schema applied: prices");
    Ok(())
}
