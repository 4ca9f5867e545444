//! # priceflow
//!
//! HTTP service that ingests zip archives of price CSVs into SQLite and
//! exports the store back as a zipped CSV.
//!
//! ## Module Organization
//!
//! - `ingest` - staging, zip extraction, CSV validation, ingestion flow
//! - `store` - `PriceStore` trait, SQLite implementation, aggregates
//! - `export` - store rows → CSV → zip
//! - `api` - axum router and handlers
//! - `config` - environment configuration

pub mod api;
pub mod config;
pub mod export;
pub mod ingest;
pub mod store;

// Re-export commonly used types
pub use api::{build_router, AppState};
pub use config::ServiceConfig;
pub use ingest::{ingest_upload, IngestError, Record};
pub use store::{AggregateSnapshot, PriceStore, SqlitePriceStore};
