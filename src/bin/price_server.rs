//! Price server - HTTP ingestion and export
//!
//! Usage:
//!   cargo run --release --bin price_server
//!
//! Environment variables:
//!   PRICEFLOW_DB_PATH - SQLite database path (default: data/prices.db)
//!   PRICEFLOW_BIND_ADDR - Listen address (default: 0.0.0.0:8080)
//!   PRICEFLOW_STAGING_DIR - Upload staging directory (default: ./temp)
//!   PRICEFLOW_MAX_UPLOAD_BYTES - Request body limit (default: 32 MiB)
//!   PRICEFLOW_MAX_MEMBER_BYTES - Decompressed size limit per CSV member (default: 256 MiB)

use dotenv::dotenv;
use log::info;
use priceflow::{build_router, AppState, PriceStore, ServiceConfig, SqlitePriceStore};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let config = ServiceConfig::from_env();

    info!("🚀 Starting price server...");
    info!("   ├─ Database: {}", config.db_path.display());
    info!("   ├─ Staging dir: {}", config.staging_dir.display());
    info!("   ├─ Max upload: {} bytes", config.max_upload_bytes);
    info!("   ├─ Max CSV member: {} bytes", config.max_member_bytes);
    info!("   └─ Listen: {}", config.bind_addr);

    let store: Arc<dyn PriceStore> = Arc::new(SqlitePriceStore::open(&config.db_path)?);
    let state = AppState::new(store, config.staging_dir.clone())
        .with_max_member_bytes(config.max_member_bytes);
    let app = build_router(state, config.max_upload_bytes);

    let listener = TcpListener::bind(config.bind_addr.as_str()).await?;
    info!("✅ Server has started on {}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
