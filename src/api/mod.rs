//! HTTP surface
//!
//! A single path, `/api/v0/prices`: `POST` ingests, `GET` exports, any
//! other method (`HEAD` included) answers 405.

pub mod error;
pub mod prices;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    routing::{post, MethodFilter},
    Router,
};

pub use error::ApiError;
pub use state::AppState;

pub const PRICES_PATH: &str = "/api/v0/prices";

/// Build the router; request bodies above `max_upload_bytes` are rejected
pub fn build_router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route(
            PRICES_PATH,
            // Registered before `get` so HEAD never falls through to the export
            post(prices::upload_prices)
                .on(MethodFilter::HEAD, prices::method_not_allowed)
                .get(prices::download_prices)
                .fallback(prices::method_not_allowed),
        )
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}
