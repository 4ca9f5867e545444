//! HTTP error mapping
//!
//! Input problems are the caller's fault (400); everything past the upload
//! is reported as a generic 500 after the full cause has been logged.

use crate::export::ExportError;
use crate::ingest::IngestError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or unreadable upload
    #[error("bad request: {0}")]
    Input(String),

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Input(_) => StatusCode::BAD_REQUEST,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Ingest(_) | Self::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Input(_) => "BAD_REQUEST",
            Self::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            Self::Ingest(_) => "INGEST_FAILED",
            Self::Export(_) => "EXPORT_FAILED",
        }
    }

    /// Message returned to the client; server-side causes stay in the log
    fn public_message(&self) -> String {
        match self {
            Self::Input(_) | Self::MethodNotAllowed => self.to_string(),
            Self::Ingest(_) => "failed to process upload".to_string(),
            Self::Export(_) => "failed to export data".to_string(),
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            Self::Ingest(e) => {
                log::error!("❌ Ingestion failed after stage '{}': {}", e.failed_after(), e)
            }
            Self::Export(e) => log::error!("❌ Export failed: {}", e),
            _ => log::warn!("⚠️  {} ({})", self, status),
        }

        let body = ErrorResponse {
            error: self.code(),
            message: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}
