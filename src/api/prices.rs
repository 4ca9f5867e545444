//! Price routes
//!
//! - `POST /api/v0/prices` - ingest a zip of CSV files, returns aggregates
//! - `GET /api/v0/prices` - download the store as `data.zip`

use super::error::ApiError;
use super::state::AppState;
use crate::export::{export_archive, EXPORT_DISPOSITION};
use crate::ingest::{ingest_upload, IngestStage};
use crate::store::AggregateSnapshot;
use axum::{
    body::Body,
    extract::{multipart::MultipartRejection, Multipart, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};

/// Name of the multipart field carrying the archive
pub const UPLOAD_FIELD: &str = "file";

struct Upload {
    file_name: String,
    bytes: Vec<u8>,
}

/// Pull the `file` field out of the form; other fields are ignored
async fn read_upload(multipart: &mut Multipart) -> Result<Upload, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Input(format!("unreadable form: {}", e)))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload.zip").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::Input(format!("unreadable file field: {}", e)))?;

        return Ok(Upload {
            file_name,
            bytes: bytes.to_vec(),
        });
    }

    Err(ApiError::Input(format!("missing form field '{}'", UPLOAD_FIELD)))
}

/// Ingest an uploaded archive
///
/// POST /api/v0/prices (multipart, field `file`)
pub async fn upload_prices(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AggregateSnapshot>, ApiError> {
    let mut multipart = multipart.map_err(|e| ApiError::Input(e.to_string()))?;
    let upload = read_upload(&mut multipart).await?;
    log::info!("📥 File {} uploaded ({} bytes)", upload.file_name, upload.bytes.len());

    let snapshot = ingest_upload(
        state.store.as_ref(),
        &state.staging_dir,
        upload.bytes,
        state.max_member_bytes,
    )
    .await?;

    log::info!(
        "📊 {}: items={} categories={} total_price={:.2}",
        upload.file_name,
        snapshot.total_items,
        snapshot.total_categories,
        snapshot.total_price
    );
    log::debug!("Ingestion {}", IngestStage::Responded);
    Ok(Json(snapshot))
}

/// Download every stored row as `data.zip`
///
/// GET /api/v0/prices
pub async fn download_prices(State(state): State<AppState>) -> Result<Response, ApiError> {
    let archive = export_archive(state.store.as_ref()).await?;

    let headers = [
        (header::CONTENT_TYPE, HeaderValue::from_static("application/zip")),
        (header::CONTENT_DISPOSITION, HeaderValue::from_static(EXPORT_DISPOSITION)),
        (header::CONTENT_LENGTH, HeaderValue::from(archive.len())),
    ];

    Ok((headers, Body::from(archive)).into_response())
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
