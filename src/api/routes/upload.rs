use std::path::Path;

use axum::extract::multipart::Field;
use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::models::EventId;

/// Largest accepted deck photo.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

const DEFAULT_EXTENSION: &str = "webp";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub filename: String,
    pub url: String,
    pub sha256: String,
}

/// Reject anything that could escape the event's image directory.
fn safe_segment<'a>(name: &str, value: &'a str) -> Result<&'a str, ApiError> {
    let value = value.trim();
    if value.is_empty()
        || value == "."
        || value.contains("..")
        || value.contains('/')
        || value.contains('\\')
    {
        return Err(ApiError::BadRequest(format!("Invalid {}: {:?}", name, value)));
    }
    Ok(value)
}

fn extension_of(file_name: Option<&str>) -> String {
    file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}

async fn field_text(field: Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))
}

struct DeckImage {
    file_name: Option<String>,
    bytes: Vec<u8>,
}

/// Store a winner's deck photo under `images/events/<eventId>/<winnerPosition>.<ext>`.
pub async fn upload_deck(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut event_id: Option<String> = None;
    let mut position: Option<String> = None;
    let mut image: Option<DeckImage> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("eventId") => event_id = Some(field_text(field).await?),
            Some("winnerPosition") => position = Some(field_text(field).await?),
            Some("deckImage") => {
                let file_name = field.file_name().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
                image = Some(DeckImage {
                    file_name,
                    bytes: bytes.to_vec(),
                });
            }
            _ => {}
        }
    }

    let (Some(event_id), Some(position), Some(image)) = (
        event_id.filter(|s| !s.trim().is_empty()),
        position.filter(|s| !s.trim().is_empty()),
        image.filter(|i| !i.bytes.is_empty()),
    ) else {
        return Err(ApiError::BadRequest("Missing required fields.".to_string()));
    };

    let event_id = EventId::from(safe_segment("eventId", &event_id)?);
    let position = safe_segment("winnerPosition", &position)?;
    let filename = format!("{}.{}", position, extension_of(image.file_name.as_deref()));

    let dir = state.storage.event_images_dir(&event_id);
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    tokio::fs::write(dir.join(&filename), &image.bytes)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let sha256 = hex::encode(Sha256::digest(&image.bytes));
    info!(
        "Stored deck image {} for event {} ({} bytes)",
        filename,
        event_id,
        image.bytes.len()
    );

    Ok(Json(UploadResponse {
        success: true,
        url: state.assets.event_image_url(&event_id, &filename),
        filename,
        sha256,
    }))
}
