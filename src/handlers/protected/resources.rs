// handlers/protected/resources.rs - Resource upload and download
//
// Upload is multipart: text fields plus one or more `files` parts and an
// optional `cover` image. All parts are read and validated before anything is
// stored, and stored files are released again if the record is not written.

use axum::extract::{rejection::PathRejection, Extension, Multipart, Path};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::files::{discard, is_image_name};
use crate::services::resources::{Download, NewResource};
use crate::state::AppState;

const RESOURCE_FOLDER: &str = "resources";
const COVER_FOLDER: &str = "covers";

struct Upload {
    file_name: String,
    bytes: Vec<u8>,
}

/// POST /api/resources
pub async fn upload_resource(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    mut multipart: Multipart,
) -> ApiResult<Value> {
    let mut input = NewResource::default();
    let mut uploads: Vec<Upload> = Vec::new();
    let mut cover: Option<Upload> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "files" | "file" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let bytes = field.bytes().await?.to_vec();
                if !bytes.is_empty() {
                    uploads.push(Upload { file_name, bytes });
                }
            }
            "cover" | "cover_image" => {
                let file_name = field.file_name().unwrap_or("cover").to_string();
                let bytes = field.bytes().await?.to_vec();
                if !bytes.is_empty() {
                    cover = Some(Upload { file_name, bytes });
                }
            }
            _ => {
                let value = field.text().await?;
                match name.as_str() {
                    "title" => input.title = value,
                    "description" => input.description = value,
                    "type" | "resource_type" => input.resource_type = value,
                    "difficulty" | "level" => input.difficulty = value,
                    "category" => input.category = value,
                    "tags" => input.tags = value,
                    "external_link" | "link" => {
                        let link = value.trim();
                        if !link.is_empty() {
                            input.external_link = Some(link.to_string());
                        }
                    }
                    other => tracing::debug!(field = other, "ignoring unknown upload field"),
                }
            }
        }
    }

    if let Some(cover) = &cover {
        if !is_image_name(&cover.file_name) {
            return Err(ApiError::field_error("cover", "Cover must be a jpg, png, gif or webp image"));
        }
    }
    input.validate_metadata()?;

    if let Err(e) = store_uploads(&state, &mut input, &uploads, cover).await {
        discard(state.files.as_ref(), &input.stored_paths()).await;
        return Err(e);
    }

    let stored = input.stored_paths();
    let file_count = input.files.len();
    match state.resources().create_resource(user.user_id, input).await {
        Ok(resource_id) => Ok(ApiResponse::created(json!({
            "resource_id": resource_id,
            "files": file_count,
        }))
        .with_message("Resource shared")),
        Err(e) => {
            discard(state.files.as_ref(), &stored).await;
            Err(e.into())
        }
    }
}

/// Save every upload, recording each stored file on `input` as it lands.
async fn store_uploads(
    state: &AppState,
    input: &mut NewResource,
    uploads: &[Upload],
    cover: Option<Upload>,
) -> Result<(), ApiError> {
    for upload in uploads {
        let stored = state
            .files
            .save(RESOURCE_FOLDER, &upload.file_name, &upload.bytes)
            .await?;
        input.files.push(stored);
    }
    if let Some(cover) = cover {
        let stored = state.files.save(COVER_FOLDER, &cover.file_name, &cover.bytes).await?;
        input.cover_image = Some(stored.path);
    }
    Ok(())
}

/// POST /api/resources/:id/download
pub async fn download_resource(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Download> {
    let Path(resource_id) = path?;
    let download = state
        .resources()
        .record_download(resource_id, user.user_id)
        .await?;
    Ok(ApiResponse::success(download))
}

/// DELETE /api/user/resources/:id - Owner only; stored files are released
pub async fn delete_resource(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Value> {
    let Path(resource_id) = path?;
    let stored = state
        .resources()
        .delete_resource(resource_id, user.user_id)
        .await?;
    discard(state.files.as_ref(), &stored).await;
    Ok(ApiResponse::success(json!({ "resource_id": resource_id })).with_message("Resource deleted"))
}
