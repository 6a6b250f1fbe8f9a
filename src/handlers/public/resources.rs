// handlers/public/resources.rs - Learning resource detail

use axum::extract::{rejection::PathRejection, Extension, Path};

use crate::middleware::{ApiResponse, ApiResult};
use crate::models::LearningResource;
use crate::state::AppState;

/// GET /api/resources/:id
pub async fn show_resource(
    Extension(state): Extension<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<LearningResource> {
    let Path(resource_id) = path?;
    let resources = state.resources();
    let resource = resources.get_resource(resource_id).await?;
    resources.record_view(resource_id);
    Ok(ApiResponse::success(resource))
}
