// handlers/public/users.rs - Follower graph listings

use axum::extract::{rejection::PathRejection, Extension, Path};
use serde_json::{json, Value};

use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// GET /api/user/:id/followers
pub async fn followers(
    Extension(state): Extension<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Value> {
    let Path(user_id) = path?;
    let users = state.users().followers(user_id).await?;
    Ok(ApiResponse::success(json!({ "user_id": user_id, "followers": users })))
}

/// GET /api/user/:id/following
pub async fn following(
    Extension(state): Extension<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Value> {
    let Path(user_id) = path?;
    let users = state.users().following(user_id).await?;
    Ok(ApiResponse::success(json!({ "user_id": user_id, "following": users })))
}
