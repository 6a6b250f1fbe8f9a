// handlers/protected/articles.rs - Publishing and reacting to tech-share articles

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Extension, Path,
    },
    Json,
};
use serde_json::{json, Value};

use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::articles::NewArticle;
use crate::state::AppState;

/// POST /api/tech-share/publish
pub async fn publish_article(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<NewArticle>, JsonRejection>,
) -> ApiResult<Value> {
    let Json(input) = payload?;
    let article_id = state.articles().publish(user.user_id, input).await?;
    Ok(ApiResponse::created(json!({ "article_id": article_id })).with_message("Article published"))
}

/// DELETE /api/user/shares/:id - Owner only
pub async fn delete_article(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Value> {
    let Path(article_id) = path?;
    state.articles().delete_article(article_id, user.user_id).await?;
    Ok(ApiResponse::success(json!({ "article_id": article_id })).with_message("Article deleted"))
}

/// POST /api/tech-share/:id/like - Toggle
pub async fn like_article(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Value> {
    let Path(article_id) = path?;
    let toggled = state.articles().toggle_like(article_id, user.user_id).await?;
    Ok(ApiResponse::success(json!({ "liked": toggled.active, "like_count": toggled.count })))
}

/// POST /api/authors/:author_id/follow - Toggle
pub async fn follow_author(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Value> {
    let Path(author_id) = path?;
    let toggled = state
        .articles()
        .toggle_follow_author(user.user_id, author_id)
        .await?;
    Ok(ApiResponse::success(json!({
        "following": toggled.active,
        "follower_count": toggled.count,
    })))
}
