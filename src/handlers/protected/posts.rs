// handlers/protected/posts.rs - Thread and reply creation

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Extension, Path,
    },
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::posts::NewPost;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ReplyRequest {
    pub content: String,
}

/// POST /post/new
pub async fn create_post(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<NewPost>, JsonRejection>,
) -> ApiResult<Value> {
    let Json(input) = payload?;
    let post_id = state.posts().create_post(user.user_id, input).await?;
    Ok(ApiResponse::created(json!({ "post_id": post_id })).with_message("Post published"))
}

/// POST /post/:id/reply
pub async fn reply_to_post(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<ReplyRequest>, JsonRejection>,
) -> ApiResult<Value> {
    let Path(post_id) = path?;
    let Json(input) = payload?;
    let reply_id = state
        .posts()
        .create_reply(post_id, user.user_id, &input.content)
        .await?;
    Ok(ApiResponse::created(json!({ "reply_id": reply_id, "post_id": post_id }))
        .with_message("Reply posted"))
}
