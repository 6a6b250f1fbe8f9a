// handlers/public/posts.rs - Discussion thread browsing

use axum::extract::{
    rejection::{PathRejection, QueryRejection},
    Extension, Path, Query,
};

use crate::middleware::{ApiResponse, ApiResult};
use crate::models::PostDetail;
use crate::services::posts::{PostPage, PostQuery};
use crate::state::AppState;

/// GET /api/posts?page=&category=
pub async fn list_posts(
    Extension(state): Extension<AppState>,
    query: Result<Query<PostQuery>, QueryRejection>,
) -> ApiResult<PostPage> {
    let Query(query) = query?;
    Ok(ApiResponse::success(state.posts().list_posts(&query).await?))
}

/// GET /api/posts/:id - The view is counted in the background
pub async fn show_post(
    Extension(state): Extension<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<PostDetail> {
    let Path(post_id) = path?;
    let posts = state.posts();
    let detail = posts.get_post(post_id).await?;
    posts.record_view(post_id);
    Ok(ApiResponse::success(detail))
}
