// handlers/public/articles.rs - Tech-share article detail

use axum::extract::{rejection::PathRejection, Extension, Path};

use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::models::TechArticle;
use crate::state::AppState;

/// GET /api/tech-share/:id - `is_liked` reflects the caller when a token is present
pub async fn show_article(
    Extension(state): Extension<AppState>,
    viewer: Option<Extension<AuthUser>>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<TechArticle> {
    let Path(article_id) = path?;
    let viewer = viewer.map(|Extension(user)| user.user_id);
    let articles = state.articles();
    let article = articles.get_article(article_id, viewer).await?;
    articles.record_view(article_id);
    Ok(ApiResponse::success(article))
}
