// handlers/public/catalog.rs - Categories and tags

use axum::extract::{rejection::QueryRejection, Extension, Query};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct TagQuery {
    pub q: Option<String>,
    pub limit: Option<i64>,
}

/// GET /api/categories
pub async fn list_categories(Extension(state): Extension<AppState>) -> ApiResult<Value> {
    let categories = state.catalog().categories().await?;
    Ok(ApiResponse::success(json!({ "categories": categories })))
}

/// GET /api/tags?q=&limit=
pub async fn list_tags(
    Extension(state): Extension<AppState>,
    query: Result<Query<TagQuery>, QueryRejection>,
) -> ApiResult<Value> {
    let Query(query) = query?;
    let tags = state
        .catalog()
        .tags(query.q.as_deref(), query.limit.unwrap_or(20))
        .await?;
    Ok(ApiResponse::success(json!({ "tags": tags })))
}
