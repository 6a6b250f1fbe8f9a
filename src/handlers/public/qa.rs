// handlers/public/qa.rs - Question browsing

use axum::extract::{
    rejection::{PathRejection, QueryRejection},
    Extension, Path, Query,
};
use serde::Deserialize;

use crate::middleware::{ApiResponse, ApiResult};
use crate::models::{QuestionDetail, QuestionStats};
use crate::services::qa::{QuestionPage, QuestionQuery};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct StatsQuery {
    pub category: Option<i64>,
}

/// GET /qa?page=&category=&sort=latest|hot|reward|unsolved
pub async fn list_questions(
    Extension(state): Extension<AppState>,
    query: Result<Query<QuestionQuery>, QueryRejection>,
) -> ApiResult<QuestionPage> {
    let Query(query) = query?;
    let page = state.qa().list_questions(&query).await?;
    Ok(ApiResponse::success(page))
}

/// GET /qa/stats?category=
pub async fn question_stats(
    Extension(state): Extension<AppState>,
    query: Result<Query<StatsQuery>, QueryRejection>,
) -> ApiResult<QuestionStats> {
    let Query(query) = query?;
    let stats = state.qa().question_stats(query.category).await?;
    Ok(ApiResponse::success(stats))
}

/// GET /qa/:id - Question with ordered answers; the view is counted in the background
pub async fn show_question(
    Extension(state): Extension<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<QuestionDetail> {
    let Path(question_id) = path?;
    let qa = state.qa();
    let detail = qa.get_question(question_id).await?;
    qa.record_view(question_id);
    Ok(ApiResponse::success(detail))
}
