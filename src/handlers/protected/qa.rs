// handlers/protected/qa.rs - Asking, answering, accepting and reacting

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
use crate::services::qa::NewQuestion;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct StandaloneAnswerRequest {
    pub question_id: i64,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ReportRequest {
    pub reason: String,
}

/// POST /qa/ask - Publish a question, escrowing its reward
pub async fn ask_question(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<NewQuestion>, JsonRejection>,
) -> ApiResult<Value> {
    let Json(input) = payload?;
    let reward = input.reward;
    let question_id = state.qa().create_question(user.user_id, input).await?;
    Ok(ApiResponse::created(json!({ "question_id": question_id, "reward": reward }))
        .with_message("Question published"))
}

/// POST /qa/:id/answer
pub async fn answer_question(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<AnswerRequest>, JsonRejection>,
) -> ApiResult<Value> {
    let Path(question_id) = path?;
    let Json(input) = payload?;
    post_answer(&state, &user, question_id, &input.content).await
}

/// POST /api/answers - Same as /qa/:id/answer with the question id in the body
pub async fn create_answer(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<StandaloneAnswerRequest>, JsonRejection>,
) -> ApiResult<Value> {
    let Json(input) = payload?;
    post_answer(&state, &user, input.question_id, &input.content).await
}

async fn post_answer(
    state: &AppState,
    user: &AuthUser,
    question_id: i64,
    content: &str,
) -> ApiResult<Value> {
    let answer_id = state.qa().create_answer(question_id, user.user_id, content).await?;
    Ok(ApiResponse::created(json!({ "answer_id": answer_id, "question_id": question_id }))
        .with_message("Answer posted"))
}

/// POST /qa/answer/:answer_id/accept and /api/answers/:answer_id/accept
pub async fn accept_answer(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Value> {
    let Path(answer_id) = path?;
    let accepted = state.qa().accept_answer(answer_id, user.user_id).await?;
    Ok(ApiResponse::success(json!({
        "question_id": accepted.question_id,
        "answer_id": accepted.answer_id,
        "reward": accepted.reward_paid,
    }))
    .with_message("Answer accepted"))
}

/// POST /qa/answer/:answer_id/like and /api/answers/:answer_id/like - Toggle
pub async fn like_answer(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Value> {
    let Path(answer_id) = path?;
    let toggled = state.qa().toggle_like(answer_id, user.user_id).await?;
    Ok(ApiResponse::success(json!({ "liked": toggled.active, "like_count": toggled.count })))
}

/// POST /api/questions/:id/favorite - Toggle
pub async fn favorite_question(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Value> {
    let Path(question_id) = path?;
    let toggled = state.qa().toggle_favorite(question_id, user.user_id).await?;
    Ok(ApiResponse::success(json!({
        "favorited": toggled.active,
        "favorite_count": toggled.count,
    })))
}

/// DELETE /api/user/favorites/:id - `id` is the favorited question
pub async fn remove_favorite(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Value> {
    let Path(question_id) = path?;
    let removed = state.qa().remove_favorite(question_id, user.user_id).await?;
    Ok(ApiResponse::success(json!({
        "favorited": removed.active,
        "favorite_count": removed.count,
    }))
    .with_message("Removed from favorites"))
}

/// POST /api/questions/:id/report
pub async fn report_question(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<ReportRequest>, JsonRejection>,
) -> ApiResult<Value> {
    let Path(question_id) = path?;
    let Json(input) = payload?;
    let report_id = state
        .qa()
        .report_question(question_id, user.user_id, &input.reason)
        .await?;
    Ok(ApiResponse::created(json!({ "report_id": report_id })).with_message("Report received"))
}

/// DELETE /api/user/questions/:id - Owner only
pub async fn delete_question(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Value> {
    let Path(question_id) = path?;
    state.qa().delete_question(question_id, user.user_id).await?;
    Ok(ApiResponse::success(json!({ "question_id": question_id })).with_message("Question deleted"))
}

/// DELETE /api/user/answers/:id - Owner only
pub async fn delete_answer(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Value> {
    let Path(answer_id) = path?;
    state.qa().delete_answer(answer_id, user.user_id).await?;
    Ok(ApiResponse::success(json!({ "answer_id": answer_id })).with_message("Answer deleted"))
}
