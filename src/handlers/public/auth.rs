// handlers/public/auth.rs - Registration, login and logout
//
// Login issues a JWT both in the body and as an HttpOnly session cookie so
// browser clients and API clients share one flow.

use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{generate_jwt, Claims};
use crate::error::ApiError;
use crate::middleware::auth::{expired_cookie, session_cookie};
use crate::middleware::{ApiResponse, ApiResult};
use crate::models::UserProfile;
use crate::services::users::Registration;
use crate::services::ForumError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// POST /api/auth/register - Create an account
pub async fn register(
    Extension(state): Extension<AppState>,
    payload: Result<Json<Registration>, JsonRejection>,
) -> ApiResult<UserProfile> {
    let Json(input) = payload?;
    let user = state.users().register(input).await?;
    Ok(ApiResponse::created(user).with_message("Registration successful"))
}

/// POST /api/auth/login - Exchange credentials for a token
pub async fn login(
    Extension(state): Extension<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(input) = payload?;
    if input.username.trim().is_empty() || input.password.is_empty() {
        return Err(ApiError::validation_error("Username and password are required", None));
    }

    let user = state.users().authenticate(&input.username, &input.password).await?;

    let security = &state.config.security;
    let claims = Claims::new(user.id, user.username.clone(), security.jwt_expiry_hours);
    let token = generate_jwt(&claims, &security.jwt_secret)
        .map_err(|e| ForumError::Token(e.to_string()))?;

    let max_age = security.jwt_expiry_hours * 3600;
    let cookie = session_cookie(&security.cookie_name, &token, max_age, security.cookie_secure);

    tracing::info!(user_id = user.id, "user logged in");

    let body: ApiResponse<Value> = ApiResponse::success(json!({
        "token": token,
        "expires_in": max_age,
        "user": UserProfile::from(user),
    }))
    .with_message("Login successful");

    Ok(([(header::SET_COOKIE, cookie)], body))
}

/// POST /api/auth/logout - Clear the session cookie
pub async fn logout(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let cookie = expired_cookie(&state.config.security.cookie_name);
    (
        [(header::SET_COOKIE, cookie)],
        ApiResponse::success(()).with_message("Logged out"),
    )
}
