// handlers/protected/users.rs - Current user: profile, password, avatar and follows

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Extension, Multipart, Path,
    },
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::models::UserProfile;
use crate::services::files::{discard, is_image_name};
use crate::services::users::ProfileUpdate;
use crate::state::AppState;

const AVATAR_FOLDER: &str = "avatars";
pub const MAX_AVATAR_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Deserialize)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}

/// GET /api/user/me
pub async fn me(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<UserProfile> {
    Ok(ApiResponse::success(state.users().profile(user.user_id).await?))
}

/// PUT /api/user/profile
pub async fn update_profile(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<ProfileUpdate>, JsonRejection>,
) -> ApiResult<Value> {
    let Json(input) = payload?;
    let profile = state.users().update_profile(user.user_id, input).await?;
    Ok(ApiResponse::success(json!({ "user": profile })).with_message("Profile updated"))
}

/// PUT /api/user/password
pub async fn change_password(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<PasswordChange>, JsonRejection>,
) -> ApiResult<Value> {
    let Json(input) = payload?;
    state
        .users()
        .change_password(user.user_id, &input.current_password, &input.new_password)
        .await?;
    Ok(ApiResponse::success(json!({})).with_message("Password changed"))
}

/// POST /api/user/avatar - Multipart with a single `avatar` image
pub async fn upload_avatar(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    mut multipart: Multipart,
) -> ApiResult<Value> {
    let mut avatar: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("avatar") {
            let file_name = field.file_name().unwrap_or("avatar").to_string();
            let bytes = field.bytes().await?.to_vec();
            avatar = Some((file_name, bytes));
        }
    }

    let Some((file_name, bytes)) = avatar.filter(|(_, bytes)| !bytes.is_empty()) else {
        return Err(ApiError::field_error("avatar", "Choose an image to upload"));
    };
    if !is_image_name(&file_name) {
        return Err(ApiError::field_error("avatar", "Avatar must be a jpg, png, gif or webp image"));
    }
    if bytes.len() > MAX_AVATAR_BYTES {
        return Err(ApiError::field_error("avatar", "Avatar must be at most 5 MB"));
    }

    let stored = state.files.save(AVATAR_FOLDER, &file_name, &bytes).await?;
    let previous = match state.users().update_avatar(user.user_id, &stored.path).await {
        Ok(previous) => previous,
        Err(e) => {
            discard(state.files.as_ref(), &[stored.path]).await;
            return Err(e.into());
        }
    };

    // Only files this service stored are released; the default avatar is shared.
    if previous.starts_with(state.config.uploads.root.as_str()) {
        discard(state.files.as_ref(), &[previous]).await;
    }

    Ok(ApiResponse::success(json!({ "avatar_url": stored.path })).with_message("Avatar updated"))
}

/// POST /api/user/:id/follow - Toggle
pub async fn follow_user(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Value> {
    let Path(target) = path?;
    let toggled = state.users().toggle_follow(user.user_id, target).await?;
    Ok(ApiResponse::success(json!({
        "following": toggled.active,
        "follower_count": toggled.count,
    })))
}

/// DELETE /api/user/:id/unfollow
pub async fn unfollow_user(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Value> {
    let Path(target) = path?;
    let toggled = state.users().unfollow(user.user_id, target).await?;
    Ok(ApiResponse::success(json!({
        "following": toggled.active,
        "follower_count": toggled.count,
    }))
    .with_message("Unfollowed"))
}
