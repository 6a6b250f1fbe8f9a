use serde::Deserialize;
use sqlx::PgPool;

use super::content::{limit_chars, MAX_LINK_CHARS};
use super::toggles::{self, Toggled};
use super::ForumError;
use crate::auth::{hash_password, verify_password};
use crate::models::{User, UserProfile, UserSummary};

pub const MIN_PASSWORD_CHARS: usize = 6;
pub const MAX_EMAIL_CHARS: usize = 100;
pub const MAX_BIO_CHARS: usize = 500;

#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl Registration {
    pub fn validate(&self) -> Result<(), ForumError> {
        validate_username(&self.username)?;
        validate_email(&self.email)?;
        validate_password("password", &self.password)
    }
}

/// Editable account fields.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileUpdate {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub bio: String,
}

impl ProfileUpdate {
    pub fn validate(&self) -> Result<(), ForumError> {
        validate_username(&self.username)?;
        validate_email(&self.email)?;
        limit_chars("bio", &self.bio, MAX_BIO_CHARS)
    }
}

fn validate_username(username: &str) -> Result<(), ForumError> {
    let username = username.trim();
    let length = username.chars().count();
    if !(3..=50).contains(&length) {
        return Err(ForumError::invalid(
            "username",
            "Username must be between 3 and 50 characters",
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ForumError::invalid(
            "username",
            "Username may only contain letters, digits, '_' and '-'",
        ));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), ForumError> {
    let email = email.trim();
    if !is_plausible_email(email) {
        return Err(ForumError::invalid("email", "Email address is invalid"));
    }
    if email.chars().count() > MAX_EMAIL_CHARS {
        return Err(ForumError::invalid(
            "email",
            format!("Email must be at most {} characters", MAX_EMAIL_CHARS),
        ));
    }
    Ok(())
}

fn validate_password(field: &'static str, password: &str) -> Result<(), ForumError> {
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(ForumError::invalid(
            field,
            format!("Password must be at least {} characters", MIN_PASSWORD_CHARS),
        ));
    }
    Ok(())
}

fn duplicate_account(err: sqlx::Error) -> ForumError {
    ForumError::on_unique_violation(err, |constraint| match constraint {
        Some(c) if c.contains("email") => "Email is already registered".to_string(),
        _ => "Username is already taken".to_string(),
    })
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}

const USER_SELECT: &str = r#"
    SELECT id, username, email, password_hash, avatar, bio, points,
           follower_count, following_count, created_at
    FROM users
"#;

#[derive(Clone)]
pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create an account with a zero balance.
    pub async fn register(&self, input: Registration) -> Result<UserProfile, ForumError> {
        input.validate()?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, username, email, password_hash, avatar, bio, points,
                      follower_count, following_count, created_at
            "#,
        )
        .bind(input.username.trim())
        .bind(input.email.trim())
        .bind(hash_password(&input.password))
        .fetch_one(&self.pool)
        .await
        .map_err(duplicate_account)?;

        tracing::info!(user_id = user.id, username = %user.username, "user registered");
        Ok(user.into())
    }

    /// Check credentials. Unknown user and wrong password are indistinguishable.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User, ForumError> {
        let user = sqlx::query_as::<_, User>(&format!("{} WHERE username = $1", USER_SELECT))
            .bind(username.trim())
            .fetch_optional(&self.pool)
            .await?;

        match user {
            Some(user) if verify_password(password, &user.password_hash) => Ok(user),
            _ => {
                tracing::warn!(username, "failed login attempt");
                Err(ForumError::InvalidCredentials)
            }
        }
    }

    pub async fn profile(&self, user_id: i64) -> Result<UserProfile, ForumError> {
        sqlx::query_as::<_, User>(&format!("{} WHERE id = $1", USER_SELECT))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .map(UserProfile::from)
            .ok_or_else(|| ForumError::not_found("user", user_id))
    }

    pub async fn update_profile(&self, user_id: i64, input: ProfileUpdate) -> Result<UserProfile, ForumError> {
        input.validate()?;

        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET username = $2, email = $3, bio = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING id, username, email, password_hash, avatar, bio, points,
                      follower_count, following_count, created_at
            "#,
        )
        .bind(user_id)
        .bind(input.username.trim())
        .bind(input.email.trim())
        .bind(input.bio.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(duplicate_account)?
        .ok_or_else(|| ForumError::not_found("user", user_id))?;

        tracing::info!(user_id, "profile updated");
        Ok(user.into())
    }

    /// Replace the password after checking the current one.
    pub async fn change_password(&self, user_id: i64, current: &str, new: &str) -> Result<(), ForumError> {
        validate_password("new_password", new)?;

        let stored: String = sqlx::query_scalar("SELECT password_hash FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ForumError::not_found("user", user_id))?;

        if !verify_password(current, &stored) {
            tracing::warn!(user_id, "password change with wrong current password");
            return Err(ForumError::invalid("current_password", "Current password is incorrect"));
        }

        // Guarded on the checked hash; a concurrent change makes this match nothing.
        let updated = sqlx::query(
            "UPDATE users SET password_hash = $3, updated_at = NOW() WHERE id = $1 AND password_hash = $2",
        )
        .bind(user_id)
        .bind(&stored)
        .bind(hash_password(new))
        .execute(&self.pool)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(ForumError::invalid("current_password", "Current password is incorrect"));
        }

        tracing::info!(user_id, "password changed");
        Ok(())
    }

    /// Point the account at a new avatar, returning the previous one.
    pub async fn update_avatar(&self, user_id: i64, avatar: &str) -> Result<String, ForumError> {
        limit_chars("avatar", avatar, MAX_LINK_CHARS)?;

        let previous: Option<String> = sqlx::query_scalar(
            r#"
            UPDATE users u
            SET avatar = $2, updated_at = NOW()
            FROM (SELECT id, avatar FROM users WHERE id = $1 FOR UPDATE) old
            WHERE u.id = old.id
            RETURNING old.avatar
            "#,
        )
        .bind(user_id)
        .bind(avatar)
        .fetch_optional(&self.pool)
        .await?;

        previous.ok_or_else(|| ForumError::not_found("user", user_id))
    }

    pub async fn toggle_follow(&self, follower: i64, target: i64) -> Result<Toggled, ForumError> {
        toggles::toggle_follow(&self.pool, follower, target).await
    }

    pub async fn unfollow(&self, follower: i64, target: i64) -> Result<Toggled, ForumError> {
        toggles::unfollow(&self.pool, follower, target).await
    }

    pub async fn followers(&self, user_id: i64) -> Result<Vec<UserSummary>, ForumError> {
        self.ensure_exists(user_id).await?;
        let rows = sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT u.id, u.username, u.avatar, u.bio, u.points
            FROM user_follows f
            JOIN users u ON u.id = f.follower_id
            WHERE f.following_id = $1
            ORDER BY f.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(UserSummary::with_level).collect())
    }

    pub async fn following(&self, user_id: i64) -> Result<Vec<UserSummary>, ForumError> {
        self.ensure_exists(user_id).await?;
        let rows = sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT u.id, u.username, u.avatar, u.bio, u.points
            FROM user_follows f
            JOIN users u ON u.id = f.following_id
            WHERE f.follower_id = $1
            ORDER BY f.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(UserSummary::with_level).collect())
    }

    async fn ensure_exists(&self, user_id: i64) -> Result<(), ForumError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        if exists {
            Ok(())
        } else {
            Err(ForumError::not_found("user", user_id))
        }
    }
}
