use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::services::ledger::level_of;

/// Account row including the credential hash. Never serialized directly.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub avatar: String,
    pub bio: String,
    pub points: i64,
    pub follower_count: i64,
    pub following_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Public view of an account; `level` is derived from `points` on every read.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub avatar: String,
    pub bio: String,
    pub points: i64,
    pub level: i32,
    pub follower_count: i64,
    pub following_count: i64,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            level: level_of(user.points),
            id: user.id,
            username: user.username,
            email: user.email,
            avatar: user.avatar,
            bio: user.bio,
            points: user.points,
            follower_count: user.follower_count,
            following_count: user.following_count,
            created_at: user.created_at,
        }
    }
}

/// Compact author entry used in follower/following listings.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub avatar: String,
    pub bio: String,
    #[serde(skip_serializing)]
    pub points: i64,
    #[sqlx(default)]
    pub level: i32,
}

impl UserSummary {
    pub fn with_level(mut self) -> Self {
        self.level = level_of(self.points);
        self
    }
}
