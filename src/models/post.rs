use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::services::ledger::level_of;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub summary: String,
    pub category_id: i64,
    pub category_name: String,
    pub user_id: i64,
    pub username: String,
    pub user_avatar: String,
    #[serde(skip_serializing)]
    pub user_points: i64,
    #[sqlx(default)]
    pub user_level: i32,
    pub tags: String,
    pub view_count: i64,
    pub reply_count: i64,
    pub created_at: DateTime<Utc>,
}

impl Post {
    pub fn derive(mut self) -> Self {
        self.user_level = level_of(self.user_points);
        self
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Reply {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub username: String,
    pub user_avatar: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: Post,
    pub replies: Vec<Reply>,
}
