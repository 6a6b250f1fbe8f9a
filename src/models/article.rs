use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TechArticle {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub summary: String,
    pub category: String,
    pub tags: String,
    pub cover_image: Option<String>,
    pub user_id: i64,
    pub username: String,
    pub user_avatar: String,
    pub view_count: i64,
    pub like_count: i64,
    pub created_at: DateTime<Utc>,
    /// Whether the viewing user has liked this article; false for anonymous viewers.
    #[sqlx(default)]
    pub is_liked: bool,
}
