use sqlx::PgPool;

use super::ForumError;
use crate::models::{Category, Tag};

/// Read-only access to categories and tags.
#[derive(Clone)]
pub struct CatalogService {
    pool: PgPool,
}

impl CatalogService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn categories(&self) -> Result<Vec<Category>, ForumError> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, description, icon, post_count, created_at FROM categories ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }

    /// Tags by popularity, optionally filtered by a name prefix.
    pub async fn tags(&self, prefix: Option<&str>, limit: i64) -> Result<Vec<Tag>, ForumError> {
        let pattern = prefix
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(|p| format!("{}%", p.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")));

        let tags = sqlx::query_as::<_, Tag>(
            r#"
            SELECT id, name, usage_count
            FROM tags
            WHERE ($1::TEXT IS NULL OR name ILIKE $1)
            ORDER BY usage_count DESC, name ASC
            LIMIT $2
            "#,
        )
        .bind(pattern)
        .bind(limit.clamp(1, 100))
        .fetch_all(&self.pool)
        .await?;
        Ok(tags)
    }
}
