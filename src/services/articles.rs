use serde::Deserialize;
use sqlx::PgPool;

use super::content::{
    limit_chars, register_tags, require_content, require_title, summarize, MAX_LABEL_CHARS,
    MAX_LINK_CHARS,
};
use super::ownership;
use super::toggles::{self, Toggled, ARTICLE_LIKES};
use super::views::{self, Viewed};
use super::{ledger, ForumError};
use crate::config::PointsConfig;
use crate::models::TechArticle;

#[derive(Debug, Clone, Deserialize)]
pub struct NewArticle {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: String,
    pub cover_image: Option<String>,
}

impl NewArticle {
    /// Returns the trimmed title.
    pub fn validate(&self) -> Result<String, ForumError> {
        let title = require_title(&self.title)?;
        require_content("content", &self.content)?;
        limit_chars("category", &self.category, MAX_LABEL_CHARS)?;
        if let Some(cover) = &self.cover_image {
            limit_chars("cover_image", cover, MAX_LINK_CHARS)?;
        }
        Ok(title)
    }
}

/// Tech-share articles: long-form posts with likes and author follows.
#[derive(Clone)]
pub struct ArticleService {
    pool: PgPool,
    points: PointsConfig,
}

impl ArticleService {
    pub fn new(pool: PgPool, points: PointsConfig) -> Self {
        Self { pool, points }
    }

    pub async fn publish(&self, author: i64, input: NewArticle) -> Result<i64, ForumError> {
        let title = input.validate()?;

        let mut tx = self.pool.begin().await?;
        let tags = register_tags(&mut *tx, &input.tags).await?;

        let article_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO tech_articles (title, content, summary, category, tags, cover_image, user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(&title)
        .bind(&input.content)
        .bind(summarize(&input.content))
        .bind(input.category.trim())
        .bind(&tags)
        .bind(input.cover_image.as_deref().map(str::trim).filter(|s| !s.is_empty()))
        .bind(author)
        .fetch_one(&mut *tx)
        .await?;

        ledger::adjust(&mut *tx, author, self.points.article_bonus).await?;
        tx.commit().await?;

        tracing::info!(article_id, author, "article published");
        Ok(article_id)
    }

    /// Article detail with `is_liked` resolved for `viewer`.
    pub async fn get_article(&self, article_id: i64, viewer: Option<i64>) -> Result<TechArticle, ForumError> {
        let article = sqlx::query_as::<_, TechArticle>(
            r#"
            SELECT a.id, a.title, a.content, a.summary, a.category, a.tags, a.cover_image,
                   a.user_id, u.username, u.avatar AS user_avatar, a.view_count,
                   a.like_count, a.created_at,
                   EXISTS(
                       SELECT 1 FROM tech_article_likes l
                       WHERE l.article_id = a.id AND l.user_id = $2
                   ) AS is_liked
            FROM tech_articles a
            JOIN users u ON u.id = a.user_id
            WHERE a.id = $1
            "#,
        )
        .bind(article_id)
        .bind(viewer)
        .fetch_optional(&self.pool)
        .await?;

        article.ok_or_else(|| ForumError::not_found("article", article_id))
    }

    /// Bump the view counter in the background.
    pub fn record_view(&self, article_id: i64) {
        views::record_view(&self.pool, Viewed::Article, article_id);
    }

    /// Delete an own article; its likes go with it.
    pub async fn delete_article(&self, article_id: i64, owner: i64) -> Result<(), ForumError> {
        let deleted = sqlx::query("DELETE FROM tech_articles WHERE id = $1 AND user_id = $2")
            .bind(article_id)
            .bind(owner)
            .execute(&self.pool)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(ownership::refusal(&self.pool, ownership::ARTICLES, article_id).await);
        }

        tracing::info!(article_id, owner, "article deleted");
        Ok(())
    }

    pub async fn toggle_like(&self, article_id: i64, actor: i64) -> Result<Toggled, ForumError> {
        toggles::toggle(&self.pool, ARTICLE_LIKES, actor, article_id).await
    }

    /// Follow an article author.
    pub async fn toggle_follow_author(&self, follower: i64, author_id: i64) -> Result<Toggled, ForumError> {
        toggles::toggle_follow(&self.pool, follower, author_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article() -> NewArticle {
        NewArticle {
            title: "  Pinning explained  ".to_string(),
            content: "Self-referential futures".to_string(),
            category: "Backend".to_string(),
            tags: String::new(),
            cover_image: None,
        }
    }

    #[test]
    fn validate_returns_trimmed_title() {
        assert_eq!(article().validate().unwrap(), "Pinning explained");
    }

    #[test]
    fn labels_and_cover_are_bounded() {
        let mut long_category = article();
        long_category.category = "c".repeat(MAX_LABEL_CHARS + 10);
        assert!(matches!(
            long_category.validate(),
            Err(ForumError::Validation { field: Some("category"), .. })
        ));

        let mut long_cover = article();
        long_cover.cover_image = Some(format!("https://img.example.com/{}", "a".repeat(MAX_LINK_CHARS)));
        assert!(matches!(
            long_cover.validate(),
            Err(ForumError::Validation { field: Some("cover_image"), .. })
        ));
    }
}
