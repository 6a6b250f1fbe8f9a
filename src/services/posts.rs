use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::content::{register_tags, require_content, require_title, summarize};
use super::paging::{self, PAGE_SIZE};
use super::views::{self, Viewed};
use super::{ledger, ForumError};
use crate::config::PointsConfig;
use crate::models::{Post, PostDetail, Reply};

const POST_SELECT: &str = r#"
    SELECT p.id, p.title, p.content, p.summary, p.category_id, c.name AS category_name,
           p.user_id, u.username, u.avatar AS user_avatar, u.points AS user_points,
           p.tags, p.view_count, p.reply_count, p.created_at
    FROM posts p
    JOIN users u ON u.id = p.user_id
    JOIN categories c ON c.id = p.category_id
"#;

#[derive(Debug, Clone, Deserialize)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    #[serde(alias = "category")]
    pub category_id: i64,
    #[serde(default)]
    pub tags: String,
}

impl NewPost {
    /// Returns the trimmed title.
    pub fn validate(&self) -> Result<String, ForumError> {
        let title = require_title(&self.title)?;
        require_content("content", &self.content)?;
        Ok(title)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostQuery {
    pub page: Option<i64>,
    pub category: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostPage {
    pub posts: Vec<Post>,
    pub page: i64,
    pub page_size: i64,
}

/// General discussion threads.
#[derive(Clone)]
pub struct PostService {
    pool: PgPool,
    points: PointsConfig,
}

impl PostService {
    pub fn new(pool: PgPool, points: PointsConfig) -> Self {
        Self { pool, points }
    }

    pub async fn create_post(&self, author: i64, input: NewPost) -> Result<i64, ForumError> {
        let title = input.validate()?;

        let mut tx = self.pool.begin().await?;

        let category = sqlx::query("UPDATE categories SET post_count = post_count + 1 WHERE id = $1")
            .bind(input.category_id)
            .execute(&mut *tx)
            .await?;
        if category.rows_affected() == 0 {
            return Err(ForumError::not_found("category", input.category_id));
        }

        let tags = register_tags(&mut *tx, &input.tags).await?;

        let post_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO posts (title, content, summary, category_id, user_id, tags)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(&title)
        .bind(&input.content)
        .bind(summarize(&input.content))
        .bind(input.category_id)
        .bind(author)
        .bind(&tags)
        .fetch_one(&mut *tx)
        .await?;

        ledger::adjust(&mut *tx, author, self.points.post_bonus).await?;
        tx.commit().await?;

        tracing::info!(post_id, author, "post created");
        Ok(post_id)
    }

    pub async fn create_reply(&self, post_id: i64, author: i64, content: &str) -> Result<i64, ForumError> {
        require_content("content", content)?;

        let mut tx = self.pool.begin().await?;

        let bumped = sqlx::query(
            "UPDATE posts SET reply_count = reply_count + 1, updated_at = NOW() WHERE id = $1",
        )
        .bind(post_id)
        .execute(&mut *tx)
        .await?;
        if bumped.rows_affected() == 0 {
            return Err(ForumError::not_found("post", post_id));
        }

        let reply_id: i64 = sqlx::query_scalar(
            "INSERT INTO replies (post_id, user_id, content) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(post_id)
        .bind(author)
        .bind(content)
        .fetch_one(&mut *tx)
        .await?;

        ledger::adjust(&mut *tx, author, self.points.reply_bonus).await?;
        tx.commit().await?;

        tracing::info!(reply_id, post_id, author, "reply created");
        Ok(reply_id)
    }

    pub async fn list_posts(&self, query: &PostQuery) -> Result<PostPage, ForumError> {
        let (page, offset) = paging::window(query.page);
        let posts = sqlx::query_as::<_, Post>(&format!(
            "{} WHERE ($1::BIGINT IS NULL OR p.category_id = $1) \
             ORDER BY p.created_at DESC, p.id DESC LIMIT $2 OFFSET $3",
            POST_SELECT
        ))
        .bind(query.category)
        .bind(PAGE_SIZE)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Post::derive)
        .collect();

        Ok(PostPage {
            posts,
            page,
            page_size: PAGE_SIZE,
        })
    }

    /// Post with replies, oldest first.
    pub async fn get_post(&self, post_id: i64) -> Result<PostDetail, ForumError> {
        let post = sqlx::query_as::<_, Post>(&format!("{} WHERE p.id = $1", POST_SELECT))
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ForumError::not_found("post", post_id))?
            .derive();

        let replies = sqlx::query_as::<_, Reply>(
            r#"
            SELECT r.id, r.post_id, r.user_id, u.username, u.avatar AS user_avatar,
                   r.content, r.created_at
            FROM replies r
            JOIN users u ON u.id = r.user_id
            WHERE r.post_id = $1
            ORDER BY r.created_at ASC, r.id ASC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(PostDetail { post, replies })
    }

    /// Bump the view counter in the background.
    pub fn record_view(&self, post_id: i64) {
        views::record_view(&self.pool, Viewed::Post, post_id);
    }
}
