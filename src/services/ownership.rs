//! Owner-only deletes share one refusal rule: a row that exists but belongs to
//! someone else is `Forbidden`, a missing row is `NotFound`.

use sqlx::PgPool;

use super::ForumError;

/// Tables whose rows carry a `user_id` owner.
#[derive(Debug, Clone, Copy)]
pub struct Owned {
    pub table: &'static str,
    pub what: &'static str,
}

pub const QUESTIONS: Owned = Owned { table: "questions", what: "question" };
pub const ANSWERS: Owned = Owned { table: "answers", what: "answer" };
pub const ARTICLES: Owned = Owned { table: "tech_articles", what: "article" };
pub const RESOURCES: Owned = Owned { table: "learning_resources", what: "resource" };

/// Explain why a `DELETE ... WHERE id = $1 AND user_id = $2` matched nothing.
pub async fn refusal(pool: &PgPool, owned: Owned, id: i64) -> ForumError {
    let exists = sqlx::query_scalar::<_, bool>(&format!(
        "SELECT EXISTS(SELECT 1 FROM {} WHERE id = $1)",
        owned.table
    ))
    .bind(id)
    .fetch_one(pool)
    .await;

    match exists {
        Ok(true) => ForumError::Forbidden(format!("You can only delete your own {}", owned.what)),
        Ok(false) => ForumError::not_found(owned.what, id),
        Err(e) => ForumError::Storage(e),
    }
}
