//! Best-effort view counters, bumped off the request path.

use sqlx::PgPool;

/// Entities that carry a `view_count` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewed {
    Question,
    Post,
    Article,
    Resource,
}

impl Viewed {
    fn table(self) -> &'static str {
        match self {
            Viewed::Question => "questions",
            Viewed::Post => "posts",
            Viewed::Article => "tech_articles",
            Viewed::Resource => "learning_resources",
        }
    }
}

/// Increment the view counter in a detached task. Never awaited; failures are
/// logged and dropped.
pub fn record_view(pool: &PgPool, target: Viewed, id: i64) {
    let pool = pool.clone();
    tokio::spawn(async move {
        let sql = format!(
            "UPDATE {} SET view_count = view_count + 1 WHERE id = $1",
            target.table()
        );
        if let Err(e) = sqlx::query(&sql).bind(id).execute(&pool).await {
            tracing::warn!(?target, id, "failed to record view: {}", e);
        }
    });
}
