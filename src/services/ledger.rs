//! Points ledger. Every balance change goes through `adjust` or `escrow`,
//! each a single atomic UPDATE, so concurrent credits and debits never lose writes.

use sqlx::postgres::PgExecutor;
use sqlx::PgConnection;

use super::ForumError;

/// Level thresholds, highest first.
const LEVELS: [(i64, i32); 4] = [(1000, 5), (500, 4), (200, 3), (50, 2)];

/// Reputation level for a balance. Pure; never stored as truth.
pub fn level_of(points: i64) -> i32 {
    LEVELS
        .iter()
        .find(|(threshold, _)| points >= *threshold)
        .map(|(_, level)| *level)
        .unwrap_or(1)
}

/// Apply `delta` to a user's balance and return the new balance.
pub async fn adjust<'e, E>(executor: E, user_id: i64, delta: i64) -> Result<i64, ForumError>
where
    E: PgExecutor<'e>,
{
    sqlx::query_scalar::<_, i64>(
        r#"
        UPDATE users
        SET points = points + $1, updated_at = NOW()
        WHERE id = $2
        RETURNING points
        "#,
    )
    .bind(delta)
    .bind(user_id)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| ForumError::not_found("user", user_id))
}

/// Debit `amount` only if the balance covers it. The check and the debit are one statement.
pub async fn escrow(conn: &mut PgConnection, user_id: i64, amount: i64) -> Result<i64, ForumError> {
    let debited = sqlx::query_scalar::<_, i64>(
        r#"
        UPDATE users
        SET points = points - $1, updated_at = NOW()
        WHERE id = $2 AND points >= $1
        RETURNING points
        "#,
    )
    .bind(amount)
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;

    match debited {
        Some(balance) => Ok(balance),
        None => {
            let available = balance(&mut *conn, user_id).await?;
            Err(ForumError::InsufficientPoints {
                required: amount,
                available,
            })
        }
    }
}

pub async fn balance<'e, E>(executor: E, user_id: i64) -> Result<i64, ForumError>
where
    E: PgExecutor<'e>,
{
    sqlx::query_scalar::<_, i64>("SELECT points FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| ForumError::not_found("user", user_id))
}
