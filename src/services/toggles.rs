//! Idempotent membership toggles (likes, favorites, follows).
//!
//! Each toggle flips the (actor, target) relation row and moves the target's
//! denormalized counter by the same delta inside one transaction, with the
//! target row locked so concurrent toggles on one target are serialized.

use serde::Serialize;
use sqlx::{PgConnection, PgPool};

use super::ForumError;

/// Relation table plus the counter it keeps in lock-step.
#[derive(Debug, Clone, Copy)]
pub struct Relation {
    pub name: &'static str,
    pub table: &'static str,
    pub actor_column: &'static str,
    pub target_column: &'static str,
    pub target_table: &'static str,
    pub counter_column: &'static str,
}

pub const ANSWER_LIKES: Relation = Relation {
    name: "answer",
    table: "answer_likes",
    actor_column: "user_id",
    target_column: "answer_id",
    target_table: "answers",
    counter_column: "like_count",
};

pub const QUESTION_FAVORITES: Relation = Relation {
    name: "question",
    table: "question_favorites",
    actor_column: "user_id",
    target_column: "question_id",
    target_table: "questions",
    counter_column: "favorite_count",
};

pub const ARTICLE_LIKES: Relation = Relation {
    name: "article",
    table: "tech_article_likes",
    actor_column: "user_id",
    target_column: "article_id",
    target_table: "tech_articles",
    counter_column: "like_count",
};

pub const USER_FOLLOWS: Relation = Relation {
    name: "user",
    table: "user_follows",
    actor_column: "follower_id",
    target_column: "following_id",
    target_table: "users",
    counter_column: "follower_count",
};

/// Outcome of a toggle: whether the relation now exists, and the target's counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Toggled {
    pub active: bool,
    pub count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Change {
    Toggle,
    Remove,
}

/// Flip `actor`'s membership on `target` for `relation`.
pub async fn toggle(
    pool: &PgPool,
    relation: Relation,
    actor: i64,
    target: i64,
) -> Result<Toggled, ForumError> {
    apply(pool, relation, actor, target, Change::Toggle).await
}

/// Make sure `actor` is not a member; idempotent.
pub async fn remove(
    pool: &PgPool,
    relation: Relation,
    actor: i64,
    target: i64,
) -> Result<Toggled, ForumError> {
    apply(pool, relation, actor, target, Change::Remove).await
}

async fn apply(
    pool: &PgPool,
    relation: Relation,
    actor: i64,
    target: i64,
    change: Change,
) -> Result<Toggled, ForumError> {
    let mut tx = pool.begin().await?;

    let locked = sqlx::query_scalar::<_, i64>(&format!(
        "SELECT id FROM {} WHERE id = $1 FOR UPDATE",
        relation.target_table
    ))
    .bind(target)
    .fetch_optional(&mut *tx)
    .await?;
    if locked.is_none() {
        return Err(ForumError::not_found(relation.name, target));
    }

    let (toggled, _) = flip(&mut *tx, relation, actor, target, change).await?;
    tx.commit().await?;
    Ok(toggled)
}

/// Follow or unfollow `target`. Also moves the follower's `following_count`.
pub async fn toggle_follow(pool: &PgPool, follower: i64, target: i64) -> Result<Toggled, ForumError> {
    follow_change(pool, follower, target, Change::Toggle).await
}

/// Stop following `target`; a no-op when not following.
pub async fn unfollow(pool: &PgPool, follower: i64, target: i64) -> Result<Toggled, ForumError> {
    follow_change(pool, follower, target, Change::Remove).await
}

async fn follow_change(
    pool: &PgPool,
    follower: i64,
    target: i64,
    change: Change,
) -> Result<Toggled, ForumError> {
    if follower == target {
        return Err(ForumError::invalid("user_id", "You cannot follow yourself"));
    }

    let mut tx = pool.begin().await?;

    // Lock both accounts in id order so opposite follows cannot deadlock.
    let locked: Vec<i64> =
        sqlx::query_scalar("SELECT id FROM users WHERE id = ANY($1) ORDER BY id FOR UPDATE")
            .bind(vec![follower, target])
            .fetch_all(&mut *tx)
            .await?;
    if !locked.contains(&target) {
        return Err(ForumError::not_found("user", target));
    }
    if !locked.contains(&follower) {
        return Err(ForumError::not_found("user", follower));
    }

    let (toggled, delta) = flip(&mut *tx, USER_FOLLOWS, follower, target, change).await?;
    if delta != 0 {
        sqlx::query("UPDATE users SET following_count = following_count + $1 WHERE id = $2")
            .bind(delta)
            .bind(follower)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(toggled)
}

/// Remove the relation if present, otherwise (when toggling) insert it; move the
/// counter by the same delta. Caller holds the target row lock.
async fn flip(
    conn: &mut PgConnection,
    relation: Relation,
    actor: i64,
    target: i64,
    change: Change,
) -> Result<(Toggled, i64), ForumError> {
    let removed = sqlx::query(&format!(
        "DELETE FROM {} WHERE {} = $1 AND {} = $2",
        relation.table, relation.actor_column, relation.target_column
    ))
    .bind(actor)
    .bind(target)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    let (active, delta) = if removed == 1 {
        (false, -1)
    } else if change == Change::Remove {
        (false, 0)
    } else {
        let inserted = sqlx::query(&format!(
            "INSERT INTO {} ({}, {}) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            relation.table, relation.actor_column, relation.target_column
        ))
        .bind(actor)
        .bind(target)
        .execute(&mut *conn)
        .await?
        .rows_affected();
        (true, inserted as i64)
    };

    let count = sqlx::query_scalar::<_, i64>(&format!(
        "UPDATE {table} SET {counter} = {counter} + $1 WHERE id = $2 RETURNING {counter}",
        table = relation.target_table,
        counter = relation.counter_column
    ))
    .bind(delta)
    .bind(target)
    .fetch_one(&mut *conn)
    .await?;

    Ok((Toggled { active, count }, delta))
}

