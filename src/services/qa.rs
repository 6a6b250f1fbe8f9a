//! Reward-based Q&A lifecycle: ask with escrow, answer, accept and pay out once.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::content::{register_tags, require_content, require_title, summarize};
use super::ownership;
use super::paging::{self, PAGE_SIZE};
use super::toggles::{self, Toggled, ANSWER_LIKES, QUESTION_FAVORITES};
use super::views::{self, Viewed};
use super::{ledger, ForumError};
use crate::config::PointsConfig;
use crate::models::{Answer, Question, QuestionDetail, QuestionSort, QuestionStats};

const QUESTION_SELECT: &str = r#"
    SELECT q.id, q.title, q.content, q.summary, q.category_id, c.name AS category_name,
           q.user_id, u.username, u.avatar AS user_avatar, u.points AS user_points,
           q.tags, q.reward, q.view_count, q.answer_count, q.favorite_count, q.is_solved,
           aa.content AS accepted_content, q.created_at, q.updated_at
    FROM questions q
    JOIN users u ON u.id = q.user_id
    JOIN categories c ON c.id = q.category_id
    LEFT JOIN answers aa ON aa.question_id = q.id AND aa.is_accepted
"#;

#[derive(Debug, Clone, Deserialize)]
pub struct NewQuestion {
    pub title: String,
    pub content: String,
    #[serde(alias = "category")]
    pub category_id: i64,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub reward: i64,
}

impl NewQuestion {
    /// Checks that need no storage access. Returns the trimmed title.
    pub fn validate(&self) -> Result<String, ForumError> {
        let title = require_title(&self.title)?;
        require_content("content", &self.content)?;
        if self.reward < 0 {
            return Err(ForumError::invalid("reward", "Reward cannot be negative"));
        }
        Ok(title)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuestionQuery {
    pub page: Option<i64>,
    pub category: Option<i64>,
    pub sort: Option<String>,
}

impl QuestionQuery {
    pub fn sort(&self) -> QuestionSort {
        self.sort
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionPage {
    pub questions: Vec<Question>,
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
}

/// Result of a successful acceptance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Acceptance {
    pub question_id: i64,
    pub answer_id: i64,
    pub answerer_id: i64,
    pub reward_paid: i64,
}

#[derive(Clone)]
pub struct QaService {
    pool: PgPool,
    points: PointsConfig,
}

impl QaService {
    pub fn new(pool: PgPool, points: PointsConfig) -> Self {
        Self { pool, points }
    }

    /// Publish a question, escrowing `reward` from the asker and crediting the ask bonus.
    ///
    /// All or nothing: if the balance cannot cover the reward nothing is written.
    pub async fn create_question(&self, asker: i64, input: NewQuestion) -> Result<i64, ForumError> {
        let title = input.validate()?;

        let mut tx = self.pool.begin().await?;

        if input.reward > 0 {
            ledger::escrow(&mut *tx, asker, input.reward).await?;
        } else {
            ledger::balance(&mut *tx, asker).await?;
        }

        let category = sqlx::query(
            "UPDATE categories SET post_count = post_count + 1 WHERE id = $1",
        )
        .bind(input.category_id)
        .execute(&mut *tx)
        .await?;
        if category.rows_affected() == 0 {
            return Err(ForumError::not_found("category", input.category_id));
        }

        let tags = register_tags(&mut *tx, &input.tags).await?;

        let question_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO questions (title, content, summary, category_id, user_id, tags, reward)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(&title)
        .bind(&input.content)
        .bind(summarize(&input.content))
        .bind(input.category_id)
        .bind(asker)
        .bind(&tags)
        .bind(input.reward)
        .fetch_one(&mut *tx)
        .await?;

        ledger::adjust(&mut *tx, asker, self.points.question_bonus).await?;

        tx.commit().await?;

        tracing::info!(question_id, asker, reward = input.reward, "question created");
        Ok(question_id)
    }

    /// Post an answer to an existing question. Solved questions still accept answers.
    pub async fn create_answer(
        &self,
        question_id: i64,
        answerer: i64,
        content: &str,
    ) -> Result<i64, ForumError> {
        require_content("content", content)?;

        let mut tx = self.pool.begin().await?;

        let bumped = sqlx::query(
            "UPDATE questions SET answer_count = answer_count + 1, updated_at = NOW() WHERE id = $1",
        )
        .bind(question_id)
        .execute(&mut *tx)
        .await?;
        if bumped.rows_affected() == 0 {
            return Err(ForumError::not_found("question", question_id));
        }

        let answer_id: i64 = sqlx::query_scalar(
            "INSERT INTO answers (question_id, user_id, content) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(question_id)
        .bind(answerer)
        .bind(content)
        .fetch_one(&mut *tx)
        .await?;

        ledger::adjust(&mut *tx, answerer, self.points.answer_bonus).await?;

        tx.commit().await?;

        tracing::info!(answer_id, question_id, answerer, "answer created");
        Ok(answer_id)
    }

    /// Accept `answer_id` on behalf of `acting_user` and release the escrowed reward.
    ///
    /// The solved flag flips through a conditional update, so of any number of
    /// concurrent acceptances on one question exactly one succeeds and the
    /// reward is paid exactly once.
    pub async fn accept_answer(
        &self,
        answer_id: i64,
        acting_user: i64,
    ) -> Result<Acceptance, ForumError> {
        let mut tx = self.pool.begin().await?;

        let row: Option<(i64, i64, i64, i64)> = sqlx::query_as(
            r#"
            SELECT a.question_id, a.user_id, q.user_id, q.reward
            FROM answers a
            JOIN questions q ON q.id = a.question_id
            WHERE a.id = $1
            FOR UPDATE OF q
            "#,
        )
        .bind(answer_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((question_id, answerer_id, owner_id, reward)) = row else {
            return Err(ForumError::not_found("answer", answer_id));
        };

        if owner_id != acting_user {
            return Err(ForumError::Forbidden(
                "Only the asker can accept an answer".to_string(),
            ));
        }

        let solved = sqlx::query(
            r#"
            UPDATE questions
            SET is_solved = TRUE, updated_at = NOW()
            WHERE id = $1 AND is_solved = FALSE
            "#,
        )
        .bind(question_id)
        .execute(&mut *tx)
        .await?;
        if solved.rows_affected() != 1 {
            return Err(ForumError::AlreadySolved);
        }

        sqlx::query("UPDATE answers SET is_accepted = TRUE, updated_at = NOW() WHERE id = $1")
            .bind(answer_id)
            .execute(&mut *tx)
            .await?;

        if reward > 0 {
            ledger::adjust(&mut *tx, answerer_id, reward).await?;
        }

        tx.commit().await?;

        tracing::info!(question_id, answer_id, answerer_id, reward, "answer accepted");
        Ok(Acceptance {
            question_id,
            answer_id,
            answerer_id,
            reward_paid: reward,
        })
    }

    pub async fn toggle_like(&self, answer_id: i64, actor: i64) -> Result<Toggled, ForumError> {
        toggles::toggle(&self.pool, ANSWER_LIKES, actor, answer_id).await
    }

    pub async fn toggle_favorite(&self, question_id: i64, actor: i64) -> Result<Toggled, ForumError> {
        toggles::toggle(&self.pool, QUESTION_FAVORITES, actor, question_id).await
    }

    /// Drop a question from the actor's favorites. Removing an absent favorite is a no-op.
    pub async fn remove_favorite(&self, question_id: i64, actor: i64) -> Result<Toggled, ForumError> {
        toggles::remove(&self.pool, QUESTION_FAVORITES, actor, question_id).await
    }

    pub async fn list_questions(&self, query: &QuestionQuery) -> Result<QuestionPage, ForumError> {
        let (page, offset) = paging::window(query.page);
        let sql = format!(
            "{} WHERE ($1::BIGINT IS NULL OR q.category_id = $1) ORDER BY {} LIMIT $2 OFFSET $3",
            QUESTION_SELECT,
            query.sort().order_clause()
        );

        let questions = sqlx::query_as::<_, Question>(&sql)
            .bind(query.category)
            .bind(PAGE_SIZE)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Question::derive)
            .collect();

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM questions WHERE ($1::BIGINT IS NULL OR category_id = $1)",
        )
        .bind(query.category)
        .fetch_one(&self.pool)
        .await?;

        Ok(QuestionPage {
            questions,
            page,
            page_size: PAGE_SIZE,
            total,
        })
    }

    pub async fn question_stats(&self, category: Option<i64>) -> Result<QuestionStats, ForumError> {
        let stats = sqlx::query_as::<_, QuestionStats>(
            r#"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE is_solved) AS solved,
                   COUNT(*) FILTER (WHERE NOT is_solved) AS unsolved,
                   COUNT(*) FILTER (WHERE reward > 0) AS rewarded
            FROM questions
            WHERE ($1::BIGINT IS NULL OR category_id = $1)
            "#,
        )
        .bind(category)
        .fetch_one(&self.pool)
        .await?;
        Ok(stats)
    }

    /// Question with its answers: accepted first, then most liked, then oldest.
    pub async fn get_question(&self, question_id: i64) -> Result<QuestionDetail, ForumError> {
        let question = sqlx::query_as::<_, Question>(&format!("{} WHERE q.id = $1", QUESTION_SELECT))
            .bind(question_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ForumError::not_found("question", question_id))?
            .derive();

        let answers = sqlx::query_as::<_, Answer>(
            r#"
            SELECT a.id, a.question_id, a.user_id, u.username, u.avatar AS user_avatar,
                   u.points AS user_points, a.content, a.like_count, a.is_accepted, a.created_at
            FROM answers a
            JOIN users u ON u.id = a.user_id
            WHERE a.question_id = $1
            ORDER BY a.is_accepted DESC, a.like_count DESC, a.created_at ASC, a.id ASC
            "#,
        )
        .bind(question_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Answer::derive)
        .collect();

        Ok(QuestionDetail { question, answers })
    }

    /// Bump the view counter in the background.
    pub fn record_view(&self, question_id: i64) {
        views::record_view(&self.pool, Viewed::Question, question_id);
    }

    pub async fn report_question(
        &self,
        question_id: i64,
        reporter: i64,
        reason: &str,
    ) -> Result<i64, ForumError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ForumError::invalid("reason", "A reason is required"));
        }

        let report_id: Option<i64> = sqlx::query_scalar(
            r#"
            INSERT INTO question_reports (question_id, user_id, reason)
            SELECT id, $2, $3 FROM questions WHERE id = $1
            RETURNING id
            "#,
        )
        .bind(question_id)
        .bind(reporter)
        .bind(reason)
        .fetch_optional(&self.pool)
        .await?;

        let report_id = report_id.ok_or_else(|| ForumError::not_found("question", question_id))?;
        tracing::info!(question_id, reporter, "question reported");
        Ok(report_id)
    }

    /// Delete an own question with its answers. Escrowed reward is not refunded.
    pub async fn delete_question(&self, question_id: i64, owner: i64) -> Result<(), ForumError> {
        let mut tx = self.pool.begin().await?;

        let category: Option<i64> = sqlx::query_scalar(
            "DELETE FROM questions WHERE id = $1 AND user_id = $2 RETURNING category_id",
        )
        .bind(question_id)
        .bind(owner)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(category_id) = category else {
            return Err(ownership::refusal(&self.pool, ownership::QUESTIONS, question_id).await);
        };

        sqlx::query("UPDATE categories SET post_count = GREATEST(post_count - 1, 0) WHERE id = $1")
            .bind(category_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!(question_id, owner, "question deleted");
        Ok(())
    }

    /// Delete an own answer. The question's solved flag is left as is.
    pub async fn delete_answer(&self, answer_id: i64, owner: i64) -> Result<(), ForumError> {
        let mut tx = self.pool.begin().await?;

        let question: Option<i64> = sqlx::query_scalar(
            "DELETE FROM answers WHERE id = $1 AND user_id = $2 RETURNING question_id",
        )
        .bind(answer_id)
        .bind(owner)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(question_id) = question else {
            return Err(ownership::refusal(&self.pool, ownership::ANSWERS, answer_id).await);
        };

        sqlx::query("UPDATE questions SET answer_count = GREATEST(answer_count - 1, 0) WHERE id = $1")
            .bind(question_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!(answer_id, owner, "answer deleted");
        Ok(())
    }
}
