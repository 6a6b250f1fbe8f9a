use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use std::str::FromStr;

use crate::services::content::preview;
use crate::services::ledger::level_of;

/// A question joined with its asker and, when solved, its accepted answer.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Question {
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
    pub reward: i64,
    pub view_count: i64,
    pub answer_count: i64,
    pub favorite_count: i64,
    pub is_solved: bool,
    #[serde(skip_serializing)]
    pub accepted_content: Option<String>,
    #[sqlx(default)]
    pub accepted_answer: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Question {
    /// Fill the fields derived after loading: asker level and accepted-answer preview.
    pub fn derive(mut self) -> Self {
        self.user_level = level_of(self.user_points);
        self.accepted_answer = self.accepted_content.take().map(|c| preview(&c));
        self
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Answer {
    pub id: i64,
    pub question_id: i64,
    pub user_id: i64,
    pub username: String,
    pub user_avatar: String,
    #[serde(skip_serializing)]
    pub user_points: i64,
    #[sqlx(default)]
    pub user_level: i32,
    pub content: String,
    pub like_count: i64,
    pub is_accepted: bool,
    pub created_at: DateTime<Utc>,
}

impl Answer {
    pub fn derive(mut self) -> Self {
        self.user_level = level_of(self.user_points);
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionDetail {
    #[serde(flatten)]
    pub question: Question,
    pub answers: Vec<Answer>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, FromRow)]
pub struct QuestionStats {
    pub total: i64,
    pub solved: i64,
    pub unsolved: i64,
    pub rewarded: i64,
}

/// Ordering for the question list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QuestionSort {
    #[default]
    Latest,
    Hot,
    Reward,
    Unsolved,
}

impl QuestionSort {
    pub fn order_clause(self) -> &'static str {
        match self {
            QuestionSort::Latest => "q.created_at DESC, q.id DESC",
            QuestionSort::Hot => {
                "(q.view_count + q.answer_count * 2 + q.favorite_count * 3) DESC, q.created_at DESC"
            }
            QuestionSort::Reward => "q.reward DESC, q.created_at DESC",
            QuestionSort::Unsolved => "q.is_solved ASC, q.created_at DESC",
        }
    }
}

impl FromStr for QuestionSort {
    type Err = std::convert::Infallible;

    /// Unknown values fall back to `Latest`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "hot" => QuestionSort::Hot,
            "reward" => QuestionSort::Reward,
            "unsolved" => QuestionSort::Unsolved,
            _ => QuestionSort::Latest,
        })
    }
}
