use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::services::content::format_file_size;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LearningResource {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub resource_type: String,
    pub difficulty: String,
    pub category: String,
    pub tags: String,
    pub cover_image: Option<String>,
    #[serde(skip_serializing)]
    pub file_path: String,
    #[serde(rename = "file_size_bytes")]
    pub file_size: i64,
    #[sqlx(default)]
    #[serde(rename = "file_size")]
    pub file_size_label: String,
    pub external_link: Option<String>,
    pub user_id: i64,
    pub username: String,
    pub view_count: i64,
    pub download_count: i64,
    pub created_at: DateTime<Utc>,
}

impl LearningResource {
    pub fn derive(mut self) -> Self {
        self.file_size_label = format_file_size(self.file_size);
        self
    }

    /// Public link for the stored file, if one was uploaded.
    pub fn download_url(&self) -> Option<String> {
        if self.file_path.is_empty() {
            return self.external_link.clone();
        }
        let name = self
            .file_path
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(self.file_path.as_str());
        Some(format!("/downloads/{}", name))
    }
}
