use serde::Serialize;
use sqlx::PgPool;

use super::content::{
    limit_chars, register_tags, require_content, require_title, MAX_LABEL_CHARS, MAX_LINK_CHARS,
};
use super::files::StoredFile;
use super::ownership;
use super::views::{self, Viewed};
use super::{ledger, ForumError};
use crate::config::PointsConfig;
use crate::models::LearningResource;

/// Metadata for a shared learning resource; files are stored before this is recorded.
#[derive(Debug, Clone, Default)]
pub struct NewResource {
    pub title: String,
    pub description: String,
    pub resource_type: String,
    pub difficulty: String,
    pub category: String,
    pub tags: String,
    pub external_link: Option<String>,
    pub cover_image: Option<String>,
    pub files: Vec<StoredFile>,
}

impl NewResource {
    /// Field checks that do not depend on whether files were attached.
    /// Returns the trimmed title.
    pub fn validate_metadata(&self) -> Result<String, ForumError> {
        let title = require_title(&self.title)?;
        require_content("description", &self.description)?;
        limit_chars("resource_type", &self.resource_type, MAX_LABEL_CHARS)?;
        limit_chars("difficulty", &self.difficulty, MAX_LABEL_CHARS)?;
        limit_chars("category", &self.category, MAX_LABEL_CHARS)?;
        if let Some(link) = &self.external_link {
            limit_chars("external_link", link, MAX_LINK_CHARS)?;
            let valid = url::Url::parse(link)
                .map(|u| matches!(u.scheme(), "http" | "https"))
                .unwrap_or(false);
            if !valid {
                return Err(ForumError::invalid("external_link", "External link must be an http(s) URL"));
            }
        }
        Ok(title)
    }

    pub fn validate(&self) -> Result<String, ForumError> {
        let title = self.validate_metadata()?;
        if self.files.is_empty() && self.external_link.is_none() {
            return Err(ForumError::invalid(
                "files",
                "Upload at least one file or provide an external link",
            ));
        }
        if let Some(cover) = &self.cover_image {
            limit_chars("cover_image", cover, MAX_LINK_CHARS)?;
        }
        if let Some(file) = self.files.first() {
            limit_chars("files", &file.path, MAX_LINK_CHARS)?;
        }
        Ok(title)
    }

    /// Everything this resource wrote through the file store.
    pub fn stored_paths(&self) -> Vec<String> {
        self.files
            .iter()
            .map(|f| f.path.clone())
            .chain(self.cover_image.clone())
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Download {
    pub resource_id: i64,
    pub download_url: Option<String>,
    pub download_count: i64,
}

#[derive(Clone)]
pub struct ResourceService {
    pool: PgPool,
    points: PointsConfig,
}

const RESOURCE_COLUMNS: &str = r#"
    r.id, r.title, r.description, r.resource_type, r.difficulty, r.category, r.tags,
    r.cover_image, r.file_path, r.file_size, r.external_link, r.user_id, u.username,
    r.view_count, r.download_count, r.created_at
"#;

impl ResourceService {
    pub fn new(pool: PgPool, points: PointsConfig) -> Self {
        Self { pool, points }
    }

    /// Record an uploaded resource. The first file is the primary download;
    /// `file_size` is the total of all files.
    pub async fn create_resource(&self, owner: i64, input: NewResource) -> Result<i64, ForumError> {
        let title = input.validate()?;

        let file_path = input.files.first().map(|f| f.path.clone()).unwrap_or_default();
        let file_paths: Vec<String> = input.files.iter().map(|f| f.path.clone()).collect();
        let file_size: i64 = input.files.iter().map(|f| f.size).sum();

        let mut tx = self.pool.begin().await?;
        let tags = register_tags(&mut *tx, &input.tags).await?;

        let resource_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO learning_resources
                (title, description, resource_type, difficulty, category, tags,
                 cover_image, file_path, file_paths, file_size, external_link, user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING id
            "#,
        )
        .bind(&title)
        .bind(input.description.trim())
        .bind(input.resource_type.trim())
        .bind(input.difficulty.trim())
        .bind(input.category.trim())
        .bind(&tags)
        .bind(&input.cover_image)
        .bind(&file_path)
        .bind(&file_paths)
        .bind(file_size)
        .bind(&input.external_link)
        .bind(owner)
        .fetch_one(&mut *tx)
        .await?;

        ledger::adjust(&mut *tx, owner, self.points.resource_bonus).await?;
        tx.commit().await?;

        tracing::info!(resource_id, owner, files = input.files.len(), "resource shared");
        Ok(resource_id)
    }

    pub async fn get_resource(&self, resource_id: i64) -> Result<LearningResource, ForumError> {
        let resource = sqlx::query_as::<_, LearningResource>(&format!(
            r#"
            SELECT {}
            FROM learning_resources r
            JOIN users u ON u.id = r.user_id
            WHERE r.id = $1
            "#,
            RESOURCE_COLUMNS
        ))
        .bind(resource_id)
        .fetch_optional(&self.pool)
        .await?;

        resource
            .map(LearningResource::derive)
            .ok_or_else(|| ForumError::not_found("resource", resource_id))
    }

    /// Bump the view counter in the background.
    pub fn record_view(&self, resource_id: i64) {
        views::record_view(&self.pool, Viewed::Resource, resource_id);
    }

    /// Delete an own resource, returning the stored paths it referenced so the
    /// caller can release them.
    pub async fn delete_resource(&self, resource_id: i64, owner: i64) -> Result<Vec<String>, ForumError> {
        let deleted: Option<(Vec<String>, Option<String>)> = sqlx::query_as(
            "DELETE FROM learning_resources WHERE id = $1 AND user_id = $2 RETURNING file_paths, cover_image",
        )
        .bind(resource_id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;

        let Some((file_paths, cover_image)) = deleted else {
            return Err(ownership::refusal(&self.pool, ownership::RESOURCES, resource_id).await);
        };

        tracing::info!(resource_id, owner, "resource deleted");
        Ok(file_paths.into_iter().chain(cover_image).collect())
    }

    /// Log a download and return where to fetch the file.
    pub async fn record_download(&self, resource_id: i64, user_id: i64) -> Result<Download, ForumError> {
        let mut tx = self.pool.begin().await?;

        let resource = sqlx::query_as::<_, LearningResource>(&format!(
            r#"
            UPDATE learning_resources r
            SET download_count = r.download_count + 1
            FROM users u
            WHERE r.id = $1 AND u.id = r.user_id
            RETURNING {}
            "#,
            RESOURCE_COLUMNS
        ))
        .bind(resource_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ForumError::not_found("resource", resource_id))?;

        sqlx::query("INSERT INTO resource_downloads (resource_id, user_id) VALUES ($1, $2)")
            .bind(resource_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Download {
            resource_id,
            download_url: resource.download_url(),
            download_count: resource.download_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource() -> NewResource {
        NewResource {
            title: "Rust atomics cheat sheet".to_string(),
            description: "Orderings explained".to_string(),
            files: vec![StoredFile {
                path: "uploads/resources/abc-sheet.pdf".to_string(),
                size: 2048,
            }],
            ..Default::default()
        }
    }

    #[test]
    fn requires_file_or_link() {
        assert!(resource().validate().is_ok());

        let mut no_payload = resource();
        no_payload.files.clear();
        assert!(matches!(
            no_payload.validate(),
            Err(ForumError::Validation { field: Some("files"), .. })
        ));

        no_payload.external_link = Some("https://doc.rust-lang.org/nomicon/".to_string());
        assert!(no_payload.validate().is_ok());
    }

    #[test]
    fn labels_and_links_fit_their_columns() {
        let mut r = resource();
        r.category = "x".repeat(MAX_LABEL_CHARS + 10);
        assert!(matches!(
            r.validate_metadata(),
            Err(ForumError::Validation { field: Some("category"), .. })
        ));

        let mut r = resource();
        r.difficulty = "d".repeat(MAX_LABEL_CHARS + 1);
        assert!(r.validate_metadata().is_err());

        let mut r = resource();
        r.resource_type = "t".repeat(MAX_LABEL_CHARS + 1);
        assert!(r.validate_metadata().is_err());

        let mut r = resource();
        r.external_link = Some(format!("https://example.com/{}", "p".repeat(MAX_LINK_CHARS)));
        assert!(matches!(
            r.validate_metadata(),
            Err(ForumError::Validation { field: Some("external_link"), .. })
        ));
    }

    #[test]
    fn stored_paths_include_cover() {
        let mut r = resource();
        r.cover_image = Some("uploads/covers/ff-cover.png".to_string());
        assert_eq!(
            r.stored_paths(),
            vec![
                "uploads/resources/abc-sheet.pdf".to_string(),
                "uploads/covers/ff-cover.png".to_string(),
            ]
        );
    }

    #[test]
    fn external_link_must_be_http() {
        let mut r = resource();
        r.external_link = Some("javascript:alert(1)".to_string());
        assert!(r.validate().is_err());
        r.external_link = Some("not a url".to_string());
        assert!(r.validate().is_err());
    }
}
