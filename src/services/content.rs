//! Text derivations shared by questions, posts, articles and resources.

use sqlx::PgConnection;

use super::ForumError;

pub const SUMMARY_CHARS: usize = 200;
pub const PREVIEW_CHARS: usize = 150;
pub const MAX_TITLE_CHARS: usize = 200;
pub const MAX_TAG_CHARS: usize = 50;
/// Short labels such as categories, resource types and difficulty.
pub const MAX_LABEL_CHARS: usize = 50;
/// Links and stored paths.
pub const MAX_LINK_CHARS: usize = 255;

/// Keep the first `limit` characters, appending "..." when anything was cut.
pub fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

pub fn summarize(content: &str) -> String {
    truncate_chars(content, SUMMARY_CHARS)
}

pub fn preview(content: &str) -> String {
    truncate_chars(content, PREVIEW_CHARS)
}

/// Split a comma-separated tag string: trimmed, empty entries dropped, first occurrence kept.
pub fn split_tags(raw: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

/// Human-readable size in base 1024 with one decimal ("0 B", "512 B", "1.5 KB").
pub fn format_file_size(bytes: i64) -> String {
    const UNIT: f64 = 1024.0;
    const UNITS: [&str; 6] = ["KB", "MB", "GB", "TB", "PB", "EB"];

    if bytes < 1024 {
        return format!("{} B", bytes.max(0));
    }

    let mut value = bytes as f64 / UNIT;
    let mut unit = 0;
    while value >= UNIT && unit < UNITS.len() - 1 {
        value /= UNIT;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

/// Validate a required, bounded title.
pub fn require_title(title: &str) -> Result<String, ForumError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ForumError::invalid("title", "Title is required"));
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(ForumError::invalid(
            "title",
            format!("Title must be at most {} characters", MAX_TITLE_CHARS),
        ));
    }
    Ok(title.to_string())
}

/// Reject values longer than the column that stores them.
pub fn limit_chars(field: &'static str, value: &str, max: usize) -> Result<(), ForumError> {
    if value.trim().chars().count() > max {
        return Err(ForumError::invalid(
            field,
            format!("{} must be at most {} characters", field, max),
        ));
    }
    Ok(())
}

pub fn require_content(field: &'static str, content: &str) -> Result<(), ForumError> {
    if content.trim().is_empty() {
        return Err(ForumError::invalid(field, "Content is required"));
    }
    Ok(())
}

/// Normalize a tag string and make sure every tag exists in the tag table.
/// Returns the canonical comma-joined form stored on the entity.
pub async fn register_tags(conn: &mut PgConnection, raw: &str) -> Result<String, ForumError> {
    let tags = split_tags(raw);
    if let Some(long) = tags.iter().find(|t| t.chars().count() > MAX_TAG_CHARS) {
        return Err(ForumError::invalid(
            "tags",
            format!("Tag '{}' exceeds {} characters", long, MAX_TAG_CHARS),
        ));
    }
    if tags.is_empty() {
        return Ok(String::new());
    }

    sqlx::query(
        r#"
        INSERT INTO tags (name, usage_count)
        SELECT name, 1 FROM UNNEST($1::TEXT[]) AS t(name)
        ON CONFLICT (name) DO UPDATE SET usage_count = tags.usage_count + 1
        "#,
    )
    .bind(&tags)
    .execute(&mut *conn)
    .await?;

    Ok(tags.join(","))
}
