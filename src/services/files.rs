use async_trait::async_trait;
use std::path::PathBuf;
use uuid::Uuid;

use super::ForumError;

/// A file persisted by a `FileStore`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub path: String,
    pub size: i64,
}

/// Where uploaded bytes end up.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Persist `bytes` under `folder`, returning the stored location.
    async fn save(&self, folder: &str, file_name: &str, bytes: &[u8]) -> Result<StoredFile, ForumError>;

    /// Delete a previously stored file. Removing a missing file succeeds.
    async fn remove(&self, path: &str) -> Result<(), ForumError>;
}

/// Best-effort removal of stored files whose owning record was never written
/// or has been deleted.
pub async fn discard(store: &dyn FileStore, paths: &[String]) {
    for path in paths {
        if let Err(e) = store.remove(path).await {
            tracing::warn!(path = %path, "failed to remove stored file: {}", e);
        }
    }
}

/// Extensions accepted for covers and avatars.
pub fn is_image_name(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    [".jpg", ".jpeg", ".png", ".gif", ".webp"]
        .iter()
        .any(|ext| lower.ends_with(ext))
}

/// Stores files on local disk as `<root>/<folder>/<uuid>-<sanitized name>`.
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn save(&self, folder: &str, file_name: &str, bytes: &[u8]) -> Result<StoredFile, ForumError> {
        let folder = sanitize_file_name(folder);
        let dir = self.root.join(&folder);
        tokio::fs::create_dir_all(&dir).await?;

        let name = format!("{}-{}", Uuid::new_v4().simple(), sanitize_file_name(file_name));
        let path = dir.join(name);
        tokio::fs::write(&path, bytes).await?;

        tracing::debug!(path = %path.display(), size = bytes.len(), "stored upload");
        Ok(StoredFile {
            path: path.to_string_lossy().into_owned(),
            size: bytes.len() as i64,
        })
    }

    async fn remove(&self, path: &str) -> Result<(), ForumError> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Longest sanitized name kept; the extension survives truncation.
const MAX_NAME_CHARS: usize = 100;

/// Reduce a client-supplied name to a safe final path component.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        return "file".to_string();
    }
    if cleaned.len() <= MAX_NAME_CHARS {
        return cleaned.to_string();
    }

    // Only ASCII survives cleaning, so byte offsets are character offsets.
    match cleaned.rfind('.') {
        Some(dot) if cleaned.len() - dot <= 16 => {
            let ext = &cleaned[dot..];
            format!("{}{}", &cleaned[..MAX_NAME_CHARS - ext.len()], ext)
        }
        _ => cleaned[..MAX_NAME_CHARS].to_string(),
    }
}
