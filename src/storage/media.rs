//! Media storage on the local filesystem
//!
//! Handles upload, delete, and URL generation for story media.
//! Files are served back by the router under `/uploads`.

use std::path::{Path, PathBuf};

use crate::config::StorageConfig;
use crate::error::AppError;

/// Media storage service
///
/// Writes media below `root` and returns public URLs.
pub struct MediaStorage {
    /// Directory that holds uploaded files
    root: PathBuf,
    /// Public URL base
    /// e.g., "https://gompa.example.com/uploads"
    public_url: String,
    /// Largest accepted upload in bytes
    max_upload_bytes: usize,
}

impl MediaStorage {
    /// Create the storage directory if needed
    ///
    /// # Errors
    /// Returns error if the directory cannot be created
    pub async fn new(config: &StorageConfig) -> Result<Self, AppError> {
        tokio::fs::create_dir_all(&config.media_dir)
            .await
            .map_err(|e| {
                AppError::Storage(format!(
                    "Failed to create media directory {}: {}",
                    config.media_dir.display(),
                    e
                ))
            })?;

        Ok(Self {
            root: config.media_dir.clone(),
            public_url: config.public_url.trim_end_matches('/').to_string(),
            max_upload_bytes: config.max_upload_bytes,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    /// Store a file under `key`
    ///
    /// # Returns
    /// Public URL for the stored file
    pub async fn upload(&self, key: &str, data: &[u8]) -> Result<String, AppError> {
        if data.len() > self.max_upload_bytes {
            return Err(AppError::Validation(format!(
                "File too large (max {} bytes)",
                self.max_upload_bytes
            )));
        }

        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Storage(format!("Failed to create directory: {}", e)))?;
        }

        tokio::fs::write(&path, data)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write media file: {}", e)))?;

        tracing::debug!(key, bytes = data.len(), "Stored media file");
        Ok(self.get_public_url(key))
    }

    /// Upload story media
    ///
    /// Stores in stories/ prefix, extension picked from the content type.
    ///
    /// # Returns
    /// (storage key, public URL)
    pub async fn upload_story_media(
        &self,
        id: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<(String, String), AppError> {
        let ext = match content_type {
            "image/jpeg" => "jpg",
            "image/png" => "png",
            "image/webp" => "webp",
            "image/gif" => "gif",
            "video/mp4" => "mp4",
            "video/webm" => "webm",
            "video/quicktime" => "mov",
            _ => "bin",
        };

        let key = format!("stories/{}.{}", id, ext);
        let url = self.upload(&key, data).await?;
        Ok((key, url))
    }

    /// Delete a stored file. Missing files are ignored.
    pub async fn delete(&self, key: &str) -> Result<(), AppError> {
        let path = self.resolve(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Storage(format!(
                "Failed to delete media file: {}",
                e
            ))),
        }
    }

    /// Map a public URL back to its storage key, if it points at this store
    pub fn key_from_url<'a>(&self, url: &'a str) -> Option<&'a str> {
        url.strip_prefix(self.public_url.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|key| !key.is_empty())
    }

    /// Storage key of the media uploaded for `story_id`
    ///
    /// `None` when the URL points anywhere else, including another story's file.
    pub fn story_media_key<'a>(&self, story_id: &str, url: &'a str) -> Option<&'a str> {
        let prefix = format!("stories/{}.", story_id);
        self.key_from_url(url).filter(|key| {
            key.strip_prefix(prefix.as_str())
                .is_some_and(|ext| !ext.is_empty() && !ext.contains('/'))
        })
    }

    /// Get public URL for a storage key
    pub fn get_public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_url, key)
    }

    fn resolve(&self, key: &str) -> Result<PathBuf, AppError> {
        let relative = Path::new(key);
        let escapes = relative.components().any(|c| {
            !matches!(c, std::path::Component::Normal(_))
        });
        if key.is_empty() || escapes {
            return Err(AppError::Validation(format!("Invalid media key: {}", key)));
        }
        Ok(self.root.join(relative))
    }
}
