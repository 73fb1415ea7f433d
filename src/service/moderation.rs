//! Story service
//!
//! Story lifecycle and visibility:
//! - Monk stories are approved on creation, everything else starts pending
//! - Only admins move a story between approved and rejected
//! - Each viewer role sees a different slice of the story set

use chrono::Utc;
use std::sync::Arc;

use crate::auth::{Capability, Identity, Role};
use crate::data::{
    Database, EntityId, MediaType, Story, StoryFilter, StoryStatus, StoryVisibility, catalog,
};
use crate::error::AppError;
use crate::metrics::{STORIES_CREATED_TOTAL, STORIES_MODERATED_TOTAL};
use crate::storage::MediaStorage;

pub const DEFAULT_LIST_LIMIT: i64 = 20;
pub const MAX_LIST_LIMIT: i64 = 100;

/// Status a new story starts in
pub fn initial_status(author_role: Role) -> StoryStatus {
    if author_role.can(Capability::AutoApproveStories) {
        StoryStatus::Approved
    } else {
        StoryStatus::Pending
    }
}

/// Which stories a list request may return
///
/// The status filter is honoured for admins only.
pub fn visibility_for(
    viewer: Option<&Identity>,
    status_filter: Option<StoryStatus>,
) -> StoryVisibility {
    match viewer {
        Some(identity) if identity.is_admin() => match status_filter {
            Some(status) => StoryVisibility::Status(status),
            None => StoryVisibility::All,
        },
        Some(identity) if identity.is_monk() => StoryVisibility::OwnOrApproved {
            author_id: identity.id.clone(),
        },
        _ => StoryVisibility::ApprovedOnly,
    }
}

/// Whether `viewer` may see a single story
pub fn is_visible(viewer: Option<&Identity>, story: &Story) -> bool {
    let approved = story.status == StoryStatus::Approved.as_str();
    match visibility_for(viewer, None) {
        StoryVisibility::All => true,
        StoryVisibility::OwnOrApproved { author_id } => approved || story.author_id == author_id,
        StoryVisibility::Status(status) => story.status == status.as_str(),
        StoryVisibility::ApprovedOnly => approved,
    }
}

/// Authors may delete their own stories, admins may delete any
pub fn can_delete(viewer: &Identity, story: &Story) -> bool {
    viewer.owns(&story.author_id) || viewer.can(Capability::DeleteAnyStory)
}

/// Catalog spelling of a monastery name; unknown names are kept as typed
pub fn canonical_monastery(name: &str) -> String {
    match catalog::find(name) {
        Some(record) => record.name.to_string(),
        None => name.trim().to_string(),
    }
}

/// Story fields supplied by the author
#[derive(Debug, Clone)]
pub struct NewStory {
    pub title: String,
    pub content: String,
    pub monastery: String,
    pub media_type: MediaType,
    pub media_url: Option<String>,
}

/// File uploaded alongside a story
#[derive(Debug, Clone)]
pub struct StoryUpload {
    pub data: Vec<u8>,
    pub content_type: String,
}

fn require_text(value: &str, field: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

fn check_upload_type(media_type: MediaType, content_type: &str) -> Result<(), AppError> {
    let is_image = content_type.starts_with("image/");
    let is_video = content_type.starts_with("video/");
    let accepted = match media_type {
        MediaType::Photo => is_image,
        MediaType::Video => is_video,
        MediaType::Story => is_image || is_video,
    };
    if !accepted {
        return Err(AppError::Validation(format!(
            "Content type {} is not allowed for {} stories",
            content_type,
            media_type.as_str()
        )));
    }
    Ok(())
}

/// Story service
pub struct StoryService {
    db: Arc<Database>,
    storage: Arc<MediaStorage>,
}

impl StoryService {
    /// Create new story service
    pub fn new(db: Arc<Database>, storage: Arc<MediaStorage>) -> Self {
        Self { db, storage }
    }

    /// Create a story
    ///
    /// # Side Effects
    /// - Writes the uploaded file to media storage
    /// - Inserts the story
    /// - Bumps the author's contribution counter for the media type
    pub async fn create(
        &self,
        author: &Identity,
        new_story: NewStory,
        upload: Option<StoryUpload>,
    ) -> Result<Story, AppError> {
        author.require(Capability::CreateStories)?;
        require_text(&new_story.title, "title")?;
        require_text(&new_story.content, "content")?;
        require_text(&new_story.monastery, "monastery")?;

        let id = EntityId::new().0;
        let mut uploaded_key = None;
        let media_url = match upload {
            Some(upload) => {
                check_upload_type(new_story.media_type, &upload.content_type)?;
                let (key, url) = self
                    .storage
                    .upload_story_media(&id, &upload.data, &upload.content_type)
                    .await?;
                uploaded_key = Some(key);
                Some(url)
            }
            None => new_story
                .media_url
                .map(|url| url.trim().to_string())
                .filter(|url| !url.is_empty()),
        };

        if media_url.is_none() && new_story.media_type != MediaType::Story {
            return Err(AppError::Validation(format!(
                "media is required for {} stories",
                new_story.media_type.as_str()
            )));
        }

        let status = initial_status(author.role);
        let now = Utc::now();
        let story = Story {
            id,
            title: new_story.title.trim().to_string(),
            content: new_story.content,
            monastery: canonical_monastery(&new_story.monastery),
            media_type: new_story.media_type.as_str().to_string(),
            media_url,
            author_id: author.id.clone(),
            author_role: author.role.as_str().to_string(),
            status: status.as_str().to_string(),
            moderated_by: None,
            moderated_at: None,
            rejection_reason: None,
            views: 0,
            likes: 0,
            created_at: now,
            updated_at: now,
        };

        if let Err(e) = self.db.insert_story(&story).await {
            if let Some(key) = uploaded_key {
                if let Err(cleanup) = self.storage.delete(&key).await {
                    tracing::warn!(key = %key, error = %cleanup, "Failed to remove orphaned upload");
                }
            }
            return Err(e);
        }

        // Counter update is a separate write; a failure only leaves the counter behind.
        let counter = if author.is_monk() {
            self.db
                .increment_monk_contribution(&author.id, new_story.media_type)
                .await
        } else {
            self.db
                .increment_user_contribution(&author.id, new_story.media_type)
                .await
        };
        if let Err(e) = counter {
            tracing::warn!(
                author = %author.id,
                error = %e,
                "Failed to update contribution counter"
            );
        }

        STORIES_CREATED_TOTAL
            .with_label_values(&[new_story.media_type.as_str(), status.as_str()])
            .inc();
        tracing::info!(
            story_id = %story.id,
            author = %author.id,
            status = status.as_str(),
            "Story created"
        );

        Ok(story)
    }

    /// List stories visible to `viewer`, newest first
    pub async fn list(
        &self,
        viewer: Option<&Identity>,
        status_filter: Option<&str>,
        mut filter: StoryFilter,
    ) -> Result<Vec<Story>, AppError> {
        let status = match status_filter.map(str::trim).filter(|s| !s.is_empty()) {
            Some(value) => Some(StoryStatus::parse(value).ok_or_else(|| {
                AppError::Validation(format!("Unknown story status: {}", value))
            })?),
            None => None,
        };

        if filter.limit <= 0 {
            filter.limit = DEFAULT_LIST_LIMIT;
        }
        filter.limit = filter.limit.min(MAX_LIST_LIMIT);

        let visibility = visibility_for(viewer, status);
        self.db.list_stories(&visibility, &filter).await
    }

    /// Fetch a single story and count the view
    pub async fn get(&self, viewer: Option<&Identity>, id: &str) -> Result<Story, AppError> {
        let mut story = self.db.get_story(id).await?.ok_or(AppError::NotFound)?;
        if !is_visible(viewer, &story) {
            return Err(AppError::NotFound);
        }

        self.db.increment_story_views(id).await?;
        story.views += 1;
        Ok(story)
    }

    pub async fn like(&self, viewer: Option<&Identity>, id: &str) -> Result<Story, AppError> {
        let mut story = self.db.get_story(id).await?.ok_or(AppError::NotFound)?;
        if !is_visible(viewer, &story) {
            return Err(AppError::NotFound);
        }

        self.db.increment_story_likes(id).await?;
        story.likes += 1;
        Ok(story)
    }

    /// Stories written by `author`, any status
    pub async fn list_mine(&self, author: &Identity) -> Result<Vec<Story>, AppError> {
        self.db.list_stories_by_author(&author.id).await
    }

    /// Moderation queue, oldest first
    pub async fn list_pending(&self, moderator: &Identity, limit: i64) -> Result<Vec<Story>, AppError> {
        moderator.require(Capability::ModerateStories)?;
        let limit = if limit <= 0 { DEFAULT_LIST_LIMIT } else { limit.min(MAX_LIST_LIMIT) };
        self.db.list_pending_stories(limit).await
    }

    /// Approve or reject a story
    ///
    /// A reason is only kept when rejecting; a blank reason is dropped.
    pub async fn moderate(
        &self,
        moderator: &Identity,
        id: &str,
        status: &str,
        rejection_reason: Option<String>,
    ) -> Result<Story, AppError> {
        moderator.require(Capability::ModerateStories)?;

        let status = StoryStatus::parse(status)
            .ok_or_else(|| AppError::Validation(format!("Unknown story status: {}", status)))?;
        if status == StoryStatus::Pending {
            return Err(AppError::Validation(
                "Stories can only be moderated to approved or rejected".to_string(),
            ));
        }

        let reason = match status {
            StoryStatus::Rejected => rejection_reason.filter(|r| !r.trim().is_empty()),
            _ => None,
        };

        let now = Utc::now();
        let updated = self
            .db
            .moderate_story(id, status, &moderator.id, now, reason.as_deref())
            .await?;
        if !updated {
            return Err(AppError::NotFound);
        }

        STORIES_MODERATED_TOTAL
            .with_label_values(&[status.as_str()])
            .inc();
        tracing::info!(
            story_id = %id,
            moderator = %moderator.id,
            status = status.as_str(),
            "Story moderated"
        );

        self.db.get_story(id).await?.ok_or(AppError::NotFound)
    }

    /// Delete a story and its stored media
    pub async fn delete(&self, viewer: &Identity, id: &str) -> Result<(), AppError> {
        let story = self.db.get_story(id).await?.ok_or(AppError::NotFound)?;
        if !can_delete(viewer, &story) {
            return Err(AppError::Forbidden);
        }

        self.db.delete_story(id).await?;

        if let Some(key) = story
            .media_url
            .as_deref()
            .and_then(|url| self.storage.story_media_key(&story.id, url))
        {
            if let Err(e) = self.storage.delete(key).await {
                tracing::warn!(story_id = %id, error = %e, "Failed to delete story media");
            }
        }

        tracing::info!(story_id = %id, deleted_by = %viewer.id, "Story deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(id: &str, role: Role) -> Identity {
        Identity {
            id: id.to_string(),
            name: id.to_string(),
            email: format!("{}@example.com", id),
            role,
        }
    }

    fn story(author_id: &str, status: StoryStatus) -> Story {
        let now = Utc::now();
        Story {
            id: EntityId::new().0,
            title: "t".to_string(),
            content: "c".to_string(),
            monastery: "m".to_string(),
            media_type: "story".to_string(),
            media_url: None,
            author_id: author_id.to_string(),
            author_role: "user".to_string(),
            status: status.as_str().to_string(),
            moderated_by: None,
            moderated_at: None,
            rejection_reason: None,
            views: 0,
            likes: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn monk_stories_are_auto_approved() {
        assert_eq!(initial_status(Role::Monk), StoryStatus::Approved);
        assert_eq!(initial_status(Role::User), StoryStatus::Pending);
        assert_eq!(initial_status(Role::Admin), StoryStatus::Pending);
    }

    #[test]
    fn admin_visibility_honours_filter() {
        let admin = identity("admin", Role::Admin);
        assert_eq!(visibility_for(Some(&admin), None), StoryVisibility::All);
        assert_eq!(
            visibility_for(Some(&admin), Some(StoryStatus::Rejected)),
            StoryVisibility::Status(StoryStatus::Rejected)
        );
    }

    #[test]
    fn non_admins_ignore_filter() {
        let user = identity("user-a", Role::User);
        assert_eq!(
            visibility_for(Some(&user), Some(StoryStatus::Pending)),
            StoryVisibility::ApprovedOnly
        );
        assert_eq!(
            visibility_for(None, Some(StoryStatus::Pending)),
            StoryVisibility::ApprovedOnly
        );

        let monk = identity("monk-a", Role::Monk);
        assert_eq!(
            visibility_for(Some(&monk), Some(StoryStatus::Rejected)),
            StoryVisibility::OwnOrApproved {
                author_id: "monk-a".to_string()
            }
        );
    }

    #[test]
    fn single_story_visibility() {
        let user_a = identity("user-a", Role::User);
        let monk_a = identity("monk-a", Role::Monk);
        let monk_b = identity("monk-b", Role::Monk);
        let admin = identity("admin", Role::Admin);

        let pending_by_user = story("user-a", StoryStatus::Pending);
        let pending_by_monk = story("monk-a", StoryStatus::Pending);
        let approved = story("user-b", StoryStatus::Approved);

        // Users never see their own pending stories through the public views
        assert!(!is_visible(Some(&user_a), &pending_by_user));
        assert!(!is_visible(None, &pending_by_user));
        assert!(is_visible(None, &approved));

        assert!(is_visible(Some(&monk_a), &pending_by_monk));
        assert!(!is_visible(Some(&monk_b), &pending_by_monk));
        assert!(is_visible(Some(&monk_b), &approved));

        assert!(is_visible(Some(&admin), &pending_by_user));
    }

    #[test]
    fn delete_rights() {
        let author = identity("user-a", Role::User);
        let other = identity("user-b", Role::User);
        let admin = identity("admin", Role::Admin);
        let own = story("user-a", StoryStatus::Approved);

        assert!(can_delete(&author, &own));
        assert!(!can_delete(&other, &own));
        assert!(can_delete(&admin, &own));
    }

    #[test]
    fn upload_type_must_match_media_type() {
        assert!(check_upload_type(MediaType::Photo, "image/png").is_ok());
        assert!(check_upload_type(MediaType::Photo, "video/mp4").is_err());
        assert!(check_upload_type(MediaType::Video, "video/mp4").is_ok());
        assert!(check_upload_type(MediaType::Video, "image/jpeg").is_err());
        assert!(check_upload_type(MediaType::Story, "image/jpeg").is_ok());
        assert!(check_upload_type(MediaType::Story, "application/pdf").is_err());
    }

    #[test]
    fn monastery_names_follow_catalog_spelling() {
        assert_eq!(canonical_monastery("  rumtek MONASTERY "), "Rumtek Monastery");
        assert_eq!(canonical_monastery(" Hilltop Gompa "), "Hilltop Gompa");
    }

    #[tokio::test]
    async fn failed_insert_removes_upload() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let db = Database::connect(&temp_dir.path().join("test.db")).await.unwrap();
        let storage = MediaStorage::new(&crate::config::StorageConfig {
            media_dir: temp_dir.path().join("uploads"),
            public_url: "http://localhost:8080/uploads".to_string(),
            max_upload_bytes: 1024,
        })
        .await
        .unwrap();
        db.reject_story_inserts_for_test().await.unwrap();

        let service = StoryService::new(Arc::new(db), Arc::new(storage));
        let new_story = NewStory {
            title: "Butter lamps".to_string(),
            content: "Evening puja".to_string(),
            monastery: "Enchey Monastery".to_string(),
            media_type: MediaType::Photo,
            media_url: None,
        };
        let upload = StoryUpload {
            data: vec![0xFF, 0xD8, 0xFF],
            content_type: "image/jpeg".to_string(),
        };

        let result = service
            .create(&identity("user-a", Role::User), new_story, Some(upload))
            .await;
        assert!(matches!(result, Err(AppError::Database(_))));

        let mut entries = tokio::fs::read_dir(temp_dir.path().join("uploads/stories"))
            .await
            .unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());
    }
}
