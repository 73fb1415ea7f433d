//! Monk service
//!
//! Monk profiles (admin managed, self-editable) and the posts monks publish.

use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;

use crate::auth::{Capability, Identity};
use crate::data::{Database, EntityId, Monk, MonkPost};
use crate::error::AppError;
use crate::metrics::MONK_POSTS_CREATED_TOTAL;

pub const DEFAULT_POST_LIMIT: i64 = 50;
pub const MAX_POST_LIMIT: i64 = 200;

/// Admin request to register a monk
#[derive(Debug, Clone, Deserialize)]
pub struct NewMonk {
    pub name: String,
    pub email: String,
    pub monastery: String,
    #[serde(default)]
    pub bio: Option<String>,
}

/// Partial profile update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MonkUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub monastery: Option<String>,
    pub bio: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMonkPost {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub media_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MonkPostUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub media_url: Option<String>,
}

fn required(value: &str, field: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

fn validate_email(email: &str) -> Result<String, AppError> {
    let email = required(email, "email")?;
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !valid {
        return Err(AppError::Validation(format!("Invalid email: {}", email)));
    }
    Ok(email)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Monk service
pub struct MonkService {
    db: Arc<Database>,
}

impl MonkService {
    /// Create new monk service
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    // =========================================================================
    // Profiles
    // =========================================================================

    pub async fn list(&self) -> Result<Vec<Monk>, AppError> {
        self.db.list_monks().await
    }

    pub async fn get(&self, id: &str) -> Result<Monk, AppError> {
        self.db.get_monk(id).await?.ok_or(AppError::NotFound)
    }

    /// Register a monk (admin only)
    pub async fn create(&self, admin: &Identity, request: NewMonk) -> Result<Monk, AppError> {
        admin.require(Capability::ManageMonks)?;

        let email = validate_email(&request.email)?;
        if self.db.get_monk_by_email(&email).await?.is_some() {
            return Err(AppError::Validation(format!(
                "A monk with email {} already exists",
                email
            )));
        }

        let now = Utc::now();
        let monk = Monk {
            id: EntityId::new().0,
            name: required(&request.name, "name")?,
            email,
            monastery: required(&request.monastery, "monastery")?,
            bio: non_blank(request.bio),
            total_posts: 0,
            stories_count: 0,
            photos_count: 0,
            videos_count: 0,
            created_at: now,
            updated_at: now,
        };

        self.db.insert_monk(&monk).await?;
        tracing::info!(monk_id = %monk.id, created_by = %admin.id, "Monk registered");
        Ok(monk)
    }

    /// Update any monk's profile (admin only)
    pub async fn update(
        &self,
        admin: &Identity,
        id: &str,
        update: MonkUpdate,
    ) -> Result<Monk, AppError> {
        admin.require(Capability::ManageMonks)?;
        let monk = self.get(id).await?;
        self.apply_update(monk, update).await
    }

    /// Update the caller's own profile
    ///
    /// Email changes are reserved for admins.
    pub async fn update_own_profile(
        &self,
        monk: &Identity,
        update: MonkUpdate,
    ) -> Result<Monk, AppError> {
        monk.require(Capability::UpdateOwnProfile)?;
        let record = self.get(&monk.id).await?;
        let update = MonkUpdate {
            email: None,
            ..update
        };
        self.apply_update(record, update).await
    }

    async fn apply_update(&self, mut monk: Monk, update: MonkUpdate) -> Result<Monk, AppError> {
        if let Some(name) = update.name {
            monk.name = required(&name, "name")?;
        }
        if let Some(monastery) = update.monastery {
            monk.monastery = required(&monastery, "monastery")?;
        }
        if let Some(email) = update.email {
            let email = validate_email(&email)?;
            if let Some(existing) = self.db.get_monk_by_email(&email).await? {
                if existing.id != monk.id {
                    return Err(AppError::Validation(format!(
                        "A monk with email {} already exists",
                        email
                    )));
                }
            }
            monk.email = email;
        }
        if update.bio.is_some() {
            monk.bio = non_blank(update.bio);
        }
        monk.updated_at = Utc::now();

        self.db.update_monk_profile(&monk).await?;
        tracing::info!(monk_id = %monk.id, "Monk profile updated");
        Ok(monk)
    }

    /// Delete a monk and all of their posts (admin only)
    ///
    /// # Returns
    /// Number of posts removed with the monk
    pub async fn delete(&self, admin: &Identity, id: &str) -> Result<u64, AppError> {
        admin.require(Capability::ManageMonks)?;

        let removed = self
            .db
            .delete_monk_cascade(id)
            .await?
            .ok_or(AppError::NotFound)?;

        tracing::info!(monk_id = %id, posts_removed = removed, "Monk deleted");
        Ok(removed)
    }

    // =========================================================================
    // Posts
    // =========================================================================

    pub async fn list_posts(&self, limit: Option<i64>) -> Result<Vec<MonkPost>, AppError> {
        let limit = limit
            .filter(|l| *l > 0)
            .unwrap_or(DEFAULT_POST_LIMIT)
            .min(MAX_POST_LIMIT);
        self.db.list_monk_posts(limit).await
    }

    pub async fn get_post(&self, id: &str) -> Result<MonkPost, AppError> {
        self.db.get_monk_post(id).await?.ok_or(AppError::NotFound)
    }

    pub async fn list_posts_by_monk(&self, monk_id: &str) -> Result<Vec<MonkPost>, AppError> {
        // 404 for unknown monks rather than an empty list
        self.get(monk_id).await?;
        self.db.list_posts_by_monk(monk_id).await
    }

    pub async fn create_post(
        &self,
        monk: &Identity,
        request: NewMonkPost,
    ) -> Result<MonkPost, AppError> {
        monk.require(Capability::ManageOwnPosts)?;

        let now = Utc::now();
        let post = MonkPost {
            id: EntityId::new().0,
            monk_id: monk.id.clone(),
            title: required(&request.title, "title")?,
            content: required(&request.content, "content")?,
            media_url: non_blank(request.media_url),
            created_at: now,
            updated_at: now,
        };

        self.db.insert_monk_post(&post).await?;

        MONK_POSTS_CREATED_TOTAL.inc();
        tracing::info!(post_id = %post.id, monk_id = %monk.id, "Monk post created");
        Ok(post)
    }

    pub async fn update_post(
        &self,
        monk: &Identity,
        id: &str,
        update: MonkPostUpdate,
    ) -> Result<MonkPost, AppError> {
        monk.require(Capability::ManageOwnPosts)?;

        let mut post = self.get_post(id).await?;
        if !monk.owns(&post.monk_id) {
            return Err(AppError::Forbidden);
        }

        if let Some(title) = update.title {
            post.title = required(&title, "title")?;
        }
        if let Some(content) = update.content {
            post.content = required(&content, "content")?;
        }
        if update.media_url.is_some() {
            post.media_url = non_blank(update.media_url);
        }
        post.updated_at = Utc::now();

        self.db.update_monk_post(&post).await?;
        Ok(post)
    }

    pub async fn delete_post(&self, monk: &Identity, id: &str) -> Result<(), AppError> {
        monk.require(Capability::ManageOwnPosts)?;

        let post = self.get_post(id).await?;
        if !monk.owns(&post.monk_id) {
            return Err(AppError::Forbidden);
        }

        if !self.db.delete_monk_post(&post).await? {
            return Err(AppError::NotFound);
        }

        tracing::info!(post_id = %id, monk_id = %monk.id, "Monk post deleted");
        Ok(())
    }
}
