//! SQLite database operations
//!
//! All database access goes through this module.

use chrono::{DateTime, Utc};
use sqlx::{Pool, QueryBuilder, Sqlite, SqlitePool};
use std::path::Path;

use super::models::*;
use crate::error::AppError;

const MAX_SEARCH_RESULTS: i64 = 50;

/// Database connection pool wrapper.
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    // =========================================================================
    // Connection
    // =========================================================================

    /// Connect to SQLite database
    ///
    /// Creates the database file if it doesn't exist.
    /// Runs pending migrations automatically.
    ///
    /// # Errors
    /// Returns error if connection or migration fails
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        let connection_string = format!("sqlite:{}?mode=rwc", path.display());
        let pool = SqlitePool::connect(&connection_string).await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::info!(path = %path.display(), "Database connected and migrated successfully");

        Ok(Self { pool })
    }

    // =========================================================================
    // Users
    // =========================================================================

    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ? COLLATE NOCASE")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, role, stories_count, photos_count, videos_count, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.role)
        .bind(user.stories_count)
        .bind(user.photos_count)
        .bind(user.videos_count)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Update name and role of an existing user
    pub async fn update_user(&self, id: &str, name: &str, role: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET name = ?, role = ? WHERE id = ?")
            .bind(name)
            .bind(role)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Bump the contribution counter matching `media_type`
    ///
    /// Not part of the story insert; a failure here leaves the counter
    /// behind the real story count.
    pub async fn increment_user_contribution(
        &self,
        id: &str,
        media_type: MediaType,
    ) -> Result<(), AppError> {
        let column = media_type.counter_column();
        sqlx::query(&format!(
            "UPDATE users SET {column} = {column} + 1 WHERE id = ?"
        ))
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // =========================================================================
    // Monks
    // =========================================================================

    pub async fn get_monk(&self, id: &str) -> Result<Option<Monk>, AppError> {
        let monk = sqlx::query_as::<_, Monk>("SELECT * FROM monks WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(monk)
    }

    pub async fn get_monk_by_email(&self, email: &str) -> Result<Option<Monk>, AppError> {
        let monk = sqlx::query_as::<_, Monk>("SELECT * FROM monks WHERE email = ? COLLATE NOCASE")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(monk)
    }

    pub async fn list_monks(&self) -> Result<Vec<Monk>, AppError> {
        let monks = sqlx::query_as::<_, Monk>("SELECT * FROM monks ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(monks)
    }

    pub async fn insert_monk(&self, monk: &Monk) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO monks (id, name, email, monastery, bio, total_posts,
                               stories_count, photos_count, videos_count, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&monk.id)
        .bind(&monk.name)
        .bind(&monk.email)
        .bind(&monk.monastery)
        .bind(&monk.bio)
        .bind(monk.total_posts)
        .bind(monk.stories_count)
        .bind(monk.photos_count)
        .bind(monk.videos_count)
        .bind(monk.created_at)
        .bind(monk.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Persist profile fields. Counters are left untouched.
    pub async fn update_monk_profile(&self, monk: &Monk) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE monks SET name = ?, email = ?, monastery = ?, bio = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&monk.name)
        .bind(&monk.email)
        .bind(&monk.monastery)
        .bind(&monk.bio)
        .bind(monk.updated_at)
        .bind(&monk.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Delete a monk together with all of their posts
    ///
    /// # Returns
    /// Number of posts removed, or None if the monk does not exist
    pub async fn delete_monk_cascade(&self, id: &str) -> Result<Option<u64>, AppError> {
        let mut tx = self.pool.begin().await?;

        let posts = sqlx::query("DELETE FROM monk_posts WHERE monk_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let monk = sqlx::query("DELETE FROM monks WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if monk.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        tx.commit().await?;
        Ok(Some(posts.rows_affected()))
    }

    pub async fn increment_monk_contribution(
        &self,
        id: &str,
        media_type: MediaType,
    ) -> Result<(), AppError> {
        let column = media_type.counter_column();
        sqlx::query(&format!(
            "UPDATE monks SET {column} = {column} + 1 WHERE id = ?"
        ))
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // =========================================================================
    // Monk posts
    // =========================================================================

    pub async fn get_monk_post(&self, id: &str) -> Result<Option<MonkPost>, AppError> {
        let post = sqlx::query_as::<_, MonkPost>("SELECT * FROM monk_posts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(post)
    }

    pub async fn list_monk_posts(&self, limit: i64) -> Result<Vec<MonkPost>, AppError> {
        let posts = sqlx::query_as::<_, MonkPost>(
            "SELECT * FROM monk_posts ORDER BY created_at DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(posts)
    }

    pub async fn list_posts_by_monk(&self, monk_id: &str) -> Result<Vec<MonkPost>, AppError> {
        let posts = sqlx::query_as::<_, MonkPost>(
            "SELECT * FROM monk_posts WHERE monk_id = ? ORDER BY created_at DESC",
        )
        .bind(monk_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(posts)
    }

    /// Insert a post and bump the author's `total_posts` atomically
    pub async fn insert_monk_post(&self, post: &MonkPost) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO monk_posts (id, monk_id, title, content, media_url, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&post.id)
        .bind(&post.monk_id)
        .bind(&post.title)
        .bind(&post.content)
        .bind(&post.media_url)
        .bind(post.created_at)
        .bind(post.updated_at)
        .execute(&mut *tx)
        .await?;

        let updated =
            sqlx::query("UPDATE monks SET total_posts = total_posts + 1, updated_at = ? WHERE id = ?")
                .bind(Utc::now())
                .bind(&post.monk_id)
                .execute(&mut *tx)
                .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(AppError::NotFound);
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn update_monk_post(&self, post: &MonkPost) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE monk_posts SET title = ?, content = ?, media_url = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&post.title)
        .bind(&post.content)
        .bind(&post.media_url)
        .bind(post.updated_at)
        .bind(&post.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Delete a post and decrement the author's `total_posts`, floored at zero
    ///
    /// # Returns
    /// false if no such post existed
    pub async fn delete_monk_post(&self, post: &MonkPost) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM monk_posts WHERE id = ?")
            .bind(&post.id)
            .execute(&mut *tx)
            .await?;

        if deleted.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query(
            "UPDATE monks SET total_posts = MAX(total_posts - 1, 0), updated_at = ? WHERE id = ?",
        )
        .bind(Utc::now())
        .bind(&post.monk_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }

    // =========================================================================
    // Stories
    // =========================================================================

    pub async fn insert_story(&self, story: &Story) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO stories (id, title, content, monastery, media_type, media_url,
                                 author_id, author_role, status, moderated_by, moderated_at,
                                 rejection_reason, views, likes, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&story.id)
        .bind(&story.title)
        .bind(&story.content)
        .bind(&story.monastery)
        .bind(&story.media_type)
        .bind(&story.media_url)
        .bind(&story.author_id)
        .bind(&story.author_role)
        .bind(&story.status)
        .bind(&story.moderated_by)
        .bind(story.moderated_at)
        .bind(&story.rejection_reason)
        .bind(story.views)
        .bind(story.likes)
        .bind(story.created_at)
        .bind(story.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) async fn reject_story_inserts_for_test(&self) -> Result<(), AppError> {
        sqlx::query(
            "CREATE TRIGGER reject_story_inserts BEFORE INSERT ON stories BEGIN SELECT RAISE(ABORT, 'stories are read-only'); END",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_story(&self, id: &str) -> Result<Option<Story>, AppError> {
        let story = sqlx::query_as::<_, Story>("SELECT * FROM stories WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(story)
    }

    /// List stories the caller may see, newest first
    pub async fn list_stories(
        &self,
        visibility: &StoryVisibility,
        filter: &StoryFilter,
    ) -> Result<Vec<Story>, AppError> {
        let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM stories WHERE 1 = 1");

        match visibility {
            StoryVisibility::All => {}
            StoryVisibility::Status(status) => {
                query.push(" AND status = ").push_bind(status.as_str());
            }
            StoryVisibility::OwnOrApproved { author_id } => {
                query
                    .push(" AND (author_id = ")
                    .push_bind(author_id.clone())
                    .push(" OR status = ")
                    .push_bind(StoryStatus::Approved.as_str())
                    .push(")");
            }
            StoryVisibility::ApprovedOnly => {
                query
                    .push(" AND status = ")
                    .push_bind(StoryStatus::Approved.as_str());
            }
        }

        if let Some(monastery) = &filter.monastery {
            query
                .push(" AND monastery = ")
                .push_bind(monastery.clone())
                .push(" COLLATE NOCASE");
        }
        if let Some(media_type) = filter.media_type {
            query.push(" AND media_type = ").push_bind(media_type.as_str());
        }

        query
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(filter.limit);

        let stories = query
            .build_query_as::<Story>()
            .fetch_all(&self.pool)
            .await?;
        Ok(stories)
    }

    /// Stories by one author in any status, newest first
    pub async fn list_stories_by_author(&self, author_id: &str) -> Result<Vec<Story>, AppError> {
        let stories = sqlx::query_as::<_, Story>(
            "SELECT * FROM stories WHERE author_id = ? ORDER BY created_at DESC",
        )
        .bind(author_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(stories)
    }

    /// Moderation queue, oldest first
    pub async fn list_pending_stories(&self, limit: i64) -> Result<Vec<Story>, AppError> {
        let stories = sqlx::query_as::<_, Story>(
            "SELECT * FROM stories WHERE status = ? ORDER BY created_at ASC LIMIT ?",
        )
        .bind(StoryStatus::Pending.as_str())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(stories)
    }

    /// Persist a moderation decision
    pub async fn moderate_story(
        &self,
        id: &str,
        status: StoryStatus,
        moderator_id: &str,
        moderated_at: DateTime<Utc>,
        rejection_reason: Option<&str>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE stories
            SET status = ?, moderated_by = ?, moderated_at = ?, rejection_reason = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(status.as_str())
        .bind(moderator_id)
        .bind(moderated_at)
        .bind(rejection_reason)
        .bind(moderated_at)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn increment_story_views(&self, id: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE stories SET views = views + 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn increment_story_likes(&self, id: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE stories SET likes = likes + 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn delete_story(&self, id: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM stories WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // =========================================================================
    // Itineraries
    // =========================================================================

    pub async fn insert_itinerary(&self, itinerary: &Itinerary) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO itineraries (id, user_id, title, days, travel_experience, budget_category,
                                     season, weather_condition, stay_type, food_preference,
                                     recommended_transport, monasteries, day_plan, daily_cost,
                                     estimated_total, notes, is_public, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&itinerary.id)
        .bind(&itinerary.user_id)
        .bind(&itinerary.title)
        .bind(itinerary.days)
        .bind(&itinerary.travel_experience)
        .bind(&itinerary.budget_category)
        .bind(&itinerary.season)
        .bind(&itinerary.weather_condition)
        .bind(&itinerary.stay_type)
        .bind(&itinerary.food_preference)
        .bind(&itinerary.recommended_transport)
        .bind(&itinerary.monasteries)
        .bind(&itinerary.day_plan)
        .bind(itinerary.daily_cost)
        .bind(itinerary.estimated_total)
        .bind(&itinerary.notes)
        .bind(itinerary.is_public)
        .bind(itinerary.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_itinerary(&self, id: &str) -> Result<Option<Itinerary>, AppError> {
        let itinerary = sqlx::query_as::<_, Itinerary>("SELECT * FROM itineraries WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(itinerary)
    }

    pub async fn list_itineraries_by_user(&self, user_id: &str) -> Result<Vec<Itinerary>, AppError> {
        let itineraries = sqlx::query_as::<_, Itinerary>(
            "SELECT * FROM itineraries WHERE user_id = ? ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(itineraries)
    }

    /// Search public itineraries, most recent first, capped at 50
    pub async fn search_itineraries(
        &self,
        search: &ItinerarySearch,
    ) -> Result<Vec<Itinerary>, AppError> {
        let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM itineraries WHERE is_public = 1");

        let exact_filters = [
            ("travel_experience", &search.travel_experience),
            ("budget_category", &search.budget_category),
            ("season", &search.season),
            ("stay_type", &search.stay_type),
            ("food_preference", &search.food_preference),
        ];
        for (column, value) in exact_filters {
            if let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                query
                    .push(format!(" AND {column} = "))
                    .push_bind(value.to_string())
                    .push(" COLLATE NOCASE");
            }
        }

        if let Some(days) = search.days {
            query.push(" AND days = ").push_bind(days);
        }

        if let Some(destination) = search
            .destination
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
        {
            let pattern = format!("%{}%", escape_like(destination));
            query
                .push(
                    " AND EXISTS (SELECT 1 FROM json_each(itineraries.monasteries) \
                     WHERE json_extract(value, '$.name') LIKE ",
                )
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR json_extract(value, '$.nearest_town') LIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\')");
        }

        query
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(MAX_SEARCH_RESULTS);

        let itineraries = query
            .build_query_as::<Itinerary>()
            .fetch_all(&self.pool)
            .await?;
        Ok(itineraries)
    }

    pub async fn delete_itinerary(&self, id: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM itineraries WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // =========================================================================
    // Events
    // =========================================================================

    pub async fn insert_event(&self, event: &Event) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO events (id, title, description, monastery, location, event_type,
                                start_at, end_at, created_by, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&event.id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.monastery)
        .bind(&event.location)
        .bind(&event.event_type)
        .bind(event.start_at)
        .bind(event.end_at)
        .bind(&event.created_by)
        .bind(event.created_at)
        .bind(event.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_event(&self, id: &str) -> Result<Option<Event>, AppError> {
        let event = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(event)
    }

    /// List events by start time
    ///
    /// With `ending_after` set, events that finished before it are skipped.
    pub async fn list_events(
        &self,
        ending_after: Option<DateTime<Utc>>,
        limit: i64,
    ) -> Result<Vec<Event>, AppError> {
        let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM events");
        if let Some(cutoff) = ending_after {
            query.push(" WHERE end_at >= ").push_bind(cutoff);
        }
        query.push(" ORDER BY start_at ASC LIMIT ").push_bind(limit);

        let events = query.build_query_as::<Event>().fetch_all(&self.pool).await?;
        Ok(events)
    }

    pub async fn update_event(&self, event: &Event) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE events
            SET title = ?, description = ?, monastery = ?, location = ?, event_type = ?,
                start_at = ?, end_at = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.monastery)
        .bind(&event.location)
        .bind(&event.event_type)
        .bind(event.start_at)
        .bind(event.end_at)
        .bind(event.updated_at)
        .bind(&event.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn delete_event(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM events WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Education
    // =========================================================================

    pub async fn insert_quiz(&self, quiz: &Quiz) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO quizzes (id, title, category, difficulty, questions, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&quiz.id)
        .bind(&quiz.title)
        .bind(&quiz.category)
        .bind(&quiz.difficulty)
        .bind(&quiz.questions)
        .bind(quiz.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_quiz(&self, id: &str) -> Result<Option<Quiz>, AppError> {
        let quiz = sqlx::query_as::<_, Quiz>("SELECT * FROM quizzes WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(quiz)
    }

    pub async fn list_quizzes(&self, category: Option<&str>) -> Result<Vec<Quiz>, AppError> {
        let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM quizzes");
        if let Some(category) = category {
            query
                .push(" WHERE category = ")
                .push_bind(category.to_string())
                .push(" COLLATE NOCASE");
        }
        query.push(" ORDER BY created_at DESC");

        let quizzes = query.build_query_as::<Quiz>().fetch_all(&self.pool).await?;
        Ok(quizzes)
    }

    pub async fn delete_quiz(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM quizzes WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn insert_flashcard(&self, card: &Flashcard) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO flashcards (id, front, back, category, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&card.id)
        .bind(&card.front)
        .bind(&card.back)
        .bind(&card.category)
        .bind(card.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_flashcard(&self, id: &str) -> Result<Option<Flashcard>, AppError> {
        let card = sqlx::query_as::<_, Flashcard>("SELECT * FROM flashcards WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(card)
    }

    pub async fn list_flashcards(&self, category: Option<&str>) -> Result<Vec<Flashcard>, AppError> {
        let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM flashcards");
        if let Some(category) = category {
            query
                .push(" WHERE category = ")
                .push_bind(category.to_string())
                .push(" COLLATE NOCASE");
        }
        query.push(" ORDER BY created_at DESC");

        let cards = query
            .build_query_as::<Flashcard>()
            .fetch_all(&self.pool)
            .await?;
        Ok(cards)
    }

    pub async fn delete_flashcard(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM flashcards WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Analytics
    // =========================================================================

    async fn count(&self, sql: &str) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(sql)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_stories_with_status(&self, status: StoryStatus) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM stories WHERE status = ?")
            .bind(status.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn dashboard_counts(&self) -> Result<DashboardCounts, AppError> {
        Ok(DashboardCounts {
            users: self.count("SELECT COUNT(*) FROM users").await?,
            monks: self.count("SELECT COUNT(*) FROM monks").await?,
            monk_posts: self.count("SELECT COUNT(*) FROM monk_posts").await?,
            events: self.count("SELECT COUNT(*) FROM events").await?,
            itineraries: self.count("SELECT COUNT(*) FROM itineraries").await?,
            quizzes: self.count("SELECT COUNT(*) FROM quizzes").await?,
            flashcards: self.count("SELECT COUNT(*) FROM flashcards").await?,
            stories_pending: self.count_stories_with_status(StoryStatus::Pending).await?,
            stories_approved: self.count_stories_with_status(StoryStatus::Approved).await?,
            stories_rejected: self.count_stories_with_status(StoryStatus::Rejected).await?,
        })
    }
}

/// Escape LIKE wildcards so user input matches literally under `ESCAPE '\'`
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
