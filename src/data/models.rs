//! Data models
//!
//! Rust structs representing database entities.
//! All models use ULID for IDs and chrono for timestamps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

// =============================================================================
// ID Types
// =============================================================================

/// Entity ID wrapper (ULID format, 26 characters)
///
/// Example: "01ARZ3NDEKTSV4RRFFQ69G5FAV"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    /// Generate a new ULID
    pub fn new() -> Self {
        Self(ulid::Ulid::new().to_string())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Identities
// =============================================================================

/// A regular user or an admin
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    /// Values: user, admin
    pub role: String,
    /// Contribution counters, one per story media type
    pub stories_count: i64,
    pub photos_count: i64,
    pub videos_count: i64,
    pub created_at: DateTime<Utc>,
}

/// A monk. Always carries the monk role.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Monk {
    pub id: String,
    pub name: String,
    pub email: String,
    /// Monastery the monk belongs to
    pub monastery: String,
    pub bio: Option<String>,
    /// Kept equal to the number of rows in monk_posts for this monk
    pub total_posts: i64,
    pub stories_count: i64,
    pub photos_count: i64,
    pub videos_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Post published by a monk
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MonkPost {
    pub id: String,
    pub monk_id: String,
    pub title: String,
    pub content: String,
    pub media_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Stories
// =============================================================================

/// User-submitted story, photo or video
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Story {
    pub id: String,
    pub title: String,
    pub content: String,
    /// Monastery the story is about
    pub monastery: String,
    /// Values: story, photo, video
    pub media_type: String,
    pub media_url: Option<String>,
    pub author_id: String,
    /// Role of the author when the story was created
    pub author_role: String,
    /// Values: pending, approved, rejected
    pub status: String,
    pub moderated_by: Option<String>,
    pub moderated_at: Option<DateTime<Utc>>,
    #[serde(rename = "rejectionReason")]
    pub rejection_reason: Option<String>,
    pub views: i64,
    pub likes: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Moderation state of a story
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoryStatus {
    Pending,
    Approved,
    Rejected,
}

impl StoryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

/// Kind of media a story carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Story,
    Photo,
    Video,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Story => "story",
            Self::Photo => "photo",
            Self::Video => "video",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "story" => Some(Self::Story),
            "photo" => Some(Self::Photo),
            "video" => Some(Self::Video),
            _ => None,
        }
    }

    /// Counter column bumped when a story of this type is created
    pub fn counter_column(&self) -> &'static str {
        match self {
            Self::Story => "stories_count",
            Self::Photo => "photos_count",
            Self::Video => "videos_count",
        }
    }
}

/// Which stories a list query may return
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoryVisibility {
    /// Every status
    All,
    /// Exactly one status
    Status(StoryStatus),
    /// Anything by `author_id`, plus approved stories from anyone
    OwnOrApproved { author_id: String },
    ApprovedOnly,
}

/// Extra list filters that apply on top of visibility
#[derive(Debug, Clone, Default)]
pub struct StoryFilter {
    pub monastery: Option<String>,
    pub media_type: Option<MediaType>,
    pub limit: i64,
}

// =============================================================================
// Itineraries
// =============================================================================

/// Monastery chosen for an itinerary, with the day it is visited
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedMonastery {
    pub name: String,
    pub day: u32,
    pub nearest_town: String,
}

/// Generated travel plan, owned by one identity
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Itinerary {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub days: i64,
    pub travel_experience: String,
    pub budget_category: String,
    pub season: String,
    pub weather_condition: String,
    pub stay_type: String,
    pub food_preference: String,
    pub recommended_transport: String,
    pub monasteries: Json<Vec<SelectedMonastery>>,
    /// Rendered day-by-day plan
    pub day_plan: String,
    pub daily_cost: i64,
    pub estimated_total: i64,
    pub notes: String,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
}

/// Filters for the public itinerary search
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItinerarySearch {
    pub travel_experience: Option<String>,
    pub budget_category: Option<String>,
    pub season: Option<String>,
    pub days: Option<i64>,
    /// Substring of a selected monastery name or town
    pub destination: Option<String>,
    pub stay_type: Option<String>,
    pub food_preference: Option<String>,
}

// =============================================================================
// Events
// =============================================================================

/// Festival, ritual or other scheduled event at a monastery
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub description: String,
    pub monastery: String,
    pub location: Option<String>,
    pub event_type: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Education
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    #[serde(default)]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Quiz {
    pub id: String,
    pub title: String,
    pub category: String,
    pub difficulty: String,
    pub questions: Json<Vec<QuizQuestion>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Flashcard {
    pub id: String,
    pub front: String,
    pub back: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Analytics
// =============================================================================

/// Aggregate counts for the admin dashboard
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardCounts {
    pub users: i64,
    pub monks: i64,
    pub monk_posts: i64,
    pub events: i64,
    pub itineraries: i64,
    pub quizzes: i64,
    pub flashcards: i64,
    pub stories_pending: i64,
    pub stories_approved: i64,
    pub stories_rejected: i64,
}
