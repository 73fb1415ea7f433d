//! API request and response DTOs
//!
//! Data Transfer Objects shared by the route handlers.

use serde::{Deserialize, Serialize};

/// Success envelope
///
/// Errors use the same shape with `success: false` (see `AppError`).
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            message: None,
            count: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl<T> ApiResponse<Vec<T>> {
    /// List response carrying its length
    pub fn list(data: Vec<T>) -> Self {
        let count = data.len();
        Self {
            success: true,
            data,
            message: None,
            count: Some(count),
        }
    }
}

/// Body-less success, e.g. after a delete
#[derive(Debug, Clone, Serialize)]
pub struct Deleted {
    pub id: String,
}

// =============================================================================
// Stories
// =============================================================================

/// Query parameters for GET /stories
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoryListQuery {
    /// Honoured for admins only
    pub status: Option<String>,
    pub monastery: Option<String>,
    #[serde(rename = "type")]
    pub media_type: Option<String>,
    pub limit: Option<i64>,
}

/// JSON body for POST /stories
#[derive(Debug, Clone, Deserialize)]
pub struct CreateStoryRequest {
    pub title: String,
    pub content: String,
    pub monastery: String,
    #[serde(default, alias = "type")]
    pub media_type: Option<String>,
    #[serde(default, alias = "mediaUrl")]
    pub media_url: Option<String>,
}

/// Body for PUT /stories/:id/moderate
#[derive(Debug, Clone, Deserialize)]
pub struct ModerateStoryRequest {
    pub status: String,
    #[serde(default, rename = "rejectionReason")]
    pub rejection_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

// =============================================================================
// Events and education
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventListQuery {
    #[serde(default)]
    pub upcoming: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryQuery {
    pub category: Option<String>,
}

/// Body for POST /education/quizzes/:id/submit
#[derive(Debug, Clone, Deserialize)]
pub struct QuizSubmission {
    pub answers: Vec<usize>,
}

// =============================================================================
// Chatbot
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
}

// =============================================================================
// Admin
// =============================================================================

/// Response for DELETE /monks/:id
#[derive(Debug, Clone, Serialize)]
pub struct MonkDeleted {
    pub id: String,
    pub posts_removed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_envelope_carries_count() {
        let body = serde_json::to_value(ApiResponse::list(vec![1, 2, 3])).unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["count"], 3);
        assert!(body.get("message").is_none());
    }

    #[test]
    fn moderate_request_reads_camel_case_reason() {
        let request: ModerateStoryRequest = serde_json::from_value(serde_json::json!({
            "status": "rejected",
            "rejectionReason": "Off topic"
        }))
        .unwrap();
        assert_eq!(request.rejection_reason.as_deref(), Some("Off topic"));
    }
}
