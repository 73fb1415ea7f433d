//! Chat service
//!
//! Forwards visitor questions to the generative AI API behind the
//! process-wide `ChatRateLimiter`.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use super::rate_limit::{ChatRateLimitStats, ChatRateLimiter};
use crate::config::ChatbotConfig;
use crate::data::catalog;
use crate::error::AppError;
use crate::metrics::CHAT_REQUESTS_TOTAL;

pub const MAX_MESSAGE_CHARS: usize = 2000;

/// Answer from the assistant
#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub reply: String,
    pub model: String,
}

/// Chatbot availability
#[derive(Debug, Clone, Serialize)]
pub struct ChatStatus {
    pub configured: bool,
    pub model: String,
    pub rate_limit: ChatRateLimitStats,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateResponse {
    fn into_text(self) -> Option<String> {
        let text: String = self
            .candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .filter_map(|part| part.text)
            .collect();
        let text = text.trim().to_string();
        (!text.is_empty()).then_some(text)
    }
}

/// Fixed preamble sent ahead of every visitor message
pub fn system_prompt() -> String {
    let names: Vec<&str> = catalog::monasteries().iter().map(|m| m.name).collect();
    format!(
        "You are a friendly and knowledgeable guide to the Buddhist monasteries of Sikkim, India. \
         Answer questions about their history, rituals, festivals, etiquette and how to visit them. \
         Keep answers concise and respectful, and say so when you are unsure. \
         Monasteries covered by this platform: {}.",
        names.join(", ")
    )
}

fn validate_message(message: &str) -> Result<&str, AppError> {
    let message = message.trim();
    if message.is_empty() {
        return Err(AppError::Validation("message is required".to_string()));
    }
    if message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(AppError::Validation(format!(
            "message must be at most {} characters",
            MAX_MESSAGE_CHARS
        )));
    }
    Ok(message)
}

fn record(outcome: &str) {
    CHAT_REQUESTS_TOTAL.with_label_values(&[outcome]).inc();
}

/// Chat service
pub struct ChatService {
    http_client: Arc<reqwest::Client>,
    config: ChatbotConfig,
    limiter: Arc<ChatRateLimiter>,
}

impl ChatService {
    /// Create new chat service
    pub fn new(
        http_client: Arc<reqwest::Client>,
        config: ChatbotConfig,
        limiter: Arc<ChatRateLimiter>,
    ) -> Self {
        Self {
            http_client,
            config,
            limiter,
        }
    }

    pub async fn status(&self) -> ChatStatus {
        ChatStatus {
            configured: self.config.api_key().is_some(),
            model: self.config.model.clone(),
            rate_limit: self.limiter.stats().await,
        }
    }

    /// Ask the assistant a question
    ///
    /// # Errors
    /// - Validation for empty or oversized messages
    /// - UpstreamUnavailable when no API key is configured
    /// - RateLimited when the local window is full or the quota is exhausted
    pub async fn chat(&self, message: &str) -> Result<ChatReply, AppError> {
        let message = validate_message(message)?;

        let Some(api_key) = self.config.api_key() else {
            record("unconfigured");
            return Err(AppError::UpstreamUnavailable(
                "Chatbot is not configured".to_string(),
            ));
        };

        if let Err(e) = self.limiter.check_and_record().await {
            record("rate_limited");
            return Err(e);
        }

        let url = format!(
            "{}/{}:generateContent",
            self.config.api_url.trim_end_matches('/'),
            self.config.model
        );
        let body = json!({
            "contents": [{
                "parts": [{ "text": format!("{}\n\nVisitor question: {}", system_prompt(), message) }]
            }]
        });

        let response = self
            .http_client
            .post(&url)
            .query(&[("key", api_key)])
            .timeout(Duration::from_secs(self.config.timeout_seconds))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                record("unavailable");
                tracing::warn!(error = %e, "Chat request failed");
                AppError::UpstreamUnavailable("AI service is unreachable".to_string())
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            record("quota_exhausted");
            self.limiter.mark_quota_exhausted().await;
            return Err(AppError::RateLimited {
                message: "AI quota exhausted. Please try again later.".to_string(),
                retry_after: self.config.quota_cooldown_seconds,
            });
        }
        if !status.is_success() {
            record("upstream_error");
            return Err(AppError::Upstream(format!(
                "AI service returned HTTP {}",
                status
            )));
        }
        self.limiter.mark_success().await;

        let parsed: GenerateResponse = response.json().await.map_err(|e| {
            record("upstream_error");
            AppError::Upstream(format!("Malformed AI response: {}", e))
        })?;
        let reply = parsed.into_text().ok_or_else(|| {
            record("upstream_error");
            AppError::Upstream("AI response contained no text".to_string())
        })?;

        record("ok");
        tracing::debug!(chars = reply.len(), "Chat reply received");

        Ok(ChatReply {
            reply,
            model: self.config.model.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_bounds() {
        assert!(validate_message("").is_err());
        assert!(validate_message("   ").is_err());
        assert_eq!(validate_message("  Hello ").unwrap(), "Hello");

        let at_limit = "a".repeat(MAX_MESSAGE_CHARS);
        assert!(validate_message(&at_limit).is_ok());
        let over = "a".repeat(MAX_MESSAGE_CHARS + 1);
        assert!(validate_message(&over).is_err());
    }

    #[test]
    fn system_prompt_lists_catalog() {
        let prompt = system_prompt();
        for monastery in catalog::monasteries() {
            assert!(prompt.contains(monastery.name));
        }
    }

    #[test]
    fn response_text_is_extracted() {
        let parsed: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Rumtek is " }, { "text": "near Gangtok." }] }
            }]
        }))
        .unwrap();
        assert_eq!(parsed.into_text().as_deref(), Some("Rumtek is near Gangtok."));

        let empty: GenerateResponse = serde_json::from_value(json!({})).unwrap();
        assert!(empty.into_text().is_none());
    }

    #[tokio::test]
    async fn any_successful_status_clears_quota_flag() {
        let limiter = Arc::new(ChatRateLimiter::new(
            10,
            Duration::from_secs(60),
            Duration::from_secs(60),
        ));

        // A concurrent 429 lands while this call is in flight; the upstream then
        // answers 200 with a body that carries no reply text.
        let upstream_limiter = limiter.clone();
        let app = axum::Router::new().fallback(move || {
            let limiter = upstream_limiter.clone();
            async move {
                limiter.mark_quota_exhausted().await;
                axum::Json(json!({}))
            }
        });
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let config = ChatbotConfig {
            api_key: Some("test-key".to_string()),
            api_url: format!("http://{}/models", addr),
            model: "test-model".to_string(),
            timeout_seconds: 5,
            max_requests_per_window: 10,
            window_seconds: 60,
            quota_cooldown_seconds: 60,
            prune_interval_seconds: 60,
        };
        let service = ChatService::new(Arc::new(reqwest::Client::new()), config, limiter.clone());

        let result = service.chat("Where is Rumtek?").await;
        assert!(matches!(result, Err(AppError::Upstream(_))));

        let stats = limiter.stats().await;
        assert!(!stats.quota_exhausted);
        assert!(stats.seconds_until_reset.is_none());
    }
}
