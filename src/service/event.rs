//! Event service
//!
//! Festivals and rituals scheduled at monasteries.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;

use crate::auth::{Capability, Identity};
use crate::data::{Database, EntityId, Event};
use crate::error::AppError;

const DEFAULT_EVENT_TYPE: &str = "festival";
const MAX_EVENTS: i64 = 200;

#[derive(Debug, Clone, Deserialize)]
pub struct NewEvent {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub monastery: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub event_type: Option<String>,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub monastery: Option<String>,
    pub location: Option<String>,
    pub event_type: Option<String>,
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
}

fn required(value: &str, field: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

fn check_schedule(start_at: DateTime<Utc>, end_at: DateTime<Utc>) -> Result<(), AppError> {
    if end_at < start_at {
        return Err(AppError::Validation(
            "end_at must not be before start_at".to_string(),
        ));
    }
    Ok(())
}

/// Event service
pub struct EventService {
    db: Arc<Database>,
}

impl EventService {
    /// Create new event service
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// List events by start time
    ///
    /// With `upcoming`, events that already ended are left out.
    pub async fn list(&self, upcoming: bool) -> Result<Vec<Event>, AppError> {
        let cutoff = upcoming.then(Utc::now);
        self.db.list_events(cutoff, MAX_EVENTS).await
    }

    pub async fn get(&self, id: &str) -> Result<Event, AppError> {
        self.db.get_event(id).await?.ok_or(AppError::NotFound)
    }

    pub async fn create(&self, admin: &Identity, request: NewEvent) -> Result<Event, AppError> {
        admin.require(Capability::ManageEvents)?;
        check_schedule(request.start_at, request.end_at)?;

        let now = Utc::now();
        let event = Event {
            id: EntityId::new().0,
            title: required(&request.title, "title")?,
            description: request.description.trim().to_string(),
            monastery: required(&request.monastery, "monastery")?,
            location: request
                .location
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty()),
            event_type: request
                .event_type
                .map(|t| t.trim().to_ascii_lowercase())
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| DEFAULT_EVENT_TYPE.to_string()),
            start_at: request.start_at,
            end_at: request.end_at,
            created_by: admin.id.clone(),
            created_at: now,
            updated_at: now,
        };

        self.db.insert_event(&event).await?;
        tracing::info!(event_id = %event.id, title = %event.title, "Event created");
        Ok(event)
    }

    pub async fn update(
        &self,
        admin: &Identity,
        id: &str,
        update: EventUpdate,
    ) -> Result<Event, AppError> {
        admin.require(Capability::ManageEvents)?;
        let mut event = self.get(id).await?;

        if let Some(title) = update.title {
            event.title = required(&title, "title")?;
        }
        if let Some(description) = update.description {
            event.description = description.trim().to_string();
        }
        if let Some(monastery) = update.monastery {
            event.monastery = required(&monastery, "monastery")?;
        }
        if let Some(location) = update.location {
            let location = location.trim().to_string();
            event.location = (!location.is_empty()).then_some(location);
        }
        if let Some(event_type) = update.event_type {
            event.event_type = required(&event_type, "event_type")?.to_ascii_lowercase();
        }
        if let Some(start_at) = update.start_at {
            event.start_at = start_at;
        }
        if let Some(end_at) = update.end_at {
            event.end_at = end_at;
        }
        check_schedule(event.start_at, event.end_at)?;
        event.updated_at = Utc::now();

        self.db.update_event(&event).await?;
        Ok(event)
    }

    pub async fn delete(&self, admin: &Identity, id: &str) -> Result<(), AppError> {
        admin.require(Capability::ManageEvents)?;
        if !self.db.delete_event(id).await? {
            return Err(AppError::NotFound);
        }
        tracing::info!(event_id = %id, "Event deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn schedule_must_not_run_backwards() {
        let start = Utc::now();
        assert!(check_schedule(start, start).is_ok());
        assert!(check_schedule(start, start + Duration::hours(3)).is_ok());
        assert!(matches!(
            check_schedule(start, start - Duration::minutes(1)),
            Err(AppError::Validation(_))
        ));
    }
}
