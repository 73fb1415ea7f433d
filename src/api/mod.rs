//! API layer
//!
//! HTTP handlers for:
//! - Itineraries and stories
//! - Monks, monk posts and events
//! - Education content
//! - Chatbot and preservation proxies
//! - Admin dashboard
//! - Metrics (Prometheus)

mod admin;
mod chatbot;
mod dto;
mod education;
mod events;
mod itinerary;
pub mod metrics;
mod monks;
mod preservation;
mod stories;

pub use dto::*;

pub use admin::admin_router;
pub use chatbot::chatbot_router;
pub use education::education_router;
pub use events::events_router;
pub use itinerary::itinerary_router;
pub use metrics::{metrics_router, track_metrics};
pub use monks::monks_router;
pub use preservation::preservation_router;
pub use stories::stories_router;
