//! Service layer
//!
//! Contains business logic separated from HTTP handlers.
//! Services orchestrate database, media storage and outbound HTTP calls.

mod chat;
mod education;
mod event;
mod itinerary;
mod moderation;
mod monk;
mod preservation;
mod rate_limit;

pub use chat::{ChatReply, ChatService, ChatStatus, MAX_MESSAGE_CHARS, system_prompt};
pub use education::{
    EducationService, NewFlashcard, NewQuiz, PublicQuestion, PublicQuiz, QuestionResult,
    QuizResult,
};
pub use event::{EventService, EventUpdate, NewEvent};
pub use itinerary::{
    BudgetTier, ItineraryPlan, ItineraryService, MAX_DAYS, MIN_DAYS, TripPreferences,
    plan_itinerary,
};
pub use moderation::{
    NewStory, StoryService, StoryUpload, can_delete, initial_status, is_visible, visibility_for,
};
pub use monk::{MonkPostUpdate, MonkService, MonkUpdate, NewMonk, NewMonkPost};
pub use preservation::{ComparisonReport, ImageUpload, PreservationService, Severity};
pub use rate_limit::{ChatRateLimitStats, ChatRateLimiter};
