//! Event endpoints

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection, rejection::QueryRejection},
    http::StatusCode,
    routing::get,
};

use super::dto::{ApiResponse, Deleted, EventListQuery};
use crate::AppState;
use crate::auth::AdminIdentity;
use crate::data::Event;
use crate::error::AppError;
use crate::service::{EventService, EventUpdate, NewEvent};

/// Create events router
///
/// Routes:
/// - GET /events - Public; `upcoming=true` drops finished events
/// - GET /events/:id - Public
/// - POST /events, PUT /events/:id, DELETE /events/:id - Admin
pub fn events_router() -> Router<AppState> {
    Router::new()
        .route("/events", get(list_events).post(create_event))
        .route(
            "/events/:id",
            get(get_event).put(update_event).delete(delete_event),
        )
}

/// GET /events
async fn list_events(
    State(state): State<AppState>,
    query: Result<Query<EventListQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<Event>>>, AppError> {
    let Query(query) = query?;
    let events = EventService::new(state.db.clone())
        .list(query.upcoming)
        .await?;
    Ok(Json(ApiResponse::list(events)))
}

/// GET /events/:id
async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Event>>, AppError> {
    let event = EventService::new(state.db.clone()).get(&id).await?;
    Ok(Json(ApiResponse::ok(event)))
}

/// POST /events
async fn create_event(
    State(state): State<AppState>,
    AdminIdentity(admin): AdminIdentity,
    payload: Result<Json<NewEvent>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Event>>), AppError> {
    let Json(request) = payload?;
    let event = EventService::new(state.db.clone())
        .create(&admin, request)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(event))))
}

/// PUT /events/:id
async fn update_event(
    State(state): State<AppState>,
    AdminIdentity(admin): AdminIdentity,
    Path(id): Path<String>,
    payload: Result<Json<EventUpdate>, JsonRejection>,
) -> Result<Json<ApiResponse<Event>>, AppError> {
    let Json(update) = payload?;
    let event = EventService::new(state.db.clone())
        .update(&admin, &id, update)
        .await?;
    Ok(Json(ApiResponse::ok(event)))
}

/// DELETE /events/:id
async fn delete_event(
    State(state): State<AppState>,
    AdminIdentity(admin): AdminIdentity,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Deleted>>, AppError> {
    EventService::new(state.db.clone())
        .delete(&admin, &id)
        .await?;
    Ok(Json(
        ApiResponse::ok(Deleted { id }).with_message("Event deleted"),
    ))
}
