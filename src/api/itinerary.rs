//! Itinerary endpoints
//!
//! Everything except search requires authentication.

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection, rejection::QueryRejection},
    http::StatusCode,
    middleware,
    routing::{get, post},
};

use super::dto::{ApiResponse, Deleted};
use crate::AppState;
use crate::auth::{CurrentIdentity, require_auth};
use crate::data::{Itinerary, ItinerarySearch};
use crate::error::AppError;
use crate::service::{ItineraryService, TripPreferences};

/// Create itinerary router
///
/// Routes:
/// - POST /itinerary/generate - Generate and store a plan
/// - GET /itinerary/search - Search public itineraries
/// - GET /itinerary/my-itineraries - Caller's itineraries
/// - GET /itinerary/:id - Owner, or anyone if public
/// - DELETE /itinerary/:id - Owner only
pub fn itinerary_router(state: AppState) -> Router<AppState> {
    let public_routes = Router::new().route("/itinerary/search", get(search));

    let authenticated_routes = Router::new()
        .route("/itinerary/generate", post(generate))
        .route("/itinerary/my-itineraries", get(my_itineraries))
        .route(
            "/itinerary/:id",
            get(get_itinerary).delete(delete_itinerary),
        )
        .route_layer(middleware::from_fn_with_state(state, require_auth));

    public_routes.merge(authenticated_routes)
}

/// POST /itinerary/generate
async fn generate(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    payload: Result<Json<TripPreferences>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Itinerary>>), AppError> {
    let Json(preferences) = payload?;

    let service = ItineraryService::new(state.db.clone());
    let itinerary = service.generate(&identity, preferences).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(itinerary).with_message("Itinerary generated")),
    ))
}

/// GET /itinerary/search
async fn search(
    State(state): State<AppState>,
    query: Result<Query<ItinerarySearch>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<Itinerary>>>, AppError> {
    let Query(search) = query?;

    let service = ItineraryService::new(state.db.clone());
    let itineraries = service.search(&search).await?;

    Ok(Json(ApiResponse::list(itineraries)))
}

/// GET /itinerary/my-itineraries
async fn my_itineraries(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
) -> Result<Json<ApiResponse<Vec<Itinerary>>>, AppError> {
    let service = ItineraryService::new(state.db.clone());
    let itineraries = service.list_for_owner(&identity).await?;

    Ok(Json(ApiResponse::list(itineraries)))
}

/// GET /itinerary/:id
async fn get_itinerary(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Itinerary>>, AppError> {
    let service = ItineraryService::new(state.db.clone());
    let itinerary = service.get_for(&identity, &id).await?;

    Ok(Json(ApiResponse::ok(itinerary)))
}

/// DELETE /itinerary/:id
async fn delete_itinerary(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Deleted>>, AppError> {
    let service = ItineraryService::new(state.db.clone());
    service.delete_for(&identity, &id).await?;

    Ok(Json(
        ApiResponse::ok(Deleted { id }).with_message("Itinerary deleted"),
    ))
}
