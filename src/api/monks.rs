//! Monk and monk post endpoints

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection, rejection::QueryRejection},
    http::StatusCode,
    routing::{get, put},
};

use super::dto::{ApiResponse, Deleted, LimitQuery, MonkDeleted};
use crate::AppState;
use crate::auth::{AdminIdentity, MonkIdentity};
use crate::data::{Monk, MonkPost};
use crate::error::AppError;
use crate::service::{MonkPostUpdate, MonkService, MonkUpdate, NewMonk, NewMonkPost};

/// Create monks router
///
/// Routes:
/// - GET /monks, GET /monks/:id, GET /monks/:id/posts - Public
/// - POST /monks, PUT /monks/:id, DELETE /monks/:id - Admin
/// - PUT /monks/me - Monk updates own profile
/// - GET /monk-posts, GET /monk-posts/:id - Public
/// - POST /monk-posts, PUT /monk-posts/:id, DELETE /monk-posts/:id - Owning monk
pub fn monks_router() -> Router<AppState> {
    Router::new()
        .route("/monks", get(list_monks).post(create_monk))
        .route("/monks/me", put(update_own_profile))
        .route(
            "/monks/:id",
            get(get_monk).put(update_monk).delete(delete_monk),
        )
        .route("/monks/:id/posts", get(list_monk_posts_by_monk))
        .route("/monk-posts", get(list_monk_posts).post(create_monk_post))
        .route(
            "/monk-posts/:id",
            get(get_monk_post)
                .put(update_monk_post)
                .delete(delete_monk_post),
        )
}

// =============================================================================
// Profiles
// =============================================================================

/// GET /monks
async fn list_monks(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Monk>>>, AppError> {
    let monks = MonkService::new(state.db.clone()).list().await?;
    Ok(Json(ApiResponse::list(monks)))
}

/// GET /monks/:id
async fn get_monk(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Monk>>, AppError> {
    let monk = MonkService::new(state.db.clone()).get(&id).await?;
    Ok(Json(ApiResponse::ok(monk)))
}

/// POST /monks
async fn create_monk(
    State(state): State<AppState>,
    AdminIdentity(admin): AdminIdentity,
    payload: Result<Json<NewMonk>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Monk>>), AppError> {
    let Json(request) = payload?;
    let monk = MonkService::new(state.db.clone())
        .create(&admin, request)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(monk))))
}

/// PUT /monks/:id
async fn update_monk(
    State(state): State<AppState>,
    AdminIdentity(admin): AdminIdentity,
    Path(id): Path<String>,
    payload: Result<Json<MonkUpdate>, JsonRejection>,
) -> Result<Json<ApiResponse<Monk>>, AppError> {
    let Json(update) = payload?;
    let monk = MonkService::new(state.db.clone())
        .update(&admin, &id, update)
        .await?;
    Ok(Json(ApiResponse::ok(monk)))
}

/// PUT /monks/me
async fn update_own_profile(
    State(state): State<AppState>,
    MonkIdentity(monk): MonkIdentity,
    payload: Result<Json<MonkUpdate>, JsonRejection>,
) -> Result<Json<ApiResponse<Monk>>, AppError> {
    let Json(update) = payload?;
    let updated = MonkService::new(state.db.clone())
        .update_own_profile(&monk, update)
        .await?;
    Ok(Json(ApiResponse::ok(updated).with_message("Profile updated")))
}

/// DELETE /monks/:id
///
/// Removes the monk together with all of their posts.
async fn delete_monk(
    State(state): State<AppState>,
    AdminIdentity(admin): AdminIdentity,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<MonkDeleted>>, AppError> {
    let posts_removed = MonkService::new(state.db.clone())
        .delete(&admin, &id)
        .await?;
    Ok(Json(
        ApiResponse::ok(MonkDeleted { id, posts_removed }).with_message("Monk deleted"),
    ))
}

// =============================================================================
// Posts
// =============================================================================

/// GET /monk-posts
async fn list_monk_posts(
    State(state): State<AppState>,
    query: Result<Query<LimitQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<MonkPost>>>, AppError> {
    let Query(query) = query?;
    let posts = MonkService::new(state.db.clone())
        .list_posts(query.limit)
        .await?;
    Ok(Json(ApiResponse::list(posts)))
}

/// GET /monks/:id/posts
async fn list_monk_posts_by_monk(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Vec<MonkPost>>>, AppError> {
    let posts = MonkService::new(state.db.clone())
        .list_posts_by_monk(&id)
        .await?;
    Ok(Json(ApiResponse::list(posts)))
}

/// GET /monk-posts/:id
async fn get_monk_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<MonkPost>>, AppError> {
    let post = MonkService::new(state.db.clone()).get_post(&id).await?;
    Ok(Json(ApiResponse::ok(post)))
}

/// POST /monk-posts
async fn create_monk_post(
    State(state): State<AppState>,
    MonkIdentity(monk): MonkIdentity,
    payload: Result<Json<NewMonkPost>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<MonkPost>>), AppError> {
    let Json(request) = payload?;
    let post = MonkService::new(state.db.clone())
        .create_post(&monk, request)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(post))))
}

/// PUT /monk-posts/:id
async fn update_monk_post(
    State(state): State<AppState>,
    MonkIdentity(monk): MonkIdentity,
    Path(id): Path<String>,
    payload: Result<Json<MonkPostUpdate>, JsonRejection>,
) -> Result<Json<ApiResponse<MonkPost>>, AppError> {
    let Json(update) = payload?;
    let post = MonkService::new(state.db.clone())
        .update_post(&monk, &id, update)
        .await?;
    Ok(Json(ApiResponse::ok(post)))
}

/// DELETE /monk-posts/:id
async fn delete_monk_post(
    State(state): State<AppState>,
    MonkIdentity(monk): MonkIdentity,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Deleted>>, AppError> {
    MonkService::new(state.db.clone())
        .delete_post(&monk, &id)
        .await?;
    Ok(Json(
        ApiResponse::ok(Deleted { id }).with_message("Post deleted"),
    ))
}
