//! Story endpoints
//!
//! Listing and reading use optional authentication; the caller's role
//! decides which stories are visible.

use axum::{
    Json, Router,
    extract::{
        FromRequest, Multipart, Path, Query, Request, State, rejection::JsonRejection,
        rejection::QueryRejection,
    },
    http::{StatusCode, header::CONTENT_TYPE},
    routing::{get, post, put},
};

use super::dto::{
    ApiResponse, CreateStoryRequest, Deleted, LimitQuery, ModerateStoryRequest, StoryListQuery,
};
use crate::AppState;
use crate::auth::{AdminIdentity, CurrentIdentity, MaybeIdentity};
use crate::data::{MediaType, Story, StoryFilter};
use crate::error::AppError;
use crate::service::{NewStory, StoryService, StoryUpload};

/// Create stories router
///
/// Routes:
/// - GET /stories - Visible stories (optional auth)
/// - POST /stories - Create a story, JSON or multipart
/// - GET /stories/mine - Caller's own stories in any status
/// - GET /stories/pending - Moderation queue (admin)
/// - GET /stories/:id - Single visible story, counts a view
/// - DELETE /stories/:id - Author or admin
/// - POST /stories/:id/like - Like a visible story
/// - PUT /stories/:id/moderate - Approve or reject (admin)
pub fn stories_router() -> Router<AppState> {
    Router::new()
        .route("/stories", get(list_stories).post(create_story))
        .route("/stories/mine", get(my_stories))
        .route("/stories/pending", get(pending_stories))
        .route("/stories/:id", get(get_story).delete(delete_story))
        .route("/stories/:id/like", post(like_story))
        .route("/stories/:id/moderate", put(moderate_story))
}

fn parse_media_type(value: Option<&str>) -> Result<MediaType, AppError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(value) => MediaType::parse(value)
            .ok_or_else(|| AppError::Validation(format!("Unknown media type: {}", value))),
        None => Ok(MediaType::Story),
    }
}

/// GET /stories
async fn list_stories(
    State(state): State<AppState>,
    MaybeIdentity(identity): MaybeIdentity,
    query: Result<Query<StoryListQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<Story>>>, AppError> {
    let Query(query) = query?;

    let media_type = match query.media_type.as_deref() {
        Some(value) if !value.trim().is_empty() => Some(parse_media_type(Some(value))?),
        _ => None,
    };
    let filter = StoryFilter {
        monastery: query
            .monastery
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty()),
        media_type,
        limit: query.limit.unwrap_or_default(),
    };

    let service = StoryService::new(state.db.clone(), state.storage.clone());
    let stories = service
        .list(identity.as_ref(), query.status.as_deref(), filter)
        .await?;

    Ok(Json(ApiResponse::list(stories)))
}

/// POST /stories
///
/// Accepts `application/json`, or `multipart/form-data` with text fields
/// and an optional `media` file part.
async fn create_story(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    request: Request,
) -> Result<(StatusCode, Json<ApiResponse<Story>>), AppError> {
    let is_multipart = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("multipart/form-data"));

    let (new_story, upload) = if is_multipart {
        let multipart = Multipart::from_request(request, &state).await?;
        read_story_form(multipart, state.storage.max_upload_bytes()).await?
    } else {
        let payload: Result<Json<CreateStoryRequest>, JsonRejection> =
            Json::from_request(request, &state).await;
        let Json(body) = payload?;
        let new_story = NewStory {
            title: body.title,
            content: body.content,
            monastery: body.monastery,
            media_type: parse_media_type(body.media_type.as_deref())?,
            media_url: body.media_url,
        };
        (new_story, None)
    };

    let service = StoryService::new(state.db.clone(), state.storage.clone());
    let story = service.create(&identity, new_story, upload).await?;

    let message = if story.status == "approved" {
        "Story published"
    } else {
        "Story submitted for review"
    };

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(story).with_message(message)),
    ))
}

async fn read_story_form(
    mut multipart: Multipart,
    max_upload_bytes: usize,
) -> Result<(NewStory, Option<StoryUpload>), AppError> {
    let mut title = String::new();
    let mut content = String::new();
    let mut monastery = String::new();
    let mut media_type: Option<String> = None;
    let mut media_url: Option<String> = None;
    let mut upload: Option<StoryUpload> = None;

    while let Some(mut field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "media" => {
                let content_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .ok_or_else(|| {
                        AppError::Validation("Missing content type for uploaded file".to_string())
                    })?;

                let mut bytes = Vec::new();
                while let Some(chunk) = field.chunk().await? {
                    if bytes.len() + chunk.len() > max_upload_bytes {
                        return Err(AppError::Validation(format!(
                            "File too large: exceeds {} bytes",
                            max_upload_bytes
                        )));
                    }
                    bytes.extend_from_slice(&chunk);
                }

                if !bytes.is_empty() {
                    upload = Some(StoryUpload {
                        data: bytes,
                        content_type,
                    });
                }
            }
            "title" => title = field.text().await?,
            "content" => content = field.text().await?,
            "monastery" => monastery = field.text().await?,
            "type" | "media_type" => media_type = Some(field.text().await?),
            "media_url" => media_url = Some(field.text().await?),
            _ => {}
        }
    }

    let new_story = NewStory {
        title,
        content,
        monastery,
        media_type: parse_media_type(media_type.as_deref())?,
        media_url,
    };
    Ok((new_story, upload))
}

/// GET /stories/mine
async fn my_stories(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
) -> Result<Json<ApiResponse<Vec<Story>>>, AppError> {
    let service = StoryService::new(state.db.clone(), state.storage.clone());
    let stories = service.list_mine(&identity).await?;
    Ok(Json(ApiResponse::list(stories)))
}

/// GET /stories/pending
async fn pending_stories(
    State(state): State<AppState>,
    AdminIdentity(admin): AdminIdentity,
    query: Result<Query<LimitQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<Story>>>, AppError> {
    let Query(query) = query?;

    let service = StoryService::new(state.db.clone(), state.storage.clone());
    let stories = service
        .list_pending(&admin, query.limit.unwrap_or_default())
        .await?;
    Ok(Json(ApiResponse::list(stories)))
}

/// GET /stories/:id
async fn get_story(
    State(state): State<AppState>,
    MaybeIdentity(identity): MaybeIdentity,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Story>>, AppError> {
    let service = StoryService::new(state.db.clone(), state.storage.clone());
    let story = service.get(identity.as_ref(), &id).await?;
    Ok(Json(ApiResponse::ok(story)))
}

/// POST /stories/:id/like
async fn like_story(
    State(state): State<AppState>,
    MaybeIdentity(identity): MaybeIdentity,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Story>>, AppError> {
    let service = StoryService::new(state.db.clone(), state.storage.clone());
    let story = service.like(identity.as_ref(), &id).await?;
    Ok(Json(ApiResponse::ok(story)))
}

/// PUT /stories/:id/moderate
async fn moderate_story(
    State(state): State<AppState>,
    AdminIdentity(admin): AdminIdentity,
    Path(id): Path<String>,
    payload: Result<Json<ModerateStoryRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<Story>>, AppError> {
    let Json(request) = payload?;

    let service = StoryService::new(state.db.clone(), state.storage.clone());
    let story = service
        .moderate(&admin, &id, &request.status, request.rejection_reason)
        .await?;

    let message = format!("Story {}", story.status);
    Ok(Json(ApiResponse::ok(story).with_message(message)))
}

/// DELETE /stories/:id
async fn delete_story(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Deleted>>, AppError> {
    let service = StoryService::new(state.db.clone(), state.storage.clone());
    service.delete(&identity, &id).await?;
    Ok(Json(
        ApiResponse::ok(Deleted { id }).with_message("Story deleted"),
    ))
}
