//! Education endpoints: quizzes and flashcards

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection, rejection::QueryRejection},
    http::StatusCode,
    routing::{get, post},
};

use super::dto::{ApiResponse, CategoryQuery, Deleted, QuizSubmission};
use crate::AppState;
use crate::auth::AdminIdentity;
use crate::data::{Flashcard, Quiz};
use crate::error::AppError;
use crate::service::{EducationService, NewFlashcard, NewQuiz, PublicQuiz, QuizResult};

/// Create education router
///
/// Routes:
/// - GET /education/quizzes, GET /education/quizzes/:id - Public, answers hidden
/// - POST /education/quizzes/:id/submit - Public, grades a submission
/// - POST /education/quizzes, DELETE /education/quizzes/:id - Admin
/// - GET /education/flashcards, GET /education/flashcards/:id - Public
/// - POST /education/flashcards, DELETE /education/flashcards/:id - Admin
pub fn education_router() -> Router<AppState> {
    Router::new()
        .route("/education/quizzes", get(list_quizzes).post(create_quiz))
        .route(
            "/education/quizzes/:id",
            get(get_quiz).delete(delete_quiz),
        )
        .route("/education/quizzes/:id/submit", post(submit_quiz))
        .route(
            "/education/flashcards",
            get(list_flashcards).post(create_flashcard),
        )
        .route(
            "/education/flashcards/:id",
            get(get_flashcard).delete(delete_flashcard),
        )
}

// =============================================================================
// Quizzes
// =============================================================================

/// GET /education/quizzes
async fn list_quizzes(
    State(state): State<AppState>,
    query: Result<Query<CategoryQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<PublicQuiz>>>, AppError> {
    let Query(query) = query?;
    let quizzes = EducationService::new(state.db.clone())
        .list_quizzes(query.category.as_deref())
        .await?;
    Ok(Json(ApiResponse::list(quizzes)))
}

/// GET /education/quizzes/:id
async fn get_quiz(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<PublicQuiz>>, AppError> {
    let quiz = EducationService::new(state.db.clone())
        .get_quiz(&id)
        .await?;
    Ok(Json(ApiResponse::ok(quiz)))
}

/// POST /education/quizzes
///
/// Returns the full quiz, answers included, to the admin who created it.
async fn create_quiz(
    State(state): State<AppState>,
    AdminIdentity(admin): AdminIdentity,
    payload: Result<Json<NewQuiz>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Quiz>>), AppError> {
    let Json(request) = payload?;
    let quiz = EducationService::new(state.db.clone())
        .create_quiz(&admin, request)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(quiz))))
}

/// DELETE /education/quizzes/:id
async fn delete_quiz(
    State(state): State<AppState>,
    AdminIdentity(admin): AdminIdentity,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Deleted>>, AppError> {
    EducationService::new(state.db.clone())
        .delete_quiz(&admin, &id)
        .await?;
    Ok(Json(ApiResponse::ok(Deleted { id })))
}

/// POST /education/quizzes/:id/submit
async fn submit_quiz(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<QuizSubmission>, JsonRejection>,
) -> Result<Json<ApiResponse<QuizResult>>, AppError> {
    let Json(submission) = payload?;
    let result = EducationService::new(state.db.clone())
        .submit(&id, &submission.answers)
        .await?;
    Ok(Json(ApiResponse::ok(result)))
}

// =============================================================================
// Flashcards
// =============================================================================

/// GET /education/flashcards
async fn list_flashcards(
    State(state): State<AppState>,
    query: Result<Query<CategoryQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<Flashcard>>>, AppError> {
    let Query(query) = query?;
    let cards = EducationService::new(state.db.clone())
        .list_flashcards(query.category.as_deref())
        .await?;
    Ok(Json(ApiResponse::list(cards)))
}

/// GET /education/flashcards/:id
async fn get_flashcard(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Flashcard>>, AppError> {
    let card = EducationService::new(state.db.clone())
        .get_flashcard(&id)
        .await?;
    Ok(Json(ApiResponse::ok(card)))
}

/// POST /education/flashcards
async fn create_flashcard(
    State(state): State<AppState>,
    AdminIdentity(admin): AdminIdentity,
    payload: Result<Json<NewFlashcard>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Flashcard>>), AppError> {
    let Json(request) = payload?;
    let card = EducationService::new(state.db.clone())
        .create_flashcard(&admin, request)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(card))))
}

/// DELETE /education/flashcards/:id
async fn delete_flashcard(
    State(state): State<AppState>,
    AdminIdentity(admin): AdminIdentity,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Deleted>>, AppError> {
    EducationService::new(state.db.clone())
        .delete_flashcard(&admin, &id)
        .await?;
    Ok(Json(ApiResponse::ok(Deleted { id })))
}
