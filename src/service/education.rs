//! Education service
//!
//! Quizzes and flashcards about monastic heritage, and quiz grading.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use std::sync::Arc;

use crate::auth::{Capability, Identity};
use crate::data::{Database, EntityId, Flashcard, Quiz, QuizQuestion};
use crate::error::AppError;

#[derive(Debug, Clone, Deserialize)]
pub struct NewQuiz {
    pub title: String,
    pub category: String,
    #[serde(default)]
    pub difficulty: Option<String>,
    pub questions: Vec<QuizQuestion>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewFlashcard {
    pub front: String,
    pub back: String,
    pub category: String,
}

/// Quiz question as shown to a learner, without the answer
#[derive(Debug, Clone, Serialize)]
pub struct PublicQuestion {
    pub prompt: String,
    pub options: Vec<String>,
}

/// Quiz as shown to a learner
#[derive(Debug, Clone, Serialize)]
pub struct PublicQuiz {
    pub id: String,
    pub title: String,
    pub category: String,
    pub difficulty: String,
    pub question_count: usize,
    pub questions: Vec<PublicQuestion>,
    pub created_at: chrono::DateTime<Utc>,
}

impl From<&Quiz> for PublicQuiz {
    fn from(quiz: &Quiz) -> Self {
        Self {
            id: quiz.id.clone(),
            title: quiz.title.clone(),
            category: quiz.category.clone(),
            difficulty: quiz.difficulty.clone(),
            question_count: quiz.questions.0.len(),
            questions: quiz
                .questions
                .0
                .iter()
                .map(|q| PublicQuestion {
                    prompt: q.prompt.clone(),
                    options: q.options.clone(),
                })
                .collect(),
            created_at: quiz.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionResult {
    pub question_index: usize,
    /// None when the question was left unanswered
    pub selected_index: Option<usize>,
    pub correct_index: usize,
    pub correct: bool,
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuizResult {
    pub quiz_id: String,
    pub score: usize,
    pub total: usize,
    /// Rounded to one decimal place
    pub percentage: f64,
    pub results: Vec<QuestionResult>,
}

/// Check that every question is answerable
pub fn validate_questions(questions: &[QuizQuestion]) -> Result<(), AppError> {
    if questions.is_empty() {
        return Err(AppError::Validation(
            "A quiz needs at least one question".to_string(),
        ));
    }

    for (index, question) in questions.iter().enumerate() {
        let number = index + 1;
        if question.prompt.trim().is_empty() {
            return Err(AppError::Validation(format!(
                "Question {} has no prompt",
                number
            )));
        }
        if question.options.len() < 2 {
            return Err(AppError::Validation(format!(
                "Question {} needs at least two options",
                number
            )));
        }
        if question.correct_index >= question.options.len() {
            return Err(AppError::Validation(format!(
                "Question {} has correct_index {} but only {} options",
                number,
                question.correct_index,
                question.options.len()
            )));
        }
    }
    Ok(())
}

/// Grade a submission against the stored answers
///
/// Missing or out-of-range answers count as wrong.
pub fn grade(quiz: &Quiz, answers: &[usize]) -> QuizResult {
    let questions = &quiz.questions.0;
    let results: Vec<QuestionResult> = questions
        .iter()
        .enumerate()
        .map(|(index, question)| {
            let selected = answers.get(index).copied();
            QuestionResult {
                question_index: index,
                selected_index: selected,
                correct_index: question.correct_index,
                correct: selected == Some(question.correct_index),
                explanation: question.explanation.clone(),
            }
        })
        .collect();

    let score = results.iter().filter(|r| r.correct).count();
    let total = questions.len();
    let percentage = if total == 0 {
        0.0
    } else {
        (score as f64 * 1000.0 / total as f64).round() / 10.0
    };

    QuizResult {
        quiz_id: quiz.id.clone(),
        score,
        total,
        percentage,
        results,
    }
}

fn required(value: &str, field: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

fn category_filter(category: Option<&str>) -> Option<&str> {
    category.map(str::trim).filter(|c| !c.is_empty())
}

/// Education service
pub struct EducationService {
    db: Arc<Database>,
}

impl EducationService {
    /// Create new education service
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    // =========================================================================
    // Quizzes
    // =========================================================================

    pub async fn list_quizzes(&self, category: Option<&str>) -> Result<Vec<PublicQuiz>, AppError> {
        let quizzes = self.db.list_quizzes(category_filter(category)).await?;
        Ok(quizzes.iter().map(PublicQuiz::from).collect())
    }

    pub async fn get_quiz(&self, id: &str) -> Result<PublicQuiz, AppError> {
        let quiz = self.db.get_quiz(id).await?.ok_or(AppError::NotFound)?;
        Ok(PublicQuiz::from(&quiz))
    }

    pub async fn create_quiz(&self, admin: &Identity, request: NewQuiz) -> Result<Quiz, AppError> {
        admin.require(Capability::ManageEducation)?;
        validate_questions(&request.questions)?;

        let quiz = Quiz {
            id: EntityId::new().0,
            title: required(&request.title, "title")?,
            category: required(&request.category, "category")?.to_ascii_lowercase(),
            difficulty: request
                .difficulty
                .map(|d| d.trim().to_ascii_lowercase())
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| "beginner".to_string()),
            questions: Json(request.questions),
            created_at: Utc::now(),
        };

        self.db.insert_quiz(&quiz).await?;
        tracing::info!(quiz_id = %quiz.id, questions = quiz.questions.0.len(), "Quiz created");
        Ok(quiz)
    }

    pub async fn delete_quiz(&self, admin: &Identity, id: &str) -> Result<(), AppError> {
        admin.require(Capability::ManageEducation)?;
        if !self.db.delete_quiz(id).await? {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    pub async fn submit(&self, id: &str, answers: &[usize]) -> Result<QuizResult, AppError> {
        let quiz = self.db.get_quiz(id).await?.ok_or(AppError::NotFound)?;
        if answers.len() > quiz.questions.0.len() {
            return Err(AppError::Validation(format!(
                "Quiz has {} questions but {} answers were submitted",
                quiz.questions.0.len(),
                answers.len()
            )));
        }
        Ok(grade(&quiz, answers))
    }

    // =========================================================================
    // Flashcards
    // =========================================================================

    pub async fn list_flashcards(&self, category: Option<&str>) -> Result<Vec<Flashcard>, AppError> {
        self.db.list_flashcards(category_filter(category)).await
    }

    pub async fn get_flashcard(&self, id: &str) -> Result<Flashcard, AppError> {
        self.db.get_flashcard(id).await?.ok_or(AppError::NotFound)
    }

    pub async fn create_flashcard(
        &self,
        admin: &Identity,
        request: NewFlashcard,
    ) -> Result<Flashcard, AppError> {
        admin.require(Capability::ManageEducation)?;

        let card = Flashcard {
            id: EntityId::new().0,
            front: required(&request.front, "front")?,
            back: required(&request.back, "back")?,
            category: required(&request.category, "category")?.to_ascii_lowercase(),
            created_at: Utc::now(),
        };

        self.db.insert_flashcard(&card).await?;
        Ok(card)
    }

    pub async fn delete_flashcard(&self, admin: &Identity, id: &str) -> Result<(), AppError> {
        admin.require(Capability::ManageEducation)?;
        if !self.db.delete_flashcard(id).await? {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}
