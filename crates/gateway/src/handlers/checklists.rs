//! Evaluation checklist handlers
//!
//! Each event can carry one checklist; evaluators answer its questions
//! per article version with plain booleans.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::AppState;
use symposium_common::{
    auth::AuthContext,
    db::{
        models::{Checklist, ChecklistAnswer, ChecklistQuestion},
        Repository,
    },
    errors::{AppError, Result},
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateChecklistRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    #[validate(length(min = 1))]
    pub questions: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitAnswersRequest {
    pub answers: Vec<AnswerInput>,
}

#[derive(Debug, Deserialize)]
pub struct AnswerInput {
    pub question_id: Uuid,
    pub answer: bool,
}

#[derive(Serialize)]
pub struct QuestionResponse {
    pub id: Uuid,
    pub prompt: String,
    pub position: i32,
}

impl From<ChecklistQuestion> for QuestionResponse {
    fn from(question: ChecklistQuestion) -> Self {
        Self {
            id: question.id,
            prompt: question.prompt,
            position: question.position,
        }
    }
}

#[derive(Serialize)]
pub struct ChecklistResponse {
    pub id: Uuid,
    pub event_id: Uuid,
    pub title: String,
    pub questions: Vec<QuestionResponse>,
}

impl ChecklistResponse {
    fn new(checklist: Checklist, questions: Vec<ChecklistQuestion>) -> Self {
        Self {
            id: checklist.id,
            event_id: checklist.event_id,
            title: checklist.title,
            questions: questions.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Serialize)]
pub struct AnswerResponse {
    pub question_id: Uuid,
    pub answer: bool,
}

impl From<ChecklistAnswer> for AnswerResponse {
    fn from(answer: ChecklistAnswer) -> Self {
        Self {
            question_id: answer.question_id,
            answer: answer.answer,
        }
    }
}

/// Create an event's checklist with its questions (coordinator only)
pub async fn create_checklist(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(event_id): Path<Uuid>,
    Json(request): Json<CreateChecklistRequest>,
) -> Result<(StatusCode, Json<ChecklistResponse>)> {
    auth.require_coordinator()?;
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let repo = Repository::new(state.db.clone());

    repo.find_event_by_id(event_id)
        .await?
        .ok_or_else(|| AppError::EventNotFound {
            id: event_id.to_string(),
        })?;

    if repo.checklist_for_event(event_id).await?.is_some() {
        return Err(AppError::Validation {
            message: "O evento já possui um checklist".to_string(),
            field: None,
        });
    }

    let (checklist, questions) = repo
        .create_checklist(event_id, request.title, request.questions)
        .await?;

    tracing::info!(
        checklist_id = %checklist.id,
        event_id = %event_id,
        questions = questions.len(),
        "Checklist created"
    );

    Ok((
        StatusCode::CREATED,
        Json(ChecklistResponse::new(checklist, questions)),
    ))
}

/// The checklist of an event, with questions in display order
pub async fn get_checklist(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(event_id): Path<Uuid>,
) -> Result<Json<ChecklistResponse>> {
    let repo = Repository::new(state.db.clone());

    let (checklist, questions) = repo
        .checklist_for_event(event_id)
        .await?
        .ok_or_else(|| AppError::ChecklistNotFound {
            id: event_id.to_string(),
        })?;

    Ok(Json(ChecklistResponse::new(checklist, questions)))
}

/// Record checklist answers for a version (evaluator); re-answering a
/// question replaces the previous answer.
pub async fn submit_answers(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(version_id): Path<Uuid>,
    Json(request): Json<SubmitAnswersRequest>,
) -> Result<StatusCode> {
    auth.require_evaluator()?;

    if request.answers.is_empty() {
        return Err(AppError::Validation {
            message: "Informe ao menos uma resposta".to_string(),
            field: Some("answers".to_string()),
        });
    }

    let repo = Repository::new(state.db.clone());

    let version = repo
        .find_version_by_id(version_id)
        .await?
        .ok_or_else(|| AppError::VersionNotFound {
            id: version_id.to_string(),
        })?;

    let article = repo
        .find_article_by_id(version.article_id)
        .await?
        .ok_or_else(|| AppError::ArticleNotFound {
            id: version.article_id.to_string(),
        })?;

    // Answers only belong to the checklist of this version's event
    let (_, questions) = repo
        .checklist_for_event(article.event_id)
        .await?
        .ok_or_else(|| AppError::ChecklistNotFound {
            id: article.event_id.to_string(),
        })?;

    validate_question_ids(&questions, &request.answers)?;

    let answers = request
        .answers
        .into_iter()
        .map(|a| (a.question_id, a.answer))
        .collect();

    repo.upsert_checklist_answers(version_id, answers).await?;

    tracing::info!(
        version_id = %version_id,
        answered_by = %auth.user_id,
        "Checklist answers recorded"
    );

    Ok(StatusCode::NO_CONTENT)
}

/// Every answered question must be part of the given checklist
fn validate_question_ids(
    questions: &[ChecklistQuestion],
    answers: &[AnswerInput],
) -> Result<()> {
    for answer in answers {
        if !questions.iter().any(|q| q.id == answer.question_id) {
            return Err(AppError::Validation {
                message: "Pergunta não pertence ao checklist deste evento".to_string(),
                field: Some("answers".to_string()),
            });
        }
    }
    Ok(())
}

/// Answers recorded for a version
pub async fn list_answers(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(version_id): Path<Uuid>,
) -> Result<Json<Vec<AnswerResponse>>> {
    let repo = Repository::new(state.db.clone());

    let version = repo
        .find_version_by_id(version_id)
        .await?
        .ok_or_else(|| AppError::VersionNotFound {
            id: version_id.to_string(),
        })?;

    let author_ids = repo.article_author_ids(version.article_id).await?;
    let relation = symposium_common::review::ArticleRelation::compute(&auth, &author_ids);
    if !relation.can_view_threads() {
        return Err(AppError::Forbidden);
    }

    let answers = repo.answers_for_version(version_id).await?;

    Ok(Json(answers.into_iter().map(Into::into).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: Uuid, checklist_id: Uuid, position: i32) -> ChecklistQuestion {
        ChecklistQuestion {
            id,
            checklist_id,
            prompt: "O artigo segue o modelo do evento?".to_string(),
            position,
        }
    }

    #[test]
    fn test_answers_to_known_questions_are_accepted() {
        let checklist_id = Uuid::new_v4();
        let q1 = Uuid::new_v4();
        let q2 = Uuid::new_v4();
        let questions = vec![
            question(q1, checklist_id, 0),
            question(q2, checklist_id, 1),
        ];

        let answers = vec![
            AnswerInput { question_id: q1, answer: true },
            AnswerInput { question_id: q2, answer: false },
        ];

        assert!(validate_question_ids(&questions, &answers).is_ok());
    }

    #[test]
    fn test_answer_to_foreign_question_is_rejected() {
        let checklist_id = Uuid::new_v4();
        let questions = vec![question(Uuid::new_v4(), checklist_id, 0)];

        // Question id from some other event's checklist
        let answers = vec![AnswerInput {
            question_id: Uuid::new_v4(),
            answer: true,
        }];

        let err = validate_question_ids(&questions, &answers).unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. }
            if field.as_deref() == Some("answers")));
    }
}
