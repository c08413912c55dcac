//! Evaluation submission handler

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
    db::{models::Verdict, Repository},
    errors::{AppError, Result},
    review::{ArticleLifecycle, NewEvaluation},
    storage::FileStore,
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateEvaluationRequest {
    pub verdict: Verdict,

    #[validate(length(min = 1, max = 20000))]
    pub observation: String,

    /// Optional annotated-PDF reference from a prior upload
    pub attachment_ref: Option<String>,
}

#[derive(Serialize)]
pub struct CreateEvaluationResponse {
    pub id: Uuid,
    pub version_id: Uuid,
    pub verdict: Verdict,
    pub observation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment_ref: Option<String>,
    pub created_at: String,
    /// Article status after re-aggregation
    pub article_status: String,
}

/// Record a verdict on an article version. The article status is
/// re-derived in the same transaction as the insert.
pub async fn create_evaluation(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(version_id): Path<Uuid>,
    Json(request): Json<CreateEvaluationRequest>,
) -> Result<(StatusCode, Json<CreateEvaluationResponse>)> {
    auth.require_evaluator()?;
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    if let Some(ref attachment_ref) = request.attachment_ref {
        if !state.files.exists(attachment_ref).await? {
            return Err(AppError::Validation {
                message: "Anexo não encontrado; envie o arquivo antes de avaliar".to_string(),
                field: Some("attachment_ref".to_string()),
            });
        }
    }

    let lifecycle = ArticleLifecycle::new(Repository::new(state.db.clone()));
    let (evaluation, status) = lifecycle
        .record_evaluation(NewEvaluation {
            version_id,
            evaluator_id: auth.user_id,
            verdict: request.verdict,
            observation: request.observation,
            attachment_ref: request.attachment_ref,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateEvaluationResponse {
            id: evaluation.id,
            version_id: evaluation.version_id,
            verdict: request.verdict,
            observation: evaluation.observation,
            attachment_ref: evaluation.attachment_ref,
            created_at: evaluation.created_at.to_rfc3339(),
            article_status: status.as_str().to_string(),
        }),
    ))
}
