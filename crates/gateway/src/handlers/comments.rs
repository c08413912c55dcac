//! Discussion thread handlers, scoped to one article version

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
    db::{models::Comment, Repository},
    errors::{AppError, Result},
    review::ArticleRelation,
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[validate(length(min = 1, max = 10000))]
    pub body: String,
}

#[derive(Serialize)]
pub struct CommentResponse {
    pub id: Uuid,
    pub version_id: Uuid,
    pub author_id: Uuid,
    pub body: String,
    pub created_at: String,
}

impl From<Comment> for CommentResponse {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            version_id: comment.version_id,
            author_id: comment.author_id,
            body: comment.body,
            created_at: comment.created_at.to_rfc3339(),
        }
    }
}

/// Threads are visible only to parties of the review: the article's
/// authors, its evaluators, and coordinators.
async fn thread_relation(
    repo: &Repository,
    auth: &AuthContext,
    version_id: Uuid,
) -> Result<ArticleRelation> {
    let version = repo
        .find_version_by_id(version_id)
        .await?
        .ok_or_else(|| AppError::VersionNotFound {
            id: version_id.to_string(),
        })?;

    let author_ids = repo.article_author_ids(version.article_id).await?;
    let relation = ArticleRelation::compute(auth, &author_ids);

    if !relation.can_view_threads() {
        return Err(AppError::Forbidden);
    }

    Ok(relation)
}

/// Append a comment to a version's thread
pub async fn create_comment(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(version_id): Path<Uuid>,
    Json(request): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<CommentResponse>)> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let repo = Repository::new(state.db.clone());
    thread_relation(&repo, &auth, version_id).await?;

    let comment = repo
        .create_comment(version_id, auth.user_id, request.body)
        .await?;

    tracing::info!(
        comment_id = %comment.id,
        version_id = %version_id,
        "Comment added"
    );

    Ok((StatusCode::CREATED, Json(comment.into())))
}

/// Comments on a version, in insertion order
pub async fn list_comments(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(version_id): Path<Uuid>,
) -> Result<Json<Vec<CommentResponse>>> {
    let repo = Repository::new(state.db.clone());
    thread_relation(&repo, &auth, version_id).await?;

    let comments = repo.comments_for_version(version_id).await?;

    Ok(Json(comments.into_iter().map(Into::into).collect()))
}
