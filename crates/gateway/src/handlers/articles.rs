//! Article handlers: submission, visibility-gated reads, correction
//! versions, coordinator status override, and the review queue.

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
        models::{Article, ArticleVersion, User},
        Repository,
    },
    errors::{AppError, Result},
    metrics,
    review::{
        visibility::{project_evaluations, EvaluationView},
        ArticleLifecycle, ArticleRelation,
    },
    storage::FileStore,
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateArticleRequest {
    #[validate(length(min = 1, max = 500))]
    pub title: String,

    #[validate(length(min = 1, max = 50000))]
    #[serde(rename = "abstract")]
    pub abstract_text: String,

    #[validate(length(min = 1, max = 200))]
    pub thematic_area: String,

    /// Co-authors; the submitting caller is always included
    #[serde(default)]
    pub author_ids: Vec<Uuid>,

    #[serde(default)]
    pub keywords: Vec<String>,

    /// Reference from a prior upload to `POST /files`
    #[validate(length(min = 1))]
    pub pdf_ref: String,

    pub checksum: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateArticleRequest {
    #[validate(length(min = 1, max = 500))]
    pub title: Option<String>,

    #[validate(length(min = 1, max = 50000))]
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,

    #[validate(length(min = 1, max = 200))]
    pub thematic_area: Option<String>,

    pub author_ids: Option<Vec<Uuid>>,

    pub keywords: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct OverrideStatusRequest {
    pub status: i16,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitVersionRequest {
    #[validate(length(min = 1))]
    pub pdf_ref: String,

    pub checksum: Option<String>,
}

#[derive(Serialize)]
pub struct AuthorView {
    pub id: Uuid,
    pub name: String,
}

#[derive(Serialize)]
pub struct VersionResponse {
    pub id: Uuid,
    pub label: String,
    pub pdf_ref: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    pub created_at: String,
}

impl From<ArticleVersion> for VersionResponse {
    fn from(version: ArticleVersion) -> Self {
        Self {
            id: version.id,
            label: version.label,
            pdf_ref: version.pdf_ref,
            checksum: version.checksum,
            created_at: version.created_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
pub struct ArticleResponse {
    pub id: Uuid,
    pub event_id: Uuid,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub thematic_area: String,
    pub status: String,
    pub keywords: Vec<String>,
    /// Absent where the caller must not see author identity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authors: Option<Vec<AuthorView>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_version: Option<VersionResponse>,
    pub created_at: String,
    pub updated_at: String,
}

impl ArticleResponse {
    fn new(
        article: Article,
        keywords: Vec<String>,
        authors: Option<Vec<User>>,
        latest_version: Option<ArticleVersion>,
    ) -> Self {
        let status = article.article_status().as_str().to_string();
        Self {
            id: article.id,
            event_id: article.event_id,
            title: article.title,
            abstract_text: article.abstract_text,
            thematic_area: article.thematic_area,
            status,
            keywords,
            authors: authors.map(|users| {
                users
                    .into_iter()
                    .map(|u| AuthorView {
                        id: u.id,
                        name: u.name,
                    })
                    .collect()
            }),
            latest_version: latest_version.map(Into::into),
            created_at: article.created_at.to_rfc3339(),
            updated_at: article.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub id: Uuid,
    pub status: String,
}

/// Load an article or fail with 404
async fn load_article(repo: &Repository, article_id: Uuid) -> Result<Article> {
    repo.find_article_by_id(article_id)
        .await?
        .ok_or_else(|| AppError::ArticleNotFound {
            id: article_id.to_string(),
        })
}

/// Relation of the caller to an article, from its author list
async fn relation_to(
    repo: &Repository,
    auth: &AuthContext,
    article_id: Uuid,
) -> Result<ArticleRelation> {
    let author_ids = repo.article_author_ids(article_id).await?;
    Ok(ArticleRelation::compute(auth, &author_ids))
}

/// Submit a new article to an event. The caller becomes an author and the
/// article starts in review with version "1.0".
pub async fn create_article(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(event_id): Path<Uuid>,
    Json(request): Json<CreateArticleRequest>,
) -> Result<(StatusCode, Json<ArticleResponse>)> {
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

    if !state.files.exists(&request.pdf_ref).await? {
        return Err(AppError::Validation {
            message: "Arquivo PDF não encontrado; envie o arquivo antes de submeter".to_string(),
            field: Some("pdf_ref".to_string()),
        });
    }

    let mut author_ids = request.author_ids;
    if !author_ids.contains(&auth.user_id) {
        author_ids.insert(0, auth.user_id);
    }
    for &author_id in &author_ids {
        repo.find_user_by_id(author_id)
            .await?
            .ok_or_else(|| AppError::UserNotFound {
                id: author_id.to_string(),
            })?;
    }

    let (article, version) = repo
        .create_article(
            event_id,
            request.title,
            request.abstract_text,
            request.thematic_area,
            author_ids,
            request.keywords,
            request.pdf_ref,
            request.checksum,
        )
        .await?;

    tracing::info!(
        article_id = %article.id,
        event_id = %event_id,
        submitted_by = %auth.user_id,
        "Article submitted"
    );
    metrics::record_article_submitted();

    let keywords = repo.article_keywords(article.id).await?;
    let authors = repo.article_authors(article.id).await?;

    Ok((
        StatusCode::CREATED,
        Json(ArticleResponse::new(
            article,
            keywords,
            Some(authors),
            Some(version),
        )),
    ))
}

/// Get an article, gated and projected by the caller's relation to it
pub async fn get_article(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(article_id): Path<Uuid>,
) -> Result<Json<ArticleResponse>> {
    let repo = Repository::new(state.db.clone());

    let article = load_article(&repo, article_id).await?;
    let relation = relation_to(&repo, &auth, article_id).await?;

    if !relation.can_view_article(article.article_status()) {
        return Err(AppError::Forbidden);
    }

    let keywords = repo.article_keywords(article_id).await?;
    let latest = repo.latest_version_for_article(article_id).await?;

    // Double-blind: a plain evaluator never sees the author list
    let authors = if relation.is_evaluator && !relation.is_author && !relation.is_coordinator {
        None
    } else {
        Some(repo.article_authors(article_id).await?)
    };

    Ok(Json(ArticleResponse::new(article, keywords, authors, latest)))
}

/// Full listing of an event's articles (coordinator only)
pub async fn list_event_articles(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(event_id): Path<Uuid>,
) -> Result<Json<Vec<ArticleResponse>>> {
    auth.require_coordinator()?;

    let repo = Repository::new(state.db.clone());

    repo.find_event_by_id(event_id)
        .await?
        .ok_or_else(|| AppError::EventNotFound {
            id: event_id.to_string(),
        })?;

    let articles = repo.list_articles_by_event(event_id).await?;

    let mut out = Vec::with_capacity(articles.len());
    for article in articles {
        let keywords = repo.article_keywords(article.id).await?;
        let authors = repo.article_authors(article.id).await?;
        let latest = repo.latest_version_for_article(article.id).await?;
        out.push(ArticleResponse::new(article, keywords, Some(authors), latest));
    }

    Ok(Json(out))
}

/// Articles awaiting the caller's evaluation. Author identity is always
/// stripped here, and the caller's own articles never appear.
pub async fn list_review_queue(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(event_id): Path<Uuid>,
) -> Result<Json<Vec<ArticleResponse>>> {
    auth.require_evaluator()?;

    let repo = Repository::new(state.db.clone());

    repo.find_event_by_id(event_id)
        .await?
        .ok_or_else(|| AppError::EventNotFound {
            id: event_id.to_string(),
        })?;

    if !auth.roles.is_coordinator() {
        let assigned = repo.event_evaluator_ids(event_id).await?;
        if !assigned.contains(&auth.user_id) {
            return Err(AppError::Forbidden);
        }
    }

    let articles = repo.list_articles_by_event(event_id).await?;

    let mut out = Vec::new();
    for article in articles {
        if article.article_status() != symposium_common::db::models::ArticleStatus::InReview {
            continue;
        }
        let author_ids = repo.article_author_ids(article.id).await?;
        if author_ids.contains(&auth.user_id) {
            continue;
        }
        let keywords = repo.article_keywords(article.id).await?;
        let latest = repo.latest_version_for_article(article.id).await?;
        out.push(ArticleResponse::new(article, keywords, None, latest));
    }

    Ok(Json(out))
}

/// Edit an article's metadata, authors, and keywords
pub async fn update_article(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(article_id): Path<Uuid>,
    Json(request): Json<UpdateArticleRequest>,
) -> Result<Json<ArticleResponse>> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let repo = Repository::new(state.db.clone());

    load_article(&repo, article_id).await?;
    let relation = relation_to(&repo, &auth, article_id).await?;
    if !relation.is_author && !relation.is_coordinator {
        return Err(AppError::Forbidden);
    }

    let article = repo
        .update_article(
            article_id,
            request.title,
            request.abstract_text,
            request.thematic_area,
            request.author_ids,
            request.keywords,
        )
        .await?;

    tracing::info!(article_id = %article_id, updated_by = %auth.user_id, "Article updated");

    let keywords = repo.article_keywords(article_id).await?;
    let authors = repo.article_authors(article_id).await?;
    let latest = repo.latest_version_for_article(article_id).await?;

    Ok(Json(ArticleResponse::new(
        article,
        keywords,
        Some(authors),
        latest,
    )))
}

/// Withdraw an article; versions, evaluations, and comments cascade
pub async fn delete_article(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(article_id): Path<Uuid>,
) -> Result<StatusCode> {
    let repo = Repository::new(state.db.clone());

    load_article(&repo, article_id).await?;
    let relation = relation_to(&repo, &auth, article_id).await?;
    if !relation.is_author && !relation.is_coordinator {
        return Err(AppError::Forbidden);
    }

    repo.delete_article(article_id).await?;

    tracing::info!(article_id = %article_id, deleted_by = %auth.user_id, "Article deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Coordinator override of the article status, bypassing the aggregator
pub async fn override_status(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(article_id): Path<Uuid>,
    Json(request): Json<OverrideStatusRequest>,
) -> Result<Json<StatusResponse>> {
    auth.require_coordinator()?;

    let lifecycle = ArticleLifecycle::new(Repository::new(state.db.clone()));
    let status = lifecycle.override_status(article_id, request.status).await?;

    Ok(Json(StatusResponse {
        id: article_id,
        status: status.as_str().to_string(),
    }))
}

/// Submit a corrected PDF as the next version of an article
pub async fn submit_version(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(article_id): Path<Uuid>,
    Json(request): Json<SubmitVersionRequest>,
) -> Result<(StatusCode, Json<VersionResponse>)> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    if !state.files.exists(&request.pdf_ref).await? {
        return Err(AppError::Validation {
            message: "Arquivo PDF não encontrado; envie o arquivo antes de submeter".to_string(),
            field: Some("pdf_ref".to_string()),
        });
    }

    let lifecycle = ArticleLifecycle::new(Repository::new(state.db.clone()));
    let version = lifecycle
        .submit_new_version(article_id, &request.pdf_ref, request.checksum, &auth)
        .await?;

    Ok((StatusCode::CREATED, Json(version.into())))
}

/// Versions of an article, latest first
pub async fn list_versions(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(article_id): Path<Uuid>,
) -> Result<Json<Vec<VersionResponse>>> {
    let repo = Repository::new(state.db.clone());

    let article = load_article(&repo, article_id).await?;
    let relation = relation_to(&repo, &auth, article_id).await?;
    if !relation.can_view_article(article.article_status()) {
        return Err(AppError::Forbidden);
    }

    let versions = repo.versions_for_article(article_id).await?;

    Ok(Json(versions.into_iter().map(Into::into).collect()))
}

/// Evaluations across an article's versions, projected for the caller:
/// authors see verdicts without evaluator identity, plain evaluators see
/// only their own, coordinators see everything.
pub async fn list_article_evaluations(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(article_id): Path<Uuid>,
) -> Result<Json<Vec<EvaluationView>>> {
    let repo = Repository::new(state.db.clone());

    load_article(&repo, article_id).await?;
    let relation = relation_to(&repo, &auth, article_id).await?;
    if !relation.can_view_threads() {
        return Err(AppError::Forbidden);
    }

    let records = repo.evaluations_for_article(article_id).await?;
    let views: Vec<EvaluationView> = records
        .into_iter()
        .map(|(evaluation, evaluator)| EvaluationView::from_record(evaluation, evaluator))
        .collect();

    Ok(Json(project_evaluations(relation, auth.user_id, views)))
}
