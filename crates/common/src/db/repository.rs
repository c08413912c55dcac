//! Repository pattern for database operations
//!
//! Provides a clean interface for all data access operations with proper
//! error handling and transaction support. Evaluation insertion and the
//! status recompute run in one transaction so concurrent evaluators never
//! settle on a status derived from a stale evaluation set; the unique index
//! on (version_id, evaluator_id) is the final arbiter against duplicate
//! submission races.

use crate::auth::RoleSet;
use crate::db::models::*;
use crate::db::DbPool;
use crate::errors::{AppError, Result};
use crate::review::aggregator;
use crate::review::lifecycle::{NewEvaluation, ReviewStore};
use async_trait::async_trait;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Select, Set, SqlErr, TransactionError,
    TransactionTrait,
};
use uuid::Uuid;

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

/// Map a unique-constraint violation to a domain conflict error
fn on_unique(e: sea_orm::DbErr, conflict: AppError) -> AppError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => conflict,
        _ => AppError::Database(e),
    }
}

/// Unwrap a transaction error into the domain error it carries
fn flatten_txn(e: TransactionError<AppError>) -> AppError {
    match e {
        TransactionError::Connection(e) => e.into(),
        TransactionError::Transaction(e) => e,
    }
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get the read connection
    fn read_conn(&self) -> &DatabaseConnection {
        self.pool.read()
    }

    /// Get the write connection
    fn write_conn(&self) -> &DatabaseConnection {
        self.pool.write()
    }

    // ========================================================================
    // Health Check
    // ========================================================================

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    // ========================================================================
    // User Operations
    // ========================================================================

    /// Create a user and its role rows atomically
    pub async fn create_user(
        &self,
        name: String,
        email: String,
        password_hash: String,
        roles: RoleSet,
    ) -> Result<User> {
        self.write_conn()
            .transaction::<_, User, AppError>(move |txn| {
                Box::pin(async move {
                    let user_id = Uuid::new_v4();
                    let now = chrono::Utc::now();

                    let user = UserActiveModel {
                        id: Set(user_id),
                        name: Set(name),
                        email: Set(email),
                        password_hash: Set(password_hash),
                        created_at: Set(now.into()),
                    };

                    let user = user
                        .insert(txn)
                        .await
                        .map_err(|e| on_unique(e, AppError::EmailInUse))?;

                    let role_rows: Vec<UserRoleActiveModel> = roles
                        .iter()
                        .map(|role| UserRoleActiveModel {
                            user_id: Set(user_id),
                            role: Set(role.id()),
                        })
                        .collect();

                    if !role_rows.is_empty() {
                        UserRoleEntity::insert_many(role_rows).exec(txn).await?;
                    }

                    Ok(user)
                })
            })
            .await
            .map_err(flatten_txn)
    }

    /// Find user by ID
    pub async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        UserEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Find user by email
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        UserEntity::find()
            .filter(UserColumn::Email.eq(email))
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Get the role set held by a user
    pub async fn user_roles(&self, user_id: Uuid) -> Result<RoleSet> {
        let rows = UserRoleEntity::find()
            .filter(UserRoleColumn::UserId.eq(user_id))
            .all(self.read_conn())
            .await?;

        Ok(RoleSet::from_ids(rows.into_iter().map(|r| r.role)))
    }

    /// List users with pagination
    pub async fn list_users(&self, offset: u64, limit: u64) -> Result<(Vec<User>, u64)> {
        let paginator = UserEntity::find()
            .order_by_asc(UserColumn::Name)
            .paginate(self.read_conn(), limit);

        let total = paginator.num_items().await?;
        let users = paginator.fetch_page(offset / limit.max(1)).await?;

        Ok((users, total))
    }

    /// Delete a user; dependent rows ride the FK cascades
    pub async fn delete_user(&self, id: Uuid) -> Result<bool> {
        let result = UserEntity::delete_by_id(id).exec(self.write_conn()).await?;
        Ok(result.rows_affected > 0)
    }

    // ========================================================================
    // Event Operations
    // ========================================================================

    /// Create a new event
    pub async fn create_event(
        &self,
        name: String,
        description: Option<String>,
        starts_at: Option<chrono::DateTime<chrono::Utc>>,
        ends_at: Option<chrono::DateTime<chrono::Utc>>,
        banner_ref: Option<String>,
    ) -> Result<Event> {
        let event = EventActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            description: Set(description),
            starts_at: Set(starts_at.map(Into::into)),
            ends_at: Set(ends_at.map(Into::into)),
            banner_ref: Set(banner_ref),
            created_at: Set(chrono::Utc::now().into()),
        };

        event.insert(self.write_conn()).await.map_err(Into::into)
    }

    /// Find event by ID
    pub async fn find_event_by_id(&self, id: Uuid) -> Result<Option<Event>> {
        EventEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// List events, newest first
    pub async fn list_events(&self, offset: u64, limit: u64) -> Result<(Vec<Event>, u64)> {
        let paginator = EventEntity::find()
            .order_by_desc(EventColumn::CreatedAt)
            .paginate(self.read_conn(), limit);

        let total = paginator.num_items().await?;
        let events = paginator.fetch_page(offset / limit.max(1)).await?;

        Ok((events, total))
    }

    /// Update event fields
    pub async fn update_event(
        &self,
        id: Uuid,
        name: Option<String>,
        description: Option<Option<String>>,
        starts_at: Option<Option<chrono::DateTime<chrono::Utc>>>,
        ends_at: Option<Option<chrono::DateTime<chrono::Utc>>>,
        banner_ref: Option<Option<String>>,
    ) -> Result<Event> {
        let mut event: EventActiveModel = EventEntity::find_by_id(id)
            .one(self.write_conn())
            .await?
            .ok_or_else(|| AppError::EventNotFound { id: id.to_string() })?
            .into();

        if let Some(name) = name {
            event.name = Set(name);
        }
        if let Some(description) = description {
            event.description = Set(description);
        }
        if let Some(starts_at) = starts_at {
            event.starts_at = Set(starts_at.map(Into::into));
        }
        if let Some(ends_at) = ends_at {
            event.ends_at = Set(ends_at.map(Into::into));
        }
        if let Some(banner_ref) = banner_ref {
            event.banner_ref = Set(banner_ref);
        }

        event.update(self.write_conn()).await.map_err(Into::into)
    }

    /// Delete an event; articles, checklists and assignments cascade
    pub async fn delete_event(&self, id: Uuid) -> Result<bool> {
        let result = EventEntity::delete_by_id(id).exec(self.write_conn()).await?;
        Ok(result.rows_affected > 0)
    }

    /// Assign evaluators to an event; existing assignments are kept
    pub async fn assign_event_evaluators(&self, event_id: Uuid, user_ids: &[Uuid]) -> Result<()> {
        let rows: Vec<EventEvaluatorActiveModel> = user_ids
            .iter()
            .map(|&user_id| EventEvaluatorActiveModel {
                event_id: Set(event_id),
                user_id: Set(user_id),
            })
            .collect();

        if rows.is_empty() {
            return Ok(());
        }

        EventEvaluatorEntity::insert_many(rows)
            .on_conflict(
                OnConflict::columns([EventEvaluatorColumn::EventId, EventEvaluatorColumn::UserId])
                    .do_nothing()
                    .to_owned(),
            )
            .do_nothing()
            .exec(self.write_conn())
            .await?;

        Ok(())
    }

    /// Evaluators assigned to an event
    pub async fn event_evaluator_ids(&self, event_id: Uuid) -> Result<Vec<Uuid>> {
        let rows = EventEvaluatorEntity::find()
            .filter(EventEvaluatorColumn::EventId.eq(event_id))
            .all(self.read_conn())
            .await?;

        Ok(rows.into_iter().map(|r| r.user_id).collect())
    }

    // ========================================================================
    // Article Operations
    // ========================================================================

    /// Create an article with its authors, keywords and initial version "1.0"
    /// in a single transaction.
    #[allow(clippy::too_many_arguments)]
    pub async fn create_article(
        &self,
        event_id: Uuid,
        title: String,
        abstract_text: String,
        thematic_area: String,
        author_ids: Vec<Uuid>,
        keywords: Vec<String>,
        pdf_ref: String,
        checksum: Option<String>,
    ) -> Result<(Article, ArticleVersion)> {
        self.write_conn()
            .transaction::<_, (Article, ArticleVersion), AppError>(move |txn| {
                Box::pin(async move {
                    let article_id = Uuid::new_v4();
                    let now = chrono::Utc::now();

                    let article = ArticleActiveModel {
                        id: Set(article_id),
                        event_id: Set(event_id),
                        title: Set(title),
                        abstract_text: Set(abstract_text),
                        thematic_area: Set(thematic_area),
                        status: Set(ArticleStatus::InReview.id()),
                        created_at: Set(now.into()),
                        updated_at: Set(now.into()),
                    };

                    let article = article.insert(txn).await?;

                    replace_authors(txn, article_id, &author_ids).await?;
                    replace_keywords(txn, article_id, &keywords).await?;

                    let version = insert_version(
                        txn,
                        article_id,
                        crate::INITIAL_VERSION_LABEL,
                        &pdf_ref,
                        checksum,
                    )
                    .await?;

                    Ok((article, version))
                })
            })
            .await
            .map_err(flatten_txn)
    }

    /// Find article by ID
    pub async fn find_article_by_id(&self, id: Uuid) -> Result<Option<Article>> {
        ArticleEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// List articles submitted to an event, newest first
    pub async fn list_articles_by_event(&self, event_id: Uuid) -> Result<Vec<Article>> {
        ArticleEntity::find()
            .filter(ArticleColumn::EventId.eq(event_id))
            .order_by_desc(ArticleColumn::CreatedAt)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// List approved (public) articles across all events
    pub async fn list_publications(&self, offset: u64, limit: u64) -> Result<(Vec<Article>, u64)> {
        let paginator = ArticleEntity::find()
            .filter(ArticleColumn::Status.eq(ArticleStatus::Approved.id()))
            .order_by_desc(ArticleColumn::UpdatedAt)
            .paginate(self.read_conn(), limit);

        let total = paginator.num_items().await?;
        let articles = paginator.fetch_page(offset / limit.max(1)).await?;

        Ok((articles, total))
    }

    /// IDs of the authors of an article
    pub async fn article_author_ids(&self, article_id: Uuid) -> Result<Vec<Uuid>> {
        let rows = ArticleAuthorEntity::find()
            .filter(ArticleAuthorColumn::ArticleId.eq(article_id))
            .all(self.read_conn())
            .await?;

        Ok(rows.into_iter().map(|r| r.user_id).collect())
    }

    /// Authors of an article, with identity
    pub async fn article_authors(&self, article_id: Uuid) -> Result<Vec<User>> {
        let ids = self.article_author_ids(article_id).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        UserEntity::find()
            .filter(UserColumn::Id.is_in(ids))
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Keywords of an article
    pub async fn article_keywords(&self, article_id: Uuid) -> Result<Vec<String>> {
        let rows = ArticleKeywordEntity::find()
            .filter(ArticleKeywordColumn::ArticleId.eq(article_id))
            .all(self.read_conn())
            .await?;

        Ok(rows.into_iter().map(|r| r.keyword).collect())
    }

    /// Update article fields and replace its author/keyword lists in one
    /// transaction, so a failed replacement never leaves the article half
    /// updated.
    pub async fn update_article(
        &self,
        id: Uuid,
        title: Option<String>,
        abstract_text: Option<String>,
        thematic_area: Option<String>,
        author_ids: Option<Vec<Uuid>>,
        keywords: Option<Vec<String>>,
    ) -> Result<Article> {
        self.write_conn()
            .transaction::<_, Article, AppError>(move |txn| {
                Box::pin(async move {
                    let mut article: ArticleActiveModel = ArticleEntity::find_by_id(id)
                        .one(txn)
                        .await?
                        .ok_or_else(|| AppError::ArticleNotFound { id: id.to_string() })?
                        .into();

                    if let Some(title) = title {
                        article.title = Set(title);
                    }
                    if let Some(abstract_text) = abstract_text {
                        article.abstract_text = Set(abstract_text);
                    }
                    if let Some(thematic_area) = thematic_area {
                        article.thematic_area = Set(thematic_area);
                    }
                    article.updated_at = Set(chrono::Utc::now().into());

                    let article = article.update(txn).await?;

                    if let Some(author_ids) = author_ids {
                        ArticleAuthorEntity::delete_many()
                            .filter(ArticleAuthorColumn::ArticleId.eq(id))
                            .exec(txn)
                            .await?;
                        replace_authors(txn, id, &author_ids).await?;
                    }

                    if let Some(keywords) = keywords {
                        ArticleKeywordEntity::delete_many()
                            .filter(ArticleKeywordColumn::ArticleId.eq(id))
                            .exec(txn)
                            .await?;
                        replace_keywords(txn, id, &keywords).await?;
                    }

                    Ok(article)
                })
            })
            .await
            .map_err(flatten_txn)
    }

    /// Delete an article; versions, evaluations, comments cascade
    pub async fn delete_article(&self, id: Uuid) -> Result<bool> {
        let result = ArticleEntity::delete_by_id(id)
            .exec(self.write_conn())
            .await?;
        Ok(result.rows_affected > 0)
    }

    /// Persist an article status
    pub async fn set_article_status(&self, article_id: Uuid, status: ArticleStatus) -> Result<()> {
        set_status_on(self.write_conn(), article_id, status).await
    }

    // ========================================================================
    // Version Operations
    // ========================================================================

    /// Find version by ID
    pub async fn find_version_by_id(&self, id: Uuid) -> Result<Option<ArticleVersion>> {
        ArticleVersionEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Versions of an article, latest first
    pub async fn versions_for_article(&self, article_id: Uuid) -> Result<Vec<ArticleVersion>> {
        versions_newest_first(article_id)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// The latest version of an article
    pub async fn latest_version_for_article(
        &self,
        article_id: Uuid,
    ) -> Result<Option<ArticleVersion>> {
        latest_version_on(self.read_conn(), article_id).await
    }

    /// Append a new version to an article
    pub async fn create_article_version(
        &self,
        article_id: Uuid,
        label: &str,
        pdf_ref: &str,
        checksum: Option<String>,
    ) -> Result<ArticleVersion> {
        insert_version(self.write_conn(), article_id, label, pdf_ref, checksum).await
    }

    // ========================================================================
    // Evaluation Operations
    // ========================================================================

    /// Whether an evaluator already evaluated a version
    pub async fn evaluation_exists(&self, version_id: Uuid, evaluator_id: Uuid) -> Result<bool> {
        let count = EvaluationEntity::find()
            .filter(EvaluationColumn::VersionId.eq(version_id))
            .filter(EvaluationColumn::EvaluatorId.eq(evaluator_id))
            .count(self.read_conn())
            .await?;

        Ok(count > 0)
    }

    /// Evaluations on one version, oldest first
    pub async fn evaluations_for_version(&self, version_id: Uuid) -> Result<Vec<Evaluation>> {
        EvaluationEntity::find()
            .filter(EvaluationColumn::VersionId.eq(version_id))
            .order_by_asc(EvaluationColumn::CreatedAt)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Evaluations across all versions of an article, with evaluator identity
    pub async fn evaluations_for_article(
        &self,
        article_id: Uuid,
    ) -> Result<Vec<(Evaluation, Option<User>)>> {
        let version_ids: Vec<Uuid> = self
            .versions_for_article(article_id)
            .await?
            .into_iter()
            .map(|v| v.id)
            .collect();

        if version_ids.is_empty() {
            return Ok(Vec::new());
        }

        EvaluationEntity::find()
            .filter(EvaluationColumn::VersionId.is_in(version_ids))
            .order_by_asc(EvaluationColumn::CreatedAt)
            .find_also_related(UserEntity)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Insert an evaluation and recompute the article status from the full
    /// evaluation set of the latest version, atomically.
    pub async fn insert_evaluation_and_recompute(
        &self,
        new: NewEvaluation,
    ) -> Result<(Evaluation, ArticleStatus)> {
        self.write_conn()
            .transaction::<_, (Evaluation, ArticleStatus), AppError>(move |txn| {
                Box::pin(async move {
                    let version = ArticleVersionEntity::find_by_id(new.version_id)
                        .one(txn)
                        .await?
                        .ok_or_else(|| AppError::VersionNotFound {
                            id: new.version_id.to_string(),
                        })?;

                    let article = ArticleEntity::find_by_id(version.article_id)
                        .one(txn)
                        .await?
                        .ok_or_else(|| AppError::ArticleNotFound {
                            id: version.article_id.to_string(),
                        })?;

                    let evaluation = EvaluationActiveModel {
                        id: Set(Uuid::new_v4()),
                        version_id: Set(new.version_id),
                        evaluator_id: Set(new.evaluator_id),
                        verdict: Set(new.verdict.as_str().to_string()),
                        observation: Set(new.observation),
                        attachment_ref: Set(new.attachment_ref),
                        created_at: Set(chrono::Utc::now().into()),
                    };

                    let evaluation = evaluation
                        .insert(txn)
                        .await
                        .map_err(|e| on_unique(e, AppError::DuplicateEvaluation))?;

                    // Re-derive from scratch over the latest version's set;
                    // the aggregate is order-independent, so concurrent
                    // submissions converge regardless of arrival order.
                    let latest = latest_version_on(txn, article.id)
                        .await?
                        .ok_or_else(|| AppError::VersionNotFound {
                            id: article.id.to_string(),
                        })?;

                    let verdicts = verdicts_on(txn, latest.id).await?;

                    let current = article.article_status();
                    let next = aggregator::derive_status(&verdicts).unwrap_or(current);

                    if next != current {
                        set_status_on(txn, article.id, next).await?;
                    }

                    Ok((evaluation, next))
                })
            })
            .await
            .map_err(flatten_txn)
    }

    // ========================================================================
    // Comment Operations
    // ========================================================================

    /// Append a comment to a version
    pub async fn create_comment(
        &self,
        version_id: Uuid,
        author_id: Uuid,
        body: String,
    ) -> Result<Comment> {
        let comment = CommentActiveModel {
            id: Set(Uuid::new_v4()),
            version_id: Set(version_id),
            author_id: Set(author_id),
            body: Set(body),
            created_at: Set(chrono::Utc::now().into()),
        };

        comment.insert(self.write_conn()).await.map_err(Into::into)
    }

    /// Comments on a version in insertion order
    pub async fn comments_for_version(&self, version_id: Uuid) -> Result<Vec<Comment>> {
        CommentEntity::find()
            .filter(CommentColumn::VersionId.eq(version_id))
            .order_by_asc(CommentColumn::CreatedAt)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    // ========================================================================
    // Checklist Operations
    // ========================================================================

    /// Create a checklist with its questions atomically
    pub async fn create_checklist(
        &self,
        event_id: Uuid,
        title: String,
        prompts: Vec<String>,
    ) -> Result<(Checklist, Vec<ChecklistQuestion>)> {
        self.write_conn()
            .transaction::<_, (Checklist, Vec<ChecklistQuestion>), AppError>(move |txn| {
                Box::pin(async move {
                    let checklist = ChecklistActiveModel {
                        id: Set(Uuid::new_v4()),
                        event_id: Set(event_id),
                        title: Set(title),
                    };

                    let checklist = checklist.insert(txn).await?;

                    let mut questions = Vec::with_capacity(prompts.len());
                    for (position, prompt) in prompts.into_iter().enumerate() {
                        let question = ChecklistQuestionActiveModel {
                            id: Set(Uuid::new_v4()),
                            checklist_id: Set(checklist.id),
                            prompt: Set(prompt),
                            position: Set(position as i32),
                        };
                        questions.push(question.insert(txn).await?);
                    }

                    Ok((checklist, questions))
                })
            })
            .await
            .map_err(flatten_txn)
    }

    /// The checklist of an event, with questions in display order
    pub async fn checklist_for_event(
        &self,
        event_id: Uuid,
    ) -> Result<Option<(Checklist, Vec<ChecklistQuestion>)>> {
        let Some(checklist) = ChecklistEntity::find()
            .filter(ChecklistColumn::EventId.eq(event_id))
            .one(self.read_conn())
            .await?
        else {
            return Ok(None);
        };

        let questions = ChecklistQuestionEntity::find()
            .filter(ChecklistQuestionColumn::ChecklistId.eq(checklist.id))
            .order_by_asc(ChecklistQuestionColumn::Position)
            .all(self.read_conn())
            .await?;

        Ok(Some((checklist, questions)))
    }

    /// Record checklist answers for a version; re-answering a question
    /// replaces the previous answer.
    pub async fn upsert_checklist_answers(
        &self,
        version_id: Uuid,
        answers: Vec<(Uuid, bool)>,
    ) -> Result<()> {
        if answers.is_empty() {
            return Ok(());
        }

        let rows: Vec<ChecklistAnswerActiveModel> = answers
            .into_iter()
            .map(|(question_id, answer)| ChecklistAnswerActiveModel {
                id: Set(Uuid::new_v4()),
                question_id: Set(question_id),
                version_id: Set(version_id),
                answer: Set(answer),
            })
            .collect();

        ChecklistAnswerEntity::insert_many(rows)
            .on_conflict(
                OnConflict::columns([
                    ChecklistAnswerColumn::QuestionId,
                    ChecklistAnswerColumn::VersionId,
                ])
                .update_column(ChecklistAnswerColumn::Answer)
                .to_owned(),
            )
            .exec(self.write_conn())
            .await?;

        Ok(())
    }

    /// Answers recorded for a version
    pub async fn answers_for_version(&self, version_id: Uuid) -> Result<Vec<ChecklistAnswer>> {
        ChecklistAnswerEntity::find()
            .filter(ChecklistAnswerColumn::VersionId.eq(version_id))
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }
}

// ============================================================================
// Connection-generic helpers, shared between pool methods and transactions
// ============================================================================

/// Versions of an article, newest first. The label is the tie-breaker for
/// rows sharing a timestamp tick, so "latest" stays deterministic.
fn versions_newest_first(article_id: Uuid) -> Select<ArticleVersionEntity> {
    ArticleVersionEntity::find()
        .filter(ArticleVersionColumn::ArticleId.eq(article_id))
        .order_by_desc(ArticleVersionColumn::CreatedAt)
        .order_by_desc(ArticleVersionColumn::Label)
}

async fn latest_version_on<C: ConnectionTrait>(
    conn: &C,
    article_id: Uuid,
) -> Result<Option<ArticleVersion>> {
    versions_newest_first(article_id)
        .one(conn)
        .await
        .map_err(Into::into)
}

async fn verdicts_on<C: ConnectionTrait>(conn: &C, version_id: Uuid) -> Result<Vec<Verdict>> {
    let evaluations = EvaluationEntity::find()
        .filter(EvaluationColumn::VersionId.eq(version_id))
        .all(conn)
        .await?;

    Ok(evaluations
        .iter()
        .filter_map(|e| {
            let verdict = e.parsed_verdict();
            if verdict.is_none() {
                tracing::warn!(
                    evaluation_id = %e.id,
                    verdict = %e.verdict,
                    "Skipping evaluation with unknown verdict"
                );
            }
            verdict
        })
        .collect())
}

async fn set_status_on<C: ConnectionTrait>(
    conn: &C,
    article_id: Uuid,
    status: ArticleStatus,
) -> Result<()> {
    let article = ArticleEntity::find_by_id(article_id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::ArticleNotFound {
            id: article_id.to_string(),
        })?;

    let previous = article.article_status();
    let mut active: ArticleActiveModel = article.into();
    active.status = Set(status.id());
    active.updated_at = Set(chrono::Utc::now().into());
    active.update(conn).await?;

    if previous != status {
        crate::metrics::record_status_transition(previous, status);
    }

    Ok(())
}

async fn replace_authors<C: ConnectionTrait>(
    conn: &C,
    article_id: Uuid,
    author_ids: &[Uuid],
) -> Result<()> {
    let rows: Vec<ArticleAuthorActiveModel> = author_ids
        .iter()
        .map(|&user_id| ArticleAuthorActiveModel {
            article_id: Set(article_id),
            user_id: Set(user_id),
        })
        .collect();

    if !rows.is_empty() {
        ArticleAuthorEntity::insert_many(rows).exec(conn).await?;
    }

    Ok(())
}

async fn replace_keywords<C: ConnectionTrait>(
    conn: &C,
    article_id: Uuid,
    keywords: &[String],
) -> Result<()> {
    let rows: Vec<ArticleKeywordActiveModel> = keywords
        .iter()
        .map(|keyword| ArticleKeywordActiveModel {
            article_id: Set(article_id),
            keyword: Set(keyword.clone()),
        })
        .collect();

    if !rows.is_empty() {
        ArticleKeywordEntity::insert_many(rows).exec(conn).await?;
    }

    Ok(())
}

async fn insert_version<C: ConnectionTrait>(
    conn: &C,
    article_id: Uuid,
    label: &str,
    pdf_ref: &str,
    checksum: Option<String>,
) -> Result<ArticleVersion> {
    let version = ArticleVersionActiveModel {
        id: Set(Uuid::new_v4()),
        article_id: Set(article_id),
        label: Set(label.to_string()),
        pdf_ref: Set(pdf_ref.to_string()),
        checksum: Set(checksum),
        created_at: Set(chrono::Utc::now().into()),
    };

    version.insert(conn).await.map_err(Into::into)
}

// ============================================================================
// ReviewStore implementation
// ============================================================================

#[async_trait]
impl ReviewStore for Repository {
    async fn find_article(&self, id: Uuid) -> Result<Option<Article>> {
        self.find_article_by_id(id).await
    }

    async fn find_version(&self, id: Uuid) -> Result<Option<ArticleVersion>> {
        self.find_version_by_id(id).await
    }

    async fn latest_version(&self, article_id: Uuid) -> Result<Option<ArticleVersion>> {
        self.latest_version_for_article(article_id).await
    }

    async fn author_ids(&self, article_id: Uuid) -> Result<Vec<Uuid>> {
        self.article_author_ids(article_id).await
    }

    async fn evaluation_exists(&self, version_id: Uuid, evaluator_id: Uuid) -> Result<bool> {
        Repository::evaluation_exists(self, version_id, evaluator_id).await
    }

    async fn verdicts_for_version(&self, version_id: Uuid) -> Result<Vec<Verdict>> {
        verdicts_on(self.read_conn(), version_id).await
    }

    async fn insert_evaluation_and_recompute(
        &self,
        new: NewEvaluation,
    ) -> Result<(Evaluation, ArticleStatus)> {
        Repository::insert_evaluation_and_recompute(self, new).await
    }

    async fn create_version(
        &self,
        article_id: Uuid,
        label: &str,
        pdf_ref: &str,
        checksum: Option<String>,
    ) -> Result<ArticleVersion> {
        self.create_article_version(article_id, label, pdf_ref, checksum)
            .await
    }

    async fn set_status(&self, article_id: Uuid, status: ArticleStatus) -> Result<()> {
        self.set_article_status(article_id, status).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DbBackend, QueryTrait};

    #[test]
    fn test_version_listing_orders_by_created_at_then_label() {
        let sql = versions_newest_first(Uuid::new_v4())
            .build(DbBackend::Postgres)
            .to_string();

        assert!(
            sql.contains(
                r#"ORDER BY "article_versions"."created_at" DESC, "article_versions"."label" DESC"#
            ),
            "unexpected ordering clause: {sql}"
        );
    }
}
