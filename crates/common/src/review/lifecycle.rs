//! Article lifecycle orchestration
//!
//! Statelessly coordinates the status-changing operations: recording an
//! evaluation (which re-runs the aggregator), submitting a correction
//! version, explicit recompute and the coordinator override. Constructed
//! over a [`ReviewStore`] so tests can substitute an in-memory double for
//! the repository.
//!
//! Recompute and override are deliberately separate operations: one is
//! pure aggregator output, the other an explicit admin action that
//! bypasses it.

use crate::auth::AuthContext;
use crate::db::models::{Article, ArticleStatus, ArticleVersion, Evaluation, Verdict};
use crate::errors::{AppError, Result};
use crate::review::{aggregator, version_label::VersionLabel};
use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

/// A new evaluation to record
#[derive(Debug, Clone)]
pub struct NewEvaluation {
    pub version_id: Uuid,
    pub evaluator_id: Uuid,
    pub verdict: Verdict,
    pub observation: String,
    pub attachment_ref: Option<String>,
}

/// Persistence operations the lifecycle needs, implemented by `Repository`
/// and by test doubles.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn find_article(&self, id: Uuid) -> Result<Option<Article>>;

    async fn find_version(&self, id: Uuid) -> Result<Option<ArticleVersion>>;

    async fn latest_version(&self, article_id: Uuid) -> Result<Option<ArticleVersion>>;

    async fn author_ids(&self, article_id: Uuid) -> Result<Vec<Uuid>>;

    async fn evaluation_exists(&self, version_id: Uuid, evaluator_id: Uuid) -> Result<bool>;

    async fn verdicts_for_version(&self, version_id: Uuid) -> Result<Vec<Verdict>>;

    /// Insert the evaluation and persist the re-derived status atomically
    async fn insert_evaluation_and_recompute(
        &self,
        new: NewEvaluation,
    ) -> Result<(Evaluation, ArticleStatus)>;

    async fn create_version(
        &self,
        article_id: Uuid,
        label: &str,
        pdf_ref: &str,
        checksum: Option<String>,
    ) -> Result<ArticleVersion>;

    async fn set_status(&self, article_id: Uuid, status: ArticleStatus) -> Result<()>;
}

/// Orchestrates status-changing operations on articles
pub struct ArticleLifecycle<S> {
    store: S,
}

impl<S: ReviewStore> ArticleLifecycle<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Record an evaluator's verdict on a version.
    ///
    /// Preconditions: the version exists, the evaluator is not a co-author
    /// of the article, and has not evaluated this version before. On
    /// success the article status is re-derived from the latest version's
    /// full evaluation set in the same transaction as the insert.
    pub async fn record_evaluation(
        &self,
        new: NewEvaluation,
    ) -> Result<(Evaluation, ArticleStatus)> {
        let version = self
            .store
            .find_version(new.version_id)
            .await?
            .ok_or_else(|| AppError::VersionNotFound {
                id: new.version_id.to_string(),
            })?;

        let authors = self.store.author_ids(version.article_id).await?;
        if authors.contains(&new.evaluator_id) {
            return Err(AppError::SelfReview);
        }

        // Application-level pre-check; the unique index on
        // (version_id, evaluator_id) settles concurrent duplicates.
        if self
            .store
            .evaluation_exists(new.version_id, new.evaluator_id)
            .await?
        {
            return Err(AppError::DuplicateEvaluation);
        }

        let verdict = new.verdict;
        let (evaluation, status) = self.store.insert_evaluation_and_recompute(new).await?;

        info!(
            evaluation_id = %evaluation.id,
            article_id = %version.article_id,
            version_id = %version.id,
            verdict = verdict.as_str(),
            status = ?status,
            "Evaluation recorded"
        );
        crate::metrics::record_evaluation(verdict);

        Ok((evaluation, status))
    }

    /// Submit a corrected PDF as the next version of an article.
    ///
    /// Only allowed while the article awaits correction, and only by one of
    /// its authors (or a coordinator). Resets the status to `InReview`
    /// explicitly; the aggregator is not consulted.
    pub async fn submit_new_version(
        &self,
        article_id: Uuid,
        pdf_ref: &str,
        checksum: Option<String>,
        caller: &AuthContext,
    ) -> Result<ArticleVersion> {
        let article = self
            .store
            .find_article(article_id)
            .await?
            .ok_or_else(|| AppError::ArticleNotFound {
                id: article_id.to_string(),
            })?;

        let authors = self.store.author_ids(article_id).await?;
        if !authors.contains(&caller.user_id) && !caller.roles.is_coordinator() {
            return Err(AppError::Forbidden);
        }

        if article.article_status() != ArticleStatus::AwaitingCorrection {
            return Err(AppError::InvalidTransition {
                message: "Nova versão só é permitida enquanto o artigo aguarda correção"
                    .to_string(),
            });
        }

        let latest = self
            .store
            .latest_version(article_id)
            .await?
            .ok_or_else(|| AppError::Internal {
                message: format!("Article {} has no versions", article_id),
            })?;

        let label = VersionLabel::parse(&latest.label).ok_or_else(|| {
            AppError::CorruptVersionLabel {
                article_id: article_id.to_string(),
                label: latest.label.clone(),
            }
        })?;

        let next = label.next_minor();
        let version = self
            .store
            .create_version(article_id, &next.to_string(), pdf_ref, checksum)
            .await?;

        self.store
            .set_status(article_id, ArticleStatus::InReview)
            .await?;

        info!(
            article_id = %article_id,
            version_id = %version.id,
            label = %next,
            "Correction version submitted, article back in review"
        );
        crate::metrics::record_version_submitted();

        Ok(version)
    }

    /// Re-derive the status from the latest version's evaluation set
    pub async fn recompute_status(&self, article_id: Uuid) -> Result<ArticleStatus> {
        let article = self
            .store
            .find_article(article_id)
            .await?
            .ok_or_else(|| AppError::ArticleNotFound {
                id: article_id.to_string(),
            })?;

        let latest = self
            .store
            .latest_version(article_id)
            .await?
            .ok_or_else(|| AppError::Internal {
                message: format!("Article {} has no versions", article_id),
            })?;

        let verdicts = self.store.verdicts_for_version(latest.id).await?;

        let current = article.article_status();
        let next = aggregator::derive_status(&verdicts).unwrap_or(current);

        if next != current {
            self.store.set_status(article_id, next).await?;
        }

        Ok(next)
    }

    /// Coordinator escape hatch: unconditionally overwrite the status,
    /// bypassing the aggregator.
    pub async fn override_status(
        &self,
        article_id: Uuid,
        status_id: i16,
    ) -> Result<ArticleStatus> {
        let status =
            ArticleStatus::from_id(status_id).ok_or(AppError::StatusNotFound { id: status_id })?;

        self.store
            .find_article(article_id)
            .await?
            .ok_or_else(|| AppError::ArticleNotFound {
                id: article_id.to_string(),
            })?;

        self.store.set_status(article_id, status).await?;

        info!(
            article_id = %article_id,
            status = ?status,
            "Article status overridden by coordinator"
        );

        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Role, RoleSet};
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory stand-in for the repository
    #[derive(Default)]
    struct MemStore {
        state: Mutex<MemState>,
    }

    #[derive(Default)]
    struct MemState {
        articles: HashMap<Uuid, Article>,
        versions: Vec<ArticleVersion>,
        authors: HashMap<Uuid, Vec<Uuid>>,
        evaluations: Vec<Evaluation>,
    }

    impl MemStore {
        fn with_article(label: &str, status: ArticleStatus, authors: &[Uuid]) -> (Self, Uuid, Uuid) {
            let store = Self::default();
            let article_id = Uuid::new_v4();
            let version_id = Uuid::new_v4();
            let now = chrono::Utc::now();
            {
                let mut state = store.state.lock().unwrap();
                state.articles.insert(
                    article_id,
                    Article {
                        id: article_id,
                        event_id: Uuid::new_v4(),
                        title: "Artigo".into(),
                        abstract_text: "Resumo".into(),
                        thematic_area: "Computação".into(),
                        status: status.id(),
                        created_at: now.into(),
                        updated_at: now.into(),
                    },
                );
                state.versions.push(ArticleVersion {
                    id: version_id,
                    article_id,
                    label: label.into(),
                    pdf_ref: "pdf/initial".into(),
                    checksum: None,
                    created_at: now.into(),
                });
                state.authors.insert(article_id, authors.to_vec());
            }
            (store, article_id, version_id)
        }

        fn evaluation_count(&self) -> usize {
            self.state.lock().unwrap().evaluations.len()
        }

        fn status_of(&self, article_id: Uuid) -> ArticleStatus {
            self.state.lock().unwrap().articles[&article_id].article_status()
        }
    }

    #[async_trait]
    impl ReviewStore for MemStore {
        async fn find_article(&self, id: Uuid) -> Result<Option<Article>> {
            Ok(self.state.lock().unwrap().articles.get(&id).cloned())
        }

        async fn find_version(&self, id: Uuid) -> Result<Option<ArticleVersion>> {
            Ok(self
                .state
                .lock()
                .unwrap()
                .versions
                .iter()
                .find(|v| v.id == id)
                .cloned())
        }

        async fn latest_version(&self, article_id: Uuid) -> Result<Option<ArticleVersion>> {
            Ok(self
                .state
                .lock()
                .unwrap()
                .versions
                .iter()
                .filter(|v| v.article_id == article_id)
                .last()
                .cloned())
        }

        async fn author_ids(&self, article_id: Uuid) -> Result<Vec<Uuid>> {
            Ok(self
                .state
                .lock()
                .unwrap()
                .authors
                .get(&article_id)
                .cloned()
                .unwrap_or_default())
        }

        async fn evaluation_exists(&self, version_id: Uuid, evaluator_id: Uuid) -> Result<bool> {
            Ok(self
                .state
                .lock()
                .unwrap()
                .evaluations
                .iter()
                .any(|e| e.version_id == version_id && e.evaluator_id == evaluator_id))
        }

        async fn verdicts_for_version(&self, version_id: Uuid) -> Result<Vec<Verdict>> {
            Ok(self
                .state
                .lock()
                .unwrap()
                .evaluations
                .iter()
                .filter(|e| e.version_id == version_id)
                .filter_map(|e| e.parsed_verdict())
                .collect())
        }

        async fn insert_evaluation_and_recompute(
            &self,
            new: NewEvaluation,
        ) -> Result<(Evaluation, ArticleStatus)> {
            let mut state = self.state.lock().unwrap();

            let version = state
                .versions
                .iter()
                .find(|v| v.id == new.version_id)
                .cloned()
                .ok_or_else(|| AppError::VersionNotFound {
                    id: new.version_id.to_string(),
                })?;

            // Simulates the unique index on (version_id, evaluator_id)
            if state
                .evaluations
                .iter()
                .any(|e| e.version_id == new.version_id && e.evaluator_id == new.evaluator_id)
            {
                return Err(AppError::DuplicateEvaluation);
            }

            let evaluation = Evaluation {
                id: Uuid::new_v4(),
                version_id: new.version_id,
                evaluator_id: new.evaluator_id,
                verdict: new.verdict.as_str().to_string(),
                observation: new.observation,
                attachment_ref: new.attachment_ref,
                created_at: chrono::Utc::now().into(),
            };
            state.evaluations.push(evaluation.clone());

            let latest = state
                .versions
                .iter()
                .filter(|v| v.article_id == version.article_id)
                .last()
                .cloned()
                .unwrap();

            let verdicts: Vec<Verdict> = state
                .evaluations
                .iter()
                .filter(|e| e.version_id == latest.id)
                .filter_map(|e| e.parsed_verdict())
                .collect();

            let article = state.articles.get_mut(&version.article_id).unwrap();
            let current = article.article_status();
            let next = aggregator::derive_status(&verdicts).unwrap_or(current);
            article.status = next.id();

            Ok((evaluation, next))
        }

        async fn create_version(
            &self,
            article_id: Uuid,
            label: &str,
            pdf_ref: &str,
            checksum: Option<String>,
        ) -> Result<ArticleVersion> {
            let version = ArticleVersion {
                id: Uuid::new_v4(),
                article_id,
                label: label.to_string(),
                pdf_ref: pdf_ref.to_string(),
                checksum,
                created_at: chrono::Utc::now().into(),
            };
            self.state.lock().unwrap().versions.push(version.clone());
            Ok(version)
        }

        async fn set_status(&self, article_id: Uuid, status: ArticleStatus) -> Result<()> {
            let mut state = self.state.lock().unwrap();
            let article =
                state
                    .articles
                    .get_mut(&article_id)
                    .ok_or_else(|| AppError::ArticleNotFound {
                        id: article_id.to_string(),
                    })?;
            article.status = status.id();
            Ok(())
        }
    }

    fn author_ctx(user_id: Uuid) -> AuthContext {
        AuthContext {
            user_id,
            roles: RoleSet::new([Role::Author]),
            request_id: "test".into(),
        }
    }

    fn eval(version_id: Uuid, evaluator_id: Uuid, verdict: Verdict) -> NewEvaluation {
        NewEvaluation {
            version_id,
            evaluator_id,
            verdict,
            observation: "obs".into(),
            attachment_ref: None,
        }
    }

    #[tokio::test]
    async fn test_unanimous_rejection_rejects_article() {
        let (store, article_id, version_id) =
            MemStore::with_article("1.0", ArticleStatus::InReview, &[]);
        let lifecycle = ArticleLifecycle::new(store);

        let (_, status) = lifecycle
            .record_evaluation(eval(version_id, Uuid::new_v4(), Verdict::Rejected))
            .await
            .unwrap();
        assert_eq!(status, ArticleStatus::Rejected);

        let (_, status) = lifecycle
            .record_evaluation(eval(version_id, Uuid::new_v4(), Verdict::Rejected))
            .await
            .unwrap();
        assert_eq!(status, ArticleStatus::Rejected);
        assert_eq!(lifecycle.store.status_of(article_id), ArticleStatus::Rejected);
    }

    #[tokio::test]
    async fn test_mixed_verdicts_await_correction_then_new_version() {
        let author = Uuid::new_v4();
        let (store, article_id, version_id) =
            MemStore::with_article("1.0", ArticleStatus::InReview, &[author]);
        let lifecycle = ArticleLifecycle::new(store);

        lifecycle
            .record_evaluation(eval(version_id, Uuid::new_v4(), Verdict::Approved))
            .await
            .unwrap();
        let (_, status) = lifecycle
            .record_evaluation(eval(version_id, Uuid::new_v4(), Verdict::NeedsRevision))
            .await
            .unwrap();
        assert_eq!(status, ArticleStatus::AwaitingCorrection);

        // The author submits a correction
        let version = lifecycle
            .submit_new_version(article_id, "pdf/corrected", None, &author_ctx(author))
            .await
            .unwrap();
        assert_eq!(version.label, "1.1");
        assert_eq!(lifecycle.store.status_of(article_id), ArticleStatus::InReview);
    }

    #[tokio::test]
    async fn test_self_review_is_rejected() {
        let author = Uuid::new_v4();
        let (store, _, version_id) =
            MemStore::with_article("1.0", ArticleStatus::InReview, &[author]);
        let lifecycle = ArticleLifecycle::new(store);

        let err = lifecycle
            .record_evaluation(eval(version_id, author, Verdict::Approved))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::SelfReview));
        assert_eq!(lifecycle.store.evaluation_count(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_evaluation_is_rejected_without_mutation() {
        let (store, article_id, version_id) =
            MemStore::with_article("1.0", ArticleStatus::InReview, &[]);
        let lifecycle = ArticleLifecycle::new(store);
        let evaluator = Uuid::new_v4();

        lifecycle
            .record_evaluation(eval(version_id, evaluator, Verdict::Approved))
            .await
            .unwrap();

        let err = lifecycle
            .record_evaluation(eval(version_id, evaluator, Verdict::Rejected))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateEvaluation));
        assert_eq!(lifecycle.store.evaluation_count(), 1);
        assert_eq!(lifecycle.store.status_of(article_id), ArticleStatus::Approved);
    }

    #[tokio::test]
    async fn test_new_version_requires_awaiting_correction() {
        let author = Uuid::new_v4();
        let (store, article_id, _) =
            MemStore::with_article("1.0", ArticleStatus::InReview, &[author]);
        let lifecycle = ArticleLifecycle::new(store);

        let err = lifecycle
            .submit_new_version(article_id, "pdf/x", None, &author_ctx(author))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_new_version_denied_for_non_author() {
        let (store, article_id, _) =
            MemStore::with_article("1.0", ArticleStatus::AwaitingCorrection, &[Uuid::new_v4()]);
        let lifecycle = ArticleLifecycle::new(store);

        let err = lifecycle
            .submit_new_version(article_id, "pdf/x", None, &author_ctx(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden));
    }

    #[tokio::test]
    async fn test_corrupt_label_is_surfaced_not_reset() {
        let author = Uuid::new_v4();
        let (store, article_id, _) =
            MemStore::with_article("one.zero", ArticleStatus::AwaitingCorrection, &[author]);
        let lifecycle = ArticleLifecycle::new(store);

        let err = lifecycle
            .submit_new_version(article_id, "pdf/x", None, &author_ctx(author))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::CorruptVersionLabel { .. }));
    }

    #[tokio::test]
    async fn test_override_status_bypasses_aggregator() {
        let (store, article_id, version_id) =
            MemStore::with_article("1.0", ArticleStatus::InReview, &[]);
        let lifecycle = ArticleLifecycle::new(store);

        lifecycle
            .record_evaluation(eval(version_id, Uuid::new_v4(), Verdict::Rejected))
            .await
            .unwrap();
        assert_eq!(lifecycle.store.status_of(article_id), ArticleStatus::Rejected);

        let status = lifecycle.override_status(article_id, 3).await.unwrap();
        assert_eq!(status, ArticleStatus::Approved);
        assert_eq!(lifecycle.store.status_of(article_id), ArticleStatus::Approved);

        let err = lifecycle.override_status(article_id, 9).await.unwrap_err();
        assert!(matches!(err, AppError::StatusNotFound { id: 9 }));
    }

    #[tokio::test]
    async fn test_recompute_matches_aggregator() {
        let (store, article_id, version_id) =
            MemStore::with_article("1.0", ArticleStatus::InReview, &[]);
        let lifecycle = ArticleLifecycle::new(store);

        lifecycle
            .record_evaluation(eval(version_id, Uuid::new_v4(), Verdict::Approved))
            .await
            .unwrap();

        // Coordinator forces a different status, then recomputes
        lifecycle.override_status(article_id, 4).await.unwrap();
        let status = lifecycle.recompute_status(article_id).await.unwrap();
        assert_eq!(status, ArticleStatus::Approved);
    }
}
