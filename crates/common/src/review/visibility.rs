//! Double-blind visibility rules
//!
//! Role-conditional projection of article data. Authors and evaluators are
//! mutually anonymous: an author never sees who evaluated, an evaluator
//! never sees another evaluator's verdicts or identity on the same article.
//! Coordinators see everything.
//!
//! The access gate runs before any projection; a caller with no qualifying
//! relationship gets `Forbidden` unless the article is an approved (public)
//! publication.

use crate::auth::{AuthContext, RoleSet};
use crate::db::models::{ArticleStatus, Evaluation, User, Verdict};
use serde::Serialize;
use uuid::Uuid;

/// The caller's relationship to one article, computed per request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArticleRelation {
    /// Caller is among the article's authors
    pub is_author: bool,

    /// Caller holds evaluation capability globally
    pub is_evaluator: bool,

    /// Caller holds the coordinator role globally
    pub is_coordinator: bool,
}

impl ArticleRelation {
    pub fn compute(caller: &AuthContext, author_ids: &[Uuid]) -> Self {
        Self::from_parts(caller.user_id, &caller.roles, author_ids)
    }

    pub fn from_parts(user_id: Uuid, roles: &RoleSet, author_ids: &[Uuid]) -> Self {
        Self {
            is_author: author_ids.contains(&user_id),
            is_evaluator: roles.can_evaluate(),
            is_coordinator: roles.is_coordinator(),
        }
    }

    /// Whether the caller may view the article at all. Approved articles
    /// are public; everything else needs a qualifying relationship.
    pub fn can_view_article(&self, status: ArticleStatus) -> bool {
        self.has_relationship() || status == ArticleStatus::Approved
    }

    /// Whether the caller may view a version's evaluations and comments
    pub fn can_view_threads(&self) -> bool {
        self.has_relationship()
    }

    fn has_relationship(&self) -> bool {
        self.is_author || self.is_evaluator || self.is_coordinator
    }
}

/// Evaluator identity, present only where the caller is allowed to see it
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EvaluatorIdentity {
    pub id: Uuid,
    pub name: String,
}

/// One evaluation as exposed to a caller
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationView {
    pub id: Uuid,
    pub version_id: Uuid,
    pub verdict: Option<Verdict>,
    pub observation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment_ref: Option<String>,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluator: Option<EvaluatorIdentity>,
}

impl EvaluationView {
    /// Full view, before projection
    pub fn from_record(evaluation: Evaluation, evaluator: Option<User>) -> Self {
        let verdict = evaluation.parsed_verdict();
        Self {
            id: evaluation.id,
            version_id: evaluation.version_id,
            verdict,
            observation: evaluation.observation,
            attachment_ref: evaluation.attachment_ref,
            created_at: evaluation.created_at.to_rfc3339(),
            evaluator: evaluator.map(|u| EvaluatorIdentity {
                id: u.id,
                name: u.name,
            }),
        }
    }

    fn evaluator_id(&self) -> Option<Uuid> {
        self.evaluator.as_ref().map(|e| e.id)
    }

    fn strip_evaluator(mut self) -> Self {
        self.evaluator = None;
        self
    }
}

/// Project an article's evaluation list for one caller.
///
/// - coordinator: unfiltered
/// - author (non-coordinator): every evaluation kept, evaluator identity
///   stripped
/// - evaluator only: filtered down to the caller's own evaluations
/// - anything else already authorized upstream: unfiltered
pub fn project_evaluations(
    relation: ArticleRelation,
    caller_id: Uuid,
    evaluations: Vec<EvaluationView>,
) -> Vec<EvaluationView> {
    if relation.is_coordinator {
        return evaluations;
    }

    if relation.is_author {
        return evaluations
            .into_iter()
            .map(EvaluationView::strip_evaluator)
            .collect();
    }

    if relation.is_evaluator {
        return evaluations
            .into_iter()
            .filter(|e| e.evaluator_id() == Some(caller_id))
            .collect();
    }

    evaluations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;

    fn view(id: u128, evaluator_id: u128) -> EvaluationView {
        EvaluationView {
            id: Uuid::from_u128(id),
            version_id: Uuid::from_u128(1),
            verdict: Some(Verdict::Approved),
            observation: "ok".to_string(),
            attachment_ref: None,
            created_at: "2026-01-01T00:00:00+00:00".to_string(),
            evaluator: Some(EvaluatorIdentity {
                id: Uuid::from_u128(evaluator_id),
                name: "Avaliador".to_string(),
            }),
        }
    }

    fn relation(is_author: bool, is_evaluator: bool, is_coordinator: bool) -> ArticleRelation {
        ArticleRelation {
            is_author,
            is_evaluator,
            is_coordinator,
        }
    }

    #[test]
    fn test_relation_from_parts() {
        let me = Uuid::from_u128(7);
        let roles = RoleSet::new([Role::Author]);

        let rel = ArticleRelation::from_parts(me, &roles, &[me]);
        assert!(rel.is_author);
        assert!(!rel.is_evaluator);

        let rel = ArticleRelation::from_parts(me, &roles, &[Uuid::from_u128(8)]);
        assert!(!rel.is_author);
    }

    #[test]
    fn test_coordinator_counts_as_evaluator() {
        let roles = RoleSet::new([Role::Coordinator]);
        let rel = ArticleRelation::from_parts(Uuid::from_u128(1), &roles, &[]);
        assert!(rel.is_evaluator);
        assert!(rel.is_coordinator);
    }

    #[test]
    fn test_access_gate() {
        let none = relation(false, false, false);
        assert!(!none.can_view_article(ArticleStatus::InReview));
        assert!(!none.can_view_article(ArticleStatus::Rejected));
        // Approved articles are public
        assert!(none.can_view_article(ArticleStatus::Approved));
        assert!(!none.can_view_threads());

        let author = relation(true, false, false);
        assert!(author.can_view_article(ArticleStatus::InReview));
        assert!(author.can_view_threads());
    }

    #[test]
    fn test_author_never_sees_evaluator_identity() {
        let rel = relation(true, false, false);
        let projected = project_evaluations(rel, Uuid::from_u128(9), vec![view(1, 10), view(2, 11)]);

        assert_eq!(projected.len(), 2);
        for e in &projected {
            assert!(e.evaluator.is_none());
            // Verdict and observation survive the projection
            assert_eq!(e.verdict, Some(Verdict::Approved));
        }
    }

    #[test]
    fn test_evaluator_sees_only_own_evaluations() {
        let rel = relation(false, true, false);
        let me = Uuid::from_u128(10);
        let projected = project_evaluations(rel, me, vec![view(1, 10), view(2, 11), view(3, 10)]);

        assert_eq!(projected.len(), 2);
        for e in &projected {
            assert_eq!(e.evaluator_id(), Some(me));
        }
    }

    #[test]
    fn test_coordinator_sees_everything() {
        let rel = relation(false, true, true);
        let projected = project_evaluations(rel, Uuid::from_u128(1), vec![view(1, 10), view(2, 11)]);

        assert_eq!(projected.len(), 2);
        assert!(projected.iter().all(|e| e.evaluator.is_some()));
    }

    #[test]
    fn test_author_who_also_evaluates_is_treated_as_author() {
        // Author wins over evaluator: identity stripped, list not filtered
        let rel = relation(true, true, false);
        let projected = project_evaluations(rel, Uuid::from_u128(10), vec![view(1, 10), view(2, 11)]);

        assert_eq!(projected.len(), 2);
        assert!(projected.iter().all(|e| e.evaluator.is_none()));
    }
}
