//! Evaluation aggregation state machine
//!
//! Maps the multiset of verdicts on an article's latest version to the next
//! lifecycle status. The function is a pure aggregate over the current set,
//! not a running tally: it is re-derived from scratch after every new
//! evaluation, so the result is order-independent and idempotent, and
//! concurrent evaluators converge to the same status regardless of arrival
//! order.

use crate::db::models::{ArticleStatus, Verdict};

/// Derive the next article status from all verdicts on the latest version.
///
/// - unanimous rejection → `Rejected`
/// - unanimous approval → `Approved`
/// - any revision request, or a split mixing approvals and rejections →
///   `AwaitingCorrection`
/// - empty set → `None` (no transition; not called before the first
///   evaluation exists)
pub fn derive_status(verdicts: &[Verdict]) -> Option<ArticleStatus> {
    if verdicts.is_empty() {
        return None;
    }

    let total = verdicts.len();
    let approvals = verdicts.iter().filter(|v| **v == Verdict::Approved).count();
    let rejections = verdicts.iter().filter(|v| **v == Verdict::Rejected).count();
    let revisions = verdicts
        .iter()
        .filter(|v| **v == Verdict::NeedsRevision)
        .count();

    if rejections == total {
        Some(ArticleStatus::Rejected)
    } else if approvals == total {
        Some(ArticleStatus::Approved)
    } else if revisions > 0 || (approvals > 0 && rejections > 0) {
        Some(ArticleStatus::AwaitingCorrection)
    } else {
        // Not reachable with three verdict kinds, kept as a defensive
        // default: an undecidable set causes no transition.
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Verdict::*;

    #[test]
    fn test_empty_set_causes_no_transition() {
        assert_eq!(derive_status(&[]), None);
    }

    #[test]
    fn test_unanimous_rejection() {
        assert_eq!(derive_status(&[Rejected]), Some(ArticleStatus::Rejected));
        assert_eq!(
            derive_status(&[Rejected, Rejected, Rejected]),
            Some(ArticleStatus::Rejected)
        );
    }

    #[test]
    fn test_unanimous_approval() {
        assert_eq!(derive_status(&[Approved]), Some(ArticleStatus::Approved));
        assert_eq!(
            derive_status(&[Approved, Approved]),
            Some(ArticleStatus::Approved)
        );
    }

    #[test]
    fn test_any_revision_requests_correction() {
        assert_eq!(
            derive_status(&[NeedsRevision]),
            Some(ArticleStatus::AwaitingCorrection)
        );
        assert_eq!(
            derive_status(&[Approved, NeedsRevision]),
            Some(ArticleStatus::AwaitingCorrection)
        );
        assert_eq!(
            derive_status(&[Rejected, NeedsRevision, Rejected]),
            Some(ArticleStatus::AwaitingCorrection)
        );
    }

    #[test]
    fn test_split_approve_reject_requests_correction() {
        assert_eq!(
            derive_status(&[Approved, Rejected]),
            Some(ArticleStatus::AwaitingCorrection)
        );
        assert_eq!(
            derive_status(&[Rejected, Approved, Approved]),
            Some(ArticleStatus::AwaitingCorrection)
        );
    }

    #[test]
    fn test_order_independence() {
        // Every permutation of the same multiset yields the same status
        let sets: &[&[Verdict]] = &[
            &[Approved, Rejected, NeedsRevision],
            &[Approved, Approved, Rejected],
            &[Rejected, Rejected],
            &[Approved, NeedsRevision],
        ];

        for verdicts in sets {
            let expected = derive_status(verdicts);
            let mut permuted = verdicts.to_vec();
            // Enough rotations to cover every starting position
            for _ in 0..permuted.len() {
                permuted.rotate_left(1);
                assert_eq!(derive_status(&permuted), expected);
            }
            permuted.reverse();
            assert_eq!(derive_status(&permuted), expected);
        }
    }

    #[test]
    fn test_idempotence() {
        let verdicts = [Approved, NeedsRevision, Rejected];
        let first = derive_status(&verdicts);
        assert_eq!(derive_status(&verdicts), first);
        assert_eq!(derive_status(&verdicts), first);
    }
}
