//! Review domain logic
//!
//! The one part of the system with real invariants:
//! - `aggregator`: pure verdict-multiset to article-status state machine
//! - `version_label`: "major.minor" version numbering
//! - `visibility`: double-blind projection and access gating
//! - `lifecycle`: orchestration of status-changing operations

pub mod aggregator;
pub mod lifecycle;
pub mod version_label;
pub mod visibility;

pub use lifecycle::{ArticleLifecycle, NewEvaluation, ReviewStore};
pub use version_label::VersionLabel;
pub use visibility::ArticleRelation;
