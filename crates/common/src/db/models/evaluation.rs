//! Evaluation entity and verdict enum

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Evaluator verdict on one article version.
///
/// The legacy system stored free strings ("Aprovado"/"Reprovado"/"Revisão");
/// here the set is closed and the column carries a CHECK constraint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Approved,
    Rejected,
    NeedsRevision,
}

impl Verdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Approved => "approved",
            Verdict::Rejected => "rejected",
            Verdict::NeedsRevision => "needs_revision",
        }
    }

    /// Parse a stored verdict; unknown strings are rejected, not coerced
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "approved" => Some(Verdict::Approved),
            "rejected" => Some(Verdict::Rejected),
            "needs_revision" => Some(Verdict::NeedsRevision),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "evaluations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub version_id: Uuid,

    pub evaluator_id: Uuid,

    /// Stored verdict string, see [`Verdict`]
    #[sea_orm(column_type = "Text")]
    pub verdict: String,

    #[sea_orm(column_type = "Text")]
    pub observation: String,

    /// Optional supplementary PDF reference
    #[sea_orm(column_type = "Text", nullable)]
    pub attachment_ref: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

impl Model {
    /// Get the verdict as an enum, `None` if the stored string is unknown
    pub fn parsed_verdict(&self) -> Option<Verdict> {
        Verdict::parse(&self.verdict)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::article_version::Entity",
        from = "Column::VersionId",
        to = "super::article_version::Column::Id"
    )]
    Version,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::EvaluatorId",
        to = "super::user::Column::Id"
    )]
    Evaluator,
}

impl Related<super::article_version::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Version.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Evaluator.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_roundtrip() {
        for verdict in [Verdict::Approved, Verdict::Rejected, Verdict::NeedsRevision] {
            assert_eq!(Verdict::parse(verdict.as_str()), Some(verdict));
        }
    }

    #[test]
    fn test_unknown_verdict_is_rejected() {
        assert_eq!(Verdict::parse("Aprovado"), None);
        assert_eq!(Verdict::parse(""), None);
    }
}
