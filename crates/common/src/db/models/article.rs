//! Article entity and lifecycle status enum

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Article lifecycle status.
///
/// Stored as a numeric id; the set is closed and every transition is either
/// derived by the evaluation aggregator or an explicit coordinator override.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArticleStatus {
    InReview,
    AwaitingCorrection,
    Approved,
    Rejected,
}

impl ArticleStatus {
    /// Numeric id as stored in the database
    pub fn id(self) -> i16 {
        match self {
            ArticleStatus::InReview => 1,
            ArticleStatus::AwaitingCorrection => 2,
            ArticleStatus::Approved => 3,
            ArticleStatus::Rejected => 4,
        }
    }

    /// Stable label used in logs and metrics
    pub fn as_str(self) -> &'static str {
        match self {
            ArticleStatus::InReview => "in_review",
            ArticleStatus::AwaitingCorrection => "awaiting_correction",
            ArticleStatus::Approved => "approved",
            ArticleStatus::Rejected => "rejected",
        }
    }

    /// Resolve a stored numeric id
    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            1 => Some(ArticleStatus::InReview),
            2 => Some(ArticleStatus::AwaitingCorrection),
            3 => Some(ArticleStatus::Approved),
            4 => Some(ArticleStatus::Rejected),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "articles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub event_id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub abstract_text: String,

    #[sea_orm(column_type = "Text")]
    pub thematic_area: String,

    /// Numeric status id, see [`ArticleStatus`]
    pub status: i16,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Get the status as an enum. The column carries a CHECK constraint, so
    /// an unknown id only appears if the constraint was dropped; fall back
    /// to the initial state rather than panic.
    pub fn article_status(&self) -> ArticleStatus {
        ArticleStatus::from_id(self.status).unwrap_or(ArticleStatus::InReview)
    }

    /// Approved articles are public "publications"
    pub fn is_public(&self) -> bool {
        self.article_status() == ArticleStatus::Approved
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::event::Entity",
        from = "Column::EventId",
        to = "super::event::Column::Id"
    )]
    Event,

    #[sea_orm(has_many = "super::article_version::Entity")]
    Versions,

    #[sea_orm(has_many = "super::article_author::Entity")]
    Authors,

    #[sea_orm(has_many = "super::article_keyword::Entity")]
    Keywords,
}

impl Related<super::event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Event.def()
    }
}

impl Related<super::article_version::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Versions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_ids_match_legacy_values() {
        assert_eq!(ArticleStatus::InReview.id(), 1);
        assert_eq!(ArticleStatus::AwaitingCorrection.id(), 2);
        assert_eq!(ArticleStatus::Approved.id(), 3);
        assert_eq!(ArticleStatus::Rejected.id(), 4);
    }

    #[test]
    fn test_unknown_status_id() {
        assert_eq!(ArticleStatus::from_id(0), None);
        assert_eq!(ArticleStatus::from_id(5), None);
    }
}
