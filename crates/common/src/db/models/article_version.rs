//! Article version entity
//!
//! One PDF submission snapshot of an article. Versions are append-only;
//! corrections create a new version, never mutate an old one.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "article_versions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub article_id: Uuid,

    /// "major.minor" label, e.g. "1.0", "1.1"
    #[sea_orm(column_type = "Text")]
    pub label: String,

    /// Stored reference to the submitted PDF
    #[sea_orm(column_type = "Text")]
    pub pdf_ref: String,

    /// SHA-256 checksum of the stored PDF
    #[sea_orm(column_type = "Text", nullable)]
    pub checksum: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::article::Entity",
        from = "Column::ArticleId",
        to = "super::article::Column::Id"
    )]
    Article,

    #[sea_orm(has_many = "super::evaluation::Entity")]
    Evaluations,

    #[sea_orm(has_many = "super::comment::Entity")]
    Comments,

    #[sea_orm(has_many = "super::checklist_answer::Entity")]
    ChecklistAnswers,
}

impl Related<super::article::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Article.def()
    }
}

impl Related<super::evaluation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Evaluations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
