//! Checklist answer entity
//!
//! Binds a question to a specific article version. The legacy "Sim"/"Não"
//! strings are a real boolean here.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "checklist_answers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub question_id: Uuid,

    pub version_id: Uuid,

    pub answer: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::checklist_question::Entity",
        from = "Column::QuestionId",
        to = "super::checklist_question::Column::Id"
    )]
    Question,

    #[sea_orm(
        belongs_to = "super::article_version::Entity",
        from = "Column::VersionId",
        to = "super::article_version::Column::Id"
    )]
    Version,
}

impl Related<super::checklist_question::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Question.def()
    }
}

impl Related<super::article_version::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Version.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
