//! SeaORM entity models
//!
//! Database entities for the Symposium review portal

mod article;
mod article_author;
mod article_keyword;
mod article_version;
mod checklist;
mod checklist_answer;
mod checklist_question;
mod comment;
mod evaluation;
mod event;
mod event_evaluator;
mod user;
mod user_role;

pub use article::{
    ActiveModel as ArticleActiveModel, ArticleStatus, Column as ArticleColumn,
    Entity as ArticleEntity, Model as Article,
};

pub use article_author::{
    ActiveModel as ArticleAuthorActiveModel, Column as ArticleAuthorColumn,
    Entity as ArticleAuthorEntity, Model as ArticleAuthor,
};

pub use article_keyword::{
    ActiveModel as ArticleKeywordActiveModel, Column as ArticleKeywordColumn,
    Entity as ArticleKeywordEntity, Model as ArticleKeyword,
};

pub use article_version::{
    ActiveModel as ArticleVersionActiveModel, Column as ArticleVersionColumn,
    Entity as ArticleVersionEntity, Model as ArticleVersion,
};

pub use checklist::{
    ActiveModel as ChecklistActiveModel, Column as ChecklistColumn, Entity as ChecklistEntity,
    Model as Checklist,
};

pub use checklist_answer::{
    ActiveModel as ChecklistAnswerActiveModel, Column as ChecklistAnswerColumn,
    Entity as ChecklistAnswerEntity, Model as ChecklistAnswer,
};

pub use checklist_question::{
    ActiveModel as ChecklistQuestionActiveModel, Column as ChecklistQuestionColumn,
    Entity as ChecklistQuestionEntity, Model as ChecklistQuestion,
};

pub use comment::{
    ActiveModel as CommentActiveModel, Column as CommentColumn, Entity as CommentEntity,
    Model as Comment,
};

pub use evaluation::{
    ActiveModel as EvaluationActiveModel, Column as EvaluationColumn, Entity as EvaluationEntity,
    Model as Evaluation, Verdict,
};

pub use event::{
    ActiveModel as EventActiveModel, Column as EventColumn, Entity as EventEntity, Model as Event,
};

pub use event_evaluator::{
    ActiveModel as EventEvaluatorActiveModel, Column as EventEvaluatorColumn,
    Entity as EventEvaluatorEntity, Model as EventEvaluator,
};

pub use user::{
    ActiveModel as UserActiveModel, Column as UserColumn, Entity as UserEntity, Model as User,
};

pub use user_role::{
    ActiveModel as UserRoleActiveModel, Column as UserRoleColumn, Entity as UserRoleEntity,
    Model as UserRole,
};
