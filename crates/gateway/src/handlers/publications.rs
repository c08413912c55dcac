//! Public listing of approved articles
//!
//! The only unauthenticated article surface. Approved articles are public
//! with full author identity; the review trail stays private.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::handlers::Pagination;
use crate::AppState;
use symposium_common::{db::Repository, errors::Result};

#[derive(Serialize)]
pub struct PublicationResponse {
    pub id: Uuid,
    pub event_id: Uuid,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub thematic_area: String,
    pub keywords: Vec<String>,
    pub authors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_ref: Option<String>,
    pub published_at: String,
}

#[derive(Serialize)]
pub struct PublicationListResponse {
    pub publications: Vec<PublicationResponse>,
    pub total: u64,
}

/// List approved articles, most recently approved first
pub async fn list_publications(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> Result<Json<PublicationListResponse>> {
    let repo = Repository::new(state.db.clone());

    let (articles, total) = repo.list_publications(page.offset, page.limit()).await?;

    let mut publications = Vec::with_capacity(articles.len());
    for article in articles {
        let keywords = repo.article_keywords(article.id).await?;
        let authors = repo.article_authors(article.id).await?;
        let latest = repo.latest_version_for_article(article.id).await?;

        publications.push(PublicationResponse {
            id: article.id,
            event_id: article.event_id,
            title: article.title,
            abstract_text: article.abstract_text,
            thematic_area: article.thematic_area,
            keywords,
            authors: authors.into_iter().map(|u| u.name).collect(),
            pdf_ref: latest.map(|v| v.pdf_ref),
            published_at: article.updated_at.to_rfc3339(),
        });
    }

    Ok(Json(PublicationListResponse { publications, total }))
}
