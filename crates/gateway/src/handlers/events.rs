//! Event management handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::handlers::Pagination;
use crate::AppState;
use symposium_common::{
    auth::AuthContext,
    db::{models::Event, Repository},
    errors::{AppError, Result},
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateEventRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,

    #[validate(length(max = 10000))]
    pub description: Option<String>,

    pub starts_at: Option<chrono::DateTime<chrono::Utc>>,

    pub ends_at: Option<chrono::DateTime<chrono::Utc>>,

    pub banner_ref: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateEventRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,

    #[validate(length(max = 10000))]
    pub description: Option<String>,

    pub starts_at: Option<chrono::DateTime<chrono::Utc>>,

    pub ends_at: Option<chrono::DateTime<chrono::Utc>>,

    pub banner_ref: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AssignEvaluatorsRequest {
    pub user_ids: Vec<Uuid>,
}

#[derive(Serialize)]
pub struct EventResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub starts_at: Option<String>,
    pub ends_at: Option<String>,
    pub banner_ref: Option<String>,
    pub created_at: String,
}

impl From<Event> for EventResponse {
    fn from(event: Event) -> Self {
        Self {
            id: event.id,
            name: event.name,
            description: event.description,
            starts_at: event.starts_at.map(|dt| dt.to_rfc3339()),
            ends_at: event.ends_at.map(|dt| dt.to_rfc3339()),
            banner_ref: event.banner_ref,
            created_at: event.created_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
pub struct EventListResponse {
    pub events: Vec<EventResponse>,
    pub total: u64,
}

/// Create an event (coordinator only)
pub async fn create_event(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(request): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<EventResponse>)> {
    auth.require_coordinator()?;
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    if let (Some(starts), Some(ends)) = (request.starts_at, request.ends_at) {
        if ends < starts {
            return Err(AppError::Validation {
                message: "O término do evento não pode anteceder o início".to_string(),
                field: Some("ends_at".to_string()),
            });
        }
    }

    let repo = Repository::new(state.db.clone());
    let event = repo
        .create_event(
            request.name,
            request.description,
            request.starts_at,
            request.ends_at,
            request.banner_ref,
        )
        .await?;

    tracing::info!(event_id = %event.id, created_by = %auth.user_id, "Event created");

    Ok((StatusCode::CREATED, Json(event.into())))
}

/// List events, newest first
pub async fn list_events(
    State(state): State<AppState>,
    _auth: AuthContext,
    Query(page): Query<Pagination>,
) -> Result<Json<EventListResponse>> {
    let repo = Repository::new(state.db.clone());
    let (events, total) = repo.list_events(page.offset, page.limit()).await?;

    Ok(Json(EventListResponse {
        events: events.into_iter().map(Into::into).collect(),
        total,
    }))
}

/// Get a single event
pub async fn get_event(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(event_id): Path<Uuid>,
) -> Result<Json<EventResponse>> {
    let repo = Repository::new(state.db.clone());

    let event = repo
        .find_event_by_id(event_id)
        .await?
        .ok_or_else(|| AppError::EventNotFound {
            id: event_id.to_string(),
        })?;

    Ok(Json(event.into()))
}

/// Update an event (coordinator only). Absent fields keep their value.
pub async fn update_event(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(event_id): Path<Uuid>,
    Json(request): Json<UpdateEventRequest>,
) -> Result<Json<EventResponse>> {
    auth.require_coordinator()?;
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let repo = Repository::new(state.db.clone());
    let event = repo
        .update_event(
            event_id,
            request.name,
            request.description.map(Some),
            request.starts_at.map(Some),
            request.ends_at.map(Some),
            request.banner_ref.map(Some),
        )
        .await?;

    tracing::info!(event_id = %event_id, updated_by = %auth.user_id, "Event updated");

    Ok(Json(event.into()))
}

/// Delete an event and everything submitted to it (coordinator only)
pub async fn delete_event(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(event_id): Path<Uuid>,
) -> Result<StatusCode> {
    auth.require_coordinator()?;

    let repo = Repository::new(state.db.clone());

    if !repo.delete_event(event_id).await? {
        return Err(AppError::EventNotFound {
            id: event_id.to_string(),
        });
    }

    tracing::info!(event_id = %event_id, deleted_by = %auth.user_id, "Event deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Assign evaluators to an event in bulk (coordinator only)
pub async fn assign_evaluators(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(event_id): Path<Uuid>,
    Json(request): Json<AssignEvaluatorsRequest>,
) -> Result<StatusCode> {
    auth.require_coordinator()?;

    if request.user_ids.is_empty() {
        return Err(AppError::Validation {
            message: "Informe ao menos um avaliador".to_string(),
            field: Some("user_ids".to_string()),
        });
    }

    let repo = Repository::new(state.db.clone());

    repo.find_event_by_id(event_id)
        .await?
        .ok_or_else(|| AppError::EventNotFound {
            id: event_id.to_string(),
        })?;

    // Every assignee must exist and hold the evaluator role
    for &user_id in &request.user_ids {
        repo.find_user_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::UserNotFound {
                id: user_id.to_string(),
            })?;

        let roles = repo.user_roles(user_id).await?;
        if !roles.can_evaluate() {
            return Err(AppError::Validation {
                message: format!("Usuário {} não possui perfil de avaliador", user_id),
                field: Some("user_ids".to_string()),
            });
        }
    }

    repo.assign_event_evaluators(event_id, &request.user_ids)
        .await?;

    tracing::info!(
        event_id = %event_id,
        count = request.user_ids.len(),
        assigned_by = %auth.user_id,
        "Evaluators assigned to event"
    );

    Ok(StatusCode::NO_CONTENT)
}
