//! User management handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::handlers::Pagination;
use crate::AppState;
use symposium_common::{
    auth::{AuthContext, RoleSet},
    db::{models::User, Repository},
    errors::{AppError, Result},
};

/// Public projection of a user account
#[derive(Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub roles: Vec<i16>,
    pub created_at: String,
}

impl UserResponse {
    pub fn new(user: User, roles: &RoleSet) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            roles: roles.ids(),
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
pub struct UserListResponse {
    pub users: Vec<UserResponse>,
    pub total: u64,
}

/// List all accounts (coordinator only)
pub async fn list_users(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(page): Query<Pagination>,
) -> Result<Json<UserListResponse>> {
    auth.require_coordinator()?;

    let repo = Repository::new(state.db.clone());
    let (users, total) = repo.list_users(page.offset, page.limit()).await?;

    let mut out = Vec::with_capacity(users.len());
    for user in users {
        let roles = repo.user_roles(user.id).await?;
        out.push(UserResponse::new(user, &roles));
    }

    Ok(Json(UserListResponse { users: out, total }))
}

/// Get one account; users can read themselves, coordinators anyone
pub async fn get_user(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserResponse>> {
    if user_id != auth.user_id {
        auth.require_coordinator()?;
    }

    let repo = Repository::new(state.db.clone());

    let user = repo
        .find_user_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::UserNotFound {
            id: user_id.to_string(),
        })?;

    let roles = repo.user_roles(user_id).await?;

    Ok(Json(UserResponse::new(user, &roles)))
}

/// Delete an account (coordinator only)
pub async fn delete_user(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode> {
    auth.require_coordinator()?;

    let repo = Repository::new(state.db.clone());

    if !repo.delete_user(user_id).await? {
        return Err(AppError::UserNotFound {
            id: user_id.to_string(),
        });
    }

    tracing::info!(user_id = %user_id, deleted_by = %auth.user_id, "User deleted");

    Ok(StatusCode::NO_CONTENT)
}
