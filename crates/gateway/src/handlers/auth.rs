//! Account registration and login handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::handlers::users::UserResponse;
use crate::AppState;
use symposium_common::{
    auth::{hash_password, verify_password, Role, RoleSet},
    db::Repository,
    errors::{AppError, Result},
};

/// Request to register a new account
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,

    #[validate(email)]
    pub email: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,

    /// Role ids; defaults to author when empty
    #[serde(default)]
    pub roles: Vec<i16>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in_secs: u64,
    pub user: UserResponse,
}

/// Register a new account
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let roles = if request.roles.is_empty() {
        RoleSet::new([Role::Author])
    } else {
        let mut parsed = Vec::with_capacity(request.roles.len());
        for id in &request.roles {
            parsed.push(Role::from_id(*id).ok_or_else(|| AppError::Validation {
                message: format!("Perfil desconhecido: {}", id),
                field: Some("roles".to_string()),
            })?);
        }
        RoleSet::new(parsed)
    };

    let password_hash = hash_password(&request.password)?;

    let repo = Repository::new(state.db.clone());
    let user = repo
        .create_user(request.name, request.email, password_hash, roles.clone())
        .await?;

    tracing::info!(user_id = %user.id, "Account registered");

    Ok((StatusCode::CREATED, Json(UserResponse::new(user, &roles))))
}

/// Exchange credentials for a bearer token
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let repo = Repository::new(state.db.clone());

    // Same error whether the account is missing or the password is wrong
    let user = repo
        .find_user_by_email(&request.email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !verify_password(&request.password, &user.password_hash) {
        return Err(AppError::InvalidCredentials);
    }

    let roles = repo.user_roles(user.id).await?;
    let token = state.jwt.generate_token(user.id, &roles)?;

    tracing::info!(user_id = %user.id, "Login succeeded");

    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_in_secs: state.config.auth.jwt_expiration_secs,
        user: UserResponse::new(user, &roles),
    }))
}
