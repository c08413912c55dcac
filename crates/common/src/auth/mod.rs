//! Authentication and authorization utilities
//!
//! Provides:
//! - Password hashing (argon2)
//! - JWT token generation and validation
//! - Caller context extraction with a typed role set

use crate::errors::{AppError, Result};
use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Global roles a user can hold. A user may hold several at once; an
/// author on one article can be an evaluator on another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Coordinator,
    Evaluator,
    Author,
}

impl Role {
    /// Numeric id as stored in the database
    pub fn id(self) -> i16 {
        match self {
            Role::Coordinator => 1,
            Role::Evaluator => 2,
            Role::Author => 3,
        }
    }

    /// Resolve a stored numeric id
    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            1 => Some(Role::Coordinator),
            2 => Some(Role::Evaluator),
            3 => Some(Role::Author),
            _ => None,
        }
    }
}

/// The set of roles held by a user, with capability-check helpers so role
/// logic never leaks numeric literals into handlers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSet(Vec<Role>);

impl RoleSet {
    pub fn new(roles: impl IntoIterator<Item = Role>) -> Self {
        let mut roles: Vec<Role> = roles.into_iter().collect();
        roles.sort();
        roles.dedup();
        Self(roles)
    }

    /// Build from stored numeric ids, skipping unknown values
    pub fn from_ids(ids: impl IntoIterator<Item = i16>) -> Self {
        Self::new(ids.into_iter().filter_map(Role::from_id))
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    pub fn is_coordinator(&self) -> bool {
        self.contains(Role::Coordinator)
    }

    /// Evaluation capability is a global role check; coordinators evaluate too
    pub fn can_evaluate(&self) -> bool {
        self.contains(Role::Evaluator) || self.contains(Role::Coordinator)
    }

    pub fn is_author(&self) -> bool {
        self.contains(Role::Author)
    }

    pub fn ids(&self) -> Vec<i16> {
        self.0.iter().map(|r| r.id()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        self.0.iter().copied()
    }
}

/// Extracted authentication context available to handlers.
///
/// Identity is resolved upstream (JWT); the service trusts it completely.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Authenticated user
    pub user_id: Uuid,

    /// Roles held globally by the user
    pub roles: RoleSet,

    /// Request ID for tracing
    pub request_id: String,
}

impl AuthContext {
    /// Require the coordinator role
    pub fn require_coordinator(&self) -> Result<()> {
        if self.roles.is_coordinator() {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }

    /// Require evaluation capability
    pub fn require_evaluator(&self) -> Result<()> {
        if self.roles.can_evaluate() {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (user ID)
    pub sub: String,

    /// Role ids held by the user
    #[serde(default)]
    pub roles: Vec<i16>,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,
}

/// JWT token manager
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiration_secs: i64,
}

impl JwtManager {
    /// Create a new JWT manager with the given secret
    pub fn new(secret: &str, expiration_secs: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiration_secs: expiration_secs as i64,
        }
    }

    /// Generate a new JWT token for a user
    pub fn generate_token(&self, user_id: Uuid, roles: &RoleSet) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.expiration_secs);

        let claims = JwtClaims {
            sub: user_id.to_string(),
            roles: roles.ids(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            AppError::Internal {
                message: format!("Failed to generate token: {}", e),
            }
        })
    }

    /// Validate and decode a JWT token
    pub fn validate_token(&self, token: &str) -> Result<JwtClaims> {
        decode::<JwtClaims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::ExpiredToken,
                _ => AppError::InvalidToken,
            })
    }
}

/// Hash a password for storage
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal {
            message: format!("Failed to hash password: {}", e),
        })
}

/// Verify a password against a stored hash
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// Extract a bearer token from an Authorization header
pub fn extract_bearer(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ")
}

/// Axum extractor for AuthContext
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
    Arc<JwtManager>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        // Extract request ID
        let request_id = parts
            .headers
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .map(String::from)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized {
                message: "Missing Authorization header".to_string(),
            })?;

        let token = extract_bearer(auth_header).ok_or_else(|| AppError::Unauthorized {
            message: "Authorization header is not a bearer token".to_string(),
        })?;

        let jwt = Arc::<JwtManager>::from_ref(state);
        let claims = jwt.validate_token(token)?;

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::InvalidToken)?;

        Ok(AuthContext {
            user_id,
            roles: RoleSet::from_ids(claims.roles),
            request_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_ids_roundtrip() {
        for role in [Role::Coordinator, Role::Evaluator, Role::Author] {
            assert_eq!(Role::from_id(role.id()), Some(role));
        }
        assert_eq!(Role::from_id(99), None);
    }

    #[test]
    fn test_role_set_capabilities() {
        let coordinator = RoleSet::new([Role::Coordinator]);
        assert!(coordinator.is_coordinator());
        assert!(coordinator.can_evaluate());

        let evaluator = RoleSet::new([Role::Evaluator]);
        assert!(!evaluator.is_coordinator());
        assert!(evaluator.can_evaluate());

        let author = RoleSet::new([Role::Author]);
        assert!(!author.can_evaluate());
        assert!(author.is_author());
    }

    #[test]
    fn test_role_set_dedups_unknown_ids() {
        let roles = RoleSet::from_ids([2, 2, 3, 42]);
        assert_eq!(roles.ids(), vec![2, 3]);
    }

    #[test]
    fn test_password_roundtrip() {
        let hash = hash_password("s3nh4-forte").unwrap();
        assert!(verify_password("s3nh4-forte", &hash));
        assert!(!verify_password("errada", &hash));
    }

    #[test]
    fn test_extract_bearer() {
        assert_eq!(extract_bearer("Bearer abc.def"), Some("abc.def"));
        assert_eq!(extract_bearer("Basic abc"), None);
    }

    #[test]
    fn test_jwt_roundtrip() {
        let manager = JwtManager::new("test_secret", 3600);

        let user_id = Uuid::new_v4();
        let roles = RoleSet::new([Role::Author, Role::Evaluator]);

        let token = manager.generate_token(user_id, &roles).unwrap();
        let claims = manager.validate_token(&token).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(RoleSet::from_ids(claims.roles), roles);
    }

    #[test]
    fn test_invalid_token_rejected() {
        let manager = JwtManager::new("test_secret", 3600);
        let other = JwtManager::new("other_secret", 3600);

        let token = other
            .generate_token(Uuid::new_v4(), &RoleSet::default())
            .unwrap();
        assert!(matches!(
            manager.validate_token(&token),
            Err(AppError::InvalidToken)
        ));
    }
}
