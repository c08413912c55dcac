//! Error types for Symposium services
//!
//! Provides a comprehensive error handling system with:
//! - Distinct error types for different failure modes
//! - HTTP status code mapping
//! - Structured error responses
//! - Error codes for client handling
//!
//! Conflict-class errors (duplicate evaluation, email already in use) map to
//! 400, matching the contract the frontend was built against. Permission
//! failures return a generic message so a denied caller cannot infer who
//! else is attached to an article.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (1xxx)
    ValidationError,
    InvalidFormat,

    // Authentication errors (2xxx)
    Unauthorized,
    InvalidCredentials,
    InvalidToken,
    ExpiredToken,

    // Authorization errors (3xxx)
    Forbidden,
    SelfReview,

    // Resource errors (4xxx)
    NotFound,
    ArticleNotFound,
    VersionNotFound,
    EventNotFound,
    UserNotFound,
    ChecklistNotFound,
    StatusNotFound,

    // Conflict errors (5xxx)
    DuplicateEvaluation,
    EmailInUse,

    // Lifecycle errors (6xxx)
    InvalidTransition,

    // Database errors (7xxx)
    DatabaseError,
    ConnectionError,
    CorruptVersionLabel,

    // Storage errors (8xxx)
    StorageError,

    // Internal errors (9xxx)
    InternalError,
    ConfigurationError,
    SerializationError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            // Validation (1xxx)
            ErrorCode::ValidationError => 1001,
            ErrorCode::InvalidFormat => 1002,

            // Auth (2xxx)
            ErrorCode::Unauthorized => 2001,
            ErrorCode::InvalidCredentials => 2002,
            ErrorCode::InvalidToken => 2003,
            ErrorCode::ExpiredToken => 2004,

            // Authz (3xxx)
            ErrorCode::Forbidden => 3001,
            ErrorCode::SelfReview => 3002,

            // Resources (4xxx)
            ErrorCode::NotFound => 4001,
            ErrorCode::ArticleNotFound => 4002,
            ErrorCode::VersionNotFound => 4003,
            ErrorCode::EventNotFound => 4004,
            ErrorCode::UserNotFound => 4005,
            ErrorCode::ChecklistNotFound => 4006,
            ErrorCode::StatusNotFound => 4007,

            // Conflicts (5xxx)
            ErrorCode::DuplicateEvaluation => 5001,
            ErrorCode::EmailInUse => 5002,

            // Lifecycle (6xxx)
            ErrorCode::InvalidTransition => 6001,

            // Database (7xxx)
            ErrorCode::DatabaseError => 7001,
            ErrorCode::ConnectionError => 7002,
            ErrorCode::CorruptVersionLabel => 7003,

            // Storage (8xxx)
            ErrorCode::StorageError => 8001,

            // Internal (9xxx)
            ErrorCode::InternalError => 9001,
            ErrorCode::ConfigurationError => 9002,
            ErrorCode::SerializationError => 9003,
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    #[error("Invalid format: {message}")]
    InvalidFormat { message: String },

    // Authentication errors
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("E-mail ou senha incorretos")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    ExpiredToken,

    // Authorization errors
    #[error("Você não tem permissão para acessar este recurso")]
    Forbidden,

    #[error("Você não pode avaliar seus próprios artigos")]
    SelfReview,

    // Resource errors
    #[error("Resource not found: {resource_type} with id {id}")]
    NotFound { resource_type: String, id: String },

    #[error("Artigo não encontrado")]
    ArticleNotFound { id: String },

    #[error("Versão do artigo não encontrada")]
    VersionNotFound { id: String },

    #[error("Evento não encontrado")]
    EventNotFound { id: String },

    #[error("Usuário não encontrado")]
    UserNotFound { id: String },

    #[error("Checklist não encontrado")]
    ChecklistNotFound { id: String },

    #[error("Status inválido")]
    StatusNotFound { id: i16 },

    // Conflict errors
    #[error("Você já avaliou esta versão do artigo")]
    DuplicateEvaluation,

    #[error("E-mail já cadastrado")]
    EmailInUse,

    // Lifecycle errors
    #[error("Transição de status inválida: {message}")]
    InvalidTransition { message: String },

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Database connection error: {message}")]
    DatabaseConnection { message: String },

    #[error("Corrupt version label {label:?} on article {article_id}")]
    CorruptVersionLabel { article_id: String, label: String },

    // Storage errors
    #[error("File storage error: {message}")]
    Storage { message: String },

    // Internal errors
    #[error("Internal server error: {message}")]
    Internal { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { .. } => ErrorCode::ValidationError,
            AppError::InvalidFormat { .. } => ErrorCode::InvalidFormat,
            AppError::Unauthorized { .. } => ErrorCode::Unauthorized,
            AppError::InvalidCredentials => ErrorCode::InvalidCredentials,
            AppError::InvalidToken => ErrorCode::InvalidToken,
            AppError::ExpiredToken => ErrorCode::ExpiredToken,
            AppError::Forbidden => ErrorCode::Forbidden,
            AppError::SelfReview => ErrorCode::SelfReview,
            AppError::NotFound { .. } => ErrorCode::NotFound,
            AppError::ArticleNotFound { .. } => ErrorCode::ArticleNotFound,
            AppError::VersionNotFound { .. } => ErrorCode::VersionNotFound,
            AppError::EventNotFound { .. } => ErrorCode::EventNotFound,
            AppError::UserNotFound { .. } => ErrorCode::UserNotFound,
            AppError::ChecklistNotFound { .. } => ErrorCode::ChecklistNotFound,
            AppError::StatusNotFound { .. } => ErrorCode::StatusNotFound,
            AppError::DuplicateEvaluation => ErrorCode::DuplicateEvaluation,
            AppError::EmailInUse => ErrorCode::EmailInUse,
            AppError::InvalidTransition { .. } => ErrorCode::InvalidTransition,
            AppError::Database(_) => ErrorCode::DatabaseError,
            AppError::DatabaseConnection { .. } => ErrorCode::ConnectionError,
            AppError::CorruptVersionLabel { .. } => ErrorCode::CorruptVersionLabel,
            AppError::Storage { .. } => ErrorCode::StorageError,
            AppError::Internal { .. } => ErrorCode::InternalError,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
            AppError::Serialization(_) => ErrorCode::SerializationError,
            AppError::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::Validation { .. }
            | AppError::InvalidFormat { .. }
            | AppError::DuplicateEvaluation
            | AppError::EmailInUse
            | AppError::SelfReview
            | AppError::InvalidTransition { .. } => StatusCode::BAD_REQUEST,

            // 401 Unauthorized
            AppError::Unauthorized { .. }
            | AppError::InvalidCredentials
            | AppError::InvalidToken
            | AppError::ExpiredToken => StatusCode::UNAUTHORIZED,

            // 403 Forbidden
            AppError::Forbidden => StatusCode::FORBIDDEN,

            // 404 Not Found
            AppError::NotFound { .. }
            | AppError::ArticleNotFound { .. }
            | AppError::VersionNotFound { .. }
            | AppError::EventNotFound { .. }
            | AppError::UserNotFound { .. }
            | AppError::ChecklistNotFound { .. }
            | AppError::StatusNotFound { .. } => StatusCode::NOT_FOUND,

            // 500 Internal Server Error
            AppError::Database(_)
            | AppError::DatabaseConnection { .. }
            | AppError::CorruptVersionLabel { .. }
            | AppError::Storage { .. }
            | AppError::Internal { .. }
            | AppError::Configuration { .. }
            | AppError::Serialization(_)
            | AppError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Check if this error should be logged at error level
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Check if this error is a client error
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// The message sent to the client.
    ///
    /// Server-side failures get a generic body; the original error text is
    /// logged and must not leak to the client.
    fn client_message(&self) -> String {
        if self.is_server_error() {
            "Erro interno do servidor".to_string()
        } else {
            self.to_string()
        }
    }
}

/// Structured error response for API
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        // Log based on severity
        if self.is_server_error() {
            tracing::error!(
                error = %self,
                code = ?code,
                status = status.as_u16(),
                "Server error"
            );
        } else if self.is_client_error() {
            tracing::warn!(
                error = %self,
                code = ?code,
                status = status.as_u16(),
                "Client error"
            );
        }

        let body = ErrorResponse {
            error: ErrorDetails {
                code,
                message: self.client_message(),
                request_id: None, // Filled by middleware
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_mapping() {
        let err = AppError::ArticleNotFound { id: "test".into() };
        assert_eq!(err.code(), ErrorCode::ArticleNotFound);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_conflict_maps_to_bad_request() {
        // Legacy API contract: duplicate submissions are 400, not 409
        assert_eq!(
            AppError::DuplicateEvaluation.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::EmailInUse.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::SelfReview.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_forbidden_is_generic() {
        let err = AppError::Forbidden;
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        // Message never reveals which relationship check failed
        assert!(!err.to_string().contains("autor"));
        assert!(!err.to_string().contains("avaliador"));
    }

    #[test]
    fn test_server_error_message_is_generic() {
        let err = AppError::Internal {
            message: "connection pool exhausted at 10.0.0.3".into(),
        };
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.is_server_error());
        assert!(!err.client_message().contains("10.0.0.3"));
    }

    #[test]
    fn test_corrupt_label_is_integrity_error() {
        let err = AppError::CorruptVersionLabel {
            article_id: "a".into(),
            label: "one.zero".into(),
        };
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
