//! Sistema de manejo de errores
//!
//! Este módulo define todos los tipos de errores del sistema
//! y su conversión a respuestas HTTP apropiadas.

use std::borrow::Cow;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::services::report_workflow::WorkflowState;

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Cannot {operation} while {state}")]
    InvalidTransition {
        operation: &'static str,
        state: WorkflowState,
    },

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("A submission is already in progress for this session")]
    SubmissionInProgress,

    #[error("Too many open report sessions")]
    SessionLimitReached,
}

impl AppError {
    /// Código estable que viaja en el cuerpo de error
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Conflict(_) => "CONFLICT",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            AppError::InvalidTransition { .. } => "INVALID_TRANSITION",
            AppError::InvariantViolation(_) => "INTERNAL_ERROR",
            AppError::SubmissionInProgress => "SUBMISSION_IN_PROGRESS",
            AppError::SessionLimitReached => "SESSION_LIMIT_REACHED",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::InvalidTransition { .. } => StatusCode::CONFLICT,
            AppError::InvariantViolation(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::SubmissionInProgress => StatusCode::CONFLICT,
            AppError::SessionLimitReached => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// `false` cuando la instancia del flujo ya no sirve y hay que empezar otra
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, AppError::InvariantViolation(_))
    }
}

/// Respuesta de error para la API
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = Some(self.code().to_string());

        let error_response = match self {
            AppError::Validation(e) => {
                warn!("Validation error: {}", e);
                ErrorResponse {
                    error: "Validation Error".to_string(),
                    message: "The provided data is invalid".to_string(),
                    details: Some(json!(e)),
                    code,
                }
            }

            AppError::Conflict(msg) => {
                warn!("Conflict: {}", msg);
                ErrorResponse {
                    error: "Conflict".to_string(),
                    message: msg,
                    details: None,
                    code,
                }
            }

            AppError::NotFound(msg) => {
                warn!("Resource not found: {}", msg);
                ErrorResponse {
                    error: "Not Found".to_string(),
                    message: msg,
                    details: None,
                    code,
                }
            }

            AppError::StoreUnavailable(msg) => {
                error!("Store unavailable: {}", msg);
                ErrorResponse {
                    error: "Store Unavailable".to_string(),
                    message: "The vehicle store is temporarily unavailable. Please try again".to_string(),
                    details: Some(json!({ "store_error": msg })),
                    code,
                }
            }

            AppError::InvalidTransition { operation, state } => {
                let message = format!("Cannot {} while {}", operation, state);
                warn!("Invalid workflow transition: {}", message);
                ErrorResponse {
                    error: "Invalid Transition".to_string(),
                    message,
                    details: Some(json!({ "state": state })),
                    code,
                }
            }

            AppError::InvariantViolation(msg) => {
                error!("Invariant violation: {}", msg);
                ErrorResponse {
                    error: "Internal Server Error".to_string(),
                    message: "The report session is no longer usable. Please start over".to_string(),
                    details: Some(json!({ "internal_error": msg })),
                    code,
                }
            }

            AppError::SubmissionInProgress => {
                warn!("Submission already in progress");
                ErrorResponse {
                    error: "Submission In Progress".to_string(),
                    message: "A previous submission is still being processed".to_string(),
                    details: None,
                    code,
                }
            }

            AppError::SessionLimitReached => {
                warn!("Report session limit reached");
                ErrorResponse {
                    error: "Session Limit Reached".to_string(),
                    message: "Too many report sessions are open. Please try again later".to_string(),
                    details: None,
                    code,
                }
            }
        };

        (status, Json(error_response)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
                // unique_violation
                Some("23505") => AppError::Conflict(format!(
                    "duplicate value violates {}",
                    db_err.constraint().unwrap_or("a unique constraint")
                )),
                // foreign_key_violation
                Some("23503") => AppError::NotFound(format!(
                    "referenced record does not exist ({})",
                    db_err.constraint().unwrap_or("foreign key")
                )),
                _ => AppError::StoreUnavailable(err.to_string()),
            },
            sqlx::Error::RowNotFound => AppError::NotFound("record not found".to_string()),
            _ => AppError::StoreUnavailable(err.to_string()),
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::StoreUnavailable(err.to_string())
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;

/// Función helper para crear errores de validación
pub fn validation_error(field: &'static str, message: impl Into<Cow<'static, str>>) -> AppError {
    use validator::ValidationError;

    let mut error = ValidationError::new("custom");
    error.message = Some(message.into());

    let mut errors = validator::ValidationErrors::new();
    errors.add(field, error);

    AppError::Validation(errors)
}

/// Función helper para crear errores de recurso no encontrado
pub fn not_found_error(resource: &str, id: &str) -> AppError {
    AppError::NotFound(format!("{} with id '{}' not found", resource, id))
}

/// Función helper para crear errores de conflicto
pub fn conflict_error(resource: &str, field: &str, value: &str) -> AppError {
    AppError::Conflict(format!("{} with {} '{}' already exists", resource, field, value))
}
