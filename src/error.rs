//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Failure reported by the persistence collaborator.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("unknown entity: {0}")]
    UnknownEntity(String),
    #[error("constraint violation: {0}")]
    Constraint(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
}

/// Outcome of a record or field validator.
///
/// `Rejected` is a normal validation failure and is collected into the report.
/// `Internal` means the validator itself broke; it is never collected and aborts the request.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{0}")]
    Rejected(String),
    #[error("validator failure: {0}")]
    Internal(String),
}

impl ValidationError {
    pub fn rejected(message: impl Into<String>) -> Self {
        ValidationError::Rejected(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ValidationError::Internal(message.into())
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config load: {0}")]
    Load(String),
    #[error("invalid setting {key}: '{value}'")]
    InvalidSetting { key: &'static str, value: String },
    #[error("invalid rule for {field}: {reason}")]
    InvalidRule { field: String, reason: String },
}

/// One entry of a validation report. `field` is absent for whole-record failures.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FieldError {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
}

impl FieldError {
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        FieldError {
            field: Some(field.into()),
            message: message.into(),
        }
    }

    pub fn record(message: impl Into<String>) -> Self {
        FieldError {
            field: None,
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation Error")]
    ValidationFailed(Vec<FieldError>),
    #[error("schema lookup: {0}")]
    SchemaLookup(String),
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Persistence(#[from] StoreError),
    #[error("validator for {target} failed: {reason}")]
    Validator { target: String, reason: String },
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    pub fn unknown_entity(entity: &str) -> Self {
        AppError::SchemaLookup(format!("unknown entity '{}'", entity))
    }

    pub fn unknown_field(entity: &str, field: &str) -> Self {
        AppError::SchemaLookup(format!("entity '{}' has no field '{}'", entity, field))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationFailed(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidIdentifier(_) => StatusCode::BAD_REQUEST,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::SchemaLookup(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validator { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            AppError::ValidationFailed(errors) => ErrorBody {
                message: "Validation Error".to_string(),
                errors: Some(errors),
            },
            other if status.is_server_error() => {
                tracing::error!(error = %other, "request failed");
                ErrorBody {
                    message: "Internal Server Error".to_string(),
                    errors: None,
                }
            }
            other => ErrorBody {
                message: other.to_string(),
                errors: None,
            },
        };
        (status, Json(body)).into_response()
    }
}
