use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt::Display;

use crate::directory::domains::DomainError;
use crate::provisioning::ProvisionError;
use crate::tenancy::{MigrationError, SchemaError};

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthorized")
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "resource not found")
    }

    pub fn internal<E: Display>(error: E) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, error.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status;
        let body = Json(ErrorResponse {
            error: self.message,
        });
        (status, body).into_response()
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl From<diesel::result::Error> for AppError {
    fn from(value: diesel::result::Error) -> Self {
        match value {
            diesel::result::Error::NotFound => AppError::not_found(),
            _ => AppError::internal(value),
        }
    }
}

impl From<ProvisionError> for AppError {
    fn from(value: ProvisionError) -> Self {
        match value {
            ProvisionError::Validation(message) => AppError::bad_request(message),
            ProvisionError::Schema(SchemaError::AlreadyExists(schema)) => {
                AppError::conflict(format!("schema {schema:?} already exists"))
            }
            ProvisionError::Schema(SchemaError::InvalidName(name)) => {
                AppError::bad_request(format!("schema name {name:?} is not a valid identifier"))
            }
            other => AppError::internal(other),
        }
    }
}

impl From<SchemaError> for AppError {
    fn from(value: SchemaError) -> Self {
        match value {
            SchemaError::InvalidName(name) => {
                AppError::bad_request(format!("schema name {name:?} is not a valid identifier"))
            }
            SchemaError::AlreadyExists(schema) => {
                AppError::conflict(format!("schema {schema:?} already exists"))
            }
            SchemaError::Database(err) => AppError::from(err),
        }
    }
}

impl From<MigrationError> for AppError {
    fn from(value: MigrationError) -> Self {
        AppError::internal(value)
    }
}

impl From<DomainError> for AppError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::IsPrimary | DomainError::StillBound => {
                AppError::conflict(value.to_string())
            }
            DomainError::Database(err) => AppError::from(err),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(value: jsonwebtoken::errors::Error) -> Self {
        AppError::internal(value)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(value: anyhow::Error) -> Self {
        AppError::internal(value)
    }
}
