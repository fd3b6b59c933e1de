use std::fmt;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{error, warn};

use crate::auth::AuthError;
use crate::repository::EventError;
use crate::store::StoreError;
use crate::utils::response::error as error_response;

/// The request being served when an internal failure happened. Only this
/// label reaches the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    FetchEvents,
    FetchEvent,
    CreateEvent,
    JoinEvent,
    FetchCreatedEvents,
    FetchJoinedEvents,
    UpdateEvent,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Operation::FetchEvents => "fetching events",
            Operation::FetchEvent => "fetching event",
            Operation::CreateEvent => "creating event",
            Operation::JoinEvent => "joining event",
            Operation::FetchCreatedEvents => "fetching created events",
            Operation::FetchJoinedEvents => "fetching joined events",
            Operation::UpdateEvent => "updating event",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Authentication error: {0}")]
    AuthError(#[from] AuthError),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Store error while {operation}")]
    StoreError {
        operation: Operation,
        #[source]
        source: StoreError,
    },
}

impl AppError {
    /// Maps repository failures to HTTP errors for the given operation.
    pub fn during(operation: Operation) -> impl Fn(EventError) -> AppError {
        move |err| match err {
            EventError::Validation(msg) => AppError::ValidationError(msg),
            EventError::NotFound => AppError::NotFound("Event not found".to_string()),
            EventError::Forbidden => {
                AppError::Forbidden("You can only update your own events".to_string())
            }
            EventError::AlreadyJoined => {
                AppError::Conflict("You have already joined this event".to_string())
            }
            EventError::NoChanges => AppError::ValidationError("No changes to apply".to_string()),
            EventError::Store(source) => AppError::StoreError { operation, source },
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::AuthError(AuthError::Provider(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::AuthError(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            // Duplicate joins are reported as a bad request to existing clients.
            AppError::Conflict(_) => StatusCode::BAD_REQUEST,
            AppError::StoreError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::AuthError(_) => "AUTH_ERROR",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::StoreError { .. } => "DATABASE_ERROR",
        }
    }

    fn public_message(&self) -> String {
        match self {
            AppError::ValidationError(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg) => msg.clone(),
            AppError::AuthError(AuthError::Provider(_)) => {
                "Server error verifying credentials".to_string()
            }
            AppError::AuthError(e) => e.to_string(),
            AppError::StoreError { operation, .. } => format!("Server error {operation}"),
        }
    }

    fn log(&self) {
        let code = self.code();
        match self {
            AppError::StoreError { operation, source } => {
                error!(code, error = ?source, %operation, "Store error");
            }
            AppError::AuthError(AuthError::Provider(msg)) => {
                error!(code, message = %msg, "Identity provider error");
            }
            _ => warn!(code, error = %self, "Request rejected"),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::ValidationError(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::ValidationError(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Log internal details
        self.log();

        error_response(self.public_message(), status)
    }
}
