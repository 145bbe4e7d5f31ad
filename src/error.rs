use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::{
    bot::{state_store::StateError, transport::TransportError},
    dao::storage::StorageError,
};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend is unavailable.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Unavailable(err)
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {}", err))
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(source) => AppError::ServiceUnavailable(source.to_string()),
            ServiceError::Degraded => AppError::ServiceUnavailable("degraded mode".into()),
            ServiceError::NotFound(message) => AppError::NotFound(message),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}

/// Reason an inbound event does not fit the conversation it landed in.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnexpectedEvent {
    /// Text arrived while a button press is expected.
    #[error("text received while a button press is expected")]
    TextWhileAwaitingButton,
    /// The button value does not belong to the current step.
    #[error("button value `{0}` does not belong to the current step")]
    UnknownButton(String),
    /// A button press reached a step that expects text.
    #[error("button pressed while text is expected")]
    ButtonWhileAwaitingText,
}

/// Failures of a single conversation turn.
#[derive(Debug, Error)]
pub enum BotError {
    /// No process matches the event.
    #[error("no process matches `{0}`")]
    ProcessNotFound(String),
    /// The state store was asked to touch a missing state.
    #[error(transparent)]
    StateNotFound(#[from] StateError),
    /// The event does not fit the current conversation.
    #[error("unexpected event: {0}")]
    UnexpectedEvent(#[from] UnexpectedEvent),
    /// Sending or editing a message failed.
    #[error("transport failure")]
    Transport(#[from] TransportError),
    /// A collaborator store failed.
    #[error("storage failure")]
    Storage(#[from] StorageError),
    /// The stored conversation is inconsistent with the process logic.
    #[error("invalid conversation state: {0}")]
    InvalidState(String),
}
