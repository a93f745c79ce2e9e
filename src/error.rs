use axum::{
    extract::{multipart::MultipartError, multipart::MultipartRejection, rejection::FormRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{repository::RepositoryError, storage::StorageError, views};

/// Shown whenever the real cause must not leak to the client.
pub const FALLBACK_MESSAGE: &str = "Oh No, Something Went Wrong!";

/// AppError
///
/// The single error type every handler, extractor and guard bubbles up. Converting it
/// into a response is the application's one top-level error handler: it picks the status
/// code, logs server-side failures, and renders the error page.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Form input failed its schema. Carries one message per violation.
    #[error("{}", .0.join(","))]
    Validation(Vec<String>),
    /// The request body could not be read or decoded at all.
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
    #[error("password hashing failed: {0}")]
    PasswordHash(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Repository(_)
            | AppError::Storage(_)
            | AppError::Session(_)
            | AppError::PasswordHash(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The text shown to the user. Server-side failures always get the fallback.
    pub fn public_message(&self) -> String {
        if self.status().is_server_error() {
            return FALLBACK_MESSAGE.to_string();
        }
        let message = self.to_string();
        if message.trim().is_empty() {
            FALLBACK_MESSAGE.to_string()
        } else {
            message
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, %status, "request rejected");
        }
        (status, views::error_page(status, &self.public_message())).into_response()
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::BadRequest(err.body_text())
    }
}

impl From<FormRejection> for AppError {
    fn from(rejection: FormRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

pub type AppResult<T> = Result<T, AppError>;
