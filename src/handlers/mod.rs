//! Request handlers, one module per resource. Guards have already run by the time any
//! mutating handler here is reached.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect},
};
use tower_sessions::Session;
use uuid::Uuid;

use crate::{error::AppError, flash, guards::CAMPGROUND_NOT_FOUND};

pub mod campgrounds;
pub mod reviews;
pub mod users;

/// not_found
///
/// Fallback for every unmatched route.
pub async fn not_found() -> AppError {
    AppError::NotFound("Page Not Found".to_string())
}

/// Liveness probe.
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// Parses a path segment as a record id. A malformed id names no record.
pub(crate) fn parse_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw).ok()
}

/// The shared "campground is gone" response: error flash, back to the listing.
pub(crate) async fn campground_missing(session: &Session) -> Result<Redirect, AppError> {
    flash::error(session, CAMPGROUND_NOT_FOUND).await?;
    Ok(Redirect::to("/campgrounds"))
}
