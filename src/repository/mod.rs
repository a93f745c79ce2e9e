use crate::models::{
    Campground, CampgroundChanges, CampgroundDetails, NewCampground, NewReview, Review, User,
};
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

mod memory;
mod postgres;

pub use memory::InMemoryRepository;
pub use postgres::PostgresRepository;

/// RepositoryError
///
/// Every persistence failure the handlers can observe. Anything the backend reports that
/// is not a known constraint violation collapses into the generic `Storage` variant.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("username is already taken")]
    UsernameTaken,
    #[error("storage failure: {0}")]
    Storage(#[from] sqlx::Error),
}

/// Repository Trait
///
/// The abstract contract for all persistence operations. Handlers and guards only ever
/// see `Arc<dyn Repository>`, so the Postgres backend and the in-memory backend used by
/// the tests are interchangeable.
///
/// Lookups return `Ok(None)` for a missing entity; `Err` is reserved for backend failure.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn create_user(&self, username: &str, password_hash: &str)
    -> Result<User, RepositoryError>;
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, RepositoryError>;
    async fn find_user_by_username(&self, username: &str)
    -> Result<Option<User>, RepositoryError>;

    // --- Campgrounds ---
    async fn list_campgrounds(&self) -> Result<Vec<Campground>, RepositoryError>;
    async fn get_campground(&self, id: Uuid) -> Result<Option<Campground>, RepositoryError>;
    /// Campground with its author and every review (each with its author) populated.
    async fn get_campground_details(
        &self,
        id: Uuid,
    ) -> Result<Option<CampgroundDetails>, RepositoryError>;
    async fn create_campground(&self, new: NewCampground) -> Result<Campground, RepositoryError>;
    /// Merges fields, appends `add_images`, then drops images named in `remove_filenames`.
    async fn update_campground(
        &self,
        id: Uuid,
        changes: CampgroundChanges,
    ) -> Result<Option<Campground>, RepositoryError>;
    /// Deletes the campground and every review attached to it. Returns the removed
    /// campground so the caller can release its stored images.
    async fn delete_campground(&self, id: Uuid) -> Result<Option<Campground>, RepositoryError>;

    // --- Reviews ---
    async fn get_review(
        &self,
        campground_id: Uuid,
        review_id: Uuid,
    ) -> Result<Option<Review>, RepositoryError>;
    /// Attaches a review to its campground. `Ok(None)` when the campground does not exist.
    async fn create_review(
        &self,
        campground_id: Uuid,
        new: NewReview,
    ) -> Result<Option<Review>, RepositoryError>;
    /// Removes the review from its campground and deletes it. `Ok(false)` if it was absent.
    async fn delete_review(
        &self,
        campground_id: Uuid,
        review_id: Uuid,
    ) -> Result<bool, RepositoryError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;
