use super::{Repository, RepositoryError};
use crate::models::{
    Campground, CampgroundChanges, CampgroundDetails, NewCampground, NewReview, Review,
    ReviewWithAuthor, User,
};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Collections {
    users: Vec<User>,
    campgrounds: Vec<Campground>,
    reviews: Vec<Review>,
}

/// InMemoryRepository
///
/// A process-local `Repository` with the same observable semantics as the Postgres
/// backend (ordering, cascades, unique usernames). Backs the router tests so the full
/// request pipeline can run without a database.
#[derive(Default)]
pub struct InMemoryRepository {
    inner: RwLock<Collections>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn campground_count(&self) -> usize {
        self.inner.read().await.campgrounds.len()
    }

    /// Reviews attached to `campground_id` that still exist in the review collection.
    pub async fn review_count(&self, campground_id: Uuid) -> usize {
        self.inner
            .read()
            .await
            .reviews
            .iter()
            .filter(|r| r.campground_id == campground_id)
            .count()
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let mut data = self.inner.write().await;
        if data.users.iter().any(|u| u.username == username) {
            return Err(RepositoryError::UsernameTaken);
        }
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
        };
        data.users.push(user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        let data = self.inner.read().await;
        Ok(data.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<User>, RepositoryError> {
        let data = self.inner.read().await;
        Ok(data.users.iter().find(|u| u.username == username).cloned())
    }

    async fn list_campgrounds(&self) -> Result<Vec<Campground>, RepositoryError> {
        Ok(self.inner.read().await.campgrounds.clone())
    }

    async fn get_campground(&self, id: Uuid) -> Result<Option<Campground>, RepositoryError> {
        let data = self.inner.read().await;
        Ok(data.campgrounds.iter().find(|c| c.id == id).cloned())
    }

    async fn get_campground_details(
        &self,
        id: Uuid,
    ) -> Result<Option<CampgroundDetails>, RepositoryError> {
        let data = self.inner.read().await;
        let Some(campground) = data.campgrounds.iter().find(|c| c.id == id).cloned() else {
            return Ok(None);
        };
        let find_user = |user_id: Uuid| data.users.iter().find(|u| u.id == user_id).cloned();

        let Some(author) = find_user(campground.author_id) else {
            return Ok(None);
        };

        let reviews = campground
            .review_ids
            .iter()
            .filter_map(|review_id| data.reviews.iter().find(|r| r.id == *review_id))
            .filter_map(|review| {
                find_user(review.author_id).map(|author| ReviewWithAuthor {
                    review: review.clone(),
                    author,
                })
            })
            .collect();

        Ok(Some(CampgroundDetails {
            campground,
            author,
            reviews,
        }))
    }

    async fn create_campground(&self, new: NewCampground) -> Result<Campground, RepositoryError> {
        let campground = Campground {
            id: Uuid::new_v4(),
            title: new.title,
            price: new.price,
            description: new.description,
            location: new.location,
            geometry: new.geometry,
            images: new.images,
            author_id: new.author_id,
            review_ids: Vec::new(),
            created_at: Utc::now(),
        };
        self.inner.write().await.campgrounds.push(campground.clone());
        Ok(campground)
    }

    async fn update_campground(
        &self,
        id: Uuid,
        changes: CampgroundChanges,
    ) -> Result<Option<Campground>, RepositoryError> {
        let mut data = self.inner.write().await;
        let Some(campground) = data.campgrounds.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };

        campground.title = changes.title;
        campground.price = changes.price;
        campground.description = changes.description;
        campground.location = changes.location;
        campground.geometry = changes.geometry;
        campground.images.extend(changes.add_images);
        campground
            .images
            .retain(|image| !changes.remove_filenames.contains(&image.filename));

        Ok(Some(campground.clone()))
    }

    async fn delete_campground(&self, id: Uuid) -> Result<Option<Campground>, RepositoryError> {
        let mut data = self.inner.write().await;
        let Some(position) = data.campgrounds.iter().position(|c| c.id == id) else {
            return Ok(None);
        };
        let campground = data.campgrounds.remove(position);
        data.reviews.retain(|r| !campground.review_ids.contains(&r.id));
        Ok(Some(campground))
    }

    async fn get_review(
        &self,
        campground_id: Uuid,
        review_id: Uuid,
    ) -> Result<Option<Review>, RepositoryError> {
        let data = self.inner.read().await;
        Ok(data
            .reviews
            .iter()
            .find(|r| r.id == review_id && r.campground_id == campground_id)
            .cloned())
    }

    async fn create_review(
        &self,
        campground_id: Uuid,
        new: NewReview,
    ) -> Result<Option<Review>, RepositoryError> {
        let mut guard = self.inner.write().await;
        let data = &mut *guard;
        let Some(campground) = data.campgrounds.iter_mut().find(|c| c.id == campground_id) else {
            return Ok(None);
        };

        let review = Review {
            id: Uuid::new_v4(),
            campground_id,
            body: new.body,
            rating: new.rating,
            author_id: new.author_id,
            created_at: Utc::now(),
        };
        campground.review_ids.push(review.id);
        data.reviews.push(review.clone());
        Ok(Some(review))
    }

    async fn delete_review(
        &self,
        campground_id: Uuid,
        review_id: Uuid,
    ) -> Result<bool, RepositoryError> {
        let mut data = self.inner.write().await;
        if let Some(campground) = data.campgrounds.iter_mut().find(|c| c.id == campground_id) {
            campground.review_ids.retain(|id| *id != review_id);
        }
        let before = data.reviews.len();
        data.reviews
            .retain(|r| !(r.id == review_id && r.campground_id == campground_id));
        Ok(data.reviews.len() < before)
    }
}
