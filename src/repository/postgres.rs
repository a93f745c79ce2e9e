use super::{Repository, RepositoryError};
use crate::models::{
    Campground, CampgroundChanges, CampgroundDetails, Image, NewCampground, NewReview, Point,
    Review, ReviewWithAuthor, User,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use std::collections::HashMap;
use uuid::Uuid;

// --- Row Types (internal) ---

#[derive(FromRow)]
struct CampgroundRow {
    id: Uuid,
    title: String,
    price: f64,
    description: String,
    location: String,
    longitude: f64,
    latitude: f64,
    author_id: Uuid,
    created_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct ImageRow {
    campground_id: Uuid,
    url: String,
    filename: String,
}

/// A review joined with its author's profile columns.
#[derive(FromRow)]
struct ReviewAuthorRow {
    id: Uuid,
    campground_id: Uuid,
    body: String,
    rating: i32,
    author_id: Uuid,
    created_at: DateTime<Utc>,
    username: String,
    password_hash: String,
}

impl From<ReviewAuthorRow> for ReviewWithAuthor {
    fn from(row: ReviewAuthorRow) -> Self {
        ReviewWithAuthor {
            author: User {
                id: row.author_id,
                username: row.username,
                password_hash: row.password_hash,
            },
            review: Review {
                id: row.id,
                campground_id: row.campground_id,
                body: row.body,
                rating: row.rating,
                author_id: row.author_id,
                created_at: row.created_at,
            },
        }
    }
}

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by PostgreSQL.
/// Multi-statement mutations (campground with images, cascading deletes) run inside a
/// single transaction so a failure never leaves half-written rows behind.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the embedded schema migrations.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    /// reset_listings
    ///
    /// Removes every campground (and through the cascade every image row and review).
    /// Used by the seeding binary only. Returns the number of campgrounds removed.
    pub async fn reset_listings(&self) -> Result<u64, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM reviews").execute(&mut *tx).await?;
        let removed = sqlx::query("DELETE FROM campgrounds")
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tx.commit().await?;
        Ok(removed)
    }

    /// load_campgrounds
    ///
    /// Fetches campgrounds (all, or the single one matching `only`) and stitches their
    /// images and review ids on in insertion order.
    async fn load_campgrounds(
        &self,
        only: Option<Uuid>,
    ) -> Result<Vec<Campground>, RepositoryError> {
        let rows = sqlx::query_as::<_, CampgroundRow>(
            r#"SELECT id, title, price, description, location, longitude, latitude,
                      author_id, created_at
               FROM campgrounds
               WHERE ($1::uuid IS NULL OR id = $1)
               ORDER BY created_at, id"#,
        )
        .bind(only)
        .fetch_all(&self.pool)
        .await?;

        let image_rows = sqlx::query_as::<_, ImageRow>(
            r#"SELECT campground_id, url, filename
               FROM campground_images
               WHERE ($1::uuid IS NULL OR campground_id = $1)
               ORDER BY id"#,
        )
        .bind(only)
        .fetch_all(&self.pool)
        .await?;

        let review_rows = sqlx::query_as::<_, (Uuid, Uuid)>(
            r#"SELECT campground_id, id
               FROM reviews
               WHERE ($1::uuid IS NULL OR campground_id = $1)
               ORDER BY created_at, id"#,
        )
        .bind(only)
        .fetch_all(&self.pool)
        .await?;

        let mut images: HashMap<Uuid, Vec<Image>> = HashMap::new();
        for row in image_rows {
            images.entry(row.campground_id).or_default().push(Image {
                url: row.url,
                filename: row.filename,
            });
        }
        let mut reviews: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for (campground_id, review_id) in review_rows {
            reviews.entry(campground_id).or_default().push(review_id);
        }

        Ok(rows
            .into_iter()
            .map(|row| Campground {
                images: images.remove(&row.id).unwrap_or_default(),
                review_ids: reviews.remove(&row.id).unwrap_or_default(),
                id: row.id,
                title: row.title,
                price: row.price,
                description: row.description,
                location: row.location,
                geometry: Point {
                    longitude: row.longitude,
                    latitude: row.latitude,
                },
                author_id: row.author_id,
                created_at: row.created_at,
            })
            .collect())
    }

    async fn insert_images(
        tx: &mut Transaction<'_, Postgres>,
        campground_id: Uuid,
        images: &[Image],
    ) -> Result<(), RepositoryError> {
        for image in images {
            sqlx::query(
                "INSERT INTO campground_images (campground_id, url, filename) VALUES ($1, $2, $3)",
            )
            .bind(campground_id)
            .bind(&image.url)
            .bind(&image.filename)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    /// create_user
    ///
    /// Maps the `users.username` unique constraint to `RepositoryError::UsernameTaken`.
    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let result = sqlx::query_as::<_, User>(
            r#"INSERT INTO users (id, username, password_hash)
               VALUES ($1, $2, $3)
               RETURNING id, username, password_hash"#,
        )
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(RepositoryError::UsernameTaken)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        Ok(
            sqlx::query_as::<_, User>("SELECT id, username, password_hash FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<User>, RepositoryError> {
        Ok(sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn list_campgrounds(&self) -> Result<Vec<Campground>, RepositoryError> {
        self.load_campgrounds(None).await
    }

    async fn get_campground(&self, id: Uuid) -> Result<Option<Campground>, RepositoryError> {
        Ok(self.load_campgrounds(Some(id)).await?.into_iter().next())
    }

    async fn get_campground_details(
        &self,
        id: Uuid,
    ) -> Result<Option<CampgroundDetails>, RepositoryError> {
        let Some(campground) = self.get_campground(id).await? else {
            return Ok(None);
        };

        // The FK guarantees the author exists; a miss means the row vanished mid-request.
        let Some(author) = self.get_user(campground.author_id).await? else {
            tracing::warn!(campground_id = %id, "campground author missing");
            return Ok(None);
        };

        let reviews = sqlx::query_as::<_, ReviewAuthorRow>(
            r#"SELECT r.id, r.campground_id, r.body, r.rating, r.author_id, r.created_at,
                      u.username, u.password_hash
               FROM reviews r
               JOIN users u ON u.id = r.author_id
               WHERE r.campground_id = $1
               ORDER BY r.created_at, r.id"#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(ReviewWithAuthor::from)
        .collect();

        Ok(Some(CampgroundDetails {
            campground,
            author,
            reviews,
        }))
    }

    async fn create_campground(&self, new: NewCampground) -> Result<Campground, RepositoryError> {
        let id = Uuid::new_v4();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"INSERT INTO campgrounds
                 (id, title, price, description, location, longitude, latitude, author_id)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"#,
        )
        .bind(id)
        .bind(&new.title)
        .bind(new.price)
        .bind(&new.description)
        .bind(&new.location)
        .bind(new.geometry.longitude)
        .bind(new.geometry.latitude)
        .bind(new.author_id)
        .execute(&mut *tx)
        .await?;

        Self::insert_images(&mut tx, id, &new.images).await?;
        tx.commit().await?;

        self.get_campground(id)
            .await?
            .ok_or(RepositoryError::Storage(sqlx::Error::RowNotFound))
    }

    /// update_campground
    ///
    /// `author_id` never appears in the SET list: authorship is immutable.
    async fn update_campground(
        &self,
        id: Uuid,
        changes: CampgroundChanges,
    ) -> Result<Option<Campground>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"UPDATE campgrounds
               SET title = $2, price = $3, description = $4, location = $5,
                   longitude = $6, latitude = $7
               WHERE id = $1"#,
        )
        .bind(id)
        .bind(&changes.title)
        .bind(changes.price)
        .bind(&changes.description)
        .bind(&changes.location)
        .bind(changes.geometry.longitude)
        .bind(changes.geometry.latitude)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 0 {
            return Ok(None);
        }

        Self::insert_images(&mut tx, id, &changes.add_images).await?;

        if !changes.remove_filenames.is_empty() {
            sqlx::query(
                "DELETE FROM campground_images WHERE campground_id = $1 AND filename = ANY($2)",
            )
            .bind(id)
            .bind(&changes.remove_filenames)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        self.get_campground(id).await
    }

    /// delete_campground
    ///
    /// Reviews are removed explicitly in the same transaction; image rows follow through
    /// `ON DELETE CASCADE`.
    async fn delete_campground(&self, id: Uuid) -> Result<Option<Campground>, RepositoryError> {
        let Some(campground) = self.get_campground(id).await? else {
            return Ok(None);
        };

        let mut tx = self.pool.begin().await?;
        let reviews_removed = sqlx::query("DELETE FROM reviews WHERE campground_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        sqlx::query("DELETE FROM campgrounds WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::debug!(campground_id = %id, reviews_removed, "campground deleted");
        Ok(Some(campground))
    }

    async fn get_review(
        &self,
        campground_id: Uuid,
        review_id: Uuid,
    ) -> Result<Option<Review>, RepositoryError> {
        Ok(sqlx::query_as::<_, Review>(
            r#"SELECT id, campground_id, body, rating, author_id, created_at
               FROM reviews
               WHERE id = $1 AND campground_id = $2"#,
        )
        .bind(review_id)
        .bind(campground_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    /// create_review
    ///
    /// The existence check and the insert are a single statement, so a campground deleted
    /// concurrently yields `None` instead of a foreign-key error.
    async fn create_review(
        &self,
        campground_id: Uuid,
        new: NewReview,
    ) -> Result<Option<Review>, RepositoryError> {
        Ok(sqlx::query_as::<_, Review>(
            r#"INSERT INTO reviews (id, campground_id, body, rating, author_id)
               SELECT $1, $2, $3, $4, $5
               WHERE EXISTS (SELECT 1 FROM campgrounds WHERE id = $2)
               RETURNING id, campground_id, body, rating, author_id, created_at"#,
        )
        .bind(Uuid::new_v4())
        .bind(campground_id)
        .bind(&new.body)
        .bind(new.rating)
        .bind(new.author_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_review(
        &self,
        campground_id: Uuid,
        review_id: Uuid,
    ) -> Result<bool, RepositoryError> {
        let removed = sqlx::query("DELETE FROM reviews WHERE id = $1 AND campground_id = $2")
            .bind(review_id)
            .bind(campground_id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(removed > 0)
    }
}
