use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// A registered account in the `users` table. Referenced (never owned) by campgrounds and
/// reviews through their `author_id`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Default, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    // Argon2id PHC string. Never rendered or serialized.
    #[serde(skip_serializing)]
    pub password_hash: String,
}

/// Point
///
/// A GeoJSON-style point. Longitude first, matching what geocoding providers return.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub struct Point {
    pub longitude: f64,
    pub latitude: f64,
}

/// Image
///
/// A stored campground image. `filename` is the object key in external storage and is
/// the handle used to delete the blob later.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Default, PartialEq)]
pub struct Image {
    pub url: String,
    pub filename: String,
}

/// Campground
///
/// A listing from the `campgrounds` table together with its ordered images.
/// `author_id` is set once at creation and never updated.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Campground {
    pub id: Uuid,
    pub title: String,
    pub price: f64,
    pub description: String,
    pub location: String,
    pub geometry: Point,
    pub images: Vec<Image>,
    pub author_id: Uuid,
    // Ordered review ids (insertion order).
    pub review_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Review
///
/// A rating from the `reviews` table. Owned by exactly one campground.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Default, PartialEq)]
pub struct Review {
    pub id: Uuid,
    pub campground_id: Uuid,
    pub body: String,
    pub rating: i32,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// ReviewWithAuthor
///
/// A review with its author populated, as shown on the detail page.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ReviewWithAuthor {
    pub review: Review,
    pub author: User,
}

/// CampgroundDetails
///
/// The fully populated read model for `GET /campgrounds/{id}`: the campground, its author
/// and its reviews (each with their author) in insertion order.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CampgroundDetails {
    pub campground: Campground,
    pub author: User,
    pub reviews: Vec<ReviewWithAuthor>,
}

// --- Write Payloads (Repository Inputs) ---

/// NewCampground
///
/// Everything needed to insert a campground. Produced by the create controller after
/// validation, geocoding and upload have all succeeded.
#[derive(Debug, Clone, Default)]
pub struct NewCampground {
    pub title: String,
    pub price: f64,
    pub description: String,
    pub location: String,
    pub geometry: Point,
    pub images: Vec<Image>,
    pub author_id: Uuid,
}

/// CampgroundChanges
///
/// A full field merge plus image bookkeeping for `update_campground`.
/// Images listed in `remove_filenames` are dropped after `add_images` are appended.
#[derive(Debug, Clone, Default)]
pub struct CampgroundChanges {
    pub title: String,
    pub price: f64,
    pub description: String,
    pub location: String,
    pub geometry: Point,
    pub add_images: Vec<Image>,
    pub remove_filenames: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NewReview {
    pub body: String,
    pub rating: i32,
    pub author_id: Uuid,
}
