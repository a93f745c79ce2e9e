//! Runs against a real PostgreSQL database. Ignored by default:
//! `DATABASE_URL=postgres://... cargo test -- --ignored`.

use camp_portal::{
    models::{CampgroundChanges, Image, NewCampground, NewReview, Point, User},
    repository::{PostgresRepository, Repository, RepositoryError},
};
use sqlx::PgPool;
use uuid::Uuid;

// --- Test Context and Setup ---

struct DbTestContext {
    pool: PgPool,
}

impl DbTestContext {
    async fn setup() -> Self {
        dotenv::dotenv().ok();

        let db_url = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set to run integration tests");

        let pool = PgPool::connect(&db_url)
            .await
            .expect("Failed to connect to database for integration tests.");

        let ctx = DbTestContext { pool };
        ctx.repository()
            .migrate()
            .await
            .expect("Failed to run database migrations.");
        ctx
    }

    fn repository(&self) -> PostgresRepository {
        PostgresRepository::new(self.pool.clone())
    }
}

// --- Test Data Helpers ---

async fn create_test_user(repo: &PostgresRepository) -> User {
    let username = format!("user-{}", Uuid::new_v4().simple());
    repo.create_user(&username, "$argon2id$v=19$test")
        .await
        .expect("Failed to create test user")
}

fn image(name: &str) -> Image {
    Image {
        url: format!("http://localhost:9000/camp-test/{}", name),
        filename: name.to_string(),
    }
}

fn new_campground(author_id: Uuid) -> NewCampground {
    NewCampground {
        title: "Pine Ridge".to_string(),
        price: 25.0,
        description: "Shady".to_string(),
        location: "Denver, CO".to_string(),
        geometry: Point {
            longitude: -104.99,
            latitude: 39.74,
        },
        images: vec![image("campgrounds/a.jpg"), image("campgrounds/b.jpg")],
        author_id,
    }
}

fn review(author_id: Uuid, body: &str) -> NewReview {
    NewReview {
        body: body.to_string(),
        rating: 4,
        author_id,
    }
}

// --- Tests ---

#[tokio::test]
#[ignore]
async fn test_duplicate_username_is_reported() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let user = create_test_user(&repo).await;

    let result = repo.create_user(&user.username, "other-hash").await;
    assert!(matches!(result, Err(RepositoryError::UsernameTaken)));
}

#[tokio::test]
#[ignore]
async fn test_campground_round_trip_keeps_image_order() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let author = create_test_user(&repo).await;

    let created = repo.create_campground(new_campground(author.id)).await.unwrap();
    let fetched = repo.get_campground(created.id).await.unwrap().unwrap();

    assert_eq!(fetched.title, "Pine Ridge");
    assert_eq!(fetched.price, 25.0);
    assert_eq!(fetched.author_id, author.id);
    assert_eq!(
        fetched
            .images
            .iter()
            .map(|i| i.filename.as_str())
            .collect::<Vec<_>>(),
        vec!["campgrounds/a.jpg", "campgrounds/b.jpg"]
    );

    repo.delete_campground(created.id).await.unwrap();
}

#[tokio::test]
#[ignore]
async fn test_update_merges_fields_and_images() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let author = create_test_user(&repo).await;
    let created = repo.create_campground(new_campground(author.id)).await.unwrap();

    let updated = repo
        .update_campground(
            created.id,
            CampgroundChanges {
                title: "Pine Ridge Upper".to_string(),
                price: 30.0,
                description: "Shadier".to_string(),
                location: "Denver, CO".to_string(),
                geometry: created.geometry,
                add_images: vec![image("campgrounds/c.jpg")],
                remove_filenames: vec!["campgrounds/a.jpg".to_string()],
            },
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.title, "Pine Ridge Upper");
    assert_eq!(updated.author_id, author.id);
    assert_eq!(
        updated
            .images
            .iter()
            .map(|i| i.filename.as_str())
            .collect::<Vec<_>>(),
        vec!["campgrounds/b.jpg", "campgrounds/c.jpg"]
    );

    assert!(
        repo.update_campground(Uuid::new_v4(), CampgroundChanges::default())
            .await
            .unwrap()
            .is_none()
    );

    repo.delete_campground(created.id).await.unwrap();
}

#[tokio::test]
#[ignore]
async fn test_reviews_attach_populate_and_cascade() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let author = create_test_user(&repo).await;
    let reviewer = create_test_user(&repo).await;
    let campground = repo.create_campground(new_campground(author.id)).await.unwrap();

    let first = repo
        .create_review(campground.id, review(reviewer.id, "First"))
        .await
        .unwrap()
        .unwrap();
    repo.create_review(campground.id, review(author.id, "Second"))
        .await
        .unwrap()
        .unwrap();
    assert!(
        repo.create_review(Uuid::new_v4(), review(reviewer.id, "Orphan"))
            .await
            .unwrap()
            .is_none()
    );

    let details = repo
        .get_campground_details(campground.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(details.author.id, author.id);
    assert_eq!(details.reviews.len(), 2);
    assert_eq!(details.reviews[0].review.body, "First");
    assert_eq!(details.reviews[0].author.id, reviewer.id);

    assert!(repo.delete_review(campground.id, first.id).await.unwrap());
    assert!(!repo.delete_review(campground.id, first.id).await.unwrap());
    let after = repo.get_campground(campground.id).await.unwrap().unwrap();
    assert_eq!(after.review_ids.len(), 1);

    let removed = repo.delete_campground(campground.id).await.unwrap().unwrap();
    assert_eq!(removed.images.len(), 2);

    let (remaining,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM reviews WHERE campground_id = $1")
            .bind(campground.id)
            .fetch_one(&ctx.pool)
            .await
            .unwrap();
    assert_eq!(remaining, 0);
}
