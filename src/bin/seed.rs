use camp_portal::{
    auth,
    config::AppConfig,
    repository::{PostgresRepository, Repository},
    seed,
};
use rand_core::OsRng;
use sqlx::postgres::PgPoolOptions;

const SEED_USERNAME: &str = "seed";
const DEFAULT_COUNT: usize = 50;

/// main
///
/// Wipes every campground and review, then inserts a fresh batch of sample listings
/// authored by the `seed` user (created on first run). Usage: `seed [COUNT]`.
#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "camp_portal=info,seed=info".into()),
        )
        .init();

    let count = std::env::args()
        .nth(1)
        .map(|arg| arg.parse::<usize>().expect("FATAL: COUNT must be a positive integer"))
        .unwrap_or(DEFAULT_COUNT);

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&config.db_url)
        .await
        .expect("FATAL: Failed to connect to Postgres. Check DATABASE_URL.");
    let repo = PostgresRepository::new(pool);
    repo.migrate().await.expect("FATAL: migrations failed");

    let author = match repo
        .find_user_by_username(SEED_USERNAME)
        .await
        .expect("FATAL: could not look up seed user")
    {
        Some(user) => user,
        None => {
            let password =
                std::env::var("SEED_PASSWORD").unwrap_or_else(|_| "seed-password".to_string());
            let hash =
                auth::hash_password(&password).expect("FATAL: could not hash seed password");
            repo.create_user(SEED_USERNAME, &hash)
                .await
                .expect("FATAL: could not create seed user")
        }
    };

    let removed = repo
        .reset_listings()
        .await
        .expect("FATAL: could not clear campgrounds");
    tracing::info!(removed, "cleared existing campgrounds");

    let created = seed::seed_campgrounds(&repo, &mut OsRng, author.id, count)
        .await
        .expect("FATAL: could not insert campgrounds");
    tracing::info!(count = created.len(), author = %author.username, "seeded campgrounds");
}
