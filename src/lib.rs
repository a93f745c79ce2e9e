use axum::{
    Router,
    extract::{FromRef, Query, Request},
    http::{HeaderName, HeaderValue, Method, header},
    middleware::{self, Next},
    response::Response,
    routing::get,
};
use serde::Deserialize;
use time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    trace::{DefaultOnResponse, TraceLayer},
};
use tower_sessions::{
    Expiry, SessionManagerLayer, SessionStore,
    cookie::{Key, SameSite},
    service::SignedCookie,
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod auth;
pub mod config;
pub mod error;
pub mod flash;
pub mod forms;
pub mod geocoding;
pub mod guards;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod seed;
pub mod storage;
pub mod views;

// Route tables, one module per resource.
pub mod routes;
use routes::{campgrounds::campground_routes, users::user_routes};

// --- Public Re-exports ---

// Makes core state types easily accessible to the binaries and the integration tests.
pub use config::AppConfig;
pub use geocoding::{GeocoderState, MapboxGeocoder, MockGeocoder};
pub use repository::{InMemoryRepository, PostgresRepository, RepositoryState};
pub use storage::{MockStorageService, S3StorageClient, StorageState};

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "session";

/// AppState
///
/// The single process-wide context: every service a handler or guard may need, built once
/// in `main` and cloned cheaply into each request.
#[derive(Clone)]
pub struct AppState {
    /// Persistence for users, campgrounds and reviews.
    pub repo: RepositoryState,
    /// Object storage for campground images.
    pub storage: StorageState,
    /// Forward geocoding of free-text locations.
    pub geocoder: GeocoderState,
    /// The loaded, immutable environment configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// Handlers and extractors pull only the component they need out of the shared AppState.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for GeocoderState {
    fn from_ref(app_state: &AppState) -> GeocoderState {
        app_state.geocoder.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

#[derive(Deserialize)]
struct MethodOverride {
    #[serde(rename = "_method")]
    method: Option<String>,
}

/// method_override
///
/// HTML forms can only GET or POST. A POST carrying `?_method=PUT|PATCH|DELETE` is
/// rewritten to that verb before the router sees it.
async fn method_override(mut request: Request, next: Next) -> Response {
    if request.method() == Method::POST {
        if let Ok(Query(MethodOverride {
            method: Some(method),
        })) = Query::<MethodOverride>::try_from_uri(request.uri())
        {
            match method.to_ascii_uppercase().as_str() {
                "PUT" => *request.method_mut() = Method::PUT,
                "PATCH" => *request.method_mut() = Method::PATCH,
                "DELETE" => *request.method_mut() = Method::DELETE,
                other => tracing::debug!(method = other, "ignoring unsupported method override"),
            }
        }
    }
    next.run(request).await
}

/// session_layer
///
/// Signed, HTTP-only session cookie that expires after seven days without a request.
/// `secure` is only set in production so local plain-HTTP development keeps working.
fn session_layer<Store>(
    store: Store,
    config: &AppConfig,
) -> SessionManagerLayer<Store, SignedCookie>
where
    Store: SessionStore + Clone,
{
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE)
        .with_http_only(true)
        .with_same_site(SameSite::Lax)
        .with_secure(config.env == config::Env::Production)
        .with_expiry(Expiry::OnInactivity(Duration::days(7)))
        .with_signed(Key::from(config.session_secret.as_bytes()))
}

// --- Content Security Policy ---

const SCRIPT_SRC: &[&str] = &[
    "https://stackpath.bootstrapcdn.com",
    "https://api.tiles.mapbox.com",
    "https://api.mapbox.com",
    "https://kit.fontawesome.com",
    "https://cdnjs.cloudflare.com",
    "https://cdn.jsdelivr.net",
];
const STYLE_SRC: &[&str] = &[
    "https://kit-free.fontawesome.com",
    "https://stackpath.bootstrapcdn.com",
    "https://api.mapbox.com",
    "https://api.tiles.mapbox.com",
    "https://fonts.googleapis.com",
    "https://use.fontawesome.com",
    "https://cdn.jsdelivr.net",
];
const CONNECT_SRC: &[&str] = &[
    "https://api.mapbox.com",
    "https://*.tiles.mapbox.com",
    "https://events.mapbox.com",
];
const IMG_SRC: &[&str] = &["https://images.unsplash.com"];

/// content_security_policy
///
/// The `Content-Security-Policy` sent with every response. Images may also come from the
/// configured storage endpoint.
pub fn content_security_policy(config: &AppConfig) -> String {
    let list = |sources: &[&str]| sources.join(" ");
    format!(
        "default-src 'none'; \
         connect-src 'self' {connect}; \
         script-src 'unsafe-inline' 'self' {script}; \
         style-src 'self' 'unsafe-inline' {style}; \
         worker-src 'self' blob:; \
         child-src blob:; \
         object-src 'none'; \
         img-src 'self' blob: data: {storage} {img}; \
         font-src 'self'",
        connect = list(CONNECT_SRC),
        script = list(SCRIPT_SRC),
        style = list(STYLE_SRC),
        storage = config.s3_public_url.trim_end_matches('/'),
        img = list(IMG_SRC),
    )
}

/// create_router
///
/// Assembles the whole application: routes and their guard chains, the not-found
/// fallback, method override (applied before routing), sessions, and the observability
/// stack.
pub fn create_router<Store>(state: AppState, session_store: Store) -> Router
where
    Store: SessionStore + Clone,
{
    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    let sessions = session_layer(session_store, &state.config);
    let csp = HeaderValue::from_str(&content_security_policy(&state.config))
        .expect("FATAL: S3_PUBLIC_URL cannot appear in a Content-Security-Policy header");

    // 1. Application routes.
    let routes = Router::new()
        .merge(user_routes())
        .merge(campground_routes(&state))
        // GET /health
        // Liveness probe for load balancers; touches nothing.
        .route("/health", get(handlers::health))
        .fallback(handlers::not_found)
        .with_state(state);

    // 2. Method override must rewrite the verb before routing, so the routed app is
    // mounted as the fallback of an otherwise empty router that carries the middleware.
    let app = Router::new()
        .fallback_service(routes)
        .layer(middleware::from_fn(method_override));

    // 3. Sessions and security headers, then the observability and correlation layers
    // (outermost).
    app
        .layer(sessions)
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            csp,
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(
            ServiceBuilder::new()
                // 3a. Request ID Generation: a unique UUID for every incoming request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. Request Tracing: wraps the request/response lifecycle in a span that
                // carries the generated request ID.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Request ID Propagation: echoes x-request-id back to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
}

/// trace_span_logger
///
/// Builds the `http_request` span for `TraceLayer`, tagging it with the `x-request-id`
/// header so every log line of one request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
