use crate::{AppState, handlers::users};
use axum::{Router, routing::get};

/// User Router Module
///
/// Identity routes. None of them are guarded: anonymous visitors must be able to reach
/// the forms, and logging out without a session is harmless.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        // GET /
        // Landing page.
        .route("/", get(users::home))
        // GET/POST /register
        // Account creation. A successful registration is also a login.
        .route("/register", get(users::render_register).post(users::register))
        // GET/POST /login
        // Password login. Redirects to the stored `return_to` path when there is one.
        .route("/login", get(users::render_login).post(users::login))
        // GET /logout
        .route("/logout", get(users::logout))
}
