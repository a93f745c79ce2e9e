use crate::{
    AppState,
    guards::{self, Guard, GuardChain},
    handlers::{campgrounds, reviews},
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    handler::Handler,
    middleware,
    routing::{delete, get, post},
};

/// Multipart bodies carry several images, so the default 2 MB cap is too small.
const UPLOAD_LIMIT: usize = 20 * 1024 * 1024;

const AUTHENTICATED: &[Guard] = &[Guard::Authenticated];
const CAMPGROUND_OWNER: &[Guard] = &[Guard::Authenticated, Guard::CampgroundAuthor];
const REVIEW_OWNER: &[Guard] = &[Guard::Authenticated, Guard::ReviewAuthor];

/// Campground Router Module
///
/// Listings and the reviews nested under them. Reads are open to everyone; every mutating
/// route carries its guard chain, evaluated in order before the handler (and before the
/// body is read, so an anonymous upload is never buffered).
pub fn campground_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        // GET /campgrounds
        // POST /campgrounds
        // Creation requires a logged-in user; the author is always the current user.
        .route(
            "/campgrounds",
            get(campgrounds::index).post(campgrounds::create_campground.layer(
                middleware::from_fn_with_state(
                    GuardChain::new(state, AUTHENTICATED),
                    guards::enforce,
                ),
            )),
        )
        // GET /campgrounds/new
        // Static segment, so it wins over `/campgrounds/{id}`.
        .route(
            "/campgrounds/new",
            get(campgrounds::render_new_form.layer(middleware::from_fn_with_state(
                GuardChain::new(state, AUTHENTICATED),
                guards::enforce,
            ))),
        )
        // GET /campgrounds/{id}
        // PUT /campgrounds/{id}
        // DELETE /campgrounds/{id}
        // Changes are reserved to the campground's author.
        .route(
            "/campgrounds/{id}",
            get(campgrounds::show_campground)
                .put(campgrounds::update_campground.layer(middleware::from_fn_with_state(
                    GuardChain::new(state, CAMPGROUND_OWNER),
                    guards::enforce,
                )))
                .delete(campgrounds::delete_campground.layer(middleware::from_fn_with_state(
                    GuardChain::new(state, CAMPGROUND_OWNER),
                    guards::enforce,
                ))),
        )
        // GET /campgrounds/{id}/edit
        .route(
            "/campgrounds/{id}/edit",
            get(campgrounds::render_edit_form.layer(middleware::from_fn_with_state(
                GuardChain::new(state, CAMPGROUND_OWNER),
                guards::enforce,
            ))),
        )
        // POST /campgrounds/{id}/reviews
        // Any logged-in user may review any campground.
        .route(
            "/campgrounds/{id}/reviews",
            post(reviews::create_review.layer(middleware::from_fn_with_state(
                GuardChain::new(state, AUTHENTICATED),
                guards::enforce,
            ))),
        )
        // DELETE /campgrounds/{id}/reviews/{review_id}
        // Only the review's author may remove it.
        .route(
            "/campgrounds/{id}/reviews/{review_id}",
            delete(reviews::delete_review.layer(middleware::from_fn_with_state(
                GuardChain::new(state, REVIEW_OWNER),
                guards::enforce,
            ))),
        )
        .layer(DefaultBodyLimit::max(UPLOAD_LIMIT))
}
