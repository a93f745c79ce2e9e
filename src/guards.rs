use axum::{
    extract::{FromRequestParts, Path, Request, State},
    http::Method,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::collections::HashMap;
use tower_sessions::Session;
use uuid::Uuid;

use crate::{
    AppState,
    auth::{self, RETURN_TO},
    error::AppError,
    flash,
    models::User,
};

pub const SIGN_IN_FIRST: &str = "You must be signed in first!";
pub const CAMPGROUND_NOT_FOUND: &str = "Cannot find that campground!";
pub const REVIEW_NOT_FOUND: &str = "Cannot find that review!";
pub const NO_PERMISSION: &str = "You do not have permission to do that!";

/// Guard
///
/// One precondition a route demands before its handler may run. Routes list their guards
/// in evaluation order; ownership guards assume `Authenticated` came first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// A logged-in user must be present.
    Authenticated,
    /// The campground at `{id}` must exist and belong to the current user.
    CampgroundAuthor,
    /// The review at `{review_id}` under `{id}` must exist and belong to the current user.
    ReviewAuthor,
}

pub enum GuardOutcome {
    Continue,
    ShortCircuit(Response),
}

/// GuardChain
///
/// The state handed to [`enforce`]: the application context plus the ordered guard list
/// for one route.
#[derive(Clone)]
pub struct GuardChain {
    state: AppState,
    guards: &'static [Guard],
}

impl GuardChain {
    pub fn new(state: &AppState, guards: &'static [Guard]) -> Self {
        Self {
            state: state.clone(),
            guards,
        }
    }
}

/// What a guard sees of the request.
struct GuardContext<'a> {
    session: &'a Session,
    method: Method,
    path_and_query: String,
    params: HashMap<String, String>,
    user: Option<User>,
}

impl GuardContext<'_> {
    fn campground_page(&self) -> String {
        match self.params.get("id") {
            Some(id) => format!("/campgrounds/{}", id),
            None => "/campgrounds".to_string(),
        }
    }
}

/// enforce
///
/// Middleware running a route's guards in order. The first guard that short-circuits
/// decides the response and the handler never runs.
pub async fn enforce(
    State(chain): State<GuardChain>,
    session: Session,
    request: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();
    let params = Path::<HashMap<String, String>>::from_request_parts(&mut parts, &chain)
        .await
        .map(|Path(params)| params)
        .unwrap_or_default();

    let user = match auth::current_user(&session, chain.state.repo.as_ref()).await {
        Ok(user) => user,
        Err(e) => return e.into_response(),
    };

    let ctx = GuardContext {
        session: &session,
        method: parts.method.clone(),
        path_and_query: parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| parts.uri.path().to_string()),
        params,
        user,
    };

    for guard in chain.guards {
        let outcome = match guard.check(&chain.state, &ctx).await {
            Ok(outcome) => outcome,
            Err(e) => return e.into_response(),
        };
        if let GuardOutcome::ShortCircuit(response) = outcome {
            tracing::debug!(?guard, path = %ctx.path_and_query, "guard short-circuited request");
            return response;
        }
    }

    next.run(Request::from_parts(parts, body)).await
}

impl Guard {
    async fn check(
        &self,
        state: &AppState,
        ctx: &GuardContext<'_>,
    ) -> Result<GuardOutcome, AppError> {
        match self {
            Guard::Authenticated => authenticated(ctx).await,
            Guard::CampgroundAuthor => campground_author(state, ctx).await,
            Guard::ReviewAuthor => review_author(state, ctx).await,
        }
    }
}

async fn redirect_with_error(
    session: &Session,
    message: &str,
    to: &str,
) -> Result<GuardOutcome, AppError> {
    flash::error(session, message).await?;
    Ok(GuardOutcome::ShortCircuit(Redirect::to(to).into_response()))
}

async fn authenticated(ctx: &GuardContext<'_>) -> Result<GuardOutcome, AppError> {
    if ctx.user.is_some() {
        return Ok(GuardOutcome::Continue);
    }

    // Only a GET can be replayed after login; anything else returns to the resource page.
    let return_to = if ctx.method == Method::GET {
        ctx.path_and_query.clone()
    } else {
        ctx.campground_page()
    };
    ctx.session.insert(RETURN_TO, return_to).await?;
    redirect_with_error(ctx.session, SIGN_IN_FIRST, "/login").await
}

/// The current user's id, or the login redirect if an ownership guard runs without one.
async fn require_user(ctx: &GuardContext<'_>) -> Result<Result<Uuid, GuardOutcome>, AppError> {
    match &ctx.user {
        Some(user) => Ok(Ok(user.id)),
        None => authenticated(ctx).await.map(Err),
    }
}

async fn campground_author(
    state: &AppState,
    ctx: &GuardContext<'_>,
) -> Result<GuardOutcome, AppError> {
    let user_id = match require_user(ctx).await? {
        Ok(id) => id,
        Err(outcome) => return Ok(outcome),
    };

    let campground = match parse_param(ctx, "id") {
        Some(id) => state.repo.get_campground(id).await?,
        None => None,
    };
    let Some(campground) = campground else {
        return redirect_with_error(ctx.session, CAMPGROUND_NOT_FOUND, "/campgrounds").await;
    };

    if campground.author_id != user_id {
        tracing::info!(
            %user_id,
            campground_id = %campground.id,
            "rejected non-author campground change"
        );
        return redirect_with_error(ctx.session, NO_PERMISSION, &ctx.campground_page()).await;
    }
    Ok(GuardOutcome::Continue)
}

async fn review_author(
    state: &AppState,
    ctx: &GuardContext<'_>,
) -> Result<GuardOutcome, AppError> {
    let user_id = match require_user(ctx).await? {
        Ok(id) => id,
        Err(outcome) => return Ok(outcome),
    };

    let Some(campground_id) = parse_param(ctx, "id") else {
        return redirect_with_error(ctx.session, CAMPGROUND_NOT_FOUND, "/campgrounds").await;
    };
    let review = match parse_param(ctx, "review_id") {
        Some(review_id) => state.repo.get_review(campground_id, review_id).await?,
        None => None,
    };
    let Some(review) = review else {
        return redirect_with_error(ctx.session, REVIEW_NOT_FOUND, "/campgrounds").await;
    };

    if review.author_id != user_id {
        tracing::info!(%user_id, review_id = %review.id, "rejected non-author review deletion");
        return redirect_with_error(ctx.session, NO_PERMISSION, &ctx.campground_page()).await;
    }
    Ok(GuardOutcome::Continue)
}

// A malformed id can never name an existing record.
fn parse_param(ctx: &GuardContext<'_>, name: &str) -> Option<Uuid> {
    ctx.params.get(name).and_then(|raw| Uuid::parse_str(raw).ok())
}
