use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::{Session, session, session_store};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::User,
    repository::{Repository, RepositoryState},
};

// --- Session Keys ---

/// The authenticated user's id. Its presence is what "logged in" means.
pub const USER_ID: &str = "user_id";
/// Where to send the user after a successful login.
pub const RETURN_TO: &str = "return_to";

// --- Password Strategy ---

/// Hashes a password with Argon2id and a fresh random salt, returning the PHC string.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::PasswordHash(e.to_string()))
}

/// Constant-time verification against a stored PHC string. A malformed stored hash
/// simply fails verification.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash)
        .and_then(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed))
        .is_ok()
}

// --- Session Serialization ---

/// log_in
///
/// Rotates the session id (defeats fixation) and stores the user's id. Pending flash
/// messages and `return_to` survive the rotation.
pub async fn log_in(session: &Session, user_id: Uuid) -> Result<(), session::Error> {
    session.cycle_id().await?;
    session.insert(USER_ID, user_id).await
}

pub async fn log_out(session: &Session) -> Result<(), session::Error> {
    session.remove::<Uuid>(USER_ID).await?;
    session.remove::<String>(RETURN_TO).await?;
    Ok(())
}

/// current_user
///
/// Deserializes the session's stored identity into a user. A stale id (user deleted since
/// login) is dropped from the session and resolves to anonymous.
pub async fn current_user(
    session: &Session,
    repo: &dyn Repository,
) -> Result<Option<User>, AppError> {
    let Some(user_id) = session.get::<Uuid>(USER_ID).await? else {
        return Ok(None);
    };
    match repo.get_user(user_id).await? {
        Some(user) => Ok(Some(user)),
        None => {
            tracing::info!(%user_id, "session refers to unknown user, clearing");
            session.remove::<Uuid>(USER_ID).await?;
            Ok(None)
        }
    }
}

pub(crate) async fn session_from_parts<S: Send + Sync>(
    parts: &mut Parts,
    state: &S,
) -> Result<Session, AppError> {
    Session::from_request_parts(parts, state)
        .await
        .map_err(|(_, msg)| {
            AppError::Session(session::Error::Store(session_store::Error::Backend(
                msg.to_string(),
            )))
        })
}

/// CurrentUser
///
/// The request's user context: `Some` for a logged-in visitor, `None` for anonymous.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Option<User>);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = session_from_parts(parts, state).await?;
        let repo = RepositoryState::from_ref(state);
        Ok(CurrentUser(current_user(&session, repo.as_ref()).await?))
    }
}

/// AuthUser
///
/// The resolved identity of an authenticated request. Routes that take it are also
/// behind the `Authenticated` guard; the extractor's own redirect only fires if a route
/// is wired without that guard.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
}

/// Rejection for [`AuthUser`]: either a redirect to the login page or a hard failure.
pub enum AuthRejection {
    LoginRequired,
    Failed(AppError),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            AuthRejection::LoginRequired => Redirect::to("/login").into_response(),
            AuthRejection::Failed(e) => e.into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state)
            .await
            .map_err(AuthRejection::Failed)?;
        let user = user.ok_or(AuthRejection::LoginRequired)?;
        Ok(AuthUser {
            id: user.id,
            username: user.username,
        })
    }
}
