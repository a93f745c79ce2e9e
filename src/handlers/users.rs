use axum::{extract::State, response::Html, response::Redirect};
use tower_sessions::Session;

use crate::{
    AppState,
    auth::{self, RETURN_TO},
    error::{AppError, AppResult},
    flash,
    forms::{LoginForm, RegisterForm, ValidatedForm},
    repository::RepositoryError,
    views::{self, PageContext},
};

/// GET /
pub async fn home(ctx: PageContext) -> Html<String> {
    views::home(&ctx)
}

pub async fn render_register(ctx: PageContext) -> Html<String> {
    views::register(&ctx)
}

/// register
///
/// POST /register. Creates the account and logs it in straight away.
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    ValidatedForm(form): ValidatedForm<RegisterForm>,
) -> AppResult<Redirect> {
    let password_hash = auth::hash_password(&form.password)?;

    let user = match state.repo.create_user(&form.username, &password_hash).await {
        Ok(user) => user,
        Err(RepositoryError::UsernameTaken) => {
            flash::error(&session, "A user with the given username is already registered")
                .await?;
            return Ok(Redirect::to("/register"));
        }
        Err(e) => return Err(AppError::from(e)),
    };

    auth::log_in(&session, user.id).await?;
    tracing::info!(user_id = %user.id, username = %user.username, "user registered");
    flash::success(&session, "Welcome to Yelp Camp!").await?;
    Ok(Redirect::to("/campgrounds"))
}

pub async fn render_login(ctx: PageContext) -> Html<String> {
    views::login(&ctx)
}

/// login
///
/// POST /login. On success, continues to the page that demanded authentication, if any.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    ValidatedForm(form): ValidatedForm<LoginForm>,
) -> AppResult<Redirect> {
    let user = state
        .repo
        .find_user_by_username(&form.username)
        .await?
        .filter(|user| auth::verify_password(&form.password, &user.password_hash));

    let Some(user) = user else {
        tracing::info!(username = %form.username, "failed login attempt");
        flash::error(&session, "Password or username is incorrect").await?;
        return Ok(Redirect::to("/login"));
    };

    let return_to = session
        .remove::<String>(RETURN_TO)
        .await?
        .filter(|path| path.starts_with('/') && !path.starts_with("//"))
        .unwrap_or_else(|| "/campgrounds".to_string());

    auth::log_in(&session, user.id).await?;
    flash::success(&session, "Welcome back!").await?;
    Ok(Redirect::to(&return_to))
}

/// GET /logout
pub async fn logout(session: Session) -> AppResult<Redirect> {
    auth::log_out(&session).await?;
    flash::success(&session, "Goodbye!").await?;
    Ok(Redirect::to("/campgrounds"))
}
