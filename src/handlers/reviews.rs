use axum::{
    extract::{Path, State},
    response::Redirect,
};
use tower_sessions::Session;

use crate::{
    AppState,
    auth::AuthUser,
    error::AppResult,
    flash,
    forms::{ReviewForm, ValidatedForm},
    handlers::{campground_missing, parse_id},
    models::NewReview,
};

/// create_review
///
/// POST /campgrounds/{id}/reviews. Attaches a validated review, authored by the current
/// user, to the campground.
pub async fn create_review(
    State(state): State<AppState>,
    session: Session,
    user: AuthUser,
    Path(id): Path<String>,
    ValidatedForm(form): ValidatedForm<ReviewForm>,
) -> AppResult<Redirect> {
    let Some(campground_id) = parse_id(&id) else {
        return campground_missing(&session).await;
    };

    let review = state
        .repo
        .create_review(
            campground_id,
            NewReview {
                body: form.body,
                rating: form.rating.unwrap_or_default(),
                author_id: user.id,
            },
        )
        .await?;
    let Some(review) = review else {
        return campground_missing(&session).await;
    };

    tracing::info!(%campground_id, review_id = %review.id, "review created");
    flash::success(&session, "Created new review!").await?;
    Ok(Redirect::to(&format!("/campgrounds/{}", campground_id)))
}

/// delete_review
///
/// DELETE /campgrounds/{id}/reviews/{review_id}
pub async fn delete_review(
    State(state): State<AppState>,
    session: Session,
    Path((id, review_id)): Path<(String, String)>,
) -> AppResult<Redirect> {
    let (Some(campground_id), Some(review_id)) = (parse_id(&id), parse_id(&review_id)) else {
        return campground_missing(&session).await;
    };

    if state.repo.delete_review(campground_id, review_id).await? {
        tracing::info!(%campground_id, %review_id, "review deleted");
        flash::success(&session, "Successfully deleted review").await?;
    }
    Ok(Redirect::to(&format!("/campgrounds/{}", campground_id)))
}
