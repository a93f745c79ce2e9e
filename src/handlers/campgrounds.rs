use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::{
    AppState,
    auth::AuthUser,
    error::AppResult,
    flash,
    forms::CampgroundSubmission,
    geocoding::GeocodeError,
    handlers::{campground_missing, parse_id},
    models::{CampgroundChanges, NewCampground},
    storage,
    views::{self, PageContext},
};

/// The message shown when a location cannot be placed on the map.
fn location_not_found(location: &str, err: &GeocodeError) -> String {
    match err {
        GeocodeError::NoMatch(_) => format!("Could not find the location \"{}\"", location),
        GeocodeError::Request(_) => {
            "The location service is unavailable, please try again later".to_string()
        }
    }
}

/// index
///
/// GET /campgrounds. Every campground, newest last.
pub async fn index(State(state): State<AppState>, ctx: PageContext) -> AppResult<Html<String>> {
    let campgrounds = state.repo.list_campgrounds().await?;
    Ok(views::campgrounds_index(&ctx, &campgrounds))
}

/// GET /campgrounds/new
pub async fn render_new_form(ctx: PageContext) -> Html<String> {
    views::campground_new(&ctx)
}

/// create_campground
///
/// POST /campgrounds. The submission is already validated; the location is geocoded
/// before any file reaches storage, so a failed lookup leaves nothing behind.
pub async fn create_campground(
    State(state): State<AppState>,
    session: Session,
    user: AuthUser,
    CampgroundSubmission { form, files }: CampgroundSubmission,
) -> AppResult<Redirect> {
    let geometry = match state.geocoder.forward(&form.location).await {
        Ok(point) => point,
        Err(e) => {
            tracing::warn!(location = %form.location, "geocoding failed: {}", e);
            flash::error(&session, location_not_found(&form.location, &e)).await?;
            return Ok(Redirect::to("/campgrounds/new"));
        }
    };

    let images = storage::upload_images(state.storage.as_ref(), files).await?;

    let campground = state
        .repo
        .create_campground(NewCampground {
            title: form.title,
            price: form.price.unwrap_or_default(),
            description: form.description,
            location: form.location,
            geometry,
            images,
            author_id: user.id,
        })
        .await?;

    tracing::info!(campground_id = %campground.id, author = %user.username, "campground created");
    flash::success(&session, "Successfully made a new campground!").await?;
    Ok(Redirect::to(&format!("/campgrounds/{}", campground.id)))
}

/// show_campground
///
/// GET /campgrounds/{id}. Populated details, or back to the listing if the id names
/// nothing.
pub async fn show_campground(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let details = match parse_id(&id) {
        Some(id) => state.repo.get_campground_details(id).await?,
        None => None,
    };
    let Some(details) = details else {
        return Ok(campground_missing(&session).await?.into_response());
    };

    let ctx = PageContext::load(&session, state.repo.as_ref()).await?;
    Ok(views::campground_show(&ctx, &details).into_response())
}

/// GET /campgrounds/{id}/edit
pub async fn render_edit_form(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let campground = match parse_id(&id) {
        Some(id) => state.repo.get_campground(id).await?,
        None => None,
    };
    let Some(campground) = campground else {
        return Ok(campground_missing(&session).await?.into_response());
    };

    let ctx = PageContext::load(&session, state.repo.as_ref()).await?;
    Ok(views::campground_edit(&ctx, &campground).into_response())
}

/// update_campground
///
/// PUT /campgrounds/{id}. Re-geocodes only when the location text changed. Images ticked
/// for removal leave the record first and storage second.
pub async fn update_campground(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    CampgroundSubmission { form, files }: CampgroundSubmission,
) -> AppResult<Redirect> {
    let existing = match parse_id(&id) {
        Some(id) => state.repo.get_campground(id).await?,
        None => None,
    };
    let Some(existing) = existing else {
        return campground_missing(&session).await;
    };

    let geometry = if form.location == existing.location {
        existing.geometry
    } else {
        match state.geocoder.forward(&form.location).await {
            Ok(point) => point,
            Err(e) => {
                tracing::warn!(location = %form.location, "geocoding failed: {}", e);
                flash::error(&session, location_not_found(&form.location, &e)).await?;
                return Ok(Redirect::to(&format!("/campgrounds/{}/edit", existing.id)));
            }
        }
    };

    // Only images that actually belong to this campground may be removed from storage.
    let remove_filenames: Vec<String> = form
        .delete_images
        .into_iter()
        .filter(|filename| existing.images.iter().any(|image| &image.filename == filename))
        .collect();

    let add_images = storage::upload_images(state.storage.as_ref(), files).await?;

    let updated = state
        .repo
        .update_campground(
            existing.id,
            CampgroundChanges {
                title: form.title,
                price: form.price.unwrap_or_default(),
                description: form.description,
                location: form.location,
                geometry,
                add_images,
                remove_filenames: remove_filenames.clone(),
            },
        )
        .await?;
    let Some(updated) = updated else {
        return campground_missing(&session).await;
    };

    storage::delete_images(
        state.storage.as_ref(),
        remove_filenames.iter().map(String::as_str),
    )
    .await;

    tracing::info!(
        campground_id = %updated.id,
        removed = remove_filenames.len(),
        "campground updated"
    );
    flash::success(&session, "Successfully updated campground!").await?;
    Ok(Redirect::to(&format!("/campgrounds/{}", updated.id)))
}

/// delete_campground
///
/// DELETE /campgrounds/{id}. Reviews go with the record; images are then released from
/// storage.
pub async fn delete_campground(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> AppResult<Redirect> {
    let removed = match parse_id(&id) {
        Some(id) => state.repo.delete_campground(id).await?,
        None => None,
    };
    let Some(removed) = removed else {
        return campground_missing(&session).await;
    };

    let filenames: Vec<&str> = removed
        .images
        .iter()
        .map(|image| image.filename.as_str())
        .collect();
    storage::delete_images(state.storage.as_ref(), filenames).await;

    tracing::info!(campground_id = %removed.id, "campground deleted");
    flash::success(&session, "Successfully deleted campground").await?;
    Ok(Redirect::to("/campgrounds"))
}
