//! Server-side HTML rendering. Every user-supplied string goes through [`escape`] on its
//! way into a page.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, request::Parts},
    response::Html,
};
use std::fmt::Write;
use tower_sessions::Session;

use crate::{
    auth::{self, session_from_parts},
    error::AppError,
    flash::{self, Flash},
    models::{Campground, CampgroundDetails, User},
    repository::{Repository, RepositoryState},
};

const BOOTSTRAP_CSS: &str =
    "https://cdn.jsdelivr.net/npm/bootstrap@5.3.3/dist/css/bootstrap.min.css";

/// PageContext
///
/// What every rendered page shows besides its own content: who is logged in and the flash
/// messages queued by the previous request. Extracting it consumes those messages.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub current_user: Option<User>,
    pub flash: Flash,
}

impl<S> FromRequestParts<S> for PageContext
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = session_from_parts(parts, state).await?;
        let repo = RepositoryState::from_ref(state);
        PageContext::load(&session, repo.as_ref()).await
    }
}

impl PageContext {
    /// For handlers that may still redirect: load the context only once a page is
    /// certain to be rendered, so queued messages are not consumed by a redirect.
    pub async fn load(session: &Session, repo: &dyn Repository) -> Result<Self, AppError> {
        let current_user = auth::current_user(session, repo).await?;
        let flash = flash::take(session).await?;
        Ok(PageContext {
            current_user,
            flash,
        })
    }

    fn is_author(&self, author_id: uuid::Uuid) -> bool {
        self.current_user
            .as_ref()
            .is_some_and(|user| user.id == author_id)
    }
}

/// Escapes the five HTML-significant characters.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

// --- Layout ---

fn navbar(current_user: Option<&User>) -> String {
    let account = match current_user {
        Some(user) => format!(
            r#"<span class="navbar-text me-3">Signed in as {}</span>
        <a class="nav-link" href="/logout">Logout</a>"#,
            escape(&user.username)
        ),
        None => r#"<a class="nav-link" href="/login">Login</a>
        <a class="nav-link" href="/register">Register</a>"#
            .to_string(),
    };
    format!(
        r#"<nav class="navbar navbar-expand-lg navbar-dark bg-dark sticky-top">
  <div class="container-fluid">
    <a class="navbar-brand" href="/">YelpCamp</a>
    <div class="navbar-nav">
      <a class="nav-link" href="/">Home</a>
      <a class="nav-link" href="/campgrounds">Campgrounds</a>
      <a class="nav-link" href="/campgrounds/new">New Campground</a>
    </div>
    <div class="navbar-nav ms-auto">
        {}
    </div>
  </div>
</nav>"#,
        account
    )
}

fn flash_banners(flash: &Flash) -> String {
    let mut out = String::new();
    for (class, messages) in [("success", &flash.success), ("danger", &flash.error)] {
        for message in messages {
            let _ = write!(
                out,
                r#"<div class="alert alert-{} alert-dismissible fade show" role="alert">{}</div>"#,
                class,
                escape(message)
            );
        }
    }
    out
}

fn layout(title: &str, current_user: Option<&User>, flash: &Flash, body: &str) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>{title} | YelpCamp</title>
  <link rel="stylesheet" href="{css}">
</head>
<body class="d-flex flex-column vh-100">
{nav}
<main class="container mt-5">
{flash}
{body}
</main>
<footer class="footer bg-dark py-3 mt-auto">
  <div class="container"><span class="text-muted">&copy; YelpCamp</span></div>
</footer>
</body>
</html>"#,
        title = escape(title),
        css = BOOTSTRAP_CSS,
        nav = navbar(current_user),
        flash = flash_banners(flash),
        body = body,
    ))
}

fn page(ctx: &PageContext, title: &str, body: &str) -> Html<String> {
    layout(title, ctx.current_user.as_ref(), &ctx.flash, body)
}

// --- Pages ---

pub fn home(ctx: &PageContext) -> Html<String> {
    page(
        ctx,
        "Home",
        r#"<div class="text-center py-5">
  <h1>YelpCamp</h1>
  <p class="lead">Welcome to YelpCamp! Jump right in and explore our many campgrounds.
  Feel free to share some of your own and comment on others!</p>
  <a href="/campgrounds" class="btn btn-lg btn-secondary fw-bold">View Campgrounds</a>
</div>"#,
    )
}

pub fn campgrounds_index(ctx: &PageContext, campgrounds: &[Campground]) -> Html<String> {
    let mut body = String::from(r#"<h1>All Campgrounds</h1>"#);
    if campgrounds.is_empty() {
        body.push_str(r#"<p class="text-muted">No campgrounds yet.</p>"#);
    }
    for campground in campgrounds {
        let thumbnail = campground
            .images
            .first()
            .map(|image| {
                format!(
                    r#"<img class="img-fluid" alt="" src="{}">"#,
                    escape(&image.url)
                )
            })
            .unwrap_or_default();
        let _ = write!(
            body,
            r#"<div class="card mb-3">
  <div class="row">
    <div class="col-md-4">{thumbnail}</div>
    <div class="col-md-8">
      <div class="card-body">
        <h5 class="card-title">{title}</h5>
        <p class="card-text">{description}</p>
        <p class="card-text"><small class="text-muted">{location}</small></p>
        <a class="btn btn-primary" href="/campgrounds/{id}">View {title}</a>
      </div>
    </div>
  </div>
</div>"#,
            thumbnail = thumbnail,
            title = escape(&campground.title),
            description = escape(&campground.description),
            location = escape(&campground.location),
            id = campground.id,
        );
    }
    page(ctx, "Campgrounds", &body)
}

/// The shared field set of the new and edit forms.
fn campground_fields(campground: Option<&Campground>) -> String {
    let value = |pick: fn(&Campground) -> String| campground.map(pick).unwrap_or_default();
    format!(
        r#"<div class="mb-3">
  <label class="form-label" for="title">Title</label>
  <input class="form-control" type="text" id="title" name="title" value="{title}" required>
</div>
<div class="mb-3">
  <label class="form-label" for="location">Location</label>
  <input class="form-control" type="text" id="location" name="location" value="{location}" required>
</div>
<div class="mb-3">
  <label class="form-label" for="price">Campground Price</label>
  <div class="input-group">
    <span class="input-group-text">$</span>
    <input type="text" class="form-control" id="price" name="price" placeholder="0.00" value="{price}" required>
  </div>
</div>
<div class="mb-3">
  <label class="form-label" for="description">Description</label>
  <textarea class="form-control" id="description" name="description" required>{description}</textarea>
</div>
<div class="mb-3">
  <label class="form-label" for="image">Add Images</label>
  <input class="form-control" type="file" id="image" name="image" accept="image/*" multiple>
</div>"#,
        title = escape(&value(|c| c.title.clone())),
        location = escape(&value(|c| c.location.clone())),
        price = value(|c| c.price.to_string()),
        description = escape(&value(|c| c.description.clone())),
    )
}

pub fn campground_new(ctx: &PageContext) -> Html<String> {
    let body = format!(
        r#"<div class="row"><div class="col-md-6 offset-md-3">
<h1 class="text-center">New Campground</h1>
<form action="/campgrounds" method="POST" enctype="multipart/form-data">
{fields}
<button class="btn btn-success">Add Campground</button>
</form>
<a href="/campgrounds">All Campgrounds</a>
</div></div>"#,
        fields = campground_fields(None),
    );
    page(ctx, "New Campground", &body)
}

pub fn campground_edit(ctx: &PageContext, campground: &Campground) -> Html<String> {
    let mut removals = String::new();
    for (i, image) in campground.images.iter().enumerate() {
        let _ = write!(
            removals,
            r#"<div class="form-check-inline">
  <img src="{url}" class="img-thumbnail" alt="" style="width: 120px">
  <input type="checkbox" id="image-{i}" name="deleteImages[]" value="{filename}">
  <label for="image-{i}">Delete?</label>
</div>"#,
            url = escape(&image.url),
            filename = escape(&image.filename),
            i = i,
        );
    }
    let body = format!(
        r#"<div class="row"><div class="col-md-6 offset-md-3">
<h1 class="text-center">Edit Campground</h1>
<form action="/campgrounds/{id}?_method=PUT" method="POST" enctype="multipart/form-data">
{fields}
<div class="mb-3">{removals}</div>
<button class="btn btn-info">Update Campground</button>
</form>
<a href="/campgrounds/{id}">Back To Campground</a>
</div></div>"#,
        id = campground.id,
        fields = campground_fields(Some(campground)),
        removals = removals,
    );
    page(ctx, "Edit Campground", &body)
}

pub fn campground_show(ctx: &PageContext, details: &CampgroundDetails) -> Html<String> {
    let campground = &details.campground;

    let mut images = String::new();
    for image in &campground.images {
        let _ = write!(
            images,
            r#"<img src="{}" class="d-block w-100 mb-2" alt="">"#,
            escape(&image.url)
        );
    }

    let owner_controls = if ctx.is_author(campground.author_id) {
        format!(
            r#"<div class="card-body">
  <a class="card-link btn btn-info" href="/campgrounds/{id}/edit">Edit</a>
  <form class="d-inline" action="/campgrounds/{id}?_method=DELETE" method="POST">
    <button class="btn btn-danger">Delete</button>
  </form>
</div>"#,
            id = campground.id
        )
    } else {
        String::new()
    };

    let review_form = if ctx.current_user.is_some() {
        format!(
            r#"<h2>Leave a Review</h2>
<form action="/campgrounds/{id}/reviews" method="POST" class="mb-3">
  <div class="mb-3">
    <label class="form-label" for="rating">Rating</label>
    <input class="form-range" type="range" min="1" max="5" id="rating" name="rating">
  </div>
  <div class="mb-3">
    <label class="form-label" for="body">Review Text</label>
    <textarea class="form-control" name="body" id="body" cols="30" rows="3" required></textarea>
  </div>
  <button class="btn btn-success">Submit</button>
</form>"#,
            id = campground.id
        )
    } else {
        String::new()
    };

    let mut reviews = String::new();
    for entry in &details.reviews {
        let delete = if ctx.is_author(entry.review.author_id) {
            format!(
                r#"<form action="/campgrounds/{}/reviews/{}?_method=DELETE" method="POST">
    <button class="btn btn-sm btn-danger">Delete</button>
  </form>"#,
                campground.id, entry.review.id
            )
        } else {
            String::new()
        };
        let _ = write!(
            reviews,
            r#"<div class="card mb-3"><div class="card-body">
  <h5 class="card-title">{author}</h5>
  <p class="card-text">Rated: {rating} stars</p>
  <p class="card-text">Review: {body}</p>
  {delete}
</div></div>"#,
            author = escape(&entry.author.username),
            rating = entry.review.rating,
            body = escape(&entry.review.body),
            delete = delete,
        );
    }

    let body = format!(
        r#"<div class="row">
<div class="col-6">
  {images}
  <div class="card mb-3">
    <div class="card-body">
      <h5 class="card-title">{title}</h5>
      <p class="card-text">{description}</p>
    </div>
    <ul class="list-group list-group-flush">
      <li class="list-group-item text-muted">{location}</li>
      <li class="list-group-item">Submitted by {author}</li>
      <li class="list-group-item">${price}/night</li>
    </ul>
    {owner_controls}
  </div>
</div>
<div class="col-6">
  <div id="map" data-longitude="{lng}" data-latitude="{lat}"></div>
  {review_form}
  {reviews}
</div>
</div>"#,
        images = images,
        title = escape(&campground.title),
        description = escape(&campground.description),
        location = escape(&campground.location),
        author = escape(&details.author.username),
        price = campground.price,
        owner_controls = owner_controls,
        lng = campground.geometry.longitude,
        lat = campground.geometry.latitude,
        review_form = review_form,
        reviews = reviews,
    );
    page(ctx, &campground.title, &body)
}

fn credentials_form(ctx: &PageContext, heading: &str, action: &str, button: &str) -> Html<String> {
    let body = format!(
        r#"<div class="row"><div class="col-md-6 offset-md-3 col-xl-4 offset-xl-4">
<div class="card shadow"><div class="card-body">
<h5 class="card-title">{heading}</h5>
<form action="{action}" method="POST">
  <div class="mb-3">
    <label class="form-label" for="username">Username</label>
    <input class="form-control" type="text" id="username" name="username" autofocus required>
  </div>
  <div class="mb-3">
    <label class="form-label" for="password">Password</label>
    <input class="form-control" type="password" id="password" name="password" required>
  </div>
  <button class="btn btn-success w-100">{button}</button>
</form>
</div></div>
</div></div>"#,
        heading = heading,
        action = action,
        button = button,
    );
    page(ctx, heading, &body)
}

pub fn login(ctx: &PageContext) -> Html<String> {
    credentials_form(ctx, "Login", "/login", "Login")
}

pub fn register(ctx: &PageContext) -> Html<String> {
    credentials_form(ctx, "Register", "/register", "Register")
}

/// Rendered by `AppError`. Has no request context, so the navbar shows the anonymous links.
pub fn error_page(status: StatusCode, message: &str) -> Html<String> {
    let body = format!(
        r#"<div class="row"><div class="col-6 offset-3">
<div class="alert alert-danger" role="alert">
  <h4 class="alert-heading">{status}</h4>
  <p>{message}</p>
</div>
</div></div>"#,
        status = status.as_u16(),
        message = escape(message),
    );
    layout("Error", None, &Flash::default(), &body)
}
