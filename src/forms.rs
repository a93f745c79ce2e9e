use axum::extract::{Form, FromRequest, Multipart, Request};
use serde::{Deserialize, Deserializer, de::DeserializeOwned};
use std::{borrow::Cow, fmt::Display, str::FromStr};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{error::AppError, storage::PendingUpload};

// --- Form Schemas ---

/// CampgroundForm
///
/// The text half of the create/edit campground form. Images travel alongside it in the
/// same multipart body and are collected by [`CampgroundSubmission`].
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CampgroundForm {
    #[validate(length(min = 1, message = "is required"), custom(function = "no_html"))]
    pub title: String,
    #[validate(
        required(message = "is required"),
        range(min = 0.0, message = "must be greater than or equal to 0")
    )]
    pub price: Option<f64>,
    #[validate(length(min = 1, message = "is required"), custom(function = "no_html"))]
    pub location: String,
    #[validate(length(min = 1, message = "is required"), custom(function = "no_html"))]
    pub description: String,
    // Storage filenames the author ticked for removal (edit form only).
    #[serde(default)]
    pub delete_images: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ReviewForm {
    #[serde(default)]
    #[validate(length(min = 1, message = "is required"), custom(function = "no_html"))]
    pub body: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(
        required(message = "is required"),
        range(min = 1, max = 5, message = "must be between 1 and 5")
    )]
    pub rating: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct RegisterForm {
    #[serde(default)]
    #[validate(
        length(min = 1, max = 30, message = "must be between 1 and 30 characters"),
        custom(function = "username_chars")
    )]
    pub username: String,
    #[serde(default)]
    #[validate(length(min = 8, message = "must be at least 8 characters"))]
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct LoginForm {
    #[serde(default)]
    #[validate(length(min = 1, message = "is required"))]
    pub username: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "is required"))]
    pub password: String,
}

// --- Custom Rules ---

/// Free text must not carry markup: anything that looks like a tag or an entity is refused.
fn no_html(value: &str) -> Result<(), ValidationError> {
    let looks_like_tag = value
        .char_indices()
        .filter(|(_, c)| *c == '<')
        .any(|(i, _)| {
            value[i + 1..]
                .chars()
                .next()
                .is_some_and(|next| next.is_ascii_alphabetic() || next == '/' || next == '!')
        });
    let looks_like_entity = value.split('&').skip(1).any(|rest| {
        rest.split_once(';').is_some_and(|(name, _)| {
            !name.is_empty()
                && name.len() <= 10
                && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '#')
        })
    });

    if looks_like_tag || looks_like_entity {
        return Err(
            ValidationError::new("no_html").with_message(Cow::Borrowed("must not include HTML!")),
        );
    }
    Ok(())
}

fn username_chars(value: &str) -> Result<(), ValidationError> {
    if value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        Ok(())
    } else {
        Err(ValidationError::new("username_chars").with_message(Cow::Borrowed(
            "may only contain letters, digits, '_', '-' and '.'",
        )))
    }
}

/// Browsers submit an untouched number input as an empty string; treat it as absent.
fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => text.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// violations
///
/// Flattens a validation report into one "`field` `message`" line per violation, ordered
/// by field name so the joined message is stable.
pub fn violations(errors: &ValidationErrors) -> Vec<String> {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    fields
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |err| match &err.message {
                Some(message) => format!("{} {}", field, message),
                None => format!("{} is invalid", field),
            })
        })
        .collect()
}

// --- Extractors ---

/// ValidatedForm
///
/// A url-encoded form that has passed its schema. Rejects with `AppError::Validation`
/// (400) before the handler runs.
#[derive(Debug, Clone)]
pub struct ValidatedForm<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedForm<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Form(value) = Form::<T>::from_request(req, state).await?;
        value
            .validate()
            .map_err(|e| AppError::Validation(violations(&e)))?;
        Ok(ValidatedForm(value))
    }
}

/// CampgroundSubmission
///
/// A validated multipart campground form plus the image files buffered from it. Nothing
/// has been uploaded yet: storage only sees the files once validation has passed.
#[derive(Debug, Clone, Default)]
pub struct CampgroundSubmission {
    pub form: CampgroundForm,
    pub files: Vec<PendingUpload>,
}

impl<S> FromRequest<S> for CampgroundSubmission
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mut multipart = Multipart::from_request(req, state).await?;

        let mut form = CampgroundForm::default();
        let mut files = Vec::new();
        let mut problems = Vec::new();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "image" | "image[]" => {
                    let original_name = field.file_name().unwrap_or_default().to_string();
                    let content_type = field.content_type().unwrap_or_default().to_string();
                    let bytes = field.bytes().await?;
                    // An empty file input still submits a part with no name and no body.
                    if original_name.is_empty() && bytes.is_empty() {
                        continue;
                    }
                    if !content_type.starts_with("image/") {
                        problems.push(format!("image {:?} is not an image file", original_name));
                        continue;
                    }
                    files.push(PendingUpload {
                        original_name,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
                "title" => form.title = field.text().await?,
                "location" => form.location = field.text().await?,
                "description" => form.description = field.text().await?,
                "price" => {
                    let text = field.text().await?;
                    let text = text.trim();
                    if !text.is_empty() {
                        match text.parse::<f64>() {
                            Ok(price) if price.is_finite() => form.price = Some(price),
                            _ => problems.push("price must be a number".to_string()),
                        }
                    }
                }
                "deleteImages" | "deleteImages[]" => {
                    let filename = field.text().await?;
                    if !filename.is_empty() {
                        form.delete_images.push(filename);
                    }
                }
                other => tracing::debug!(field = other, "ignoring unknown campground form field"),
            }
        }

        if let Err(errors) = form.validate() {
            problems.extend(violations(&errors));
        }
        // An unparseable price is reported once, not also as missing.
        if problems.iter().any(|p| p == "price must be a number") {
            problems.retain(|p| p != "price is required");
        }
        if !problems.is_empty() {
            return Err(AppError::Validation(problems));
        }

        Ok(CampgroundSubmission { form, files })
    }
}
