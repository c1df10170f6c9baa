//! JSON body extractor that runs `validator` rules before the handler.
//!
//! Malformed bodies are rejected with 400 and kind `invalid_body`; bodies
//! that decode but break a field rule are rejected with 422 and kind
//! `validation_failed`.

use anyhow::anyhow;
use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use homeroom_core::AppError;

fn format_errors(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| {
                error
                    .message
                    .as_ref()
                    .map(|msg| msg.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field))
            })
        })
        .collect();
    messages.sort();
    messages.join(", ")
}

fn describe_rejection(rejection: &JsonRejection) -> String {
    if matches!(rejection, JsonRejection::MissingJsonContentType(_)) {
        return "Missing 'Content-Type: application/json' header".to_string();
    }

    let body_text = rejection.body_text();

    if let Some(field) = body_text
        .split("missing field `")
        .nth(1)
        .and_then(|s| s.split('`').next())
    {
        return format!("{} is required", field);
    }

    if body_text.contains("input contains invalid characters")
        || body_text.contains("premature end of input")
        || body_text.contains("input is out of range")
        || body_text.contains("trailing input")
        || body_text.contains("no possible date and time matching input")
    {
        return "date must be an ISO-8601 calendar date (YYYY-MM-DD)".to_string();
    }

    if body_text.contains("invalid type") {
        return "Invalid field type in request".to_string();
    }

    "Invalid request body".to_string()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| {
                AppError::bad_request(anyhow!("{}", describe_rejection(&rejection)))
                    .with_kind("invalid_body")
            })?;

        value.validate().map_err(|errors| {
            AppError::unprocessable(anyhow!("{}", format_errors(&errors)))
                .with_kind("validation_failed")
        })?;

        Ok(ValidatedJson(value))
    }
}
