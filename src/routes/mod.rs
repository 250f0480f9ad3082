/**
 * Routes Module
 * API route handlers, one module per resource
 */
pub mod auth;
pub mod authors;
pub mod blogs;
pub mod contact;
pub mod health;
pub mod profiles;
pub mod reviews;
pub mod saved_blogs;
pub mod users;

use axum::{body::Bytes, extract::FromRequest};
use serde::Deserialize;

use crate::db::{Filter, StoreError};
use crate::error::ApiError;

/// JSON request body whose rejections are reported as `400 {"message"}`
/// like every other failure.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

/// Query string for routes filtered by `?email=`
#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    pub email: Option<String>,
}

/// Interpret a GET request body as an equality filter over the collection.
///
/// An absent or blank body lists everything. Only top-level field equality is
/// honoured; operator keys are rejected so callers cannot widen the query.
pub(crate) fn body_filter(body: &Bytes) -> Result<Filter, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Filter::all());
    }

    let value: serde_json::Value = serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("malformed filter body: {}", e)))?;

    Filter::from_value(value).map_err(|e| {
        if let StoreError::InvalidFilter(reason) = &e {
            tracing::warn!(reason = %reason, "rejected filter body");
        }
        ApiError::from(e)
    })
}
