/**
 * Saved-Blog Routes
 * Per-user bookmarks, unique per (blogId, email)
 */
use axum::{
    extract::{Query, State},
    Json,
};
use serde_json::{Map, Value};

use crate::db::{Collection, Document, Filter, FindOptions, InsertOneResult};
use crate::error::{ApiError, ApiResult};
use crate::routes::{EmailQuery, JsonBody};
use crate::state::AppState;

/// Natural key of a bookmark
const BOOKMARK_KEY: [&str; 2] = ["blogId", "email"];

/// Missing, null, empty-string, zero and false all count as "not supplied".
fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Bool(b)) => !b,
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        Some(_) => false,
    }
}

/// Pull `blogId` and `email` out of the body by name. Non-object bodies
/// carry neither field.
fn bookmark_from(body: &Value) -> Option<Document> {
    let blog_id = body.get("blogId");
    let email = body.get("email");
    if !body.is_object() || is_blank(blog_id) || is_blank(email) {
        return None;
    }

    let mut bookmark = Map::new();
    bookmark.insert("blogId".to_string(), blog_id.cloned().unwrap_or_default());
    bookmark.insert("email".to_string(), email.cloned().unwrap_or_default());
    Some(bookmark)
}

/// POST /save-blogs - Bookmark a post; 400 when fields are missing or already saved
pub async fn save_blog(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<Value>,
) -> ApiResult<Json<InsertOneResult>> {
    let Some(bookmark) = bookmark_from(&body) else {
        return Err(ApiError::BadRequest("Missing blogId or email".to_string()));
    };

    match state
        .store
        .insert_unique(Collection::SavedBlogs, &BOOKMARK_KEY, bookmark)
        .await?
    {
        Some(result) => Ok(Json(result)),
        None => {
            tracing::info!("duplicate bookmark suppressed");
            Err(ApiError::Conflict("Blog already saved".to_string()))
        }
    }
}

/// GET /saved-blogs?email=
pub async fn saved_blogs_by_email(
    State(state): State<AppState>,
    Query(query): Query<EmailQuery>,
) -> ApiResult<Json<Vec<Document>>> {
    let saved = state
        .store
        .find(
            Collection::SavedBlogs,
            &Filter::all().eq("email", query.email),
            FindOptions::default(),
        )
        .await?;
    Ok(Json(saved))
}
