/**
 * Blog Routes
 * CRUD endpoints for blog posts
 */
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth::gate::Authenticated;
use crate::db::{
    Collection, DeleteResult, Document, Filter, FindOptions, InsertOneResult, UpdateResult,
};
use crate::error::ApiResult;
use crate::routes::{EmailQuery, JsonBody};
use crate::state::AppState;

/// Number of posts returned by GET /latest-blogs
const LATEST_LIMIT: usize = 5;

/// Field the latest-posts feed is ordered by
const TIMESTAMP_FIELD: &str = "date_time";

// ============================================================================
// Request Types
// ============================================================================

/// Request body for PUT /blog/:id. Every field is written; absent ones
/// become `null` and the like count is reset.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BlogOverwrite {
    pub title: Option<Value>,
    pub short_description: Option<Value>,
    pub blog_details: Option<Value>,
    pub category: Option<Value>,
    pub author_name: Option<Value>,
    pub email: Option<Value>,
    pub date_time: Option<Value>,
    pub image: Option<Value>,
}

impl BlogOverwrite {
    fn into_set(self) -> ApiResult<Document> {
        let mut set = match serde_json::to_value(self).map_err(crate::db::StoreError::from)? {
            Value::Object(fields) => fields,
            _ => Document::new(),
        };
        set.insert("likes".to_string(), Value::from(0));
        Ok(set)
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /blogs - Store the request body as a new post
pub async fn create_blog(
    State(state): State<AppState>,
    JsonBody(blog): JsonBody<Document>,
) -> ApiResult<Json<InsertOneResult>> {
    let result = state.store.insert_one(Collection::Blogs, blog).await?;
    tracing::info!(id = %result.inserted_id, "blog post created");
    Ok(Json(result))
}

/// GET /blogs - All posts in insertion order
pub async fn list_blogs(State(state): State<AppState>) -> ApiResult<Json<Vec<Document>>> {
    let blogs = state
        .store
        .find(Collection::Blogs, &Filter::all(), FindOptions::default())
        .await?;
    Ok(Json(blogs))
}

/// GET /blogs/:id - Single post, `null` when absent
pub async fn get_blog(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Option<Document>>> {
    let blog = state
        .store
        .find_one(Collection::Blogs, &Filter::by_id(id))
        .await?;
    Ok(Json(blog))
}

/// DELETE /blogs/:id - Remove a post. Bookmarks pointing at it are kept.
pub async fn delete_blog(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteResult>> {
    let result = state
        .store
        .delete_one(Collection::Blogs, &Filter::by_id(id.clone()))
        .await?;
    tracing::info!(id = %id, deleted = result.deleted_count, "blog post delete");
    Ok(Json(result))
}

/// GET /latest-blogs - Newest posts by `date_time`
pub async fn latest_blogs(State(state): State<AppState>) -> ApiResult<Json<Vec<Document>>> {
    let blogs = state
        .store
        .find(
            Collection::Blogs,
            &Filter::all(),
            FindOptions::default()
                .sort_desc(TIMESTAMP_FIELD)
                .limit(LATEST_LIMIT),
        )
        .await?;
    Ok(Json(blogs))
}

/// GET /blog?email= - Posts written by one author (credential required)
pub async fn blogs_by_email(
    _auth: Authenticated,
    State(state): State<AppState>,
    Query(query): Query<EmailQuery>,
) -> ApiResult<Json<Vec<Document>>> {
    let blogs = state
        .store
        .find(
            Collection::Blogs,
            &Filter::all().eq("email", query.email),
            FindOptions::default(),
        )
        .await?;
    Ok(Json(blogs))
}

/// GET /blog/:id - Single post (credential required)
pub async fn get_own_blog(
    _auth: Authenticated,
    state: State<AppState>,
    id: Path<String>,
) -> ApiResult<Json<Option<Document>>> {
    get_blog(state, id).await
}

/// PUT /blog/:id - Overwrite every post field and reset likes (credential required)
pub async fn update_blog(
    Authenticated(claims): Authenticated,
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<BlogOverwrite>,
) -> ApiResult<Json<UpdateResult>> {
    let result = state
        .store
        .update_one(Collection::Blogs, &Filter::by_id(id.clone()), payload.into_set()?)
        .await?;
    tracing::info!(
        id = %id,
        editor = claims.email().unwrap_or("<none>"),
        matched = result.matched_count,
        "blog post overwritten"
    );
    Ok(Json(result))
}
