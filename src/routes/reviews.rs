/**
 * Review Routes
 * Public reads and submissions; edits and removals are admin-only
 */
use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth::gate::AdminOnly;
use crate::db::{
    Collection, DeleteResult, Document, Filter, FindOptions, InsertOneResult, StoreError,
    UpdateResult,
};
use crate::error::ApiResult;
use crate::routes::{body_filter, JsonBody};
use crate::state::AppState;

/// Request body for PUT /review/:id. All three fields are written.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewOverwrite {
    pub name: Option<Value>,
    pub designation: Option<Value>,
    pub review: Option<Value>,
}

/// POST /review
pub async fn create_review(
    State(state): State<AppState>,
    JsonBody(review): JsonBody<Document>,
) -> ApiResult<Json<InsertOneResult>> {
    Ok(Json(state.store.insert_one(Collection::Reviews, review).await?))
}

/// GET /review - Optional JSON body narrows the list by field equality
pub async fn list_reviews(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<Vec<Document>>> {
    let filter = body_filter(&body)?;
    let reviews = state
        .store
        .find(Collection::Reviews, &filter, FindOptions::default())
        .await?;
    Ok(Json(reviews))
}

/// GET /review/:id
pub async fn get_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Option<Document>>> {
    Ok(Json(
        state
            .store
            .find_one(Collection::Reviews, &Filter::by_id(id))
            .await?,
    ))
}

/// PUT /review/:id (admin)
pub async fn update_review(
    AdminOnly(claims): AdminOnly,
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<ReviewOverwrite>,
) -> ApiResult<Json<UpdateResult>> {
    let set = match serde_json::to_value(payload).map_err(StoreError::from)? {
        Value::Object(fields) => fields,
        _ => Document::new(),
    };

    let result = state
        .store
        .update_one(Collection::Reviews, &Filter::by_id(id.clone()), set)
        .await?;
    tracing::info!(id = %id, admin = claims.email().unwrap_or("<none>"), "review updated");
    Ok(Json(result))
}

/// DELETE /review/:id (admin)
pub async fn delete_review(
    AdminOnly(claims): AdminOnly,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteResult>> {
    let result = state
        .store
        .delete_one(Collection::Reviews, &Filter::by_id(id.clone()))
        .await?;
    tracing::info!(id = %id, admin = claims.email().unwrap_or("<none>"), "review deleted");
    Ok(Json(result))
}
