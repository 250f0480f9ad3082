/**
 * Author Routes
 */
use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};

use crate::db::{Collection, Document, Filter, FindOptions, InsertOneResult};
use crate::error::ApiResult;
use crate::routes::{body_filter, JsonBody};
use crate::state::AppState;

/// POST /addAuthor
pub async fn create_author(
    State(state): State<AppState>,
    JsonBody(author): JsonBody<Document>,
) -> ApiResult<Json<InsertOneResult>> {
    Ok(Json(state.store.insert_one(Collection::Authors, author).await?))
}

/// GET /authors
pub async fn list_authors(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<Vec<Document>>> {
    let filter = body_filter(&body)?;
    Ok(Json(
        state
            .store
            .find(Collection::Authors, &filter, FindOptions::default())
            .await?,
    ))
}

/// GET /authors/:id
pub async fn get_author(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Option<Document>>> {
    Ok(Json(
        state
            .store
            .find_one(Collection::Authors, &Filter::by_id(id))
            .await?,
    ))
}
