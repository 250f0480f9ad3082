/**
 * Contact Routes
 * Visitor messages: submit and list, never edited
 */
use axum::{body::Bytes, extract::State, Json};

use crate::db::{Collection, Document, FindOptions, InsertOneResult};
use crate::error::ApiResult;
use crate::routes::{body_filter, JsonBody};
use crate::state::AppState;

/// POST /contact
pub async fn create_contact(
    State(state): State<AppState>,
    JsonBody(message): JsonBody<Document>,
) -> ApiResult<Json<InsertOneResult>> {
    let result = state.store.insert_one(Collection::Contacts, message).await?;
    tracing::info!(id = %result.inserted_id, "contact message received");
    Ok(Json(result))
}

/// GET /contact
pub async fn list_contacts(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<Vec<Document>>> {
    let filter = body_filter(&body)?;
    Ok(Json(
        state
            .store
            .find(Collection::Contacts, &filter, FindOptions::default())
            .await?,
    ))
}
