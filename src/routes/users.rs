/**
 * User Routes
 * Registration, lookup and role management
 */
use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::auth::gate::{self, AdminOnly, Authenticated};
use crate::db::{
    models::ADMIN_ROLE, Collection, DeleteResult, Document, Filter, FindOptions, InsertOneResult,
    UpdateResult,
};
use crate::error::{ApiError, ApiResult};
use crate::routes::{body_filter, JsonBody};
use crate::state::AppState;

/// Natural key of a user record
const USER_KEY: [&str; 1] = ["email"];

#[derive(Debug, Serialize)]
pub struct AdminStatus {
    pub admin: bool,
}

/// POST /users - Register a user; 400 when the email is already taken
pub async fn create_user(
    State(state): State<AppState>,
    JsonBody(user): JsonBody<Document>,
) -> ApiResult<Json<InsertOneResult>> {
    let has_email = matches!(user.get("email"), Some(Value::String(email)) if !email.is_empty());
    if !has_email {
        return Err(ApiError::BadRequest("Missing email".to_string()));
    }

    match state
        .store
        .insert_unique(Collection::Users, &USER_KEY, user)
        .await?
    {
        Some(result) => {
            tracing::info!(id = %result.inserted_id, "user registered");
            Ok(Json(result))
        }
        None => Err(ApiError::Conflict("user already exists".to_string())),
    }
}

/// GET /users
pub async fn list_users(
    _auth: Authenticated,
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<Vec<Document>>> {
    let filter = body_filter(&body)?;
    Ok(Json(
        state
            .store
            .find(Collection::Users, &filter, FindOptions::default())
            .await?,
    ))
}

/// GET /users/:id
pub async fn get_user(
    _auth: Authenticated,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Option<Document>>> {
    Ok(Json(
        state
            .store
            .find_one(Collection::Users, &Filter::by_id(id))
            .await?,
    ))
}

/// DELETE /users/:id (admin)
pub async fn delete_user(
    AdminOnly(claims): AdminOnly,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteResult>> {
    let result = state
        .store
        .delete_one(Collection::Users, &Filter::by_id(id.clone()))
        .await?;
    tracing::info!(id = %id, admin = claims.email().unwrap_or("<none>"), "user deleted");
    Ok(Json(result))
}

/// PUT /users/admin/:id - Promote a user to admin (admin)
pub async fn make_admin(
    AdminOnly(claims): AdminOnly,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<UpdateResult>> {
    let mut set = Map::new();
    set.insert("role".to_string(), Value::from(ADMIN_ROLE));

    let result = state
        .store
        .update_one(Collection::Users, &Filter::by_id(id.clone()), set)
        .await?;
    tracing::info!(
        id = %id,
        admin = claims.email().unwrap_or("<none>"),
        matched = result.matched_count,
        "user promoted"
    );
    Ok(Json(result))
}

/// GET /users/admin/:email - Whether the caller is an admin. Callers may only ask about themselves.
pub async fn admin_status(
    Authenticated(claims): Authenticated,
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> ApiResult<Json<AdminStatus>> {
    if claims.email() != Some(email.as_str()) {
        tracing::warn!(requested = %email, "admin status requested for another user");
        return Err(ApiError::Forbidden);
    }

    let admin = gate::is_admin(&state, &email).await?;
    Ok(Json(AdminStatus { admin }))
}
