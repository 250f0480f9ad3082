/**
 * Profile Routes
 */
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::auth::gate::Authenticated;
use crate::db::{
    Collection, Document, Filter, FindOptions, InsertOneResult, StoreError, UpdateResult,
};
use crate::error::ApiResult;
use crate::routes::{EmailQuery, JsonBody};
use crate::state::AppState;

/// Request body for PUT /profiles/:id. Only the fields present are written;
/// an explicit `null` clears the field.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ProfilePatch {
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub name: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub bio: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub designation: Option<Value>,
}

/// `Some` for any supplied value, `null` included. Absent fields fall back to
/// `None` through `#[serde(default)]`.
fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

/// POST /profile
pub async fn create_profile(
    State(state): State<AppState>,
    JsonBody(profile): JsonBody<Document>,
) -> ApiResult<Json<InsertOneResult>> {
    Ok(Json(state.store.insert_one(Collection::Profiles, profile).await?))
}

/// GET /profile?email= (credential required)
pub async fn profiles_by_email(
    _auth: Authenticated,
    State(state): State<AppState>,
    Query(query): Query<EmailQuery>,
) -> ApiResult<Json<Vec<Document>>> {
    Ok(Json(
        state
            .store
            .find(
                Collection::Profiles,
                &Filter::all().eq("email", query.email),
                FindOptions::default(),
            )
            .await?,
    ))
}

/// GET /profiles/:id
pub async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Option<Document>>> {
    Ok(Json(
        state
            .store
            .find_one(Collection::Profiles, &Filter::by_id(id))
            .await?,
    ))
}

/// PUT /profiles/:id
pub async fn update_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(patch): JsonBody<ProfilePatch>,
) -> ApiResult<Json<UpdateResult>> {
    let set = match serde_json::to_value(patch).map_err(StoreError::from)? {
        Value::Object(fields) => fields,
        _ => Document::new(),
    };

    Ok(Json(
        state
            .store
            .update_one(Collection::Profiles, &Filter::by_id(id), set)
            .await?,
    ))
}

#[cfg(test)]
mod tests {
    use crate::test_support::{bearer, call, test_state};
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn test_partial_update_keeps_other_fields() {
        let state = test_state();
        let (_, created) = call(
            &state,
            Method::POST,
            "/profile",
            None,
            Some(json!({"email": "p@blog.dev", "name": "Pat", "bio": "Writes", "designation": "Editor"})),
        )
        .await;
        let id = created["insertedId"].as_str().unwrap().to_string();

        let (status, body) = call(
            &state,
            Method::PUT,
            &format!("/profiles/{}", id),
            None,
            Some(json!({"bio": "Writes a lot", "email": "hijack@blog.dev"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["matchedCount"], 1);

        let (_, profile) = call(&state, Method::GET, &format!("/profiles/{}", id), None, None).await;
        assert_eq!(profile["bio"], "Writes a lot");
        assert_eq!(profile["name"], "Pat");
        assert_eq!(profile["designation"], "Editor");
        assert_eq!(profile["email"], "p@blog.dev");
    }

    #[tokio::test]
    async fn test_explicit_null_clears_field() {
        let state = test_state();
        let (_, created) = call(
            &state,
            Method::POST,
            "/profile",
            None,
            Some(json!({"email": "p@blog.dev", "name": "Pat", "bio": "Writes"})),
        )
        .await;
        let id = created["insertedId"].as_str().unwrap().to_string();

        let (_, body) = call(
            &state,
            Method::PUT,
            &format!("/profiles/{}", id),
            None,
            Some(json!({"bio": null})),
        )
        .await;
        assert_eq!(body["modifiedCount"], 1);

        let (_, profile) = call(&state, Method::GET, &format!("/profiles/{}", id), None, None).await;
        assert!(profile["bio"].is_null());
        assert!(profile.as_object().unwrap().contains_key("bio"));
        assert_eq!(profile["name"], "Pat");
    }

    #[tokio::test]
    async fn test_profiles_by_email_requires_credential() {
        let state = test_state();
        call(&state, Method::POST, "/profile", None, Some(json!({"email": "p@blog.dev"}))).await;
        call(&state, Method::POST, "/profile", None, Some(json!({"email": "q@blog.dev"}))).await;

        let (status, _) = call(&state, Method::GET, "/profile?email=p@blog.dev", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let auth = bearer(&state, "p@blog.dev");
        let (status, body) = call(&state, Method::GET, "/profile?email=p@blog.dev", Some(&auth), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
    }
}
