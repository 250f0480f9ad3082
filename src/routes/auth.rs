/**
 * Credential Route
 * POST /jwt issues a signed credential for the supplied identity
 */
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ApiResult;
use crate::routes::JsonBody;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// POST /jwt - Sign the request body as the caller's identity (valid 1 hour)
pub async fn issue_token(
    State(state): State<AppState>,
    JsonBody(identity): JsonBody<Map<String, Value>>,
) -> ApiResult<Json<TokenResponse>> {
    let email = identity
        .get("email")
        .and_then(Value::as_str)
        .unwrap_or("<none>")
        .to_string();
    let token = state.tokens.issue(identity)?;
    tracing::debug!(email = %email, "credential issued");
    Ok(Json(TokenResponse { token }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{call, test_state};
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn test_issue_token_embeds_identity() {
        let state = test_state();
        let (status, body) = call(
            &state,
            Method::POST,
            "/jwt",
            None,
            Some(json!({"email": "writer@blog.dev", "uid": 7})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let token: TokenResponse = serde_json::from_value(body).unwrap();
        let claims = state.tokens.verify(&token.token).unwrap();
        assert_eq!(claims.email(), Some("writer@blog.dev"));
        assert_eq!(claims.identity["uid"], json!(7));
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[tokio::test]
    async fn test_issued_token_opens_gated_route() {
        let state = test_state();
        let (_, body) = call(
            &state,
            Method::POST,
            "/jwt",
            None,
            Some(json!({"email": "writer@blog.dev"})),
        )
        .await;
        let auth = format!("Bearer {}", body["token"].as_str().unwrap());

        let (status, _) = call(&state, Method::GET, "/users", Some(&auth), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_non_object_identity_is_rejected() {
        let state = test_state();
        let (status, _) = call(&state, Method::POST, "/jwt", None, Some(json!("writer"))).await;
        assert!(status.is_client_error());
    }
}
