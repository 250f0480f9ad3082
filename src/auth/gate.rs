//! Access gate for protected routes.
//!
//! Gating is expressed as extractors so a route's requirement is visible in
//! its handler signature:
//!
//! - [`Authenticated`]: a valid `Authorization: Bearer <credential>` header.
//!   No header → 401. A header that is present but malformed, expired,
//!   tampered or signed with another key → 403.
//! - [`AdminOnly`]: [`Authenticated`], then the stored user for the
//!   credential's email must have role `"admin"`, else 403.
//!
//! Extractors run before the request body is read, so a rejected caller never
//! reaches the handler or the persistence call behind it.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use serde_json::Value;

use super::Claims;
use crate::db::{models::ADMIN_ROLE, Collection, Filter};
use crate::error::ApiError;
use crate::state::AppState;

/// Extract bearer token from Authorization header
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Caller holding a valid credential. The verified claims are also stored in
/// the request extensions for downstream layers.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Claims);

impl FromRequestParts<AppState> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if !parts.headers.contains_key(AUTHORIZATION) {
            tracing::debug!(uri = %parts.uri, "missing authorization header");
            return Err(ApiError::Unauthorized);
        }

        let Some(token) = extract_bearer_token(&parts.headers) else {
            tracing::debug!(uri = %parts.uri, "authorization header without bearer credential");
            return Err(ApiError::Forbidden);
        };

        let claims = state.tokens.verify(token).map_err(|e| {
            tracing::debug!(uri = %parts.uri, error = %e, "credential rejected");
            ApiError::Forbidden
        })?;

        parts.extensions.insert(claims.clone());
        Ok(Self(claims))
    }
}

/// Caller whose stored user record carries the admin role.
#[derive(Debug, Clone)]
pub struct AdminOnly(pub Claims);

impl FromRequestParts<AppState> for AdminOnly {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Authenticated(claims) = Authenticated::from_request_parts(parts, state).await?;

        // The email claim is trusted as-is: it is covered by the signature.
        let Some(email) = claims.email() else {
            tracing::warn!("credential without email claim on admin route");
            return Err(ApiError::Forbidden);
        };

        if !is_admin(state, email).await? {
            tracing::warn!(email = %email, uri = %parts.uri, "admin role required");
            return Err(ApiError::Forbidden);
        }

        Ok(Self(claims))
    }
}

/// Whether the stored user with `email` has the admin role. Unknown users are not admins.
pub async fn is_admin(state: &AppState, email: &str) -> Result<bool, ApiError> {
    let user = state
        .store
        .find_one(Collection::Users, &Filter::all().eq("email", email))
        .await?;

    Ok(user
        .as_ref()
        .and_then(|u| u.get("role"))
        .and_then(Value::as_str)
        == Some(ADMIN_ROLE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{bearer, call, test_state};
    use axum::http::{HeaderValue, Method, StatusCode};
    use chrono::{Duration, Utc};
    use serde_json::json;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token(&headers("Bearer abc.def")), Some("abc.def"));
        assert_eq!(extract_bearer_token(&headers("Basic abc")), None);
        assert_eq!(extract_bearer_token(&headers("Bearer ")), None);
        assert_eq!(extract_bearer_token(&HeaderMap::new()), None);
    }

    #[tokio::test]
    async fn test_missing_header_is_unauthorized() {
        let state = test_state();
        let (status, body) = call(&state, Method::GET, "/users", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "unauthorized access");
    }

    #[tokio::test]
    async fn test_malformed_header_is_forbidden() {
        let state = test_state();
        for header in ["Basic abc", "Bearer", "Token x.y.z", "Bearer ", "Bearer not.a.jwt"] {
            let (status, body) = call(&state, Method::GET, "/users", Some(header), None).await;
            assert_eq!(status, StatusCode::FORBIDDEN, "header {:?}", header);
            assert_eq!(body["message"], "forbidden access");
        }
    }

    #[tokio::test]
    async fn test_expired_credential_is_forbidden() {
        let state = test_state();
        let identity = json!({"email": "reader@blog.dev"}).as_object().cloned().unwrap();
        let stale = state
            .tokens
            .issue_at(identity, Utc::now() - Duration::minutes(61))
            .unwrap();

        let (status, body) = call(
            &state,
            Method::GET,
            "/blog?email=reader@blog.dev",
            Some(&format!("Bearer {}", stale)),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "forbidden access");
    }

    #[tokio::test]
    async fn test_recent_credential_is_accepted() {
        let state = test_state();
        let identity = json!({"email": "reader@blog.dev"}).as_object().cloned().unwrap();
        let recent = state
            .tokens
            .issue_at(identity, Utc::now() - Duration::minutes(59))
            .unwrap();

        let (status, _) = call(
            &state,
            Method::GET,
            "/blog?email=reader@blog.dev",
            Some(&format!("Bearer {}", recent)),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let fresh = bearer(&state, "reader@blog.dev");
        let (status, _) = call(&state, Method::GET, "/users", Some(&fresh), None).await;
        assert_eq!(status, StatusCode::OK);
    }
}
