/**
 * Credentials
 * Issues and verifies signed, time-limited JWTs carrying a caller identity
 */
pub mod gate;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// JWT claims: the caller's identity payload plus issue/expiry timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(flatten)]
    pub identity: Map<String, Value>,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    /// Email asserted at issue time. Role checks key off this value.
    pub fn email(&self) -> Option<&str> {
        self.identity.get("email").and_then(Value::as_str)
    }
}

/// Signing and verification keys for caller credentials.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl_secs: i64) -> Self {
        let mut validation = Validation::default();
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl: Duration::seconds(ttl_secs),
        }
    }

    pub fn issue(&self, identity: Map<String, Value>) -> Result<String, jsonwebtoken::errors::Error> {
        self.issue_at(identity, Utc::now())
    }

    /// Sign `identity` as if issued at `issued_at`. Reserved claim names in the
    /// payload are replaced by the computed timestamps.
    pub fn issue_at(
        &self,
        mut identity: Map<String, Value>,
        issued_at: DateTime<Utc>,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        identity.remove("iat");
        identity.remove("exp");

        let claims = Claims {
            identity,
            iat: issued_at.timestamp(),
            exp: (issued_at + self.ttl).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding)
    }

    /// Verify signature and expiry, returning the embedded claims.
    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let token_data = decode::<Claims>(token, &self.decoding, &self.validation)?;
        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn identity() -> Map<String, Value> {
        json!({"email": "reader@blog.dev", "name": "Reader"})
            .as_object()
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_fresh_credential_round_trips_identity() {
        let tokens = TokenService::new("secret", 3600);
        let token = tokens.issue(identity()).unwrap();
        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.identity, identity());
        assert_eq!(claims.email(), Some("reader@blog.dev"));
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_credential_near_end_of_hour_still_valid() {
        let tokens = TokenService::new("secret", 3600);
        let token = tokens
            .issue_at(identity(), Utc::now() - Duration::minutes(59))
            .unwrap();
        assert!(tokens.verify(&token).is_ok());
    }

    #[test]
    fn test_credential_older_than_an_hour_is_rejected() {
        let tokens = TokenService::new("secret", 3600);
        let token = tokens
            .issue_at(identity(), Utc::now() - Duration::minutes(61))
            .unwrap();
        let err = tokens.verify(&token).unwrap_err();
        assert_eq!(
            err.kind(),
            &jsonwebtoken::errors::ErrorKind::ExpiredSignature
        );
    }

    #[test]
    fn test_credential_from_other_secret_is_rejected() {
        let ours = TokenService::new("secret", 3600);
        let theirs = TokenService::new("another-secret", 3600);
        let token = theirs.issue(identity()).unwrap();
        assert!(ours.verify(&token).is_err());
    }

    #[test]
    fn test_tampered_credential_is_rejected() {
        let tokens = TokenService::new("secret", 3600);
        let token = tokens.issue(identity()).unwrap();
        let mut parts: Vec<&str> = token.split('.').collect();
        let forged_payload = {
            let forged = encode(
                &Header::default(),
                &json!({"email": "admin@blog.dev", "iat": 0, "exp": i64::MAX}),
                &EncodingKey::from_secret(b"guess"),
            )
            .unwrap();
            forged.split('.').nth(1).unwrap().to_string()
        };
        parts[1] = &forged_payload;
        assert!(tokens.verify(&parts.join(".")).is_err());
    }

    #[test]
    fn test_payload_cannot_override_expiry() {
        let tokens = TokenService::new("secret", 3600);
        let mut payload = identity();
        payload.insert("exp".to_string(), json!(i64::MAX));
        let token = tokens
            .issue_at(payload, Utc::now() - Duration::hours(2))
            .unwrap();
        assert!(tokens.verify(&token).is_err());
    }

    #[test]
    fn test_garbage_is_rejected() {
        let tokens = TokenService::new("secret", 3600);
        assert!(tokens.verify("invalid.jwt.token").is_err());
    }
}
