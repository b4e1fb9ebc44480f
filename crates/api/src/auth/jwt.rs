//! JWT token generation and validation

use catalog_shared::Role;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

/// JWT claims carried by every issued token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (email)
    pub sub: String,
    /// User ID
    #[serde(rename = "userId")]
    pub user_id: i64,
    /// User role
    pub role: Role,
    /// Issued at (seconds since epoch)
    pub iat: i64,
    /// Expiration (seconds since epoch)
    pub exp: i64,
}

/// Identity recovered from a valid token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedClaims {
    pub email: String,
    pub user_id: i64,
    pub role: Role,
}

/// A freshly signed token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: i64,
}

/// JWT manager for token operations
#[derive(Clone)]
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_ms: i64,
}

impl JwtManager {
    /// Create a new JWT manager. The same secret signs and verifies.
    pub fn new(secret: &str, ttl_ms: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl_ms,
        }
    }

    /// Token lifetime in milliseconds
    pub fn ttl_ms(&self) -> i64 {
        self.ttl_ms
    }

    /// Issue a signed token for the given identity
    pub fn issue(&self, user_id: i64, email: &str, role: Role) -> Result<IssuedToken, JwtError> {
        self.issue_at(user_id, email, role, OffsetDateTime::now_utc())
    }

    fn issue_at(
        &self,
        user_id: i64,
        email: &str,
        role: Role,
        now: OffsetDateTime,
    ) -> Result<IssuedToken, JwtError> {
        let exp = now
            .checked_add(Duration::milliseconds(self.ttl_ms))
            .ok_or_else(|| JwtError::Encoding("token expiry out of range".to_string()))?;

        let claims = Claims {
            sub: email.to_string(),
            user_id,
            role,
            iat: now.unix_timestamp(),
            exp: exp.unix_timestamp(),
        };

        // Explicit algorithm prevents algorithm confusion attacks
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| JwtError::Encoding(e.to_string()))?;

        Ok(IssuedToken {
            token,
            expires_at: claims.exp,
        })
    }

    /// Validate a token and extract its identity
    pub fn verify(&self, token: &str) -> Result<VerifiedClaims, JwtError> {
        self.verify_at(token, OffsetDateTime::now_utc())
    }

    fn verify_at(&self, token: &str, now: OffsetDateTime) -> Result<VerifiedClaims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked below so that `now == exp` already counts as expired
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat", "sub"]);

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Token rejected");
                JwtError::Invalid
            })?;

        if now.unix_timestamp() >= claims.exp {
            return Err(JwtError::Expired);
        }

        Ok(VerifiedClaims {
            email: claims.sub,
            user_id: claims.user_id,
            role: claims.role,
        })
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum JwtError {
    #[error("Token has expired")]
    Expired,
    #[error("Invalid token")]
    Invalid,
    #[error("Token encoding failed: {0}")]
    Encoding(String),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    const SECRET: &str = "test-secret-key-at-least-32-chars!";

    fn manager() -> JwtManager {
        JwtManager::new(SECRET, 86_400_000)
    }

    fn sign(payload: serde_json::Value, secret: &str, alg: Algorithm) -> String {
        encode(
            &Header::new(alg),
            &payload,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_issue_and_verify_round_trip() {
        let jwt = manager();
        let issued = jwt.issue(42, "a@x.com", Role::Admin).unwrap();

        let claims = jwt.verify(&issued.token).unwrap();
        assert_eq!(
            claims,
            VerifiedClaims {
                email: "a@x.com".to_string(),
                user_id: 42,
                role: Role::Admin,
            }
        );
    }

    #[test]
    fn test_claim_names_on_the_wire() {
        let jwt = manager();
        let issued = jwt.issue(7, "b@x.com", Role::User).unwrap();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        let raw = decode::<serde_json::Value>(
            &issued.token,
            &DecodingKey::from_secret(SECRET.as_bytes()),
            &validation,
        )
        .unwrap()
        .claims;

        assert_eq!(raw["sub"], "b@x.com");
        assert_eq!(raw["userId"], 7);
        assert_eq!(raw["role"], "user");
        assert_eq!(
            raw["exp"].as_i64().unwrap() - raw["iat"].as_i64().unwrap(),
            86_400
        );
    }

    #[test]
    fn test_expired_token() {
        let jwt = manager();
        let now = OffsetDateTime::now_utc();
        let issued = jwt
            .issue_at(1, "a@x.com", Role::User, now - Duration::days(2))
            .unwrap();

        assert_eq!(jwt.verify(&issued.token), Err(JwtError::Expired));
    }

    #[test]
    fn test_token_expires_exactly_at_exp() {
        let jwt = JwtManager::new(SECRET, 60_000);
        let now = OffsetDateTime::now_utc();
        let issued = jwt.issue_at(1, "a@x.com", Role::User, now).unwrap();
        let exp = OffsetDateTime::from_unix_timestamp(issued.expires_at).unwrap();

        assert!(jwt.verify_at(&issued.token, exp - Duration::seconds(1)).is_ok());
        assert_eq!(jwt.verify_at(&issued.token, exp), Err(JwtError::Expired));
    }

    #[test]
    fn test_oversized_ttl_is_an_error() {
        let jwt = JwtManager::new(SECRET, i64::MAX);
        assert!(matches!(
            jwt.issue(1, "a@x.com", Role::User),
            Err(JwtError::Encoding(_))
        ));
    }

    #[test]
    fn test_garbage_is_invalid() {
        let jwt = manager();
        for input in [
            "",
            "abc",
            "a.b.c",
            "Bearer xyz",
            "eyJhbGciOiJIUzI1NiJ9.eyJzdWIiOiJ4In0.",
            "\u{0}\u{1}\u{2}",
        ] {
            assert_eq!(jwt.verify(input), Err(JwtError::Invalid), "input: {input:?}");
        }
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let other = JwtManager::new("another-secret-key-at-least-32-chars", 86_400_000);
        let issued = other.issue(1, "a@x.com", Role::Admin).unwrap();
        assert_eq!(manager().verify(&issued.token), Err(JwtError::Invalid));
    }

    #[test]
    fn test_tampered_payload_is_invalid() {
        let jwt = manager();
        let issued = jwt.issue(1, "a@x.com", Role::User).unwrap();
        let forged = sign(
            json!({"sub": "a@x.com", "userId": 1, "role": "admin", "iat": 0, "exp": i64::MAX}),
            SECRET,
            Algorithm::HS256,
        );

        let parts: Vec<&str> = issued.token.split('.').collect();
        let forged_parts: Vec<&str> = forged.split('.').collect();
        let spliced = format!("{}.{}.{}", parts[0], forged_parts[1], parts[2]);

        assert_eq!(jwt.verify(&spliced), Err(JwtError::Invalid));
    }

    #[test]
    fn test_other_algorithm_is_invalid() {
        let token = sign(
            json!({"sub": "a@x.com", "userId": 1, "role": "admin", "iat": 0, "exp": i64::MAX}),
            SECRET,
            Algorithm::HS512,
        );
        assert_eq!(manager().verify(&token), Err(JwtError::Invalid));
    }

    #[test]
    fn test_missing_or_bad_claims_are_invalid() {
        let far_future = OffsetDateTime::now_utc().unix_timestamp() + 3600;
        let payloads = vec![
            json!({"sub": "a@x.com", "role": "user", "iat": 0, "exp": far_future}),
            json!({"sub": "a@x.com", "userId": 1, "iat": 0, "exp": far_future}),
            json!({"userId": 1, "role": "user", "iat": 0, "exp": far_future}),
            json!({"sub": "a@x.com", "userId": 1, "role": "user", "iat": 0}),
            json!({"sub": "a@x.com", "userId": 1, "role": "root", "iat": 0, "exp": far_future}),
            json!({"sub": "a@x.com", "userId": "one", "role": "user", "iat": 0, "exp": far_future}),
        ];

        for payload in payloads {
            let token = sign(payload.clone(), SECRET, Algorithm::HS256);
            assert_eq!(
                manager().verify(&token),
                Err(JwtError::Invalid),
                "payload: {payload}"
            );
        }
    }
}
