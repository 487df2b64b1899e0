//! # auth-adapters
//!
//! HS256 bearer tokens. Issuing credentials is owned by the login flow
//! elsewhere; this crate verifies them and can mint tokens for seeding and
//! tests.

use chrono::{DateTime, Duration, Utc};
use domains::{DomainError, DomainResult, TokenVerifier, UserId};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// The user id, as a decimal string.
    sub: String,
    exp: i64,
    iat: i64,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token encoding failed: {0}")]
    Encode(#[from] jsonwebtoken::errors::Error),
}

pub struct JwtAuth {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtAuth {
    pub fn new(secret: &SecretString) -> Self {
        let raw = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(raw),
            decoding: DecodingKey::from_secret(raw),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Mints a token for `user` valid for `ttl` from `now`.
    pub fn issue(&self, user: UserId, now: DateTime<Utc>, ttl: Duration) -> Result<String, AuthError> {
        let claims = Claims {
            sub: user.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }
}

impl TokenVerifier for JwtAuth {
    fn verify(&self, token: &str) -> DomainResult<UserId> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|err| {
            debug!(error = %err, "token rejected");
            let reason = match err.kind() {
                ErrorKind::ExpiredSignature => "Token expired",
                _ => "Invalid token",
            };
            DomainError::Unauthenticated(reason.into())
        })?;

        data.claims
            .sub
            .parse::<i64>()
            .map(UserId)
            .map_err(|_| DomainError::Unauthenticated("Invalid token subject".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth(secret: &str) -> JwtAuth {
        JwtAuth::new(&SecretString::from(secret.to_string()))
    }

    #[test]
    fn issued_token_verifies_to_its_user() {
        let auth = auth("s3cret");
        let token = auth.issue(UserId(42), Utc::now(), Duration::hours(1)).unwrap();
        assert_eq!(auth.verify(&token).unwrap(), UserId(42));
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let token = auth("one")
            .issue(UserId(1), Utc::now(), Duration::hours(1))
            .unwrap();
        let err = auth("two").verify(&token).unwrap_err();
        assert!(matches!(err, DomainError::Unauthenticated(_)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let auth = auth("s3cret");
        let token = auth
            .issue(UserId(1), Utc::now() - Duration::days(2), Duration::hours(1))
            .unwrap();
        assert_eq!(
            auth.verify(&token).unwrap_err(),
            DomainError::Unauthenticated("Token expired".into())
        );
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(auth("s3cret").verify("not.a.jwt").is_err());
    }
}
