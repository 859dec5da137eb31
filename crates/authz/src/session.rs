//! Session tokens.
//!
//! Tokens are HS256 JWTs carrying the user id as `sub`. The signing secret and
//! lifetime come from configuration.

use anyhow::anyhow;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use shelf_db::RecordId;
use shelf_kernel::{settings::AuthSettings, DomainError};

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
    /// Unique token id
    pub jti: String,
}

/// The authenticated caller of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subject {
    pub id: RecordId,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedToken {
    pub token: String,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

/// Issues and verifies session tokens.
pub struct SessionAuthenticator {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    lifetime: Duration,
}

impl SessionAuthenticator {
    pub fn new(secret: &str, lifetime: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            lifetime,
        }
    }

    pub fn from_settings(settings: &AuthSettings) -> Self {
        Self::new(
            &settings.jwt_secret,
            Duration::seconds(settings.token_ttl_secs),
        )
    }

    /// Issue a token binding `user_id` for the configured lifetime.
    pub fn issue(&self, user_id: RecordId) -> Result<IssuedToken, DomainError> {
        let now = OffsetDateTime::now_utc();
        let expires_at = now + self.lifetime;

        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.unix_timestamp(),
            exp: expires_at.unix_timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| anyhow!("failed to sign session token: {}", e))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Verify a presented token and resolve it to its subject.
    pub fn verify(&self, token: &str) -> Result<Subject, DomainError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(DomainError::auth("access denied, no token provided"));
        }

        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "session token rejected");
            match e.kind() {
                ErrorKind::ExpiredSignature => DomainError::auth("token has expired"),
                _ => DomainError::auth("invalid token"),
            }
        })?;

        let id = data
            .claims
            .sub
            .parse::<RecordId>()
            .map_err(|_| DomainError::auth("invalid token subject"))?;

        Ok(Subject { id })
    }
}

/// Pull the token out of an `Authorization` header value. Both `Bearer <token>`
/// and a bare token are accepted.
pub fn token_from_header(value: &str) -> &str {
    let value = value.trim();
    match value.split_once(' ') {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        _ => value,
    }
}
