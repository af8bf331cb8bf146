use std::time::Duration;

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use uuid::Uuid;

use crate::models::AuthPayload;

/// Token lifetime used when nothing else is configured.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("password hashing failed: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),

    #[error("token error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("token subject is not a user id")]
    InvalidSubject,
}

pub fn hash_password(password: &str, cost: u32) -> Result<String, AuthError> {
    Ok(hash(password, cost)?)
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    Ok(verify(password, hash)?)
}

/// Issues and validates HS256 bearer tokens, and hashes passwords with the
/// configured bcrypt cost.
#[derive(Clone)]
pub struct Authenticator {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
    bcrypt_cost: u32,
}

impl Authenticator {
    pub fn new(secret: &[u8], ttl: Duration, bcrypt_cost: u32) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
            bcrypt_cost,
        }
    }

    pub fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        hash_password(password, self.bcrypt_cost)
    }

    pub fn issue_token(&self, user_id: Uuid) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = AuthPayload {
            sub: user_id.to_string(),
            iat: now,
            exp: now.saturating_add(i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX)),
        };
        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    /// Decode a token and return the user id it was issued for.
    pub fn validate_token(&self, token: &str) -> Result<Uuid, AuthError> {
        let token_data =
            decode::<AuthPayload>(token, &self.decoding, &Validation::new(Algorithm::HS256))?;
        token_data
            .claims
            .sub
            .parse()
            .map_err(|_| AuthError::InvalidSubject)
    }
}
