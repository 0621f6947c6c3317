//! JWT access tokens.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::{AuthError, AuthResult};
use crate::config::AuthConfig;

/// Claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub user_id: i64,
    /// Issued at (Unix epoch seconds)
    pub iat: i64,
    /// Expiration (Unix epoch seconds)
    pub exp: i64,
}

/// Issues and verifies access tokens with the configured shared secret.
#[derive(Clone)]
pub struct TokenService {
    algorithm: Algorithm,
    ttl: Duration,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenService {
    pub fn new(cfg: &AuthConfig) -> anyhow::Result<Self> {
        let ttl = Duration::try_minutes(cfg.access_token_expire_minutes)
            .filter(|ttl| *ttl > Duration::zero())
            .ok_or_else(|| anyhow::anyhow!("unusable token lifetime: {} minutes", cfg.access_token_expire_minutes))?;
        Ok(Self {
            algorithm: cfg.jwt_algorithm()?,
            ttl,
            encoding_key: EncodingKey::from_secret(cfg.secret_key.as_bytes()),
            decoding_key: DecodingKey::from_secret(cfg.secret_key.as_bytes()),
        })
    }

    pub fn issue(&self, user_id: i64) -> AuthResult<String> {
        let now = Utc::now();
        let exp = now.checked_add_signed(self.ttl).ok_or(AuthError::TokenGeneration)?;
        let claims = Claims { user_id, iat: now.timestamp(), exp: exp.timestamp() };
        encode(&Header::new(self.algorithm), &claims, &self.encoding_key).map_err(|_| AuthError::TokenGeneration)
    }

    pub fn verify(&self, token: &str) -> AuthResult<Claims> {
        let validation = Validation::new(self.algorithm);
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                _ => AuthError::MalformedToken,
            })
    }
}
