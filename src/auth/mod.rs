//! # Authentication
//!
//! Password hashing, JWT access tokens and the bearer-token extractor.

pub mod extractor;
pub mod password;
pub mod token;

use thiserror::Error;

pub use extractor::CurrentUser;
pub use password::{hash_password, verify_password};
pub use token::{Claims, TokenService};

/// Result type for auth operations
pub type AuthResult<T> = Result<T, AuthError>;

/// Authentication errors
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AuthError {
    /// Unknown user or wrong password (deliberately indistinguishable)
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// No `Authorization: Bearer` header
    #[error("Missing bearer token")]
    MissingToken,

    #[error("Malformed token")]
    MalformedToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Token generation failed")]
    TokenGeneration,
}
