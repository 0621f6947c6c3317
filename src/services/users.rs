use tracing::{info, warn};

use crate::auth::{hash_password, verify_password, AuthError};
use crate::db::Database;
use crate::error::{AppError, AppResult, OptionExt};
use crate::metrics::Metrics;
use crate::pagination::{Page, PaginationContext};
use crate::repositories::users::{self, UserRow};
use crate::types::{UserCreate, UserResponse};

use super::require_text;

#[derive(Clone)]
pub struct UserService {
    db: Database,
    metrics: Metrics,
}

impl UserService {
    pub fn new(db: Database, metrics: Metrics) -> Self {
        Self { db, metrics }
    }

    /// Registers a user; the password is stored as an Argon2id hash.
    pub async fn register(&self, input: UserCreate) -> AppResult<UserResponse> {
        require_text("username", &input.username)?;
        require_text("password", &input.password)?;
        validate_email(&input.email)?;

        let password = input.password;
        let hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("hashing task failed: {}", e)))??;

        let mut tx = self.db.writer.begin().await?;
        let row = users::insert(&mut tx, &input.username, &input.email, &hash).await?;
        tx.commit().await?;

        self.metrics.inc_users_registered();
        info!(user_id = row.id, "Registered user {}", row.username);
        Ok(row.into())
    }

    pub async fn get(&self, id: i64) -> AppResult<UserResponse> {
        let mut tx = self.db.reader.begin().await?;
        let row = users::find_by_id(&mut tx, id).await?.ok_or_not_found("User")?;
        tx.commit().await?;
        Ok(row.into())
    }

    pub async fn list(&self, ctx: &PaginationContext) -> AppResult<Page<UserResponse>> {
        let mut tx = self.db.reader.begin().await?;
        let page = users::list(&mut tx, ctx).await?;
        tx.commit().await?;
        page.try_map(|row| Ok(row.into()))
    }

    /// Checks a login (username or email) and password; returns the user on success.
    ///
    /// Unknown users and wrong passwords fail identically.
    pub async fn authenticate(&self, login: &str, password: &str) -> AppResult<UserResponse> {
        let mut tx = self.db.reader.begin().await?;
        let row: Option<UserRow> = users::find_by_login(&mut tx, login).await?;
        tx.commit().await?;

        let Some(row) = row else {
            warn!("Login failed for unknown user {}", login);
            return Err(AuthError::InvalidCredentials.into());
        };

        let hash = row.password.clone();
        let password = password.to_owned();
        let matches = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("password check task failed: {}", e)))?;
        if !matches {
            warn!(user_id = row.id, "Login failed: wrong password");
            return Err(AuthError::InvalidCredentials.into());
        }
        Ok(row.into())
    }
}

/// A deliberately loose address check: one `@` with text on both sides and a dot in the domain.
fn validate_email(email: &str) -> AppResult<()> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(AppError::Validation(format!("'{}' is not a valid email address", email)));
    }
    Ok(())
}
