use sqlx::{FromRow, SqliteConnection};

use crate::error::{AppResult, OptionExt};
use crate::pagination::{paginate, Listing, Page, PaginationContext};
use crate::types::UserResponse;

use super::write_error;

/// A user row including the password hash. Never serialized directly.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub created_at: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

impl From<UserRow> for UserResponse {
    fn from(row: UserRow) -> Self {
        UserResponse { id: row.id, created_at: row.created_at, username: row.username, email: row.email }
    }
}

const SELECT: &str = r#"SELECT id, created_at, username, email, password"#;

const LISTING: Listing = Listing {
    select: SELECT,
    from: r#"FROM "user""#,
    key: "id",
    search_column: "username",
    scope: None,
};

pub async fn insert(conn: &mut SqliteConnection, username: &str, email: &str, password_hash: &str) -> AppResult<UserRow> {
    sqlx::query_as::<_, UserRow>(
        r#"INSERT INTO "user" (username, email, password) VALUES (?1, ?2, ?3)
           RETURNING id, created_at, username, email, password"#,
    )
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| write_error(e, "User"))
}

pub async fn find_by_id(conn: &mut SqliteConnection, id: i64) -> AppResult<Option<UserRow>> {
    let row = sqlx::query_as::<_, UserRow>(&format!(r#"{} FROM "user" WHERE id = ?1"#, SELECT))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row)
}

/// Looks a user up by username or email. A username match wins over an email match.
pub async fn find_by_login(conn: &mut SqliteConnection, login: &str) -> AppResult<Option<UserRow>> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        r#"{} FROM "user" WHERE username = ?1 OR email = ?1 ORDER BY (username = ?1) DESC, id LIMIT 1"#,
        SELECT
    ))
    .bind(login)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(row)
}

pub async fn list(conn: &mut SqliteConnection, ctx: &PaginationContext) -> AppResult<Page<UserRow>> {
    paginate(conn, &LISTING, ctx).await
}

/// Fails with `NotFound` unless the user exists.
pub async fn require(conn: &mut SqliteConnection, id: i64) -> AppResult<UserRow> {
    find_by_id(conn, id).await?.ok_or_not_found("User")
}
