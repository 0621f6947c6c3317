use sqlx::{FromRow, SqliteConnection};

use crate::error::{AppError, AppResult};
use crate::pagination::{paginate, Listing, Page, PaginationContext};
use crate::types::{CreatedByUser, DataResponse};
use crate::validator::ValueType;

use super::{delete_error, write_error};

/// A data series joined with its owner.
#[derive(Debug, Clone, FromRow)]
pub struct DataRow {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub data_type: String,
    pub created_at: String,
    pub owner_id: i64,
    pub owner_username: String,
    pub owner_email: String,
}

impl DataRow {
    pub fn value_type(&self) -> AppResult<ValueType> {
        self.data_type
            .parse()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("data {} has a corrupt type: {}", self.id, e)))
    }
}

impl TryFrom<DataRow> for DataResponse {
    type Error = AppError;

    fn try_from(row: DataRow) -> AppResult<Self> {
        let data_type = row.value_type()?;
        Ok(DataResponse {
            id: row.id,
            name: row.name,
            description: row.description,
            data_type,
            created_at: row.created_at,
            created_by_user: CreatedByUser { id: row.owner_id, username: row.owner_username, email: row.owner_email },
        })
    }
}

const SELECT: &str = "SELECT d.id, d.name, d.description, d.data_type, d.created_at, \
                      u.id AS owner_id, u.username AS owner_username, u.email AS owner_email";

const LISTING: Listing = Listing {
    select: SELECT,
    from: r#"FROM data d JOIN "user" u ON u.id = d.created_by_user_id"#,
    key: "d.id",
    search_column: "d.name",
    scope: None,
};

pub async fn insert(
    conn: &mut SqliteConnection,
    owner_id: i64,
    name: &str,
    description: Option<&str>,
    data_type: ValueType,
) -> AppResult<DataRow> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO data (created_by_user_id, name, description, data_type) VALUES (?1, ?2, ?3, ?4) RETURNING id",
    )
    .bind(owner_id)
    .bind(name)
    .bind(description)
    .bind(data_type.as_str())
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| write_error(e, "Data"))?;

    fetch(conn, id).await
}

pub async fn find_by_id(conn: &mut SqliteConnection, id: i64) -> AppResult<Option<DataRow>> {
    let row = sqlx::query_as::<_, DataRow>(&format!("{} {} WHERE d.id = ?1", SELECT, LISTING.from))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row)
}

async fn fetch(conn: &mut SqliteConnection, id: i64) -> AppResult<DataRow> {
    find_by_id(conn, id)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("data {} vanished inside its own transaction", id)))
}

pub async fn list(conn: &mut SqliteConnection, ctx: &PaginationContext) -> AppResult<Page<DataRow>> {
    paginate(conn, &LISTING, ctx).await
}

/// Replaces name and description. Returns `None` when the row does not exist.
pub async fn update(
    conn: &mut SqliteConnection,
    id: i64,
    name: &str,
    description: Option<&str>,
) -> AppResult<Option<DataRow>> {
    let result = sqlx::query("UPDATE data SET name = ?1, description = ?2 WHERE id = ?3")
        .bind(name)
        .bind(description)
        .bind(id)
        .execute(&mut *conn)
        .await
        .map_err(|e| write_error(e, "Data"))?;
    if result.rows_affected() == 0 {
        return Ok(None);
    }
    fetch(conn, id).await.map(Some)
}

/// Returns whether a row was removed.
pub async fn delete(conn: &mut SqliteConnection, id: i64) -> AppResult<bool> {
    let result = sqlx::query("DELETE FROM data WHERE id = ?1")
        .bind(id)
        .execute(&mut *conn)
        .await
        .map_err(|e| delete_error(e, "Data"))?;
    Ok(result.rows_affected() > 0)
}
