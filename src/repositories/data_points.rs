use sqlx::{FromRow, SqliteConnection};

use crate::error::{AppError, AppResult};
use crate::pagination::{paginate, Listing, Page, PaginationContext};
use crate::types::DataPointResponse;

use super::{delete_error, parse_value, write_error};

#[derive(Debug, Clone, FromRow)]
pub struct DataPointRow {
    pub id: i64,
    pub data_id: i64,
    pub created_at: String,
    /// JSON text of the canonical value.
    pub value: String,
}

impl TryFrom<DataPointRow> for DataPointResponse {
    type Error = AppError;

    fn try_from(row: DataPointRow) -> AppResult<Self> {
        let value = parse_value(&row.value)?;
        Ok(DataPointResponse { id: row.id, data_id: row.data_id, created_at: row.created_at, value })
    }
}

const SELECT: &str = "SELECT id, data_id, created_at, value";

const LISTING: Listing = Listing {
    select: SELECT,
    from: "FROM data_point",
    key: "id",
    // Match the decoded value, not its JSON quoting
    search_column: "json_extract(value, '$')",
    scope: None,
};

/// Stores an already validated value. `created_at` defaults to the current time.
pub async fn insert(
    conn: &mut SqliteConnection,
    data_id: i64,
    created_at: Option<&str>,
    value_json: &str,
) -> AppResult<DataPointRow> {
    sqlx::query_as::<_, DataPointRow>(
        "INSERT INTO data_point (data_id, created_at, value) \
         VALUES (?1, COALESCE(?2, strftime('%Y-%m-%dT%H:%M:%SZ','now')), ?3) \
         RETURNING id, data_id, created_at, value",
    )
    .bind(data_id)
    .bind(created_at)
    .bind(value_json)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| write_error(e, "Data point"))
}

/// Finds a point by id within one data series.
pub async fn find(conn: &mut SqliteConnection, data_id: i64, id: i64) -> AppResult<Option<DataPointRow>> {
    let row = sqlx::query_as::<_, DataPointRow>(&format!("{} FROM data_point WHERE id = ?1 AND data_id = ?2", SELECT))
        .bind(id)
        .bind(data_id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row)
}

pub async fn list(conn: &mut SqliteConnection, data_id: i64, ctx: &PaginationContext) -> AppResult<Page<DataPointRow>> {
    paginate(conn, &LISTING.scoped("data_id", data_id), ctx).await
}

pub async fn delete(conn: &mut SqliteConnection, data_id: i64, id: i64) -> AppResult<bool> {
    let result = sqlx::query("DELETE FROM data_point WHERE id = ?1 AND data_id = ?2")
        .bind(id)
        .bind(data_id)
        .execute(&mut *conn)
        .await
        .map_err(|e| delete_error(e, "Data point"))?;
    Ok(result.rows_affected() > 0)
}
