//! Metadata values attached to a data series, addressed by `(data_id, meta_id)`.

use sqlx::{FromRow, SqliteConnection};

use crate::error::{AppError, AppResult};
use crate::pagination::{paginate, Listing, Page, PaginationContext};
use crate::types::DataMetaResponse;

use super::{delete_error, parse_value, write_error};

#[derive(Debug, Clone, FromRow)]
pub struct DataMetaRow {
    pub id: i64,
    pub data_id: i64,
    pub meta_id: i64,
    pub value: String,
}

impl TryFrom<DataMetaRow> for DataMetaResponse {
    type Error = AppError;

    fn try_from(row: DataMetaRow) -> AppResult<Self> {
        let value = parse_value(&row.value)?;
        Ok(DataMetaResponse { id: row.id, data_id: row.data_id, meta_id: row.meta_id, value })
    }
}

const SELECT: &str = "SELECT id, data_id, meta_id, value";

const LISTING: Listing = Listing {
    select: SELECT,
    from: "FROM data_meta",
    key: "id",
    // Match the decoded value, not its JSON quoting
    search_column: "json_extract(value, '$')",
    scope: None,
};

pub async fn insert(conn: &mut SqliteConnection, data_id: i64, meta_id: i64, value_json: &str) -> AppResult<DataMetaRow> {
    sqlx::query_as::<_, DataMetaRow>(
        "INSERT INTO data_meta (data_id, meta_id, value) VALUES (?1, ?2, ?3) RETURNING id, data_id, meta_id, value",
    )
    .bind(data_id)
    .bind(meta_id)
    .bind(value_json)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| write_error(e, "Data meta"))
}

pub async fn find(conn: &mut SqliteConnection, data_id: i64, meta_id: i64) -> AppResult<Option<DataMetaRow>> {
    let row = sqlx::query_as::<_, DataMetaRow>(&format!("{} FROM data_meta WHERE data_id = ?1 AND meta_id = ?2", SELECT))
        .bind(data_id)
        .bind(meta_id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row)
}

pub async fn list(conn: &mut SqliteConnection, data_id: i64, ctx: &PaginationContext) -> AppResult<Page<DataMetaRow>> {
    paginate(conn, &LISTING.scoped("data_id", data_id), ctx).await
}

pub async fn update_value(
    conn: &mut SqliteConnection,
    data_id: i64,
    meta_id: i64,
    value_json: &str,
) -> AppResult<Option<DataMetaRow>> {
    sqlx::query_as::<_, DataMetaRow>(
        "UPDATE data_meta SET value = ?1 WHERE data_id = ?2 AND meta_id = ?3 RETURNING id, data_id, meta_id, value",
    )
    .bind(value_json)
    .bind(data_id)
    .bind(meta_id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(|e| write_error(e, "Data meta"))
}

pub async fn delete(conn: &mut SqliteConnection, data_id: i64, meta_id: i64) -> AppResult<bool> {
    let result = sqlx::query("DELETE FROM data_meta WHERE data_id = ?1 AND meta_id = ?2")
        .bind(data_id)
        .bind(meta_id)
        .execute(&mut *conn)
        .await
        .map_err(|e| delete_error(e, "Data meta"))?;
    Ok(result.rows_affected() > 0)
}
