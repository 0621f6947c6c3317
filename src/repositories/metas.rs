use sqlx::{FromRow, SqliteConnection};

use crate::error::{AppError, AppResult};
use crate::pagination::{paginate, Listing, Page, PaginationContext};
use crate::types::MetaResponse;
use crate::validator::ValueType;

use super::{delete_error, write_error};

#[derive(Debug, Clone, FromRow)]
pub struct MetaRow {
    pub id: i64,
    pub name: String,
    pub meta_type: String,
}

impl MetaRow {
    pub fn value_type(&self) -> AppResult<ValueType> {
        self.meta_type
            .parse()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("meta {} has a corrupt type: {}", self.id, e)))
    }
}

impl TryFrom<MetaRow> for MetaResponse {
    type Error = AppError;

    fn try_from(row: MetaRow) -> AppResult<Self> {
        let meta_type = row.value_type()?;
        Ok(MetaResponse { id: row.id, name: row.name, meta_type })
    }
}

const LISTING: Listing = Listing {
    select: "SELECT id, name, meta_type",
    from: "FROM meta",
    key: "id",
    search_column: "name",
    scope: None,
};

pub async fn insert(conn: &mut SqliteConnection, name: &str, meta_type: ValueType) -> AppResult<MetaRow> {
    sqlx::query_as::<_, MetaRow>("INSERT INTO meta (name, meta_type) VALUES (?1, ?2) RETURNING id, name, meta_type")
        .bind(name)
        .bind(meta_type.as_str())
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| write_error(e, "Meta"))
}

pub async fn find_by_id(conn: &mut SqliteConnection, id: i64) -> AppResult<Option<MetaRow>> {
    let row = sqlx::query_as::<_, MetaRow>("SELECT id, name, meta_type FROM meta WHERE id = ?1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row)
}

pub async fn list(conn: &mut SqliteConnection, ctx: &PaginationContext) -> AppResult<Page<MetaRow>> {
    paginate(conn, &LISTING, ctx).await
}

pub async fn rename(conn: &mut SqliteConnection, id: i64, name: &str) -> AppResult<Option<MetaRow>> {
    sqlx::query_as::<_, MetaRow>("UPDATE meta SET name = ?1 WHERE id = ?2 RETURNING id, name, meta_type")
        .bind(name)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| write_error(e, "Meta"))
}

pub async fn delete(conn: &mut SqliteConnection, id: i64) -> AppResult<bool> {
    let result = sqlx::query("DELETE FROM meta WHERE id = ?1")
        .bind(id)
        .execute(&mut *conn)
        .await
        .map_err(|e| delete_error(e, "Meta"))?;
    Ok(result.rows_affected() > 0)
}
