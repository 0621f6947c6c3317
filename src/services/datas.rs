use sqlx::SqliteConnection;
use tracing::info;

use crate::db::Database;
use crate::error::{AppResult, OptionExt};
use crate::metrics::Metrics;
use crate::pagination::{Page, PaginationContext};
use crate::repositories::datas::{self, DataRow};
use crate::repositories::users;
use crate::types::{DataCreate, DataResponse, DataUpdate};
use crate::validator::ValueType;

use super::require_text;

/// Fetches a data series or fails with `NotFound`. Used by every child service.
pub(crate) async fn require_data(conn: &mut SqliteConnection, id: i64) -> AppResult<DataRow> {
    datas::find_by_id(conn, id).await?.ok_or_not_found("Data")
}

#[derive(Clone)]
pub struct DataService {
    db: Database,
    metrics: Metrics,
}

impl DataService {
    pub fn new(db: Database, metrics: Metrics) -> Self {
        Self { db, metrics }
    }

    /// Creates a data series owned by `owner_id`.
    pub async fn create(&self, owner_id: i64, input: DataCreate) -> AppResult<DataResponse> {
        require_text("name", &input.name)?;
        let data_type: ValueType = input.data_type.parse()?;

        let mut tx = self.db.writer.begin().await?;
        users::require(&mut tx, owner_id).await?;
        let row = datas::insert(&mut tx, owner_id, &input.name, input.description.as_deref(), data_type).await?;
        tx.commit().await?;

        self.metrics.inc_datas_created();
        info!(data_id = row.id, owner_id, "Created data '{}' of type {}", row.name, data_type);
        row.try_into()
    }

    pub async fn get(&self, id: i64) -> AppResult<DataResponse> {
        let mut tx = self.db.reader.begin().await?;
        let row = require_data(&mut tx, id).await?;
        tx.commit().await?;
        row.try_into()
    }

    pub async fn list(&self, ctx: &PaginationContext) -> AppResult<Page<DataResponse>> {
        let mut tx = self.db.reader.begin().await?;
        let page = datas::list(&mut tx, ctx).await?;
        tx.commit().await?;
        page.try_map(DataResponse::try_from)
    }

    /// Replaces name and description. The data type cannot change.
    pub async fn update(&self, id: i64, input: DataUpdate) -> AppResult<DataResponse> {
        require_text("name", &input.name)?;

        let mut tx = self.db.writer.begin().await?;
        let row = datas::update(&mut tx, id, &input.name, input.description.as_deref())
            .await?
            .ok_or_not_found("Data")?;
        tx.commit().await?;

        info!(data_id = id, "Updated data '{}'", row.name);
        row.try_into()
    }

    /// Deletes a data series; fails with `Conflict` while points or metadata reference it.
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let mut tx = self.db.writer.begin().await?;
        datas::delete(&mut tx, id).await?.then_some(()).ok_or_not_found("Data")?;
        tx.commit().await?;

        self.metrics.inc_entities_deleted();
        info!(data_id = id, "Deleted data");
        Ok(())
    }
}
