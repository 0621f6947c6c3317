use serde_json::Value;
use sqlx::SqliteConnection;
use tracing::{debug, info};

use crate::db::Database;
use crate::error::{ensure_ids_match, AppResult, OptionExt};
use crate::metrics::Metrics;
use crate::pagination::{Page, PaginationContext};
use crate::repositories::{data_metas, metas};
use crate::types::{DataMetaResponse, DataMetaWrite};
use crate::validator;

use super::datas::require_data;

/// Metadata values of a data series.
///
/// With `enforce_types` set, values are coerced to the meta's declared type
/// like data points are; otherwise they are stored as given.
#[derive(Clone)]
pub struct DataMetaService {
    db: Database,
    metrics: Metrics,
    enforce_types: bool,
}

impl DataMetaService {
    pub fn new(db: Database, metrics: Metrics, enforce_types: bool) -> Self {
        Self { db, metrics, enforce_types }
    }

    /// Encodes the value for storage, validating it when enforcement is on.
    async fn encode_value(&self, conn: &mut SqliteConnection, meta_id: i64, value: &Value) -> AppResult<String> {
        let meta = metas::find_by_id(conn, meta_id).await?.ok_or_not_found("Meta")?;
        if !self.enforce_types {
            return Ok(value.to_string());
        }
        let typed = validator::validate(meta.value_type()?, value).inspect_err(|e| {
            debug!(meta_id, "Rejected metadata value: {}", e);
        })?;
        Ok(typed.to_json().to_string())
    }

    pub async fn create(&self, data_id: i64, input: DataMetaWrite) -> AppResult<DataMetaResponse> {
        ensure_ids_match("data_id", data_id, input.data_id)?;

        let mut tx = self.db.writer.begin().await?;
        require_data(&mut tx, data_id).await?;
        let value = self.encode_value(&mut tx, input.meta_id, &input.value).await?;
        let row = data_metas::insert(&mut tx, data_id, input.meta_id, &value).await?;
        tx.commit().await?;

        self.metrics.inc_data_metas_created();
        info!(data_id, meta_id = input.meta_id, "Attached metadata");
        row.try_into()
    }

    pub async fn get(&self, data_id: i64, meta_id: i64) -> AppResult<DataMetaResponse> {
        let mut tx = self.db.reader.begin().await?;
        require_data(&mut tx, data_id).await?;
        let row = data_metas::find(&mut tx, data_id, meta_id).await?.ok_or_not_found("Data meta")?;
        tx.commit().await?;
        row.try_into()
    }

    pub async fn list(&self, data_id: i64, ctx: &PaginationContext) -> AppResult<Page<DataMetaResponse>> {
        let mut tx = self.db.reader.begin().await?;
        require_data(&mut tx, data_id).await?;
        let page = data_metas::list(&mut tx, data_id, ctx).await?;
        tx.commit().await?;
        page.try_map(DataMetaResponse::try_from)
    }

    /// Replaces the value; both ids in the body must equal the ones in the URL.
    pub async fn update(&self, data_id: i64, meta_id: i64, input: DataMetaWrite) -> AppResult<DataMetaResponse> {
        ensure_ids_match("data_id", data_id, input.data_id)?;
        ensure_ids_match("meta_id", meta_id, input.meta_id)?;

        let mut tx = self.db.writer.begin().await?;
        require_data(&mut tx, data_id).await?;
        let value = self.encode_value(&mut tx, meta_id, &input.value).await?;
        let row = data_metas::update_value(&mut tx, data_id, meta_id, &value)
            .await?
            .ok_or_not_found("Data meta")?;
        tx.commit().await?;

        info!(data_id, meta_id, "Updated metadata value");
        row.try_into()
    }

    pub async fn delete(&self, data_id: i64, meta_id: i64) -> AppResult<()> {
        let mut tx = self.db.writer.begin().await?;
        require_data(&mut tx, data_id).await?;
        data_metas::delete(&mut tx, data_id, meta_id)
            .await?
            .then_some(())
            .ok_or_not_found("Data meta")?;
        tx.commit().await?;

        self.metrics.inc_entities_deleted();
        info!(data_id, meta_id, "Detached metadata");
        Ok(())
    }
}
