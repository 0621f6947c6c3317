use chrono::SecondsFormat;
use tracing::{debug, info};

use crate::db::Database;
use crate::error::{ensure_ids_match, AppResult, OptionExt};
use crate::metrics::Metrics;
use crate::pagination::{Page, PaginationContext};
use crate::repositories::data_points;
use crate::types::{DataPointCreate, DataPointResponse};
use crate::validator;

use super::datas::require_data;

#[derive(Clone)]
pub struct DataPointService {
    db: Database,
    metrics: Metrics,
}

impl DataPointService {
    pub fn new(db: Database, metrics: Metrics) -> Self {
        Self { db, metrics }
    }

    /// Validates `input.value` against the series type and stores it.
    pub async fn create(&self, data_id: i64, input: DataPointCreate) -> AppResult<DataPointResponse> {
        if let Some(body_id) = input.data_id {
            ensure_ids_match("data_id", data_id, body_id)?;
        }

        let mut tx = self.db.writer.begin().await?;
        let data = require_data(&mut tx, data_id).await?;
        let typed = validator::validate(data.value_type()?, &input.value).inspect_err(|e| {
            debug!(data_id, "Rejected data point: {}", e);
        })?;
        let created_at = input.created_at.map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true));
        let row = data_points::insert(&mut tx, data_id, created_at.as_deref(), &typed.to_json().to_string()).await?;
        tx.commit().await?;

        self.metrics.inc_data_points_ingested();
        debug!(data_id, point_id = row.id, "Stored data point");
        row.try_into()
    }

    pub async fn get(&self, data_id: i64, point_id: i64) -> AppResult<DataPointResponse> {
        let mut tx = self.db.reader.begin().await?;
        require_data(&mut tx, data_id).await?;
        let row = data_points::find(&mut tx, data_id, point_id).await?.ok_or_not_found("Data point")?;
        tx.commit().await?;
        row.try_into()
    }

    pub async fn list(&self, data_id: i64, ctx: &PaginationContext) -> AppResult<Page<DataPointResponse>> {
        let mut tx = self.db.reader.begin().await?;
        require_data(&mut tx, data_id).await?;
        let page = data_points::list(&mut tx, data_id, ctx).await?;
        tx.commit().await?;
        page.try_map(DataPointResponse::try_from)
    }

    pub async fn delete(&self, data_id: i64, point_id: i64) -> AppResult<()> {
        let mut tx = self.db.writer.begin().await?;
        require_data(&mut tx, data_id).await?;
        data_points::delete(&mut tx, data_id, point_id)
            .await?
            .then_some(())
            .ok_or_not_found("Data point")?;
        tx.commit().await?;

        self.metrics.inc_entities_deleted();
        info!(data_id, point_id, "Deleted data point");
        Ok(())
    }
}
