use tracing::info;

use crate::db::Database;
use crate::error::{AppResult, OptionExt};
use crate::metrics::Metrics;
use crate::pagination::{Page, PaginationContext};
use crate::repositories::metas;
use crate::types::{MetaCreate, MetaResponse, MetaUpdate};
use crate::validator::ValueType;

use super::require_text;

#[derive(Clone)]
pub struct MetaService {
    db: Database,
    metrics: Metrics,
}

impl MetaService {
    pub fn new(db: Database, metrics: Metrics) -> Self {
        Self { db, metrics }
    }

    pub async fn create(&self, input: MetaCreate) -> AppResult<MetaResponse> {
        require_text("name", &input.name)?;
        let meta_type: ValueType = input.meta_type.parse()?;

        let mut tx = self.db.writer.begin().await?;
        let row = metas::insert(&mut tx, &input.name, meta_type).await?;
        tx.commit().await?;

        self.metrics.inc_metas_created();
        info!(meta_id = row.id, "Created meta '{}' of type {}", row.name, meta_type);
        row.try_into()
    }

    pub async fn get(&self, id: i64) -> AppResult<MetaResponse> {
        let mut tx = self.db.reader.begin().await?;
        let row = metas::find_by_id(&mut tx, id).await?.ok_or_not_found("Meta")?;
        tx.commit().await?;
        row.try_into()
    }

    pub async fn list(&self, ctx: &PaginationContext) -> AppResult<Page<MetaResponse>> {
        let mut tx = self.db.reader.begin().await?;
        let page = metas::list(&mut tx, ctx).await?;
        tx.commit().await?;
        page.try_map(MetaResponse::try_from)
    }

    /// Renames a meta; its type is fixed at creation.
    pub async fn update(&self, id: i64, input: MetaUpdate) -> AppResult<MetaResponse> {
        require_text("name", &input.name)?;

        let mut tx = self.db.writer.begin().await?;
        let row = metas::rename(&mut tx, id, &input.name).await?.ok_or_not_found("Meta")?;
        tx.commit().await?;

        info!(meta_id = id, "Renamed meta to '{}'", row.name);
        row.try_into()
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let mut tx = self.db.writer.begin().await?;
        metas::delete(&mut tx, id).await?.then_some(()).ok_or_not_found("Meta")?;
        tx.commit().await?;

        self.metrics.inc_entities_deleted();
        info!(meta_id = id, "Deleted meta");
        Ok(())
    }
}
