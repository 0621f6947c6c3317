use std::sync::Arc;

use crate::auth::TokenService;
use crate::config::AppConfig;
use crate::db::Database;
use crate::metrics::Metrics;
use crate::services::{DataMetaService, DataPointService, DataService, MetaService, UserService};

/// The shared application state.
///
/// Cloned into every handler. The services share the pool and the metrics
/// counters; nothing else is mutable.
#[derive(Clone)]
pub struct AppState {
    /// The read pool; writes go through the services.
    pub db: sqlx::SqlitePool,
    pub config: Arc<AppConfig>,
    pub metrics: Metrics,
    /// Issues and verifies bearer tokens.
    pub tokens: TokenService,
    pub users: UserService,
    pub datas: DataService,
    pub data_points: DataPointService,
    pub metas: MetaService,
    pub data_metas: DataMetaService,
}

impl AppState {
    /// Wires the services around `db`. Fails only on an unusable auth configuration.
    pub fn new(db: Database, config: AppConfig) -> anyhow::Result<Self> {
        let metrics = Metrics::new();
        let tokens = TokenService::new(&config.auth)?;
        let enforce_meta_types = config.api.enforce_meta_types;

        Ok(Self {
            users: UserService::new(db.clone(), metrics.clone()),
            datas: DataService::new(db.clone(), metrics.clone()),
            data_points: DataPointService::new(db.clone(), metrics.clone()),
            metas: MetaService::new(db.clone(), metrics.clone()),
            data_metas: DataMetaService::new(db.clone(), metrics.clone(), enforce_meta_types),
            db: db.reader,
            config: Arc::new(config),
            metrics,
            tokens,
        })
    }
}
