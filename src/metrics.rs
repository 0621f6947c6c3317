use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Counters for monitoring
#[derive(Clone)]
pub struct Metrics {
    pub users_registered: Arc<AtomicU64>,
    pub datas_created: Arc<AtomicU64>,
    pub data_points_ingested: Arc<AtomicU64>,
    pub metas_created: Arc<AtomicU64>,
    pub data_metas_created: Arc<AtomicU64>,
    pub entities_deleted: Arc<AtomicU64>,
    pub validation_failures: Arc<AtomicU64>,
    pub unauthorized: Arc<AtomicU64>,
    pub not_found: Arc<AtomicU64>,
    pub conflicts: Arc<AtomicU64>,
    pub server_errors: Arc<AtomicU64>,
    pub start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            users_registered: Arc::new(AtomicU64::new(0)),
            datas_created: Arc::new(AtomicU64::new(0)),
            data_points_ingested: Arc::new(AtomicU64::new(0)),
            metas_created: Arc::new(AtomicU64::new(0)),
            data_metas_created: Arc::new(AtomicU64::new(0)),
            entities_deleted: Arc::new(AtomicU64::new(0)),
            validation_failures: Arc::new(AtomicU64::new(0)),
            unauthorized: Arc::new(AtomicU64::new(0)),
            not_found: Arc::new(AtomicU64::new(0)),
            conflicts: Arc::new(AtomicU64::new(0)),
            server_errors: Arc::new(AtomicU64::new(0)),
            start_time: Instant::now(),
        }
    }

    pub fn inc_users_registered(&self) {
        self.users_registered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_datas_created(&self) {
        self.datas_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_data_points_ingested(&self) {
        self.data_points_ingested.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_metas_created(&self) {
        self.metas_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_data_metas_created(&self) {
        self.data_metas_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_entities_deleted(&self) {
        self.entities_deleted.fetch_add(1, Ordering::Relaxed);
    }

    /// Classifies a finished response by status code.
    pub fn record_status(&self, status: StatusCode) {
        let counter = match status {
            StatusCode::BAD_REQUEST => &self.validation_failures,
            StatusCode::UNAUTHORIZED => &self.unauthorized,
            StatusCode::NOT_FOUND => &self.not_found,
            StatusCode::CONFLICT => &self.conflicts,
            s if s.is_server_error() => &self.server_errors,
            _ => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            users_registered: self.users_registered.load(Ordering::Relaxed),
            datas_created: self.datas_created.load(Ordering::Relaxed),
            data_points_ingested: self.data_points_ingested.load(Ordering::Relaxed),
            metas_created: self.metas_created.load(Ordering::Relaxed),
            data_metas_created: self.data_metas_created.load(Ordering::Relaxed),
            entities_deleted: self.entities_deleted.load(Ordering::Relaxed),
            validation_failures: self.validation_failures.load(Ordering::Relaxed),
            unauthorized: self.unauthorized.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
            conflicts: self.conflicts.load(Ordering::Relaxed),
            server_errors: self.server_errors.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub users_registered: u64,
    pub datas_created: u64,
    pub data_points_ingested: u64,
    pub metas_created: u64,
    pub data_metas_created: u64,
    pub entities_deleted: u64,
    pub validation_failures: u64,
    pub unauthorized: u64,
    pub not_found: u64,
    pub conflicts: u64,
    pub server_errors: u64,
    pub uptime_seconds: u64,
}

impl MetricsSnapshot {
    /// Prometheus text exposition format.
    pub fn to_prometheus(&self) -> String {
        let counters = [
            ("users_registered", "Users registered", self.users_registered),
            ("datas_created", "Data series created", self.datas_created),
            ("data_points_ingested", "Data points stored", self.data_points_ingested),
            ("metas_created", "Metadata fields created", self.metas_created),
            ("data_metas_created", "Metadata values attached", self.data_metas_created),
            ("entities_deleted", "Entities deleted", self.entities_deleted),
            ("validation_failures", "Requests rejected with 400", self.validation_failures),
            ("unauthorized", "Requests rejected with 401", self.unauthorized),
            ("not_found", "Requests answered with 404", self.not_found),
            ("conflicts", "Requests rejected with 409", self.conflicts),
            ("server_errors", "Requests failed with 5xx", self.server_errors),
        ];
        let mut out = String::new();
        for (name, help, value) in counters {
            out.push_str(&format!(
                "# HELP historian_{name} {help}\n# TYPE historian_{name} counter\nhistorian_{name} {value}\n"
            ));
        }
        out.push_str(&format!(
            "# HELP historian_uptime_seconds Uptime seconds\n# TYPE historian_uptime_seconds gauge\nhistorian_uptime_seconds {}\n",
            self.uptime_seconds
        ));
        out
    }
}

/// Middleware counting error responses by class.
pub async fn record_outcome(State(metrics): State<Metrics>, req: Request, next: Next) -> Response {
    let res = next.run(req).await;
    metrics.record_status(res.status());
    res
}
