//! HTTP route handlers for the Home Historian API.
//!
//! Handlers only extract, delegate to a service and pick the status code;
//! every failure is an [`AppError`](crate::error::AppError).

pub mod auth;
pub mod data_metas;
pub mod data_points;
pub mod datas;
pub mod extract;
pub mod health;
pub mod metas;
pub mod users;

use axum::{
    extract::DefaultBodyLimit,
    http::{Method, Uri},
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::error::AppError;
use crate::metrics;
use crate::middleware::security_headers::security_headers_middleware;
use crate::state::AppState;

/// Answers unmatched paths and methods.
pub async fn not_found(method: Method, uri: Uri) -> AppError {
    AppError::NotFound(format!("Endpoint '{} {}' not found", method, uri.path()))
}

/// Builds the full application router with its middleware stack.
pub fn router(state: AppState) -> Router {
    let cfg = state.config.clone();
    let counters = state.metrics.clone();

    let app = Router::new()
        .route("/", get(health::root))
        .route("/healthz", get(health::healthz))
        .route("/readyz", get(health::readyz))
        .route("/version", get(health::version))
        .route("/metrics", get(health::metrics))
        .route("/metrics/prometheus", get(health::metrics_prometheus))
        .route("/auth/login", post(auth::login))
        .route("/users", post(users::create_user).get(users::list_users))
        .route("/users/{id}", get(users::get_user))
        .route("/datas", post(datas::create_data).get(datas::list_datas))
        .route("/datas/{id}", get(datas::get_data).put(datas::update_data).delete(datas::delete_data))
        .route(
            "/datas/{id}/data_points",
            post(data_points::create_data_point).get(data_points::list_data_points),
        )
        .route(
            "/datas/{id}/data_points/{point_id}",
            get(data_points::get_data_point).delete(data_points::delete_data_point),
        )
        .route("/datas/{id}/metas", post(data_metas::create_data_meta).get(data_metas::list_data_metas))
        .route(
            "/datas/{id}/metas/{meta_id}",
            get(data_metas::get_data_meta)
                .put(data_metas::update_data_meta)
                .delete(data_metas::delete_data_meta),
        )
        .route("/metas", post(metas::create_meta).get(metas::list_metas))
        .route("/metas/{id}", get(metas::get_meta).put(metas::update_meta).delete(metas::delete_meta))
        .fallback(not_found)
        .method_not_allowed_fallback(not_found)
        .with_state(state)
        .layer(DefaultBodyLimit::max(cfg.api.max_body_bytes))
        .layer(from_fn_with_state(counters, metrics::record_outcome))
        .layer(TraceLayer::new_for_http())
        .layer(from_fn_with_state(cfg, security_headers_middleware));

    // CORS: permissive in debug builds for local frontends
    if cfg!(debug_assertions) {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}
