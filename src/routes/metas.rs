use axum::{extract::State, http::StatusCode, Json};

use super::extract::{ApiJson, ApiPath, ApiQuery};
use crate::error::AppResult;
use crate::pagination::{ListParams, Page};
use crate::state::AppState;
use crate::types::{MetaCreate, MetaResponse, MetaUpdate};

pub async fn create_meta(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<MetaCreate>,
) -> AppResult<(StatusCode, Json<MetaResponse>)> {
    let meta = state.metas.create(body).await?;
    Ok((StatusCode::CREATED, Json(meta)))
}

pub async fn list_metas(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> AppResult<Json<Page<MetaResponse>>> {
    Ok(Json(state.metas.list(&params.try_into()?).await?))
}

pub async fn get_meta(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> AppResult<Json<MetaResponse>> {
    Ok(Json(state.metas.get(id).await?))
}

pub async fn update_meta(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<MetaUpdate>,
) -> AppResult<Json<MetaResponse>> {
    Ok(Json(state.metas.update(id, body).await?))
}

pub async fn delete_meta(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> AppResult<StatusCode> {
    state.metas.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
