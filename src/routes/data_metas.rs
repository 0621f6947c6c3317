//! Metadata values of one data series; `{meta_id}` is the id of the meta, not of the link row.

use axum::{extract::State, http::StatusCode, Json};

use super::extract::{ApiJson, ApiPath, ApiQuery};
use crate::error::AppResult;
use crate::pagination::{ListParams, Page};
use crate::state::AppState;
use crate::types::{DataMetaResponse, DataMetaWrite};

pub async fn create_data_meta(
    State(state): State<AppState>,
    ApiPath(data_id): ApiPath<i64>,
    ApiJson(body): ApiJson<DataMetaWrite>,
) -> AppResult<(StatusCode, Json<DataMetaResponse>)> {
    let link = state.data_metas.create(data_id, body).await?;
    Ok((StatusCode::CREATED, Json(link)))
}

pub async fn list_data_metas(
    State(state): State<AppState>,
    ApiPath(data_id): ApiPath<i64>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> AppResult<Json<Page<DataMetaResponse>>> {
    Ok(Json(state.data_metas.list(data_id, &params.try_into()?).await?))
}

pub async fn get_data_meta(
    State(state): State<AppState>,
    ApiPath((data_id, meta_id)): ApiPath<(i64, i64)>,
) -> AppResult<Json<DataMetaResponse>> {
    Ok(Json(state.data_metas.get(data_id, meta_id).await?))
}

pub async fn update_data_meta(
    State(state): State<AppState>,
    ApiPath((data_id, meta_id)): ApiPath<(i64, i64)>,
    ApiJson(body): ApiJson<DataMetaWrite>,
) -> AppResult<Json<DataMetaResponse>> {
    Ok(Json(state.data_metas.update(data_id, meta_id, body).await?))
}

pub async fn delete_data_meta(
    State(state): State<AppState>,
    ApiPath((data_id, meta_id)): ApiPath<(i64, i64)>,
) -> AppResult<StatusCode> {
    state.data_metas.delete(data_id, meta_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
