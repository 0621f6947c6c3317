use axum::{extract::State, http::StatusCode, Json};

use super::extract::{ApiJson, ApiPath, ApiQuery};
use crate::auth::CurrentUser;
use crate::error::AppResult;
use crate::pagination::{ListParams, Page};
use crate::state::AppState;
use crate::types::{DataCreate, DataResponse, DataUpdate};

/// Requires a bearer token; the caller becomes the owner.
pub async fn create_data(
    State(state): State<AppState>,
    CurrentUser(owner_id): CurrentUser,
    ApiJson(body): ApiJson<DataCreate>,
) -> AppResult<(StatusCode, Json<DataResponse>)> {
    let data = state.datas.create(owner_id, body).await?;
    Ok((StatusCode::CREATED, Json(data)))
}

pub async fn list_datas(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> AppResult<Json<Page<DataResponse>>> {
    Ok(Json(state.datas.list(&params.try_into()?).await?))
}

pub async fn get_data(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> AppResult<Json<DataResponse>> {
    Ok(Json(state.datas.get(id).await?))
}

pub async fn update_data(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<DataUpdate>,
) -> AppResult<Json<DataResponse>> {
    Ok(Json(state.datas.update(id, body).await?))
}

pub async fn delete_data(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> AppResult<StatusCode> {
    state.datas.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
