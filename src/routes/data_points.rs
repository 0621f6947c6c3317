use axum::{extract::State, http::StatusCode, Json};

use super::extract::{ApiJson, ApiPath, ApiQuery};
use crate::error::AppResult;
use crate::pagination::{ListParams, Page};
use crate::state::AppState;
use crate::types::{DataPointCreate, DataPointResponse};

pub async fn create_data_point(
    State(state): State<AppState>,
    ApiPath(data_id): ApiPath<i64>,
    ApiJson(body): ApiJson<DataPointCreate>,
) -> AppResult<(StatusCode, Json<DataPointResponse>)> {
    let point = state.data_points.create(data_id, body).await?;
    Ok((StatusCode::CREATED, Json(point)))
}

pub async fn list_data_points(
    State(state): State<AppState>,
    ApiPath(data_id): ApiPath<i64>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> AppResult<Json<Page<DataPointResponse>>> {
    Ok(Json(state.data_points.list(data_id, &params.try_into()?).await?))
}

pub async fn get_data_point(
    State(state): State<AppState>,
    ApiPath((data_id, point_id)): ApiPath<(i64, i64)>,
) -> AppResult<Json<DataPointResponse>> {
    Ok(Json(state.data_points.get(data_id, point_id).await?))
}

pub async fn delete_data_point(
    State(state): State<AppState>,
    ApiPath((data_id, point_id)): ApiPath<(i64, i64)>,
) -> AppResult<StatusCode> {
    state.data_points.delete(data_id, point_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
