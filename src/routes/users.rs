use axum::{extract::State, http::StatusCode, Json};

use super::extract::{ApiJson, ApiPath, ApiQuery};
use crate::error::AppResult;
use crate::pagination::{ListParams, Page};
use crate::state::AppState;
use crate::types::{UserCreate, UserResponse};

pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<UserCreate>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let user = state.users.register(body).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn list_users(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> AppResult<Json<Page<UserResponse>>> {
    Ok(Json(state.users.list(&params.try_into()?).await?))
}

pub async fn get_user(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> AppResult<Json<UserResponse>> {
    Ok(Json(state.users.get(id).await?))
}
