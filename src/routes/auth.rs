use axum::{extract::State, Json};

use super::extract::ApiForm;
use crate::error::AppResult;
use crate::state::AppState;
use crate::types::{LoginForm, TokenResponse};

/// `POST /auth/login` with a form-encoded `username` (or email) and `password`.
pub async fn login(State(state): State<AppState>, ApiForm(form): ApiForm<LoginForm>) -> AppResult<Json<TokenResponse>> {
    let user = state.users.authenticate(&form.username, &form.password).await?;
    let access_token = state.tokens.issue(user.id)?;
    tracing::info!(user_id = user.id, "Issued access token");
    Ok(Json(TokenResponse { access_token, token_type: "bearer".to_string() }))
}
