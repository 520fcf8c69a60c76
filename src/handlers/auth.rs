use axum::{extract::State, response::IntoResponse, Json};
use serde::Deserialize;

use crate::error::AppError;
use crate::middleware::CurrentPrincipal;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = state
        .auth
        .login(request.username.trim(), &request.password)
        .await?;

    Ok(Json(response))
}

pub async fn me(principal: CurrentPrincipal) -> impl IntoResponse {
    Json(principal.0)
}
