//! Super-admin and admin account management.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::error::AppError;
use crate::middleware::auth::{CurrentPrincipal, SUPER_ADMIN_ONLY};
use crate::services::directory::{CreateAccountRequest, CreateUserRequest};
use crate::AppState;

pub async fn list_admins(
    State(state): State<AppState>,
    principal: CurrentPrincipal,
) -> Result<impl IntoResponse, AppError> {
    principal.require_role(SUPER_ADMIN_ONLY)?;
    Ok(Json(state.directory.list_admins().await?))
}

pub async fn list_users(
    State(state): State<AppState>,
    principal: CurrentPrincipal,
) -> Result<impl IntoResponse, AppError> {
    principal.require_role(SUPER_ADMIN_ONLY)?;
    Ok(Json(state.directory.list_users().await?))
}

pub async fn create_admin(
    State(state): State<AppState>,
    principal: CurrentPrincipal,
    Json(request): Json<CreateAccountRequest>,
) -> Result<impl IntoResponse, AppError> {
    let identity = principal.require_role(SUPER_ADMIN_ONLY)?;

    let admin = state.directory.create_admin(request, Some(identity.id)).await?;
    Ok((StatusCode::CREATED, Json(admin)))
}

/// Super-admins may attach the new user to any admin through `adminId`.
pub async fn create_user(
    State(state): State<AppState>,
    principal: CurrentPrincipal,
    Json(request): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    principal.require_role(SUPER_ADMIN_ONLY)?;

    let admin_id = request.admin_id;
    let user = state.directory.create_user(request, admin_id).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn admin_details(
    State(state): State<AppState>,
    principal: CurrentPrincipal,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    principal.require_role(SUPER_ADMIN_ONLY)?;
    Ok(Json(state.directory.admin_details(id).await?))
}

pub async fn create_user_for_admin(
    State(state): State<AppState>,
    principal: CurrentPrincipal,
    Path(admin_id): Path<i64>,
    Json(request): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    principal.require_admin_scope(admin_id)?;

    let user = state.directory.create_user(request, Some(admin_id)).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn users_of_admin(
    State(state): State<AppState>,
    principal: CurrentPrincipal,
    Path(admin_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    principal.require_admin_scope(admin_id)?;
    Ok(Json(state.directory.users_of_admin(admin_id).await?))
}
