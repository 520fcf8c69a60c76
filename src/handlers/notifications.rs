use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};

use crate::error::AppError;
use crate::middleware::auth::{CurrentPrincipal, ADMIN_ROLES};
use crate::AppState;

pub async fn unread_for_admin(
    State(state): State<AppState>,
    principal: CurrentPrincipal,
    Path(admin_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    principal.require_admin_scope(admin_id)?;

    let notifications = state.notifications.unread_notifications(admin_id).await?;
    Ok(Json(notifications))
}

pub async fn mark_read(
    State(state): State<AppState>,
    principal: CurrentPrincipal,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    principal.require_role(ADMIN_ROLES)?;
    let notification = state.notifications.find_notification(id).await?;
    principal.require_tenant(notification.admin_id)?;

    let notification = state.notifications.mark_notification_read(id).await?;
    Ok(Json(notification))
}
