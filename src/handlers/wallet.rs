use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::domain::Direction;
use crate::error::AppError;
use crate::middleware::auth::{CurrentPrincipal, ADMIN_ROLES};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct WalletUpdateRequest {
    pub amount: BigDecimal,
    /// `CREDIT`/`DEBIT`, or the older `ADD`/`SUBTRACT`.
    pub operation: String,
}

#[derive(Debug, Serialize)]
pub struct WalletBalance {
    pub user_id: i64,
    pub balance: BigDecimal,
}

pub async fn update_wallet(
    State(state): State<AppState>,
    principal: CurrentPrincipal,
    Path(user_id): Path<i64>,
    Json(request): Json<WalletUpdateRequest>,
) -> Result<impl IntoResponse, AppError> {
    principal.require_role(ADMIN_ROLES)?;
    let direction: Direction = request.operation.parse()?;
    principal.authorize_user(&state, user_id).await?;

    let balance = state.wallet.adjust(user_id, request.amount, direction).await?;
    Ok(Json(WalletBalance { user_id, balance }))
}

pub async fn wallet_logs(
    State(state): State<AppState>,
    principal: CurrentPrincipal,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    principal.authorize_user(&state, user_id).await?;

    let logs = state.wallet.logs(user_id).await?;
    Ok(Json(logs))
}
