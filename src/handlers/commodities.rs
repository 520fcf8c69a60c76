use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use bigdecimal::BigDecimal;
use serde::Deserialize;

use crate::error::AppError;
use crate::middleware::auth::{CurrentPrincipal, ADMIN_ROLES};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct PriceUpdateRequest {
    pub price: BigDecimal,
}

pub async fn list_commodities(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let commodities = state.commodities.list().await?;
    Ok(Json(commodities))
}

pub async fn update_price(
    State(state): State<AppState>,
    principal: CurrentPrincipal,
    Path(id): Path<i64>,
    Json(request): Json<PriceUpdateRequest>,
) -> Result<impl IntoResponse, AppError> {
    principal.require_role(ADMIN_ROLES)?;

    let commodity = state.commodities.set_price(id, request.price).await?;
    Ok(Json(commodity))
}
