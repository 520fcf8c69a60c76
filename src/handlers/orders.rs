use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use bigdecimal::BigDecimal;
use serde::Deserialize;

use crate::domain::{OrderFilter, OrderType, Role};
use crate::error::AppError;
use crate::middleware::auth::{CurrentPrincipal, ADMIN_ROLES};
use crate::services::PlaceOrder;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    pub user_id: i64,
    pub commodity_id: i64,
    pub quantity: BigDecimal,
    pub transaction_type: String,
}

#[derive(Debug, Deserialize)]
pub struct ProcessOrderRequest {
    pub action: String,
}

pub async fn place_order(
    State(state): State<AppState>,
    principal: CurrentPrincipal,
    Json(request): Json<PlaceOrderRequest>,
) -> Result<impl IntoResponse, AppError> {
    let order_type: OrderType = request.transaction_type.parse()?;
    principal.authorize_user(&state, request.user_id).await?;

    let order = state
        .orders
        .place_order(PlaceOrder {
            user_id: request.user_id,
            commodity_id: request.commodity_id,
            quantity: request.quantity,
            order_type,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(order)))
}

/// Admins only ever see the orders of their own users.
pub async fn list_orders(
    State(state): State<AppState>,
    principal: CurrentPrincipal,
    Query(mut filter): Query<OrderFilter>,
) -> Result<impl IntoResponse, AppError> {
    let identity = principal.require_role(ADMIN_ROLES)?;
    if identity.role == Role::Admin {
        filter.admin_id = Some(identity.id);
    }

    let orders = state.orders.list_orders(&filter).await?;
    Ok(Json(orders))
}

pub async fn process_order(
    State(state): State<AppState>,
    principal: CurrentPrincipal,
    Path(id): Path<i64>,
    Json(request): Json<ProcessOrderRequest>,
) -> Result<impl IntoResponse, AppError> {
    let identity = principal.require_role(ADMIN_ROLES)?;
    let tenant = (identity.role == Role::Admin).then_some(identity.id);

    let order = state
        .orders
        .process_order_for(id, &request.action, tenant)
        .await?;
    Ok(Json(order))
}
