//! Order placement and settlement.

use bigdecimal::BigDecimal;
use chrono::Utc;
use std::sync::Arc;

use crate::domain::{NewNotification, NewOrder, Order, OrderAction, OrderFilter, OrderType};
use crate::error::AppError;
use crate::ports::{CommodityRepository, DirectoryRepository, LedgerRepository};
use crate::validation::validate_positive_amount;

#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub user_id: i64,
    pub commodity_id: i64,
    pub quantity: BigDecimal,
    pub order_type: OrderType,
}

#[derive(Clone)]
pub struct OrderService {
    directory: Arc<dyn DirectoryRepository>,
    commodities: Arc<dyn CommodityRepository>,
    ledger: Arc<dyn LedgerRepository>,
}

impl OrderService {
    pub fn new(
        directory: Arc<dyn DirectoryRepository>,
        commodities: Arc<dyn CommodityRepository>,
        ledger: Arc<dyn LedgerRepository>,
    ) -> Self {
        Self {
            directory,
            commodities,
            ledger,
        }
    }

    /// Records a pending order at the commodity's current price and notifies
    /// the user's admin. The wallet is not touched until approval.
    pub async fn place_order(&self, request: PlaceOrder) -> Result<Order, AppError> {
        let user = self.directory.find_user(request.user_id).await?;
        let commodity = self.commodities.find_commodity(request.commodity_id).await?;
        validate_positive_amount("quantity", &request.quantity)?;

        let now = Utc::now();
        let notification = NewNotification::order_request(&user, request.order_type, now);
        let order = NewOrder {
            user_id: user.id,
            commodity_id: commodity.id,
            admin_id: user.admin_id,
            order_type: request.order_type,
            quantity: request.quantity,
            price: commodity.current_price,
            timestamp: now,
        };

        let order = self.ledger.insert_order(order, notification).await?;
        tracing::info!(
            order_id = order.id,
            user_id = order.user_id,
            commodity_id = order.commodity_id,
            order_type = %order.order_type,
            quantity = %order.quantity,
            price = %order.price,
            "Order placed"
        );

        Ok(order)
    }

    /// Applies an admin decision given as `"approve"` or `"reject"`.
    ///
    /// The action is validated before the order is looked up.
    pub async fn process_order(&self, order_id: i64, action: &str) -> Result<Order, AppError> {
        self.process_order_for(order_id, action, None).await
    }

    /// As [`Self::process_order`], restricted to orders of `tenant` when given.
    pub async fn process_order_for(
        &self,
        order_id: i64,
        action: &str,
        tenant: Option<i64>,
    ) -> Result<Order, AppError> {
        let action: OrderAction = action.parse()?;

        if let Some(admin_id) = tenant {
            let order = self.ledger.find_order(order_id).await?;
            if order.admin_id != Some(admin_id) {
                return Err(AppError::Forbidden(format!(
                    "order {} belongs to another admin",
                    order_id
                )));
            }
        }

        self.settle(order_id, action).await
    }

    async fn settle(&self, order_id: i64, action: OrderAction) -> Result<Order, AppError> {
        match self.ledger.settle_order(order_id, action).await {
            Ok(order) => {
                tracing::info!(order_id, status = %order.status, "Order processed");
                Ok(order)
            }
            Err(e) => {
                tracing::warn!(order_id, ?action, "Order processing failed: {}", e);
                Err(e)
            }
        }
    }

    pub async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>, AppError> {
        self.ledger.list_orders(filter).await
    }

    pub async fn find_order(&self, order_id: i64) -> Result<Order, AppError> {
        self.ledger.find_order(order_id).await
    }
}
