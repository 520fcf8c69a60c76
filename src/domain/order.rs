//! Buy/sell orders and their settlement state machine.
//!
//! An order is placed PENDING with a snapshot of the commodity price. An admin
//! decision moves it to APPROVED or REJECTED exactly once; approval yields the
//! wallet adjustment that has to be applied before the new status is stored.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::wallet::{Direction, WalletAdjustment};
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    Buy,
    Sell,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Buy => "BUY",
            OrderType::Sell => "SELL",
        }
    }

    /// Buying spends wallet funds, selling adds to them.
    pub fn wallet_direction(&self) -> Direction {
        match self {
            OrderType::Buy => Direction::Debit,
            OrderType::Sell => Direction::Credit,
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" => Ok(OrderType::Buy),
            "SELL" => Ok(OrderType::Sell),
            other => Err(AppError::InvalidArgument(format!(
                "order type must be BUY or SELL, got '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    Pending,
    Approved,
    Rejected,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Approved => "APPROVED",
            OrderStatus::Rejected => "REJECTED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatus::Pending)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(OrderStatus::Pending),
            "APPROVED" => Ok(OrderStatus::Approved),
            "REJECTED" => Ok(OrderStatus::Rejected),
            other => Err(AppError::InvalidArgument(format!(
                "unknown order status '{}'",
                other
            ))),
        }
    }
}

/// Admin decision on a pending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderAction {
    Approve,
    Reject,
}

impl FromStr for OrderAction {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approve" => Ok(OrderAction::Approve),
            "reject" => Ok(OrderAction::Reject),
            other => Err(AppError::InvalidArgument(format!(
                "action must be 'approve' or 'reject', got '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub commodity_id: i64,
    pub admin_id: Option<i64>,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub quantity: BigDecimal,
    pub price: BigDecimal,
    pub status: OrderStatus,
    pub timestamp: DateTime<Utc>,
}

/// Order as submitted, before it gets an id.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: i64,
    pub commodity_id: i64,
    pub admin_id: Option<i64>,
    pub order_type: OrderType,
    pub quantity: BigDecimal,
    pub price: BigDecimal,
    pub timestamp: DateTime<Utc>,
}

/// Outcome of a decision: the status to store and the wallet movement that
/// must succeed first.
#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    pub status: OrderStatus,
    pub adjustment: Option<WalletAdjustment>,
}

impl Order {
    /// Amount owed or earned, always from the price captured at placement.
    pub fn settlement_amount(&self) -> BigDecimal {
        &self.price * &self.quantity
    }

    pub fn settle(&self, action: OrderAction) -> Result<Settlement, AppError> {
        if self.status.is_terminal() {
            return Err(AppError::Conflict(format!(
                "order {} is already {}",
                self.id, self.status
            )));
        }

        let settlement = match action {
            OrderAction::Approve => Settlement {
                status: OrderStatus::Approved,
                adjustment: Some(WalletAdjustment {
                    user_id: self.user_id,
                    amount: self.settlement_amount(),
                    direction: self.order_type.wallet_direction(),
                    order_id: Some(self.id),
                }),
            },
            OrderAction::Reject => Settlement {
                status: OrderStatus::Rejected,
                adjustment: None,
            },
        };

        Ok(settlement)
    }
}

/// Optional filters for listing orders.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderFilter {
    pub user_id: Option<i64>,
    pub admin_id: Option<i64>,
    pub status: Option<OrderStatus>,
}

impl OrderFilter {
    pub fn matches(&self, order: &Order) -> bool {
        self.user_id.map_or(true, |id| order.user_id == id)
            && self.admin_id.map_or(true, |id| order.admin_id == Some(id))
            && self.status.map_or(true, |status| order.status == status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(value: &str) -> BigDecimal {
        BigDecimal::from_str(value).unwrap()
    }

    fn pending(order_type: OrderType, quantity: &str, price: &str) -> Order {
        Order {
            id: 7,
            user_id: 3,
            commodity_id: 1,
            admin_id: Some(2),
            order_type,
            quantity: dec(quantity),
            price: dec(price),
            status: OrderStatus::Pending,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_approve_buy_debits_snapshot_amount() {
        let order = pending(OrderType::Buy, "3", "2000.00");
        let settlement = order.settle(OrderAction::Approve).unwrap();

        assert_eq!(settlement.status, OrderStatus::Approved);
        assert_eq!(
            settlement.adjustment,
            Some(WalletAdjustment {
                user_id: 3,
                amount: dec("6000.00"),
                direction: Direction::Debit,
                order_id: Some(7),
            })
        );
    }

    #[test]
    fn test_approve_sell_credits_snapshot_amount() {
        let order = pending(OrderType::Sell, "2", "25.50");
        let settlement = order.settle(OrderAction::Approve).unwrap();

        let adjustment = settlement.adjustment.unwrap();
        assert_eq!(adjustment.direction, Direction::Credit);
        assert_eq!(adjustment.amount, dec("51.00"));
    }

    #[test]
    fn test_reject_has_no_wallet_effect() {
        let order = pending(OrderType::Buy, "1", "10.00");
        let settlement = order.settle(OrderAction::Reject).unwrap();

        assert_eq!(settlement.status, OrderStatus::Rejected);
        assert_eq!(settlement.adjustment, None);
    }

    #[test]
    fn test_terminal_orders_cannot_be_settled_again() {
        for status in [OrderStatus::Approved, OrderStatus::Rejected] {
            let mut order = pending(OrderType::Sell, "1", "10.00");
            order.status = status;

            for action in [OrderAction::Approve, OrderAction::Reject] {
                assert!(matches!(order.settle(action), Err(AppError::Conflict(_))));
            }
        }
    }

    #[test]
    fn test_parse_action() {
        assert_eq!("approve".parse::<OrderAction>().unwrap(), OrderAction::Approve);
        assert_eq!("reject".parse::<OrderAction>().unwrap(), OrderAction::Reject);
        assert!(matches!(
            "cancel".parse::<OrderAction>(),
            Err(AppError::InvalidArgument(_))
        ));
        assert!("".parse::<OrderAction>().is_err());
    }

    #[test]
    fn test_parse_order_type() {
        assert_eq!("BUY".parse::<OrderType>().unwrap(), OrderType::Buy);
        assert_eq!("sell".parse::<OrderType>().unwrap(), OrderType::Sell);
        assert!(matches!(
            "HOLD".parse::<OrderType>(),
            Err(AppError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_filter_matches() {
        let order = pending(OrderType::Buy, "1", "1.00");

        assert!(OrderFilter::default().matches(&order));
        assert!(OrderFilter {
            user_id: Some(3),
            admin_id: Some(2),
            status: Some(OrderStatus::Pending),
        }
        .matches(&order));
        assert!(!OrderFilter {
            status: Some(OrderStatus::Approved),
            ..Default::default()
        }
        .matches(&order));
        assert!(!OrderFilter {
            admin_id: Some(9),
            ..Default::default()
        }
        .matches(&order));
    }

    #[test]
    fn test_serializes_type_field() {
        let order = pending(OrderType::Sell, "2", "25.50");
        let json = serde_json::to_value(&order).unwrap();

        assert_eq!(json["type"], "SELL");
        assert_eq!(json["status"], "PENDING");
    }
}
