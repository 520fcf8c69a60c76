use chrono::{DateTime, Utc};
use serde::Serialize;

use super::account::AppUser;
use super::order::OrderType;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub id: i64,
    pub admin_id: Option<i64>,
    pub message: String,
    pub read_status: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub admin_id: Option<i64>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl NewNotification {
    /// Notice filed for the owning admin when one of their users places an order.
    pub fn order_request(user: &AppUser, order_type: OrderType, created_at: DateTime<Utc>) -> Self {
        Self {
            admin_id: user.admin_id,
            message: format!("New {} request by user: {}", order_type, user.username),
            created_at,
        }
    }
}
