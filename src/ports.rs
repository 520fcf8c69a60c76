//! Storage ports. Adapters live in [`crate::adapters`].
//!
//! Every method is one atomic unit against the store. The ledger methods in
//! particular own the whole read-validate-write sequence so that callers never
//! observe a half-applied settlement.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};

use crate::domain::{
    Admin, AppUser, Commodity, NewAccount, NewAdmin, NewCommodity, NewNotification, NewOrder,
    NewUser, Notification, Order, OrderAction, OrderFilter, Principal, SuperAdmin,
    WalletAdjustment, WalletLog,
};
use crate::error::AppError;

pub type RepositoryResult<T> = Result<T, AppError>;

#[async_trait]
pub trait DirectoryRepository: Send + Sync {
    async fn find_user(&self, id: i64) -> RepositoryResult<AppUser>;

    async fn find_admin(&self, id: i64) -> RepositoryResult<Admin>;

    async fn find_super_admin(&self, id: i64) -> RepositoryResult<SuperAdmin>;

    /// Every account holding `username`, users first, then admins, then super-admins.
    async fn find_principals_by_username(&self, username: &str)
        -> RepositoryResult<Vec<Principal>>;

    /// Fails with `Conflict` when the username is taken.
    async fn insert_user(&self, user: NewUser) -> RepositoryResult<AppUser>;

    async fn insert_admin(&self, admin: NewAdmin) -> RepositoryResult<Admin>;

    async fn insert_super_admin(&self, account: NewAccount) -> RepositoryResult<SuperAdmin>;

    /// All users, or only those owned by `admin_id`.
    async fn list_users(&self, admin_id: Option<i64>) -> RepositoryResult<Vec<AppUser>>;

    async fn list_admins(&self) -> RepositoryResult<Vec<Admin>>;

    async fn count_users_by_admin(&self, admin_id: i64) -> RepositoryResult<i64>;
}

#[async_trait]
pub trait CommodityRepository: Send + Sync {
    async fn list_commodities(&self) -> RepositoryResult<Vec<Commodity>>;

    async fn find_commodity(&self, id: i64) -> RepositoryResult<Commodity>;

    async fn insert_commodity(&self, commodity: NewCommodity) -> RepositoryResult<Commodity>;

    async fn update_price(
        &self,
        id: i64,
        price: &BigDecimal,
        at: DateTime<Utc>,
    ) -> RepositoryResult<Commodity>;
}

#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Applies the adjustment to the user's balance and appends its wallet log.
    /// Returns the new balance.
    async fn adjust_wallet(&self, adjustment: WalletAdjustment) -> RepositoryResult<BigDecimal>;

    /// Stores a pending order together with the notification for its admin.
    async fn insert_order(
        &self,
        order: NewOrder,
        notification: NewNotification,
    ) -> RepositoryResult<Order>;

    async fn find_order(&self, id: i64) -> RepositoryResult<Order>;

    async fn list_orders(&self, filter: &OrderFilter) -> RepositoryResult<Vec<Order>>;

    /// Locks the order, applies the decision and any resulting wallet
    /// adjustment, then stores the terminal status. Nothing is written when
    /// any step fails.
    async fn settle_order(&self, id: i64, action: OrderAction) -> RepositoryResult<Order>;

    /// Wallet history of a user, newest first.
    async fn wallet_logs(&self, user_id: i64) -> RepositoryResult<Vec<WalletLog>>;
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Unread notifications of an admin, newest first.
    async fn unread_notifications(&self, admin_id: i64) -> RepositoryResult<Vec<Notification>>;

    async fn find_notification(&self, id: i64) -> RepositoryResult<Notification>;

    async fn mark_notification_read(&self, id: i64) -> RepositoryResult<Notification>;
}

/// A complete backing store.
#[async_trait]
pub trait Store:
    DirectoryRepository + CommodityRepository + LedgerRepository + NotificationRepository
{
    async fn ping(&self) -> RepositoryResult<()>;
}
