//! In-process implementation of the storage ports.
//!
//! All state sits behind one async mutex, so every port call is serialized and
//! trivially atomic. Used by the test-suite and by `DATABASE_URL=memory://`.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tokio::sync::Mutex;

use crate::domain::{
    AccountStatus, Admin, AppUser, Commodity, NewAccount, NewAdmin, NewCommodity,
    NewNotification, NewOrder, NewUser, Notification, Order, OrderAction, OrderFilter,
    OrderStatus, Principal, SuperAdmin, WalletAdjustment, WalletLog,
};
use crate::error::AppError;
use crate::ports::{
    CommodityRepository, DirectoryRepository, LedgerRepository, NotificationRepository,
    RepositoryResult, Store,
};

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    super_admins: BTreeMap<i64, SuperAdmin>,
    admins: BTreeMap<i64, Admin>,
    users: BTreeMap<i64, AppUser>,
    commodities: BTreeMap<i64, Commodity>,
    orders: BTreeMap<i64, Order>,
    wallet_logs: BTreeMap<i64, WalletLog>,
    notifications: BTreeMap<i64, Notification>,
}

fn next_id<T>(table: &BTreeMap<i64, T>) -> i64 {
    table.keys().next_back().map_or(1, |id| id + 1)
}

fn username_taken(username: &str) -> AppError {
    AppError::Conflict(format!("username '{}' is already taken", username))
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MemoryState {
    fn apply_adjustment(
        &mut self,
        adjustment: &WalletAdjustment,
        now: DateTime<Utc>,
    ) -> RepositoryResult<BigDecimal> {
        let user = self
            .users
            .get_mut(&adjustment.user_id)
            .ok_or_else(|| AppError::not_found("user", adjustment.user_id))?;

        let balance = adjustment
            .direction
            .apply(&user.wallet_balance, &adjustment.amount)?;
        user.wallet_balance = balance.clone();
        user.updated_at = now;

        let id = next_id(&self.wallet_logs);
        self.wallet_logs.insert(
            id,
            WalletLog {
                id,
                user_id: adjustment.user_id,
                order_id: adjustment.order_id,
                change_amount: adjustment.amount.clone(),
                transaction_type: adjustment.direction,
                remarks: adjustment.direction.remarks().to_string(),
                timestamp: now,
            },
        );

        Ok(balance)
    }
}

#[async_trait]
impl DirectoryRepository for MemoryStore {
    async fn find_user(&self, id: i64) -> RepositoryResult<AppUser> {
        let state = self.state.lock().await;
        state
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::not_found("user", id))
    }

    async fn find_admin(&self, id: i64) -> RepositoryResult<Admin> {
        let state = self.state.lock().await;
        state
            .admins
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::not_found("admin", id))
    }

    async fn find_super_admin(&self, id: i64) -> RepositoryResult<SuperAdmin> {
        let state = self.state.lock().await;
        state
            .super_admins
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::not_found("super admin", id))
    }

    async fn find_principals_by_username(
        &self,
        username: &str,
    ) -> RepositoryResult<Vec<Principal>> {
        let state = self.state.lock().await;

        let users = state
            .users
            .values()
            .filter(|u| u.username == username)
            .cloned()
            .map(Principal::User);
        let admins = state
            .admins
            .values()
            .filter(|a| a.username == username)
            .cloned()
            .map(Principal::Admin);
        let roots = state
            .super_admins
            .values()
            .filter(|s| s.username == username)
            .cloned()
            .map(Principal::SuperAdmin);

        Ok(users.chain(admins).chain(roots).collect())
    }

    async fn insert_user(&self, user: NewUser) -> RepositoryResult<AppUser> {
        let mut state = self.state.lock().await;
        if state
            .users
            .values()
            .any(|u| u.username == user.account.username)
        {
            return Err(username_taken(&user.account.username));
        }

        let now = Utc::now();
        let id = next_id(&state.users);
        let created = AppUser {
            id,
            username: user.account.username,
            password_hash: user.account.password_hash,
            name: user.account.name,
            email: user.account.email,
            mobile: user.account.mobile,
            wallet_balance: user.wallet_balance,
            admin_id: user.admin_id,
            status: AccountStatus::Active,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(id, created.clone());

        Ok(created)
    }

    async fn insert_admin(&self, admin: NewAdmin) -> RepositoryResult<Admin> {
        let mut state = self.state.lock().await;
        if state
            .admins
            .values()
            .any(|a| a.username == admin.account.username)
        {
            return Err(username_taken(&admin.account.username));
        }

        let now = Utc::now();
        let id = next_id(&state.admins);
        let created = Admin {
            id,
            username: admin.account.username,
            password_hash: admin.account.password_hash,
            name: admin.account.name,
            email: admin.account.email,
            mobile: admin.account.mobile,
            status: AccountStatus::Active,
            created_by: admin.created_by,
            created_at: now,
            updated_at: now,
        };
        state.admins.insert(id, created.clone());

        Ok(created)
    }

    async fn insert_super_admin(&self, account: NewAccount) -> RepositoryResult<SuperAdmin> {
        let mut state = self.state.lock().await;
        if state
            .super_admins
            .values()
            .any(|s| s.username == account.username)
        {
            return Err(username_taken(&account.username));
        }

        let now = Utc::now();
        let id = next_id(&state.super_admins);
        let created = SuperAdmin {
            id,
            username: account.username,
            password_hash: account.password_hash,
            name: account.name,
            email: account.email,
            mobile: account.mobile,
            status: AccountStatus::Active,
            created_at: now,
            updated_at: now,
        };
        state.super_admins.insert(id, created.clone());

        Ok(created)
    }

    async fn list_users(&self, admin_id: Option<i64>) -> RepositoryResult<Vec<AppUser>> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .values()
            .filter(|u| admin_id.map_or(true, |id| u.admin_id == Some(id)))
            .cloned()
            .collect())
    }

    async fn list_admins(&self) -> RepositoryResult<Vec<Admin>> {
        let state = self.state.lock().await;
        Ok(state.admins.values().cloned().collect())
    }

    async fn count_users_by_admin(&self, admin_id: i64) -> RepositoryResult<i64> {
        let state = self.state.lock().await;
        let count = state
            .users
            .values()
            .filter(|u| u.admin_id == Some(admin_id))
            .count();
        Ok(count as i64)
    }
}

#[async_trait]
impl CommodityRepository for MemoryStore {
    async fn list_commodities(&self) -> RepositoryResult<Vec<Commodity>> {
        let state = self.state.lock().await;
        Ok(state.commodities.values().cloned().collect())
    }

    async fn find_commodity(&self, id: i64) -> RepositoryResult<Commodity> {
        let state = self.state.lock().await;
        state
            .commodities
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::not_found("commodity", id))
    }

    async fn insert_commodity(&self, commodity: NewCommodity) -> RepositoryResult<Commodity> {
        let mut state = self.state.lock().await;
        let id = next_id(&state.commodities);
        let created = Commodity {
            id,
            name: commodity.name,
            unit: commodity.unit,
            current_price: commodity.current_price,
            last_updated: Utc::now(),
        };
        state.commodities.insert(id, created.clone());

        Ok(created)
    }

    async fn update_price(
        &self,
        id: i64,
        price: &BigDecimal,
        at: DateTime<Utc>,
    ) -> RepositoryResult<Commodity> {
        let mut state = self.state.lock().await;
        let commodity = state
            .commodities
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("commodity", id))?;

        commodity.current_price = price.clone();
        commodity.last_updated = at;

        Ok(commodity.clone())
    }
}

#[async_trait]
impl LedgerRepository for MemoryStore {
    async fn adjust_wallet(&self, adjustment: WalletAdjustment) -> RepositoryResult<BigDecimal> {
        let mut state = self.state.lock().await;
        state.apply_adjustment(&adjustment, Utc::now())
    }

    async fn insert_order(
        &self,
        order: NewOrder,
        notification: NewNotification,
    ) -> RepositoryResult<Order> {
        let mut state = self.state.lock().await;

        let id = next_id(&state.orders);
        let created = Order {
            id,
            user_id: order.user_id,
            commodity_id: order.commodity_id,
            admin_id: order.admin_id,
            order_type: order.order_type,
            quantity: order.quantity,
            price: order.price,
            status: OrderStatus::Pending,
            timestamp: order.timestamp,
        };
        state.orders.insert(id, created.clone());

        let note_id = next_id(&state.notifications);
        state.notifications.insert(
            note_id,
            Notification {
                id: note_id,
                admin_id: notification.admin_id,
                message: notification.message,
                read_status: false,
                created_at: notification.created_at,
            },
        );

        Ok(created)
    }

    async fn find_order(&self, id: i64) -> RepositoryResult<Order> {
        let state = self.state.lock().await;
        state
            .orders
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::not_found("order", id))
    }

    async fn list_orders(&self, filter: &OrderFilter) -> RepositoryResult<Vec<Order>> {
        let state = self.state.lock().await;
        Ok(state
            .orders
            .values()
            .filter(|o| filter.matches(o))
            .cloned()
            .collect())
    }

    async fn settle_order(&self, id: i64, action: OrderAction) -> RepositoryResult<Order> {
        let mut state = self.state.lock().await;

        let settlement = state
            .orders
            .get(&id)
            .ok_or_else(|| AppError::not_found("order", id))?
            .settle(action)?;

        // The wallet goes first; a failed debit returns before the order is touched.
        if let Some(adjustment) = &settlement.adjustment {
            state.apply_adjustment(adjustment, Utc::now())?;
        }

        let order = state
            .orders
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("order", id))?;
        order.status = settlement.status;

        Ok(order.clone())
    }

    async fn wallet_logs(&self, user_id: i64) -> RepositoryResult<Vec<WalletLog>> {
        let state = self.state.lock().await;
        if !state.users.contains_key(&user_id) {
            return Err(AppError::not_found("user", user_id));
        }

        Ok(state
            .wallet_logs
            .values()
            .rev()
            .filter(|log| log.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl NotificationRepository for MemoryStore {
    async fn unread_notifications(&self, admin_id: i64) -> RepositoryResult<Vec<Notification>> {
        let state = self.state.lock().await;
        Ok(state
            .notifications
            .values()
            .rev()
            .filter(|n| n.admin_id == Some(admin_id) && !n.read_status)
            .cloned()
            .collect())
    }

    async fn find_notification(&self, id: i64) -> RepositoryResult<Notification> {
        let state = self.state.lock().await;
        state
            .notifications
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::not_found("notification", id))
    }

    async fn mark_notification_read(&self, id: i64) -> RepositoryResult<Notification> {
        let mut state = self.state.lock().await;
        let notification = state
            .notifications
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("notification", id))?;

        notification.read_status = true;
        Ok(notification.clone())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> RepositoryResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Direction, OrderType};
    use std::str::FromStr;

    fn dec(value: &str) -> BigDecimal {
        BigDecimal::from_str(value).unwrap()
    }

    async fn store_with_user(balance: &str) -> (MemoryStore, AppUser) {
        let store = MemoryStore::new();
        let user = store
            .insert_user(NewUser {
                account: NewAccount {
                    username: "user1".to_string(),
                    password_hash: "x".to_string(),
                    name: None,
                    email: None,
                    mobile: None,
                },
                wallet_balance: dec(balance),
                admin_id: None,
            })
            .await
            .unwrap();
        (store, user)
    }

    #[tokio::test]
    async fn test_ids_are_sequential_per_table() {
        let store = MemoryStore::new();
        for (i, name) in ["Gold", "Silver"].iter().enumerate() {
            let commodity = store
                .insert_commodity(NewCommodity {
                    name: name.to_string(),
                    unit: "oz".to_string(),
                    current_price: dec("1.00"),
                })
                .await
                .unwrap();
            assert_eq!(commodity.id, i as i64 + 1);
        }
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let (store, _) = store_with_user("0").await;
        let err = store
            .insert_user(NewUser {
                account: NewAccount {
                    username: "user1".to_string(),
                    password_hash: "y".to_string(),
                    name: None,
                    email: None,
                    mobile: None,
                },
                wallet_balance: dec("0"),
                admin_id: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_failed_debit_writes_nothing() {
        let (store, user) = store_with_user("5.00").await;

        let err = store
            .adjust_wallet(WalletAdjustment {
                user_id: user.id,
                amount: dec("5.01"),
                direction: Direction::Debit,
                order_id: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InsufficientFunds { .. }));
        assert_eq!(store.find_user(user.id).await.unwrap().wallet_balance, dec("5.00"));
        assert!(store.wallet_logs(user.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_settle_unknown_order() {
        let store = MemoryStore::new();
        let err = store.settle_order(99, OrderAction::Approve).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_insert_order_files_notification() {
        let (store, user) = store_with_user("0").await;
        let order = store
            .insert_order(
                NewOrder {
                    user_id: user.id,
                    commodity_id: 1,
                    admin_id: Some(5),
                    order_type: OrderType::Buy,
                    quantity: dec("1"),
                    price: dec("2.00"),
                    timestamp: Utc::now(),
                },
                NewNotification {
                    admin_id: Some(5),
                    message: "New BUY request by user: user1".to_string(),
                    created_at: Utc::now(),
                },
            )
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        let notes = store.unread_notifications(5).await.unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].message, "New BUY request by user: user1");
    }
}
