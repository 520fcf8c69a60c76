//! Postgres implementation of the storage ports.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use std::str::FromStr;

use crate::domain::{
    Admin, AppUser, Commodity, NewAccount, NewAdmin, NewCommodity, NewNotification, NewOrder,
    NewUser, Notification, Order, OrderAction, OrderFilter, Principal, SuperAdmin,
    WalletAdjustment, WalletLog,
};
use crate::error::AppError;
use crate::ports::{
    CommodityRepository, DirectoryRepository, LedgerRepository, NotificationRepository,
    RepositoryResult, Store,
};

/// Postgres-backed store.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

const UNIQUE_VIOLATION: &str = "23505";

fn insert_error(err: sqlx::Error, username: &str) -> AppError {
    if let sqlx::Error::Database(db) = &err {
        if db.code().as_deref() == Some(UNIQUE_VIOLATION) {
            return AppError::Conflict(format!("username '{}' is already taken", username));
        }
    }
    AppError::Database(err)
}

fn parse_column<T: FromStr<Err = AppError>>(column: &str, value: &str) -> Result<T, AppError> {
    value
        .parse()
        .map_err(|e| AppError::Internal(format!("corrupt {} column: {}", column, e)))
}

/// Locks the user row, applies the adjustment and appends the wallet log.
/// Must run inside the caller's transaction.
async fn apply_adjustment(
    conn: &mut PgConnection,
    adjustment: &WalletAdjustment,
) -> RepositoryResult<BigDecimal> {
    let balance = sqlx::query_scalar::<_, BigDecimal>(
        "SELECT wallet_balance FROM app_user WHERE id = $1 FOR UPDATE",
    )
    .bind(adjustment.user_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| AppError::not_found("user", adjustment.user_id))?;

    let new_balance = adjustment.direction.apply(&balance, &adjustment.amount)?;

    sqlx::query("UPDATE app_user SET wallet_balance = $2, updated_at = NOW() WHERE id = $1")
        .bind(adjustment.user_id)
        .bind(&new_balance)
        .execute(&mut *conn)
        .await?;

    sqlx::query(
        r#"
        INSERT INTO wallet_log (user_id, order_id, change_amount, transaction_type, remarks, logged_at)
        VALUES ($1, $2, $3, $4, $5, NOW())
        "#,
    )
    .bind(adjustment.user_id)
    .bind(adjustment.order_id)
    .bind(&adjustment.amount)
    .bind(adjustment.direction.as_str())
    .bind(adjustment.direction.remarks())
    .execute(&mut *conn)
    .await?;

    Ok(new_balance)
}

#[async_trait]
impl DirectoryRepository for PostgresStore {
    async fn find_user(&self, id: i64) -> RepositoryResult<AppUser> {
        sqlx::query_as::<_, UserRow>("SELECT * FROM app_user WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found("user", id))?
            .into_domain()
    }

    async fn find_admin(&self, id: i64) -> RepositoryResult<Admin> {
        sqlx::query_as::<_, AdminRow>("SELECT * FROM admin WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found("admin", id))?
            .into_domain()
    }

    async fn find_super_admin(&self, id: i64) -> RepositoryResult<SuperAdmin> {
        sqlx::query_as::<_, SuperAdminRow>("SELECT * FROM super_admin WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found("super admin", id))?
            .into_domain()
    }

    async fn find_principals_by_username(
        &self,
        username: &str,
    ) -> RepositoryResult<Vec<Principal>> {
        let mut principals = Vec::new();

        if let Some(row) = sqlx::query_as::<_, UserRow>("SELECT * FROM app_user WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?
        {
            principals.push(Principal::User(row.into_domain()?));
        }

        if let Some(row) = sqlx::query_as::<_, AdminRow>("SELECT * FROM admin WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?
        {
            principals.push(Principal::Admin(row.into_domain()?));
        }

        if let Some(row) =
            sqlx::query_as::<_, SuperAdminRow>("SELECT * FROM super_admin WHERE username = $1")
                .bind(username)
                .fetch_optional(&self.pool)
                .await?
        {
            principals.push(Principal::SuperAdmin(row.into_domain()?));
        }

        Ok(principals)
    }

    async fn insert_user(&self, user: NewUser) -> RepositoryResult<AppUser> {
        let account = user.account;
        sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO app_user (username, password_hash, name, email, mobile, wallet_balance, admin_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&account.username)
        .bind(&account.password_hash)
        .bind(&account.name)
        .bind(&account.email)
        .bind(&account.mobile)
        .bind(&user.wallet_balance)
        .bind(user.admin_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| insert_error(e, &account.username))?
        .into_domain()
    }

    async fn insert_admin(&self, admin: NewAdmin) -> RepositoryResult<Admin> {
        let account = admin.account;
        sqlx::query_as::<_, AdminRow>(
            r#"
            INSERT INTO admin (username, password_hash, name, email, mobile, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&account.username)
        .bind(&account.password_hash)
        .bind(&account.name)
        .bind(&account.email)
        .bind(&account.mobile)
        .bind(admin.created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| insert_error(e, &account.username))?
        .into_domain()
    }

    async fn insert_super_admin(&self, account: NewAccount) -> RepositoryResult<SuperAdmin> {
        sqlx::query_as::<_, SuperAdminRow>(
            r#"
            INSERT INTO super_admin (username, password_hash, name, email, mobile)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&account.username)
        .bind(&account.password_hash)
        .bind(&account.name)
        .bind(&account.email)
        .bind(&account.mobile)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| insert_error(e, &account.username))?
        .into_domain()
    }

    async fn list_users(&self, admin_id: Option<i64>) -> RepositoryResult<Vec<AppUser>> {
        sqlx::query_as::<_, UserRow>(
            "SELECT * FROM app_user WHERE ($1::BIGINT IS NULL OR admin_id = $1) ORDER BY id",
        )
        .bind(admin_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(UserRow::into_domain)
        .collect()
    }

    async fn list_admins(&self) -> RepositoryResult<Vec<Admin>> {
        sqlx::query_as::<_, AdminRow>("SELECT * FROM admin ORDER BY id")
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(AdminRow::into_domain)
            .collect()
    }

    async fn count_users_by_admin(&self, admin_id: i64) -> RepositoryResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM app_user WHERE admin_id = $1")
            .bind(admin_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl CommodityRepository for PostgresStore {
    async fn list_commodities(&self) -> RepositoryResult<Vec<Commodity>> {
        let rows = sqlx::query_as::<_, CommodityRow>("SELECT * FROM commodity ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(CommodityRow::into_domain).collect())
    }

    async fn find_commodity(&self, id: i64) -> RepositoryResult<Commodity> {
        let row = sqlx::query_as::<_, CommodityRow>("SELECT * FROM commodity WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(CommodityRow::into_domain)
            .ok_or_else(|| AppError::not_found("commodity", id))
    }

    async fn insert_commodity(&self, commodity: NewCommodity) -> RepositoryResult<Commodity> {
        let row = sqlx::query_as::<_, CommodityRow>(
            r#"
            INSERT INTO commodity (name, unit, current_price, last_updated)
            VALUES ($1, $2, $3, NOW())
            RETURNING *
            "#,
        )
        .bind(&commodity.name)
        .bind(&commodity.unit)
        .bind(&commodity.current_price)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_domain())
    }

    async fn update_price(
        &self,
        id: i64,
        price: &BigDecimal,
        at: DateTime<Utc>,
    ) -> RepositoryResult<Commodity> {
        let row = sqlx::query_as::<_, CommodityRow>(
            "UPDATE commodity SET current_price = $2, last_updated = $3 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(price)
        .bind(at)
        .fetch_optional(&self.pool)
        .await?;

        row.map(CommodityRow::into_domain)
            .ok_or_else(|| AppError::not_found("commodity", id))
    }
}

#[async_trait]
impl LedgerRepository for PostgresStore {
    async fn adjust_wallet(&self, adjustment: WalletAdjustment) -> RepositoryResult<BigDecimal> {
        let mut tx = self.pool.begin().await?;
        let balance = apply_adjustment(&mut tx, &adjustment).await?;
        tx.commit().await?;

        Ok(balance)
    }

    async fn insert_order(
        &self,
        order: NewOrder,
        notification: NewNotification,
    ) -> RepositoryResult<Order> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, OrderRow>(
            r#"
            INSERT INTO orders (user_id, commodity_id, admin_id, order_type, quantity, price, status, placed_at)
            VALUES ($1, $2, $3, $4, $5, $6, 'PENDING', $7)
            RETURNING *
            "#,
        )
        .bind(order.user_id)
        .bind(order.commodity_id)
        .bind(order.admin_id)
        .bind(order.order_type.as_str())
        .bind(&order.quantity)
        .bind(&order.price)
        .bind(order.timestamp)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO notification (admin_id, message, read_status, created_at) VALUES ($1, $2, FALSE, $3)",
        )
        .bind(notification.admin_id)
        .bind(&notification.message)
        .bind(notification.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        row.into_domain()
    }

    async fn find_order(&self, id: i64) -> RepositoryResult<Order> {
        sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found("order", id))?
            .into_domain()
    }

    async fn list_orders(&self, filter: &OrderFilter) -> RepositoryResult<Vec<Order>> {
        sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT * FROM orders
            WHERE ($1::BIGINT IS NULL OR user_id = $1)
              AND ($2::BIGINT IS NULL OR admin_id = $2)
              AND ($3::TEXT IS NULL OR status = $3)
            ORDER BY id
            "#,
        )
        .bind(filter.user_id)
        .bind(filter.admin_id)
        .bind(filter.status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(OrderRow::into_domain)
        .collect()
    }

    async fn settle_order(&self, id: i64, action: OrderAction) -> RepositoryResult<Order> {
        // Dropping `tx` on any early return rolls everything back.
        let mut tx = self.pool.begin().await?;

        let order = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::not_found("order", id))?
            .into_domain()?;

        let settlement = order.settle(action)?;
        if let Some(adjustment) = &settlement.adjustment {
            apply_adjustment(&mut tx, adjustment).await?;
        }

        let row = sqlx::query_as::<_, OrderRow>(
            "UPDATE orders SET status = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(settlement.status.as_str())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        row.into_domain()
    }

    async fn wallet_logs(&self, user_id: i64) -> RepositoryResult<Vec<WalletLog>> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM app_user WHERE id = $1)")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        if !exists {
            return Err(AppError::not_found("user", user_id));
        }

        sqlx::query_as::<_, WalletLogRow>(
            "SELECT * FROM wallet_log WHERE user_id = $1 ORDER BY id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(WalletLogRow::into_domain)
        .collect()
    }
}

#[async_trait]
impl NotificationRepository for PostgresStore {
    async fn unread_notifications(&self, admin_id: i64) -> RepositoryResult<Vec<Notification>> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            "SELECT * FROM notification WHERE admin_id = $1 AND read_status = FALSE ORDER BY id DESC",
        )
        .bind(admin_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(NotificationRow::into_domain).collect())
    }

    async fn find_notification(&self, id: i64) -> RepositoryResult<Notification> {
        let row = sqlx::query_as::<_, NotificationRow>("SELECT * FROM notification WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(NotificationRow::into_domain)
            .ok_or_else(|| AppError::not_found("notification", id))
    }

    async fn mark_notification_read(&self, id: i64) -> RepositoryResult<Notification> {
        let row = sqlx::query_as::<_, NotificationRow>(
            "UPDATE notification SET read_status = TRUE WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(NotificationRow::into_domain)
            .ok_or_else(|| AppError::not_found("notification", id))
    }
}

#[async_trait]
impl Store for PostgresStore {
    async fn ping(&self) -> RepositoryResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

// Internal row types for SQLx. Not exposed outside the adapter.

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    password_hash: String,
    name: Option<String>,
    email: Option<String>,
    mobile: Option<String>,
    wallet_balance: BigDecimal,
    admin_id: Option<i64>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_domain(self) -> RepositoryResult<AppUser> {
        Ok(AppUser {
            id: self.id,
            username: self.username,
            password_hash: self.password_hash,
            name: self.name,
            email: self.email,
            mobile: self.mobile,
            wallet_balance: self.wallet_balance,
            admin_id: self.admin_id,
            status: parse_column("app_user.status", &self.status)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AdminRow {
    id: i64,
    username: String,
    password_hash: String,
    name: Option<String>,
    email: Option<String>,
    mobile: Option<String>,
    status: String,
    created_by: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AdminRow {
    fn into_domain(self) -> RepositoryResult<Admin> {
        Ok(Admin {
            id: self.id,
            username: self.username,
            password_hash: self.password_hash,
            name: self.name,
            email: self.email,
            mobile: self.mobile,
            status: parse_column("admin.status", &self.status)?,
            created_by: self.created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SuperAdminRow {
    id: i64,
    username: String,
    password_hash: String,
    name: Option<String>,
    email: Option<String>,
    mobile: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SuperAdminRow {
    fn into_domain(self) -> RepositoryResult<SuperAdmin> {
        Ok(SuperAdmin {
            id: self.id,
            username: self.username,
            password_hash: self.password_hash,
            name: self.name,
            email: self.email,
            mobile: self.mobile,
            status: parse_column("super_admin.status", &self.status)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CommodityRow {
    id: i64,
    name: String,
    unit: String,
    current_price: BigDecimal,
    last_updated: DateTime<Utc>,
}

impl CommodityRow {
    fn into_domain(self) -> Commodity {
        Commodity {
            id: self.id,
            name: self.name,
            unit: self.unit,
            current_price: self.current_price,
            last_updated: self.last_updated,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i64,
    user_id: i64,
    commodity_id: i64,
    admin_id: Option<i64>,
    order_type: String,
    quantity: BigDecimal,
    price: BigDecimal,
    status: String,
    placed_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_domain(self) -> RepositoryResult<Order> {
        Ok(Order {
            id: self.id,
            user_id: self.user_id,
            commodity_id: self.commodity_id,
            admin_id: self.admin_id,
            order_type: parse_column("orders.order_type", &self.order_type)?,
            quantity: self.quantity,
            price: self.price,
            status: parse_column("orders.status", &self.status)?,
            timestamp: self.placed_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct WalletLogRow {
    id: i64,
    user_id: i64,
    order_id: Option<i64>,
    change_amount: BigDecimal,
    transaction_type: String,
    remarks: String,
    logged_at: DateTime<Utc>,
}

impl WalletLogRow {
    fn into_domain(self) -> RepositoryResult<WalletLog> {
        Ok(WalletLog {
            id: self.id,
            user_id: self.user_id,
            order_id: self.order_id,
            change_amount: self.change_amount,
            transaction_type: parse_column("wallet_log.transaction_type", &self.transaction_type)?,
            remarks: self.remarks,
            timestamp: self.logged_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct NotificationRow {
    id: i64,
    admin_id: Option<i64>,
    message: String,
    read_status: bool,
    created_at: DateTime<Utc>,
}

impl NotificationRow {
    fn into_domain(self) -> Notification {
        Notification {
            id: self.id,
            admin_id: self.admin_id,
            message: self.message,
            read_status: self.read_status,
            created_at: self.created_at,
        }
    }
}
