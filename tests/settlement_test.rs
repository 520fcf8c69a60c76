use bigdecimal::BigDecimal;
use inditrad_core::adapters::MemoryStore;
use inditrad_core::domain::{
    AppUser, Commodity, Direction, NewAccount, NewAdmin, NewCommodity, NewUser, OrderFilter,
    OrderStatus, OrderType,
};
use inditrad_core::error::AppError;
use inditrad_core::ports::{
    CommodityRepository, DirectoryRepository, LedgerRepository, NotificationRepository,
};
use inditrad_core::services::{OrderService, PlaceOrder, WalletLedger};
use std::str::FromStr;
use std::sync::Arc;

fn dec(value: &str) -> BigDecimal {
    BigDecimal::from_str(value).unwrap()
}

fn account(username: &str) -> NewAccount {
    NewAccount {
        username: username.to_string(),
        password_hash: "unused".to_string(),
        name: None,
        email: None,
        mobile: None,
    }
}

struct Market {
    store: Arc<MemoryStore>,
    orders: OrderService,
    wallet: WalletLedger,
    admin_id: i64,
}

impl Market {
    async fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let admin = store
            .insert_admin(NewAdmin {
                account: account("admin1"),
                created_by: None,
            })
            .await
            .unwrap();

        Self {
            orders: OrderService::new(store.clone(), store.clone(), store.clone()),
            wallet: WalletLedger::new(store.clone()),
            admin_id: admin.id,
            store,
        }
    }

    async fn user(&self, username: &str, balance: &str) -> AppUser {
        self.store
            .insert_user(NewUser {
                account: account(username),
                wallet_balance: dec(balance),
                admin_id: Some(self.admin_id),
            })
            .await
            .unwrap()
    }

    async fn commodity(&self, name: &str, price: &str) -> Commodity {
        self.store
            .insert_commodity(NewCommodity {
                name: name.to_string(),
                unit: "oz".to_string(),
                current_price: dec(price),
            })
            .await
            .unwrap()
    }

    async fn balance(&self, user_id: i64) -> BigDecimal {
        self.store.find_user(user_id).await.unwrap().wallet_balance
    }

    async fn place(
        &self,
        user: &AppUser,
        commodity: &Commodity,
        quantity: &str,
        order_type: OrderType,
    ) -> i64 {
        self.orders
            .place_order(PlaceOrder {
                user_id: user.id,
                commodity_id: commodity.id,
                quantity: dec(quantity),
                order_type,
            })
            .await
            .unwrap()
            .id
    }
}

#[tokio::test]
async fn test_buy_approval_debits_wallet() {
    let market = Market::new().await;
    let user = market.user("user1", "10000.00").await;
    let gold = market.commodity("Gold", "2000.00").await;

    let order_id = market.place(&user, &gold, "3", OrderType::Buy).await;
    let order = market.orders.process_order(order_id, "approve").await.unwrap();

    assert_eq!(order.status, OrderStatus::Approved);
    assert_eq!(market.balance(user.id).await, dec("4000.00"));

    let logs = market.wallet.logs(user.id).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].transaction_type, Direction::Debit);
    assert_eq!(logs[0].change_amount, dec("6000.00"));
    assert_eq!(logs[0].order_id, Some(order_id));
    assert_eq!(logs[0].remarks, "Amount deducted from wallet");
}

#[tokio::test]
async fn test_sell_approval_credits_wallet() {
    let market = Market::new().await;
    let user = market.user("user1", "100.00").await;
    let silver = market.commodity("Silver", "25.50").await;

    let order_id = market.place(&user, &silver, "2", OrderType::Sell).await;
    market.orders.process_order(order_id, "approve").await.unwrap();

    assert_eq!(market.balance(user.id).await, dec("151.00"));
    let logs = market.wallet.logs(user.id).await.unwrap();
    assert_eq!(logs[0].transaction_type, Direction::Credit);
    assert_eq!(logs[0].change_amount, dec("51.00"));
}

#[tokio::test]
async fn test_reject_leaves_wallet_untouched() {
    let market = Market::new().await;
    let user = market.user("user1", "10000.00").await;
    let gold = market.commodity("Gold", "2000.00").await;

    let order_id = market.place(&user, &gold, "1", OrderType::Buy).await;
    let order = market.orders.process_order(order_id, "reject").await.unwrap();

    assert_eq!(order.status, OrderStatus::Rejected);
    assert_eq!(market.balance(user.id).await, dec("10000.00"));
    assert!(market.wallet.logs(user.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_second_decision_conflicts_and_balance_moves_once() {
    let market = Market::new().await;
    let user = market.user("user1", "10000.00").await;
    let gold = market.commodity("Gold", "2000.00").await;

    let order_id = market.place(&user, &gold, "1", OrderType::Buy).await;
    market.orders.process_order(order_id, "approve").await.unwrap();

    for action in ["approve", "reject"] {
        let result = market.orders.process_order(order_id, action).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    assert_eq!(market.balance(user.id).await, dec("8000.00"));
    assert_eq!(market.wallet.logs(user.id).await.unwrap().len(), 1);
    let order = market.store.find_order(order_id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Approved);
}

#[tokio::test]
async fn test_overdrawing_buy_keeps_order_pending() {
    let market = Market::new().await;
    let user = market.user("user1", "100.00").await;
    let gold = market.commodity("Gold", "2000.00").await;

    let order_id = market.place(&user, &gold, "1", OrderType::Buy).await;
    let result = market.orders.process_order(order_id, "approve").await;

    assert!(matches!(result, Err(AppError::InsufficientFunds { .. })));
    assert_eq!(market.balance(user.id).await, dec("100.00"));
    assert!(market.wallet.logs(user.id).await.unwrap().is_empty());

    let order = market.store.find_order(order_id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Pending);

    // Still decidable after the failed approval.
    let order = market.orders.process_order(order_id, "reject").await.unwrap();
    assert_eq!(order.status, OrderStatus::Rejected);
}

#[tokio::test]
async fn test_settlement_uses_price_captured_at_placement() {
    let market = Market::new().await;
    let user = market.user("user1", "10000.00").await;
    let gold = market.commodity("Gold", "2000.00").await;

    let order_id = market.place(&user, &gold, "2", OrderType::Buy).await;
    market
        .store
        .update_price(gold.id, &dec("2500.00"), chrono::Utc::now())
        .await
        .unwrap();
    market.orders.process_order(order_id, "approve").await.unwrap();

    assert_eq!(market.balance(user.id).await, dec("6000.00"));
}

#[tokio::test]
async fn test_unknown_action_is_rejected_before_lookup() {
    let market = Market::new().await;

    let result = market.orders.process_order(999, "cancel").await;
    assert!(matches!(result, Err(AppError::InvalidArgument(_))));

    let result = market.orders.process_order(999, "approve").await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_admin_decides_only_own_tenant_orders() {
    let market = Market::new().await;
    let user = market.user("alice", "10000.00").await;
    let gold = market.commodity("Gold", "2000.00").await;
    let order_id = market.place(&user, &gold, "1", OrderType::Buy).await;

    let other_admin = market.admin_id + 1;
    let result = market
        .orders
        .process_order_for(order_id, "approve", Some(other_admin))
        .await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));
    assert_eq!(market.balance(user.id).await, dec("10000.00"));

    let result = market
        .orders
        .process_order_for(order_id, "bogus", Some(other_admin))
        .await;
    assert!(matches!(result, Err(AppError::InvalidArgument(_))));

    let order = market
        .orders
        .process_order_for(order_id, "approve", Some(market.admin_id))
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Approved);
    assert_eq!(market.balance(user.id).await, dec("8000.00"));
}

#[tokio::test]
async fn test_place_order_validation() {
    let market = Market::new().await;
    let user = market.user("user1", "10.00").await;
    let gold = market.commodity("Gold", "2000.00").await;

    let missing_user = market
        .orders
        .place_order(PlaceOrder {
            user_id: 999,
            commodity_id: gold.id,
            quantity: dec("1"),
            order_type: OrderType::Buy,
        })
        .await;
    assert!(matches!(missing_user, Err(AppError::NotFound(_))));

    let missing_commodity = market
        .orders
        .place_order(PlaceOrder {
            user_id: user.id,
            commodity_id: 999,
            quantity: dec("1"),
            order_type: OrderType::Buy,
        })
        .await;
    assert!(matches!(missing_commodity, Err(AppError::NotFound(_))));

    for quantity in ["0", "-2"] {
        let result = market
            .orders
            .place_order(PlaceOrder {
                user_id: user.id,
                commodity_id: gold.id,
                quantity: dec(quantity),
                order_type: OrderType::Sell,
            })
            .await;
        assert!(matches!(result, Err(AppError::InvalidArgument(_))));
    }

    assert!(market.orders.list_orders(&OrderFilter::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_place_order_snapshots_price_and_notifies_admin() {
    let market = Market::new().await;
    let user = market.user("trader7", "0").await;
    let silver = market.commodity("Silver", "25.50").await;

    let order_id = market.place(&user, &silver, "4", OrderType::Sell).await;
    let order = market.store.find_order(order_id).await.unwrap();

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.price, dec("25.50"));
    assert_eq!(order.admin_id, Some(market.admin_id));
    assert_eq!(market.balance(user.id).await, dec("0"));

    let notes = market.store.unread_notifications(market.admin_id).await.unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].message, "New SELL request by user: trader7");
}

#[tokio::test]
async fn test_list_orders_filters() {
    let market = Market::new().await;
    let alice = market.user("alice", "10000.00").await;
    let bob = market.user("bob", "10000.00").await;
    let gold = market.commodity("Gold", "2000.00").await;

    let first = market.place(&alice, &gold, "1", OrderType::Buy).await;
    market.place(&bob, &gold, "1", OrderType::Buy).await;
    market.place(&alice, &gold, "1", OrderType::Sell).await;
    market.orders.process_order(first, "approve").await.unwrap();

    let all = market.orders.list_orders(&OrderFilter::default()).await.unwrap();
    assert_eq!(all.iter().map(|o| o.id).collect::<Vec<_>>(), vec![1, 2, 3]);

    let alice_pending = market
        .orders
        .list_orders(&OrderFilter {
            user_id: Some(alice.id),
            status: Some(OrderStatus::Pending),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(alice_pending.len(), 1);
    assert_eq!(alice_pending[0].order_type, OrderType::Sell);
}

#[tokio::test]
async fn test_concurrent_debits_never_overdraw() {
    let market = Market::new().await;
    let user = market.user("user1", "100.00").await;

    let mut handles = Vec::new();
    for _ in 0..10 {
        let wallet = market.wallet.clone();
        let user_id = user.id;
        handles.push(tokio::spawn(async move {
            wallet.adjust(user_id, dec("30.00"), Direction::Debit).await
        }));
    }

    let mut succeeded = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(AppError::InsufficientFunds { .. }) => {}
            Err(e) => panic!("unexpected error: {}", e),
        }
    }

    assert_eq!(succeeded, 3);
    assert_eq!(market.balance(user.id).await, dec("10.00"));
    assert_eq!(market.wallet.logs(user.id).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_concurrent_decisions_settle_once() {
    let market = Market::new().await;
    let user = market.user("user1", "10000.00").await;
    let gold = market.commodity("Gold", "2000.00").await;
    let order_id = market.place(&user, &gold, "1", OrderType::Buy).await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let orders = market.orders.clone();
        handles.push(tokio::spawn(async move {
            orders.process_order(order_id, "approve").await
        }));
    }

    let mut approved = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            approved += 1;
        }
    }

    assert_eq!(approved, 1);
    assert_eq!(market.balance(user.id).await, dec("8000.00"));
}

#[tokio::test]
async fn test_debit_property_matches_balance() {
    let market = Market::new().await;

    for (balance, amount) in [("50.00", "49.99"), ("50.00", "50.00"), ("50.00", "50.01")] {
        let user = market.user(&format!("user-{}-{}", balance, amount), balance).await;
        let result = market
            .wallet
            .adjust(user.id, dec(amount), Direction::Debit)
            .await;

        if dec(amount) > dec(balance) {
            assert!(matches!(result, Err(AppError::InsufficientFunds { .. })));
            assert_eq!(market.balance(user.id).await, dec(balance));
            assert!(market.wallet.logs(user.id).await.unwrap().is_empty());
        } else {
            assert_eq!(result.unwrap(), dec(balance) - dec(amount));
            let logs = market.wallet.logs(user.id).await.unwrap();
            assert_eq!(logs.len(), 1);
            assert_eq!(logs[0].change_amount, dec(amount));
        }
    }
}
