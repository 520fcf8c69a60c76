pub mod adapters;
pub mod cli;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod ports;
pub mod services;
pub mod validation;

use axum::{
    http::HeaderValue,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::AllowedOrigins;
use crate::ports::{NotificationRepository, Store};
use crate::services::{
    AuthService, CommodityService, DirectoryService, OrderService, PriceFeed, TokenSigner,
    WalletLedger,
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub auth: AuthService,
    pub orders: OrderService,
    pub wallet: WalletLedger,
    pub commodities: CommodityService,
    pub directory: DirectoryService,
    pub notifications: Arc<dyn NotificationRepository>,
    pub prices: PriceFeed,
}

impl AppState {
    pub fn new<S: Store + 'static>(store: Arc<S>, signer: TokenSigner) -> Self {
        Self {
            auth: AuthService::new(store.clone(), signer),
            orders: OrderService::new(store.clone(), store.clone(), store.clone()),
            wallet: WalletLedger::new(store.clone()),
            commodities: CommodityService::new(store.clone()),
            directory: DirectoryService::new(store.clone()),
            notifications: store.clone(),
            prices: PriceFeed::new(store.clone()),
            store,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/me", get(handlers::auth::me))
        .route("/api/commodities", get(handlers::commodities::list_commodities))
        .route("/api/commodities/:id/price", put(handlers::commodities::update_price))
        .route("/api/transaction/place", post(handlers::orders::place_order))
        .route("/api/transaction/orders", get(handlers::orders::list_orders))
        .route(
            "/api/transaction/orders/:id/process",
            put(handlers::orders::process_order),
        )
        .route("/api/wallet/:user_id/update", put(handlers::wallet::update_wallet))
        .route("/api/wallet/:user_id/logs", get(handlers::wallet::wallet_logs))
        .route(
            "/api/notifications/admin/:admin_id",
            get(handlers::notifications::unread_for_admin),
        )
        .route("/api/notifications/:id/read", put(handlers::notifications::mark_read))
        .route("/api/superadmin/admins", get(handlers::directory::list_admins))
        .route("/api/superadmin/users", get(handlers::directory::list_users))
        .route("/api/superadmin/create-admin", post(handlers::directory::create_admin))
        .route("/api/superadmin/create-user", post(handlers::directory::create_user))
        .route(
            "/api/superadmin/admins/:id/details",
            get(handlers::directory::admin_details),
        )
        .route(
            "/api/admin/:admin_id/create-user",
            post(handlers::directory::create_user_for_admin),
        )
        .route("/api/admin/:admin_id/users", get(handlers::directory::users_of_admin))
        .layer(axum::middleware::from_fn(
            middleware::request_logger_middleware,
        ))
        .with_state(state)
}

pub fn cors_layer(origins: &AllowedOrigins) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    match origins {
        AllowedOrigins::Any => layer.allow_origin(Any),
        AllowedOrigins::List(origins) => {
            let origins = origins
                .iter()
                .filter_map(|origin| match HeaderValue::from_str(origin) {
                    Ok(value) => Some(value),
                    Err(_) => {
                        tracing::warn!("Ignoring invalid CORS origin {}", origin);
                        None
                    }
                })
                .collect::<Vec<_>>();
            layer.allow_origin(origins)
        }
    }
}
