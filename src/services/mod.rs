pub mod auth;
pub mod bootstrap;
pub mod commodities;
pub mod directory;
pub mod orders;
pub mod price_feed;
pub mod wallet;

pub use auth::{AuthService, TokenSigner};
pub use commodities::CommodityService;
pub use directory::DirectoryService;
pub use orders::{OrderService, PlaceOrder};
pub use price_feed::PriceFeed;
pub use wallet::WalletLedger;
