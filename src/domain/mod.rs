//! Framework-agnostic domain entities and the pure rules applied to them.
//! Storage adapters call into these while holding their locks.

pub mod account;
pub mod commodity;
pub mod notification;
pub mod order;
pub mod wallet;

pub use account::{
    AccountStatus, Admin, AdminDetails, AppUser, Identity, NewAccount, NewAdmin, NewUser,
    Principal, Role, SuperAdmin,
};
pub use commodity::{Commodity, NewCommodity};
pub use notification::{NewNotification, Notification};
pub use order::{NewOrder, Order, OrderAction, OrderFilter, OrderStatus, OrderType, Settlement};
pub use wallet::{Direction, WalletAdjustment, WalletLog};
