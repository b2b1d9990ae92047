//! Domain layer for the order and ledger system.
//!
//! This crate provides the core domain model:
//! - `Money` with fixed two-decimal scale and explicit currency checks
//! - User and merchant accounts, product inventory
//! - The `Order` aggregate with its transition table and compensation rules
//! - Daily merchant `Settlement` reconciliation
//!
//! Everything here is synchronous and storage-free. Orchestration across
//! aggregates lives in the `fulfillment` crate.

pub mod account;
pub mod aggregate;
pub mod error;
pub mod ids;
pub mod inventory;
pub mod lifecycle;
pub mod merchant;
pub mod money;
pub mod order;
pub mod product;
pub mod settlement;
pub mod user;

pub use account::{AccountError, MerchantAccount, UserAccount};
pub use aggregate::{Aggregate, DomainEvent};
pub use error::{DomainError, ErrorKind};
pub use ids::{MerchantId, Sku, UserId};
pub use inventory::{Inventory, InventoryError};
pub use lifecycle::ResourceStatus;
pub use merchant::Merchant;
pub use money::{Currency, Money, MoneyError};
pub use order::{
    CompensationPlan, Order, OrderAction, OrderError, OrderEvent, OrderItem, OrderNumber,
    OrderStatus, OrderTransition, RestockLine,
};
pub use product::Product;
pub use settlement::{Settlement, SettlementError, SettlementStatus};
pub use user::User;
