//! Order fulfillment and settlement for the ledger.
//!
//! This crate drives domain aggregates through their lifecycle:
//! - `OrderCoordinator` places, confirms, pays, completes and cancels orders,
//!   moving money and stock alongside each transition
//! - `SettlementService` reconciles merchant income once per day
//! - `Repository` is the storage seam, with an in-memory implementation
//!
//! If a step fails after earlier writes were saved, those writes are
//! compensated in reverse order.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod repository;
pub mod settlement;
pub mod telemetry;

pub use config::{Config, LogFormat};
pub use coordinator::{OrderCoordinator, OrderLine};
pub use error::{FulfillmentError, Result};
pub use repository::{InMemoryRepository, Keyed, Repository, SettlementKey};
pub use settlement::SettlementService;
