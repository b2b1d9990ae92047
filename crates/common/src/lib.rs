//! Shared identifiers and aggregate metadata for the ledger core.

pub mod ids;
pub mod meta;

pub use ids::AggregateId;
pub use meta::{AggregateMeta, Version};
