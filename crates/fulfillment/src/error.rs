//! Fulfillment error types.

use common::Version;
use domain::{DomainError, MerchantId, MoneyError, OrderError, SettlementError, Sku};
use thiserror::Error;

/// Errors that can occur while coordinating orders and settlements.
#[derive(Debug, Error)]
pub enum FulfillmentError {
    /// A domain rule rejected the operation.
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// No aggregate is stored under the key.
    #[error("{resource} not found: {key}")]
    NotFound { resource: &'static str, key: String },

    /// An aggregate with the same key is already stored.
    #[error("{resource} already exists: {key}")]
    AlreadyExists { resource: &'static str, key: String },

    /// The stored aggregate moved on since it was loaded.
    #[error("Concurrency conflict on {resource} {key}: expected {expected}, actual {actual}")]
    Concurrency {
        resource: &'static str,
        key: String,
        expected: Version,
        actual: Version,
    },

    /// An order line names a product the merchant does not sell.
    #[error("Product {sku} is not sold by merchant {merchant_id}")]
    ProductNotOffered { sku: Sku, merchant_id: MerchantId },

    /// Undoing an already saved step failed.
    #[error("Compensation step '{step}' failed: {reason}")]
    CompensationFailed { step: String, reason: String },
}

impl From<MoneyError> for FulfillmentError {
    fn from(err: MoneyError) -> Self {
        FulfillmentError::Domain(err.into())
    }
}

impl From<OrderError> for FulfillmentError {
    fn from(err: OrderError) -> Self {
        FulfillmentError::Domain(err.into())
    }
}

impl From<SettlementError> for FulfillmentError {
    fn from(err: SettlementError) -> Self {
        FulfillmentError::Domain(err.into())
    }
}

impl FulfillmentError {
    /// Returns the domain error behind this failure, if there is one.
    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            FulfillmentError::Domain(err) => Some(err),
            _ => None,
        }
    }
}

/// Convenience type alias for fulfillment results.
pub type Result<T> = std::result::Result<T, FulfillmentError>;
