//! Domain error types.

use thiserror::Error;

use crate::account::AccountError;
use crate::inventory::InventoryError;
use crate::money::MoneyError;
use crate::order::OrderError;
use crate::settlement::SettlementError;

/// Errors that can occur during domain operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// An error occurred in money arithmetic.
    #[error("Money error: {0}")]
    Money(#[from] MoneyError),

    /// An error occurred in a user or merchant account.
    #[error("Account error: {0}")]
    Account(#[from] AccountError),

    /// An error occurred in product inventory.
    #[error("Inventory error: {0}")]
    Inventory(#[from] InventoryError),

    /// An error occurred in the order aggregate.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// An error occurred in a settlement.
    #[error("Settlement error: {0}")]
    Settlement(#[from] SettlementError),

    /// The user, merchant or product is deactivated.
    #[error("{resource} {id} is inactive")]
    ResourceInactive { resource: &'static str, id: String },
}

/// Coarse classification of a failure, for callers that map failures to
/// responses without matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidAmount,
    InvalidQuantity,
    CurrencyMismatch,
    NegativeResult,
    InsufficientFunds,
    InsufficientInventory,
    InvalidState,
    ResourceInactive,
    /// Stored data violates an invariant.
    InvalidRecord,
}

impl MoneyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MoneyError::InvalidAmount(_) | MoneyError::Overflow => ErrorKind::InvalidAmount,
            MoneyError::CurrencyMismatch { .. } => ErrorKind::CurrencyMismatch,
            MoneyError::NegativeResult { .. } => ErrorKind::NegativeResult,
        }
    }
}

impl AccountError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AccountError::InvalidAmount(_) => ErrorKind::InvalidAmount,
            AccountError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            AccountError::BalanceExceedsIncome { .. } => ErrorKind::InvalidRecord,
            AccountError::Money(e) => e.kind(),
        }
    }
}

impl InventoryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            InventoryError::InvalidQuantity { .. } | InventoryError::Overflow { .. } => {
                ErrorKind::InvalidQuantity
            }
            InventoryError::InsufficientInventory { .. } => ErrorKind::InsufficientInventory,
        }
    }
}

impl OrderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrderError::InvalidStateTransition { .. } | OrderError::NoItems => {
                ErrorKind::InvalidState
            }
            OrderError::InvalidQuantity { .. } | OrderError::QuantityOverflow { .. } => {
                ErrorKind::InvalidQuantity
            }
            OrderError::InvalidPrice { .. } => ErrorKind::InvalidAmount,
            OrderError::InvalidRecord(_) => ErrorKind::InvalidRecord,
            OrderError::Money(e) => e.kind(),
        }
    }
}

impl SettlementError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SettlementError::Money(e) => e.kind(),
            SettlementError::InvalidRecord(_) => ErrorKind::InvalidRecord,
        }
    }
}

impl DomainError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::Money(e) => e.kind(),
            DomainError::Account(e) => e.kind(),
            DomainError::Inventory(e) => e.kind(),
            DomainError::Order(e) => e.kind(),
            DomainError::Settlement(e) => e.kind(),
            DomainError::ResourceInactive { .. } => ErrorKind::ResourceInactive,
        }
    }
}
