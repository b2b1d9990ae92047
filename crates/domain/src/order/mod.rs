//! Order aggregate and related types.

mod aggregate;
pub mod compensation;
mod events;
mod state;
mod value_objects;

pub use aggregate::{Order, OrderRecord, OrderTransition};
pub use compensation::{CompensationPlan, RestockLine};
pub use events::{
    ItemAddedData, OrderCancelledData, OrderCompletedData, OrderConfirmedData, OrderEvent,
    OrderPlacedData, PaymentProcessedData,
};
pub use state::{OrderAction, OrderStatus, TRANSITIONS};
pub use value_objects::{OrderItem, OrderNumber};

use thiserror::Error;

use crate::money::{Money, MoneyError};

/// Errors that can occur during order operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// The transition table does not allow the action from the current status.
    #[error("Invalid state transition: cannot {action} from {current_state} state")]
    InvalidStateTransition {
        current_state: OrderStatus,
        action: OrderAction,
    },

    /// Order has no items.
    #[error("Order has no items")]
    NoItems,

    /// Invalid quantity.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: u32 },

    /// The line would push the order's total quantity past `u32::MAX`.
    #[error("Quantity overflow: {total} + {quantity}")]
    QuantityOverflow { total: u32, quantity: u32 },

    /// Invalid price.
    #[error("Invalid price: {price} (must be greater than 0)")]
    InvalidPrice { price: Money },

    /// A stored order violates the order invariants.
    #[error("Invalid order record: {0}")]
    InvalidRecord(String),

    /// The underlying money arithmetic failed.
    #[error(transparent)]
    Money(#[from] MoneyError),
}
