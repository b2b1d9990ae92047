//! Order domain events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;
use crate::ids::{MerchantId, Sku, UserId};
use crate::money::Money;

use super::{OrderItem, OrderNumber, OrderStatus};

/// Facts recorded by an order as it moves through its lifecycle.
///
/// Events are handed to the caller through `Order::take_events` and are
/// not part of the order's snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderEvent {
    /// Order was placed.
    OrderPlaced(OrderPlacedData),

    /// Item was appended to the order.
    ItemAdded(ItemAddedData),

    /// Items were frozen and the order confirmed.
    OrderConfirmed(OrderConfirmedData),

    /// Payment was taken.
    PaymentProcessed(PaymentProcessedData),

    /// Order was completed.
    OrderCompleted(OrderCompletedData),

    /// Order was cancelled.
    OrderCancelled(OrderCancelledData),
}

impl DomainEvent for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::OrderPlaced(_) => "OrderPlaced",
            OrderEvent::ItemAdded(_) => "ItemAdded",
            OrderEvent::OrderConfirmed(_) => "OrderConfirmed",
            OrderEvent::PaymentProcessed(_) => "PaymentProcessed",
            OrderEvent::OrderCompleted(_) => "OrderCompleted",
            OrderEvent::OrderCancelled(_) => "OrderCancelled",
        }
    }
}

impl OrderEvent {
    /// The order the event belongs to.
    pub fn order_number(&self) -> &OrderNumber {
        match self {
            OrderEvent::OrderPlaced(data) => &data.order_number,
            OrderEvent::ItemAdded(data) => &data.order_number,
            OrderEvent::OrderConfirmed(data) => &data.order_number,
            OrderEvent::PaymentProcessed(data) => &data.order_number,
            OrderEvent::OrderCompleted(data) => &data.order_number,
            OrderEvent::OrderCancelled(data) => &data.order_number,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPlacedData {
    pub order_number: OrderNumber,
    pub user_id: UserId,
    pub merchant_id: MerchantId,
    pub placed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemAddedData {
    pub order_number: OrderNumber,
    pub sku: Sku,
    pub quantity: u32,
    /// Line total at the time of adding.
    pub total_price: Money,
    /// Order total after the line was added.
    pub order_total: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderConfirmedData {
    pub order_number: OrderNumber,
    pub confirmed_at: DateTime<Utc>,
    pub total_amount: Money,
    pub item_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentProcessedData {
    pub order_number: OrderNumber,
    pub paid_at: DateTime<Utc>,
    pub amount: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCompletedData {
    pub order_number: OrderNumber,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCancelledData {
    pub order_number: OrderNumber,
    pub cancelled_at: DateTime<Utc>,
    pub reason: String,
    /// Status the order was in when it was cancelled.
    pub previous_status: OrderStatus,
    pub refund_required: bool,
    pub restore_inventory_required: bool,
}

// Convenience constructors for events
impl OrderEvent {
    pub fn order_placed(
        order_number: OrderNumber,
        user_id: UserId,
        merchant_id: MerchantId,
        placed_at: DateTime<Utc>,
    ) -> Self {
        OrderEvent::OrderPlaced(OrderPlacedData {
            order_number,
            user_id,
            merchant_id,
            placed_at,
        })
    }

    pub fn item_added(order_number: OrderNumber, item: &OrderItem, order_total: Money) -> Self {
        OrderEvent::ItemAdded(ItemAddedData {
            order_number,
            sku: item.sku().clone(),
            quantity: item.quantity(),
            total_price: item.total_price().clone(),
            order_total,
        })
    }

    pub fn order_confirmed(
        order_number: OrderNumber,
        total_amount: Money,
        item_count: usize,
    ) -> Self {
        OrderEvent::OrderConfirmed(OrderConfirmedData {
            order_number,
            confirmed_at: Utc::now(),
            total_amount,
            item_count,
        })
    }

    pub fn payment_processed(order_number: OrderNumber, amount: Money) -> Self {
        OrderEvent::PaymentProcessed(PaymentProcessedData {
            order_number,
            paid_at: Utc::now(),
            amount,
        })
    }

    pub fn order_completed(order_number: OrderNumber, completed_at: DateTime<Utc>) -> Self {
        OrderEvent::OrderCompleted(OrderCompletedData {
            order_number,
            completed_at,
        })
    }

    pub fn order_cancelled(
        order_number: OrderNumber,
        reason: impl Into<String>,
        previous_status: OrderStatus,
        refund_required: bool,
        restore_inventory_required: bool,
    ) -> Self {
        OrderEvent::OrderCancelled(OrderCancelledData {
            order_number,
            cancelled_at: Utc::now(),
            reason: reason.into(),
            previous_status,
            refund_required,
            restore_inventory_required,
        })
    }
}
