//! Order aggregate implementation.

use chrono::{DateTime, Utc};
use common::AggregateMeta;
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;
use crate::ids::{MerchantId, UserId};
use crate::money::{Currency, Money};

use super::compensation::{self, CompensationPlan};
use super::{OrderAction, OrderError, OrderEvent, OrderItem, OrderNumber, OrderStatus};

/// A requested state change, with its payload.
///
/// Every mutation of an [`Order`] goes through [`Order::apply_transition`].
#[derive(Debug, Clone)]
pub enum OrderTransition {
    AddItem(OrderItem),
    Confirm,
    ProcessPayment,
    Complete,
    Cancel { reason: String },
}

impl OrderTransition {
    pub fn action(&self) -> OrderAction {
        match self {
            OrderTransition::AddItem(_) => OrderAction::AddItem,
            OrderTransition::Confirm => OrderAction::Confirm,
            OrderTransition::ProcessPayment => OrderAction::ProcessPayment,
            OrderTransition::Complete => OrderAction::Complete,
            OrderTransition::Cancel { .. } => OrderAction::Cancel,
        }
    }
}

/// Order aggregate root.
///
/// Owns its items exclusively. `total_amount` always equals the sum of the
/// item totals; it starts at zero in the order's currency.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "OrderRecord", into = "OrderRecord")]
pub struct Order {
    meta: AggregateMeta,
    order_number: OrderNumber,
    user_id: UserId,
    merchant_id: MerchantId,
    currency: Currency,
    items: Vec<OrderItem>,
    total_amount: Money,
    status: OrderStatus,
    cancelled_from: Option<OrderStatus>,
    cancel_reason: Option<String>,
    order_time: DateTime<Utc>,
    completed_time: Option<DateTime<Utc>>,
    events: Vec<OrderEvent>,
}

/// Flat, storable form of an [`Order`].
///
/// Produced by serialization and consumed by [`Order::rehydrate`]; the
/// only way to rebuild an order outside its own mutators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRecord {
    pub meta: AggregateMeta,
    pub order_number: OrderNumber,
    pub user_id: UserId,
    pub merchant_id: MerchantId,
    pub currency: Currency,
    pub items: Vec<OrderItem>,
    pub total_amount: Money,
    pub status: OrderStatus,
    #[serde(default)]
    pub cancelled_from: Option<OrderStatus>,
    #[serde(default)]
    pub cancel_reason: Option<String>,
    pub order_time: DateTime<Utc>,
    #[serde(default)]
    pub completed_time: Option<DateTime<Utc>>,
}

impl Aggregate for Order {
    fn aggregate_type() -> &'static str {
        "Order"
    }

    fn meta(&self) -> &AggregateMeta {
        &self.meta
    }
}

// Construction
impl Order {
    /// Places a new, empty order in `PENDING`.
    pub fn place(
        order_number: OrderNumber,
        user_id: UserId,
        merchant_id: MerchantId,
        currency: Currency,
    ) -> Self {
        let order_time = Utc::now();
        let placed =
            OrderEvent::order_placed(order_number.clone(), user_id, merchant_id, order_time);
        Self {
            meta: AggregateMeta::new(),
            order_number,
            user_id,
            merchant_id,
            total_amount: Money::zero(currency.clone()),
            currency,
            items: Vec::new(),
            status: OrderStatus::Pending,
            cancelled_from: None,
            cancel_reason: None,
            order_time,
            completed_time: None,
            events: vec![placed],
        }
    }

    /// Rebuilds an order from storage, re-checking its invariants.
    pub fn rehydrate(record: OrderRecord) -> Result<Self, OrderError> {
        let mut total = Money::zero(record.currency.clone());
        for item in &record.items {
            total = total.add(item.total_price())?;
        }
        if total != record.total_amount {
            return Err(OrderError::InvalidRecord(format!(
                "total {} does not match item sum {}",
                record.total_amount, total
            )));
        }
        if (record.status == OrderStatus::Cancelled) != record.cancelled_from.is_some() {
            return Err(OrderError::InvalidRecord(
                "cancelled_from must be set exactly when the order is cancelled".to_string(),
            ));
        }
        if let Some(from) = record
            .cancelled_from
            .filter(|from| !from.permits(OrderAction::Cancel))
        {
            return Err(OrderError::InvalidRecord(format!(
                "an order cannot be cancelled from {from}"
            )));
        }
        let basis = record.cancelled_from.unwrap_or(record.status);
        if basis != OrderStatus::Pending && record.items.is_empty() {
            return Err(OrderError::InvalidRecord(format!("{basis} order has no items")));
        }
        if (record.status == OrderStatus::Completed) != record.completed_time.is_some() {
            return Err(OrderError::InvalidRecord(
                "completed_time must be set exactly when the order is completed".to_string(),
            ));
        }
        record.items.iter().try_fold(0u32, |total, item| {
            total.checked_add(item.quantity()).ok_or_else(|| {
                OrderError::InvalidRecord("total quantity overflows".to_string())
            })
        })?;

        Ok(Self {
            meta: record.meta,
            order_number: record.order_number,
            user_id: record.user_id,
            merchant_id: record.merchant_id,
            currency: record.currency,
            items: record.items,
            total_amount: total,
            status: record.status,
            cancelled_from: record.cancelled_from,
            cancel_reason: record.cancel_reason,
            order_time: record.order_time,
            completed_time: record.completed_time,
            events: Vec::new(),
        })
    }
}

impl TryFrom<OrderRecord> for Order {
    type Error = OrderError;

    fn try_from(record: OrderRecord) -> Result<Self, Self::Error> {
        Order::rehydrate(record)
    }
}

impl From<Order> for OrderRecord {
    fn from(order: Order) -> Self {
        OrderRecord {
            meta: order.meta,
            order_number: order.order_number,
            user_id: order.user_id,
            merchant_id: order.merchant_id,
            currency: order.currency,
            items: order.items,
            total_amount: order.total_amount,
            status: order.status,
            cancelled_from: order.cancelled_from,
            cancel_reason: order.cancel_reason,
            order_time: order.order_time,
            completed_time: order.completed_time,
        }
    }
}

// Query methods
impl Order {
    pub fn order_number(&self) -> &OrderNumber {
        &self.order_number
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn merchant_id(&self) -> MerchantId {
        self.merchant_id
    }

    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Items in the order they were added.
    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Returns the total quantity of all items.
    ///
    /// Never exceeds `u32::MAX`: lines that would overflow it are rejected.
    pub fn total_quantity(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |total, item| total.saturating_add(item.quantity()))
    }

    pub fn total_amount(&self) -> &Money {
        &self.total_amount
    }

    pub fn has_items(&self) -> bool {
        !self.items.is_empty()
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn order_time(&self) -> DateTime<Utc> {
        self.order_time
    }

    pub fn completed_time(&self) -> Option<DateTime<Utc>> {
        self.completed_time
    }

    /// Status the order was in when it was cancelled.
    pub fn cancelled_from(&self) -> Option<OrderStatus> {
        self.cancelled_from
    }

    pub fn cancel_reason(&self) -> Option<&str> {
        self.cancel_reason.as_deref()
    }

    /// The status compensation is judged against: the pre-cancel status for
    /// a cancelled order, the current status otherwise.
    fn compensation_basis(&self) -> OrderStatus {
        self.cancelled_from.unwrap_or(self.status)
    }

    /// Returns true if cancelling (or having cancelled) owes the user a refund.
    pub fn needs_refund(&self) -> bool {
        compensation::needs_refund(self.compensation_basis())
    }

    /// Returns true if cancelling (or having cancelled) owes stock back.
    pub fn needs_inventory_restore(&self) -> bool {
        compensation::needs_inventory_restore(self.compensation_basis())
    }

    /// Compensations owed for the order's compensation basis.
    pub fn compensation_plan(&self) -> CompensationPlan {
        CompensationPlan::for_status(self.compensation_basis(), &self.total_amount, &self.items)
    }

    /// Drains the events recorded since the last call.
    pub fn take_events(&mut self) -> Vec<OrderEvent> {
        std::mem::take(&mut self.events)
    }

    /// Events recorded since the last [`Order::take_events`].
    pub fn pending_events(&self) -> &[OrderEvent] {
        &self.events
    }
}

// Command methods
impl Order {
    /// Appends an item. Only allowed while `PENDING`.
    pub fn add_order_item(&mut self, item: OrderItem) -> Result<(), OrderError> {
        self.apply_transition(OrderTransition::AddItem(item))
    }

    /// Freezes the items. Requires at least one item.
    pub fn confirm(&mut self) -> Result<(), OrderError> {
        self.apply_transition(OrderTransition::Confirm)
    }

    pub fn process_payment(&mut self) -> Result<(), OrderError> {
        self.apply_transition(OrderTransition::ProcessPayment)
    }

    pub fn complete(&mut self) -> Result<(), OrderError> {
        self.apply_transition(OrderTransition::Complete)
    }

    pub fn cancel(&mut self, reason: impl Into<String>) -> Result<(), OrderError> {
        self.apply_transition(OrderTransition::Cancel {
            reason: reason.into(),
        })
    }

    /// Validates `transition` against the transition table and, only if
    /// every check passes, applies it, touches the metadata and records an
    /// event. On error the order is left exactly as it was.
    pub fn apply_transition(&mut self, transition: OrderTransition) -> Result<(), OrderError> {
        let action = transition.action();
        let target = self
            .status
            .target(action)
            .ok_or(OrderError::InvalidStateTransition {
                current_state: self.status,
                action,
            })?;

        let event = match transition {
            OrderTransition::AddItem(item) => {
                let quantity = item.quantity();
                let current = self.total_quantity();
                current
                    .checked_add(quantity)
                    .ok_or(OrderError::QuantityOverflow {
                        total: current,
                        quantity,
                    })?;
                let total = self.total_amount.add(item.total_price())?;
                let event = OrderEvent::item_added(self.order_number.clone(), &item, total.clone());
                self.items.push(item);
                self.total_amount = total;
                event
            }
            OrderTransition::Confirm => {
                if !self.has_items() {
                    return Err(OrderError::NoItems);
                }
                OrderEvent::order_confirmed(
                    self.order_number.clone(),
                    self.total_amount.clone(),
                    self.items.len(),
                )
            }
            OrderTransition::ProcessPayment => {
                OrderEvent::payment_processed(self.order_number.clone(), self.total_amount.clone())
            }
            OrderTransition::Complete => {
                let now = Utc::now();
                self.completed_time = Some(now);
                OrderEvent::order_completed(self.order_number.clone(), now)
            }
            OrderTransition::Cancel { reason } => {
                let previous = self.status;
                let event = OrderEvent::order_cancelled(
                    self.order_number.clone(),
                    reason.clone(),
                    previous,
                    compensation::needs_refund(previous),
                    compensation::needs_inventory_restore(previous),
                );
                self.cancelled_from = Some(previous);
                self.cancel_reason = Some(reason);
                event
            }
        };

        tracing::debug!(
            order_number = %self.order_number,
            from = %self.status,
            to = %target,
            %action,
            "order transition applied"
        );
        self.status = target;
        self.meta.touch();
        self.events.push(event);
        Ok(())
    }
}
