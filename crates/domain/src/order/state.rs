//! Order state machine.

use serde::{Deserialize, Serialize};

/// The status of an order in its lifecycle.
///
/// State transitions:
/// ```text
/// Pending ──► Confirmed ──► Paid ──► Completed
///    │            │          │
///    └────────────┴──────────┴──► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Order is open; items can be appended.
    #[default]
    Pending,

    /// Items are frozen and stock has been taken.
    Confirmed,

    /// The user has paid.
    Paid,

    /// Order is fulfilled (terminal state).
    Completed,

    /// Order was cancelled (terminal state).
    Cancelled,
}

/// The actions that can be attempted on an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderAction {
    AddItem,
    Confirm,
    ProcessPayment,
    Complete,
    Cancel,
}

impl OrderAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderAction::AddItem => "add item",
            OrderAction::Confirm => "confirm",
            OrderAction::ProcessPayment => "process payment",
            OrderAction::Complete => "complete",
            OrderAction::Cancel => "cancel",
        }
    }
}

impl std::fmt::Display for OrderAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every legal `(from, action, to)` triple. Anything absent is rejected.
pub const TRANSITIONS: &[(OrderStatus, OrderAction, OrderStatus)] = &[
    (OrderStatus::Pending, OrderAction::AddItem, OrderStatus::Pending),
    (OrderStatus::Pending, OrderAction::Confirm, OrderStatus::Confirmed),
    (OrderStatus::Confirmed, OrderAction::ProcessPayment, OrderStatus::Paid),
    (OrderStatus::Paid, OrderAction::Complete, OrderStatus::Completed),
    (OrderStatus::Pending, OrderAction::Cancel, OrderStatus::Cancelled),
    (OrderStatus::Confirmed, OrderAction::Cancel, OrderStatus::Cancelled),
    (OrderStatus::Paid, OrderAction::Cancel, OrderStatus::Cancelled),
];

impl OrderStatus {
    /// Looks up the status reached by `action`, if the table permits it.
    pub fn target(&self, action: OrderAction) -> Option<OrderStatus> {
        TRANSITIONS
            .iter()
            .find(|(from, candidate, _)| from == self && *candidate == action)
            .map(|(_, _, to)| *to)
    }

    /// Returns true if the table permits `action` from this status.
    pub fn permits(&self, action: OrderAction) -> bool {
        self.target(action).is_some()
    }

    /// Returns true if this is a terminal state (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Paid => "PAID",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Paid,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    #[test]
    fn test_default_status_is_pending() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
    }

    #[test]
    fn test_only_pending_accepts_items() {
        for status in ALL {
            assert_eq!(
                status.permits(OrderAction::AddItem),
                status == OrderStatus::Pending
            );
        }
    }

    #[test]
    fn test_happy_path() {
        assert_eq!(
            OrderStatus::Pending.target(OrderAction::Confirm),
            Some(OrderStatus::Confirmed)
        );
        assert_eq!(
            OrderStatus::Confirmed.target(OrderAction::ProcessPayment),
            Some(OrderStatus::Paid)
        );
        assert_eq!(
            OrderStatus::Paid.target(OrderAction::Complete),
            Some(OrderStatus::Completed)
        );
    }

    #[test]
    fn test_pending_cannot_pay_or_complete() {
        assert!(!OrderStatus::Pending.permits(OrderAction::ProcessPayment));
        assert!(!OrderStatus::Pending.permits(OrderAction::Complete));
    }

    #[test]
    fn test_cancel_from_non_terminal_states() {
        assert!(OrderStatus::Pending.permits(OrderAction::Cancel));
        assert!(OrderStatus::Confirmed.permits(OrderAction::Cancel));
        assert!(OrderStatus::Paid.permits(OrderAction::Cancel));
        assert!(!OrderStatus::Completed.permits(OrderAction::Cancel));
        assert!(!OrderStatus::Cancelled.permits(OrderAction::Cancel));
    }

    #[test]
    fn test_terminal_states_permit_nothing() {
        let actions = [
            OrderAction::AddItem,
            OrderAction::Confirm,
            OrderAction::ProcessPayment,
            OrderAction::Complete,
            OrderAction::Cancel,
        ];
        for status in ALL.into_iter().filter(OrderStatus::is_terminal) {
            assert!(actions.iter().all(|action| !status.permits(*action)));
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(OrderStatus::Pending.to_string(), "PENDING");
        assert_eq!(OrderStatus::Cancelled.to_string(), "CANCELLED");
        assert_eq!(OrderAction::ProcessPayment.to_string(), "process payment");
    }

    #[test]
    fn test_serialization() {
        let json = serde_json::to_string(&OrderStatus::Paid).unwrap();
        assert_eq!(json, "\"PAID\"");
        let deserialized: OrderStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, OrderStatus::Paid);
    }
}
