//! What a cancelled order owes back to the user and to stock.
//!
//! These are pure projections of the status an order was in when it was
//! cancelled. The order itself never touches accounts or inventory; the
//! caller executes the plan.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ids::Sku;
use crate::money::Money;

use super::{OrderItem, OrderStatus};

/// Money has left the user's account once the order is paid.
pub fn needs_refund(status: OrderStatus) -> bool {
    matches!(status, OrderStatus::Paid | OrderStatus::Completed)
}

/// Stock is taken when the order is confirmed.
pub fn needs_inventory_restore(status: OrderStatus) -> bool {
    matches!(
        status,
        OrderStatus::Confirmed | OrderStatus::Paid | OrderStatus::Completed
    )
}

/// Stock to hand back for one SKU.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestockLine {
    pub sku: Sku,
    pub quantity: u32,
}

/// Compensations owed when an order in a given status is cancelled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompensationPlan {
    /// Amount to credit back to the user, if any.
    pub refund: Option<Money>,

    /// Stock to restore, one line per SKU in SKU order.
    pub restock: Vec<RestockLine>,
}

impl CompensationPlan {
    /// Builds the plan for an order cancelled from `status`.
    pub fn for_status(status: OrderStatus, total_amount: &Money, items: &[OrderItem]) -> Self {
        let refund = (needs_refund(status) && total_amount.is_positive())
            .then(|| total_amount.clone());

        let restock = if needs_inventory_restore(status) {
            // An order's total quantity fits in u32, so saturation never
            // triggers for items taken from an `Order`.
            let mut per_sku: BTreeMap<&Sku, u32> = BTreeMap::new();
            for item in items {
                let line = per_sku.entry(item.sku()).or_default();
                *line = line.saturating_add(item.quantity());
            }
            per_sku
                .into_iter()
                .map(|(sku, quantity)| RestockLine {
                    sku: sku.clone(),
                    quantity,
                })
                .collect()
        } else {
            Vec::new()
        };

        Self { refund, restock }
    }

    /// Returns true if nothing is owed.
    pub fn is_empty(&self) -> bool {
        self.refund.is_none() && self.restock.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cny(amount: &str) -> Money {
        Money::parse(amount, "CNY").unwrap()
    }

    fn items() -> Vec<OrderItem> {
        vec![
            OrderItem::new("SKU-B", "Gadget", cny("5.00"), 3).unwrap(),
            OrderItem::new("SKU-A", "Widget", cny("10.00"), 2).unwrap(),
            OrderItem::new("SKU-B", "Gadget", cny("5.00"), 1).unwrap(),
        ]
    }

    #[test]
    fn test_predicates() {
        assert!(!needs_refund(OrderStatus::Pending));
        assert!(!needs_refund(OrderStatus::Confirmed));
        assert!(needs_refund(OrderStatus::Paid));
        assert!(needs_refund(OrderStatus::Completed));

        assert!(!needs_inventory_restore(OrderStatus::Pending));
        assert!(needs_inventory_restore(OrderStatus::Confirmed));
        assert!(needs_inventory_restore(OrderStatus::Paid));
        assert!(needs_inventory_restore(OrderStatus::Completed));
    }

    #[test]
    fn test_pending_plan_is_empty() {
        let plan = CompensationPlan::for_status(OrderStatus::Pending, &cny("40.00"), &items());
        assert!(plan.is_empty());
    }

    #[test]
    fn test_confirmed_plan_restocks_without_refund() {
        let plan = CompensationPlan::for_status(OrderStatus::Confirmed, &cny("40.00"), &items());
        assert_eq!(plan.refund, None);
        assert_eq!(
            plan.restock,
            vec![
                RestockLine {
                    sku: Sku::new("SKU-A"),
                    quantity: 2
                },
                RestockLine {
                    sku: Sku::new("SKU-B"),
                    quantity: 4
                },
            ]
        );
    }

    #[test]
    fn test_paid_plan_refunds_total() {
        let plan = CompensationPlan::for_status(OrderStatus::Paid, &cny("40.00"), &items());
        assert_eq!(plan.refund, Some(cny("40.00")));
        assert_eq!(plan.restock.len(), 2);
    }
}
