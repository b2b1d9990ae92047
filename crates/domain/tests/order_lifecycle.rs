//! Integration tests for the order lifecycle across domain aggregates.
//!
//! These tests drive users, merchants, products and orders together the way
//! a caller would, without any storage in between.

use domain::{
    Aggregate, Currency, DomainError, ErrorKind, Merchant, Money, Order, OrderAction, OrderError,
    OrderEvent, OrderItem, OrderNumber, OrderStatus, Product, Settlement, SettlementStatus, User,
};

fn cny(amount: &str) -> Money {
    Money::parse(amount, "CNY").unwrap()
}

fn currency() -> Currency {
    Currency::new("CNY").unwrap()
}

struct World {
    user: User,
    merchant: Merchant,
    product: Product,
}

fn world(balance: &str, stock: u32) -> World {
    let mut user = User::register("alice", currency());
    user.recharge(&cny(balance)).unwrap();
    let merchant = Merchant::open("Acme", currency());
    let product = Product::list("SKU-001", "Widget", merchant.id(), cny("35.00"), stock).unwrap();
    World {
        user,
        merchant,
        product,
    }
}

fn order_for(world: &World, quantity: u32) -> Order {
    let mut order = Order::place(
        OrderNumber::generate(),
        world.user.id(),
        world.merchant.id(),
        currency(),
    );
    let item = OrderItem::new(
        world.product.sku().clone(),
        world.product.name(),
        world.product.price().clone(),
        quantity,
    )
    .unwrap();
    order.add_order_item(item).unwrap();
    order
}

mod happy_path {
    use super::*;

    #[test]
    fn full_lifecycle_moves_money_and_stock() {
        let mut w = world("200.00", 10);
        let mut order = order_for(&w, 5);
        assert_eq!(order.total_amount(), &cny("175.00"));

        w.product.reduce_stock(5).unwrap();
        order.confirm().unwrap();

        w.user.pay(order.total_amount()).unwrap();
        order.process_payment().unwrap();

        w.merchant.add_income(order.total_amount()).unwrap();
        order.complete().unwrap();

        assert_eq!(order.status(), OrderStatus::Completed);
        assert!(order.completed_time().is_some());
        assert_eq!(w.user.balance(), &cny("25.00"));
        assert_eq!(w.merchant.account().balance(), &cny("175.00"));
        assert_eq!(w.product.available_stock(), 5);
    }

    #[test]
    fn mixed_lines_total() {
        let w = world("200.00", 10);
        let mut order = Order::place(
            OrderNumber::generate(),
            w.user.id(),
            w.merchant.id(),
            currency(),
        );
        order
            .add_order_item(OrderItem::new("SKU-A", "Widget", cny("10.00"), 2).unwrap())
            .unwrap();
        order
            .add_order_item(OrderItem::new("SKU-B", "Gadget", cny("5.00"), 3).unwrap())
            .unwrap();

        assert_eq!(order.total_amount(), &cny("35.00"));
        assert_eq!(order.total_quantity(), 5);
        assert_eq!(order.item_count(), 2);
    }

    #[test]
    fn events_follow_transitions() {
        let w = world("200.00", 10);
        let mut order = order_for(&w, 1);
        order.confirm().unwrap();
        order.process_payment().unwrap();
        order.complete().unwrap();

        let types: Vec<_> = order
            .take_events()
            .iter()
            .map(domain::DomainEvent::event_type)
            .collect();
        assert_eq!(
            types,
            vec![
                "OrderPlaced",
                "ItemAdded",
                "OrderConfirmed",
                "PaymentProcessed",
                "OrderCompleted"
            ]
        );
        assert!(order.pending_events().is_empty());
    }

    #[test]
    fn version_grows_per_mutation() {
        let w = world("200.00", 10);
        let mut order = order_for(&w, 1);
        let before = order.version();
        order.confirm().unwrap();
        assert_eq!(order.version(), before.next());
    }
}

mod cancellation {
    use super::*;

    #[test]
    fn cancel_pending_needs_nothing() {
        let w = world("200.00", 10);
        let mut order = order_for(&w, 5);
        order.cancel("changed my mind").unwrap();

        assert_eq!(order.status(), OrderStatus::Cancelled);
        assert!(!order.needs_refund());
        assert!(!order.needs_inventory_restore());
        assert!(order.compensation_plan().is_empty());
    }

    #[test]
    fn cancel_confirmed_restores_stock_only() {
        let mut w = world("200.00", 10);
        let mut order = order_for(&w, 5);
        w.product.reduce_stock(5).unwrap();
        order.confirm().unwrap();
        order.cancel("out of time").unwrap();

        assert!(!order.needs_refund());
        assert!(order.needs_inventory_restore());

        let plan = order.compensation_plan();
        assert!(plan.refund.is_none());
        for line in &plan.restock {
            w.product.restore_stock(line.quantity).unwrap();
        }
        assert_eq!(w.product.available_stock(), 10);
    }

    #[test]
    fn cancel_paid_refunds_and_restores() {
        let mut w = world("200.00", 10);
        let mut order = order_for(&w, 5);
        w.product.reduce_stock(5).unwrap();
        order.confirm().unwrap();
        w.user.pay(order.total_amount()).unwrap();
        order.process_payment().unwrap();
        order.cancel("refund requested").unwrap();

        assert!(order.needs_refund());
        assert!(order.needs_inventory_restore());

        let plan = order.compensation_plan();
        let refund = plan.refund.clone().unwrap();
        assert_eq!(refund, cny("175.00"));
        w.user.refund(&refund).unwrap();
        assert_eq!(w.user.balance(), &cny("200.00"));

        match order.take_events().last() {
            Some(OrderEvent::OrderCancelled(data)) => {
                assert_eq!(data.previous_status, OrderStatus::Paid);
                assert!(data.refund_required);
                assert!(data.restore_inventory_required);
            }
            other => panic!("expected OrderCancelled, got {other:?}"),
        }
    }

    #[test]
    fn completed_order_cannot_be_cancelled() {
        let w = world("200.00", 10);
        let mut order = order_for(&w, 1);
        order.confirm().unwrap();
        order.process_payment().unwrap();
        order.complete().unwrap();

        let err = order.cancel("too late").unwrap_err();
        assert_eq!(
            err,
            OrderError::InvalidStateTransition {
                current_state: OrderStatus::Completed,
                action: OrderAction::Cancel,
            }
        );
        assert_eq!(order.status(), OrderStatus::Completed);
    }
}

mod failures {
    use super::*;

    #[test]
    fn insufficient_balance_leaves_everything_unchanged() {
        let mut w = world("100.00", 10);
        let mut order = order_for(&w, 5);
        order.confirm().unwrap();

        let err = w.user.pay(order.total_amount()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
        assert_eq!(w.user.balance(), &cny("100.00"));
        assert_eq!(order.status(), OrderStatus::Confirmed);
    }

    #[test]
    fn insufficient_stock_is_reported() {
        let mut w = world("500.00", 3);
        let err = w.product.reduce_stock(5).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientInventory);
        assert_eq!(w.product.available_stock(), 3);
    }

    #[test]
    fn empty_order_cannot_confirm() {
        let w = world("100.00", 10);
        let mut order = Order::place(
            OrderNumber::generate(),
            w.user.id(),
            w.merchant.id(),
            currency(),
        );
        let err = DomainError::from(order.confirm().unwrap_err());
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert_eq!(order.status(), OrderStatus::Pending);
    }

    #[test]
    fn items_cannot_be_added_after_confirm() {
        let w = world("100.00", 10);
        let mut order = order_for(&w, 1);
        order.confirm().unwrap();

        let item = OrderItem::new("SKU-002", "Gadget", cny("1.00"), 1).unwrap();
        assert!(order.add_order_item(item).is_err());
        assert_eq!(order.item_count(), 1);
        assert_eq!(order.total_amount(), &cny("35.00"));
    }
}

mod settlement {
    use super::*;
    use chrono::Utc;

    #[test]
    fn completed_income_reconciles() {
        let mut w = world("200.00", 10);
        let mut order = order_for(&w, 2);
        order.confirm().unwrap();
        w.user.pay(order.total_amount()).unwrap();
        order.process_payment().unwrap();
        w.merchant.add_income(order.total_amount()).unwrap();
        order.complete().unwrap();

        let settlement = Settlement::reconcile(
            w.merchant.id(),
            Utc::now().date_naive(),
            order.total_amount().clone(),
            w.merchant.account().total_income().clone(),
        )
        .unwrap();
        assert_eq!(settlement.status(), SettlementStatus::Matched);
    }

    #[test]
    fn missing_income_is_a_deficit() {
        let w = world("200.00", 10);
        let settlement = Settlement::reconcile(
            w.merchant.id(),
            Utc::now().date_naive(),
            cny("70.00"),
            w.merchant.account().total_income().clone(),
        )
        .unwrap();
        assert_eq!(settlement.status(), SettlementStatus::Deficit);
        assert_eq!(settlement.difference(), &cny("70.00"));
    }
}

mod persistence {
    use super::*;

    #[test]
    fn order_survives_json_roundtrip() {
        let w = world("200.00", 10);
        let mut order = order_for(&w, 3);
        order.confirm().unwrap();
        order.cancel("bye").unwrap();
        order.take_events();

        let json = serde_json::to_string(&order).unwrap();
        let restored: Order = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.status(), OrderStatus::Cancelled);
        assert_eq!(restored.cancelled_from(), Some(OrderStatus::Confirmed));
        assert!(restored.needs_inventory_restore());
        assert_eq!(restored.total_amount(), &cny("105.00"));
    }

    #[test]
    fn participants_survive_json_roundtrip() {
        let w = world("12.34", 7);

        let user: User = serde_json::from_str(&serde_json::to_string(&w.user).unwrap()).unwrap();
        assert_eq!(user, w.user);

        let product: Product =
            serde_json::from_str(&serde_json::to_string(&w.product).unwrap()).unwrap();
        assert_eq!(product.available_stock(), 7);
    }
}
