//! Order coordinator for driving orders across users, merchants and products.

use std::collections::BTreeMap;

use domain::{
    Aggregate, DomainError, DomainEvent, Merchant, MerchantId, Money, Order, OrderEvent, OrderItem,
    OrderNumber, Product, Sku, User, UserId,
};
use tokio::sync::Mutex;

use crate::error::{FulfillmentError, Result};
use crate::repository::{Keyed, Repository};

/// One requested line of a new order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLine {
    pub sku: Sku,
    pub quantity: u32,
}

impl OrderLine {
    pub fn new(sku: impl Into<Sku>, quantity: u32) -> Self {
        Self {
            sku: sku.into(),
            quantity,
        }
    }
}

/// Orchestrates the order lifecycle.
///
/// The order aggregate only decides whether a transition is allowed; the
/// coordinator moves the money and stock that go with it. Every step loads
/// the aggregates it touches, applies all domain checks in memory, and only
/// then saves. If a later save fails, earlier saves are compensated.
pub struct OrderCoordinator<U, M, P, O>
where
    U: Repository<User>,
    M: Repository<Merchant>,
    P: Repository<Product>,
    O: Repository<Order>,
{
    users: U,
    merchants: M,
    products: P,
    orders: O,
    // One operation at a time.
    guard: Mutex<()>,
    outbox: Mutex<Vec<OrderEvent>>,
}

impl<U, M, P, O> OrderCoordinator<U, M, P, O>
where
    U: Repository<User>,
    M: Repository<Merchant>,
    P: Repository<Product>,
    O: Repository<Order>,
{
    /// Creates a new order coordinator.
    pub fn new(users: U, merchants: M, products: P, orders: O) -> Self {
        Self {
            users,
            merchants,
            products,
            orders,
            guard: Mutex::new(()),
            outbox: Mutex::new(Vec::new()),
        }
    }

    /// Places a `PENDING` order priced from the current catalogue.
    ///
    /// The user, the merchant and every product must be active, and every
    /// product must be sold by the merchant.
    #[tracing::instrument(skip(self, lines), fields(lines = lines.len()))]
    pub async fn place_order(
        &self,
        user_id: UserId,
        merchant_id: MerchantId,
        lines: Vec<OrderLine>,
    ) -> Result<Order> {
        let _guard = self.guard.lock().await;

        let user = self.users.get(&user_id).await?;
        user.ensure_active()?;
        let merchant = self.merchants.get(&merchant_id).await?;
        merchant.ensure_active()?;

        let currency = merchant.currency().clone();
        user.balance().ensure_same_currency(&Money::zero(currency.clone()))?;

        let mut order = Order::place(OrderNumber::generate(), user_id, merchant_id, currency);
        for line in lines {
            let product = self.products.get(&line.sku).await?;
            product.ensure_active()?;
            if product.merchant_id() != merchant_id {
                return Err(FulfillmentError::ProductNotOffered {
                    sku: line.sku,
                    merchant_id,
                });
            }
            let item = OrderItem::new(
                line.sku,
                product.name(),
                product.price().clone(),
                line.quantity,
            )?;
            order.add_order_item(item)?;
        }

        let events = order.take_events();
        self.orders.insert(order.clone()).await?;
        self.publish(events).await;

        metrics::counter!("orders_placed_total").increment(1);
        tracing::info!(
            order_number = %order.order_number(),
            total = %order.total_amount(),
            "order placed"
        );
        Ok(order)
    }

    /// Confirms an order and takes its stock.
    ///
    /// Stock is checked for every line before any product is saved.
    #[tracing::instrument(skip(self))]
    pub async fn confirm_order(&self, number: &OrderNumber) -> Result<Order> {
        let _guard = self.guard.lock().await;

        let mut order = self.orders.get(number).await?;
        let loaded = order.version();
        order.confirm()?;

        let mut demand: BTreeMap<Sku, u32> = BTreeMap::new();
        for item in order.items() {
            let quantity = demand.entry(item.sku().clone()).or_default();
            *quantity = quantity.saturating_add(item.quantity());
        }

        let mut reduced = Vec::with_capacity(demand.len());
        for (sku, quantity) in demand {
            let mut product = self.products.get(&sku).await?;
            let product_loaded = product.version();
            product.reduce_stock(quantity)?;
            reduced.push((product, product_loaded, quantity));
        }

        let mut taken: Vec<(Sku, u32)> = Vec::with_capacity(reduced.len());
        for (product, product_loaded, quantity) in reduced {
            let sku = product.sku().clone();
            if let Err(err) = self.products.save(product, product_loaded).await {
                self.restore_stock(&taken).await?;
                return Err(err);
            }
            taken.push((sku, quantity));
        }

        let events = order.take_events();
        if let Err(err) = self.orders.save(order.clone(), loaded).await {
            self.restore_stock(&taken).await?;
            return Err(err);
        }
        self.publish(events).await;

        metrics::counter!("orders_confirmed_total").increment(1);
        tracing::info!(order_number = %number, "order confirmed");
        Ok(order)
    }

    /// Debits the user and marks the order `PAID`.
    #[tracing::instrument(skip(self))]
    pub async fn pay_order(&self, number: &OrderNumber) -> Result<Order> {
        let _guard = self.guard.lock().await;

        let mut order = self.orders.get(number).await?;
        let loaded = order.version();
        order.process_payment()?;

        let amount = order.total_amount().clone();
        let user_id = order.user_id();
        let mut user = self.users.get(&user_id).await?;
        let user_loaded = user.version();
        user.pay(&amount)?;

        let events = order.take_events();
        self.users.save(user, user_loaded).await?;
        if let Err(err) = self.orders.save(order.clone(), loaded).await {
            compensate("refund_payment", &self.users, &user_id, |user: &mut User| {
                user.refund(&amount)
            })
            .await?;
            return Err(err);
        }
        self.publish(events).await;

        metrics::counter!("orders_paid_total").increment(1);
        tracing::info!(order_number = %number, %amount, "payment processed");
        Ok(order)
    }

    /// Credits the merchant's income and marks the order `COMPLETED`.
    #[tracing::instrument(skip(self))]
    pub async fn complete_order(&self, number: &OrderNumber) -> Result<Order> {
        let _guard = self.guard.lock().await;

        let mut order = self.orders.get(number).await?;
        let loaded = order.version();
        order.complete()?;

        let amount = order.total_amount().clone();
        let mut merchant = self.merchants.get(&order.merchant_id()).await?;
        let merchant_loaded = merchant.version();
        merchant.add_income(&amount)?;

        let events = order.take_events();
        self.orders.save(order.clone(), loaded).await?;
        self.publish(events).await;
        if let Err(err) = self.merchants.save(merchant, merchant_loaded).await {
            // Income cannot be taken back; the daily settlement reports the gap.
            tracing::error!(
                order_number = %number,
                %amount,
                error = %err,
                "order completed but merchant income not recorded"
            );
            return Err(err);
        }

        metrics::counter!("orders_completed_total").increment(1);
        tracing::info!(order_number = %number, %amount, "order completed");
        Ok(order)
    }

    /// Cancels an order, then refunds and restocks as its status required.
    ///
    /// Compensations are checked in memory before the order is saved. Once
    /// the cancellation is saved it stands; a compensation that fails after
    /// that point is logged and returned as `CompensationFailed`.
    #[tracing::instrument(skip(self, reason))]
    pub async fn cancel_order(&self, number: &OrderNumber, reason: &str) -> Result<Order> {
        let _guard = self.guard.lock().await;

        let mut order = self.orders.get(number).await?;
        let loaded = order.version();
        let previous = order.status();
        order.cancel(reason)?;
        let plan = order.compensation_plan();

        if let Some(amount) = &plan.refund {
            let mut user = self.users.get(&order.user_id()).await?;
            user.refund(amount)?;
        }
        for line in &plan.restock {
            let mut product = self.products.get(&line.sku).await?;
            product.restore_stock(line.quantity)?;
        }

        let events = order.take_events();
        self.orders.save(order.clone(), loaded).await?;
        self.publish(events).await;

        let mut first_failure = None;
        if let Some(amount) = &plan.refund {
            let outcome = compensate("refund", &self.users, &order.user_id(), |user: &mut User| {
                user.refund(amount)
            })
            .await;
            first_failure = first_failure.or(outcome.err());
        }
        for line in &plan.restock {
            let outcome = compensate(
                "restore_stock",
                &self.products,
                &line.sku,
                |product: &mut Product| product.restore_stock(line.quantity),
            )
            .await;
            first_failure = first_failure.or(outcome.err());
        }

        metrics::counter!("orders_cancelled_total", "from" => previous.as_str()).increment(1);
        tracing::info!(
            order_number = %number,
            from = %previous,
            refund = plan.refund.is_some(),
            restock_lines = plan.restock.len(),
            "order cancelled"
        );

        match first_failure {
            Some(err) => Err(err),
            None => Ok(order),
        }
    }

    /// Drains the events of every order saved since the last call.
    pub async fn drain_events(&self) -> Vec<OrderEvent> {
        std::mem::take(&mut *self.outbox.lock().await)
    }

    async fn publish(&self, events: Vec<OrderEvent>) {
        for event in &events {
            tracing::debug!(
                event_type = event.event_type(),
                order_number = %event.order_number(),
                "order event"
            );
        }
        self.outbox.lock().await.extend(events);
    }

    async fn restore_stock(&self, taken: &[(Sku, u32)]) -> Result<()> {
        for (sku, quantity) in taken.iter().rev() {
            compensate("restore_stock", &self.products, sku, |product: &mut Product| {
                product.restore_stock(*quantity)
            })
            .await?;
        }
        Ok(())
    }
}

/// Reloads an aggregate, applies `fix` and saves it.
async fn compensate<A, R, F>(step: &str, repo: &R, key: &A::Key, fix: F) -> Result<()>
where
    A: Keyed,
    R: Repository<A>,
    F: FnOnce(&mut A) -> std::result::Result<(), DomainError>,
{
    let outcome: Result<()> = async {
        let mut aggregate = repo.get(key).await?;
        let loaded = aggregate.version();
        fix(&mut aggregate)?;
        repo.save(aggregate, loaded).await
    }
    .await;

    outcome.map_err(|err| {
        metrics::counter!("compensations_failed_total").increment(1);
        tracing::warn!(step, %key, error = %err, "compensation failed");
        FulfillmentError::CompensationFailed {
            step: step.to_string(),
            reason: err.to_string(),
        }
    })
}
