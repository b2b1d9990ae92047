//! Ledger demo entry point.
//!
//! Seeds an in-memory catalogue, runs one order to completion and one to
//! cancellation, then settles the day.

use chrono::Utc;
use domain::{Merchant, Money, Order, Product, Settlement, User};
use fulfillment::{
    Config, InMemoryRepository, OrderCoordinator, OrderLine, Repository, SettlementService,
    telemetry,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Configuration and tracing
    let config = Config::from_env();
    telemetry::init(&config)?;
    tracing::info!(currency = %config.currency, "starting ledger");

    // 2. Storage
    let users = InMemoryRepository::<User>::new();
    let merchants = InMemoryRepository::<Merchant>::new();
    let products = InMemoryRepository::<Product>::new();
    let orders = InMemoryRepository::<Order>::new();
    let settlements = InMemoryRepository::<Settlement>::new();

    // 3. Seed data
    let money = |amount: &str| Money::parse(amount, config.currency.as_str());

    let mut alice = User::register("alice", config.currency.clone());
    alice.recharge(&money("500.00")?)?;
    let mut bob = User::register("bob", config.currency.clone());
    bob.recharge(&money("50.00")?)?;
    let merchant = Merchant::open("Acme Supplies", config.currency.clone());

    let (alice_id, bob_id, merchant_id) = (alice.id(), bob.id(), merchant.id());
    users.insert(alice).await?;
    users.insert(bob).await?;
    merchants.insert(merchant).await?;
    products
        .insert(Product::list("SKU-A", "Widget", merchant_id, money("10.00")?, 100)?)
        .await?;
    products
        .insert(Product::list("SKU-B", "Gadget", merchant_id, money("5.00")?, 50)?)
        .await?;

    let coordinator = OrderCoordinator::new(
        users.clone(),
        merchants.clone(),
        products.clone(),
        orders.clone(),
    );
    let settlement_service = SettlementService::new(merchants, orders, settlements);

    // 4. Happy path
    let order = coordinator
        .place_order(
            alice_id,
            merchant_id,
            vec![OrderLine::new("SKU-A", 2), OrderLine::new("SKU-B", 3)],
        )
        .await?;
    let number = order.order_number().clone();
    coordinator.confirm_order(&number).await?;
    coordinator.pay_order(&number).await?;
    let order = coordinator.complete_order(&number).await?;
    tracing::info!(
        order_number = %number,
        status = %order.status(),
        total = %order.total_amount(),
        "happy path finished"
    );

    // 5. Cancellation after payment
    let order = coordinator
        .place_order(bob_id, merchant_id, vec![OrderLine::new("SKU-A", 1)])
        .await?;
    let number = order.order_number().clone();
    coordinator.confirm_order(&number).await?;
    coordinator.pay_order(&number).await?;
    let order = coordinator.cancel_order(&number, "customer request").await?;
    let bob = users.get(&bob_id).await?;
    tracing::info!(
        order_number = %number,
        cancelled_from = ?order.cancelled_from(),
        balance = %bob.balance(),
        "cancellation finished"
    );

    let events = coordinator.drain_events().await;
    tracing::info!(count = events.len(), "order events published");

    // 6. Daily settlement
    for settlement in settlement_service.run_daily(Utc::now().date_naive()).await? {
        tracing::info!(
            merchant_id = %settlement.merchant_id(),
            expected = %settlement.expected_income(),
            actual = %settlement.actual_balance(),
            difference = %settlement.difference(),
            status = %settlement.status(),
            "settlement"
        );
    }

    tracing::info!("ledger finished");
    Ok(())
}
