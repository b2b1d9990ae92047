//! Daily settlement job.

use chrono::NaiveDate;
use domain::{Aggregate, Merchant, MerchantId, Money, Order, OrderStatus, Settlement};
use tokio::sync::Mutex;

use crate::error::{FulfillmentError, Result};
use crate::repository::{Keyed, Repository, SettlementKey};

/// Reconciles every merchant's recorded income against its completed orders.
pub struct SettlementService<M, O, S>
where
    M: Repository<Merchant>,
    O: Repository<Order>,
    S: Repository<Settlement>,
{
    merchants: M,
    orders: O,
    settlements: S,
    // Held across the already-settled check and the inserts.
    guard: Mutex<()>,
}

impl<M, O, S> SettlementService<M, O, S>
where
    M: Repository<Merchant>,
    O: Repository<Order>,
    S: Repository<Settlement>,
{
    pub fn new(merchants: M, orders: O, settlements: S) -> Self {
        Self {
            merchants,
            orders,
            settlements,
            guard: Mutex::new(()),
        }
    }

    /// Settles every merchant for `date`.
    ///
    /// Expected income is the total of the merchant's orders completed on or
    /// before `date` (UTC); the actual figure is the merchant's recorded
    /// total income. Fails with `AlreadyExists`, before storing anything, if
    /// any merchant is already settled for `date`.
    #[tracing::instrument(skip(self))]
    pub async fn run_daily(&self, date: NaiveDate) -> Result<Vec<Settlement>> {
        let _guard = self.guard.lock().await;
        let started = std::time::Instant::now();
        let merchants = self.merchants.all().await?;

        for merchant in &merchants {
            let key = SettlementKey {
                merchant_id: merchant.id(),
                date,
            };
            if self.settlements.find(&key).await?.is_some() {
                return Err(FulfillmentError::AlreadyExists {
                    resource: Settlement::aggregate_type(),
                    key: key.to_string(),
                });
            }
        }

        let orders = self.orders.all().await?;
        let mut settlements = Vec::with_capacity(merchants.len());
        for merchant in &merchants {
            let expected = expected_income(merchant, &orders, date)?;
            let actual = merchant.account().total_income().clone();
            let settlement = Settlement::reconcile(merchant.id(), date, expected, actual)?;

            if settlement.status().is_discrepancy() {
                tracing::warn!(
                    merchant_id = %merchant.id(),
                    status = %settlement.status(),
                    difference = %settlement.difference(),
                    "settlement discrepancy"
                );
            }
            metrics::counter!("settlements_total", "status" => settlement.status().as_str())
                .increment(1);

            self.settlements.insert(settlement.clone()).await?;
            settlements.push(settlement);
        }

        metrics::histogram!("settlement_run_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        tracing::info!(%date, merchants = settlements.len(), "daily settlement finished");
        Ok(settlements)
    }

    /// Marks a stored settlement as processed.
    #[tracing::instrument(skip(self, remarks))]
    pub async fn process(
        &self,
        merchant_id: MerchantId,
        date: NaiveDate,
        remarks: &str,
    ) -> Result<Settlement> {
        let _guard = self.guard.lock().await;
        let key = SettlementKey { merchant_id, date };
        let mut settlement = self.settlements.get(&key).await?;
        let loaded = settlement.version();
        settlement.mark_as_processed(remarks);
        self.settlements.save(settlement.clone(), loaded).await?;

        tracing::info!(key = %settlement.key(), "settlement processed");
        Ok(settlement)
    }

    /// Loads the stored settlements for `date`.
    pub async fn settlements_on(&self, date: NaiveDate) -> Result<Vec<Settlement>> {
        let mut settlements: Vec<_> = self
            .settlements
            .all()
            .await?
            .into_iter()
            .filter(|s| s.settlement_date() == date)
            .collect();
        settlements.sort_by_key(|s| s.merchant_id());
        Ok(settlements)
    }
}

fn expected_income(merchant: &Merchant, orders: &[Order], date: NaiveDate) -> Result<Money> {
    let mut expected = Money::zero(merchant.currency().clone());
    for order in orders {
        let completed_on = order.completed_time().map(|at| at.date_naive());
        if order.merchant_id() == merchant.id()
            && order.status() == OrderStatus::Completed
            && completed_on.is_some_and(|day| day <= date)
        {
            expected = expected.add(order.total_amount())?;
        }
    }
    Ok(expected)
}
