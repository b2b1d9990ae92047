//! Daily merchant settlement reconciliation.
//!
//! A settlement compares what a merchant should have earned against what its
//! account actually records, and classifies the gap once, at construction.
//! Afterwards only [`Settlement::mark_as_processed`] changes it.

use chrono::{DateTime, NaiveDate, Utc};
use common::AggregateMeta;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::aggregate::Aggregate;
use crate::ids::MerchantId;
use crate::money::{Money, MoneyError};

/// Errors that can occur while building or restoring a settlement.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettlementError {
    /// Expected and actual amounts could not be compared.
    #[error(transparent)]
    Money(#[from] MoneyError),

    /// A stored settlement disagrees with its own amounts.
    #[error("Invalid settlement record: {0}")]
    InvalidRecord(String),
}

/// Outcome of a reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SettlementStatus {
    /// Actual equals expected.
    Matched,
    /// Actual exceeds expected.
    Surplus,
    /// Actual falls short of expected.
    Deficit,
    /// Resolved by a person or process (terminal state).
    Processed,
}

impl SettlementStatus {
    /// Classifies a comparison. Precedence: equal, then surplus, then deficit.
    pub fn classify(expected: &Money, actual: &Money) -> Result<Self, MoneyError> {
        if actual.abs_diff(expected)?.is_zero() {
            Ok(SettlementStatus::Matched)
        } else if actual.is_greater_than(expected)? {
            Ok(SettlementStatus::Surplus)
        } else {
            Ok(SettlementStatus::Deficit)
        }
    }

    /// Returns true if the settlement needs attention.
    pub fn is_discrepancy(&self) -> bool {
        matches!(self, SettlementStatus::Surplus | SettlementStatus::Deficit)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SettlementStatus::Matched => "MATCHED",
            SettlementStatus::Surplus => "SURPLUS",
            SettlementStatus::Deficit => "DEFICIT",
            SettlementStatus::Processed => "PROCESSED",
        }
    }
}

impl std::fmt::Display for SettlementStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One merchant's reconciliation for one settlement date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SettlementRecord", into = "SettlementRecord")]
pub struct Settlement {
    meta: AggregateMeta,
    merchant_id: MerchantId,
    settlement_date: NaiveDate,
    expected_income: Money,
    actual_balance: Money,
    difference: Money,
    status: SettlementStatus,
    remarks: Option<String>,
    processed_at: Option<DateTime<Utc>>,
}

/// Flat, storable form of a [`Settlement`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementRecord {
    pub meta: AggregateMeta,
    pub merchant_id: MerchantId,
    pub settlement_date: NaiveDate,
    pub expected_income: Money,
    pub actual_balance: Money,
    pub difference: Money,
    pub status: SettlementStatus,
    #[serde(default)]
    pub remarks: Option<String>,
    #[serde(default)]
    pub processed_at: Option<DateTime<Utc>>,
}

impl Aggregate for Settlement {
    fn aggregate_type() -> &'static str {
        "Settlement"
    }

    fn meta(&self) -> &AggregateMeta {
        &self.meta
    }
}

impl Settlement {
    /// Reconciles `actual_balance` against `expected_income`.
    ///
    /// `difference` is the absolute gap; `status` follows
    /// [`SettlementStatus::classify`]. Both amounts must share a currency.
    pub fn reconcile(
        merchant_id: MerchantId,
        settlement_date: NaiveDate,
        expected_income: Money,
        actual_balance: Money,
    ) -> Result<Self, SettlementError> {
        let difference = actual_balance.abs_diff(&expected_income)?;
        let status = SettlementStatus::classify(&expected_income, &actual_balance)?;

        tracing::debug!(
            %merchant_id,
            %settlement_date,
            %expected_income,
            %actual_balance,
            %difference,
            %status,
            "settlement reconciled"
        );

        Ok(Self {
            meta: AggregateMeta::new(),
            merchant_id,
            settlement_date,
            expected_income,
            actual_balance,
            difference,
            status,
            remarks: None,
            processed_at: None,
        })
    }

    /// Rebuilds a settlement from storage, re-checking the derived fields.
    pub fn rehydrate(record: SettlementRecord) -> Result<Self, SettlementError> {
        let difference = record.actual_balance.abs_diff(&record.expected_income)?;
        if difference != record.difference {
            return Err(SettlementError::InvalidRecord(format!(
                "difference {} does not match |{} - {}|",
                record.difference, record.actual_balance, record.expected_income
            )));
        }
        if (record.status == SettlementStatus::Processed) != record.processed_at.is_some() {
            return Err(SettlementError::InvalidRecord(
                "processed_at must be set exactly when the settlement is processed".to_string(),
            ));
        }
        if record.status != SettlementStatus::Processed {
            let derived =
                SettlementStatus::classify(&record.expected_income, &record.actual_balance)?;
            if derived != record.status {
                return Err(SettlementError::InvalidRecord(format!(
                    "status {} does not match amounts ({derived})",
                    record.status
                )));
            }
        }

        Ok(Self {
            meta: record.meta,
            merchant_id: record.merchant_id,
            settlement_date: record.settlement_date,
            expected_income: record.expected_income,
            actual_balance: record.actual_balance,
            difference,
            status: record.status,
            remarks: record.remarks,
            processed_at: record.processed_at,
        })
    }

    /// Marks the settlement resolved and records why.
    ///
    /// Does not re-run the comparison; there is no way back out of
    /// `PROCESSED`.
    pub fn mark_as_processed(&mut self, remarks: impl Into<String>) {
        self.status = SettlementStatus::Processed;
        self.remarks = Some(remarks.into());
        self.processed_at = Some(Utc::now());
        self.meta.touch();
    }

    pub fn merchant_id(&self) -> MerchantId {
        self.merchant_id
    }

    pub fn settlement_date(&self) -> NaiveDate {
        self.settlement_date
    }

    pub fn expected_income(&self) -> &Money {
        &self.expected_income
    }

    pub fn actual_balance(&self) -> &Money {
        &self.actual_balance
    }

    /// Absolute gap between actual and expected.
    pub fn difference(&self) -> &Money {
        &self.difference
    }

    pub fn status(&self) -> SettlementStatus {
        self.status
    }

    pub fn remarks(&self) -> Option<&str> {
        self.remarks.as_deref()
    }

    pub fn processed_at(&self) -> Option<DateTime<Utc>> {
        self.processed_at
    }
}

impl TryFrom<SettlementRecord> for Settlement {
    type Error = SettlementError;

    fn try_from(record: SettlementRecord) -> Result<Self, Self::Error> {
        Settlement::rehydrate(record)
    }
}

impl From<Settlement> for SettlementRecord {
    fn from(settlement: Settlement) -> Self {
        SettlementRecord {
            meta: settlement.meta,
            merchant_id: settlement.merchant_id,
            settlement_date: settlement.settlement_date,
            expected_income: settlement.expected_income,
            actual_balance: settlement.actual_balance,
            difference: settlement.difference,
            status: settlement.status,
            remarks: settlement.remarks,
            processed_at: settlement.processed_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Version;

    fn cny(amount: &str) -> Money {
        Money::parse(amount, "CNY").unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    fn reconcile(expected: &str, actual: &str) -> Settlement {
        Settlement::reconcile(MerchantId::new(), date(), cny(expected), cny(actual)).unwrap()
    }

    #[test]
    fn test_matched() {
        let settlement = reconcile("100.00", "100.00");
        assert_eq!(settlement.status(), SettlementStatus::Matched);
        assert_eq!(settlement.difference(), &cny("0.00"));
        assert!(!settlement.status().is_discrepancy());
    }

    #[test]
    fn test_surplus() {
        let settlement = reconcile("100.00", "120.00");
        assert_eq!(settlement.status(), SettlementStatus::Surplus);
        assert_eq!(settlement.difference(), &cny("20.00"));
    }

    #[test]
    fn test_deficit() {
        let settlement = reconcile("120.00", "100.00");
        assert_eq!(settlement.status(), SettlementStatus::Deficit);
        assert_eq!(settlement.difference(), &cny("20.00"));
        assert!(settlement.status().is_discrepancy());
    }

    #[test]
    fn test_currency_mismatch_fails() {
        let usd = Money::parse("100.00", "USD").unwrap();
        let result = Settlement::reconcile(MerchantId::new(), date(), cny("100.00"), usd);
        assert!(matches!(
            result,
            Err(SettlementError::Money(MoneyError::CurrencyMismatch { .. }))
        ));
    }

    #[test]
    fn test_mark_as_processed_keeps_amounts() {
        let mut settlement = reconcile("120.00", "100.00");
        settlement.mark_as_processed("Withdrawal booked late");

        assert_eq!(settlement.status(), SettlementStatus::Processed);
        assert_eq!(settlement.remarks(), Some("Withdrawal booked late"));
        assert_eq!(settlement.difference(), &cny("20.00"));
        assert!(settlement.processed_at().is_some());
        assert_eq!(settlement.version(), Version::new(1));
    }

    #[test]
    fn test_processed_survives_roundtrip() {
        let mut settlement = reconcile("100.00", "100.00");
        settlement.mark_as_processed("Checked");

        let json = serde_json::to_string(&settlement).unwrap();
        let restored: Settlement = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, settlement);
    }

    #[test]
    fn test_rehydrate_rejects_inconsistent_status() {
        let mut record = SettlementRecord::from(reconcile("100.00", "120.00"));
        record.status = SettlementStatus::Matched;
        assert!(matches!(
            Settlement::rehydrate(record),
            Err(SettlementError::InvalidRecord(_))
        ));
    }

    #[test]
    fn test_rehydrate_ties_processed_status_to_timestamp() {
        let mut unstamped = reconcile("100.00", "100.00");
        unstamped.mark_as_processed("Checked");
        let mut record = SettlementRecord::from(unstamped);
        record.processed_at = None;
        assert!(matches!(
            Settlement::rehydrate(record),
            Err(SettlementError::InvalidRecord(_))
        ));

        let mut record = SettlementRecord::from(reconcile("100.00", "100.00"));
        record.processed_at = Some(Utc::now());
        assert!(matches!(
            Settlement::rehydrate(record),
            Err(SettlementError::InvalidRecord(_))
        ));
    }

    #[test]
    fn test_rehydrate_rejects_wrong_difference() {
        let mut record = SettlementRecord::from(reconcile("100.00", "120.00"));
        record.difference = cny("5.00");
        assert!(Settlement::rehydrate(record).is_err());
    }
}
