//! Currency-tagged, non-negative fixed-point money.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fractional digits kept by every [`Money`] amount.
pub const SCALE: u32 = 2;

/// Errors produced by money arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    /// The amount or multiplier is negative or otherwise unusable.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Two operands carry different currencies.
    #[error("Currency mismatch: {left} vs {right}")]
    CurrencyMismatch { left: Currency, right: Currency },

    /// A subtraction would go below zero.
    #[error("Negative result: {minuend} - {subtrahend}")]
    NegativeResult { minuend: Decimal, subtrahend: Decimal },

    /// The result does not fit the decimal representation.
    #[error("Amount overflow")]
    Overflow,
}

/// ISO-style currency code, stored upper-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    /// Creates a currency code. Fails on an empty or blank code.
    pub fn new(code: impl AsRef<str>) -> Result<Self, MoneyError> {
        let code = code.as_ref().trim();
        if code.is_empty() {
            return Err(MoneyError::InvalidAmount(
                "currency code must not be empty".to_string(),
            ));
        }
        Ok(Self(code.to_ascii_uppercase()))
    }

    /// Chinese yuan, the ledger's default currency.
    pub fn cny() -> Self {
        Self("CNY".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Currency {
    type Error = MoneyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.0
    }
}

/// An immutable, non-negative amount of a single currency.
///
/// Amounts are rounded half-up to [`SCALE`] digits the moment a value is
/// built, so chained operations never carry more than one rounding step of
/// drift each. Every binary operation requires both operands to share a
/// currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "MoneyRepr")]
pub struct Money {
    #[serde(with = "rust_decimal::serde::str")]
    amount: Decimal,
    currency: Currency,
}

#[derive(Deserialize)]
struct MoneyRepr {
    #[serde(with = "rust_decimal::serde::str")]
    amount: Decimal,
    currency: String,
}

impl TryFrom<MoneyRepr> for Money {
    type Error = MoneyError;

    fn try_from(repr: MoneyRepr) -> Result<Self, Self::Error> {
        Money::of(repr.amount, repr.currency)
    }
}

fn round(amount: Decimal) -> Decimal {
    // Amounts are never negative, so away-from-zero is half-up.
    let mut rounded = amount.round_dp_with_strategy(SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(SCALE);
    rounded
}

impl Money {
    /// Creates a money value, rounding `amount` to two digits.
    pub fn of(amount: Decimal, currency: impl AsRef<str>) -> Result<Self, MoneyError> {
        let currency = Currency::new(currency)?;
        Self::build(amount, currency)
    }

    /// Parses a decimal string such as `"12.50"`.
    pub fn parse(amount: &str, currency: impl AsRef<str>) -> Result<Self, MoneyError> {
        let amount = Decimal::from_str(amount.trim())
            .map_err(|e| MoneyError::InvalidAmount(format!("{amount:?}: {e}")))?;
        Self::of(amount, currency)
    }

    /// Zero in the given currency.
    pub fn zero(currency: Currency) -> Self {
        Self {
            amount: round(Decimal::ZERO),
            currency,
        }
    }

    fn build(amount: Decimal, currency: Currency) -> Result<Self, MoneyError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(MoneyError::InvalidAmount(format!("{amount} is negative")));
        }
        let amount = if amount.is_zero() { Decimal::ZERO } else { amount };
        Ok(Self {
            amount: round(amount),
            currency,
        })
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Returns true if the amount is strictly greater than zero.
    pub fn is_positive(&self) -> bool {
        !self.is_zero()
    }

    /// Fails with [`MoneyError::CurrencyMismatch`] unless both share a currency.
    pub fn ensure_same_currency(&self, other: &Money) -> Result<(), MoneyError> {
        if self.currency != other.currency {
            return Err(MoneyError::CurrencyMismatch {
                left: self.currency.clone(),
                right: other.currency.clone(),
            });
        }
        Ok(())
    }

    pub fn add(&self, other: &Money) -> Result<Money, MoneyError> {
        self.ensure_same_currency(other)?;
        let sum = self
            .amount
            .checked_add(other.amount)
            .ok_or(MoneyError::Overflow)?;
        Self::build(sum, self.currency.clone())
    }

    /// Subtracts `other`; fails rather than produce a negative amount.
    pub fn subtract(&self, other: &Money) -> Result<Money, MoneyError> {
        self.ensure_same_currency(other)?;
        if other.amount > self.amount {
            return Err(MoneyError::NegativeResult {
                minuend: self.amount,
                subtrahend: other.amount,
            });
        }
        Self::build(self.amount - other.amount, self.currency.clone())
    }

    /// Multiplies by a whole factor, e.g. a line quantity.
    pub fn multiply(&self, factor: i64) -> Result<Money, MoneyError> {
        if factor < 0 {
            return Err(MoneyError::InvalidAmount(format!(
                "multiplier {factor} is negative"
            )));
        }
        let product = self
            .amount
            .checked_mul(Decimal::from(factor))
            .ok_or(MoneyError::Overflow)?;
        Self::build(product, self.currency.clone())
    }

    /// Multiplies by a decimal factor, e.g. a discount rate.
    pub fn multiply_decimal(&self, factor: Decimal) -> Result<Money, MoneyError> {
        if factor.is_sign_negative() && !factor.is_zero() {
            return Err(MoneyError::InvalidAmount(format!(
                "multiplier {factor} is negative"
            )));
        }
        let product = self
            .amount
            .checked_mul(factor)
            .ok_or(MoneyError::Overflow)?;
        Self::build(product, self.currency.clone())
    }

    /// Absolute difference between two amounts of the same currency.
    pub fn abs_diff(&self, other: &Money) -> Result<Money, MoneyError> {
        if self.is_greater_than_or_equal(other)? {
            self.subtract(other)
        } else {
            other.subtract(self)
        }
    }

    pub fn is_greater_than(&self, other: &Money) -> Result<bool, MoneyError> {
        self.ensure_same_currency(other)?;
        Ok(self.amount > other.amount)
    }

    pub fn is_greater_than_or_equal(&self, other: &Money) -> Result<bool, MoneyError> {
        self.ensure_same_currency(other)?;
        Ok(self.amount >= other.amount)
    }

    pub fn is_less_than(&self, other: &Money) -> Result<bool, MoneyError> {
        self.ensure_same_currency(other)?;
        Ok(self.amount < other.amount)
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}
