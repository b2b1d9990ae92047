//! Prepaid user balances and merchant income accounts.
//!
//! Both account types are immutable values: every mutator validates first and
//! returns a new account, leaving the original untouched on failure.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::money::{Currency, Money, MoneyError};

/// Errors that can occur during account operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountError {
    /// Only strictly positive amounts can be credited or debited.
    #[error("Invalid amount: {0} (must be greater than 0)")]
    InvalidAmount(Money),

    /// The debit exceeds the available balance.
    #[error("Insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds { requested: Money, available: Money },

    /// Stored merchant balances claim more than was ever earned.
    #[error("Balance {balance} exceeds total income {total_income}")]
    BalanceExceedsIncome { balance: Money, total_income: Money },

    /// The underlying money arithmetic failed.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

fn ensure_positive(amount: &Money) -> Result<(), AccountError> {
    if amount.is_zero() {
        return Err(AccountError::InvalidAmount(amount.clone()));
    }
    Ok(())
}

/// A user's prepaid balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    balance: Money,
}

impl UserAccount {
    /// An empty account in the given currency.
    pub fn new(currency: Currency) -> Self {
        Self {
            balance: Money::zero(currency),
        }
    }

    /// An account holding `balance`.
    pub fn with_balance(balance: Money) -> Self {
        Self { balance }
    }

    pub fn balance(&self) -> &Money {
        &self.balance
    }

    pub fn currency(&self) -> &Currency {
        self.balance.currency()
    }

    /// Returns true if `amount` can be debited. Mutators re-check regardless.
    pub fn has_enough_balance(&self, amount: &Money) -> bool {
        self.balance.is_greater_than_or_equal(amount).unwrap_or(false)
    }

    /// Credits the balance, e.g. a top-up or a refund.
    pub fn add_balance(&self, amount: &Money) -> Result<UserAccount, AccountError> {
        ensure_positive(amount)?;
        Ok(Self {
            balance: self.balance.add(amount)?,
        })
    }

    /// Debits the balance, e.g. an order payment.
    pub fn subtract(&self, amount: &Money) -> Result<UserAccount, AccountError> {
        ensure_positive(amount)?;
        self.balance.ensure_same_currency(amount)?;
        if !self.has_enough_balance(amount) {
            return Err(AccountError::InsufficientFunds {
                requested: amount.clone(),
                available: self.balance.clone(),
            });
        }
        Ok(Self {
            balance: self.balance.subtract(amount)?,
        })
    }
}

/// A merchant's withdrawable balance and lifetime income.
///
/// `total_income` only grows, and only together with `balance`, so the
/// balance can never exceed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "MerchantAccountRepr")]
pub struct MerchantAccount {
    balance: Money,
    total_income: Money,
}

#[derive(Deserialize)]
struct MerchantAccountRepr {
    balance: Money,
    total_income: Money,
}

impl TryFrom<MerchantAccountRepr> for MerchantAccount {
    type Error = AccountError;

    fn try_from(repr: MerchantAccountRepr) -> Result<Self, Self::Error> {
        MerchantAccount::rehydrate(repr.balance, repr.total_income)
    }
}

impl MerchantAccount {
    /// An empty account in the given currency.
    pub fn new(currency: Currency) -> Self {
        Self {
            balance: Money::zero(currency.clone()),
            total_income: Money::zero(currency),
        }
    }

    /// Rebuilds an account from stored values.
    ///
    /// Fails if the two amounts disagree on currency or the balance exceeds
    /// the recorded income.
    pub fn rehydrate(balance: Money, total_income: Money) -> Result<Self, AccountError> {
        if balance.is_greater_than(&total_income)? {
            return Err(AccountError::BalanceExceedsIncome {
                balance,
                total_income,
            });
        }
        Ok(Self {
            balance,
            total_income,
        })
    }

    pub fn balance(&self) -> &Money {
        &self.balance
    }

    pub fn total_income(&self) -> &Money {
        &self.total_income
    }

    pub fn currency(&self) -> &Currency {
        self.balance.currency()
    }

    /// Returns true if `amount` can be withdrawn. Mutators re-check regardless.
    pub fn has_enough_balance(&self, amount: &Money) -> bool {
        self.balance.is_greater_than_or_equal(amount).unwrap_or(false)
    }

    /// Credits income: grows both the balance and the lifetime total.
    pub fn add_income(&self, amount: &Money) -> Result<MerchantAccount, AccountError> {
        ensure_positive(amount)?;
        Ok(Self {
            balance: self.balance.add(amount)?,
            total_income: self.total_income.add(amount)?,
        })
    }

    /// Withdraws from the balance. The lifetime total is unchanged.
    pub fn withdraw(&self, amount: &Money) -> Result<MerchantAccount, AccountError> {
        ensure_positive(amount)?;
        self.balance.ensure_same_currency(amount)?;
        if !self.has_enough_balance(amount) {
            return Err(AccountError::InsufficientFunds {
                requested: amount.clone(),
                available: self.balance.clone(),
            });
        }
        Ok(Self {
            balance: self.balance.subtract(amount)?,
            total_income: self.total_income.clone(),
        })
    }
}
