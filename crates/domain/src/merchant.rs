//! Merchant aggregate: a seller with a withdrawable income account.

use common::AggregateMeta;
use serde::{Deserialize, Serialize};

use crate::account::MerchantAccount;
use crate::aggregate::Aggregate;
use crate::error::DomainError;
use crate::ids::MerchantId;
use crate::lifecycle::ResourceStatus;
use crate::money::{Currency, Money};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Merchant {
    meta: AggregateMeta,
    id: MerchantId,
    name: String,
    account: MerchantAccount,
    status: ResourceStatus,
}

impl Aggregate for Merchant {
    fn aggregate_type() -> &'static str {
        "Merchant"
    }

    fn meta(&self) -> &AggregateMeta {
        &self.meta
    }
}

impl Merchant {
    /// Opens an active merchant with an empty account.
    pub fn open(name: impl Into<String>, currency: Currency) -> Self {
        Self {
            meta: AggregateMeta::new(),
            id: MerchantId::new(),
            name: name.into(),
            account: MerchantAccount::new(currency),
            status: ResourceStatus::Active,
        }
    }

    /// Rebuilds a merchant from stored fields. Storage adapters only.
    pub fn rehydrate(
        meta: AggregateMeta,
        id: MerchantId,
        name: String,
        account: MerchantAccount,
        status: ResourceStatus,
    ) -> Self {
        Self {
            meta,
            id,
            name,
            account,
            status,
        }
    }

    pub fn id(&self) -> MerchantId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn account(&self) -> &MerchantAccount {
        &self.account
    }

    pub fn currency(&self) -> &Currency {
        self.account.currency()
    }

    pub fn status(&self) -> ResourceStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Fails with `ResourceInactive` if the merchant is deactivated.
    pub fn ensure_active(&self) -> Result<(), DomainError> {
        self.status.ensure_active(Self::aggregate_type(), self.id)
    }

    /// Credits income from a completed order.
    pub fn add_income(&mut self, amount: &Money) -> Result<(), DomainError> {
        self.ensure_active()?;
        self.account = self.account.add_income(amount)?;
        self.meta.touch();
        Ok(())
    }

    /// Pays out part of the balance.
    pub fn withdraw(&mut self, amount: &Money) -> Result<(), DomainError> {
        self.ensure_active()?;
        self.account = self.account.withdraw(amount)?;
        self.meta.touch();
        Ok(())
    }

    pub fn activate(&mut self) {
        if self.status != ResourceStatus::Active {
            self.status = ResourceStatus::Active;
            self.meta.touch();
        }
    }

    pub fn deactivate(&mut self) {
        if self.status != ResourceStatus::Inactive {
            self.status = ResourceStatus::Inactive;
            self.meta.touch();
        }
    }
}
