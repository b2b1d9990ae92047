//! User aggregate: a buyer with a prepaid balance.

use common::AggregateMeta;
use serde::{Deserialize, Serialize};

use crate::account::UserAccount;
use crate::aggregate::Aggregate;
use crate::error::DomainError;
use crate::ids::UserId;
use crate::lifecycle::ResourceStatus;
use crate::money::{Currency, Money};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    meta: AggregateMeta,
    id: UserId,
    username: String,
    account: UserAccount,
    status: ResourceStatus,
}

impl Aggregate for User {
    fn aggregate_type() -> &'static str {
        "User"
    }

    fn meta(&self) -> &AggregateMeta {
        &self.meta
    }
}

impl User {
    /// Registers an active user with an empty balance.
    pub fn register(username: impl Into<String>, currency: Currency) -> Self {
        Self {
            meta: AggregateMeta::new(),
            id: UserId::new(),
            username: username.into(),
            account: UserAccount::new(currency),
            status: ResourceStatus::Active,
        }
    }

    /// Rebuilds a user from stored fields. Storage adapters only.
    pub fn rehydrate(
        meta: AggregateMeta,
        id: UserId,
        username: String,
        account: UserAccount,
        status: ResourceStatus,
    ) -> Self {
        Self {
            meta,
            id,
            username,
            account,
            status,
        }
    }

    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn account(&self) -> &UserAccount {
        &self.account
    }

    pub fn balance(&self) -> &Money {
        self.account.balance()
    }

    pub fn status(&self) -> ResourceStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Fails with `ResourceInactive` if the user is deactivated.
    pub fn ensure_active(&self) -> Result<(), DomainError> {
        self.status.ensure_active(Self::aggregate_type(), self.id)
    }

    /// Tops up the balance.
    pub fn recharge(&mut self, amount: &Money) -> Result<(), DomainError> {
        self.ensure_active()?;
        self.account = self.account.add_balance(amount)?;
        self.meta.touch();
        Ok(())
    }

    /// Pays for an order out of the balance.
    pub fn pay(&mut self, amount: &Money) -> Result<(), DomainError> {
        self.ensure_active()?;
        self.account = self.account.subtract(amount)?;
        self.meta.touch();
        Ok(())
    }

    /// Returns money for a cancelled order.
    ///
    /// Allowed on an inactive user: a refund settles a debt that already
    /// exists.
    pub fn refund(&mut self, amount: &Money) -> Result<(), DomainError> {
        self.account = self.account.add_balance(amount)?;
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
