//! Storage seam for aggregates, with an in-memory implementation.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use common::Version;
use domain::{
    Aggregate, Merchant, MerchantId, Order, OrderNumber, Product, Settlement, Sku, User, UserId,
};
use tokio::sync::RwLock;

use crate::error::{FulfillmentError, Result};

/// An aggregate stored under a natural key.
pub trait Keyed: Aggregate + Clone + 'static {
    type Key: Clone + Eq + Hash + fmt::Display + Send + Sync + 'static;

    fn key(&self) -> Self::Key;
}

impl Keyed for User {
    type Key = UserId;

    fn key(&self) -> UserId {
        self.id()
    }
}

impl Keyed for Merchant {
    type Key = MerchantId;

    fn key(&self) -> MerchantId {
        self.id()
    }
}

impl Keyed for Product {
    type Key = Sku;

    fn key(&self) -> Sku {
        self.sku().clone()
    }
}

impl Keyed for Order {
    type Key = OrderNumber;

    fn key(&self) -> OrderNumber {
        self.order_number().clone()
    }
}

/// A merchant's settlement slot for one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SettlementKey {
    pub merchant_id: MerchantId,
    pub date: NaiveDate,
}

impl fmt::Display for SettlementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.merchant_id, self.date)
    }
}

impl Keyed for Settlement {
    type Key = SettlementKey;

    fn key(&self) -> SettlementKey {
        SettlementKey {
            merchant_id: self.merchant_id(),
            date: self.settlement_date(),
        }
    }
}

/// Trait for aggregate storage.
///
/// `save` is optimistic: it succeeds only if the stored copy is still at the
/// version the caller loaded.
#[async_trait]
pub trait Repository<A: Keyed>: Send + Sync {
    /// Loads the aggregate stored under `key`, if any.
    async fn find(&self, key: &A::Key) -> Result<Option<A>>;

    /// Loads the aggregate stored under `key`, failing with `NotFound`.
    async fn get(&self, key: &A::Key) -> Result<A> {
        self.find(key)
            .await?
            .ok_or_else(|| FulfillmentError::NotFound {
                resource: A::aggregate_type(),
                key: key.to_string(),
            })
    }

    /// Stores a new aggregate. Fails with `AlreadyExists` if the key is taken.
    async fn insert(&self, aggregate: A) -> Result<()>;

    /// Replaces a stored aggregate.
    ///
    /// Fails with `Concurrency` if the stored version is not `expected`.
    async fn save(&self, aggregate: A, expected: Version) -> Result<()>;

    /// Loads every stored aggregate.
    async fn all(&self) -> Result<Vec<A>>;
}

/// In-memory repository for tests and the demo binary.
///
/// Clones share the same underlying map.
pub struct InMemoryRepository<A: Keyed> {
    items: Arc<RwLock<HashMap<A::Key, A>>>,
}

impl<A: Keyed> Clone for InMemoryRepository<A> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
        }
    }
}

impl<A: Keyed> Default for InMemoryRepository<A> {
    fn default() -> Self {
        Self {
            items: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl<A: Keyed> InMemoryRepository<A> {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored aggregates.
    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }
}

#[async_trait]
impl<A: Keyed> Repository<A> for InMemoryRepository<A> {
    async fn find(&self, key: &A::Key) -> Result<Option<A>> {
        Ok(self.items.read().await.get(key).cloned())
    }

    async fn insert(&self, aggregate: A) -> Result<()> {
        let key = aggregate.key();
        let mut items = self.items.write().await;
        if items.contains_key(&key) {
            return Err(FulfillmentError::AlreadyExists {
                resource: A::aggregate_type(),
                key: key.to_string(),
            });
        }
        items.insert(key, aggregate);
        Ok(())
    }

    async fn save(&self, aggregate: A, expected: Version) -> Result<()> {
        let key = aggregate.key();
        let mut items = self.items.write().await;

        let actual = items
            .get(&key)
            .map(Aggregate::version)
            .ok_or_else(|| FulfillmentError::NotFound {
                resource: A::aggregate_type(),
                key: key.to_string(),
            })?;

        if actual != expected {
            return Err(FulfillmentError::Concurrency {
                resource: A::aggregate_type(),
                key: key.to_string(),
                expected,
                actual,
            });
        }

        items.insert(key, aggregate);
        Ok(())
    }

    async fn all(&self) -> Result<Vec<A>> {
        Ok(self.items.read().await.values().cloned().collect())
    }
}
