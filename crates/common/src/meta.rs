//! Identity, timestamps and version shared by every aggregate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::AggregateId;

/// Version number of an aggregate, used for optimistic concurrency control.
///
/// A freshly created aggregate is at version 0; every successful mutation
/// bumps it by one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(u64);

impl Version {
    /// Creates a version from a raw value.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// The version of an aggregate that has never been mutated.
    pub fn initial() -> Self {
        Self(0)
    }

    /// Returns the next version.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw version value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Metadata embedded in every aggregate.
///
/// Aggregates compose this struct instead of inheriting from a base type.
/// Mutators call [`AggregateMeta::touch`] after a successful state change so
/// that `updated_at` and `version` always reflect the last mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateMeta {
    id: AggregateId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: Version,
}

impl AggregateMeta {
    /// Metadata for a brand-new aggregate.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: AggregateId::new(),
            created_at: now,
            updated_at: now,
            version: Version::initial(),
        }
    }

    /// Rebuilds metadata from stored fields. Storage adapters only.
    pub fn rehydrate(
        id: AggregateId,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        version: Version,
    ) -> Self {
        Self {
            id,
            created_at,
            updated_at,
            version,
        }
    }

    pub fn id(&self) -> AggregateId {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn version(&self) -> Version {
        self.version
    }

    /// Records a mutation: bumps the version and refreshes `updated_at`.
    pub fn touch(&mut self) {
        self.version = self.version.next();
        // Clock skew must not move updated_at backwards.
        self.updated_at = Utc::now().max(self.updated_at);
    }
}

impl Default for AggregateMeta {
    fn default() -> Self {
        Self::new()
    }
}
