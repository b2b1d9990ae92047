//! Core aggregate and domain event traits.

use common::{AggregateId, AggregateMeta, Version};
use serde::Serialize;

/// Trait for domain events.
///
/// Domain events represent facts that have happened in the domain.
/// They are immutable and should be named in past tense.
pub trait DomainEvent: Serialize + Send + Sync + Clone {
    /// Returns the event type name.
    fn event_type(&self) -> &'static str;
}

/// Trait for aggregates.
///
/// An aggregate is a consistency boundary whose invariants are enforced by
/// its own mutators. Each one embeds an [`AggregateMeta`] and touches it on
/// every successful mutation, so the version doubles as an optimistic
/// concurrency token for storage adapters.
pub trait Aggregate: Send + Sync {
    /// Returns the aggregate type name, used for logging and storage routing.
    fn aggregate_type() -> &'static str
    where
        Self: Sized;

    /// Returns the embedded metadata.
    fn meta(&self) -> &AggregateMeta;

    /// Returns the aggregate's surrogate identifier.
    fn id(&self) -> AggregateId {
        self.meta().id()
    }

    /// Returns the current version. Starts at 0 and grows by one per mutation.
    fn version(&self) -> Version {
        self.meta().version()
    }
}
