//! Aggregate root traits for event-sourced domain models.

use crate::error::{DomainError, DomainResult};
use crate::id::TypedId;
use crate::metadata::EventSignatureBusinessMetadata;

/// Aggregate root marker + minimal interface.
pub trait AggregateRoot {
    /// Strongly-typed aggregate identifier (also the stream identifier).
    type Id: TypedId;

    /// Returns the aggregate identifier.
    fn id(&self) -> &Self::Id;

    /// Monotonically increasing version of the aggregate's state.
    ///
    /// Equals the number of events applied, replayed or freshly raised.
    fn version(&self) -> u64;
}

/// Optimistic concurrency expectation for an aggregate.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// Skip version checking (useful for migrations).
    Any,
    /// Require the aggregate to be at an exact version.
    Exact(u64),
}

impl ExpectedVersion {
    pub fn matches(self, actual: u64) -> bool {
        match self {
            ExpectedVersion::Any => true,
            ExpectedVersion::Exact(v) => v == actual,
        }
    }

    pub fn check(self, actual: u64) -> DomainResult<()> {
        if self.matches(actual) {
            Ok(())
        } else {
            Err(DomainError::conflict(format!(
                "optimistic concurrency check failed (expected: {self:?}, actual: {actual})"
            )))
        }
    }
}

/// An event produced by the current command, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaisedEvent<E> {
    pub event: E,
    pub metadata: Option<EventSignatureBusinessMetadata>,
}

/// Events raised during the current command, in raise order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEvents<E> {
    events: Vec<RaisedEvent<E>>,
}

impl<E> Default for PendingEvents<E> {
    fn default() -> Self {
        Self { events: Vec::new() }
    }
}

impl<E> PendingEvents<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: E, metadata: Option<EventSignatureBusinessMetadata>) {
        self.events.push(RaisedEvent { event, metadata });
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RaisedEvent<E>> {
        self.events.iter()
    }

    pub fn take(&mut self) -> Vec<RaisedEvent<E>> {
        core::mem::take(&mut self.events)
    }
}

/// Event-sourced aggregate semantics.
///
/// - **State mutation**: `apply(&mut self, event)` evolves state; it is pure and
///   deterministic and must bump `version()` by one per event.
/// - **Decision logic**: intent methods on the concrete aggregate validate
///   against current state and `raise` events. Each raised event is applied
///   immediately, so later validations in the same command see its effect.
///
/// Aggregates must not perform IO. The event type is a closed enum, so an event
/// kind without an apply arm does not compile.
pub trait Aggregate: AggregateRoot + Sized {
    type Event: Clone + core::fmt::Debug;

    /// Stream type name (e.g. "proportional_election").
    const AGGREGATE_TYPE: &'static str;

    /// Create an empty, not-yet-created instance for rehydration.
    fn empty(id: Self::Id) -> Self;

    /// Evolve in-memory state from a single event.
    fn apply(&mut self, event: &Self::Event);

    fn pending_events(&self) -> &PendingEvents<Self::Event>;

    fn pending_events_mut(&mut self) -> &mut PendingEvents<Self::Event>;

    /// Apply `event` and queue it for persistence.
    fn raise(&mut self, event: Self::Event, metadata: Option<EventSignatureBusinessMetadata>) {
        self.apply(&event);
        self.pending_events_mut().push(event, metadata);
    }

    /// Drain the events raised since the last call.
    fn take_pending(&mut self) -> Vec<RaisedEvent<Self::Event>> {
        self.pending_events_mut().take()
    }

    /// Rebuild state from stored history.
    fn replay<'a, I>(&mut self, events: I)
    where
        I: IntoIterator<Item = &'a Self::Event>,
        Self::Event: 'a,
    {
        for event in events {
            self.apply(event);
        }
    }

    fn from_history<'a, I>(id: Self::Id, events: I) -> Self
    where
        I: IntoIterator<Item = &'a Self::Event>,
        Self::Event: 'a,
    {
        let mut aggregate = Self::empty(id);
        aggregate.replay(events);
        aggregate
    }
}

/// Soft-delete convention shared by every aggregate.
///
/// A terminal "deleted" event sets the flag; every mutating intent method calls
/// `ensure_exists` first.
pub trait SoftDelete: Aggregate {
    /// Whether the creation event has been applied.
    fn is_created(&self) -> bool;

    fn is_deleted(&self) -> bool;

    fn ensure_not_deleted(&self) -> DomainResult<()> {
        if self.is_deleted() {
            return Err(DomainError::deleted(format!(
                "{} {}",
                Self::AGGREGATE_TYPE,
                self.id()
            )));
        }
        Ok(())
    }

    fn ensure_exists(&self) -> DomainResult<()> {
        if !self.is_created() {
            return Err(DomainError::not_found(format!(
                "{} {}",
                Self::AGGREGATE_TYPE,
                self.id()
            )));
        }
        self.ensure_not_deleted()
    }

    fn ensure_not_created(&self) -> DomainResult<()> {
        if self.is_created() {
            return Err(DomainError::conflict(format!(
                "{} {} already exists",
                Self::AGGREGATE_TYPE,
                self.id()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::{ContestId, VoteId};

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum CounterEvent {
        Created,
        Incremented(u32),
        Deleted,
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Counter {
        id: VoteId,
        total: u32,
        created: bool,
        deleted: bool,
        version: u64,
        pending: PendingEvents<CounterEvent>,
    }

    impl AggregateRoot for Counter {
        type Id = VoteId;

        fn id(&self) -> &VoteId {
            &self.id
        }

        fn version(&self) -> u64 {
            self.version
        }
    }

    impl Aggregate for Counter {
        type Event = CounterEvent;
        const AGGREGATE_TYPE: &'static str = "counter";

        fn empty(id: VoteId) -> Self {
            Self {
                id,
                total: 0,
                created: false,
                deleted: false,
                version: 0,
                pending: PendingEvents::new(),
            }
        }

        fn apply(&mut self, event: &CounterEvent) {
            match event {
                CounterEvent::Created => self.created = true,
                CounterEvent::Incremented(by) => self.total += by,
                CounterEvent::Deleted => self.deleted = true,
            }
            self.version += 1;
        }

        fn pending_events(&self) -> &PendingEvents<CounterEvent> {
            &self.pending
        }

        fn pending_events_mut(&mut self) -> &mut PendingEvents<CounterEvent> {
            &mut self.pending
        }
    }

    impl SoftDelete for Counter {
        fn is_created(&self) -> bool {
            self.created
        }

        fn is_deleted(&self) -> bool {
            self.deleted
        }
    }

    impl Counter {
        fn increment_twice_if_small(&mut self, by: u32) -> DomainResult<()> {
            self.ensure_exists()?;
            self.raise(CounterEvent::Incremented(by), None);
            // The second check sees the first event's effect.
            if self.total < 10 {
                self.raise(CounterEvent::Incremented(by), None);
            }
            Ok(())
        }
    }

    #[test]
    fn raise_applies_immediately_and_queues() {
        let mut counter = Counter::empty(VoteId::new());
        counter.raise(CounterEvent::Created, None);
        counter.increment_twice_if_small(6).unwrap();

        assert_eq!(counter.total, 6);
        assert_eq!(counter.version(), 2);
        assert_eq!(counter.pending_events().len(), 2);
    }

    #[test]
    fn replay_reproduces_incremental_state() {
        let id = VoteId::new();
        let mut counter = Counter::empty(id);
        let metadata = EventSignatureBusinessMetadata::new(ContestId::new());
        counter.raise(CounterEvent::Created, Some(metadata));
        counter.increment_twice_if_small(3).unwrap();

        let raised = counter.take_pending();
        assert!(raised.iter().all(|r| r.metadata.is_none() || r.metadata == Some(metadata)));
        let events: Vec<_> = raised.into_iter().map(|r| r.event).collect();
        let replayed = Counter::from_history(id, &events);

        assert_eq!(replayed, counter);
    }

    #[test]
    fn deleted_aggregates_refuse_mutation() {
        let mut counter = Counter::empty(VoteId::new());
        assert!(matches!(
            counter.increment_twice_if_small(1),
            Err(DomainError::NotFound(_))
        ));

        counter.raise(CounterEvent::Created, None);
        counter.raise(CounterEvent::Deleted, None);
        assert!(matches!(
            counter.increment_twice_if_small(1),
            Err(DomainError::AggregateDeleted(_))
        ));
    }

    #[test]
    fn expected_version_check() {
        assert!(ExpectedVersion::Any.check(7).is_ok());
        assert!(ExpectedVersion::Exact(7).check(7).is_ok());
        assert!(matches!(
            ExpectedVersion::Exact(6).check(7),
            Err(DomainError::Conflict(_))
        ));
    }
}
