//! Command execution pipeline (application-level orchestration).
//!
//! ```text
//! intent
//!   ↓
//! 1. Load the stream from the store
//!   ↓
//! 2. Upcast stored payloads to the current schema version
//!   ↓
//! 3. Deserialize and replay into a fresh aggregate
//!   ↓
//! 4. Run the intent method (validates, raises events)
//!   ↓
//! 5. Append pending events with `ExpectedVersion::Exact(loaded version)`
//! ```
//!
//! Aggregates stay pure; this module composes them with an `EventStore`.
//! A failing intent drops the aggregate together with everything it raised,
//! so nothing is appended.

use std::collections::HashMap;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use uuid::Uuid;

use votebasis_core::{
    Aggregate, AggregateId, DomainError, DomainResult, ErrorKind, ExpectedVersion, TypedId,
};
use votebasis_events::{Event, UpcastError, UpcasterChain};
use votebasis_majority::MajorityElection;
use votebasis_proportional::ProportionalElection;
use votebasis_votes::Vote;

use crate::event_store::{EventStore, EventStoreError, StoredEvent, UncommittedEvent};

#[derive(Debug, Error)]
pub enum DispatchError {
    /// The intent method rejected the command.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Another writer appended to the stream between load and append.
    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    #[error(transparent)]
    Store(EventStoreError),

    /// A stored event does not belong to the aggregate being replayed.
    #[error("unknown event in stream: {0}")]
    UnknownEvent(String),

    /// A stored payload could not be turned into the aggregate's event type.
    #[error("failed to deserialize stored event: {0}")]
    Deserialize(String),

    #[error(transparent)]
    Upcast(#[from] UpcastError),
}

impl From<EventStoreError> for DispatchError {
    fn from(value: EventStoreError) -> Self {
        match value {
            EventStoreError::Concurrency(msg) => DispatchError::Concurrency(msg),
            other => DispatchError::Store(other),
        }
    }
}

impl DispatchError {
    /// Domain error kind, when the intent itself failed.
    pub fn domain_kind(&self) -> Option<ErrorKind> {
        match self {
            DispatchError::Domain(e) => Some(e.kind()),
            _ => None,
        }
    }
}

/// Result of a successful `execute`: the intent's return value plus the
/// committed events.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatched<T> {
    pub outcome: T,
    pub committed: Vec<StoredEvent>,
}

impl<T> Dispatched<T> {
    /// Stream version after the append (unchanged when nothing was raised).
    pub fn version(&self) -> Option<u64> {
        self.committed.last().map(StoredEvent::stream_version)
    }
}

/// Reusable command execution engine for event-sourced aggregates.
///
/// Upcaster chains are registered per aggregate type; streams of types without
/// a chain are deserialized as stored.
#[derive(Debug)]
pub struct CommandDispatcher<S> {
    store: S,
    upcasters: HashMap<&'static str, UpcasterChain>,
}

impl<S> CommandDispatcher<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            upcasters: HashMap::new(),
        }
    }

    /// Dispatcher with the schema migrations of every aggregate that has one.
    pub fn with_domain_upcasters(store: S) -> Self {
        Self::new(store)
            .with_upcasters(Vote::AGGREGATE_TYPE, votebasis_votes::upcasters())
            .with_upcasters(
                ProportionalElection::AGGREGATE_TYPE,
                votebasis_proportional::upcasters(),
            )
            .with_upcasters(
                MajorityElection::AGGREGATE_TYPE,
                votebasis_majority::upcasters(),
            )
    }

    pub fn with_upcasters(mut self, aggregate_type: &'static str, chain: UpcasterChain) -> Self {
        self.upcasters.insert(aggregate_type, chain);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }
}

impl<S> CommandDispatcher<S>
where
    S: EventStore,
{
    /// Rebuild an aggregate from its stream.
    ///
    /// A missing stream yields the empty, not-yet-created aggregate.
    pub fn load<A>(&self, id: A::Id) -> Result<A, DispatchError>
    where
        A: Aggregate,
        A::Event: Event + DeserializeOwned,
    {
        let (aggregate, _) = self.rehydrate::<A>(id)?;
        Ok(aggregate)
    }

    /// Run `intent` against the current state of `id` and append what it raised.
    ///
    /// Concurrent writers are detected by the store: the append expects the
    /// version that was loaded, so a stale decision fails with
    /// `DispatchError::Concurrency` and the caller may reload and retry.
    pub fn execute<A, T, F>(&self, id: A::Id, intent: F) -> Result<Dispatched<T>, DispatchError>
    where
        A: Aggregate,
        A::Event: Event + Serialize + DeserializeOwned,
        F: FnOnce(&mut A) -> DomainResult<T>,
    {
        let aggregate_id = id.aggregate_id();
        let span = tracing::info_span!(
            "dispatch",
            aggregate_type = A::AGGREGATE_TYPE,
            aggregate_id = %aggregate_id
        );
        let _guard = span.enter();

        let (mut aggregate, loaded_version) = self.rehydrate::<A>(id)?;

        let outcome = match intent(&mut aggregate) {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::debug!(kind = ?err.kind(), error = %err, "intent rejected");
                return Err(err.into());
            }
        };

        let pending = aggregate.take_pending();
        if pending.is_empty() {
            tracing::debug!("intent raised no events");
            return Ok(Dispatched {
                outcome,
                committed: vec![],
            });
        }

        let uncommitted = pending
            .iter()
            .map(|raised| {
                UncommittedEvent::from_raised(
                    aggregate_id,
                    A::AGGREGATE_TYPE,
                    Uuid::now_v7(),
                    raised,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        let committed = self
            .store
            .append(uncommitted, ExpectedVersion::Exact(loaded_version))
            .inspect_err(|err| tracing::warn!(error = %err, "append failed"))?;

        tracing::info!(
            events = committed.len(),
            version = committed.last().map(StoredEvent::stream_version),
            "command committed"
        );

        Ok(Dispatched { outcome, committed })
    }

    fn rehydrate<A>(&self, id: A::Id) -> Result<(A, u64), DispatchError>
    where
        A: Aggregate,
        A::Event: Event + DeserializeOwned,
    {
        let aggregate_id = id.aggregate_id();
        let history = self.store.load_stream(aggregate_id)?;
        validate_loaded_stream(aggregate_id, &history)?;

        let chain = self.upcasters.get(A::AGGREGATE_TYPE);
        let mut aggregate = A::empty(id);
        for stored in history.iter() {
            let event = decode::<A>(stored, chain)?;
            aggregate.apply(&event);
        }

        Ok((aggregate, stream_version(&history)))
    }
}

fn decode<A>(stored: &StoredEvent, chain: Option<&UpcasterChain>) -> Result<A::Event, DispatchError>
where
    A: Aggregate,
    A::Event: Event + DeserializeOwned,
{
    if stored.aggregate_type != A::AGGREGATE_TYPE {
        return Err(DispatchError::UnknownEvent(format!(
            "{} #{} belongs to '{}', expected '{}'",
            stored.event_type,
            stored.sequence_number,
            stored.aggregate_type,
            A::AGGREGATE_TYPE
        )));
    }

    let mut payload = stored.payload.clone();
    let version = match chain {
        Some(chain) => chain.upcast(&stored.event_type, stored.event_version, &mut payload)?,
        None => stored.event_version,
    };

    let event: A::Event = serde_json::from_value(payload).map_err(|e| {
        DispatchError::Deserialize(format!(
            "{} #{}: {e}",
            stored.event_type, stored.sequence_number
        ))
    })?;

    if event.event_type() != stored.event_type {
        return Err(DispatchError::UnknownEvent(format!(
            "#{} was stored as {} but decodes as {}",
            stored.sequence_number,
            stored.event_type,
            event.event_type()
        )));
    }
    if version != event.version() {
        return Err(DispatchError::Deserialize(format!(
            "{} #{} is at schema v{version}, current is v{}",
            stored.event_type,
            stored.sequence_number,
            event.version()
        )));
    }

    Ok(event)
}

fn stream_version(stream: &[StoredEvent]) -> u64 {
    stream.last().map(|e| e.sequence_number).unwrap_or(0)
}

fn validate_loaded_stream(
    aggregate_id: AggregateId,
    stream: &[StoredEvent],
) -> Result<(), DispatchError> {
    let mut last = 0u64;
    for (idx, e) in stream.iter().enumerate() {
        if e.aggregate_id != aggregate_id {
            return Err(DispatchError::Store(EventStoreError::InvalidAppend(format!(
                "loaded stream contains wrong aggregate_id at index {idx}"
            ))));
        }
        if e.sequence_number != last + 1 {
            return Err(DispatchError::Store(EventStoreError::InvalidAppend(format!(
                "non-contiguous sequence_number in loaded stream (last={last}, found={})",
                e.sequence_number
            ))));
        }
        last = e.sequence_number;
    }
    Ok(())
}
