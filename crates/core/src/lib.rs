//! Domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! the event-sourced aggregate contract, identifiers, errors, the clock seam and
//! the diff-synchronization algorithm for nested collections.

pub mod aggregate;
pub mod clock;
pub mod collection_sync;
pub mod entity;
pub mod error;
pub mod id;
pub mod metadata;
pub mod position;
pub mod value_object;

pub use aggregate::{
    Aggregate, AggregateRoot, ExpectedVersion, PendingEvents, RaisedEvent, SoftDelete,
};
pub use clock::{Clock, CommandContext, EventInfo, FixedClock, SystemClock};
pub use collection_sync::{Draft, SyncChange, SyncPlan};
pub use entity::Entity;
pub use error::{DomainError, DomainResult, ErrorKind};
pub use id::*;
pub use metadata::EventSignatureBusinessMetadata;
pub use position::{EntityPosition, ensure_continuous, ensure_valid_reorder};
pub use value_object::{Translations, ValueObject};
