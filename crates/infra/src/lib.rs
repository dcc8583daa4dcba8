//! Infrastructure layer: event store, command dispatch, scheduled jobs, config.

pub mod command_dispatcher;
pub mod config;
pub mod event_store;
pub mod lifecycle;


pub use command_dispatcher::{CommandDispatcher, DispatchError, Dispatched};
pub use config::InfraConfig;
pub use event_store::{EventStore, EventStoreError, InMemoryEventStore, StoredEvent, UncommittedEvent};
pub use lifecycle::{ContestLifecycleJob, LifecycleReport};
