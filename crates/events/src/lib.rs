//! Event contract, envelopes and schema upcasting.

pub mod envelope;
pub mod event;
pub mod upcast;

pub use envelope::EventEnvelope;
pub use event::Event;
pub use upcast::{DefaultField, UpcastError, Upcaster, UpcasterChain};
