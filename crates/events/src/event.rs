use chrono::{DateTime, Utc};

use votebasis_core::EventInfo;

/// A domain event.
///
/// Events are:
/// - **immutable** (treat them as facts)
/// - **versioned** (schema evolution, see [`crate::upcast`])
/// - designed to be **append-only**
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable event name/type identifier (e.g. "contest.created").
    fn event_type(&self) -> &'static str;

    /// Schema version of this event type as currently written.
    fn version(&self) -> u32;

    /// Who raised the event and when.
    fn event_info(&self) -> &EventInfo;

    /// When the event occurred (business time).
    fn occurred_at(&self) -> DateTime<Utc> {
        self.event_info().occurred_at
    }
}
