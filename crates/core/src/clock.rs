//! Time source and per-command provenance.

use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::id::UserId;

/// Source of "now" for every "is it time yet" decision.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Default, Copy, Clone)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for tests and replays.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(now) }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        if let Ok(mut guard) = self.now.lock() {
            *guard = now;
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut guard) = self.now.lock() {
            *guard += by;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        match self.now.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// Provenance carried by every event: who did it and when.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventInfo {
    pub occurred_at: DateTime<Utc>,
    pub author: UserId,
}

/// Everything an intent method needs from its environment.
///
/// The timestamp is captured once, so all events raised by one command share it
/// and all time checks inside that command agree.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CommandContext {
    actor: UserId,
    now: DateTime<Utc>,
}

impl CommandContext {
    pub fn new(actor: UserId, clock: &dyn Clock) -> Self {
        Self {
            actor,
            now: clock.now(),
        }
    }

    pub fn at(actor: UserId, now: DateTime<Utc>) -> Self {
        Self { actor, now }
    }

    pub fn actor(&self) -> UserId {
        self.actor
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn event_info(&self) -> EventInfo {
        EventInfo {
            occurred_at: self.now,
            author: self.actor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn fixed_clock_advances() {
        let start = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        let clock = FixedClock::new(start);
        clock.advance(Duration::hours(3));
        assert_eq!(clock.now(), start + Duration::hours(3));
    }

    #[test]
    fn context_captures_time_once() {
        let start = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        let clock = FixedClock::new(start);
        let ctx = CommandContext::new(UserId::new(), &clock);
        clock.advance(Duration::days(1));
        assert_eq!(ctx.now(), start);
        assert_eq!(ctx.event_info().occurred_at, start);
    }
}
