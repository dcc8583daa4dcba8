//! Contest domain module (event-sourced).
//!
//! A contest owns the lifecycle state machine that gates mutation of every
//! political business held on its date.

pub mod contest;

pub use contest::{
    Contest, ContestArchiveDateUpdated, ContestArchived, ContestCreated, ContestData,
    ContestDeleted, ContestEvent, ContestInput, ContestPastLocked, ContestPastUnlocked,
    ContestState, ContestTestingPhaseEnded, ContestUpdated, ContestsMerged, Transition,
};
