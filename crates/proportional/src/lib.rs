//! Proportional election domain module (event-sourced).
//!
//! An election owns ordered lists, each list its ordered candidates. List unions
//! group lists for the mandate distribution and may have one level of sub-unions.
//! Unions spanning several elections live in `votebasis-political-business`.

pub mod candidate;
pub mod check_digit;
pub mod election;
pub mod events;
pub mod list;
pub mod list_union;
pub mod upcast;

#[cfg(test)]
mod tests;

pub use candidate::{Candidate, CandidateInput};
pub use check_digit::{candidate_check_digit, check_digit};
pub use election::{
    MandateAlgorithm, ProportionalElection, ProportionalElectionData, ProportionalElectionInput,
};
pub use events::*;
pub use list::{List, ListData, ListInput};
pub use list_union::{ListUnion, ListUnionInput, SubListUnionDraft};
pub use upcast::upcasters;
pub use votebasis_political_business::ProportionalElectionUnion;
