//! Majority election domain module (event-sourced).
//!
//! A majority election owns its candidates, secondary elections (with their own
//! candidates and references to primary candidates) and ballot groups.

pub mod ballot_group;
pub mod candidate;
pub mod election;
pub mod events;
pub mod secondary;
pub mod upcast;


pub use ballot_group::{
    BallotGroup, BallotGroupEntry, BallotGroupEntryAssignment, BallotGroupEntryCandidates,
    BallotGroupEntryInput, BallotGroupInput, EntryElection,
};
pub use candidate::{MajorityCandidate, MajorityCandidateInput};
pub use election::{
    MajorityElection, MajorityElectionData, MajorityElectionInput,
    MajorityElectionMandateAlgorithm, MajorityElectionResultEntry,
};
pub use events::*;
pub use secondary::{
    CandidateReferenceInput, SecondaryCandidate, SecondaryCandidateInput,
    SecondaryMajorityElection, SecondaryMajorityElectionData, SecondaryMajorityElectionInput,
};
pub use upcast::upcasters;
pub use votebasis_political_business::MajorityElectionUnion;
