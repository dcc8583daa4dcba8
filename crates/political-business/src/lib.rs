//! Rules shared by every political business (votes, elections and their unions).
//!
//! - **Testing phase gates**: early updates only while the owning contest is in
//!   its testing phase, late updates only afterwards, nothing once it is locked.
//! - **E-voting approval**: an orthogonal flag that freezes structure once set.
//! - **Unions**: a generic aggregate grouping elections of one kind.

pub mod approval;
pub mod person;
pub mod testing_phase;
pub mod union;

pub use approval::{ApprovalOutcome, EVotingApproval};
pub use person::{CandidatePerson, SexType};
pub use testing_phase::{
    ensure_contest_unlocked, ensure_in_testing_phase, ensure_testing_phase_ended,
    ensure_unchanged,
};
pub use union::{
    MajorityElectionUnion, MajorityElectionUnionKind, PoliticalBusinessUnion,
    ProportionalElectionUnion, ProportionalElectionUnionKind, UnionCreated, UnionDeleted,
    UnionEntriesUpdated, UnionEvent, UnionKind, UnionUpdated,
};

use votebasis_core::{ContestId, DomainOfInfluenceId};

/// Common read surface of votes and elections.
pub trait PoliticalBusiness {
    fn contest_id(&self) -> Option<ContestId>;

    fn domain_of_influence_id(&self) -> Option<DomainOfInfluenceId>;

    fn political_business_number(&self) -> &str;

    fn is_active(&self) -> bool;

    fn e_voting_approval(&self) -> EVotingApproval;
}
