//! Majority election events.

use serde::{Deserialize, Serialize};

use votebasis_core::{
    BallotGroupId, CandidateId, EntityPosition, EventInfo, MajorityElectionId,
    SecondaryMajorityElectionId, Translations,
};
use votebasis_events::Event;
use votebasis_political_business::EVotingApproval;

use crate::ballot_group::{BallotGroup, BallotGroupEntryAssignment, BallotGroupEntryCandidates};
use crate::candidate::MajorityCandidate;
use crate::election::MajorityElectionData;
use crate::secondary::{SecondaryCandidate, SecondaryMajorityElectionData};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MajorityElectionCreated {
    pub election: MajorityElectionData,
    pub e_voting_approval: EVotingApproval,
    pub event_info: EventInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MajorityElectionUpdated {
    pub election: MajorityElectionData,
    pub event_info: EventInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MajorityElectionAfterTestingPhaseUpdated {
    pub election_id: MajorityElectionId,
    pub political_business_number: String,
    pub official_description: Translations,
    pub short_description: Translations,
    pub internal_description: String,
    pub enforce_empty_vote_count_for_counting_circles: bool,
    pub enforce_result_entry_for_counting_circles: bool,
    pub event_info: EventInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MajorityElectionActiveStateUpdated {
    pub election_id: MajorityElectionId,
    pub active: bool,
    pub event_info: EventInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MajorityElectionDeleted {
    pub election_id: MajorityElectionId,
    pub event_info: EventInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MajorityElectionEVotingApprovalUpdated {
    pub election_id: MajorityElectionId,
    pub approved: bool,
    pub event_info: EventInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateCreated {
    pub candidate: MajorityCandidate,
    pub event_info: EventInfo,
}

/// Candidate references in secondary elections pick up the new personal data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateUpdated {
    pub candidate: MajorityCandidate,
    pub event_info: EventInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateAfterTestingPhaseUpdated {
    pub candidate: MajorityCandidate,
    pub event_info: EventInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidatesReordered {
    pub positions: Vec<EntityPosition<CandidateId>>,
    pub event_info: EventInfo,
}

/// Also removes every candidate reference to it and purges all removed ids
/// from ballot group entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateDeleted {
    pub candidate_id: CandidateId,
    pub event_info: EventInfo,
}

/// `ballot_group_entries` are the empty entries added for a co-ballot secondary election.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondaryElectionCreated {
    pub secondary_election: SecondaryMajorityElectionData,
    pub e_voting_approval: EVotingApproval,
    pub ballot_group_entries: Vec<BallotGroupEntryAssignment>,
    pub event_info: EventInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondaryElectionUpdated {
    pub secondary_election: SecondaryMajorityElectionData,
    pub event_info: EventInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondaryElectionAfterTestingPhaseUpdated {
    pub secondary_election_id: SecondaryMajorityElectionId,
    pub political_business_number: String,
    pub official_description: Translations,
    pub short_description: Translations,
    pub event_info: EventInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondaryElectionActiveStateUpdated {
    pub secondary_election_id: SecondaryMajorityElectionId,
    pub active: bool,
    pub event_info: EventInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondaryElectionEVotingApprovalUpdated {
    pub secondary_election_id: SecondaryMajorityElectionId,
    pub approved: bool,
    pub event_info: EventInfo,
}

/// Removes the secondary election's ballot group entries; later secondaries move up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondaryElectionDeleted {
    pub secondary_election_id: SecondaryMajorityElectionId,
    pub event_info: EventInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondaryCandidateCreated {
    pub secondary_election_id: SecondaryMajorityElectionId,
    pub candidate: SecondaryCandidate,
    pub event_info: EventInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondaryCandidateUpdated {
    pub secondary_election_id: SecondaryMajorityElectionId,
    pub candidate: SecondaryCandidate,
    pub event_info: EventInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateReferenceCreated {
    pub secondary_election_id: SecondaryMajorityElectionId,
    pub candidate: SecondaryCandidate,
    pub event_info: EventInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateReferenceUpdated {
    pub secondary_election_id: SecondaryMajorityElectionId,
    pub candidate: SecondaryCandidate,
    pub event_info: EventInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondaryCandidatesReordered {
    pub secondary_election_id: SecondaryMajorityElectionId,
    pub positions: Vec<EntityPosition<CandidateId>>,
    pub event_info: EventInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondaryCandidateDeleted {
    pub secondary_election_id: SecondaryMajorityElectionId,
    pub candidate_id: CandidateId,
    pub event_info: EventInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotGroupCreated {
    pub ballot_group: BallotGroup,
    pub event_info: EventInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotGroupUpdated {
    pub ballot_group: BallotGroup,
    pub event_info: EventInfo,
}

/// Only the listed entries change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotGroupCandidatesUpdated {
    pub ballot_group_id: BallotGroupId,
    pub entries: Vec<BallotGroupEntryCandidates>,
    pub event_info: EventInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotGroupDeleted {
    pub ballot_group_id: BallotGroupId,
    pub event_info: EventInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum MajorityElectionEvent {
    MajorityElectionCreated(MajorityElectionCreated),
    MajorityElectionUpdated(MajorityElectionUpdated),
    MajorityElectionAfterTestingPhaseUpdated(MajorityElectionAfterTestingPhaseUpdated),
    MajorityElectionActiveStateUpdated(MajorityElectionActiveStateUpdated),
    MajorityElectionDeleted(MajorityElectionDeleted),
    MajorityElectionEVotingApprovalUpdated(MajorityElectionEVotingApprovalUpdated),
    CandidateCreated(CandidateCreated),
    CandidateUpdated(CandidateUpdated),
    CandidateAfterTestingPhaseUpdated(CandidateAfterTestingPhaseUpdated),
    CandidatesReordered(CandidatesReordered),
    CandidateDeleted(CandidateDeleted),
    SecondaryElectionCreated(SecondaryElectionCreated),
    SecondaryElectionUpdated(SecondaryElectionUpdated),
    SecondaryElectionAfterTestingPhaseUpdated(SecondaryElectionAfterTestingPhaseUpdated),
    SecondaryElectionActiveStateUpdated(SecondaryElectionActiveStateUpdated),
    SecondaryElectionEVotingApprovalUpdated(SecondaryElectionEVotingApprovalUpdated),
    SecondaryElectionDeleted(SecondaryElectionDeleted),
    SecondaryCandidateCreated(SecondaryCandidateCreated),
    SecondaryCandidateUpdated(SecondaryCandidateUpdated),
    CandidateReferenceCreated(CandidateReferenceCreated),
    CandidateReferenceUpdated(CandidateReferenceUpdated),
    SecondaryCandidatesReordered(SecondaryCandidatesReordered),
    SecondaryCandidateDeleted(SecondaryCandidateDeleted),
    BallotGroupCreated(BallotGroupCreated),
    BallotGroupUpdated(BallotGroupUpdated),
    BallotGroupCandidatesUpdated(BallotGroupCandidatesUpdated),
    BallotGroupDeleted(BallotGroupDeleted),
}

impl Event for MajorityElectionEvent {
    fn event_type(&self) -> &'static str {
        use MajorityElectionEvent as E;

        match self {
            E::MajorityElectionCreated(_) => "majority_election.created",
            E::MajorityElectionUpdated(_) => "majority_election.updated",
            E::MajorityElectionAfterTestingPhaseUpdated(_) => {
                "majority_election.after_testing_phase_updated"
            }
            E::MajorityElectionActiveStateUpdated(_) => "majority_election.active_state_updated",
            E::MajorityElectionDeleted(_) => "majority_election.deleted",
            E::MajorityElectionEVotingApprovalUpdated(_) => {
                "majority_election.e_voting_approval_updated"
            }
            E::CandidateCreated(_) => "majority_election.candidate_created",
            E::CandidateUpdated(_) => "majority_election.candidate_updated",
            E::CandidateAfterTestingPhaseUpdated(_) => {
                "majority_election.candidate_after_testing_phase_updated"
            }
            E::CandidatesReordered(_) => "majority_election.candidates_reordered",
            E::CandidateDeleted(_) => "majority_election.candidate_deleted",
            E::SecondaryElectionCreated(_) => "majority_election.secondary_election_created",
            E::SecondaryElectionUpdated(_) => "majority_election.secondary_election_updated",
            E::SecondaryElectionAfterTestingPhaseUpdated(_) => {
                "majority_election.secondary_election_after_testing_phase_updated"
            }
            E::SecondaryElectionActiveStateUpdated(_) => {
                "majority_election.secondary_election_active_state_updated"
            }
            E::SecondaryElectionEVotingApprovalUpdated(_) => {
                "majority_election.secondary_election_e_voting_approval_updated"
            }
            E::SecondaryElectionDeleted(_) => "majority_election.secondary_election_deleted",
            E::SecondaryCandidateCreated(_) => "majority_election.secondary_candidate_created",
            E::SecondaryCandidateUpdated(_) => "majority_election.secondary_candidate_updated",
            E::CandidateReferenceCreated(_) => "majority_election.candidate_reference_created",
            E::CandidateReferenceUpdated(_) => "majority_election.candidate_reference_updated",
            E::SecondaryCandidatesReordered(_) => {
                "majority_election.secondary_candidates_reordered"
            }
            E::SecondaryCandidateDeleted(_) => "majority_election.secondary_candidate_deleted",
            E::BallotGroupCreated(_) => "majority_election.ballot_group_created",
            E::BallotGroupUpdated(_) => "majority_election.ballot_group_updated",
            E::BallotGroupCandidatesUpdated(_) => {
                "majority_election.ballot_group_candidates_updated"
            }
            E::BallotGroupDeleted(_) => "majority_election.ballot_group_deleted",
        }
    }

    fn version(&self) -> u32 {
        match self {
            // v2 added `result_entry`.
            MajorityElectionEvent::MajorityElectionCreated(_)
            | MajorityElectionEvent::MajorityElectionUpdated(_) => 2,
            _ => 1,
        }
    }

    fn event_info(&self) -> &EventInfo {
        use MajorityElectionEvent as E;

        match self {
            E::MajorityElectionCreated(e) => &e.event_info,
            E::MajorityElectionUpdated(e) => &e.event_info,
            E::MajorityElectionAfterTestingPhaseUpdated(e) => &e.event_info,
            E::MajorityElectionActiveStateUpdated(e) => &e.event_info,
            E::MajorityElectionDeleted(e) => &e.event_info,
            E::MajorityElectionEVotingApprovalUpdated(e) => &e.event_info,
            E::CandidateCreated(e) => &e.event_info,
            E::CandidateUpdated(e) => &e.event_info,
            E::CandidateAfterTestingPhaseUpdated(e) => &e.event_info,
            E::CandidatesReordered(e) => &e.event_info,
            E::CandidateDeleted(e) => &e.event_info,
            E::SecondaryElectionCreated(e) => &e.event_info,
            E::SecondaryElectionUpdated(e) => &e.event_info,
            E::SecondaryElectionAfterTestingPhaseUpdated(e) => &e.event_info,
            E::SecondaryElectionActiveStateUpdated(e) => &e.event_info,
            E::SecondaryElectionEVotingApprovalUpdated(e) => &e.event_info,
            E::SecondaryElectionDeleted(e) => &e.event_info,
            E::SecondaryCandidateCreated(e) => &e.event_info,
            E::SecondaryCandidateUpdated(e) => &e.event_info,
            E::CandidateReferenceCreated(e) => &e.event_info,
            E::CandidateReferenceUpdated(e) => &e.event_info,
            E::SecondaryCandidatesReordered(e) => &e.event_info,
            E::SecondaryCandidateDeleted(e) => &e.event_info,
            E::BallotGroupCreated(e) => &e.event_info,
            E::BallotGroupUpdated(e) => &e.event_info,
            E::BallotGroupCandidatesUpdated(e) => &e.event_info,
            E::BallotGroupDeleted(e) => &e.event_info,
        }
    }
}
