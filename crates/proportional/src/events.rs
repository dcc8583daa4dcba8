//! Proportional election events.

use serde::{Deserialize, Serialize};

use votebasis_core::{
    CandidateId, EntityPosition, EventInfo, ListId, ListUnionId, ProportionalElectionId,
    Translations,
};
use votebasis_events::Event;
use votebasis_political_business::EVotingApproval;

use crate::candidate::Candidate;
use crate::election::ProportionalElectionData;
use crate::list::ListData;
use crate::list_union::ListUnion;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProportionalElectionCreated {
    pub election: ProportionalElectionData,
    pub e_voting_approval: EVotingApproval,
    pub event_info: EventInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProportionalElectionUpdated {
    pub election: ProportionalElectionData,
    pub event_info: EventInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProportionalElectionAfterTestingPhaseUpdated {
    pub election_id: ProportionalElectionId,
    pub political_business_number: String,
    pub official_description: Translations,
    pub short_description: Translations,
    pub internal_description: String,
    pub enforce_empty_vote_count_for_counting_circles: bool,
    pub enforce_candidate_check_digit_for_counting_circles: bool,
    pub enforce_review_procedure_for_counting_circles: bool,
    pub event_info: EventInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProportionalElectionActiveStateUpdated {
    pub election_id: ProportionalElectionId,
    pub active: bool,
    pub event_info: EventInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProportionalElectionDeleted {
    pub election_id: ProportionalElectionId,
    pub event_info: EventInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProportionalElectionEVotingApprovalUpdated {
    pub election_id: ProportionalElectionId,
    pub approved: bool,
    pub event_info: EventInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListCreated {
    pub list: ListData,
    pub event_info: EventInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListUpdated {
    pub list: ListData,
    pub event_info: EventInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListAfterTestingPhaseUpdated {
    pub list_id: ListId,
    pub description: Translations,
    pub short_description: Translations,
    pub event_info: EventInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListsReordered {
    pub positions: Vec<EntityPosition<ListId>>,
    pub event_info: EventInfo,
}

/// Also drops the list from every union and removes unions it was the main list of.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListDeleted {
    pub list_id: ListId,
    pub event_info: EventInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateCreated {
    pub candidate: Candidate,
    pub event_info: EventInfo,
}

/// Removing an accumulation frees its slot; later slots move up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateUpdated {
    pub candidate: Candidate,
    pub event_info: EventInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateAfterTestingPhaseUpdated {
    pub candidate: Candidate,
    pub event_info: EventInfo,
}

/// Accumulated candidates appear twice in `slots`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidatesReordered {
    pub list_id: ListId,
    pub slots: Vec<EntityPosition<CandidateId>>,
    pub event_info: EventInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateDeleted {
    pub list_id: ListId,
    pub candidate_id: CandidateId,
    pub event_info: EventInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListUnionCreated {
    pub list_union: ListUnion,
    pub event_info: EventInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListUnionUpdated {
    pub list_union: ListUnion,
    pub event_info: EventInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListUnionEntriesUpdated {
    pub list_union_id: ListUnionId,
    pub list_ids: Vec<ListId>,
    pub event_info: EventInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListUnionMainListUpdated {
    pub list_union_id: ListUnionId,
    pub main_list_id: Option<ListId>,
    pub event_info: EventInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListUnionsReordered {
    pub root_list_union_id: Option<ListUnionId>,
    pub positions: Vec<EntityPosition<ListUnionId>>,
    pub event_info: EventInfo,
}

/// Removes the union and, for a root union, its sub-unions. Siblings keep their positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListUnionDeleted {
    pub list_union_id: ListUnionId,
    pub event_info: EventInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ProportionalElectionEvent {
    ProportionalElectionCreated(ProportionalElectionCreated),
    ProportionalElectionUpdated(ProportionalElectionUpdated),
    ProportionalElectionAfterTestingPhaseUpdated(ProportionalElectionAfterTestingPhaseUpdated),
    ProportionalElectionActiveStateUpdated(ProportionalElectionActiveStateUpdated),
    ProportionalElectionDeleted(ProportionalElectionDeleted),
    ProportionalElectionEVotingApprovalUpdated(ProportionalElectionEVotingApprovalUpdated),
    ListCreated(ListCreated),
    ListUpdated(ListUpdated),
    ListAfterTestingPhaseUpdated(ListAfterTestingPhaseUpdated),
    ListsReordered(ListsReordered),
    ListDeleted(ListDeleted),
    CandidateCreated(CandidateCreated),
    CandidateUpdated(CandidateUpdated),
    CandidateAfterTestingPhaseUpdated(CandidateAfterTestingPhaseUpdated),
    CandidatesReordered(CandidatesReordered),
    CandidateDeleted(CandidateDeleted),
    ListUnionCreated(ListUnionCreated),
    ListUnionUpdated(ListUnionUpdated),
    ListUnionEntriesUpdated(ListUnionEntriesUpdated),
    ListUnionMainListUpdated(ListUnionMainListUpdated),
    ListUnionsReordered(ListUnionsReordered),
    ListUnionDeleted(ListUnionDeleted),
}

impl Event for ProportionalElectionEvent {
    fn event_type(&self) -> &'static str {
        use ProportionalElectionEvent as E;

        match self {
            E::ProportionalElectionCreated(_) => "proportional_election.created",
            E::ProportionalElectionUpdated(_) => "proportional_election.updated",
            E::ProportionalElectionAfterTestingPhaseUpdated(_) => {
                "proportional_election.after_testing_phase_updated"
            }
            E::ProportionalElectionActiveStateUpdated(_) => {
                "proportional_election.active_state_updated"
            }
            E::ProportionalElectionDeleted(_) => "proportional_election.deleted",
            E::ProportionalElectionEVotingApprovalUpdated(_) => {
                "proportional_election.e_voting_approval_updated"
            }
            E::ListCreated(_) => "proportional_election.list_created",
            E::ListUpdated(_) => "proportional_election.list_updated",
            E::ListAfterTestingPhaseUpdated(_) => {
                "proportional_election.list_after_testing_phase_updated"
            }
            E::ListsReordered(_) => "proportional_election.lists_reordered",
            E::ListDeleted(_) => "proportional_election.list_deleted",
            E::CandidateCreated(_) => "proportional_election.candidate_created",
            E::CandidateUpdated(_) => "proportional_election.candidate_updated",
            E::CandidateAfterTestingPhaseUpdated(_) => {
                "proportional_election.candidate_after_testing_phase_updated"
            }
            E::CandidatesReordered(_) => "proportional_election.candidates_reordered",
            E::CandidateDeleted(_) => "proportional_election.candidate_deleted",
            E::ListUnionCreated(_) => "proportional_election.list_union_created",
            E::ListUnionUpdated(_) => "proportional_election.list_union_updated",
            E::ListUnionEntriesUpdated(_) => "proportional_election.list_union_entries_updated",
            E::ListUnionMainListUpdated(_) => {
                "proportional_election.list_union_main_list_updated"
            }
            E::ListUnionsReordered(_) => "proportional_election.list_unions_reordered",
            E::ListUnionDeleted(_) => "proportional_election.list_union_deleted",
        }
    }

    fn version(&self) -> u32 {
        match self {
            // v2 added `mandate_algorithm`.
            ProportionalElectionEvent::ProportionalElectionCreated(_)
            | ProportionalElectionEvent::ProportionalElectionUpdated(_) => 2,
            _ => 1,
        }
    }

    fn event_info(&self) -> &EventInfo {
        use ProportionalElectionEvent as E;

        match self {
            E::ProportionalElectionCreated(e) => &e.event_info,
            E::ProportionalElectionUpdated(e) => &e.event_info,
            E::ProportionalElectionAfterTestingPhaseUpdated(e) => &e.event_info,
            E::ProportionalElectionActiveStateUpdated(e) => &e.event_info,
            E::ProportionalElectionDeleted(e) => &e.event_info,
            E::ProportionalElectionEVotingApprovalUpdated(e) => &e.event_info,
            E::ListCreated(e) => &e.event_info,
            E::ListUpdated(e) => &e.event_info,
            E::ListAfterTestingPhaseUpdated(e) => &e.event_info,
            E::ListsReordered(e) => &e.event_info,
            E::ListDeleted(e) => &e.event_info,
            E::CandidateCreated(e) => &e.event_info,
            E::CandidateUpdated(e) => &e.event_info,
            E::CandidateAfterTestingPhaseUpdated(e) => &e.event_info,
            E::CandidatesReordered(e) => &e.event_info,
            E::CandidateDeleted(e) => &e.event_info,
            E::ListUnionCreated(e) => &e.event_info,
            E::ListUnionUpdated(e) => &e.event_info,
            E::ListUnionEntriesUpdated(e) => &e.event_info,
            E::ListUnionMainListUpdated(e) => &e.event_info,
            E::ListUnionsReordered(e) => &e.event_info,
            E::ListUnionDeleted(e) => &e.event_info,
        }
    }
}
