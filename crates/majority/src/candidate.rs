//! Candidates of the primary majority election.

use serde::{Deserialize, Serialize};

use votebasis_contest::ContestState;
use votebasis_core::{
    Aggregate, CandidateId, CommandContext, DomainError, DomainResult, Entity, EntityPosition,
    Translations, ensure_valid_reorder,
};
use votebasis_political_business::{CandidatePerson, ensure_unchanged};

use crate::election::MajorityElection;
use crate::events::*;

/// Nested entity: primary candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MajorityCandidate {
    pub id: CandidateId,
    pub number: String,
    pub position: u32,
    pub person: CandidatePerson,
    pub party: Translations,
}

impl Entity for MajorityCandidate {
    type Id = CandidateId;

    fn id(&self) -> &CandidateId {
        &self.id
    }
}

/// Caller-supplied candidate fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MajorityCandidateInput {
    pub number: String,
    pub position: u32,
    pub person: CandidatePerson,
    pub party: Translations,
}

impl MajorityCandidateInput {
    fn into_candidate(self, id: CandidateId) -> MajorityCandidate {
        MajorityCandidate {
            id,
            number: self.number,
            position: self.position,
            person: self.person,
            party: self.party,
        }
    }
}

impl MajorityElection {
    fn validate_candidate(&self, id: CandidateId, input: &MajorityCandidateInput) -> DomainResult<()> {
        if input.number.trim().is_empty() {
            return Err(DomainError::validation("candidate number cannot be empty"));
        }
        if self
            .candidates
            .values()
            .any(|c| c.id != id && c.number == input.number)
        {
            return Err(DomainError::validation(format!(
                "candidate number {} is already taken",
                input.number
            )));
        }
        input.person.validate()
    }

    /// Deleting or changing a candidate must not touch an approved secondary election.
    fn ensure_references_modifiable(&self, candidate_id: CandidateId) -> DomainResult<()> {
        for secondary in self.secondary_elections.values() {
            if secondary.references(candidate_id) {
                secondary
                    .e_voting_approval
                    .ensure_not_approved("secondary majority election")?;
            }
        }
        Ok(())
    }

    pub fn create_candidate(
        &mut self,
        candidate_id: CandidateId,
        input: MajorityCandidateInput,
        contest_state: ContestState,
        ctx: &CommandContext,
    ) -> DomainResult<()> {
        self.ensure_modifiable(contest_state)?;

        if self.candidates.contains_key(&candidate_id) {
            return Err(DomainError::conflict(format!(
                "candidate {candidate_id} already exists"
            )));
        }
        let expected = self.candidates.len() as u32 + 1;
        if input.position != expected {
            return Err(DomainError::validation(format!(
                "candidate position must be {expected}"
            )));
        }
        self.validate_candidate(candidate_id, &input)?;

        self.raise(
            MajorityElectionEvent::CandidateCreated(CandidateCreated {
                candidate: input.into_candidate(candidate_id),
                event_info: ctx.event_info(),
            }),
            self.metadata(),
        );
        Ok(())
    }

    /// Position only changes through [`reorder_candidates`](Self::reorder_candidates).
    pub fn update_candidate(
        &mut self,
        candidate_id: CandidateId,
        input: MajorityCandidateInput,
        contest_state: ContestState,
        ctx: &CommandContext,
    ) -> DomainResult<()> {
        self.ensure_modifiable(contest_state)?;
        self.ensure_references_modifiable(candidate_id)?;

        let current = self.candidate(candidate_id)?;
        if input.position != current.position {
            return Err(DomainError::validation(
                "candidate position cannot change, reorder the candidates instead",
            ));
        }
        self.validate_candidate(candidate_id, &input)?;

        self.raise(
            MajorityElectionEvent::CandidateUpdated(CandidateUpdated {
                candidate: input.into_candidate(candidate_id),
                event_info: ctx.event_info(),
            }),
            self.metadata(),
        );
        Ok(())
    }

    /// Accepts personal data and party only.
    pub fn update_candidate_after_testing_phase_ended(
        &mut self,
        candidate_id: CandidateId,
        input: MajorityCandidateInput,
        contest_state: ContestState,
        ctx: &CommandContext,
    ) -> DomainResult<()> {
        self.ensure_late_modifiable(contest_state)?;
        self.ensure_references_modifiable(candidate_id)?;

        let current = self.candidate(candidate_id)?;
        ensure_unchanged("number", &current.number, &input.number)?;
        ensure_unchanged("position", &current.position, &input.position)?;
        input.person.validate()?;

        self.raise(
            MajorityElectionEvent::CandidateAfterTestingPhaseUpdated(
                CandidateAfterTestingPhaseUpdated {
                    candidate: input.into_candidate(candidate_id),
                    event_info: ctx.event_info(),
                },
            ),
            self.metadata(),
        );
        Ok(())
    }

    pub fn reorder_candidates(
        &mut self,
        positions: Vec<EntityPosition<CandidateId>>,
        contest_state: ContestState,
        ctx: &CommandContext,
    ) -> DomainResult<()> {
        self.ensure_modifiable(contest_state)?;
        ensure_valid_reorder(self.candidates.keys().copied(), &positions)?;

        self.raise(
            MajorityElectionEvent::CandidatesReordered(CandidatesReordered {
                positions,
                event_info: ctx.event_info(),
            }),
            self.metadata(),
        );
        Ok(())
    }

    /// Remove a candidate together with its references in secondary elections.
    ///
    /// A candidate placed in a ballot group must be removed from the group first.
    pub fn delete_candidate(
        &mut self,
        candidate_id: CandidateId,
        contest_state: ContestState,
        ctx: &CommandContext,
    ) -> DomainResult<()> {
        self.ensure_modifiable(contest_state)?;
        self.candidate(candidate_id)?;
        self.ensure_references_modifiable(candidate_id)?;

        if self.is_in_ballot_group(candidate_id) {
            return Err(DomainError::validation(format!(
                "candidate {candidate_id} is part of a ballot group"
            )));
        }
        let referenced_in_group = self
            .secondary_elections
            .values()
            .flat_map(|s| s.candidates.values())
            .filter(|c| c.referenced_candidate_id == Some(candidate_id))
            .any(|c| self.is_in_ballot_group(c.id));
        if referenced_in_group {
            return Err(DomainError::validation(format!(
                "a reference to candidate {candidate_id} is part of a ballot group"
            )));
        }

        self.raise(
            MajorityElectionEvent::CandidateDeleted(CandidateDeleted {
                candidate_id,
                event_info: ctx.event_info(),
            }),
            self.metadata(),
        );
        Ok(())
    }
}
