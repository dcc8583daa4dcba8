//! Candidates on proportional election lists.
//!
//! Every candidate occupies one slot of its list, an accumulated candidate two
//! (`position` and `accumulated_position`). The slots of a list are always
//! `1..=n`; candidates and blank rows together never exceed the number of
//! mandates.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use votebasis_contest::ContestState;
use votebasis_core::{
    Aggregate, CandidateId, CommandContext, DomainError, DomainResult, Entity, EntityPosition,
    ListId, PartyId, ensure_continuous,
};
use votebasis_political_business::{CandidatePerson, ensure_unchanged};

use crate::election::ProportionalElection;
use crate::events::*;

/// Nested entity: Candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub list_id: ListId,
    pub number: String,
    pub position: u32,
    pub accumulated: bool,
    /// Second slot of an accumulated candidate, `0` otherwise.
    pub accumulated_position: u32,
    pub person: CandidatePerson,
    pub party_id: Option<PartyId>,
    /// `0` unless the election uses candidate check digits.
    pub check_digit: u32,
}

impl Entity for Candidate {
    type Id = CandidateId;

    fn id(&self) -> &CandidateId {
        &self.id
    }
}

impl Candidate {
    pub fn slots(&self) -> Vec<u32> {
        if self.accumulated {
            vec![self.position, self.accumulated_position]
        } else {
            vec![self.position]
        }
    }

    pub fn slot_count(&self) -> u32 {
        if self.accumulated { 2 } else { 1 }
    }
}

/// Caller-supplied candidate fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateInput {
    pub number: String,
    pub position: u32,
    pub accumulated: bool,
    pub accumulated_position: u32,
    pub person: CandidatePerson,
    pub party_id: Option<PartyId>,
}

impl ProportionalElection {
    fn validate_candidate_number(
        &self,
        list_id: ListId,
        candidate_id: CandidateId,
        number: &str,
    ) -> DomainResult<()> {
        if number.trim().is_empty() {
            return Err(DomainError::validation("candidate number cannot be empty"));
        }
        let list = self.list(list_id)?;
        if list
            .candidates
            .values()
            .any(|c| c.id != candidate_id && c.number == number)
        {
            return Err(DomainError::validation(format!(
                "candidate number {number} is already taken on list {}",
                list.order_number
            )));
        }
        self.ensure_numeric_if_check_digit("candidate number", number)
    }

    fn ensure_capacity(&self, list_id: ListId, additional_slots: u32) -> DomainResult<()> {
        let list = self.list(list_id)?;
        if list.occupied_slots() + additional_slots + list.blank_row_count
            > self.number_of_mandates()
        {
            return Err(DomainError::validation(format!(
                "list {} has no free place left",
                list.order_number
            )));
        }
        Ok(())
    }

    fn build_candidate(
        &self,
        list_id: ListId,
        candidate_id: CandidateId,
        input: CandidateInput,
    ) -> DomainResult<Candidate> {
        let list = self.list(list_id)?;
        let check_digit = self.check_digit_for(list, &input.number)?;
        Ok(Candidate {
            id: candidate_id,
            list_id,
            number: input.number,
            position: input.position,
            accumulated: input.accumulated,
            accumulated_position: if input.accumulated {
                input.accumulated_position
            } else {
                0
            },
            person: input.person,
            party_id: input.party_id,
            check_digit,
        })
    }

    /// Add a candidate behind the occupied slots of its list.
    pub fn create_candidate(
        &mut self,
        list_id: ListId,
        candidate_id: CandidateId,
        input: CandidateInput,
        contest_state: ContestState,
        ctx: &CommandContext,
    ) -> DomainResult<()> {
        self.ensure_modifiable(contest_state)?;

        if self.find_candidate(candidate_id).is_some() {
            return Err(DomainError::conflict(format!(
                "candidate {candidate_id} already exists"
            )));
        }
        let next = self.list(list_id)?.occupied_slots() + 1;
        if input.position != next {
            return Err(DomainError::validation(format!(
                "candidate position must be {next}"
            )));
        }
        if input.accumulated && input.accumulated_position != next + 1 {
            return Err(DomainError::validation(format!(
                "accumulated position must be {}",
                next + 1
            )));
        }
        input.person.validate()?;
        self.validate_candidate_number(list_id, candidate_id, &input.number)?;
        self.ensure_capacity(list_id, if input.accumulated { 2 } else { 1 })?;

        let candidate = self.build_candidate(list_id, candidate_id, input)?;
        self.raise(
            ProportionalElectionEvent::CandidateCreated(CandidateCreated {
                candidate,
                event_info: ctx.event_info(),
            }),
            self.metadata(),
        );
        Ok(())
    }

    /// Update a candidate in place.
    ///
    /// Positions only change through [`reorder_candidates`](Self::reorder_candidates).
    /// A new accumulation takes the next free slot; dropping one frees its slot.
    pub fn update_candidate(
        &mut self,
        list_id: ListId,
        candidate_id: CandidateId,
        input: CandidateInput,
        contest_state: ContestState,
        ctx: &CommandContext,
    ) -> DomainResult<()> {
        self.ensure_modifiable(contest_state)?;

        let list = self.list(list_id)?;
        let current = list.candidate(candidate_id)?;
        if input.position != current.position {
            return Err(DomainError::validation(
                "candidate position cannot change, reorder the candidates instead",
            ));
        }
        match (current.accumulated, input.accumulated) {
            (true, true) if input.accumulated_position != current.accumulated_position => {
                return Err(DomainError::validation(
                    "accumulated position cannot change, reorder the candidates instead",
                ));
            }
            (false, true) => {
                let next = list.occupied_slots() + 1;
                if input.accumulated_position != next {
                    return Err(DomainError::validation(format!(
                        "accumulated position must be {next}"
                    )));
                }
                self.ensure_capacity(list_id, 1)?;
            }
            _ => {}
        }
        input.person.validate()?;
        self.validate_candidate_number(list_id, candidate_id, &input.number)?;

        let candidate = self.build_candidate(list_id, candidate_id, input)?;
        self.raise(
            ProportionalElectionEvent::CandidateUpdated(CandidateUpdated {
                candidate,
                event_info: ctx.event_info(),
            }),
            self.metadata(),
        );
        Ok(())
    }

    /// Accepts the personal data only.
    pub fn update_candidate_after_testing_phase_ended(
        &mut self,
        list_id: ListId,
        candidate_id: CandidateId,
        input: CandidateInput,
        contest_state: ContestState,
        ctx: &CommandContext,
    ) -> DomainResult<()> {
        self.ensure_late_modifiable(contest_state)?;

        let current = self.list(list_id)?.candidate(candidate_id)?;
        ensure_unchanged("number", &current.number, &input.number)?;
        ensure_unchanged("position", &current.position, &input.position)?;
        ensure_unchanged("accumulated", &current.accumulated, &input.accumulated)?;
        if current.accumulated {
            ensure_unchanged(
                "accumulated_position",
                &current.accumulated_position,
                &input.accumulated_position,
            )?;
        }
        ensure_unchanged("party_id", &current.party_id, &input.party_id)?;
        input.person.validate()?;

        let mut candidate = current.clone();
        candidate.person = input.person;
        self.raise(
            ProportionalElectionEvent::CandidateAfterTestingPhaseUpdated(
                CandidateAfterTestingPhaseUpdated {
                    candidate,
                    event_info: ctx.event_info(),
                },
            ),
            self.metadata(),
        );
        Ok(())
    }

    /// Reassign every slot of a list.
    ///
    /// `slots` lists each candidate once, accumulated candidates twice.
    pub fn reorder_candidates(
        &mut self,
        list_id: ListId,
        slots: Vec<EntityPosition<CandidateId>>,
        contest_state: ContestState,
        ctx: &CommandContext,
    ) -> DomainResult<()> {
        self.ensure_modifiable(contest_state)?;
        let list = self.list(list_id)?;

        let mut counts: BTreeMap<CandidateId, u32> = BTreeMap::new();
        for slot in &slots {
            if !list.candidates.contains_key(&slot.id) {
                return Err(DomainError::not_found(format!("candidate {}", slot.id)));
            }
            *counts.entry(slot.id).or_default() += 1;
        }
        for candidate in list.candidates.values() {
            let listed = counts.get(&candidate.id).copied().unwrap_or(0);
            if listed != candidate.slot_count() {
                return Err(DomainError::validation(format!(
                    "candidate {} must be listed {} time(s)",
                    candidate.number,
                    candidate.slot_count()
                )));
            }
        }
        ensure_continuous(slots.iter().map(|s| s.position))?;

        self.raise(
            ProportionalElectionEvent::CandidatesReordered(CandidatesReordered {
                list_id,
                slots,
                event_info: ctx.event_info(),
            }),
            self.metadata(),
        );
        Ok(())
    }

    /// Remove a candidate; later slots move up.
    pub fn delete_candidate(
        &mut self,
        list_id: ListId,
        candidate_id: CandidateId,
        contest_state: ContestState,
        ctx: &CommandContext,
    ) -> DomainResult<()> {
        self.ensure_modifiable(contest_state)?;
        self.list(list_id)?.candidate(candidate_id)?;

        self.raise(
            ProportionalElectionEvent::CandidateDeleted(CandidateDeleted {
                list_id,
                candidate_id,
                event_info: ctx.event_info(),
            }),
            self.metadata(),
        );
        Ok(())
    }
}
