//! Secondary majority elections.
//!
//! A secondary election has its own candidates, some of which may be references
//! to primary candidates: those take their personal data from the primary
//! candidate and follow its updates. Each secondary election carries its own
//! e-voting approval.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use votebasis_contest::ContestState;
use votebasis_core::{
    Aggregate, BallotGroupEntryId, CandidateId, CommandContext, DomainError, DomainResult, Entity,
    EntityPosition, SecondaryMajorityElectionId, SoftDelete, Translations, ensure_valid_reorder,
};
use votebasis_political_business::{
    ApprovalOutcome, CandidatePerson, EVotingApproval, ensure_contest_unlocked,
    ensure_in_testing_phase, ensure_testing_phase_ended, ensure_unchanged,
};

use crate::ballot_group::{BallotGroupEntryAssignment, EntryElection};
use crate::candidate::MajorityCandidate;
use crate::election::MajorityElection;
use crate::events::*;

/// Caller-supplied secondary election fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondaryMajorityElectionInput {
    pub position: u32,
    pub political_business_number: String,
    pub official_description: Translations,
    pub short_description: Translations,
    pub number_of_mandates: u32,
    pub is_on_separate_ballot: bool,
    pub individual_candidates_disabled: bool,
}

/// Secondary election fields as recorded in created/updated events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondaryMajorityElectionData {
    pub id: SecondaryMajorityElectionId,
    pub position: u32,
    pub political_business_number: String,
    pub official_description: Translations,
    pub short_description: Translations,
    pub number_of_mandates: u32,
    pub is_on_separate_ballot: bool,
    pub individual_candidates_disabled: bool,
}

/// Nested entity: secondary election with its candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecondaryMajorityElection {
    pub id: SecondaryMajorityElectionId,
    pub position: u32,
    pub political_business_number: String,
    pub official_description: Translations,
    pub short_description: Translations,
    pub number_of_mandates: u32,
    pub is_on_separate_ballot: bool,
    pub individual_candidates_disabled: bool,
    pub active: bool,
    pub e_voting_approval: EVotingApproval,
    pub(crate) candidates: BTreeMap<CandidateId, SecondaryCandidate>,
}

impl Entity for SecondaryMajorityElection {
    type Id = SecondaryMajorityElectionId;

    fn id(&self) -> &SecondaryMajorityElectionId {
        &self.id
    }
}

/// Candidate of a secondary election, possibly referencing a primary candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondaryCandidate {
    pub id: CandidateId,
    pub number: String,
    pub position: u32,
    pub person: CandidatePerson,
    pub party: Translations,
    pub referenced_candidate_id: Option<CandidateId>,
}

impl Entity for SecondaryCandidate {
    type Id = CandidateId;

    fn id(&self) -> &CandidateId {
        &self.id
    }
}

/// Caller-supplied fields of a standalone secondary candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondaryCandidateInput {
    pub number: String,
    pub position: u32,
    pub person: CandidatePerson,
    pub party: Translations,
}

/// Caller-supplied fields of a candidate reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateReferenceInput {
    pub referenced_candidate_id: CandidateId,
    pub number: String,
    pub position: u32,
    pub incumbent: bool,
}

impl SecondaryMajorityElection {
    pub(crate) fn from_data(data: &SecondaryMajorityElectionData, approval: EVotingApproval) -> Self {
        let mut secondary = Self {
            id: data.id,
            position: 0,
            political_business_number: String::new(),
            official_description: Translations::default(),
            short_description: Translations::default(),
            number_of_mandates: 0,
            is_on_separate_ballot: false,
            individual_candidates_disabled: false,
            active: false,
            e_voting_approval: approval,
            candidates: BTreeMap::new(),
        };
        secondary.apply_data(data);
        secondary
    }

    pub(crate) fn apply_data(&mut self, data: &SecondaryMajorityElectionData) {
        self.position = data.position;
        self.political_business_number = data.political_business_number.clone();
        self.official_description = data.official_description.clone();
        self.short_description = data.short_description.clone();
        self.number_of_mandates = data.number_of_mandates;
        self.is_on_separate_ballot = data.is_on_separate_ballot;
        self.individual_candidates_disabled = data.individual_candidates_disabled;
    }

    fn data(&self) -> SecondaryMajorityElectionData {
        SecondaryMajorityElectionData {
            id: self.id,
            position: self.position,
            political_business_number: self.political_business_number.clone(),
            official_description: self.official_description.clone(),
            short_description: self.short_description.clone(),
            number_of_mandates: self.number_of_mandates,
            is_on_separate_ballot: self.is_on_separate_ballot,
            individual_candidates_disabled: self.individual_candidates_disabled,
        }
    }

    /// Candidates ordered by position.
    pub fn candidates(&self) -> Vec<&SecondaryCandidate> {
        let mut candidates: Vec<&SecondaryCandidate> = self.candidates.values().collect();
        candidates.sort_by_key(|c| c.position);
        candidates
    }

    pub fn candidate(&self, id: CandidateId) -> DomainResult<&SecondaryCandidate> {
        self.candidates
            .get(&id)
            .ok_or_else(|| DomainError::not_found(format!("secondary candidate {id}")))
    }

    pub fn references(&self, primary_candidate_id: CandidateId) -> bool {
        self.candidates
            .values()
            .any(|c| c.referenced_candidate_id == Some(primary_candidate_id))
    }

    pub(crate) fn refresh_references(&mut self, primary: &MajorityCandidate) {
        for candidate in self.candidates.values_mut() {
            if candidate.referenced_candidate_id == Some(primary.id) {
                let incumbent = candidate.person.incumbent;
                candidate.person = primary.person.clone();
                candidate.person.incumbent = incumbent;
                candidate.party = primary.party.clone();
            }
        }
    }

    fn close_gap(&mut self, removed_position: u32) {
        for candidate in self.candidates.values_mut() {
            if candidate.position > removed_position {
                candidate.position -= 1;
            }
        }
    }

    pub(crate) fn remove_candidate(&mut self, candidate_id: CandidateId) -> Option<SecondaryCandidate> {
        let removed = self.candidates.remove(&candidate_id)?;
        self.close_gap(removed.position);
        Some(removed)
    }

    /// Remove every reference to `primary_candidate_id`; returns the removed ids.
    pub(crate) fn remove_references_to(&mut self, primary_candidate_id: CandidateId) -> Vec<CandidateId> {
        let referencing: Vec<CandidateId> = self
            .candidates
            .values()
            .filter(|c| c.referenced_candidate_id == Some(primary_candidate_id))
            .map(|c| c.id)
            .collect();
        for id in &referencing {
            self.remove_candidate(*id);
        }
        referencing
    }
}

// Secondary election intent methods.
impl MajorityElection {
    /// The primary may be changed and the secondary is not approved.
    fn ensure_secondary_modifiable(
        &self,
        secondary_id: SecondaryMajorityElectionId,
        contest_state: ContestState,
    ) -> DomainResult<&SecondaryMajorityElection> {
        self.ensure_exists()?;
        ensure_in_testing_phase(contest_state)?;
        let secondary = self.secondary_election(secondary_id)?;
        secondary
            .e_voting_approval
            .ensure_not_approved("secondary majority election")?;
        Ok(secondary)
    }

    fn validate_secondary(
        &self,
        secondary_id: SecondaryMajorityElectionId,
        input: &SecondaryMajorityElectionInput,
    ) -> DomainResult<()> {
        if input.political_business_number.trim().is_empty() {
            return Err(DomainError::validation(
                "political business number cannot be empty",
            ));
        }
        if input.official_description.is_empty() || input.short_description.is_empty() {
            return Err(DomainError::validation(
                "secondary election descriptions cannot be empty",
            ));
        }
        if input.number_of_mandates == 0 {
            return Err(DomainError::validation(
                "a secondary election needs at least one mandate",
            ));
        }
        if self.secondary_elections.values().any(|s| {
            s.id != secondary_id && s.political_business_number == input.political_business_number
        }) {
            return Err(DomainError::validation(format!(
                "political business number {} is already taken",
                input.political_business_number
            )));
        }
        Ok(())
    }

    fn secondary_data(
        secondary_id: SecondaryMajorityElectionId,
        input: SecondaryMajorityElectionInput,
    ) -> SecondaryMajorityElectionData {
        SecondaryMajorityElectionData {
            id: secondary_id,
            position: input.position,
            political_business_number: input.political_business_number,
            official_description: input.official_description,
            short_description: input.short_description,
            number_of_mandates: input.number_of_mandates,
            is_on_separate_ballot: input.is_on_separate_ballot,
            individual_candidates_disabled: input.individual_candidates_disabled,
        }
    }

    /// Create a secondary election; one sharing the primary ballot gets an
    /// empty entry in every ballot group.
    pub fn create_secondary_election(
        &mut self,
        secondary_id: SecondaryMajorityElectionId,
        input: SecondaryMajorityElectionInput,
        contest_state: ContestState,
        ctx: &CommandContext,
    ) -> DomainResult<()> {
        self.ensure_modifiable(contest_state)?;

        if self.secondary_elections.contains_key(&secondary_id) {
            return Err(DomainError::conflict(format!(
                "secondary majority election {secondary_id} already exists"
            )));
        }
        let expected = self.secondary_elections.len() as u32 + 1;
        if input.position != expected {
            return Err(DomainError::validation(format!(
                "secondary election position must be {expected}"
            )));
        }
        self.validate_secondary(secondary_id, &input)?;

        let ballot_group_entries = if input.is_on_separate_ballot {
            Vec::new()
        } else {
            self.ballot_groups()
                .into_iter()
                .map(|g| BallotGroupEntryAssignment {
                    ballot_group_id: g.id,
                    entry_id: BallotGroupEntryId::new(),
                })
                .collect()
        };

        self.raise(
            MajorityElectionEvent::SecondaryElectionCreated(SecondaryElectionCreated {
                secondary_election: Self::secondary_data(secondary_id, input),
                e_voting_approval: EVotingApproval::for_contest(
                    self.e_voting_approval != EVotingApproval::Unsupported,
                ),
                ballot_group_entries,
                event_info: ctx.event_info(),
            }),
            self.metadata(),
        );
        Ok(())
    }

    /// The ballot placement cannot change while ballot groups exist.
    pub fn update_secondary_election(
        &mut self,
        secondary_id: SecondaryMajorityElectionId,
        input: SecondaryMajorityElectionInput,
        contest_state: ContestState,
        ctx: &CommandContext,
    ) -> DomainResult<()> {
        let current = self.ensure_secondary_modifiable(secondary_id, contest_state)?;
        if input.position != current.position {
            return Err(DomainError::validation(
                "secondary election position cannot change",
            ));
        }
        if input.is_on_separate_ballot != current.is_on_separate_ballot
            && !self.ballot_groups.is_empty()
        {
            return Err(DomainError::validation(
                "separate ballot cannot change while ballot groups exist",
            ));
        }
        self.validate_secondary(secondary_id, &input)?;
        self.ensure_entries_fit(EntryElection::Secondary(secondary_id), input.number_of_mandates)?;

        self.raise(
            MajorityElectionEvent::SecondaryElectionUpdated(SecondaryElectionUpdated {
                secondary_election: Self::secondary_data(secondary_id, input),
                event_info: ctx.event_info(),
            }),
            self.metadata(),
        );
        Ok(())
    }

    /// Accepts number and descriptions only.
    pub fn update_secondary_election_after_testing_phase_ended(
        &mut self,
        secondary_id: SecondaryMajorityElectionId,
        input: SecondaryMajorityElectionInput,
        contest_state: ContestState,
        ctx: &CommandContext,
    ) -> DomainResult<()> {
        self.ensure_exists()?;
        ensure_testing_phase_ended(contest_state)?;
        let current = self.secondary_election(secondary_id)?;
        current
            .e_voting_approval
            .ensure_not_approved("secondary majority election")?;

        let current = current.data();
        ensure_unchanged("position", &current.position, &input.position)?;
        ensure_unchanged(
            "number_of_mandates",
            &current.number_of_mandates,
            &input.number_of_mandates,
        )?;
        ensure_unchanged(
            "is_on_separate_ballot",
            &current.is_on_separate_ballot,
            &input.is_on_separate_ballot,
        )?;
        ensure_unchanged(
            "individual_candidates_disabled",
            &current.individual_candidates_disabled,
            &input.individual_candidates_disabled,
        )?;
        self.validate_secondary(secondary_id, &input)?;

        self.raise(
            MajorityElectionEvent::SecondaryElectionAfterTestingPhaseUpdated(
                SecondaryElectionAfterTestingPhaseUpdated {
                    secondary_election_id: secondary_id,
                    political_business_number: input.political_business_number,
                    official_description: input.official_description,
                    short_description: input.short_description,
                    event_info: ctx.event_info(),
                },
            ),
            self.metadata(),
        );
        Ok(())
    }

    /// Activation requires the secondary's ballot group entries to be complete.
    pub fn update_secondary_election_active_state(
        &mut self,
        secondary_id: SecondaryMajorityElectionId,
        active: bool,
        contest_state: ContestState,
        ctx: &CommandContext,
    ) -> DomainResult<()> {
        self.ensure_exists()?;
        ensure_contest_unlocked(contest_state)?;
        self.secondary_election(secondary_id)?
            .e_voting_approval
            .ensure_not_approved("secondary majority election")?;

        if active {
            let own = EntryElection::Secondary(secondary_id);
            self.validate_entries_complete(|e| e.election == own)?;
        }

        self.raise(
            MajorityElectionEvent::SecondaryElectionActiveStateUpdated(
                SecondaryElectionActiveStateUpdated {
                    secondary_election_id: secondary_id,
                    active,
                    event_info: ctx.event_info(),
                },
            ),
            self.metadata(),
        );
        Ok(())
    }

    /// Delete a secondary election with its candidates and ballot group entries.
    pub fn delete_secondary_election(
        &mut self,
        secondary_id: SecondaryMajorityElectionId,
        contest_state: ContestState,
        ctx: &CommandContext,
    ) -> DomainResult<()> {
        self.ensure_modifiable(contest_state)?;
        let secondary = self.ensure_secondary_modifiable(secondary_id, contest_state)?;
        if !secondary.is_on_separate_ballot {
            self.ensure_blank_rows_allowed(
                self.number_of_mandates(),
                self.elections_on_ballot().len() - 1,
            )?;
        }

        self.raise(
            MajorityElectionEvent::SecondaryElectionDeleted(SecondaryElectionDeleted {
                secondary_election_id: secondary_id,
                event_info: ctx.event_info(),
            }),
            self.metadata(),
        );
        Ok(())
    }

    fn raise_secondary_approval(
        &mut self,
        secondary_id: SecondaryMajorityElectionId,
        approved: bool,
        ctx: &CommandContext,
    ) {
        self.raise(
            MajorityElectionEvent::SecondaryElectionEVotingApprovalUpdated(
                SecondaryElectionEVotingApprovalUpdated {
                    secondary_election_id: secondary_id,
                    approved,
                    event_info: ctx.event_info(),
                },
            ),
            self.metadata(),
        );
    }

    pub fn approve_secondary_e_voting(
        &mut self,
        secondary_id: SecondaryMajorityElectionId,
        contest_state: ContestState,
        ctx: &CommandContext,
    ) -> DomainResult<()> {
        self.ensure_exists()?;
        ensure_contest_unlocked(contest_state)?;
        self.secondary_election(secondary_id)?
            .e_voting_approval
            .check_approve("secondary majority election")?;
        self.raise_secondary_approval(secondary_id, true, ctx);
        Ok(())
    }

    pub fn revert_secondary_e_voting_approval(
        &mut self,
        secondary_id: SecondaryMajorityElectionId,
        contest_state: ContestState,
        ctx: &CommandContext,
    ) -> DomainResult<()> {
        self.ensure_exists()?;
        ensure_contest_unlocked(contest_state)?;
        self.secondary_election(secondary_id)?
            .e_voting_approval
            .check_revert("secondary majority election")?;
        self.raise_secondary_approval(secondary_id, false, ctx);
        Ok(())
    }

    pub fn try_approve_secondary_e_voting(
        &mut self,
        secondary_id: SecondaryMajorityElectionId,
        contest_state: ContestState,
        ctx: &CommandContext,
    ) -> DomainResult<ApprovalOutcome> {
        self.ensure_exists()?;
        ensure_contest_unlocked(contest_state)?;
        let outcome = self
            .secondary_election(secondary_id)?
            .e_voting_approval
            .check_try_approve("secondary majority election")?;
        if outcome == ApprovalOutcome::Changed {
            self.raise_secondary_approval(secondary_id, true, ctx);
        }
        Ok(outcome)
    }
}

// Secondary candidate intent methods.
impl MajorityElection {
    fn validate_secondary_candidate_number(
        secondary: &SecondaryMajorityElection,
        candidate_id: CandidateId,
        number: &str,
    ) -> DomainResult<()> {
        if number.trim().is_empty() {
            return Err(DomainError::validation("candidate number cannot be empty"));
        }
        if secondary
            .candidates
            .values()
            .any(|c| c.id != candidate_id && c.number == number)
        {
            return Err(DomainError::validation(format!(
                "candidate number {number} is already taken"
            )));
        }
        Ok(())
    }

    fn ensure_next_candidate_position(
        secondary: &SecondaryMajorityElection,
        candidate_id: CandidateId,
        position: u32,
    ) -> DomainResult<()> {
        if secondary.candidates.contains_key(&candidate_id) {
            return Err(DomainError::conflict(format!(
                "secondary candidate {candidate_id} already exists"
            )));
        }
        let expected = secondary.candidates.len() as u32 + 1;
        if position != expected {
            return Err(DomainError::validation(format!(
                "candidate position must be {expected}"
            )));
        }
        Ok(())
    }

    pub fn create_secondary_candidate(
        &mut self,
        secondary_id: SecondaryMajorityElectionId,
        candidate_id: CandidateId,
        input: SecondaryCandidateInput,
        contest_state: ContestState,
        ctx: &CommandContext,
    ) -> DomainResult<()> {
        let secondary = self.ensure_secondary_modifiable(secondary_id, contest_state)?;
        Self::ensure_next_candidate_position(secondary, candidate_id, input.position)?;
        Self::validate_secondary_candidate_number(secondary, candidate_id, &input.number)?;
        input.person.validate()?;

        self.raise(
            MajorityElectionEvent::SecondaryCandidateCreated(SecondaryCandidateCreated {
                secondary_election_id: secondary_id,
                candidate: SecondaryCandidate {
                    id: candidate_id,
                    number: input.number,
                    position: input.position,
                    person: input.person,
                    party: input.party,
                    referenced_candidate_id: None,
                },
                event_info: ctx.event_info(),
            }),
            self.metadata(),
        );
        Ok(())
    }

    pub fn update_secondary_candidate(
        &mut self,
        secondary_id: SecondaryMajorityElectionId,
        candidate_id: CandidateId,
        input: SecondaryCandidateInput,
        contest_state: ContestState,
        ctx: &CommandContext,
    ) -> DomainResult<()> {
        let secondary = self.ensure_secondary_modifiable(secondary_id, contest_state)?;
        let current = secondary.candidate(candidate_id)?;
        if current.referenced_candidate_id.is_some() {
            return Err(DomainError::validation(
                "a candidate reference takes its data from the primary candidate",
            ));
        }
        if input.position != current.position {
            return Err(DomainError::validation(
                "candidate position cannot change, reorder the candidates instead",
            ));
        }
        Self::validate_secondary_candidate_number(secondary, candidate_id, &input.number)?;
        input.person.validate()?;

        self.raise(
            MajorityElectionEvent::SecondaryCandidateUpdated(SecondaryCandidateUpdated {
                secondary_election_id: secondary_id,
                candidate: SecondaryCandidate {
                    id: candidate_id,
                    number: input.number,
                    position: input.position,
                    person: input.person,
                    party: input.party,
                    referenced_candidate_id: None,
                },
                event_info: ctx.event_info(),
            }),
            self.metadata(),
        );
        Ok(())
    }

    /// Add a primary candidate to a secondary election.
    pub fn create_candidate_reference(
        &mut self,
        secondary_id: SecondaryMajorityElectionId,
        candidate_id: CandidateId,
        input: CandidateReferenceInput,
        contest_state: ContestState,
        ctx: &CommandContext,
    ) -> DomainResult<()> {
        let secondary = self.ensure_secondary_modifiable(secondary_id, contest_state)?;
        Self::ensure_next_candidate_position(secondary, candidate_id, input.position)?;
        Self::validate_secondary_candidate_number(secondary, candidate_id, &input.number)?;
        if secondary.references(input.referenced_candidate_id) {
            return Err(DomainError::validation(format!(
                "candidate {} is already referenced",
                input.referenced_candidate_id
            )));
        }
        let primary = self.candidate(input.referenced_candidate_id)?;

        let mut person = primary.person.clone();
        person.incumbent = input.incumbent;
        let candidate = SecondaryCandidate {
            id: candidate_id,
            number: input.number,
            position: input.position,
            person,
            party: primary.party.clone(),
            referenced_candidate_id: Some(input.referenced_candidate_id),
        };
        self.raise(
            MajorityElectionEvent::CandidateReferenceCreated(CandidateReferenceCreated {
                secondary_election_id: secondary_id,
                candidate,
                event_info: ctx.event_info(),
            }),
            self.metadata(),
        );
        Ok(())
    }

    /// Accepts number and incumbency only; the referenced candidate is fixed.
    pub fn update_candidate_reference(
        &mut self,
        secondary_id: SecondaryMajorityElectionId,
        candidate_id: CandidateId,
        input: CandidateReferenceInput,
        contest_state: ContestState,
        ctx: &CommandContext,
    ) -> DomainResult<()> {
        let secondary = self.ensure_secondary_modifiable(secondary_id, contest_state)?;
        let current = secondary.candidate(candidate_id)?;
        if current.referenced_candidate_id != Some(input.referenced_candidate_id) {
            return Err(DomainError::validation(
                "the referenced candidate of a candidate reference cannot change",
            ));
        }
        if input.position != current.position {
            return Err(DomainError::validation(
                "candidate position cannot change, reorder the candidates instead",
            ));
        }
        Self::validate_secondary_candidate_number(secondary, candidate_id, &input.number)?;

        let mut candidate = current.clone();
        candidate.number = input.number;
        candidate.person.incumbent = input.incumbent;
        self.raise(
            MajorityElectionEvent::CandidateReferenceUpdated(CandidateReferenceUpdated {
                secondary_election_id: secondary_id,
                candidate,
                event_info: ctx.event_info(),
            }),
            self.metadata(),
        );
        Ok(())
    }

    pub fn reorder_secondary_candidates(
        &mut self,
        secondary_id: SecondaryMajorityElectionId,
        positions: Vec<EntityPosition<CandidateId>>,
        contest_state: ContestState,
        ctx: &CommandContext,
    ) -> DomainResult<()> {
        let secondary = self.ensure_secondary_modifiable(secondary_id, contest_state)?;
        ensure_valid_reorder(secondary.candidates.keys().copied(), &positions)?;

        self.raise(
            MajorityElectionEvent::SecondaryCandidatesReordered(SecondaryCandidatesReordered {
                secondary_election_id: secondary_id,
                positions,
                event_info: ctx.event_info(),
            }),
            self.metadata(),
        );
        Ok(())
    }

    /// Deletes standalone candidates and candidate references alike.
    pub fn delete_secondary_candidate(
        &mut self,
        secondary_id: SecondaryMajorityElectionId,
        candidate_id: CandidateId,
        contest_state: ContestState,
        ctx: &CommandContext,
    ) -> DomainResult<()> {
        self.ensure_secondary_modifiable(secondary_id, contest_state)?
            .candidate(candidate_id)?;
        if self.is_in_ballot_group(candidate_id) {
            return Err(DomainError::validation(format!(
                "candidate {candidate_id} is part of a ballot group"
            )));
        }

        self.raise(
            MajorityElectionEvent::SecondaryCandidateDeleted(SecondaryCandidateDeleted {
                secondary_election_id: secondary_id,
                candidate_id,
                event_info: ctx.event_info(),
            }),
            self.metadata(),
        );
        Ok(())
    }
}
