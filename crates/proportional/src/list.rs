//! Lists of a proportional election.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use votebasis_contest::ContestState;
use votebasis_core::{
    Aggregate, CandidateId, CommandContext, DomainError, DomainResult, Entity, EntityPosition,
    ListId, PartyId, Translations, ensure_valid_reorder,
};
use votebasis_political_business::ensure_unchanged;

use crate::candidate::Candidate;
use crate::election::ProportionalElection;
use crate::events::*;

/// Caller-supplied list fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListInput {
    pub position: u32,
    pub order_number: String,
    pub description: Translations,
    pub short_description: Translations,
    pub blank_row_count: u32,
    pub party_id: Option<PartyId>,
}

/// List fields as recorded in created/updated events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListData {
    pub id: ListId,
    pub position: u32,
    pub order_number: String,
    pub description: Translations,
    pub short_description: Translations,
    pub blank_row_count: u32,
    pub party_id: Option<PartyId>,
}

/// Nested entity: List, owning its candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct List {
    pub id: ListId,
    pub position: u32,
    pub order_number: String,
    pub description: Translations,
    pub short_description: Translations,
    pub blank_row_count: u32,
    pub party_id: Option<PartyId>,
    pub(crate) candidates: BTreeMap<CandidateId, Candidate>,
}

impl Entity for List {
    type Id = ListId;

    fn id(&self) -> &ListId {
        &self.id
    }
}

impl List {
    pub(crate) fn from_data(data: &ListData) -> Self {
        let mut list = Self {
            id: data.id,
            position: 0,
            order_number: String::new(),
            description: Translations::default(),
            short_description: Translations::default(),
            blank_row_count: 0,
            party_id: None,
            candidates: BTreeMap::new(),
        };
        list.apply_data(data);
        list
    }

    pub(crate) fn apply_data(&mut self, data: &ListData) {
        self.position = data.position;
        self.order_number = data.order_number.clone();
        self.description = data.description.clone();
        self.short_description = data.short_description.clone();
        self.blank_row_count = data.blank_row_count;
        self.party_id = data.party_id;
    }

    fn data(&self) -> ListData {
        ListData {
            id: self.id,
            position: self.position,
            order_number: self.order_number.clone(),
            description: self.description.clone(),
            short_description: self.short_description.clone(),
            blank_row_count: self.blank_row_count,
            party_id: self.party_id,
        }
    }

    /// Candidates ordered by position.
    pub fn candidates(&self) -> Vec<&Candidate> {
        let mut candidates: Vec<&Candidate> = self.candidates.values().collect();
        candidates.sort_by_key(|c| c.position);
        candidates
    }

    pub fn candidate(&self, id: CandidateId) -> DomainResult<&Candidate> {
        self.candidates
            .get(&id)
            .ok_or_else(|| DomainError::not_found(format!("candidate {id}")))
    }

    /// Every occupied slot; accumulated candidates contribute two.
    pub fn slots(&self) -> Vec<u32> {
        let mut slots: Vec<u32> = self.candidates.values().flat_map(Candidate::slots).collect();
        slots.sort_unstable();
        slots
    }

    pub fn occupied_slots(&self) -> u32 {
        self.candidates.values().map(|c| c.slot_count()).sum()
    }

    /// Close the gaps left by `freed` slots.
    fn release_slots(&mut self, freed: &[u32]) {
        let shift = |slot: u32| freed.iter().filter(|f| **f < slot).count() as u32;
        for candidate in self.candidates.values_mut() {
            candidate.position -= shift(candidate.position);
            if candidate.accumulated {
                candidate.accumulated_position -= shift(candidate.accumulated_position);
            }
        }
    }

    pub(crate) fn replace_candidate(&mut self, candidate: Candidate) {
        let freed = self
            .candidates
            .get(&candidate.id)
            .filter(|old| old.accumulated && !candidate.accumulated)
            .map(|old| old.accumulated_position);

        self.candidates.insert(candidate.id, candidate);
        if let Some(slot) = freed {
            self.release_slots(&[slot]);
        }
    }

    pub(crate) fn remove_candidate(&mut self, candidate_id: CandidateId) {
        if let Some(removed) = self.candidates.remove(&candidate_id) {
            self.release_slots(&removed.slots());
        }
    }

    pub(crate) fn reorder_candidates(&mut self, slots: &[EntityPosition<CandidateId>]) {
        let mut by_candidate: BTreeMap<CandidateId, Vec<u32>> = BTreeMap::new();
        for slot in slots {
            by_candidate.entry(slot.id).or_default().push(slot.position);
        }
        for (id, mut positions) in by_candidate {
            let Some(candidate) = self.candidates.get_mut(&id) else {
                continue;
            };
            positions.sort_unstable();
            candidate.position = positions[0];
            if candidate.accumulated {
                if let Some(second) = positions.get(1) {
                    candidate.accumulated_position = *second;
                }
            }
        }
    }
}

impl ProportionalElection {
    fn validate_list(&self, list_id: ListId, input: &ListInput) -> DomainResult<()> {
        if input.order_number.trim().is_empty() {
            return Err(DomainError::validation("list order number cannot be empty"));
        }
        if input.description.is_empty() || input.short_description.is_empty() {
            return Err(DomainError::validation("list descriptions cannot be empty"));
        }
        if self
            .lists
            .values()
            .any(|l| l.id != list_id && l.order_number == input.order_number)
        {
            return Err(DomainError::validation(format!(
                "list order number {} is already taken",
                input.order_number
            )));
        }
        self.ensure_numeric_if_check_digit("list order number", &input.order_number)?;

        let occupied = self
            .lists
            .get(&list_id)
            .map_or(0, List::occupied_slots);
        if occupied + input.blank_row_count > self.number_of_mandates() {
            return Err(DomainError::validation(
                "candidates and blank rows exceed the number of mandates",
            ));
        }
        Ok(())
    }

    fn list_data(list_id: ListId, input: ListInput) -> ListData {
        ListData {
            id: list_id,
            position: input.position,
            order_number: input.order_number,
            description: input.description,
            short_description: input.short_description,
            blank_row_count: input.blank_row_count,
            party_id: input.party_id,
        }
    }

    pub fn create_list(
        &mut self,
        list_id: ListId,
        input: ListInput,
        contest_state: ContestState,
        ctx: &CommandContext,
    ) -> DomainResult<()> {
        self.ensure_modifiable(contest_state)?;

        if self.lists.contains_key(&list_id) {
            return Err(DomainError::conflict(format!("list {list_id} already exists")));
        }
        let expected = self.lists.len() as u32 + 1;
        if input.position != expected {
            return Err(DomainError::validation(format!(
                "list position must be {expected}"
            )));
        }
        self.validate_list(list_id, &input)?;

        self.raise(
            ProportionalElectionEvent::ListCreated(ListCreated {
                list: Self::list_data(list_id, input),
                event_info: ctx.event_info(),
            }),
            self.metadata(),
        );
        Ok(())
    }

    /// Candidate check digits follow a changed order number.
    pub fn update_list(
        &mut self,
        list_id: ListId,
        input: ListInput,
        contest_state: ContestState,
        ctx: &CommandContext,
    ) -> DomainResult<()> {
        self.ensure_modifiable(contest_state)?;

        let current = self.list(list_id)?;
        if input.position != current.position {
            return Err(DomainError::validation(
                "list position cannot change, reorder the lists instead",
            ));
        }
        self.validate_list(list_id, &input)?;

        self.raise(
            ProportionalElectionEvent::ListUpdated(ListUpdated {
                list: Self::list_data(list_id, input),
                event_info: ctx.event_info(),
            }),
            self.metadata(),
        );
        Ok(())
    }

    /// Accepts the descriptions only.
    pub fn update_list_after_testing_phase_ended(
        &mut self,
        list_id: ListId,
        input: ListInput,
        contest_state: ContestState,
        ctx: &CommandContext,
    ) -> DomainResult<()> {
        self.ensure_late_modifiable(contest_state)?;

        let current = self.list(list_id)?.data();
        ensure_unchanged("position", &current.position, &input.position)?;
        ensure_unchanged("order_number", &current.order_number, &input.order_number)?;
        ensure_unchanged(
            "blank_row_count",
            &current.blank_row_count,
            &input.blank_row_count,
        )?;
        ensure_unchanged("party_id", &current.party_id, &input.party_id)?;
        if input.description.is_empty() || input.short_description.is_empty() {
            return Err(DomainError::validation("list descriptions cannot be empty"));
        }

        self.raise(
            ProportionalElectionEvent::ListAfterTestingPhaseUpdated(ListAfterTestingPhaseUpdated {
                list_id,
                description: input.description,
                short_description: input.short_description,
                event_info: ctx.event_info(),
            }),
            self.metadata(),
        );
        Ok(())
    }

    pub fn reorder_lists(
        &mut self,
        positions: Vec<EntityPosition<ListId>>,
        contest_state: ContestState,
        ctx: &CommandContext,
    ) -> DomainResult<()> {
        self.ensure_modifiable(contest_state)?;
        ensure_valid_reorder(self.lists.keys().copied(), &positions)?;

        self.raise(
            ProportionalElectionEvent::ListsReordered(ListsReordered {
                positions,
                event_info: ctx.event_info(),
            }),
            self.metadata(),
        );
        Ok(())
    }

    /// Delete a list with its candidates.
    ///
    /// The list leaves every union; unions it was the main list of are removed.
    pub fn delete_list(
        &mut self,
        list_id: ListId,
        contest_state: ContestState,
        ctx: &CommandContext,
    ) -> DomainResult<()> {
        self.ensure_modifiable(contest_state)?;
        self.list(list_id)?;

        self.raise(
            ProportionalElectionEvent::ListDeleted(ListDeleted {
                list_id,
                event_info: ctx.event_info(),
            }),
            self.metadata(),
        );
        Ok(())
    }
}
