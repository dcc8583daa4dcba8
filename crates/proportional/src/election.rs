use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use votebasis_contest::ContestState;
use votebasis_core::{
    Aggregate, AggregateRoot, CandidateId, CommandContext, ContestId, DomainError,
    DomainOfInfluenceId, DomainResult, EventSignatureBusinessMetadata, ListId, ListUnionId,
    PendingEvents, ProportionalElectionId, SoftDelete, Translations,
};
use votebasis_political_business::{
    ApprovalOutcome, EVotingApproval, PoliticalBusiness, ensure_contest_unlocked,
    ensure_in_testing_phase, ensure_testing_phase_ended, ensure_unchanged,
};

use crate::check_digit::candidate_check_digit;
use crate::events::*;
use crate::list::List;
use crate::list_union::ListUnion;

/// How mandates are distributed once results are in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MandateAlgorithm {
    HagenbachBischoff,
    DoubleProportionalNDois5DoiOr3TotQuorum,
    DoubleProportional1Doi0DoiQuorum,
}

impl MandateAlgorithm {
    /// Only Hagenbach-Bischoff distributes mandates over list unions.
    pub fn supports_list_unions(self) -> bool {
        matches!(self, MandateAlgorithm::HagenbachBischoff)
    }
}

/// Caller-supplied election fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProportionalElectionInput {
    pub contest_id: ContestId,
    pub domain_of_influence_id: DomainOfInfluenceId,
    pub political_business_number: String,
    pub official_description: Translations,
    pub short_description: Translations,
    pub internal_description: String,
    pub number_of_mandates: u32,
    pub mandate_algorithm: MandateAlgorithm,
    pub ballot_bundle_size: u32,
    pub candidate_check_digit: bool,
    pub enforce_empty_vote_count_for_counting_circles: bool,
    pub enforce_candidate_check_digit_for_counting_circles: bool,
    pub enforce_review_procedure_for_counting_circles: bool,
}

/// Election fields as recorded in created/updated events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProportionalElectionData {
    pub id: ProportionalElectionId,
    pub contest_id: ContestId,
    pub domain_of_influence_id: DomainOfInfluenceId,
    pub political_business_number: String,
    pub official_description: Translations,
    pub short_description: Translations,
    pub internal_description: String,
    pub number_of_mandates: u32,
    pub mandate_algorithm: MandateAlgorithm,
    pub ballot_bundle_size: u32,
    pub candidate_check_digit: bool,
    pub enforce_empty_vote_count_for_counting_circles: bool,
    pub enforce_candidate_check_digit_for_counting_circles: bool,
    pub enforce_review_procedure_for_counting_circles: bool,
}

/// Aggregate root: ProportionalElection.
///
/// Lists own their candidates; list unions reference lists by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProportionalElection {
    pub(crate) id: ProportionalElectionId,
    pub(crate) data: Option<ProportionalElectionData>,
    pub(crate) active: bool,
    pub(crate) e_voting_approval: EVotingApproval,
    pub(crate) lists: BTreeMap<ListId, List>,
    pub(crate) list_unions: BTreeMap<ListUnionId, ListUnion>,
    pub(crate) version: u64,
    pub(crate) created: bool,
    pub(crate) deleted: bool,
    pub(crate) pending: PendingEvents<ProportionalElectionEvent>,
}

impl ProportionalElection {
    pub fn data(&self) -> Option<&ProportionalElectionData> {
        self.data.as_ref()
    }

    pub fn number_of_mandates(&self) -> u32 {
        self.data.as_ref().map_or(0, |d| d.number_of_mandates)
    }

    /// Lists ordered by position.
    pub fn lists(&self) -> Vec<&List> {
        let mut lists: Vec<&List> = self.lists.values().collect();
        lists.sort_by_key(|l| l.position);
        lists
    }

    pub fn list(&self, id: ListId) -> DomainResult<&List> {
        self.lists
            .get(&id)
            .ok_or_else(|| DomainError::not_found(format!("list {id}")))
    }

    pub fn list_union(&self, id: ListUnionId) -> DomainResult<&ListUnion> {
        self.list_unions
            .get(&id)
            .ok_or_else(|| DomainError::not_found(format!("list union {id}")))
    }

    /// Unions with the given root (`None`: top level), ordered by position.
    pub fn list_unions_in(&self, root: Option<ListUnionId>) -> Vec<&ListUnion> {
        let mut unions: Vec<&ListUnion> = self
            .list_unions
            .values()
            .filter(|u| u.root_list_union_id == root)
            .collect();
        unions.sort_by_key(|u| u.position);
        unions
    }

    pub fn list_union_count(&self) -> usize {
        self.list_unions.len()
    }

    /// Whether every list is exactly filled by candidates and blank rows.
    pub fn validate_lists_complete(&self) -> DomainResult<()> {
        let mandates = self.number_of_mandates();
        for list in self.lists() {
            let filled = list.occupied_slots() + list.blank_row_count;
            if filled != mandates {
                return Err(DomainError::validation(format!(
                    "list {} covers {filled} of {mandates} mandates",
                    list.order_number
                )));
            }
        }
        Ok(())
    }
}

impl PoliticalBusiness for ProportionalElection {
    fn contest_id(&self) -> Option<ContestId> {
        self.data.as_ref().map(|d| d.contest_id)
    }

    fn domain_of_influence_id(&self) -> Option<DomainOfInfluenceId> {
        self.data.as_ref().map(|d| d.domain_of_influence_id)
    }

    fn political_business_number(&self) -> &str {
        self.data
            .as_ref()
            .map_or("", |d| d.political_business_number.as_str())
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn e_voting_approval(&self) -> EVotingApproval {
        self.e_voting_approval
    }
}

impl AggregateRoot for ProportionalElection {
    type Id = ProportionalElectionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

impl Aggregate for ProportionalElection {
    type Event = ProportionalElectionEvent;
    const AGGREGATE_TYPE: &'static str = "proportional_election";

    fn empty(id: ProportionalElectionId) -> Self {
        Self {
            id,
            data: None,
            active: false,
            e_voting_approval: EVotingApproval::Unsupported,
            lists: BTreeMap::new(),
            list_unions: BTreeMap::new(),
            version: 0,
            created: false,
            deleted: false,
            pending: PendingEvents::new(),
        }
    }

    fn apply(&mut self, event: &Self::Event) {
        use ProportionalElectionEvent as E;

        match event {
            E::ProportionalElectionCreated(e) => {
                self.data = Some(e.election.clone());
                self.e_voting_approval = e.e_voting_approval;
                self.created = true;
            }
            E::ProportionalElectionUpdated(e) => {
                self.data = Some(e.election.clone());
                self.refresh_check_digits();
            }
            E::ProportionalElectionAfterTestingPhaseUpdated(e) => {
                if let Some(data) = self.data.as_mut() {
                    data.political_business_number = e.political_business_number.clone();
                    data.official_description = e.official_description.clone();
                    data.short_description = e.short_description.clone();
                    data.internal_description = e.internal_description.clone();
                    data.enforce_empty_vote_count_for_counting_circles =
                        e.enforce_empty_vote_count_for_counting_circles;
                    data.enforce_candidate_check_digit_for_counting_circles =
                        e.enforce_candidate_check_digit_for_counting_circles;
                    data.enforce_review_procedure_for_counting_circles =
                        e.enforce_review_procedure_for_counting_circles;
                }
            }
            E::ProportionalElectionActiveStateUpdated(e) => {
                self.active = e.active;
            }
            E::ProportionalElectionDeleted(_) => {
                self.deleted = true;
            }
            E::ProportionalElectionEVotingApprovalUpdated(e) => {
                self.e_voting_approval = self.e_voting_approval.with_approved(e.approved);
            }

            E::ListCreated(e) => {
                self.lists.insert(e.list.id, List::from_data(&e.list));
            }
            E::ListUpdated(e) => {
                if let Some(list) = self.lists.get_mut(&e.list.id) {
                    list.apply_data(&e.list);
                }
                self.refresh_check_digits();
            }
            E::ListAfterTestingPhaseUpdated(e) => {
                if let Some(list) = self.lists.get_mut(&e.list_id) {
                    list.description = e.description.clone();
                    list.short_description = e.short_description.clone();
                }
            }
            E::ListsReordered(e) => {
                for entry in &e.positions {
                    if let Some(list) = self.lists.get_mut(&entry.id) {
                        list.position = entry.position;
                    }
                }
            }
            E::ListDeleted(e) => self.remove_list(e.list_id),

            E::CandidateCreated(e) => {
                if let Some(list) = self.lists.get_mut(&e.candidate.list_id) {
                    list.candidates.insert(e.candidate.id, e.candidate.clone());
                }
            }
            E::CandidateUpdated(e) => {
                if let Some(list) = self.lists.get_mut(&e.candidate.list_id) {
                    list.replace_candidate(e.candidate.clone());
                }
            }
            E::CandidateAfterTestingPhaseUpdated(e) => {
                if let Some(list) = self.lists.get_mut(&e.candidate.list_id) {
                    list.replace_candidate(e.candidate.clone());
                }
            }
            E::CandidatesReordered(e) => {
                if let Some(list) = self.lists.get_mut(&e.list_id) {
                    list.reorder_candidates(&e.slots);
                }
            }
            E::CandidateDeleted(e) => {
                if let Some(list) = self.lists.get_mut(&e.list_id) {
                    list.remove_candidate(e.candidate_id);
                }
            }

            E::ListUnionCreated(e) => {
                self.list_unions.insert(e.list_union.id, e.list_union.clone());
            }
            E::ListUnionUpdated(e) => {
                self.list_unions.insert(e.list_union.id, e.list_union.clone());
            }
            E::ListUnionEntriesUpdated(e) => {
                self.set_list_union_entries(e.list_union_id, &e.list_ids);
            }
            E::ListUnionMainListUpdated(e) => {
                if let Some(union) = self.list_unions.get_mut(&e.list_union_id) {
                    union.main_list_id = e.main_list_id;
                }
            }
            E::ListUnionsReordered(e) => {
                for entry in &e.positions {
                    if let Some(union) = self.list_unions.get_mut(&entry.id) {
                        union.position = entry.position;
                    }
                }
            }
            E::ListUnionDeleted(e) => {
                let removed = e.list_union_id;
                self.list_unions
                    .retain(|id, u| *id != removed && u.root_list_union_id != Some(removed));
            }
        }

        self.version += 1;
    }

    fn pending_events(&self) -> &PendingEvents<ProportionalElectionEvent> {
        &self.pending
    }

    fn pending_events_mut(&mut self) -> &mut PendingEvents<ProportionalElectionEvent> {
        &mut self.pending
    }
}

impl SoftDelete for ProportionalElection {
    fn is_created(&self) -> bool {
        self.created
    }

    fn is_deleted(&self) -> bool {
        self.deleted
    }
}

// State cascades shared by apply arms.
impl ProportionalElection {
    fn check_digits_enabled(&self) -> bool {
        self.data.as_ref().is_some_and(|d| d.candidate_check_digit)
    }

    fn refresh_check_digits(&mut self) {
        let enabled = self.check_digits_enabled();
        for list in self.lists.values_mut() {
            for candidate in list.candidates.values_mut() {
                candidate.check_digit = if enabled {
                    candidate_check_digit(&list.order_number, &candidate.number).unwrap_or(0)
                } else {
                    0
                };
            }
        }
    }

    fn remove_list(&mut self, list_id: ListId) {
        let Some(removed) = self.lists.remove(&list_id) else {
            return;
        };
        for list in self.lists.values_mut() {
            if list.position > removed.position {
                list.position -= 1;
            }
        }

        for union in self.list_unions.values_mut() {
            union.list_ids.retain(|id| *id != list_id);
        }

        let dangling: Vec<ListUnionId> = self
            .list_unions
            .values()
            .filter(|u| u.main_list_id == Some(list_id))
            .map(|u| u.id)
            .collect();
        if !dangling.is_empty() {
            tracing::debug!(
                election_id = %self.id,
                %list_id,
                removed_unions = dangling.len(),
                "removing list unions whose main list was deleted"
            );
        }
        self.list_unions.retain(|id, u| {
            !dangling.contains(id)
                && !u
                    .root_list_union_id
                    .is_some_and(|root| dangling.contains(&root))
        });
        self.compact_list_union_positions();
    }

    fn compact_list_union_positions(&mut self) {
        let mut scopes: BTreeMap<Option<ListUnionId>, Vec<(u32, ListUnionId)>> = BTreeMap::new();
        for union in self.list_unions.values() {
            scopes
                .entry(union.root_list_union_id)
                .or_default()
                .push((union.position, union.id));
        }
        for mut siblings in scopes.into_values() {
            siblings.sort();
            for (index, (_, id)) in siblings.into_iter().enumerate() {
                if let Some(union) = self.list_unions.get_mut(&id) {
                    union.position = index as u32 + 1;
                }
            }
        }
    }

    fn set_list_union_entries(&mut self, union_id: ListUnionId, list_ids: &[ListId]) {
        let Some(union) = self.list_unions.get_mut(&union_id) else {
            return;
        };
        union.list_ids = list_ids.to_vec();
        if union
            .main_list_id
            .is_some_and(|main| !list_ids.contains(&main))
        {
            union.main_list_id = None;
        }

        // Sub-unions only keep lists their root still holds.
        for sub in self
            .list_unions
            .values_mut()
            .filter(|u| u.root_list_union_id == Some(union_id))
        {
            sub.list_ids.retain(|id| list_ids.contains(id));
            if sub.main_list_id.is_some_and(|main| !list_ids.contains(&main)) {
                sub.main_list_id = None;
            }
        }
    }
}

// Election intent methods.
impl ProportionalElection {
    pub(crate) fn metadata(&self) -> Option<EventSignatureBusinessMetadata> {
        self.contest_id().map(EventSignatureBusinessMetadata::new)
    }

    pub(crate) fn current(&self) -> DomainResult<&ProportionalElectionData> {
        self.data
            .as_ref()
            .ok_or_else(|| DomainError::not_found(format!("proportional election {}", self.id)))
    }

    /// Guard shared by every structural mutation while the testing phase runs.
    pub(crate) fn ensure_modifiable(&self, contest_state: ContestState) -> DomainResult<()> {
        self.ensure_exists()?;
        ensure_in_testing_phase(contest_state)?;
        self.e_voting_approval.ensure_not_approved("proportional election")
    }

    /// Guard shared by every late (after testing phase) mutation.
    pub(crate) fn ensure_late_modifiable(&self, contest_state: ContestState) -> DomainResult<()> {
        self.ensure_exists()?;
        ensure_testing_phase_ended(contest_state)?;
        self.e_voting_approval.ensure_not_approved("proportional election")
    }

    pub(crate) fn ensure_numeric_if_check_digit(&self, what: &str, value: &str) -> DomainResult<()> {
        let numeric = !value.is_empty() && value.chars().all(|c| c.is_ascii_digit());
        if self.check_digits_enabled() && !numeric {
            return Err(DomainError::validation(format!(
                "{what} must be numeric when candidate check digits are enabled"
            )));
        }
        Ok(())
    }

    pub(crate) fn check_digit_for(&self, list: &List, number: &str) -> DomainResult<u32> {
        if !self.check_digits_enabled() {
            return Ok(0);
        }
        candidate_check_digit(&list.order_number, number)
    }

    fn validated_data(
        &self,
        input: ProportionalElectionInput,
    ) -> DomainResult<ProportionalElectionData> {
        if input.political_business_number.trim().is_empty() {
            return Err(DomainError::validation(
                "political business number cannot be empty",
            ));
        }
        if input.official_description.is_empty() || input.short_description.is_empty() {
            return Err(DomainError::validation("election descriptions cannot be empty"));
        }
        if input.number_of_mandates == 0 {
            return Err(DomainError::validation("an election needs at least one mandate"));
        }

        Ok(ProportionalElectionData {
            id: self.id,
            contest_id: input.contest_id,
            domain_of_influence_id: input.domain_of_influence_id,
            political_business_number: input.political_business_number,
            official_description: input.official_description,
            short_description: input.short_description,
            internal_description: input.internal_description,
            number_of_mandates: input.number_of_mandates,
            mandate_algorithm: input.mandate_algorithm,
            ballot_bundle_size: input.ballot_bundle_size,
            candidate_check_digit: input.candidate_check_digit,
            enforce_empty_vote_count_for_counting_circles: input
                .enforce_empty_vote_count_for_counting_circles,
            enforce_candidate_check_digit_for_counting_circles: input
                .enforce_candidate_check_digit_for_counting_circles,
            enforce_review_procedure_for_counting_circles: input
                .enforce_review_procedure_for_counting_circles,
        })
    }

    pub fn create(
        &mut self,
        input: ProportionalElectionInput,
        contest_state: ContestState,
        contest_e_voting: bool,
        ctx: &CommandContext,
    ) -> DomainResult<()> {
        self.ensure_not_created()?;
        ensure_in_testing_phase(contest_state)?;
        let election = self.validated_data(input)?;

        let metadata = Some(EventSignatureBusinessMetadata::new(election.contest_id));
        self.raise(
            ProportionalElectionEvent::ProportionalElectionCreated(ProportionalElectionCreated {
                election,
                e_voting_approval: EVotingApproval::for_contest(contest_e_voting),
                event_info: ctx.event_info(),
            }),
            metadata,
        );
        Ok(())
    }

    pub fn update_from(
        &mut self,
        input: ProportionalElectionInput,
        contest_state: ContestState,
        ctx: &CommandContext,
    ) -> DomainResult<()> {
        self.ensure_modifiable(contest_state)?;
        let current = self.current()?;
        ensure_unchanged("contest_id", &current.contest_id, &input.contest_id)?;
        let election = self.validated_data(input)?;

        for list in self.lists.values() {
            if list.occupied_slots() + list.blank_row_count > election.number_of_mandates {
                return Err(DomainError::validation(format!(
                    "list {} holds more entries than the election has mandates",
                    list.order_number
                )));
            }
        }

        if !election.mandate_algorithm.supports_list_unions() && !self.list_unions.is_empty() {
            return Err(DomainError::validation(
                "the mandate algorithm does not support list unions, remove them first",
            ));
        }

        if election.candidate_check_digit {
            for list in self.lists.values() {
                let numeric = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
                if !numeric(&list.order_number)
                    || list.candidates.values().any(|c| !numeric(&c.number))
                {
                    return Err(DomainError::validation(format!(
                        "list {} has non-numeric numbers, check digits cannot be enabled",
                        list.order_number
                    )));
                }
            }
        }

        self.raise(
            ProportionalElectionEvent::ProportionalElectionUpdated(ProportionalElectionUpdated {
                election,
                event_info: ctx.event_info(),
            }),
            self.metadata(),
        );
        Ok(())
    }

    /// Restricted update once the testing phase has ended.
    pub fn update_after_testing_phase_ended(
        &mut self,
        input: ProportionalElectionInput,
        contest_state: ContestState,
        ctx: &CommandContext,
    ) -> DomainResult<()> {
        self.ensure_late_modifiable(contest_state)?;
        let current = self.current()?;
        ensure_unchanged("contest_id", &current.contest_id, &input.contest_id)?;
        ensure_unchanged(
            "domain_of_influence_id",
            &current.domain_of_influence_id,
            &input.domain_of_influence_id,
        )?;
        ensure_unchanged(
            "number_of_mandates",
            &current.number_of_mandates,
            &input.number_of_mandates,
        )?;
        ensure_unchanged(
            "mandate_algorithm",
            &current.mandate_algorithm,
            &input.mandate_algorithm,
        )?;
        ensure_unchanged(
            "ballot_bundle_size",
            &current.ballot_bundle_size,
            &input.ballot_bundle_size,
        )?;
        ensure_unchanged(
            "candidate_check_digit",
            &current.candidate_check_digit,
            &input.candidate_check_digit,
        )?;

        let election = self.validated_data(input)?;
        self.raise(
            ProportionalElectionEvent::ProportionalElectionAfterTestingPhaseUpdated(
                ProportionalElectionAfterTestingPhaseUpdated {
                    election_id: self.id,
                    political_business_number: election.political_business_number,
                    official_description: election.official_description,
                    short_description: election.short_description,
                    internal_description: election.internal_description,
                    enforce_empty_vote_count_for_counting_circles: election
                        .enforce_empty_vote_count_for_counting_circles,
                    enforce_candidate_check_digit_for_counting_circles: election
                        .enforce_candidate_check_digit_for_counting_circles,
                    enforce_review_procedure_for_counting_circles: election
                        .enforce_review_procedure_for_counting_circles,
                    event_info: ctx.event_info(),
                },
            ),
            self.metadata(),
        );
        Ok(())
    }

    /// Activation requires every list to be exactly full.
    pub fn update_active_state(
        &mut self,
        active: bool,
        contest_state: ContestState,
        ctx: &CommandContext,
    ) -> DomainResult<()> {
        self.ensure_exists()?;
        ensure_contest_unlocked(contest_state)?;
        self.e_voting_approval
            .ensure_not_approved("proportional election")?;

        if active {
            self.validate_lists_complete()?;
        }

        self.raise(
            ProportionalElectionEvent::ProportionalElectionActiveStateUpdated(
                ProportionalElectionActiveStateUpdated {
                    election_id: self.id,
                    active,
                    event_info: ctx.event_info(),
                },
            ),
            self.metadata(),
        );
        Ok(())
    }

    pub fn delete(&mut self, contest_state: ContestState, ctx: &CommandContext) -> DomainResult<()> {
        self.ensure_modifiable(contest_state)?;

        self.raise(
            ProportionalElectionEvent::ProportionalElectionDeleted(ProportionalElectionDeleted {
                election_id: self.id,
                event_info: ctx.event_info(),
            }),
            self.metadata(),
        );
        Ok(())
    }

    fn raise_approval(&mut self, approved: bool, ctx: &CommandContext) {
        self.raise(
            ProportionalElectionEvent::ProportionalElectionEVotingApprovalUpdated(
                ProportionalElectionEVotingApprovalUpdated {
                    election_id: self.id,
                    approved,
                    event_info: ctx.event_info(),
                },
            ),
            self.metadata(),
        );
    }

    pub fn approve_e_voting(
        &mut self,
        contest_state: ContestState,
        ctx: &CommandContext,
    ) -> DomainResult<()> {
        self.ensure_exists()?;
        ensure_contest_unlocked(contest_state)?;
        self.e_voting_approval.check_approve("proportional election")?;
        self.raise_approval(true, ctx);
        Ok(())
    }

    pub fn revert_e_voting_approval(
        &mut self,
        contest_state: ContestState,
        ctx: &CommandContext,
    ) -> DomainResult<()> {
        self.ensure_exists()?;
        ensure_contest_unlocked(contest_state)?;
        self.e_voting_approval.check_revert("proportional election")?;
        self.raise_approval(false, ctx);
        Ok(())
    }

    pub fn try_approve_e_voting(
        &mut self,
        contest_state: ContestState,
        ctx: &CommandContext,
    ) -> DomainResult<ApprovalOutcome> {
        self.ensure_exists()?;
        ensure_contest_unlocked(contest_state)?;
        let outcome = self
            .e_voting_approval
            .check_try_approve("proportional election")?;
        if outcome == ApprovalOutcome::Changed {
            self.raise_approval(true, ctx);
        }
        Ok(outcome)
    }

    /// Candidate lookup across all lists.
    pub fn find_candidate(&self, candidate_id: CandidateId) -> Option<(&List, &crate::Candidate)> {
        self.lists
            .values()
            .find_map(|l| l.candidates.get(&candidate_id).map(|c| (l, c)))
    }
}
