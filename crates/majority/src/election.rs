use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use votebasis_contest::ContestState;
use votebasis_core::{
    Aggregate, AggregateRoot, BallotGroupId, CandidateId, CommandContext, ContestId, DomainError,
    DomainOfInfluenceId, DomainResult, EventSignatureBusinessMetadata, MajorityElectionId,
    PendingEvents, SecondaryMajorityElectionId, SoftDelete, Translations,
};
use votebasis_political_business::{
    ApprovalOutcome, EVotingApproval, PoliticalBusiness, ensure_contest_unlocked,
    ensure_in_testing_phase, ensure_testing_phase_ended, ensure_unchanged,
};

use crate::ballot_group::{BallotGroup, BallotGroupEntry, EntryElection};
use crate::candidate::MajorityCandidate;
use crate::events::*;
use crate::secondary::{SecondaryCandidate, SecondaryMajorityElection};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MajorityElectionMandateAlgorithm {
    AbsoluteMajority,
    RelativeMajority,
}

/// Granularity in which counting circles enter their results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MajorityElectionResultEntry {
    Detailed,
    FinalResults,
}

/// Caller-supplied election fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MajorityElectionInput {
    pub contest_id: ContestId,
    pub domain_of_influence_id: DomainOfInfluenceId,
    pub political_business_number: String,
    pub official_description: Translations,
    pub short_description: Translations,
    pub internal_description: String,
    pub number_of_mandates: u32,
    pub mandate_algorithm: MajorityElectionMandateAlgorithm,
    pub result_entry: MajorityElectionResultEntry,
    pub ballot_bundle_size: u32,
    pub individual_candidates_disabled: bool,
    pub enforce_empty_vote_count_for_counting_circles: bool,
    pub enforce_result_entry_for_counting_circles: bool,
}

/// Election fields as recorded in created/updated events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MajorityElectionData {
    pub id: MajorityElectionId,
    pub contest_id: ContestId,
    pub domain_of_influence_id: DomainOfInfluenceId,
    pub political_business_number: String,
    pub official_description: Translations,
    pub short_description: Translations,
    pub internal_description: String,
    pub number_of_mandates: u32,
    pub mandate_algorithm: MajorityElectionMandateAlgorithm,
    pub result_entry: MajorityElectionResultEntry,
    pub ballot_bundle_size: u32,
    pub individual_candidates_disabled: bool,
    pub enforce_empty_vote_count_for_counting_circles: bool,
    pub enforce_result_entry_for_counting_circles: bool,
}

/// Aggregate root: MajorityElection.
///
/// Candidates, secondary elections and ballot groups are keyed by id; ballot
/// group entries and candidate references hold ids only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MajorityElection {
    pub(crate) id: MajorityElectionId,
    pub(crate) data: Option<MajorityElectionData>,
    pub(crate) active: bool,
    pub(crate) e_voting_approval: EVotingApproval,
    pub(crate) candidates: BTreeMap<CandidateId, MajorityCandidate>,
    pub(crate) secondary_elections: BTreeMap<SecondaryMajorityElectionId, SecondaryMajorityElection>,
    pub(crate) ballot_groups: BTreeMap<BallotGroupId, BallotGroup>,
    pub(crate) version: u64,
    pub(crate) created: bool,
    pub(crate) deleted: bool,
    pub(crate) pending: PendingEvents<MajorityElectionEvent>,
}

impl MajorityElection {
    pub fn data(&self) -> Option<&MajorityElectionData> {
        self.data.as_ref()
    }

    pub fn number_of_mandates(&self) -> u32 {
        self.data.as_ref().map_or(0, |d| d.number_of_mandates)
    }

    /// Candidates ordered by position.
    pub fn candidates(&self) -> Vec<&MajorityCandidate> {
        let mut candidates: Vec<&MajorityCandidate> = self.candidates.values().collect();
        candidates.sort_by_key(|c| c.position);
        candidates
    }

    pub fn candidate(&self, id: CandidateId) -> DomainResult<&MajorityCandidate> {
        self.candidates
            .get(&id)
            .ok_or_else(|| DomainError::not_found(format!("candidate {id}")))
    }

    /// Secondary elections ordered by position.
    pub fn secondary_elections(&self) -> Vec<&SecondaryMajorityElection> {
        let mut secondaries: Vec<&SecondaryMajorityElection> =
            self.secondary_elections.values().collect();
        secondaries.sort_by_key(|s| s.position);
        secondaries
    }

    pub fn secondary_election(
        &self,
        id: SecondaryMajorityElectionId,
    ) -> DomainResult<&SecondaryMajorityElection> {
        self.secondary_elections
            .get(&id)
            .ok_or_else(|| DomainError::not_found(format!("secondary majority election {id}")))
    }

    /// Ballot groups ordered by position.
    pub fn ballot_groups(&self) -> Vec<&BallotGroup> {
        let mut groups: Vec<&BallotGroup> = self.ballot_groups.values().collect();
        groups.sort_by_key(|g| g.position);
        groups
    }

    pub fn ballot_group(&self, id: BallotGroupId) -> DomainResult<&BallotGroup> {
        self.ballot_groups
            .get(&id)
            .ok_or_else(|| DomainError::not_found(format!("ballot group {id}")))
    }

    /// Elections sharing the primary ballot: the primary plus every co-ballot secondary.
    pub fn elections_on_ballot(&self) -> Vec<EntryElection> {
        std::iter::once(EntryElection::Primary)
            .chain(
                self.secondary_elections()
                    .into_iter()
                    .filter(|s| !s.is_on_separate_ballot)
                    .map(|s| EntryElection::Secondary(s.id)),
            )
            .collect()
    }

    pub(crate) fn mandates_of(&self, election: EntryElection) -> DomainResult<u32> {
        match election {
            EntryElection::Primary => Ok(self.number_of_mandates()),
            EntryElection::Secondary(id) => Ok(self.secondary_election(id)?.number_of_mandates),
        }
    }

    /// Whether any ballot group entry lists `candidate_id`.
    pub fn is_in_ballot_group(&self, candidate_id: CandidateId) -> bool {
        self.ballot_groups
            .values()
            .flat_map(|g| g.entries.iter())
            .any(|e| e.candidate_ids.contains(&candidate_id))
    }

    /// Check the entry equation of every ballot group entry.
    pub fn validate_ballot_groups_complete(&self) -> DomainResult<()> {
        self.validate_entries_complete(|_| true)
    }

    pub(crate) fn validate_entries_complete(
        &self,
        include: impl Fn(&BallotGroupEntry) -> bool,
    ) -> DomainResult<()> {
        for group in self.ballot_groups() {
            for entry in group.entries.iter().filter(|e| include(*e)) {
                let mandates = self.mandates_of(entry.election)?;
                if entry.filled() != mandates {
                    return Err(DomainError::validation(format!(
                        "ballot group {} covers {} of {mandates} mandates",
                        group.short_description,
                        entry.filled()
                    )));
                }
            }
        }
        Ok(())
    }
}

impl PoliticalBusiness for MajorityElection {
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

impl AggregateRoot for MajorityElection {
    type Id = MajorityElectionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

impl Aggregate for MajorityElection {
    type Event = MajorityElectionEvent;
    const AGGREGATE_TYPE: &'static str = "majority_election";

    fn empty(id: MajorityElectionId) -> Self {
        Self {
            id,
            data: None,
            active: false,
            e_voting_approval: EVotingApproval::Unsupported,
            candidates: BTreeMap::new(),
            secondary_elections: BTreeMap::new(),
            ballot_groups: BTreeMap::new(),
            version: 0,
            created: false,
            deleted: false,
            pending: PendingEvents::new(),
        }
    }

    fn apply(&mut self, event: &Self::Event) {
        use MajorityElectionEvent as E;

        match event {
            E::MajorityElectionCreated(e) => {
                self.data = Some(e.election.clone());
                self.e_voting_approval = e.e_voting_approval;
                self.created = true;
            }
            E::MajorityElectionUpdated(e) => {
                self.data = Some(e.election.clone());
            }
            E::MajorityElectionAfterTestingPhaseUpdated(e) => {
                if let Some(data) = self.data.as_mut() {
                    data.political_business_number = e.political_business_number.clone();
                    data.official_description = e.official_description.clone();
                    data.short_description = e.short_description.clone();
                    data.internal_description = e.internal_description.clone();
                    data.enforce_empty_vote_count_for_counting_circles =
                        e.enforce_empty_vote_count_for_counting_circles;
                    data.enforce_result_entry_for_counting_circles =
                        e.enforce_result_entry_for_counting_circles;
                }
            }
            E::MajorityElectionActiveStateUpdated(e) => {
                self.active = e.active;
            }
            E::MajorityElectionDeleted(_) => {
                self.deleted = true;
            }
            E::MajorityElectionEVotingApprovalUpdated(e) => {
                self.e_voting_approval = self.e_voting_approval.with_approved(e.approved);
            }

            E::CandidateCreated(e) => {
                self.candidates.insert(e.candidate.id, e.candidate.clone());
            }
            E::CandidateUpdated(e) => self.replace_candidate(&e.candidate),
            E::CandidateAfterTestingPhaseUpdated(e) => self.replace_candidate(&e.candidate),
            E::CandidatesReordered(e) => {
                for entry in &e.positions {
                    if let Some(candidate) = self.candidates.get_mut(&entry.id) {
                        candidate.position = entry.position;
                    }
                }
            }
            E::CandidateDeleted(e) => self.remove_candidate(e.candidate_id),

            E::SecondaryElectionCreated(e) => {
                let secondary = SecondaryMajorityElection::from_data(
                    &e.secondary_election,
                    e.e_voting_approval,
                );
                self.secondary_elections.insert(secondary.id, secondary);
                for assignment in &e.ballot_group_entries {
                    if let Some(group) = self.ballot_groups.get_mut(&assignment.ballot_group_id) {
                        group.entries.push(BallotGroupEntry::empty(
                            assignment.entry_id,
                            EntryElection::Secondary(e.secondary_election.id),
                        ));
                    }
                }
            }
            E::SecondaryElectionUpdated(e) => {
                if let Some(secondary) = self.secondary_elections.get_mut(&e.secondary_election.id)
                {
                    secondary.apply_data(&e.secondary_election);
                }
            }
            E::SecondaryElectionAfterTestingPhaseUpdated(e) => {
                if let Some(secondary) = self.secondary_elections.get_mut(&e.secondary_election_id)
                {
                    secondary.political_business_number = e.political_business_number.clone();
                    secondary.official_description = e.official_description.clone();
                    secondary.short_description = e.short_description.clone();
                }
            }
            E::SecondaryElectionActiveStateUpdated(e) => {
                if let Some(secondary) = self.secondary_elections.get_mut(&e.secondary_election_id)
                {
                    secondary.active = e.active;
                }
            }
            E::SecondaryElectionEVotingApprovalUpdated(e) => {
                if let Some(secondary) = self.secondary_elections.get_mut(&e.secondary_election_id)
                {
                    secondary.e_voting_approval =
                        secondary.e_voting_approval.with_approved(e.approved);
                }
            }
            E::SecondaryElectionDeleted(e) => self.remove_secondary_election(e.secondary_election_id),

            E::SecondaryCandidateCreated(e) => {
                self.insert_secondary_candidate(e.secondary_election_id, &e.candidate)
            }
            E::SecondaryCandidateUpdated(e) => {
                self.insert_secondary_candidate(e.secondary_election_id, &e.candidate)
            }
            E::CandidateReferenceCreated(e) => {
                self.insert_secondary_candidate(e.secondary_election_id, &e.candidate)
            }
            E::CandidateReferenceUpdated(e) => {
                self.insert_secondary_candidate(e.secondary_election_id, &e.candidate)
            }
            E::SecondaryCandidatesReordered(e) => {
                if let Some(secondary) = self.secondary_elections.get_mut(&e.secondary_election_id)
                {
                    for entry in &e.positions {
                        if let Some(candidate) = secondary.candidates.get_mut(&entry.id) {
                            candidate.position = entry.position;
                        }
                    }
                }
            }
            E::SecondaryCandidateDeleted(e) => {
                let removed = self
                    .secondary_elections
                    .get_mut(&e.secondary_election_id)
                    .and_then(|s| s.remove_candidate(e.candidate_id));
                if removed.is_some() {
                    self.purge_from_ballot_groups(&[e.candidate_id]);
                }
            }

            E::BallotGroupCreated(e) => {
                self.ballot_groups
                    .insert(e.ballot_group.id, e.ballot_group.clone());
            }
            E::BallotGroupUpdated(e) => {
                self.ballot_groups
                    .insert(e.ballot_group.id, e.ballot_group.clone());
            }
            E::BallotGroupCandidatesUpdated(e) => {
                if let Some(group) = self.ballot_groups.get_mut(&e.ballot_group_id) {
                    for update in &e.entries {
                        let entry = group.entries.iter_mut().find(|x| x.id == update.entry_id);
                        if let Some(entry) = entry {
                            entry.candidate_ids = update.candidate_ids.clone();
                            entry.individual_candidates_vote_count =
                                update.individual_candidates_vote_count;
                        }
                    }
                }
            }
            E::BallotGroupDeleted(e) => {
                if let Some(removed) = self.ballot_groups.remove(&e.ballot_group_id) {
                    for group in self.ballot_groups.values_mut() {
                        if group.position > removed.position {
                            group.position -= 1;
                        }
                    }
                }
            }
        }

        self.version += 1;
    }

    fn pending_events(&self) -> &PendingEvents<MajorityElectionEvent> {
        &self.pending
    }

    fn pending_events_mut(&mut self) -> &mut PendingEvents<MajorityElectionEvent> {
        &mut self.pending
    }
}

impl SoftDelete for MajorityElection {
    fn is_created(&self) -> bool {
        self.created
    }

    fn is_deleted(&self) -> bool {
        self.deleted
    }
}

// State cascades shared by apply arms.
impl MajorityElection {
    fn replace_candidate(&mut self, candidate: &MajorityCandidate) {
        self.candidates.insert(candidate.id, candidate.clone());
        for secondary in self.secondary_elections.values_mut() {
            secondary.refresh_references(candidate);
        }
    }

    fn remove_candidate(&mut self, candidate_id: CandidateId) {
        let Some(removed) = self.candidates.remove(&candidate_id) else {
            return;
        };
        for candidate in self.candidates.values_mut() {
            if candidate.position > removed.position {
                candidate.position -= 1;
            }
        }

        let mut purged = vec![candidate_id];
        for secondary in self.secondary_elections.values_mut() {
            purged.extend(secondary.remove_references_to(candidate_id));
        }
        if purged.len() > 1 {
            tracing::debug!(
                election_id = %self.id,
                %candidate_id,
                removed_references = purged.len() - 1,
                "removing candidate references of deleted candidate"
            );
        }
        self.purge_from_ballot_groups(&purged);
    }

    fn remove_secondary_election(&mut self, secondary_id: SecondaryMajorityElectionId) {
        let Some(removed) = self.secondary_elections.remove(&secondary_id) else {
            return;
        };
        for secondary in self.secondary_elections.values_mut() {
            if secondary.position > removed.position {
                secondary.position -= 1;
            }
        }
        for group in self.ballot_groups.values_mut() {
            group
                .entries
                .retain(|entry| entry.election != EntryElection::Secondary(secondary_id));
        }
    }

    fn insert_secondary_candidate(
        &mut self,
        secondary_id: SecondaryMajorityElectionId,
        candidate: &SecondaryCandidate,
    ) {
        if let Some(secondary) = self.secondary_elections.get_mut(&secondary_id) {
            secondary.candidates.insert(candidate.id, candidate.clone());
        }
    }

    fn purge_from_ballot_groups(&mut self, candidate_ids: &[CandidateId]) {
        for entry in self
            .ballot_groups
            .values_mut()
            .flat_map(|g| g.entries.iter_mut())
        {
            entry.candidate_ids.retain(|id| !candidate_ids.contains(id));
        }
    }
}

// Election intent methods.
impl MajorityElection {
    pub(crate) fn metadata(&self) -> Option<EventSignatureBusinessMetadata> {
        self.contest_id().map(EventSignatureBusinessMetadata::new)
    }

    pub(crate) fn current(&self) -> DomainResult<&MajorityElectionData> {
        self.data
            .as_ref()
            .ok_or_else(|| DomainError::not_found(format!("majority election {}", self.id)))
    }

    /// Guard shared by every structural mutation while the testing phase runs.
    pub(crate) fn ensure_modifiable(&self, contest_state: ContestState) -> DomainResult<()> {
        self.ensure_exists()?;
        ensure_in_testing_phase(contest_state)?;
        self.e_voting_approval.ensure_not_approved("majority election")
    }

    /// Guard shared by every late (after testing phase) mutation.
    pub(crate) fn ensure_late_modifiable(&self, contest_state: ContestState) -> DomainResult<()> {
        self.ensure_exists()?;
        ensure_testing_phase_ended(contest_state)?;
        self.e_voting_approval.ensure_not_approved("majority election")
    }

    fn validated_data(&self, input: MajorityElectionInput) -> DomainResult<MajorityElectionData> {
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

        Ok(MajorityElectionData {
            id: self.id,
            contest_id: input.contest_id,
            domain_of_influence_id: input.domain_of_influence_id,
            political_business_number: input.political_business_number,
            official_description: input.official_description,
            short_description: input.short_description,
            internal_description: input.internal_description,
            number_of_mandates: input.number_of_mandates,
            mandate_algorithm: input.mandate_algorithm,
            result_entry: input.result_entry,
            ballot_bundle_size: input.ballot_bundle_size,
            individual_candidates_disabled: input.individual_candidates_disabled,
            enforce_empty_vote_count_for_counting_circles: input
                .enforce_empty_vote_count_for_counting_circles,
            enforce_result_entry_for_counting_circles: input
                .enforce_result_entry_for_counting_circles,
        })
    }

    pub fn create(
        &mut self,
        input: MajorityElectionInput,
        contest_state: ContestState,
        contest_e_voting: bool,
        ctx: &CommandContext,
    ) -> DomainResult<()> {
        self.ensure_not_created()?;
        ensure_in_testing_phase(contest_state)?;
        let election = self.validated_data(input)?;

        let metadata = Some(EventSignatureBusinessMetadata::new(election.contest_id));
        self.raise(
            MajorityElectionEvent::MajorityElectionCreated(MajorityElectionCreated {
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
        input: MajorityElectionInput,
        contest_state: ContestState,
        ctx: &CommandContext,
    ) -> DomainResult<()> {
        self.ensure_modifiable(contest_state)?;
        let current = self.current()?;
        ensure_unchanged("contest_id", &current.contest_id, &input.contest_id)?;
        let election = self.validated_data(input)?;

        if election.individual_candidates_disabled
            && self
                .ballot_groups
                .values()
                .flat_map(|g| g.entries.iter())
                .any(|e| e.individual_candidates_vote_count > 0)
        {
            return Err(DomainError::validation(
                "ballot groups still count individual candidate votes",
            ));
        }
        self.ensure_entries_fit(EntryElection::Primary, election.number_of_mandates)?;
        self.ensure_blank_rows_allowed(
            election.number_of_mandates,
            self.elections_on_ballot().len(),
        )?;

        self.raise(
            MajorityElectionEvent::MajorityElectionUpdated(MajorityElectionUpdated {
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
        input: MajorityElectionInput,
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
        ensure_unchanged("result_entry", &current.result_entry, &input.result_entry)?;
        ensure_unchanged(
            "ballot_bundle_size",
            &current.ballot_bundle_size,
            &input.ballot_bundle_size,
        )?;
        ensure_unchanged(
            "individual_candidates_disabled",
            &current.individual_candidates_disabled,
            &input.individual_candidates_disabled,
        )?;

        let election = self.validated_data(input)?;
        self.raise(
            MajorityElectionEvent::MajorityElectionAfterTestingPhaseUpdated(
                MajorityElectionAfterTestingPhaseUpdated {
                    election_id: self.id,
                    political_business_number: election.political_business_number,
                    official_description: election.official_description,
                    short_description: election.short_description,
                    internal_description: election.internal_description,
                    enforce_empty_vote_count_for_counting_circles: election
                        .enforce_empty_vote_count_for_counting_circles,
                    enforce_result_entry_for_counting_circles: election
                        .enforce_result_entry_for_counting_circles,
                    event_info: ctx.event_info(),
                },
            ),
            self.metadata(),
        );
        Ok(())
    }

    /// Activation requires every ballot group entry to cover its mandates exactly.
    pub fn update_active_state(
        &mut self,
        active: bool,
        contest_state: ContestState,
        ctx: &CommandContext,
    ) -> DomainResult<()> {
        self.ensure_exists()?;
        ensure_contest_unlocked(contest_state)?;
        self.e_voting_approval.ensure_not_approved("majority election")?;

        if active {
            self.validate_ballot_groups_complete()?;
        }

        self.raise(
            MajorityElectionEvent::MajorityElectionActiveStateUpdated(
                MajorityElectionActiveStateUpdated {
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
            MajorityElectionEvent::MajorityElectionDeleted(MajorityElectionDeleted {
                election_id: self.id,
                event_info: ctx.event_info(),
            }),
            self.metadata(),
        );
        Ok(())
    }

    fn raise_approval(&mut self, approved: bool, ctx: &CommandContext) {
        self.raise(
            MajorityElectionEvent::MajorityElectionEVotingApprovalUpdated(
                MajorityElectionEVotingApprovalUpdated {
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
        self.e_voting_approval.check_approve("majority election")?;
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
        self.e_voting_approval.check_revert("majority election")?;
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
        let outcome = self.e_voting_approval.check_try_approve("majority election")?;
        if outcome == ApprovalOutcome::Changed {
            self.raise_approval(true, ctx);
        }
        Ok(outcome)
    }
}
