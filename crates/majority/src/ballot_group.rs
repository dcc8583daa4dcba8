//! Ballot groups: pre-printed ballots bundling one entry per election on the ballot.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use votebasis_contest::ContestState;
use votebasis_core::{
    Aggregate, BallotGroupEntryId, BallotGroupId, CandidateId, CommandContext, DomainError,
    DomainResult, Entity, SecondaryMajorityElectionId,
};

use crate::election::MajorityElection;
use crate::events::*;

/// The election a ballot group entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum EntryElection {
    Primary,
    Secondary(SecondaryMajorityElectionId),
}

/// One election's share of a ballot group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotGroupEntry {
    pub id: BallotGroupEntryId,
    pub election: EntryElection,
    pub candidate_ids: Vec<CandidateId>,
    pub individual_candidates_vote_count: u32,
    pub blank_row_count: u32,
}

impl BallotGroupEntry {
    pub(crate) fn empty(id: BallotGroupEntryId, election: EntryElection) -> Self {
        Self {
            id,
            election,
            candidate_ids: Vec::new(),
            individual_candidates_vote_count: 0,
            blank_row_count: 0,
        }
    }

    /// Rows taken by candidates, individual votes and blank rows.
    pub fn filled(&self) -> u32 {
        self.candidate_ids.len() as u32 + self.individual_candidates_vote_count + self.blank_row_count
    }

    fn has_content(&self) -> bool {
        !self.candidate_ids.is_empty() || self.individual_candidates_vote_count > 0
    }
}

/// Nested entity: BallotGroup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotGroup {
    pub id: BallotGroupId,
    pub position: u32,
    pub description: String,
    pub short_description: String,
    pub entries: Vec<BallotGroupEntry>,
}

impl Entity for BallotGroup {
    type Id = BallotGroupId;

    fn id(&self) -> &BallotGroupId {
        &self.id
    }
}

impl BallotGroup {
    pub fn entry(&self, id: BallotGroupEntryId) -> DomainResult<&BallotGroupEntry> {
        self.entries
            .iter()
            .find(|e| e.id == id)
            .ok_or_else(|| DomainError::not_found(format!("ballot group entry {id}")))
    }

    pub fn entry_for(&self, election: EntryElection) -> Option<&BallotGroupEntry> {
        self.entries.iter().find(|e| e.election == election)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotGroupEntryInput {
    pub id: BallotGroupEntryId,
    pub election: EntryElection,
    pub blank_row_count: u32,
}

/// Caller-supplied ballot group fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotGroupInput {
    pub position: u32,
    pub description: String,
    pub short_description: String,
    pub entries: Vec<BallotGroupEntryInput>,
}

/// New candidates of one entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotGroupEntryCandidates {
    pub entry_id: BallotGroupEntryId,
    pub candidate_ids: Vec<CandidateId>,
    pub individual_candidates_vote_count: u32,
}

/// Entry added to a ballot group for a new co-ballot secondary election.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotGroupEntryAssignment {
    pub ballot_group_id: BallotGroupId,
    pub entry_id: BallotGroupEntryId,
}

impl MajorityElection {
    fn individual_candidates_disabled(&self, election: EntryElection) -> DomainResult<bool> {
        match election {
            EntryElection::Primary => Ok(self.current()?.individual_candidates_disabled),
            EntryElection::Secondary(id) => {
                Ok(self.secondary_election(id)?.individual_candidates_disabled)
            }
        }
    }

    fn candidate_exists_in(&self, election: EntryElection, candidate_id: CandidateId) -> DomainResult<bool> {
        match election {
            EntryElection::Primary => Ok(self.candidates.contains_key(&candidate_id)),
            EntryElection::Secondary(id) => Ok(self
                .secondary_election(id)?
                .candidates
                .contains_key(&candidate_id)),
        }
    }

    /// Secondary elections are approved separately from the primary.
    fn ensure_entry_modifiable(&self, election: EntryElection) -> DomainResult<()> {
        match election {
            EntryElection::Primary => Ok(()),
            EntryElection::Secondary(id) => self
                .secondary_election(id)?
                .e_voting_approval
                .ensure_not_approved("secondary majority election"),
        }
    }

    /// Creating or deleting a group touches every election on the ballot.
    fn ensure_ballot_modifiable(&self) -> DomainResult<()> {
        for election in self.elections_on_ballot() {
            self.ensure_entry_modifiable(election)?;
        }
        Ok(())
    }

    /// Existing entries of `election` must fit `mandates`.
    pub(crate) fn ensure_entries_fit(
        &self,
        election: EntryElection,
        mandates: u32,
    ) -> DomainResult<()> {
        for group in self.ballot_groups() {
            if let Some(entry) = group.entry_for(election) {
                if entry.filled() > mandates {
                    return Err(DomainError::validation(format!(
                        "ballot group {} fills {} rows, more than {mandates} mandates",
                        group.short_description,
                        entry.filled()
                    )));
                }
            }
        }
        Ok(())
    }

    /// A single mandate primary alone on its ballot has no blank rows.
    pub(crate) fn ensure_blank_rows_allowed(
        &self,
        mandates: u32,
        elections_on_ballot: usize,
    ) -> DomainResult<()> {
        let has_blank_rows = self
            .ballot_groups
            .values()
            .flat_map(|g| g.entries.iter())
            .any(|e| e.election == EntryElection::Primary && e.blank_row_count > 0);
        if mandates == 1 && elections_on_ballot == 1 && has_blank_rows {
            return Err(DomainError::validation(
                "a single mandate election without secondary elections cannot have blank rows",
            ));
        }
        Ok(())
    }

    /// Entries must cover exactly the elections on the ballot, once each.
    fn validate_entry_set(&self, entries: &[BallotGroupEntryInput]) -> DomainResult<()> {
        let on_ballot: BTreeSet<EntryElection> = self.elections_on_ballot().into_iter().collect();

        let mut seen_elections = BTreeSet::new();
        let mut seen_ids = BTreeSet::new();
        for entry in entries {
            if !seen_ids.insert(entry.id) {
                return Err(DomainError::validation(format!(
                    "ballot group entry {} is listed twice",
                    entry.id
                )));
            }
            if !on_ballot.contains(&entry.election) {
                return Err(DomainError::validation(
                    "ballot group entry for an election not on this ballot",
                ));
            }
            if !seen_elections.insert(entry.election) {
                return Err(DomainError::validation(
                    "ballot group has more than one entry per election",
                ));
            }
            if entry.blank_row_count > self.mandates_of(entry.election)? {
                return Err(DomainError::validation(
                    "blank rows exceed the number of mandates",
                ));
            }
        }
        if seen_elections != on_ballot {
            return Err(DomainError::validation(
                "ballot group needs exactly one entry per election on the ballot",
            ));
        }

        let single_mandate_alone = self.number_of_mandates() == 1 && on_ballot.len() == 1;
        if single_mandate_alone && entries.iter().any(|e| e.blank_row_count > 0) {
            return Err(DomainError::validation(
                "a single mandate election without secondary elections cannot have blank rows",
            ));
        }
        Ok(())
    }

    fn validate_ballot_group_texts(input: &BallotGroupInput) -> DomainResult<()> {
        if input.description.trim().is_empty() || input.short_description.trim().is_empty() {
            return Err(DomainError::validation(
                "ballot group descriptions cannot be empty",
            ));
        }
        Ok(())
    }

    pub fn create_ballot_group(
        &mut self,
        ballot_group_id: BallotGroupId,
        input: BallotGroupInput,
        contest_state: ContestState,
        ctx: &CommandContext,
    ) -> DomainResult<()> {
        self.ensure_modifiable(contest_state)?;
        self.ensure_ballot_modifiable()?;

        if self.ballot_groups.contains_key(&ballot_group_id) {
            return Err(DomainError::conflict(format!(
                "ballot group {ballot_group_id} already exists"
            )));
        }
        let expected = self.ballot_groups.len() as u32 + 1;
        if input.position != expected {
            return Err(DomainError::validation(format!(
                "ballot group position must be {expected}"
            )));
        }
        Self::validate_ballot_group_texts(&input)?;
        self.validate_entry_set(&input.entries)?;

        let ballot_group = BallotGroup {
            id: ballot_group_id,
            position: input.position,
            description: input.description,
            short_description: input.short_description,
            entries: input
                .entries
                .into_iter()
                .map(|e| BallotGroupEntry {
                    blank_row_count: e.blank_row_count,
                    ..BallotGroupEntry::empty(e.id, e.election)
                })
                .collect(),
        };
        self.raise(
            MajorityElectionEvent::BallotGroupCreated(BallotGroupCreated {
                ballot_group,
                event_info: ctx.event_info(),
            }),
            self.metadata(),
        );
        Ok(())
    }

    /// Update texts and blank rows; the chosen candidates stay.
    pub fn update_ballot_group(
        &mut self,
        ballot_group_id: BallotGroupId,
        input: BallotGroupInput,
        contest_state: ContestState,
        ctx: &CommandContext,
    ) -> DomainResult<()> {
        self.ensure_modifiable(contest_state)?;

        let current = self.ballot_group(ballot_group_id)?;
        if input.position != current.position {
            return Err(DomainError::validation("ballot group position cannot change"));
        }
        Self::validate_ballot_group_texts(&input)?;
        self.validate_entry_set(&input.entries)?;

        let mut entries = Vec::with_capacity(input.entries.len());
        for update in &input.entries {
            let existing = current.entry(update.id)?;
            if existing.election != update.election {
                return Err(DomainError::validation(format!(
                    "ballot group entry {} belongs to another election",
                    update.id
                )));
            }
            if existing.blank_row_count != update.blank_row_count {
                self.ensure_entry_modifiable(existing.election)?;
            }
            let entry = BallotGroupEntry {
                blank_row_count: update.blank_row_count,
                ..existing.clone()
            };
            if entry.filled() > self.mandates_of(entry.election)? {
                return Err(DomainError::validation(
                    "ballot group entry exceeds the number of mandates",
                ));
            }
            entries.push(entry);
        }

        let ballot_group = BallotGroup {
            id: ballot_group_id,
            position: current.position,
            description: input.description,
            short_description: input.short_description,
            entries,
        };
        self.raise(
            MajorityElectionEvent::BallotGroupUpdated(BallotGroupUpdated {
                ballot_group,
                event_info: ctx.event_info(),
            }),
            self.metadata(),
        );
        Ok(())
    }

    /// Set the candidates of some entries of a ballot group.
    ///
    /// Entries not listed keep their candidates; the resulting group must not
    /// consist of blank rows only.
    pub fn update_ballot_group_candidates(
        &mut self,
        ballot_group_id: BallotGroupId,
        entries: Vec<BallotGroupEntryCandidates>,
        contest_state: ContestState,
        ctx: &CommandContext,
    ) -> DomainResult<()> {
        self.ensure_modifiable(contest_state)?;
        let group = self.ballot_group(ballot_group_id)?;

        let mut updated_ids = BTreeSet::new();
        let mut resulting = Vec::with_capacity(entries.len());
        for update in &entries {
            if !updated_ids.insert(update.entry_id) {
                return Err(DomainError::validation(format!(
                    "ballot group entry {} is listed twice",
                    update.entry_id
                )));
            }
            let existing = group.entry(update.entry_id)?;
            self.ensure_entry_modifiable(existing.election)?;

            let mut seen = BTreeSet::new();
            for candidate_id in &update.candidate_ids {
                if !seen.insert(*candidate_id) {
                    return Err(DomainError::validation(format!(
                        "candidate {candidate_id} is listed twice"
                    )));
                }
                if !self.candidate_exists_in(existing.election, *candidate_id)? {
                    return Err(DomainError::not_found(format!("candidate {candidate_id}")));
                }
            }
            if update.individual_candidates_vote_count > 0
                && self.individual_candidates_disabled(existing.election)?
            {
                return Err(DomainError::validation(
                    "individual candidates are disabled for this election",
                ));
            }

            let entry = BallotGroupEntry {
                candidate_ids: update.candidate_ids.clone(),
                individual_candidates_vote_count: update.individual_candidates_vote_count,
                ..existing.clone()
            };
            if entry.filled() > self.mandates_of(entry.election)? {
                return Err(DomainError::validation(
                    "ballot group entry exceeds the number of mandates",
                ));
            }
            resulting.push(entry);
        }

        let untouched = group
            .entries
            .iter()
            .filter(|e| !updated_ids.contains(&e.id));
        if !resulting.iter().chain(untouched).any(BallotGroupEntry::has_content) {
            return Err(DomainError::validation(
                "a ballot group cannot consist of blank rows only",
            ));
        }

        self.raise(
            MajorityElectionEvent::BallotGroupCandidatesUpdated(BallotGroupCandidatesUpdated {
                ballot_group_id,
                entries,
                event_info: ctx.event_info(),
            }),
            self.metadata(),
        );
        Ok(())
    }

    /// Remove a ballot group; later groups move up.
    pub fn delete_ballot_group(
        &mut self,
        ballot_group_id: BallotGroupId,
        contest_state: ContestState,
        ctx: &CommandContext,
    ) -> DomainResult<()> {
        self.ensure_modifiable(contest_state)?;
        self.ensure_ballot_modifiable()?;
        self.ballot_group(ballot_group_id)?;

        self.raise(
            MajorityElectionEvent::BallotGroupDeleted(BallotGroupDeleted {
                ballot_group_id,
                event_info: ctx.event_info(),
            }),
            self.metadata(),
        );
        Ok(())
    }
}
