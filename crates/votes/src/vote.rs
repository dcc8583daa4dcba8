use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use votebasis_contest::ContestState;
use votebasis_core::{
    Aggregate, AggregateRoot, BallotId, CommandContext, ContestId, DomainError, DomainOfInfluenceId,
    DomainResult, EventInfo, EventSignatureBusinessMetadata, PendingEvents, SoftDelete,
    Translations, VoteId,
};
use votebasis_events::Event;
use votebasis_political_business::{
    ApprovalOutcome, EVotingApproval, PoliticalBusiness, ensure_contest_unlocked,
    ensure_in_testing_phase, ensure_testing_phase_ended, ensure_unchanged,
};

use crate::ballot::{
    Ballot, BallotInput, BallotQuestion, BallotSubType, BallotType, TieBreakQuestion,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteType {
    /// All questions on one ballot.
    QuestionsOnSingleBallot,
    /// Main question and variants on separate ballots, one question each.
    VariantQuestionsOnMultipleBallots,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteResultAlgorithm {
    PopularMajority,
    PopularAndCountingCircleMajority,
    CountingCircleMajority,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteResultEntry {
    FinalResults,
    Detailed,
}

/// Caller-supplied vote fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteInput {
    pub contest_id: ContestId,
    pub domain_of_influence_id: DomainOfInfluenceId,
    pub political_business_number: String,
    pub official_description: Translations,
    pub short_description: Translations,
    pub internal_description: String,
    pub report_domain_of_influence_level: u32,
    pub result_algorithm: VoteResultAlgorithm,
    pub result_entry: VoteResultEntry,
    pub enforce_result_entry_for_counting_circles: bool,
    pub vote_type: VoteType,
}

/// Vote fields as recorded in created/updated events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteData {
    pub id: VoteId,
    pub contest_id: ContestId,
    pub domain_of_influence_id: DomainOfInfluenceId,
    pub political_business_number: String,
    pub official_description: Translations,
    pub short_description: Translations,
    pub internal_description: String,
    pub report_domain_of_influence_level: u32,
    pub result_algorithm: VoteResultAlgorithm,
    pub result_entry: VoteResultEntry,
    pub enforce_result_entry_for_counting_circles: bool,
    pub vote_type: VoteType,
}

/// Aggregate root: Vote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vote {
    id: VoteId,
    data: Option<VoteData>,
    active: bool,
    e_voting_approval: EVotingApproval,
    ballots: BTreeMap<BallotId, Ballot>,
    version: u64,
    created: bool,
    deleted: bool,
    pending: PendingEvents<VoteEvent>,
}

impl Vote {
    pub fn data(&self) -> Option<&VoteData> {
        self.data.as_ref()
    }

    pub fn vote_type(&self) -> Option<VoteType> {
        self.data.as_ref().map(|d| d.vote_type)
    }

    /// Ballots ordered by position.
    pub fn ballots(&self) -> Vec<&Ballot> {
        let mut ballots: Vec<&Ballot> = self.ballots.values().collect();
        ballots.sort_by_key(|b| b.position);
        ballots
    }

    pub fn ballot(&self, id: BallotId) -> DomainResult<&Ballot> {
        self.ballots
            .get(&id)
            .ok_or_else(|| DomainError::not_found(format!("ballot {id}")))
    }
}

impl PoliticalBusiness for Vote {
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

impl AggregateRoot for Vote {
    type Id = VoteId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Event: VoteCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteCreated {
    pub vote: VoteData,
    pub e_voting_approval: EVotingApproval,
    pub event_info: EventInfo,
}

/// Event: VoteUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteUpdated {
    pub vote: VoteData,
    pub event_info: EventInfo,
}

/// Event: VoteAfterTestingPhaseUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteAfterTestingPhaseUpdated {
    pub vote_id: VoteId,
    pub political_business_number: String,
    pub official_description: Translations,
    pub short_description: Translations,
    pub internal_description: String,
    pub enforce_result_entry_for_counting_circles: bool,
    pub event_info: EventInfo,
}

/// Event: VoteActiveStateUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteActiveStateUpdated {
    pub vote_id: VoteId,
    pub active: bool,
    pub event_info: EventInfo,
}

/// Event: VoteDeleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteDeleted {
    pub vote_id: VoteId,
    pub event_info: EventInfo,
}

/// Event: VoteEVotingApprovalUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteEVotingApprovalUpdated {
    pub vote_id: VoteId,
    pub approved: bool,
    pub event_info: EventInfo,
}

/// Event: BallotCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotCreated {
    pub vote_id: VoteId,
    pub ballot: Ballot,
    pub event_info: EventInfo,
}

/// Event: BallotUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotUpdated {
    pub vote_id: VoteId,
    pub ballot: Ballot,
    pub event_info: EventInfo,
}

/// Event: BallotAfterTestingPhaseUpdated (texts only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotAfterTestingPhaseUpdated {
    pub vote_id: VoteId,
    pub ballot: Ballot,
    pub event_info: EventInfo,
}

/// Event: BallotDeleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotDeleted {
    pub vote_id: VoteId,
    pub ballot_id: BallotId,
    pub event_info: EventInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum VoteEvent {
    VoteCreated(VoteCreated),
    VoteUpdated(VoteUpdated),
    VoteAfterTestingPhaseUpdated(VoteAfterTestingPhaseUpdated),
    VoteActiveStateUpdated(VoteActiveStateUpdated),
    VoteDeleted(VoteDeleted),
    VoteEVotingApprovalUpdated(VoteEVotingApprovalUpdated),
    BallotCreated(BallotCreated),
    BallotUpdated(BallotUpdated),
    BallotAfterTestingPhaseUpdated(BallotAfterTestingPhaseUpdated),
    BallotDeleted(BallotDeleted),
}

impl Event for VoteEvent {
    fn event_type(&self) -> &'static str {
        match self {
            VoteEvent::VoteCreated(_) => "vote.created",
            VoteEvent::VoteUpdated(_) => "vote.updated",
            VoteEvent::VoteAfterTestingPhaseUpdated(_) => "vote.after_testing_phase_updated",
            VoteEvent::VoteActiveStateUpdated(_) => "vote.active_state_updated",
            VoteEvent::VoteDeleted(_) => "vote.deleted",
            VoteEvent::VoteEVotingApprovalUpdated(_) => "vote.e_voting_approval_updated",
            VoteEvent::BallotCreated(_) => "vote.ballot_created",
            VoteEvent::BallotUpdated(_) => "vote.ballot_updated",
            VoteEvent::BallotAfterTestingPhaseUpdated(_) => {
                "vote.ballot_after_testing_phase_updated"
            }
            VoteEvent::BallotDeleted(_) => "vote.ballot_deleted",
        }
    }

    fn version(&self) -> u32 {
        match self {
            // v2 added `vote_type`.
            VoteEvent::VoteCreated(_) | VoteEvent::VoteUpdated(_) => 2,
            _ => 1,
        }
    }

    fn event_info(&self) -> &EventInfo {
        match self {
            VoteEvent::VoteCreated(e) => &e.event_info,
            VoteEvent::VoteUpdated(e) => &e.event_info,
            VoteEvent::VoteAfterTestingPhaseUpdated(e) => &e.event_info,
            VoteEvent::VoteActiveStateUpdated(e) => &e.event_info,
            VoteEvent::VoteDeleted(e) => &e.event_info,
            VoteEvent::VoteEVotingApprovalUpdated(e) => &e.event_info,
            VoteEvent::BallotCreated(e) => &e.event_info,
            VoteEvent::BallotUpdated(e) => &e.event_info,
            VoteEvent::BallotAfterTestingPhaseUpdated(e) => &e.event_info,
            VoteEvent::BallotDeleted(e) => &e.event_info,
        }
    }
}

impl Aggregate for Vote {
    type Event = VoteEvent;
    const AGGREGATE_TYPE: &'static str = "vote";

    fn empty(id: VoteId) -> Self {
        Self {
            id,
            data: None,
            active: false,
            e_voting_approval: EVotingApproval::Unsupported,
            ballots: BTreeMap::new(),
            version: 0,
            created: false,
            deleted: false,
            pending: PendingEvents::new(),
        }
    }

    fn apply(&mut self, event: &Self::Event) {
        match event {
            VoteEvent::VoteCreated(e) => {
                self.data = Some(e.vote.clone());
                self.e_voting_approval = e.e_voting_approval;
                self.created = true;
            }
            VoteEvent::VoteUpdated(e) => {
                self.data = Some(e.vote.clone());
            }
            VoteEvent::VoteAfterTestingPhaseUpdated(e) => {
                if let Some(data) = self.data.as_mut() {
                    data.political_business_number = e.political_business_number.clone();
                    data.official_description = e.official_description.clone();
                    data.short_description = e.short_description.clone();
                    data.internal_description = e.internal_description.clone();
                    data.enforce_result_entry_for_counting_circles =
                        e.enforce_result_entry_for_counting_circles;
                }
            }
            VoteEvent::VoteActiveStateUpdated(e) => {
                self.active = e.active;
            }
            VoteEvent::VoteDeleted(_) => {
                self.deleted = true;
            }
            VoteEvent::VoteEVotingApprovalUpdated(e) => {
                self.e_voting_approval = self.e_voting_approval.with_approved(e.approved);
            }
            VoteEvent::BallotCreated(e) => {
                self.ballots.insert(e.ballot.id, e.ballot.clone());
            }
            VoteEvent::BallotUpdated(e) => {
                self.ballots.insert(e.ballot.id, e.ballot.clone());
            }
            VoteEvent::BallotAfterTestingPhaseUpdated(e) => {
                self.ballots.insert(e.ballot.id, e.ballot.clone());
            }
            VoteEvent::BallotDeleted(e) => {
                if let Some(removed) = self.ballots.remove(&e.ballot_id) {
                    for ballot in self.ballots.values_mut() {
                        if ballot.position > removed.position {
                            ballot.position -= 1;
                        }
                    }
                }
            }
        }

        self.version += 1;
    }

    fn pending_events(&self) -> &PendingEvents<VoteEvent> {
        &self.pending
    }

    fn pending_events_mut(&mut self) -> &mut PendingEvents<VoteEvent> {
        &mut self.pending
    }
}

impl SoftDelete for Vote {
    fn is_created(&self) -> bool {
        self.created
    }

    fn is_deleted(&self) -> bool {
        self.deleted
    }
}

/// Validate the ballots of a vote as a whole against its vote type.
fn validate_ballot_set(vote_type: VoteType, ballots: &[&Ballot]) -> DomainResult<()> {
    match vote_type {
        VoteType::QuestionsOnSingleBallot => {
            if ballots.len() > 1 {
                return Err(DomainError::validation(
                    "a vote with questions on a single ballot has only one ballot",
                ));
            }
            if ballots.iter().any(|b| b.sub_type != BallotSubType::Unspecified) {
                return Err(DomainError::validation(
                    "ballot sub types are only used for variant questions on multiple ballots",
                ));
            }
        }
        VoteType::VariantQuestionsOnMultipleBallots => {
            let mut previous: Option<BallotSubType> = None;
            for ballot in ballots {
                if ballot.sub_type == BallotSubType::Unspecified {
                    return Err(DomainError::validation(format!(
                        "ballot {} needs a sub type",
                        ballot.position
                    )));
                }
                if ballot.ballot_type != BallotType::StandardBallot || ballot.questions.len() != 1
                {
                    return Err(DomainError::validation(format!(
                        "ballot {} must carry exactly one question",
                        ballot.position
                    )));
                }
                if previous.is_some_and(|p| p >= ballot.sub_type) {
                    return Err(DomainError::validation(
                        "ballot sub types must be unique and follow the ballot order",
                    ));
                }
                previous = Some(ballot.sub_type);
            }
        }
    }
    Ok(())
}

impl Vote {
    fn metadata(&self) -> Option<EventSignatureBusinessMetadata> {
        self.contest_id().map(EventSignatureBusinessMetadata::new)
    }

    fn current(&self) -> DomainResult<&VoteData> {
        self.data
            .as_ref()
            .ok_or_else(|| DomainError::not_found(format!("vote {}", self.id)))
    }

    fn ensure_not_approved(&self) -> DomainResult<()> {
        self.e_voting_approval.ensure_not_approved("vote")
    }

    fn validated_data(&self, input: VoteInput) -> DomainResult<VoteData> {
        if input.political_business_number.trim().is_empty() {
            return Err(DomainError::validation(
                "political business number cannot be empty",
            ));
        }
        if input.official_description.is_empty() || input.short_description.is_empty() {
            return Err(DomainError::validation("vote descriptions cannot be empty"));
        }

        Ok(VoteData {
            id: self.id,
            contest_id: input.contest_id,
            domain_of_influence_id: input.domain_of_influence_id,
            political_business_number: input.political_business_number,
            official_description: input.official_description,
            short_description: input.short_description,
            internal_description: input.internal_description,
            report_domain_of_influence_level: input.report_domain_of_influence_level,
            result_algorithm: input.result_algorithm,
            result_entry: input.result_entry,
            enforce_result_entry_for_counting_circles: input
                .enforce_result_entry_for_counting_circles,
            vote_type: input.vote_type,
        })
    }

    /// Ballots after replacing (or adding) `ballot`, ordered by position.
    fn ballots_with<'a>(&'a self, ballot: &'a Ballot) -> Vec<&'a Ballot> {
        let mut ballots: Vec<&Ballot> = self
            .ballots
            .values()
            .filter(|b| b.id != ballot.id)
            .chain(core::iter::once(ballot))
            .collect();
        ballots.sort_by_key(|b| b.position);
        ballots
    }

    pub fn create(
        &mut self,
        input: VoteInput,
        contest_state: ContestState,
        contest_e_voting: bool,
        ctx: &CommandContext,
    ) -> DomainResult<()> {
        self.ensure_not_created()?;
        ensure_in_testing_phase(contest_state)?;
        let vote = self.validated_data(input)?;

        let metadata = Some(EventSignatureBusinessMetadata::new(vote.contest_id));
        self.raise(
            VoteEvent::VoteCreated(VoteCreated {
                vote,
                e_voting_approval: EVotingApproval::for_contest(contest_e_voting),
                event_info: ctx.event_info(),
            }),
            metadata,
        );
        Ok(())
    }

    /// Full update while the contest is in its testing phase.
    pub fn update_from(
        &mut self,
        input: VoteInput,
        contest_state: ContestState,
        ctx: &CommandContext,
    ) -> DomainResult<()> {
        self.ensure_exists()?;
        ensure_in_testing_phase(contest_state)?;
        self.ensure_not_approved()?;

        let current = self.current()?;
        ensure_unchanged("contest_id", &current.contest_id, &input.contest_id)?;
        let vote = self.validated_data(input)?;
        validate_ballot_set(vote.vote_type, &self.ballots())?;

        self.raise(
            VoteEvent::VoteUpdated(VoteUpdated {
                vote,
                event_info: ctx.event_info(),
            }),
            self.metadata(),
        );
        Ok(())
    }

    /// Restricted update once the testing phase has ended.
    ///
    /// Accepts the number, descriptions and the result entry enforcement flag.
    pub fn update_after_testing_phase_ended(
        &mut self,
        input: VoteInput,
        contest_state: ContestState,
        ctx: &CommandContext,
    ) -> DomainResult<()> {
        self.ensure_exists()?;
        ensure_testing_phase_ended(contest_state)?;
        self.ensure_not_approved()?;

        let current = self.current()?;
        ensure_unchanged("contest_id", &current.contest_id, &input.contest_id)?;
        ensure_unchanged(
            "domain_of_influence_id",
            &current.domain_of_influence_id,
            &input.domain_of_influence_id,
        )?;
        ensure_unchanged(
            "report_domain_of_influence_level",
            &current.report_domain_of_influence_level,
            &input.report_domain_of_influence_level,
        )?;
        ensure_unchanged(
            "result_algorithm",
            &current.result_algorithm,
            &input.result_algorithm,
        )?;
        ensure_unchanged("result_entry", &current.result_entry, &input.result_entry)?;
        ensure_unchanged("vote_type", &current.vote_type, &input.vote_type)?;

        let vote = self.validated_data(input)?;
        self.raise(
            VoteEvent::VoteAfterTestingPhaseUpdated(VoteAfterTestingPhaseUpdated {
                vote_id: self.id,
                political_business_number: vote.political_business_number,
                official_description: vote.official_description,
                short_description: vote.short_description,
                internal_description: vote.internal_description,
                enforce_result_entry_for_counting_circles: vote
                    .enforce_result_entry_for_counting_circles,
                event_info: ctx.event_info(),
            }),
            self.metadata(),
        );
        Ok(())
    }

    pub fn update_active_state(
        &mut self,
        active: bool,
        contest_state: ContestState,
        ctx: &CommandContext,
    ) -> DomainResult<()> {
        self.ensure_exists()?;
        ensure_contest_unlocked(contest_state)?;
        self.ensure_not_approved()?;

        self.raise(
            VoteEvent::VoteActiveStateUpdated(VoteActiveStateUpdated {
                vote_id: self.id,
                active,
                event_info: ctx.event_info(),
            }),
            self.metadata(),
        );
        Ok(())
    }

    pub fn delete(&mut self, contest_state: ContestState, ctx: &CommandContext) -> DomainResult<()> {
        self.ensure_exists()?;
        ensure_in_testing_phase(contest_state)?;
        self.ensure_not_approved()?;

        self.raise(
            VoteEvent::VoteDeleted(VoteDeleted {
                vote_id: self.id,
                event_info: ctx.event_info(),
            }),
            self.metadata(),
        );
        Ok(())
    }

    fn raise_approval(&mut self, approved: bool, ctx: &CommandContext) {
        self.raise(
            VoteEvent::VoteEVotingApprovalUpdated(VoteEVotingApprovalUpdated {
                vote_id: self.id,
                approved,
                event_info: ctx.event_info(),
            }),
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
        self.e_voting_approval.check_approve("vote")?;
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
        self.e_voting_approval.check_revert("vote")?;
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
        let outcome = self.e_voting_approval.check_try_approve("vote")?;
        if outcome == ApprovalOutcome::Changed {
            self.raise_approval(true, ctx);
        }
        Ok(outcome)
    }

    pub fn create_ballot(
        &mut self,
        ballot_id: BallotId,
        input: BallotInput,
        contest_state: ContestState,
        ctx: &CommandContext,
    ) -> DomainResult<()> {
        self.ensure_exists()?;
        ensure_in_testing_phase(contest_state)?;
        self.ensure_not_approved()?;

        if self.ballots.contains_key(&ballot_id) {
            return Err(DomainError::conflict(format!(
                "ballot {ballot_id} already exists"
            )));
        }
        let expected = self.ballots.len() as u32 + 1;
        if input.position != expected {
            return Err(DomainError::validation(format!(
                "ballot position must be {expected}"
            )));
        }

        let ballot = input.into_ballot(ballot_id);
        ballot.validate_questions()?;
        validate_ballot_set(self.current()?.vote_type, &self.ballots_with(&ballot))?;

        self.raise(
            VoteEvent::BallotCreated(BallotCreated {
                vote_id: self.id,
                ballot,
                event_info: ctx.event_info(),
            }),
            self.metadata(),
        );
        Ok(())
    }

    pub fn update_ballot(
        &mut self,
        ballot_id: BallotId,
        input: BallotInput,
        contest_state: ContestState,
        ctx: &CommandContext,
    ) -> DomainResult<()> {
        self.ensure_exists()?;
        ensure_in_testing_phase(contest_state)?;
        self.ensure_not_approved()?;

        let current = self.ballot(ballot_id)?;
        if input.position != current.position {
            return Err(DomainError::validation("ballot position cannot change"));
        }

        let ballot = input.into_ballot(ballot_id);
        ballot.validate_questions()?;
        validate_ballot_set(self.current()?.vote_type, &self.ballots_with(&ballot))?;

        self.raise(
            VoteEvent::BallotUpdated(BallotUpdated {
                vote_id: self.id,
                ballot,
                event_info: ctx.event_info(),
            }),
            self.metadata(),
        );
        Ok(())
    }

    /// Update question texts once the testing phase has ended.
    ///
    /// Every structural field must match the current ballot.
    pub fn update_ballot_after_testing_phase_ended(
        &mut self,
        ballot_id: BallotId,
        input: BallotInput,
        contest_state: ContestState,
        ctx: &CommandContext,
    ) -> DomainResult<()> {
        self.ensure_exists()?;
        ensure_testing_phase_ended(contest_state)?;
        self.ensure_not_approved()?;

        let current = self.ballot(ballot_id)?;
        ensure_unchanged("position", &current.position, &input.position)?;
        ensure_unchanged("ballot_type", &current.ballot_type, &input.ballot_type)?;
        ensure_unchanged("sub_type", &current.sub_type, &input.sub_type)?;
        ensure_unchanged(
            "has_tie_break_questions",
            &current.has_tie_break_questions,
            &input.has_tie_break_questions,
        )?;

        let question_structure = |questions: &[BallotQuestion]| -> Vec<_> {
            questions.iter().map(|q| (q.number, q.question_type)).collect()
        };
        ensure_unchanged(
            "questions",
            &question_structure(&current.questions),
            &question_structure(&input.questions),
        )?;

        let tie_break_structure = |tie_breaks: &[TieBreakQuestion]| -> Vec<_> {
            tie_breaks
                .iter()
                .map(|t| (t.number, t.question1_number, t.question2_number))
                .collect()
        };
        ensure_unchanged(
            "tie_break_questions",
            &tie_break_structure(&current.tie_break_questions),
            &tie_break_structure(&input.tie_break_questions),
        )?;

        let ballot = current.with_texts_of(&input);
        ballot.validate_questions()?;
        self.raise(
            VoteEvent::BallotAfterTestingPhaseUpdated(BallotAfterTestingPhaseUpdated {
                vote_id: self.id,
                ballot,
                event_info: ctx.event_info(),
            }),
            self.metadata(),
        );
        Ok(())
    }

    /// Remove a ballot; later ballots move up one position.
    pub fn delete_ballot(
        &mut self,
        ballot_id: BallotId,
        contest_state: ContestState,
        ctx: &CommandContext,
    ) -> DomainResult<()> {
        self.ensure_exists()?;
        ensure_in_testing_phase(contest_state)?;
        self.ensure_not_approved()?;
        self.ballot(ballot_id)?;

        self.raise(
            VoteEvent::BallotDeleted(BallotDeleted {
                vote_id: self.id,
                ballot_id,
                event_info: ctx.event_info(),
            }),
            self.metadata(),
        );
        Ok(())
    }

    /// Sub types of the remaining ballots, for read models.
    pub fn sub_types(&self) -> BTreeSet<BallotSubType> {
        self.ballots.values().map(|b| b.sub_type).collect()
    }
}
