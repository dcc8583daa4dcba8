use std::collections::BTreeSet;

use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use votebasis_core::{
    Aggregate, AggregateRoot, CommandContext, ContestId, DomainError, DomainOfInfluenceId,
    DomainResult, EventInfo, EventSignatureBusinessMetadata, PendingEvents, SoftDelete,
    Translations,
};
use votebasis_events::Event;

/// Contest lifecycle.
///
/// `TestingPhase → Active → PastLocked → {PastUnlocked | Archived}`; an unlocked
/// contest locks again once its new past-lock date is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContestState {
    TestingPhase,
    Active,
    PastLocked,
    PastUnlocked,
    Archived,
}

impl ContestState {
    pub fn testing_phase_ended(self) -> bool {
        !matches!(self, ContestState::TestingPhase)
    }

    pub fn is_locked(self) -> bool {
        matches!(self, ContestState::PastLocked | ContestState::Archived)
    }
}

/// Outcome of a time-driven transition attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied,
    NotApplicable,
}

/// Caller-supplied contest fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContestInput {
    pub date: DateTime<Utc>,
    pub description: Translations,
    pub end_of_testing_phase: DateTime<Utc>,
    pub domain_of_influence_id: DomainOfInfluenceId,
    pub e_voting: bool,
    pub e_voting_from: Option<DateTime<Utc>>,
    pub e_voting_to: Option<DateTime<Utc>>,
    pub previous_contest_id: Option<ContestId>,
}

/// Contest fields as recorded in created/updated events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContestData {
    pub id: ContestId,
    pub date: DateTime<Utc>,
    pub description: Translations,
    pub end_of_testing_phase: DateTime<Utc>,
    pub past_lock_per: DateTime<Utc>,
    pub domain_of_influence_id: DomainOfInfluenceId,
    pub e_voting: bool,
    pub e_voting_from: Option<DateTime<Utc>>,
    pub e_voting_to: Option<DateTime<Utc>>,
    pub previous_contest_id: Option<ContestId>,
}

/// Aggregate root: Contest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contest {
    id: ContestId,
    date: DateTime<Utc>,
    description: Translations,
    end_of_testing_phase: DateTime<Utc>,
    past_lock_per: DateTime<Utc>,
    archive_per: Option<DateTime<Utc>>,
    domain_of_influence_id: Option<DomainOfInfluenceId>,
    e_voting: bool,
    e_voting_from: Option<DateTime<Utc>>,
    e_voting_to: Option<DateTime<Utc>>,
    previous_contest_id: Option<ContestId>,
    merged_contest_ids: BTreeSet<ContestId>,
    state: ContestState,
    version: u64,
    created: bool,
    deleted: bool,
    pending: PendingEvents<ContestEvent>,
}

impl Contest {
    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    pub fn description(&self) -> &Translations {
        &self.description
    }

    pub fn end_of_testing_phase(&self) -> DateTime<Utc> {
        self.end_of_testing_phase
    }

    pub fn past_lock_per(&self) -> DateTime<Utc> {
        self.past_lock_per
    }

    pub fn archive_per(&self) -> Option<DateTime<Utc>> {
        self.archive_per
    }

    pub fn domain_of_influence_id(&self) -> Option<DomainOfInfluenceId> {
        self.domain_of_influence_id
    }

    pub fn e_voting(&self) -> bool {
        self.e_voting
    }

    pub fn e_voting_window(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        self.e_voting_from.zip(self.e_voting_to)
    }

    pub fn previous_contest_id(&self) -> Option<ContestId> {
        self.previous_contest_id
    }

    pub fn merged_contest_ids(&self) -> &BTreeSet<ContestId> {
        &self.merged_contest_ids
    }

    pub fn state(&self) -> ContestState {
        self.state
    }

    pub fn testing_phase_ended(&self) -> bool {
        self.state.testing_phase_ended()
    }

    pub fn is_locked(&self) -> bool {
        self.state.is_locked()
    }
}

impl AggregateRoot for Contest {
    type Id = ContestId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Event: ContestCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContestCreated {
    pub contest: ContestData,
    pub event_info: EventInfo,
}

/// Event: ContestUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContestUpdated {
    pub contest: ContestData,
    pub event_info: EventInfo,
}

/// Event: ContestDeleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContestDeleted {
    pub contest_id: ContestId,
    pub event_info: EventInfo,
}

/// Event: ContestTestingPhaseEnded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContestTestingPhaseEnded {
    pub contest_id: ContestId,
    pub event_info: EventInfo,
}

/// Event: ContestPastLocked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContestPastLocked {
    pub contest_id: ContestId,
    pub event_info: EventInfo,
}

/// Event: ContestPastUnlocked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContestPastUnlocked {
    pub contest_id: ContestId,
    pub past_lock_per: DateTime<Utc>,
    pub event_info: EventInfo,
}

/// Event: ContestArchiveDateUpdated (archival scheduled).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContestArchiveDateUpdated {
    pub contest_id: ContestId,
    pub archive_per: DateTime<Utc>,
    pub event_info: EventInfo,
}

/// Event: ContestArchived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContestArchived {
    pub contest_id: ContestId,
    /// Requested archive date; `None` archives at the event's own timestamp.
    pub archive_per: Option<DateTime<Utc>>,
    pub event_info: EventInfo,
}

/// Event: ContestsMerged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContestsMerged {
    pub contest_id: ContestId,
    pub merged_contest_ids: Vec<ContestId>,
    pub event_info: EventInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ContestEvent {
    ContestCreated(ContestCreated),
    ContestUpdated(ContestUpdated),
    ContestDeleted(ContestDeleted),
    ContestTestingPhaseEnded(ContestTestingPhaseEnded),
    ContestPastLocked(ContestPastLocked),
    ContestPastUnlocked(ContestPastUnlocked),
    ContestArchiveDateUpdated(ContestArchiveDateUpdated),
    ContestArchived(ContestArchived),
    ContestsMerged(ContestsMerged),
}

impl Event for ContestEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ContestEvent::ContestCreated(_) => "contest.created",
            ContestEvent::ContestUpdated(_) => "contest.updated",
            ContestEvent::ContestDeleted(_) => "contest.deleted",
            ContestEvent::ContestTestingPhaseEnded(_) => "contest.testing_phase_ended",
            ContestEvent::ContestPastLocked(_) => "contest.past_locked",
            ContestEvent::ContestPastUnlocked(_) => "contest.past_unlocked",
            ContestEvent::ContestArchiveDateUpdated(_) => "contest.archive_date_updated",
            ContestEvent::ContestArchived(_) => "contest.archived",
            ContestEvent::ContestsMerged(_) => "contest.merged",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn event_info(&self) -> &EventInfo {
        match self {
            ContestEvent::ContestCreated(e) => &e.event_info,
            ContestEvent::ContestUpdated(e) => &e.event_info,
            ContestEvent::ContestDeleted(e) => &e.event_info,
            ContestEvent::ContestTestingPhaseEnded(e) => &e.event_info,
            ContestEvent::ContestPastLocked(e) => &e.event_info,
            ContestEvent::ContestPastUnlocked(e) => &e.event_info,
            ContestEvent::ContestArchiveDateUpdated(e) => &e.event_info,
            ContestEvent::ContestArchived(e) => &e.event_info,
            ContestEvent::ContestsMerged(e) => &e.event_info,
        }
    }
}

impl Aggregate for Contest {
    type Event = ContestEvent;
    const AGGREGATE_TYPE: &'static str = "contest";

    fn empty(id: ContestId) -> Self {
        Self {
            id,
            date: DateTime::<Utc>::UNIX_EPOCH,
            description: Translations::default(),
            end_of_testing_phase: DateTime::<Utc>::UNIX_EPOCH,
            past_lock_per: DateTime::<Utc>::UNIX_EPOCH,
            archive_per: None,
            domain_of_influence_id: None,
            e_voting: false,
            e_voting_from: None,
            e_voting_to: None,
            previous_contest_id: None,
            merged_contest_ids: BTreeSet::new(),
            state: ContestState::TestingPhase,
            version: 0,
            created: false,
            deleted: false,
            pending: PendingEvents::new(),
        }
    }

    fn apply(&mut self, event: &Self::Event) {
        match event {
            ContestEvent::ContestCreated(e) => {
                self.apply_data(&e.contest);
                self.state = ContestState::TestingPhase;
                self.created = true;
            }
            ContestEvent::ContestUpdated(e) => {
                self.apply_data(&e.contest);
            }
            ContestEvent::ContestDeleted(_) => {
                self.deleted = true;
            }
            ContestEvent::ContestTestingPhaseEnded(_) => {
                self.state = ContestState::Active;
            }
            ContestEvent::ContestPastLocked(_) => {
                self.state = ContestState::PastLocked;
            }
            ContestEvent::ContestPastUnlocked(e) => {
                self.state = ContestState::PastUnlocked;
                self.past_lock_per = e.past_lock_per;
            }
            ContestEvent::ContestArchiveDateUpdated(e) => {
                self.archive_per = Some(e.archive_per);
            }
            ContestEvent::ContestArchived(e) => {
                // "Archive now" overrides a previously scheduled, later date.
                let occurred_at = e.event_info.occurred_at;
                let archive_per = e
                    .archive_per
                    .map_or(occurred_at, |requested| requested.min(occurred_at));
                self.archive_per = Some(archive_per);
                self.state = ContestState::Archived;
            }
            ContestEvent::ContestsMerged(e) => {
                self.merged_contest_ids.extend(e.merged_contest_ids.iter().copied());
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn pending_events(&self) -> &PendingEvents<ContestEvent> {
        &self.pending
    }

    fn pending_events_mut(&mut self) -> &mut PendingEvents<ContestEvent> {
        &mut self.pending
    }
}

impl SoftDelete for Contest {
    fn is_created(&self) -> bool {
        self.created
    }

    fn is_deleted(&self) -> bool {
        self.deleted
    }
}

/// Start of the UTC day following `at`.
fn next_utc_day(at: DateTime<Utc>) -> DomainResult<DateTime<Utc>> {
    at.date_naive()
        .succ_opt()
        .map(|day| day.and_time(NaiveTime::MIN).and_utc())
        .ok_or_else(|| DomainError::validation("date out of range"))
}

impl Contest {
    fn apply_data(&mut self, data: &ContestData) {
        self.date = data.date;
        self.description = data.description.clone();
        self.end_of_testing_phase = data.end_of_testing_phase;
        self.past_lock_per = data.past_lock_per;
        self.domain_of_influence_id = Some(data.domain_of_influence_id);
        self.e_voting = data.e_voting;
        self.e_voting_from = data.e_voting_from;
        self.e_voting_to = data.e_voting_to;
        self.previous_contest_id = data.previous_contest_id;
    }

    fn metadata(&self) -> Option<EventSignatureBusinessMetadata> {
        Some(EventSignatureBusinessMetadata::new(self.id))
    }

    fn ensure_in_testing_phase(&self) -> DomainResult<()> {
        if self.state.testing_phase_ended() {
            return Err(DomainError::TestingPhaseEnded);
        }
        Ok(())
    }

    fn validated_data(&self, input: ContestInput) -> DomainResult<ContestData> {
        if input.description.is_empty() {
            return Err(DomainError::validation("description cannot be empty"));
        }

        if input.end_of_testing_phase >= input.date {
            return Err(DomainError::validation(
                "testing phase must end before the contest date",
            ));
        }

        if input.previous_contest_id == Some(self.id) {
            return Err(DomainError::validation(
                "a contest cannot be its own predecessor",
            ));
        }

        let (e_voting_from, e_voting_to) = if input.e_voting {
            let (Some(from), Some(to)) = (input.e_voting_from, input.e_voting_to) else {
                return Err(DomainError::validation(
                    "e-voting requires a from and to date",
                ));
            };
            if from >= to {
                return Err(DomainError::validation(
                    "e-voting must start before it ends",
                ));
            }
            if to > input.date + Duration::days(1) {
                return Err(DomainError::validation(
                    "e-voting must end at most one day after the contest date",
                ));
            }
            (Some(from), Some(to))
        } else {
            (None, None)
        };

        Ok(ContestData {
            id: self.id,
            date: input.date,
            description: input.description,
            end_of_testing_phase: input.end_of_testing_phase,
            past_lock_per: next_utc_day(input.date)?,
            domain_of_influence_id: input.domain_of_influence_id,
            e_voting: input.e_voting,
            e_voting_from,
            e_voting_to,
            previous_contest_id: input.previous_contest_id,
        })
    }

    pub fn create(&mut self, input: ContestInput, ctx: &CommandContext) -> DomainResult<()> {
        self.ensure_not_created()?;
        let contest = self.validated_data(input)?;

        self.raise(
            ContestEvent::ContestCreated(ContestCreated {
                contest,
                event_info: ctx.event_info(),
            }),
            self.metadata(),
        );
        Ok(())
    }

    pub fn update(&mut self, input: ContestInput, ctx: &CommandContext) -> DomainResult<()> {
        self.ensure_exists()?;
        self.ensure_in_testing_phase()?;

        if Some(input.domain_of_influence_id) != self.domain_of_influence_id {
            return Err(DomainError::validation(
                "the domain of influence of a contest cannot change",
            ));
        }

        let contest = self.validated_data(input)?;
        self.raise(
            ContestEvent::ContestUpdated(ContestUpdated {
                contest,
                event_info: ctx.event_info(),
            }),
            self.metadata(),
        );
        Ok(())
    }

    pub fn delete(&mut self, ctx: &CommandContext) -> DomainResult<()> {
        self.ensure_exists()?;
        self.ensure_in_testing_phase()?;

        self.raise(
            ContestEvent::ContestDeleted(ContestDeleted {
                contest_id: self.id,
                event_info: ctx.event_info(),
            }),
            self.metadata(),
        );
        Ok(())
    }

    /// End the testing phase once its end date is reached.
    ///
    /// Contests that already left the testing phase are not applicable.
    pub fn try_end_testing_phase(&mut self, ctx: &CommandContext) -> DomainResult<Transition> {
        self.ensure_exists()?;

        if self.state != ContestState::TestingPhase {
            return Ok(Transition::NotApplicable);
        }

        if ctx.now() < self.end_of_testing_phase {
            return Err(DomainError::not_yet_reached(format!(
                "testing phase ends at {}",
                self.end_of_testing_phase
            )));
        }

        self.raise(
            ContestEvent::ContestTestingPhaseEnded(ContestTestingPhaseEnded {
                contest_id: self.id,
                event_info: ctx.event_info(),
            }),
            self.metadata(),
        );
        Ok(Transition::Applied)
    }

    pub fn try_set_past_locked(&mut self, ctx: &CommandContext) -> DomainResult<Transition> {
        self.ensure_exists()?;

        match self.state {
            ContestState::PastLocked | ContestState::Archived => {
                return Err(DomainError::invalid_state("contest is already locked"));
            }
            ContestState::TestingPhase => {
                return Err(DomainError::invalid_state(
                    "contest is still in its testing phase",
                ));
            }
            ContestState::Active | ContestState::PastUnlocked => {}
        }

        if ctx.now() < self.past_lock_per {
            return Err(DomainError::not_yet_reached(format!(
                "contest locks at {}",
                self.past_lock_per
            )));
        }

        self.raise(
            ContestEvent::ContestPastLocked(ContestPastLocked {
                contest_id: self.id,
                event_info: ctx.event_info(),
            }),
            self.metadata(),
        );
        Ok(Transition::Applied)
    }

    /// Unlock a past-locked contest until the end of the current UTC day.
    pub fn past_unlock(&mut self, ctx: &CommandContext) -> DomainResult<()> {
        self.ensure_exists()?;

        if self.state != ContestState::PastLocked {
            return Err(DomainError::invalid_state(
                "only past locked contests can be unlocked",
            ));
        }

        self.raise(
            ContestEvent::ContestPastUnlocked(ContestPastUnlocked {
                contest_id: self.id,
                past_lock_per: next_utc_day(ctx.now())?,
                event_info: ctx.event_info(),
            }),
            self.metadata(),
        );
        Ok(())
    }

    /// Archive now (`None`) or schedule archival at `archive_per`.
    pub fn archive(
        &mut self,
        archive_per: Option<DateTime<Utc>>,
        ctx: &CommandContext,
    ) -> DomainResult<()> {
        self.ensure_exists()?;

        if self.state != ContestState::PastLocked {
            return Err(DomainError::invalid_state(
                "only past locked contests can be archived",
            ));
        }

        match archive_per {
            Some(archive_per) => {
                if archive_per <= self.date || archive_per <= ctx.now() {
                    return Err(DomainError::validation(
                        "archive date must be after the contest date and in the future",
                    ));
                }
                self.raise(
                    ContestEvent::ContestArchiveDateUpdated(ContestArchiveDateUpdated {
                        contest_id: self.id,
                        archive_per,
                        event_info: ctx.event_info(),
                    }),
                    self.metadata(),
                );
            }
            None => {
                self.raise(
                    ContestEvent::ContestArchived(ContestArchived {
                        contest_id: self.id,
                        archive_per: None,
                        event_info: ctx.event_info(),
                    }),
                    self.metadata(),
                );
            }
        }
        Ok(())
    }

    /// Archive a past-locked contest whose scheduled archive date is reached.
    pub fn try_archive(&mut self, ctx: &CommandContext) -> DomainResult<Transition> {
        self.ensure_exists()?;

        if self.state != ContestState::PastLocked {
            return Ok(Transition::NotApplicable);
        }

        match self.archive_per {
            Some(archive_per) if archive_per <= ctx.now() => {
                self.raise(
                    ContestEvent::ContestArchived(ContestArchived {
                        contest_id: self.id,
                        archive_per: Some(archive_per),
                        event_info: ctx.event_info(),
                    }),
                    self.metadata(),
                );
                Ok(Transition::Applied)
            }
            _ => Ok(Transition::NotApplicable),
        }
    }

    /// Absorb other contests into this one.
    pub fn merge_contests(
        &mut self,
        contest_ids: Vec<ContestId>,
        ctx: &CommandContext,
    ) -> DomainResult<()> {
        self.ensure_exists()?;
        self.ensure_in_testing_phase()?;

        if contest_ids.is_empty() {
            return Err(DomainError::validation("no contests to merge"));
        }

        let mut seen = BTreeSet::new();
        for id in &contest_ids {
            if *id == self.id {
                return Err(DomainError::validation("a contest cannot be merged into itself"));
            }
            if !seen.insert(*id) {
                return Err(DomainError::validation(format!(
                    "contest {id} is listed twice"
                )));
            }
            if self.merged_contest_ids.contains(id) {
                return Err(DomainError::conflict(format!(
                    "contest {id} is already merged"
                )));
            }
        }

        self.raise(
            ContestEvent::ContestsMerged(ContestsMerged {
                contest_id: self.id,
                merged_contest_ids: contest_ids,
                event_info: ctx.event_info(),
            }),
            self.metadata(),
        );
        Ok(())
    }
}
