//! Counting circles: the units that count ballots and report results.
//!
//! Several circles can be merged into a new one. The merger is scheduled on the
//! new circle, which stays inactive until its activation date; the replaced
//! circles are then marked as merged one by one.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use votebasis_core::{
    Aggregate, AggregateRoot, CommandContext, CountingCircleId, DomainError, DomainResult,
    EventInfo, PendingEvents, SoftDelete,
};
use votebasis_events::Event;

use crate::canton::Canton;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountingCircleState {
    Active,
    /// Created by a scheduled merger that is not yet active.
    Inactive,
    /// Replaced by the circle of an activated merger.
    Merged,
}

/// Authority counting the ballots of a circle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authority {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub street: String,
    pub zip: String,
    pub city: String,
    pub secure_connect_id: String,
}

/// Caller-supplied counting circle fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountingCircleInput {
    pub name: String,
    pub bfs: String,
    pub code: String,
    pub sort_number: u32,
    pub canton: Canton,
    pub responsible_authority: Authority,
    pub e_voting: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountingCircleData {
    pub id: CountingCircleId,
    pub name: String,
    pub bfs: String,
    pub code: String,
    pub sort_number: u32,
    pub canton: Canton,
    pub responsible_authority: Authority,
    pub e_voting: bool,
}

/// Caller-supplied merger fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountingCirclesMergerInput {
    pub merged_counting_circle_ids: Vec<CountingCircleId>,
    /// Circle whose settings the new circle starts from.
    pub copy_from_counting_circle_id: CountingCircleId,
    pub active_from: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountingCirclesMerger {
    pub merged_counting_circle_ids: Vec<CountingCircleId>,
    pub copy_from_counting_circle_id: CountingCircleId,
    pub active_from: NaiveDate,
    pub merged: bool,
}

/// Aggregate root: CountingCircle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountingCircle {
    id: CountingCircleId,
    data: Option<CountingCircleData>,
    state: CountingCircleState,
    merger: Option<CountingCirclesMerger>,
    merged_into: Option<CountingCircleId>,
    version: u64,
    created: bool,
    deleted: bool,
    pending: PendingEvents<CountingCircleEvent>,
}

impl CountingCircle {
    pub fn data(&self) -> Option<&CountingCircleData> {
        self.data.as_ref()
    }

    pub fn state(&self) -> CountingCircleState {
        self.state
    }

    pub fn merger(&self) -> Option<&CountingCirclesMerger> {
        self.merger.as_ref()
    }

    pub fn merged_into(&self) -> Option<CountingCircleId> {
        self.merged_into
    }

    fn scheduled_merger(&self) -> DomainResult<&CountingCirclesMerger> {
        self.merger
            .as_ref()
            .filter(|m| !m.merged)
            .ok_or_else(|| {
                DomainError::invalid_state(format!(
                    "counting circle {} has no scheduled merger",
                    self.id
                ))
            })
    }
}

impl AggregateRoot for CountingCircle {
    type Id = CountingCircleId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Event: CountingCircleCreated / CountingCircleUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountingCircleChanged {
    pub counting_circle: CountingCircleData,
    pub event_info: EventInfo,
}

/// Event: CountingCircleDeleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountingCircleDeleted {
    pub counting_circle_id: CountingCircleId,
    pub event_info: EventInfo,
}

/// Event: CountingCirclesMergerScheduled / CountingCirclesScheduledMergerUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountingCirclesMergerChanged {
    pub counting_circle: CountingCircleData,
    pub merger: CountingCirclesMerger,
    pub event_info: EventInfo,
}

/// Event: CountingCirclesScheduledMergerDeleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountingCirclesScheduledMergerDeleted {
    pub counting_circle_id: CountingCircleId,
    pub event_info: EventInfo,
}

/// Event: CountingCirclesMergerActivated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountingCirclesMergerActivated {
    pub counting_circle_id: CountingCircleId,
    pub merged_counting_circle_ids: Vec<CountingCircleId>,
    pub event_info: EventInfo,
}

/// Event: CountingCircleMerged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountingCircleMerged {
    pub counting_circle_id: CountingCircleId,
    pub merged_into: CountingCircleId,
    pub event_info: EventInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum CountingCircleEvent {
    CountingCircleCreated(CountingCircleChanged),
    CountingCircleUpdated(CountingCircleChanged),
    CountingCircleDeleted(CountingCircleDeleted),
    CountingCirclesMergerScheduled(CountingCirclesMergerChanged),
    CountingCirclesScheduledMergerUpdated(CountingCirclesMergerChanged),
    CountingCirclesScheduledMergerDeleted(CountingCirclesScheduledMergerDeleted),
    CountingCirclesMergerActivated(CountingCirclesMergerActivated),
    CountingCircleMerged(CountingCircleMerged),
}

impl Event for CountingCircleEvent {
    fn event_type(&self) -> &'static str {
        use CountingCircleEvent as E;

        match self {
            E::CountingCircleCreated(_) => "counting_circle.created",
            E::CountingCircleUpdated(_) => "counting_circle.updated",
            E::CountingCircleDeleted(_) => "counting_circle.deleted",
            E::CountingCirclesMergerScheduled(_) => "counting_circle.merger_scheduled",
            E::CountingCirclesScheduledMergerUpdated(_) => "counting_circle.scheduled_merger_updated",
            E::CountingCirclesScheduledMergerDeleted(_) => "counting_circle.scheduled_merger_deleted",
            E::CountingCirclesMergerActivated(_) => "counting_circle.merger_activated",
            E::CountingCircleMerged(_) => "counting_circle.merged",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn event_info(&self) -> &EventInfo {
        use CountingCircleEvent as E;

        match self {
            E::CountingCircleCreated(e) | E::CountingCircleUpdated(e) => &e.event_info,
            E::CountingCircleDeleted(e) => &e.event_info,
            E::CountingCirclesMergerScheduled(e) | E::CountingCirclesScheduledMergerUpdated(e) => {
                &e.event_info
            }
            E::CountingCirclesScheduledMergerDeleted(e) => &e.event_info,
            E::CountingCirclesMergerActivated(e) => &e.event_info,
            E::CountingCircleMerged(e) => &e.event_info,
        }
    }
}

impl Aggregate for CountingCircle {
    type Event = CountingCircleEvent;
    const AGGREGATE_TYPE: &'static str = "counting_circle";

    fn empty(id: CountingCircleId) -> Self {
        Self {
            id,
            data: None,
            state: CountingCircleState::Active,
            merger: None,
            merged_into: None,
            version: 0,
            created: false,
            deleted: false,
            pending: PendingEvents::new(),
        }
    }

    fn apply(&mut self, event: &Self::Event) {
        use CountingCircleEvent as E;

        match event {
            E::CountingCircleCreated(e) => {
                self.data = Some(e.counting_circle.clone());
                self.state = CountingCircleState::Active;
                self.created = true;
            }
            E::CountingCircleUpdated(e) => {
                self.data = Some(e.counting_circle.clone());
            }
            E::CountingCircleDeleted(_) | E::CountingCirclesScheduledMergerDeleted(_) => {
                self.deleted = true;
            }
            E::CountingCirclesMergerScheduled(e) => {
                self.data = Some(e.counting_circle.clone());
                self.merger = Some(e.merger.clone());
                self.state = CountingCircleState::Inactive;
                self.created = true;
            }
            E::CountingCirclesScheduledMergerUpdated(e) => {
                self.data = Some(e.counting_circle.clone());
                self.merger = Some(e.merger.clone());
            }
            E::CountingCirclesMergerActivated(_) => {
                if let Some(merger) = self.merger.as_mut() {
                    merger.merged = true;
                }
                self.state = CountingCircleState::Active;
            }
            E::CountingCircleMerged(e) => {
                self.state = CountingCircleState::Merged;
                self.merged_into = Some(e.merged_into);
            }
        }

        self.version += 1;
    }

    fn pending_events(&self) -> &PendingEvents<CountingCircleEvent> {
        &self.pending
    }

    fn pending_events_mut(&mut self) -> &mut PendingEvents<CountingCircleEvent> {
        &mut self.pending
    }
}

impl SoftDelete for CountingCircle {
    fn is_created(&self) -> bool {
        self.created
    }

    fn is_deleted(&self) -> bool {
        self.deleted
    }
}

impl CountingCircle {
    fn validated_data(&self, input: CountingCircleInput) -> DomainResult<CountingCircleData> {
        if input.name.trim().is_empty() {
            return Err(DomainError::validation("counting circle name cannot be empty"));
        }
        if input.responsible_authority.secure_connect_id.trim().is_empty() {
            return Err(DomainError::validation(
                "counting circle needs a responsible authority",
            ));
        }
        Ok(CountingCircleData {
            id: self.id,
            name: input.name,
            bfs: input.bfs,
            code: input.code,
            sort_number: input.sort_number,
            canton: input.canton,
            responsible_authority: input.responsible_authority,
            e_voting: input.e_voting,
        })
    }

    fn validated_merger(
        &self,
        input: CountingCirclesMergerInput,
        ctx: &CommandContext,
    ) -> DomainResult<CountingCirclesMerger> {
        let merged: BTreeSet<CountingCircleId> =
            input.merged_counting_circle_ids.iter().copied().collect();
        if merged.len() != input.merged_counting_circle_ids.len() {
            return Err(DomainError::validation(
                "a counting circle can only be merged once",
            ));
        }
        if merged.len() < 2 {
            return Err(DomainError::validation(
                "a merger needs at least two counting circles",
            ));
        }
        if merged.contains(&self.id) {
            return Err(DomainError::validation(
                "the new counting circle cannot be part of its own merger",
            ));
        }
        if !merged.contains(&input.copy_from_counting_circle_id) {
            return Err(DomainError::validation(
                "settings can only be copied from a merged counting circle",
            ));
        }
        if input.active_from <= ctx.now().date_naive() {
            return Err(DomainError::validation("a merger must be scheduled in the future"));
        }
        Ok(CountingCirclesMerger {
            merged_counting_circle_ids: input.merged_counting_circle_ids,
            copy_from_counting_circle_id: input.copy_from_counting_circle_id,
            active_from: input.active_from,
            merged: false,
        })
    }

    pub fn create(&mut self, input: CountingCircleInput, ctx: &CommandContext) -> DomainResult<()> {
        self.ensure_not_created()?;
        let counting_circle = self.validated_data(input)?;

        self.raise(
            CountingCircleEvent::CountingCircleCreated(CountingCircleChanged {
                counting_circle,
                event_info: ctx.event_info(),
            }),
            None,
        );
        Ok(())
    }

    /// Merged circles are read-only; the canton is fixed.
    pub fn update(&mut self, input: CountingCircleInput, ctx: &CommandContext) -> DomainResult<()> {
        self.ensure_exists()?;
        if self.state == CountingCircleState::Merged {
            return Err(DomainError::invalid_state("merged counting circles cannot change"));
        }
        if self.data.as_ref().is_some_and(|d| d.canton != input.canton) {
            return Err(DomainError::modification_not_allowed("canton"));
        }
        let counting_circle = self.validated_data(input)?;

        self.raise(
            CountingCircleEvent::CountingCircleUpdated(CountingCircleChanged {
                counting_circle,
                event_info: ctx.event_info(),
            }),
            None,
        );
        Ok(())
    }

    /// Circles created by a pending merger are removed through
    /// [`delete_scheduled_merger`](Self::delete_scheduled_merger).
    pub fn delete(&mut self, ctx: &CommandContext) -> DomainResult<()> {
        self.ensure_exists()?;
        if self.state == CountingCircleState::Inactive {
            return Err(DomainError::invalid_state(
                "delete the scheduled merger of an inactive counting circle instead",
            ));
        }

        self.raise(
            CountingCircleEvent::CountingCircleDeleted(CountingCircleDeleted {
                counting_circle_id: self.id,
                event_info: ctx.event_info(),
            }),
            None,
        );
        Ok(())
    }

    /// Create this circle as the inactive result of merging other circles.
    pub fn create_merger(
        &mut self,
        input: CountingCircleInput,
        merger: CountingCirclesMergerInput,
        ctx: &CommandContext,
    ) -> DomainResult<()> {
        self.ensure_not_created()?;
        let counting_circle = self.validated_data(input)?;
        let merger = self.validated_merger(merger, ctx)?;

        self.raise(
            CountingCircleEvent::CountingCirclesMergerScheduled(CountingCirclesMergerChanged {
                counting_circle,
                merger,
                event_info: ctx.event_info(),
            }),
            None,
        );
        Ok(())
    }

    pub fn update_scheduled_merger(
        &mut self,
        input: CountingCircleInput,
        merger: CountingCirclesMergerInput,
        ctx: &CommandContext,
    ) -> DomainResult<()> {
        self.ensure_exists()?;
        self.scheduled_merger()?;
        let counting_circle = self.validated_data(input)?;
        let merger = self.validated_merger(merger, ctx)?;

        self.raise(
            CountingCircleEvent::CountingCirclesScheduledMergerUpdated(
                CountingCirclesMergerChanged {
                    counting_circle,
                    merger,
                    event_info: ctx.event_info(),
                },
            ),
            None,
        );
        Ok(())
    }

    /// Drop a merger that is not active yet, together with its new circle.
    pub fn delete_scheduled_merger(&mut self, ctx: &CommandContext) -> DomainResult<()> {
        self.ensure_exists()?;
        self.scheduled_merger()?;

        self.raise(
            CountingCircleEvent::CountingCirclesScheduledMergerDeleted(
                CountingCirclesScheduledMergerDeleted {
                    counting_circle_id: self.id,
                    event_info: ctx.event_info(),
                },
            ),
            None,
        );
        Ok(())
    }

    /// Activate the scheduled merger once its date is reached.
    ///
    /// Returns whether the merger was activated; the caller then marks every
    /// merged circle with [`mark_merged`](Self::mark_merged).
    pub fn try_activate_merger(&mut self, ctx: &CommandContext) -> DomainResult<bool> {
        self.ensure_exists()?;
        let merger = self.scheduled_merger()?;
        if ctx.now().date_naive() < merger.active_from {
            return Ok(false);
        }

        let merged_counting_circle_ids = merger.merged_counting_circle_ids.clone();
        tracing::info!(
            counting_circle_id = %self.id,
            merged = merged_counting_circle_ids.len(),
            "activating counting circle merger"
        );
        self.raise(
            CountingCircleEvent::CountingCirclesMergerActivated(CountingCirclesMergerActivated {
                counting_circle_id: self.id,
                merged_counting_circle_ids,
                event_info: ctx.event_info(),
            }),
            None,
        );
        Ok(true)
    }

    pub fn mark_merged(
        &mut self,
        merged_into: CountingCircleId,
        ctx: &CommandContext,
    ) -> DomainResult<()> {
        self.ensure_exists()?;
        if self.state != CountingCircleState::Active {
            return Err(DomainError::invalid_state(format!(
                "counting circle {} is not active",
                self.id
            )));
        }
        if merged_into == self.id {
            return Err(DomainError::validation(
                "a counting circle cannot be merged into itself",
            ));
        }

        self.raise(
            CountingCircleEvent::CountingCircleMerged(CountingCircleMerged {
                counting_circle_id: self.id,
                merged_into,
                event_info: ctx.event_info(),
            }),
            None,
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use votebasis_core::UserId;

    fn ctx_on(day: u32) -> CommandContext {
        CommandContext::at(
            UserId::new(),
            Utc.with_ymd_and_hms(2030, 3, day, 8, 0, 0).unwrap(),
        )
    }

    fn ctx() -> CommandContext {
        ctx_on(1)
    }

    fn input(name: &str) -> CountingCircleInput {
        CountingCircleInput {
            name: name.into(),
            bfs: "3203".into(),
            code: String::new(),
            sort_number: 1,
            canton: Canton::Sg,
            responsible_authority: Authority {
                name: format!("Stadtkanzlei {name}"),
                secure_connect_id: "authority".into(),
                ..Authority::default()
            },
            e_voting: false,
        }
    }

    fn active(name: &str) -> CountingCircle {
        let mut circle = CountingCircle::empty(CountingCircleId::new());
        circle.create(input(name), &ctx()).unwrap();
        circle
    }

    fn merger_of(circles: &[&CountingCircle], active_from: NaiveDate) -> CountingCirclesMergerInput {
        CountingCirclesMergerInput {
            merged_counting_circle_ids: circles.iter().map(|c| *c.id()).collect(),
            copy_from_counting_circle_id: *circles[0].id(),
            active_from,
        }
    }

    fn day(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2030, 3, day).unwrap()
    }

    #[test]
    fn merger_lifecycle() {
        let mut a = active("Gossau");
        let mut b = active("Andwil");

        let mut merged = CountingCircle::empty(CountingCircleId::new());
        merged
            .create_merger(input("Gossau-Andwil"), merger_of(&[&a, &b], day(10)), &ctx())
            .unwrap();
        assert_eq!(merged.state(), CountingCircleState::Inactive);
        assert!(matches!(merged.delete(&ctx()), Err(DomainError::InvalidState(_))));

        assert!(!merged.try_activate_merger(&ctx_on(9)).unwrap());
        assert!(merged.try_activate_merger(&ctx_on(10)).unwrap());
        assert_eq!(merged.state(), CountingCircleState::Active);
        assert!(merged.merger().unwrap().merged);
        assert!(matches!(
            merged.try_activate_merger(&ctx_on(11)),
            Err(DomainError::InvalidState(_))
        ));

        for circle in [&mut a, &mut b] {
            circle.mark_merged(*merged.id(), &ctx_on(10)).unwrap();
            assert_eq!(circle.state(), CountingCircleState::Merged);
            assert_eq!(circle.merged_into(), Some(*merged.id()));
        }
        assert!(matches!(
            a.update(input("Gossau"), &ctx()),
            Err(DomainError::InvalidState(_))
        ));
        assert!(matches!(
            a.mark_merged(*merged.id(), &ctx()),
            Err(DomainError::InvalidState(_))
        ));
    }

    #[test]
    fn merger_validation() {
        let a = active("Gossau");
        let b = active("Andwil");
        let mut merged = CountingCircle::empty(CountingCircleId::new());

        assert!(matches!(
            merged.create_merger(input("G"), merger_of(&[&a], day(10)), &ctx()),
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            merged.create_merger(input("G"), merger_of(&[&a, &a], day(10)), &ctx()),
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            merged.create_merger(input("G"), merger_of(&[&a, &b], day(1)), &ctx()),
            Err(DomainError::Validation(_))
        ));

        let mut foreign_template = merger_of(&[&a, &b], day(10));
        foreign_template.copy_from_counting_circle_id = CountingCircleId::new();
        assert!(matches!(
            merged.create_merger(input("G"), foreign_template, &ctx()),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn scheduled_merger_can_be_changed_or_dropped() {
        let a = active("Gossau");
        let b = active("Andwil");
        let c = active("Flawil");
        let mut merged = CountingCircle::empty(CountingCircleId::new());
        merged
            .create_merger(input("Gossau-Andwil"), merger_of(&[&a, &b], day(10)), &ctx())
            .unwrap();

        merged
            .update_scheduled_merger(input("Gossau-Flawil"), merger_of(&[&a, &b, &c], day(20)), &ctx())
            .unwrap();
        let merger = merged.merger().unwrap();
        assert_eq!(merger.merged_counting_circle_ids.len(), 3);
        assert_eq!(merger.active_from, day(1) + Duration::days(19));

        merged.delete_scheduled_merger(&ctx()).unwrap();
        assert!(merged.is_deleted());
    }

    #[test]
    fn plain_circle_has_no_merger_to_delete() {
        let mut circle = active("Wil");
        assert!(matches!(
            circle.delete_scheduled_merger(&ctx()),
            Err(DomainError::InvalidState(_))
        ));

        let mut moved = input("Wil");
        moved.canton = Canton::Tg;
        assert!(matches!(
            circle.update(moved, &ctx()),
            Err(DomainError::ModificationNotAllowed(_))
        ));
        circle.delete(&ctx()).unwrap();
    }

    #[test]
    fn replay_rebuilds_merger_state() {
        let a = active("Gossau");
        let b = active("Andwil");
        let mut merged = CountingCircle::empty(CountingCircleId::new());
        merged
            .create_merger(input("Gossau-Andwil"), merger_of(&[&a, &b], day(10)), &ctx())
            .unwrap();
        merged.try_activate_merger(&ctx_on(12)).unwrap();

        let history: Vec<CountingCircleEvent> =
            merged.take_pending().into_iter().map(|r| r.event).collect();
        assert_eq!(CountingCircle::from_history(*merged.id(), &history), merged);
    }
}
