//! Political-business unions: elections of one kind grouped across domains of influence.

use std::collections::BTreeSet;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use votebasis_contest::ContestState;
use votebasis_core::{
    Aggregate, AggregateRoot, CommandContext, ContestId, DomainError, DomainResult, EventInfo,
    EventSignatureBusinessMetadata, MajorityElectionId, MajorityElectionUnionId, PendingEvents,
    ProportionalElectionId, ProportionalElectionUnionId, SoftDelete, TypedId,
};
use votebasis_events::Event;

use crate::testing_phase::ensure_in_testing_phase;

/// Which elections a union groups, and how its stream is named.
pub trait UnionKind:
    core::fmt::Debug + Clone + PartialEq + Eq + Send + Sync + 'static
{
    type Id: TypedId + Serialize + DeserializeOwned + Send + Sync + 'static;
    type MemberId: TypedId + Serialize + DeserializeOwned + Send + Sync + 'static;

    const AGGREGATE_TYPE: &'static str;
    const CREATED: &'static str;
    const UPDATED: &'static str;
    const ENTRIES_UPDATED: &'static str;
    const DELETED: &'static str;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProportionalElectionUnionKind;

impl UnionKind for ProportionalElectionUnionKind {
    type Id = ProportionalElectionUnionId;
    type MemberId = ProportionalElectionId;

    const AGGREGATE_TYPE: &'static str = "proportional_election_union";
    const CREATED: &'static str = "proportional_election_union.created";
    const UPDATED: &'static str = "proportional_election_union.updated";
    const ENTRIES_UPDATED: &'static str = "proportional_election_union.entries_updated";
    const DELETED: &'static str = "proportional_election_union.deleted";
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MajorityElectionUnionKind;

impl UnionKind for MajorityElectionUnionKind {
    type Id = MajorityElectionUnionId;
    type MemberId = MajorityElectionId;

    const AGGREGATE_TYPE: &'static str = "majority_election_union";
    const CREATED: &'static str = "majority_election_union.created";
    const UPDATED: &'static str = "majority_election_union.updated";
    const ENTRIES_UPDATED: &'static str = "majority_election_union.entries_updated";
    const DELETED: &'static str = "majority_election_union.deleted";
}

pub type ProportionalElectionUnion = PoliticalBusinessUnion<ProportionalElectionUnionKind>;
pub type MajorityElectionUnion = PoliticalBusinessUnion<MajorityElectionUnionKind>;

/// Aggregate root: a union of elections of kind `K`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoliticalBusinessUnion<K: UnionKind> {
    id: K::Id,
    contest_id: Option<ContestId>,
    description: String,
    member_ids: Vec<K::MemberId>,
    version: u64,
    created: bool,
    deleted: bool,
    pending: PendingEvents<UnionEvent<K>>,
}

impl<K: UnionKind> PoliticalBusinessUnion<K> {
    pub fn contest_id(&self) -> Option<ContestId> {
        self.contest_id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn member_ids(&self) -> &[K::MemberId] {
        &self.member_ids
    }
}

impl<K: UnionKind> AggregateRoot for PoliticalBusinessUnion<K> {
    type Id = K::Id;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct UnionCreated<K: UnionKind> {
    pub union_id: K::Id,
    pub contest_id: ContestId,
    pub description: String,
    pub event_info: EventInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct UnionUpdated<K: UnionKind> {
    pub union_id: K::Id,
    pub description: String,
    pub event_info: EventInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct UnionEntriesUpdated<K: UnionKind> {
    pub union_id: K::Id,
    pub member_ids: Vec<K::MemberId>,
    pub event_info: EventInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct UnionDeleted<K: UnionKind> {
    pub union_id: K::Id,
    pub event_info: EventInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", bound = "")]
pub enum UnionEvent<K: UnionKind> {
    UnionCreated(UnionCreated<K>),
    UnionUpdated(UnionUpdated<K>),
    UnionEntriesUpdated(UnionEntriesUpdated<K>),
    UnionDeleted(UnionDeleted<K>),
}

impl<K: UnionKind> Event for UnionEvent<K> {
    fn event_type(&self) -> &'static str {
        match self {
            UnionEvent::UnionCreated(_) => K::CREATED,
            UnionEvent::UnionUpdated(_) => K::UPDATED,
            UnionEvent::UnionEntriesUpdated(_) => K::ENTRIES_UPDATED,
            UnionEvent::UnionDeleted(_) => K::DELETED,
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn event_info(&self) -> &EventInfo {
        match self {
            UnionEvent::UnionCreated(e) => &e.event_info,
            UnionEvent::UnionUpdated(e) => &e.event_info,
            UnionEvent::UnionEntriesUpdated(e) => &e.event_info,
            UnionEvent::UnionDeleted(e) => &e.event_info,
        }
    }
}

impl<K: UnionKind> Aggregate for PoliticalBusinessUnion<K> {
    type Event = UnionEvent<K>;
    const AGGREGATE_TYPE: &'static str = K::AGGREGATE_TYPE;

    fn empty(id: K::Id) -> Self {
        Self {
            id,
            contest_id: None,
            description: String::new(),
            member_ids: Vec::new(),
            version: 0,
            created: false,
            deleted: false,
            pending: PendingEvents::new(),
        }
    }

    fn apply(&mut self, event: &Self::Event) {
        match event {
            UnionEvent::UnionCreated(e) => {
                self.contest_id = Some(e.contest_id);
                self.description = e.description.clone();
                self.created = true;
            }
            UnionEvent::UnionUpdated(e) => {
                self.description = e.description.clone();
            }
            UnionEvent::UnionEntriesUpdated(e) => {
                self.member_ids = e.member_ids.clone();
            }
            UnionEvent::UnionDeleted(_) => {
                self.deleted = true;
            }
        }

        self.version += 1;
    }

    fn pending_events(&self) -> &PendingEvents<Self::Event> {
        &self.pending
    }

    fn pending_events_mut(&mut self) -> &mut PendingEvents<Self::Event> {
        &mut self.pending
    }
}

impl<K: UnionKind> SoftDelete for PoliticalBusinessUnion<K> {
    fn is_created(&self) -> bool {
        self.created
    }

    fn is_deleted(&self) -> bool {
        self.deleted
    }
}

impl<K: UnionKind> PoliticalBusinessUnion<K> {
    fn metadata(&self) -> Option<EventSignatureBusinessMetadata> {
        self.contest_id.map(EventSignatureBusinessMetadata::new)
    }

    fn validated_description(description: String) -> DomainResult<String> {
        if description.trim().is_empty() {
            return Err(DomainError::validation("union description cannot be empty"));
        }
        Ok(description)
    }

    pub fn create(
        &mut self,
        contest_id: ContestId,
        description: String,
        contest_state: ContestState,
        ctx: &CommandContext,
    ) -> DomainResult<()> {
        self.ensure_not_created()?;
        ensure_in_testing_phase(contest_state)?;
        let description = Self::validated_description(description)?;

        self.raise(
            UnionEvent::UnionCreated(UnionCreated {
                union_id: self.id,
                contest_id,
                description,
                event_info: ctx.event_info(),
            }),
            Some(EventSignatureBusinessMetadata::new(contest_id)),
        );
        Ok(())
    }

    pub fn update(
        &mut self,
        description: String,
        contest_state: ContestState,
        ctx: &CommandContext,
    ) -> DomainResult<()> {
        self.ensure_exists()?;
        ensure_in_testing_phase(contest_state)?;
        let description = Self::validated_description(description)?;

        self.raise(
            UnionEvent::UnionUpdated(UnionUpdated {
                union_id: self.id,
                description,
                event_info: ctx.event_info(),
            }),
            self.metadata(),
        );
        Ok(())
    }

    /// Replace the member elections.
    ///
    /// Members must belong to this union's contest; the commanding layer checks
    /// that before calling.
    pub fn update_entries(
        &mut self,
        member_ids: Vec<K::MemberId>,
        contest_state: ContestState,
        ctx: &CommandContext,
    ) -> DomainResult<()> {
        self.ensure_exists()?;
        ensure_in_testing_phase(contest_state)?;

        let mut seen = BTreeSet::new();
        if let Some(duplicate) = member_ids.iter().find(|id| !seen.insert(**id)) {
            return Err(DomainError::validation(format!(
                "election {duplicate} is listed twice"
            )));
        }

        self.raise(
            UnionEvent::UnionEntriesUpdated(UnionEntriesUpdated {
                union_id: self.id,
                member_ids,
                event_info: ctx.event_info(),
            }),
            self.metadata(),
        );
        Ok(())
    }

    pub fn delete(&mut self, contest_state: ContestState, ctx: &CommandContext) -> DomainResult<()> {
        self.ensure_exists()?;
        ensure_in_testing_phase(contest_state)?;

        self.raise(
            UnionEvent::UnionDeleted(UnionDeleted {
                union_id: self.id,
                event_info: ctx.event_info(),
            }),
            self.metadata(),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use votebasis_core::UserId;

    fn ctx() -> CommandContext {
        CommandContext::at(UserId::new(), Utc::now())
    }

    fn created() -> ProportionalElectionUnion {
        let mut union = ProportionalElectionUnion::empty(ProportionalElectionUnionId::new());
        union
            .create(
                ContestId::new(),
                "Nationalratswahl".to_string(),
                ContestState::TestingPhase,
                &ctx(),
            )
            .unwrap();
        union
    }

    #[test]
    fn entries_reject_duplicates() {
        let mut union = created();
        let a = ProportionalElectionId::new();
        let err = union
            .update_entries(vec![a, a], ContestState::TestingPhase, &ctx())
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let b = ProportionalElectionId::new();
        union
            .update_entries(vec![a, b], ContestState::TestingPhase, &ctx())
            .unwrap();
        assert_eq!(union.member_ids(), &[a, b]);
    }

    #[test]
    fn mutations_are_testing_phase_gated() {
        let mut union = created();
        assert_eq!(
            union.update("x".into(), ContestState::Active, &ctx()),
            Err(DomainError::TestingPhaseEnded)
        );
        assert_eq!(
            union.delete(ContestState::PastLocked, &ctx()),
            Err(DomainError::ContestLocked)
        );
    }

    #[test]
    fn events_carry_contest_metadata_and_kind_names() {
        let mut union = MajorityElectionUnion::empty(MajorityElectionUnionId::new());
        let contest_id = ContestId::new();
        union
            .create(contest_id, "Ständerat".into(), ContestState::TestingPhase, &ctx())
            .unwrap();
        union.delete(ContestState::TestingPhase, &ctx()).unwrap();

        let raised = union.take_pending();
        assert_eq!(raised[0].event.event_type(), "majority_election_union.created");
        assert_eq!(raised[1].event.event_type(), "majority_election_union.deleted");
        assert!(raised
            .iter()
            .all(|r| r.metadata == Some(EventSignatureBusinessMetadata::new(contest_id))));
        assert!(matches!(
            union.update("y".into(), ContestState::TestingPhase, &ctx()),
            Err(DomainError::AggregateDeleted(_))
        ));
    }

    #[test]
    fn events_round_trip_through_json() {
        let mut union = created();
        union
            .update_entries(
                vec![ProportionalElectionId::new()],
                ContestState::TestingPhase,
                &ctx(),
            )
            .unwrap();
        let events: Vec<_> = union.take_pending().into_iter().map(|r| r.event).collect();

        let json = serde_json::to_value(&events).unwrap();
        assert_eq!(json[1]["type"], "UnionEntriesUpdated");
        let decoded: Vec<UnionEvent<ProportionalElectionUnionKind>> =
            serde_json::from_value(json).unwrap();
        let replayed = ProportionalElectionUnion::from_history(*union.id(), &decoded);
        assert_eq!(replayed, union);
    }
}
