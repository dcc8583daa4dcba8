//! Political assemblies: municipal assemblies held outside of a contest.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use votebasis_core::{
    Aggregate, AggregateRoot, CommandContext, DomainError, DomainOfInfluenceId, DomainResult,
    EventInfo, PendingEvents, PoliticalAssemblyId, SoftDelete, Translations,
};
use votebasis_events::Event;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoliticalAssemblyInput {
    pub date: NaiveDate,
    pub description: Translations,
    pub domain_of_influence_id: DomainOfInfluenceId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoliticalAssemblyData {
    pub id: PoliticalAssemblyId,
    pub date: NaiveDate,
    pub description: Translations,
    pub domain_of_influence_id: DomainOfInfluenceId,
}

/// Aggregate root: PoliticalAssembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoliticalAssembly {
    id: PoliticalAssemblyId,
    data: Option<PoliticalAssemblyData>,
    version: u64,
    created: bool,
    deleted: bool,
    pending: PendingEvents<PoliticalAssemblyEvent>,
}

impl PoliticalAssembly {
    pub fn data(&self) -> Option<&PoliticalAssemblyData> {
        self.data.as_ref()
    }
}

impl AggregateRoot for PoliticalAssembly {
    type Id = PoliticalAssemblyId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Event: PoliticalAssemblyCreated / PoliticalAssemblyUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoliticalAssemblyChanged {
    pub political_assembly: PoliticalAssemblyData,
    pub event_info: EventInfo,
}

/// Event: PoliticalAssemblyDeleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoliticalAssemblyDeleted {
    pub political_assembly_id: PoliticalAssemblyId,
    pub event_info: EventInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PoliticalAssemblyEvent {
    PoliticalAssemblyCreated(PoliticalAssemblyChanged),
    PoliticalAssemblyUpdated(PoliticalAssemblyChanged),
    PoliticalAssemblyDeleted(PoliticalAssemblyDeleted),
}

impl Event for PoliticalAssemblyEvent {
    fn event_type(&self) -> &'static str {
        match self {
            PoliticalAssemblyEvent::PoliticalAssemblyCreated(_) => "political_assembly.created",
            PoliticalAssemblyEvent::PoliticalAssemblyUpdated(_) => "political_assembly.updated",
            PoliticalAssemblyEvent::PoliticalAssemblyDeleted(_) => "political_assembly.deleted",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn event_info(&self) -> &EventInfo {
        match self {
            PoliticalAssemblyEvent::PoliticalAssemblyCreated(e)
            | PoliticalAssemblyEvent::PoliticalAssemblyUpdated(e) => &e.event_info,
            PoliticalAssemblyEvent::PoliticalAssemblyDeleted(e) => &e.event_info,
        }
    }
}

impl Aggregate for PoliticalAssembly {
    type Event = PoliticalAssemblyEvent;
    const AGGREGATE_TYPE: &'static str = "political_assembly";

    fn empty(id: PoliticalAssemblyId) -> Self {
        Self {
            id,
            data: None,
            version: 0,
            created: false,
            deleted: false,
            pending: PendingEvents::new(),
        }
    }

    fn apply(&mut self, event: &Self::Event) {
        match event {
            PoliticalAssemblyEvent::PoliticalAssemblyCreated(e) => {
                self.data = Some(e.political_assembly.clone());
                self.created = true;
            }
            PoliticalAssemblyEvent::PoliticalAssemblyUpdated(e) => {
                self.data = Some(e.political_assembly.clone());
            }
            PoliticalAssemblyEvent::PoliticalAssemblyDeleted(_) => {
                self.deleted = true;
            }
        }

        self.version += 1;
    }

    fn pending_events(&self) -> &PendingEvents<PoliticalAssemblyEvent> {
        &self.pending
    }

    fn pending_events_mut(&mut self) -> &mut PendingEvents<PoliticalAssemblyEvent> {
        &mut self.pending
    }
}

impl SoftDelete for PoliticalAssembly {
    fn is_created(&self) -> bool {
        self.created
    }

    fn is_deleted(&self) -> bool {
        self.deleted
    }
}

impl PoliticalAssembly {
    fn validated_data(&self, input: PoliticalAssemblyInput) -> DomainResult<PoliticalAssemblyData> {
        if input.description.is_empty() {
            return Err(DomainError::validation("description cannot be empty"));
        }
        Ok(PoliticalAssemblyData {
            id: self.id,
            date: input.date,
            description: input.description,
            domain_of_influence_id: input.domain_of_influence_id,
        })
    }

    pub fn create(&mut self, input: PoliticalAssemblyInput, ctx: &CommandContext) -> DomainResult<()> {
        self.ensure_not_created()?;
        let political_assembly = self.validated_data(input)?;

        self.raise(
            PoliticalAssemblyEvent::PoliticalAssemblyCreated(PoliticalAssemblyChanged {
                political_assembly,
                event_info: ctx.event_info(),
            }),
            None,
        );
        Ok(())
    }

    pub fn update(&mut self, input: PoliticalAssemblyInput, ctx: &CommandContext) -> DomainResult<()> {
        self.ensure_exists()?;
        if self
            .data
            .as_ref()
            .is_some_and(|d| d.domain_of_influence_id != input.domain_of_influence_id)
        {
            return Err(DomainError::modification_not_allowed("domain_of_influence_id"));
        }
        let political_assembly = self.validated_data(input)?;

        self.raise(
            PoliticalAssemblyEvent::PoliticalAssemblyUpdated(PoliticalAssemblyChanged {
                political_assembly,
                event_info: ctx.event_info(),
            }),
            None,
        );
        Ok(())
    }

    pub fn delete(&mut self, ctx: &CommandContext) -> DomainResult<()> {
        self.ensure_exists()?;

        self.raise(
            PoliticalAssemblyEvent::PoliticalAssemblyDeleted(PoliticalAssemblyDeleted {
                political_assembly_id: self.id,
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
    use chrono::Utc;
    use votebasis_core::UserId;

    fn ctx() -> CommandContext {
        CommandContext::at(UserId::new(), Utc::now())
    }

    fn input(doi: DomainOfInfluenceId) -> PoliticalAssemblyInput {
        PoliticalAssemblyInput {
            date: NaiveDate::from_ymd_opt(2030, 5, 12).unwrap(),
            description: Translations::new().with("de", "Bürgerversammlung"),
            domain_of_influence_id: doi,
        }
    }

    #[test]
    fn lifecycle() {
        let doi = DomainOfInfluenceId::new();
        let mut assembly = PoliticalAssembly::empty(PoliticalAssemblyId::new());
        assembly.create(input(doi), &ctx()).unwrap();
        assert!(matches!(
            assembly.create(input(doi), &ctx()),
            Err(DomainError::Conflict(_))
        ));

        let mut moved = input(doi);
        moved.date = NaiveDate::from_ymd_opt(2030, 6, 2).unwrap();
        assembly.update(moved, &ctx()).unwrap();
        assert_eq!(
            assembly.data().unwrap().date,
            NaiveDate::from_ymd_opt(2030, 6, 2).unwrap()
        );
        assert!(matches!(
            assembly.update(input(DomainOfInfluenceId::new()), &ctx()),
            Err(DomainError::ModificationNotAllowed(_))
        ));

        assembly.delete(&ctx()).unwrap();
        assert!(matches!(
            assembly.update(input(doi), &ctx()),
            Err(DomainError::AggregateDeleted(_))
        ));
    }

    #[test]
    fn description_is_required() {
        let mut assembly = PoliticalAssembly::empty(PoliticalAssemblyId::new());
        let mut blank = input(DomainOfInfluenceId::new());
        blank.description = Translations::default();
        assert!(matches!(
            assembly.create(blank, &ctx()),
            Err(DomainError::Validation(_))
        ));
    }
}
