//! Per-canton defaults and restrictions applied to political businesses.

use serde::{Deserialize, Serialize};

use votebasis_core::{
    Aggregate, AggregateRoot, CantonSettingsId, CommandContext, DomainError, DomainResult,
    EventInfo, PendingEvents, SoftDelete,
};
use votebasis_events::Event;
use votebasis_proportional::MandateAlgorithm;

use crate::canton::Canton;

/// How the absolute majority of a majority election is calculated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbsoluteMajorityAlgorithm {
    ValidBallotsDividedByTwo,
    CandidateVotesDividedByTheDoubleOfNumberOfMandates,
}

/// Where Swiss citizens living abroad vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwissAbroadVotingRight {
    SeparateCountingCircle,
    OnEveryCountingCircle,
    NoRights,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CantonSettingsInput {
    pub canton: Canton,
    pub authority_name: String,
    pub secure_connect_id: String,
    pub proportional_election_mandate_algorithms: Vec<MandateAlgorithm>,
    pub majority_election_absolute_majority_algorithm: AbsoluteMajorityAlgorithm,
    pub majority_election_invalid_votes: bool,
    pub swiss_abroad_voting_right: SwissAbroadVotingRight,
    pub proportional_election_use_candidate_check_digit: bool,
    pub majority_election_use_candidate_check_digit: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CantonSettingsData {
    pub id: CantonSettingsId,
    pub canton: Canton,
    pub authority_name: String,
    pub secure_connect_id: String,
    pub proportional_election_mandate_algorithms: Vec<MandateAlgorithm>,
    pub majority_election_absolute_majority_algorithm: AbsoluteMajorityAlgorithm,
    pub majority_election_invalid_votes: bool,
    pub swiss_abroad_voting_right: SwissAbroadVotingRight,
    pub proportional_election_use_candidate_check_digit: bool,
    pub majority_election_use_candidate_check_digit: bool,
}

/// Aggregate root: CantonSettings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CantonSettings {
    id: CantonSettingsId,
    data: Option<CantonSettingsData>,
    version: u64,
    created: bool,
    pending: PendingEvents<CantonSettingsEvent>,
}

impl CantonSettings {
    pub fn data(&self) -> Option<&CantonSettingsData> {
        self.data.as_ref()
    }

    /// Whether proportional elections of this canton may use `algorithm`.
    pub fn allows(&self, algorithm: MandateAlgorithm) -> bool {
        self.data
            .as_ref()
            .is_some_and(|d| d.proportional_election_mandate_algorithms.contains(&algorithm))
    }
}

impl AggregateRoot for CantonSettings {
    type Id = CantonSettingsId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Event: CantonSettingsCreated / CantonSettingsUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CantonSettingsChanged {
    pub canton_settings: CantonSettingsData,
    pub event_info: EventInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum CantonSettingsEvent {
    CantonSettingsCreated(CantonSettingsChanged),
    CantonSettingsUpdated(CantonSettingsChanged),
}

impl Event for CantonSettingsEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CantonSettingsEvent::CantonSettingsCreated(_) => "canton_settings.created",
            CantonSettingsEvent::CantonSettingsUpdated(_) => "canton_settings.updated",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn event_info(&self) -> &EventInfo {
        match self {
            CantonSettingsEvent::CantonSettingsCreated(e)
            | CantonSettingsEvent::CantonSettingsUpdated(e) => &e.event_info,
        }
    }
}

impl Aggregate for CantonSettings {
    type Event = CantonSettingsEvent;
    const AGGREGATE_TYPE: &'static str = "canton_settings";

    fn empty(id: CantonSettingsId) -> Self {
        Self {
            id,
            data: None,
            version: 0,
            created: false,
            pending: PendingEvents::new(),
        }
    }

    fn apply(&mut self, event: &Self::Event) {
        match event {
            CantonSettingsEvent::CantonSettingsCreated(e) => {
                self.data = Some(e.canton_settings.clone());
                self.created = true;
            }
            CantonSettingsEvent::CantonSettingsUpdated(e) => {
                self.data = Some(e.canton_settings.clone());
            }
        }

        self.version += 1;
    }

    fn pending_events(&self) -> &PendingEvents<CantonSettingsEvent> {
        &self.pending
    }

    fn pending_events_mut(&mut self) -> &mut PendingEvents<CantonSettingsEvent> {
        &mut self.pending
    }
}

// Canton settings are never deleted.
impl SoftDelete for CantonSettings {
    fn is_created(&self) -> bool {
        self.created
    }

    fn is_deleted(&self) -> bool {
        false
    }
}

impl CantonSettings {
    fn validated_data(&self, input: CantonSettingsInput) -> DomainResult<CantonSettingsData> {
        if input.authority_name.trim().is_empty() || input.secure_connect_id.trim().is_empty() {
            return Err(DomainError::validation(
                "canton settings need a responsible authority",
            ));
        }
        if input.proportional_election_mandate_algorithms.is_empty() {
            return Err(DomainError::validation(
                "at least one proportional election mandate algorithm must be allowed",
            ));
        }
        let algorithms = &input.proportional_election_mandate_algorithms;
        if algorithms
            .iter()
            .enumerate()
            .any(|(i, algorithm)| algorithms[..i].contains(algorithm))
        {
            return Err(DomainError::validation(
                "proportional election mandate algorithms must be unique",
            ));
        }

        Ok(CantonSettingsData {
            id: self.id,
            canton: input.canton,
            authority_name: input.authority_name,
            secure_connect_id: input.secure_connect_id,
            proportional_election_mandate_algorithms: input
                .proportional_election_mandate_algorithms,
            majority_election_absolute_majority_algorithm: input
                .majority_election_absolute_majority_algorithm,
            majority_election_invalid_votes: input.majority_election_invalid_votes,
            swiss_abroad_voting_right: input.swiss_abroad_voting_right,
            proportional_election_use_candidate_check_digit: input
                .proportional_election_use_candidate_check_digit,
            majority_election_use_candidate_check_digit: input
                .majority_election_use_candidate_check_digit,
        })
    }

    pub fn create(&mut self, input: CantonSettingsInput, ctx: &CommandContext) -> DomainResult<()> {
        self.ensure_not_created()?;
        let canton_settings = self.validated_data(input)?;

        self.raise(
            CantonSettingsEvent::CantonSettingsCreated(CantonSettingsChanged {
                canton_settings,
                event_info: ctx.event_info(),
            }),
            None,
        );
        Ok(())
    }

    /// The canton is fixed after creation.
    pub fn update(&mut self, input: CantonSettingsInput, ctx: &CommandContext) -> DomainResult<()> {
        self.ensure_exists()?;
        if self.data.as_ref().is_some_and(|d| d.canton != input.canton) {
            return Err(DomainError::modification_not_allowed("canton"));
        }
        let canton_settings = self.validated_data(input)?;

        self.raise(
            CantonSettingsEvent::CantonSettingsUpdated(CantonSettingsChanged {
                canton_settings,
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

    fn input(algorithms: Vec<MandateAlgorithm>) -> CantonSettingsInput {
        CantonSettingsInput {
            canton: Canton::Sg,
            authority_name: "Staatskanzlei St. Gallen".into(),
            secure_connect_id: "sg-ct".into(),
            proportional_election_mandate_algorithms: algorithms,
            majority_election_absolute_majority_algorithm:
                AbsoluteMajorityAlgorithm::ValidBallotsDividedByTwo,
            majority_election_invalid_votes: false,
            swiss_abroad_voting_right: SwissAbroadVotingRight::SeparateCountingCircle,
            proportional_election_use_candidate_check_digit: false,
            majority_election_use_candidate_check_digit: false,
        }
    }

    fn created() -> CantonSettings {
        let mut settings = CantonSettings::empty(CantonSettingsId::new());
        settings
            .create(input(vec![MandateAlgorithm::HagenbachBischoff]), &ctx())
            .unwrap();
        settings
    }

    #[test]
    fn mandate_algorithms_are_required_and_unique() {
        let mut settings = CantonSettings::empty(CantonSettingsId::new());
        assert!(matches!(
            settings.create(input(vec![]), &ctx()),
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            settings.create(
                input(vec![
                    MandateAlgorithm::HagenbachBischoff,
                    MandateAlgorithm::HagenbachBischoff
                ]),
                &ctx()
            ),
            Err(DomainError::Validation(_))
        ));

        let settings = created();
        assert!(settings.allows(MandateAlgorithm::HagenbachBischoff));
        assert!(!settings.allows(MandateAlgorithm::DoubleProportional1Doi0DoiQuorum));
    }

    #[test]
    fn canton_is_fixed() {
        let mut settings = created();
        let mut moved = input(vec![MandateAlgorithm::HagenbachBischoff]);
        moved.canton = Canton::Tg;
        assert!(matches!(
            settings.update(moved, &ctx()),
            Err(DomainError::ModificationNotAllowed(_))
        ));

        settings
            .update(
                input(vec![
                    MandateAlgorithm::HagenbachBischoff,
                    MandateAlgorithm::DoubleProportional1Doi0DoiQuorum,
                ]),
                &ctx(),
            )
            .unwrap();
        assert!(settings.allows(MandateAlgorithm::DoubleProportional1Doi0DoiQuorum));
        assert_eq!(settings.version(), 2);
    }

    #[test]
    fn update_requires_existing_settings() {
        let mut settings = CantonSettings::empty(CantonSettingsId::new());
        assert!(matches!(
            settings.update(input(vec![MandateAlgorithm::HagenbachBischoff]), &ctx()),
            Err(DomainError::NotFound(_))
        ));
    }
}
