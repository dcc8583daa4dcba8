//! Organization domain module (event-sourced).
//!
//! Structural entities outside of a contest: domains of influence, counting
//! circles, political assemblies and per-canton settings.

pub mod canton;
pub mod canton_settings;
pub mod counting_circle;
pub mod domain_of_influence;
pub mod political_assembly;

pub use canton::Canton;
pub use canton_settings::{
    AbsoluteMajorityAlgorithm, CantonSettings, CantonSettingsChanged, CantonSettingsData,
    CantonSettingsEvent, CantonSettingsInput, SwissAbroadVotingRight,
};
pub use counting_circle::{
    Authority, CountingCircle, CountingCircleChanged, CountingCircleData, CountingCircleDeleted,
    CountingCircleEvent, CountingCircleInput, CountingCircleMerged, CountingCircleState,
    CountingCirclesMerger, CountingCirclesMergerActivated, CountingCirclesMergerChanged,
    CountingCirclesMergerInput, CountingCirclesScheduledMergerDeleted,
};
pub use domain_of_influence::{
    CountingCircleEntriesUpdated, DomainOfInfluence, DomainOfInfluenceCreated,
    DomainOfInfluenceData, DomainOfInfluenceDeleted, DomainOfInfluenceEvent,
    DomainOfInfluenceInput, DomainOfInfluenceParty, DomainOfInfluenceType,
    DomainOfInfluenceUpdated, ExportConfiguration, ExportConfigurationChanged,
    ExportConfigurationDeleted, ExportConfigurationDraft, ExportProvider, PartyChanged,
    PartyDeleted, PartyDraft,
};
pub use political_assembly::{
    PoliticalAssembly, PoliticalAssemblyChanged, PoliticalAssemblyData, PoliticalAssemblyDeleted,
    PoliticalAssemblyEvent, PoliticalAssemblyInput,
};
