//! Strongly-typed identifiers used across the domain.
//!
//! Aggregate ids double as event stream ids; nested entity ids are only unique
//! within their owning aggregate's arena.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Common surface of every uuid-backed identifier.
pub trait TypedId:
    Copy + Eq + Ord + core::hash::Hash + core::fmt::Debug + core::fmt::Display
{
    fn from_uuid(uuid: Uuid) -> Self;

    fn as_uuid(&self) -> &Uuid;

    /// The untyped stream identifier for this id.
    fn aggregate_id(&self) -> AggregateId {
        AggregateId(*self.as_uuid())
    }
}

macro_rules! define_id {
    ($(#[$meta:meta])* $t:ident, $name:literal) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $t(Uuid);

        impl $t {
            /// Create a new identifier.
            ///
            /// Uses UUIDv7 (time-ordered). Prefer passing IDs explicitly in tests
            /// for determinism.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }
        }

        impl Default for $t {
            fn default() -> Self {
                Self::new()
            }
        }

        impl TypedId for $t {
            fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $t {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$t> for Uuid {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid = Uuid::from_str(s)
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                Ok(Self(uuid))
            }
        }
    };
}

define_id!(
    /// Identifier of an acting user (event author).
    UserId,
    "UserId"
);
define_id!(
    /// Untyped identifier of an event stream.
    AggregateId,
    "AggregateId"
);

define_id!(ContestId, "ContestId");
define_id!(VoteId, "VoteId");
define_id!(ProportionalElectionId, "ProportionalElectionId");
define_id!(MajorityElectionId, "MajorityElectionId");
define_id!(ProportionalElectionUnionId, "ProportionalElectionUnionId");
define_id!(MajorityElectionUnionId, "MajorityElectionUnionId");
define_id!(DomainOfInfluenceId, "DomainOfInfluenceId");
define_id!(CountingCircleId, "CountingCircleId");
define_id!(PoliticalAssemblyId, "PoliticalAssemblyId");
define_id!(CantonSettingsId, "CantonSettingsId");

define_id!(BallotId, "BallotId");
define_id!(ListId, "ListId");
define_id!(ListUnionId, "ListUnionId");
define_id!(CandidateId, "CandidateId");
define_id!(SecondaryMajorityElectionId, "SecondaryMajorityElectionId");
define_id!(BallotGroupId, "BallotGroupId");
define_id!(BallotGroupEntryId, "BallotGroupEntryId");
define_id!(PartyId, "PartyId");
define_id!(ExportConfigurationId, "ExportConfigurationId");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_reports_the_id_type() {
        let err = ContestId::from_str("not-a-uuid").unwrap_err();
        match err {
            DomainError::InvalidId(msg) => assert!(msg.starts_with("ContestId:")),
            other => panic!("expected InvalidId, got {other:?}"),
        }
    }

    #[test]
    fn typed_ids_map_onto_stream_ids() {
        let id = VoteId::new();
        assert_eq!(id.aggregate_id().as_uuid(), id.as_uuid());
        assert_eq!(id.to_string().parse::<VoteId>().unwrap(), id);
    }
}
