//! Entity trait: identity + continuity across state changes.

use crate::id::TypedId;

/// Nested entity owned by an aggregate's arena.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: TypedId;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
