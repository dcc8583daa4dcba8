//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Coarse classification of a [`DomainError`].
///
/// The commanding layer maps these to transport status codes; the domain layer
/// itself never retries or swallows any of them.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The input violates a business rule and can be corrected by the caller.
    Validation,
    /// The input may be fine, but the current lifecycle state forbids the mutation.
    StateGate,
    /// An aggregate or nested entity does not exist (stale client state).
    NotFound,
    /// The request collides with existing state (duplicate creation, stale version).
    Conflict,
}

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// lifecycle gates, missing references). Infrastructure concerns belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. bad position, incomplete entry set).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A cross-entity invariant was violated.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A requested aggregate or nested entity was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The aggregate has been soft deleted.
    #[error("{0} has been deleted")]
    AggregateDeleted(String),

    /// A conflict occurred (e.g. already exists, stale version).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The owning contest's testing phase has ended.
    #[error("the testing phase of the contest has ended")]
    TestingPhaseEnded,

    /// The owning contest is past locked or archived.
    #[error("the contest is locked")]
    ContestLocked,

    /// A lifecycle transition was requested before its scheduled time.
    #[error("not yet reached: {0}")]
    NotYetReached(String),

    /// A lifecycle transition is not possible from the current state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// The political business is approved for e-voting and may not be modified.
    #[error("e-voting is approved, cannot modify {0}")]
    EVotingApproved(String),

    /// The political business does not support e-voting.
    #[error("e-voting is not supported by {0}")]
    EVotingNotSupported(String),

    /// A field outside the accepted subset of a late update differs from its current value.
    #[error("modification of {0} is not allowed after the testing phase has ended")]
    ModificationNotAllowed(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn deleted(what: impl Into<String>) -> Self {
        Self::AggregateDeleted(what.into())
    }

    pub fn not_yet_reached(msg: impl Into<String>) -> Self {
        Self::NotYetReached(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn e_voting_approved(what: impl Into<String>) -> Self {
        Self::EVotingApproved(what.into())
    }

    pub fn modification_not_allowed(field: impl Into<String>) -> Self {
        Self::ModificationNotAllowed(field.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::Validation(_)
            | DomainError::InvariantViolation(_)
            | DomainError::InvalidId(_)
            | DomainError::ModificationNotAllowed(_) => ErrorKind::Validation,
            DomainError::TestingPhaseEnded
            | DomainError::ContestLocked
            | DomainError::NotYetReached(_)
            | DomainError::InvalidState(_)
            | DomainError::EVotingApproved(_)
            | DomainError::EVotingNotSupported(_) => ErrorKind::StateGate,
            DomainError::NotFound(_) | DomainError::AggregateDeleted(_) => ErrorKind::NotFound,
            DomainError::Conflict(_) => ErrorKind::Conflict,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gates_are_classified_separately_from_validation() {
        assert_eq!(DomainError::TestingPhaseEnded.kind(), ErrorKind::StateGate);
        assert_eq!(DomainError::e_voting_approved("list").kind(), ErrorKind::StateGate);
        assert_eq!(DomainError::validation("bad position").kind(), ErrorKind::Validation);
        assert_eq!(
            DomainError::modification_not_allowed("number_of_mandates").kind(),
            ErrorKind::Validation
        );
        assert_eq!(DomainError::not_found("candidate").kind(), ErrorKind::NotFound);
        assert_eq!(DomainError::deleted("vote").kind(), ErrorKind::NotFound);
    }

    #[test]
    fn messages_name_the_offending_thing() {
        let err = DomainError::modification_not_allowed("number_of_mandates");
        assert_eq!(
            err.to_string(),
            "modification of number_of_mandates is not allowed after the testing phase has ended"
        );
    }
}
