//! Contest-phase gates for political-business mutations.
//!
//! The commanding layer reads the owning contest's state and hands it to the
//! intent method; aggregates never load each other.

use votebasis_contest::ContestState;
use votebasis_core::{DomainError, DomainResult};

pub fn ensure_contest_unlocked(state: ContestState) -> DomainResult<()> {
    if state.is_locked() {
        return Err(DomainError::ContestLocked);
    }
    Ok(())
}

/// Gate for early (full) updates.
pub fn ensure_in_testing_phase(state: ContestState) -> DomainResult<()> {
    ensure_contest_unlocked(state)?;
    if state.testing_phase_ended() {
        return Err(DomainError::TestingPhaseEnded);
    }
    Ok(())
}

/// Gate for late (restricted) updates.
pub fn ensure_testing_phase_ended(state: ContestState) -> DomainResult<()> {
    ensure_contest_unlocked(state)?;
    if !state.testing_phase_ended() {
        return Err(DomainError::invalid_state(
            "the testing phase of the contest has not ended yet",
        ));
    }
    Ok(())
}

/// Reject a late update that touches a field outside its accepted subset.
pub fn ensure_unchanged<T: PartialEq + ?Sized>(
    field: &str,
    current: &T,
    requested: &T,
) -> DomainResult<()> {
    if current != requested {
        return Err(DomainError::modification_not_allowed(field));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn early_updates_only_in_testing_phase() {
        assert!(ensure_in_testing_phase(ContestState::TestingPhase).is_ok());
        assert_eq!(
            ensure_in_testing_phase(ContestState::Active),
            Err(DomainError::TestingPhaseEnded)
        );
        assert_eq!(
            ensure_in_testing_phase(ContestState::PastUnlocked),
            Err(DomainError::TestingPhaseEnded)
        );
        assert_eq!(
            ensure_in_testing_phase(ContestState::PastLocked),
            Err(DomainError::ContestLocked)
        );
    }

    #[test]
    fn late_updates_only_after_testing_phase() {
        assert!(matches!(
            ensure_testing_phase_ended(ContestState::TestingPhase),
            Err(DomainError::InvalidState(_))
        ));
        assert!(ensure_testing_phase_ended(ContestState::Active).is_ok());
        assert!(ensure_testing_phase_ended(ContestState::PastUnlocked).is_ok());
        assert_eq!(
            ensure_testing_phase_ended(ContestState::Archived),
            Err(DomainError::ContestLocked)
        );
    }

    #[test]
    fn unchanged_fields_pass_and_changed_fields_are_named() {
        assert!(ensure_unchanged("number_of_mandates", &5, &5).is_ok());
        assert_eq!(
            ensure_unchanged("number_of_mandates", &5, &6),
            Err(DomainError::modification_not_allowed("number_of_mandates"))
        );
        assert!(ensure_unchanged("description", "a", "a").is_ok());
    }
}
