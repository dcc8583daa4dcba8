//! Ordered positions of sibling entities.
//!
//! Positions are 1-based and continuous: `n` siblings occupy exactly `1..=n`.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::id::TypedId;

/// The requested position of one entity in a reorder command.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityPosition<I> {
    pub id: I,
    pub position: u32,
}

impl<I> EntityPosition<I> {
    pub fn new(id: I, position: u32) -> Self {
        Self { id, position }
    }
}

/// Fail unless `positions` is a permutation of `1..=n`.
pub fn ensure_continuous(positions: impl IntoIterator<Item = u32>) -> DomainResult<()> {
    let mut seen = BTreeSet::new();
    for position in positions {
        if !seen.insert(position) {
            return Err(DomainError::validation(format!(
                "position {position} is used twice"
            )));
        }
    }

    let expected = 1..=seen.len() as u32;
    if !seen.iter().copied().eq(expected) {
        return Err(DomainError::validation("positions must be continuous from 1"));
    }
    Ok(())
}

/// Validate a reorder of `current` siblings.
///
/// Every sibling must be listed exactly once and the positions must be continuous.
pub fn ensure_valid_reorder<I: TypedId>(
    current: impl IntoIterator<Item = I>,
    requested: &[EntityPosition<I>],
) -> DomainResult<()> {
    let current: BTreeSet<I> = current.into_iter().collect();
    let mut listed = BTreeSet::new();
    for entry in requested {
        if !current.contains(&entry.id) {
            return Err(DomainError::not_found(format!("entity {}", entry.id)));
        }
        if !listed.insert(entry.id) {
            return Err(DomainError::validation(format!(
                "entity {} is listed twice",
                entry.id
            )));
        }
    }
    if listed.len() != current.len() {
        return Err(DomainError::validation("a reorder must list every entity"));
    }

    ensure_continuous(requested.iter().map(|e| e.position))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::ListId;

    #[test]
    fn continuous_positions() {
        assert!(ensure_continuous(Vec::<u32>::new()).is_ok());
        assert!(ensure_continuous([2, 1, 3]).is_ok());
        assert!(ensure_continuous([1, 3]).is_err());
        assert!(ensure_continuous([1, 1]).is_err());
    }

    #[test]
    fn reorder_must_be_complete() {
        let a = ListId::new();
        let b = ListId::new();

        assert!(ensure_valid_reorder(
            [a, b],
            &[EntityPosition::new(b, 1), EntityPosition::new(a, 2)]
        )
        .is_ok());
        assert!(ensure_valid_reorder([a, b], &[EntityPosition::new(a, 1)]).is_err());
        assert!(matches!(
            ensure_valid_reorder([a], &[EntityPosition::new(b, 1)]),
            Err(DomainError::NotFound(_))
        ));
        assert!(ensure_valid_reorder(
            [a, b],
            &[EntityPosition::new(a, 1), EntityPosition::new(a, 2)]
        )
        .is_err());
    }
}
