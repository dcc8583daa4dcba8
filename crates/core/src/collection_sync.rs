//! Diff-synchronization of nested collections.
//!
//! Translates "replace this whole nested collection" into the minimal set of
//! removed / modified / added items, matched by identity. Unchanged items yield
//! nothing, so running a plan a second time against its own result is empty.

use std::collections::{BTreeMap, BTreeSet};

use crate::entity::Entity;
use crate::error::{DomainError, DomainResult};

/// An incoming item of a desired collection; it may not have an identity yet.
pub trait Draft {
    type Entity: Entity + Clone + PartialEq;

    fn draft_id(&self) -> Option<<Self::Entity as Entity>::Id>;

    fn into_entity(self, id: <Self::Entity as Entity>::Id) -> Self::Entity;
}

/// One change of a [`SyncPlan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncChange<T> {
    Removed(T),
    Modified(T),
    Added(T),
}

/// Result of comparing a current collection against a desired one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPlan<T> {
    pub removed: Vec<T>,
    pub modified: Vec<T>,
    pub added: Vec<T>,
}

impl<T> SyncPlan<T> {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.modified.is_empty() && self.added.is_empty()
    }

    /// Changes in emission order: removals, then modifications, then additions.
    ///
    /// Additions may reuse slots (e.g. positions) freed by removals.
    pub fn into_changes(self) -> impl Iterator<Item = SyncChange<T>> {
        self.removed
            .into_iter()
            .map(SyncChange::Removed)
            .chain(self.modified.into_iter().map(SyncChange::Modified))
            .chain(self.added.into_iter().map(SyncChange::Added))
    }
}

/// Compare `current` against `desired`.
///
/// Items of `desired` without identity get one from `new_id`. A repeated identity
/// in `desired` is rejected. Removed items keep the order of `current`; modified
/// and added items keep the order of `desired`.
pub fn plan<'a, T, D, I>(
    current: I,
    desired: Vec<D>,
    mut new_id: impl FnMut() -> T::Id,
) -> DomainResult<SyncPlan<T>>
where
    T: Entity + Clone + PartialEq + 'a,
    D: Draft<Entity = T>,
    I: IntoIterator<Item = &'a T>,
{
    let current: Vec<&T> = current.into_iter().collect();
    let by_id: BTreeMap<T::Id, &T> = current.iter().map(|item| (*item.id(), *item)).collect();

    let mut seen = BTreeSet::new();
    let mut incoming = Vec::with_capacity(desired.len());
    for draft in desired {
        let id = draft.draft_id().unwrap_or_else(&mut new_id);
        if !seen.insert(id) {
            return Err(DomainError::validation(format!(
                "duplicate identity {id} in desired collection"
            )));
        }
        incoming.push(draft.into_entity(id));
    }

    let removed = current
        .iter()
        .filter(|item| !seen.contains(item.id()))
        .map(|item| (*item).clone())
        .collect();

    let mut modified = Vec::new();
    let mut added = Vec::new();
    for item in incoming {
        match by_id.get(item.id()) {
            Some(existing) if **existing == item => {}
            Some(_) => modified.push(item),
            None => added.push(item),
        }
    }

    Ok(SyncPlan {
        removed,
        modified,
        added,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::PartyId;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Party {
        id: PartyId,
        name: String,
    }

    impl Entity for Party {
        type Id = PartyId;

        fn id(&self) -> &PartyId {
            &self.id
        }
    }

    #[derive(Debug, Clone)]
    struct PartyDraft {
        id: Option<PartyId>,
        name: String,
    }

    impl Draft for PartyDraft {
        type Entity = Party;

        fn draft_id(&self) -> Option<PartyId> {
            self.id
        }

        fn into_entity(self, id: PartyId) -> Party {
            Party {
                id,
                name: self.name,
            }
        }
    }

    fn draft(id: Option<PartyId>, name: &str) -> PartyDraft {
        PartyDraft {
            id,
            name: name.to_string(),
        }
    }

    fn apply(current: &mut Vec<Party>, plan: SyncPlan<Party>) {
        for change in plan.into_changes() {
            match change {
                SyncChange::Removed(p) => current.retain(|c| c.id != p.id),
                SyncChange::Modified(p) => {
                    if let Some(c) = current.iter_mut().find(|c| c.id == p.id) {
                        *c = p;
                    }
                }
                SyncChange::Added(p) => current.push(p),
            }
        }
    }

    #[test]
    fn partitions_by_identity() {
        let keep = Party {
            id: PartyId::new(),
            name: "SP".into(),
        };
        let rename = Party {
            id: PartyId::new(),
            name: "FDP".into(),
        };
        let drop = Party {
            id: PartyId::new(),
            name: "CVP".into(),
        };
        let current = vec![keep.clone(), rename.clone(), drop.clone()];

        let desired = vec![
            draft(Some(keep.id), "SP"),
            draft(Some(rename.id), "FDP.Die Liberalen"),
            draft(None, "GLP"),
        ];
        let plan = plan(&current, desired, PartyId::new).unwrap();

        assert_eq!(plan.removed, vec![drop]);
        assert_eq!(plan.modified.len(), 1);
        assert_eq!(plan.modified[0].name, "FDP.Die Liberalen");
        assert_eq!(plan.added.len(), 1);
        assert_eq!(plan.added[0].name, "GLP");
    }

    #[test]
    fn changes_are_ordered_removed_modified_added() {
        let a = Party {
            id: PartyId::new(),
            name: "A".into(),
        };
        let b = Party {
            id: PartyId::new(),
            name: "B".into(),
        };
        let current = vec![a.clone(), b.clone()];
        let desired = vec![draft(None, "C"), draft(Some(b.id), "B2")];

        let kinds: Vec<&str> = plan(&current, desired, PartyId::new)
            .unwrap()
            .into_changes()
            .map(|c| match c {
                SyncChange::Removed(_) => "removed",
                SyncChange::Modified(_) => "modified",
                SyncChange::Added(_) => "added",
            })
            .collect();

        assert_eq!(kinds, vec!["removed", "modified", "added"]);
    }

    #[test]
    fn rejects_repeated_identity() {
        let id = PartyId::new();
        let err = plan::<Party, _, _>(&[], vec![draft(Some(id), "A"), draft(Some(id), "B")], PartyId::new)
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn unknown_identity_is_an_addition() {
        let id = PartyId::new();
        let plan = plan::<Party, _, _>(&[], vec![draft(Some(id), "A")], PartyId::new).unwrap();
        assert_eq!(plan.added[0].id, id);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: syncing twice towards the same target only changes state once.
            #[test]
            fn sync_is_idempotent(
                initial in proptest::collection::vec("[a-z]{1,6}", 0..8),
                target in proptest::collection::vec(("[a-z]{1,6}", any::<bool>()), 0..8),
            ) {
                let mut current: Vec<Party> = initial
                    .into_iter()
                    .map(|name| Party { id: PartyId::new(), name })
                    .collect();

                // Target items either reuse an existing identity or are new.
                let desired: Vec<PartyDraft> = target
                    .into_iter()
                    .enumerate()
                    .map(|(i, (name, reuse))| {
                        let id = if reuse { current.get(i).map(|p| p.id) } else { None };
                        draft(id, &name)
                    })
                    .collect();

                let first = plan(&current, desired, PartyId::new).unwrap();
                apply(&mut current, first);

                let again: Vec<PartyDraft> = current
                    .iter()
                    .map(|p| draft(Some(p.id), &p.name))
                    .collect();
                let second = plan(&current, again, PartyId::new).unwrap();
                prop_assert!(second.is_empty());
            }
        }
    }
}
