//! List unions: lists joined for mandate distribution.
//!
//! A union is either a root union or a sub-union of exactly one root. Deeper
//! nesting is refused, so a sub-union's lists are only checked against its
//! direct root.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use votebasis_contest::ContestState;
use votebasis_core::collection_sync::{self, Draft, SyncChange};
use votebasis_core::{
    Aggregate, CommandContext, DomainError, DomainResult, Entity, EntityPosition, ListId,
    ListUnionId, Translations, ensure_valid_reorder,
};

use crate::election::ProportionalElection;
use crate::events::*;

/// Nested entity: ListUnion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListUnion {
    pub id: ListUnionId,
    /// Position among unions with the same root.
    pub position: u32,
    pub description: Translations,
    pub root_list_union_id: Option<ListUnionId>,
    pub main_list_id: Option<ListId>,
    pub list_ids: Vec<ListId>,
}

impl Entity for ListUnion {
    type Id = ListUnionId;

    fn id(&self) -> &ListUnionId {
        &self.id
    }
}

impl ListUnion {
    pub fn is_sub_union(&self) -> bool {
        self.root_list_union_id.is_some()
    }
}

/// Caller-supplied list union fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListUnionInput {
    pub position: u32,
    pub description: Translations,
    pub root_list_union_id: Option<ListUnionId>,
}

/// Desired state of one sub-union in [`ProportionalElection::sync_sub_list_unions`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubListUnionDraft {
    pub id: Option<ListUnionId>,
    pub description: Translations,
    pub list_ids: Vec<ListId>,
    pub main_list_id: Option<ListId>,
}

/// A draft placed at its position below a root.
struct PlacedSubListUnion {
    draft: SubListUnionDraft,
    root: ListUnionId,
    position: u32,
}

impl Draft for PlacedSubListUnion {
    type Entity = ListUnion;

    fn draft_id(&self) -> Option<ListUnionId> {
        self.draft.id
    }

    fn into_entity(self, id: ListUnionId) -> ListUnion {
        ListUnion {
            id,
            position: self.position,
            description: self.draft.description,
            root_list_union_id: Some(self.root),
            main_list_id: self.draft.main_list_id,
            list_ids: self.draft.list_ids,
        }
    }
}

impl ProportionalElection {
    fn ensure_list_unions_supported(&self) -> DomainResult<()> {
        if !self.current()?.mandate_algorithm.supports_list_unions() {
            return Err(DomainError::validation(
                "the mandate algorithm of this election does not support list unions",
            ));
        }
        Ok(())
    }

    /// The root a new or updated union may hang below.
    fn ensure_valid_root(&self, root: Option<ListUnionId>) -> DomainResult<()> {
        let Some(root_id) = root else {
            return Ok(());
        };
        let root = self.list_union(root_id)?;
        if root.is_sub_union() {
            return Err(DomainError::validation(
                "a sub list union cannot be the root of another list union",
            ));
        }
        Ok(())
    }

    /// Validate the member lists of a union below `root`.
    fn validate_list_union_entries(
        &self,
        root: Option<ListUnionId>,
        list_ids: &[ListId],
    ) -> DomainResult<()> {
        if list_ids.len() < 2 {
            return Err(DomainError::validation(
                "a list union needs at least two lists",
            ));
        }

        let mut seen = BTreeSet::new();
        for list_id in list_ids {
            if !seen.insert(*list_id) {
                return Err(DomainError::validation(format!(
                    "list {list_id} is listed twice"
                )));
            }
            if !self.lists.contains_key(list_id) {
                return Err(DomainError::validation(format!(
                    "list {list_id} does not belong to this election"
                )));
            }
        }

        if let Some(root_id) = root {
            let root = self.list_union(root_id)?;
            if let Some(outside) = list_ids.iter().find(|id| !root.list_ids.contains(id)) {
                return Err(DomainError::validation(format!(
                    "list {outside} is not part of the root list union"
                )));
            }
        }
        Ok(())
    }

    fn validate_description(description: &Translations) -> DomainResult<()> {
        if description.is_empty() {
            return Err(DomainError::validation(
                "list union description cannot be empty",
            ));
        }
        Ok(())
    }

    pub fn create_list_union(
        &mut self,
        list_union_id: ListUnionId,
        input: ListUnionInput,
        contest_state: ContestState,
        ctx: &CommandContext,
    ) -> DomainResult<()> {
        self.ensure_modifiable(contest_state)?;
        self.ensure_list_unions_supported()?;

        if self.list_unions.contains_key(&list_union_id) {
            return Err(DomainError::conflict(format!(
                "list union {list_union_id} already exists"
            )));
        }
        self.ensure_valid_root(input.root_list_union_id)?;
        Self::validate_description(&input.description)?;

        let expected = self.list_unions_in(input.root_list_union_id).len() as u32 + 1;
        if input.position != expected {
            return Err(DomainError::validation(format!(
                "list union position must be {expected}"
            )));
        }

        self.raise(
            ProportionalElectionEvent::ListUnionCreated(ListUnionCreated {
                list_union: ListUnion {
                    id: list_union_id,
                    position: input.position,
                    description: input.description,
                    root_list_union_id: input.root_list_union_id,
                    main_list_id: None,
                    list_ids: Vec::new(),
                },
                event_info: ctx.event_info(),
            }),
            self.metadata(),
        );
        Ok(())
    }

    pub fn update_list_union(
        &mut self,
        list_union_id: ListUnionId,
        input: ListUnionInput,
        contest_state: ContestState,
        ctx: &CommandContext,
    ) -> DomainResult<()> {
        self.ensure_modifiable(contest_state)?;
        self.ensure_list_unions_supported()?;

        let current = self.list_union(list_union_id)?;
        if input.root_list_union_id != current.root_list_union_id {
            return Err(DomainError::validation(
                "the root of a list union cannot change",
            ));
        }
        if input.position != current.position {
            return Err(DomainError::validation(
                "list union position cannot change, reorder the list unions instead",
            ));
        }
        Self::validate_description(&input.description)?;

        let mut list_union = current.clone();
        list_union.description = input.description;
        self.raise(
            ProportionalElectionEvent::ListUnionUpdated(ListUnionUpdated {
                list_union,
                event_info: ctx.event_info(),
            }),
            self.metadata(),
        );
        Ok(())
    }

    /// Replace the member lists of a union.
    ///
    /// A main list that is no longer a member is cleared; sub-unions of a root
    /// drop lists the root no longer holds.
    /// Sub-unions losing lists with their root must still hold two.
    fn ensure_sub_unions_keep_two_lists(
        &self,
        root_id: ListUnionId,
        root_list_ids: &[ListId],
    ) -> DomainResult<()> {
        for sub in self.list_unions_in(Some(root_id)) {
            let kept = sub
                .list_ids
                .iter()
                .filter(|id| root_list_ids.contains(id))
                .count();
            if kept < sub.list_ids.len() && kept < 2 {
                return Err(DomainError::validation(format!(
                    "sub list union {} would keep fewer than two lists",
                    sub.id
                )));
            }
        }
        Ok(())
    }

    pub fn update_list_union_entries(
        &mut self,
        list_union_id: ListUnionId,
        list_ids: Vec<ListId>,
        contest_state: ContestState,
        ctx: &CommandContext,
    ) -> DomainResult<()> {
        self.ensure_modifiable(contest_state)?;
        self.ensure_list_unions_supported()?;

        let root = self.list_union(list_union_id)?.root_list_union_id;
        self.validate_list_union_entries(root, &list_ids)?;
        if root.is_none() {
            self.ensure_sub_unions_keep_two_lists(list_union_id, &list_ids)?;
        }

        self.raise(
            ProportionalElectionEvent::ListUnionEntriesUpdated(ListUnionEntriesUpdated {
                list_union_id,
                list_ids,
                event_info: ctx.event_info(),
            }),
            self.metadata(),
        );
        Ok(())
    }

    pub fn update_list_union_main_list(
        &mut self,
        list_union_id: ListUnionId,
        main_list_id: Option<ListId>,
        contest_state: ContestState,
        ctx: &CommandContext,
    ) -> DomainResult<()> {
        self.ensure_modifiable(contest_state)?;
        self.ensure_list_unions_supported()?;

        let union = self.list_union(list_union_id)?;
        if let Some(main) = main_list_id {
            if !union.list_ids.contains(&main) {
                return Err(DomainError::validation(format!(
                    "main list {main} is not part of the list union"
                )));
            }
        }

        self.raise(
            ProportionalElectionEvent::ListUnionMainListUpdated(ListUnionMainListUpdated {
                list_union_id,
                main_list_id,
                event_info: ctx.event_info(),
            }),
            self.metadata(),
        );
        Ok(())
    }

    /// Reorder the unions below `root` (`None`: top level).
    pub fn reorder_list_unions(
        &mut self,
        root_list_union_id: Option<ListUnionId>,
        positions: Vec<EntityPosition<ListUnionId>>,
        contest_state: ContestState,
        ctx: &CommandContext,
    ) -> DomainResult<()> {
        self.ensure_modifiable(contest_state)?;
        if let Some(root) = root_list_union_id {
            self.list_union(root)?;
        }
        let siblings: Vec<ListUnionId> = self
            .list_unions_in(root_list_union_id)
            .iter()
            .map(|u| u.id)
            .collect();
        ensure_valid_reorder(siblings, &positions)?;

        self.raise(
            ProportionalElectionEvent::ListUnionsReordered(ListUnionsReordered {
                root_list_union_id,
                positions,
                event_info: ctx.event_info(),
            }),
            self.metadata(),
        );
        Ok(())
    }

    /// Delete a union (a root takes its sub-unions along); later siblings move up.
    pub fn delete_list_union(
        &mut self,
        list_union_id: ListUnionId,
        contest_state: ContestState,
        ctx: &CommandContext,
    ) -> DomainResult<()> {
        self.ensure_modifiable(contest_state)?;
        let root = self.list_union(list_union_id)?.root_list_union_id;

        self.raise(
            ProportionalElectionEvent::ListUnionDeleted(ListUnionDeleted {
                list_union_id,
                event_info: ctx.event_info(),
            }),
            self.metadata(),
        );

        let positions: Vec<EntityPosition<ListUnionId>> = self
            .list_unions_in(root)
            .iter()
            .enumerate()
            .map(|(index, u)| EntityPosition::new(u.id, index as u32 + 1))
            .collect();
        let moved = positions.iter().any(|p| {
            self.list_unions
                .get(&p.id)
                .is_some_and(|u| u.position != p.position)
        });
        if moved {
            self.raise(
                ProportionalElectionEvent::ListUnionsReordered(ListUnionsReordered {
                    root_list_union_id: root,
                    positions,
                    event_info: ctx.event_info(),
                }),
                self.metadata(),
            );
        }
        Ok(())
    }

    /// Bring the sub-unions of `root_list_union_id` to exactly `desired`.
    ///
    /// Position follows the order of `desired`. Emits one event per removed,
    /// modified and added sub-union, in that order; unchanged sub-unions emit nothing.
    pub fn sync_sub_list_unions(
        &mut self,
        root_list_union_id: ListUnionId,
        desired: Vec<SubListUnionDraft>,
        contest_state: ContestState,
        ctx: &CommandContext,
    ) -> DomainResult<()> {
        self.ensure_modifiable(contest_state)?;
        self.ensure_list_unions_supported()?;

        let root = self.list_union(root_list_union_id)?;
        if root.is_sub_union() {
            return Err(DomainError::validation(
                "sub list unions can only be synchronized below a root list union",
            ));
        }

        for draft in &desired {
            if let Some(id) = draft.id {
                let belongs_elsewhere = self
                    .list_unions
                    .get(&id)
                    .is_some_and(|u| u.root_list_union_id != Some(root_list_union_id));
                if belongs_elsewhere {
                    return Err(DomainError::validation(format!(
                        "list union {id} is not a sub list union of {root_list_union_id}"
                    )));
                }
            }
            Self::validate_description(&draft.description)?;
            self.validate_list_union_entries(Some(root_list_union_id), &draft.list_ids)?;
            if let Some(main) = draft.main_list_id {
                if !draft.list_ids.contains(&main) {
                    return Err(DomainError::validation(format!(
                        "main list {main} is not part of the list union"
                    )));
                }
            }
        }

        let placed: Vec<PlacedSubListUnion> = desired
            .into_iter()
            .enumerate()
            .map(|(index, draft)| PlacedSubListUnion {
                draft,
                root: root_list_union_id,
                position: index as u32 + 1,
            })
            .collect();
        let current: Vec<ListUnion> = self
            .list_unions_in(Some(root_list_union_id))
            .into_iter()
            .cloned()
            .collect();
        let plan = collection_sync::plan(&current, placed, ListUnionId::new)?;

        for change in plan.into_changes() {
            let event = match change {
                SyncChange::Removed(list_union) => {
                    ProportionalElectionEvent::ListUnionDeleted(ListUnionDeleted {
                        list_union_id: list_union.id,
                        event_info: ctx.event_info(),
                    })
                }
                SyncChange::Modified(list_union) => {
                    ProportionalElectionEvent::ListUnionUpdated(ListUnionUpdated {
                        list_union,
                        event_info: ctx.event_info(),
                    })
                }
                SyncChange::Added(list_union) => {
                    ProportionalElectionEvent::ListUnionCreated(ListUnionCreated {
                        list_union,
                        event_info: ctx.event_info(),
                    })
                }
            };
            self.raise(event, self.metadata());
        }
        Ok(())
    }
}
