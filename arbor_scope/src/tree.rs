// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The scope arena.
//!
//! This module provides [`ScopeTree`], which owns every [`ResourceScope`]
//! and addresses them by [`ScopeId`] handle. Keeping scopes in one arena
//! rather than nesting ownership keeps the parent back-reference weak (an
//! index, not a strong pointer) and reduces cycle detection in the merge
//! graph to a reachability check over indices.

use alloc::vec::Vec;
use core::fmt;
use hashbrown::HashSet;

use crate::id::ScopeId;
use crate::scope::ResourceScope;
use crate::value::ResourceValue;

/// Error returned when a merge would make a scope reachable from itself.
///
/// Resolution recurses through merged scopes; a cycle in the merge graph
/// would turn lookup of an absent key into infinite recursion, so
/// [`ScopeTree::merge`] rejects the edge instead.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct CycleError {
    /// The scope the merge was requested on.
    pub scope: ScopeId,
    /// The scope whose merge was rejected.
    pub merged: ScopeId,
}

impl fmt::Debug for CycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CycleError {{ scope: {:?}, merged: {:?} }}",
            self.scope, self.merged
        )
    }
}

impl fmt::Display for CycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "merging {:?} into {:?} would create a cycle in the merge graph",
            self.merged, self.scope
        )
    }
}

impl core::error::Error for CycleError {}

/// An arena of resource scopes forming a parent tree and a merge graph.
///
/// The tree owns all scopes. Structural elements hold [`ScopeId`] handles
/// and create their scope when constructed ([`create_scope`](Self::create_scope))
/// and drop it when destroyed ([`remove_scope`](Self::remove_scope)).
/// Merged scopes are referenced by id and shared: removing a scope releases
/// its own entries only, never the scopes it merged.
///
/// Parent links form a tree by construction: a scope's parent is fixed at
/// creation and must already be alive, so no parent chain can cycle. Merge
/// links form a separate graph which [`merge`](Self::merge) keeps acyclic.
///
/// All operations are synchronous and single-threaded; the tree makes no
/// concurrent mutation guarantees.
///
/// # Example
///
/// ```rust
/// use arbor_scope::ScopeTree;
///
/// let mut tree = ScopeTree::new();
/// let app = tree.create_scope(None);
/// let page = tree.create_scope(Some(app));
///
/// tree.insert(app, "Color", "Blue");
/// assert_eq!(tree.get::<&str>(page, "Color"), Some("Blue"));
///
/// tree.insert(page, "Color", "Red");
/// assert_eq!(tree.get::<&str>(page, "Color"), Some("Red"));
/// assert_eq!(tree.get::<&str>(app, "Color"), Some("Blue"));
/// ```
#[derive(Clone, Debug, Default)]
pub struct ScopeTree {
    /// Slot table; `None` slots are free and listed in `free`.
    slots: Vec<Option<ResourceScope>>,
    /// Indices of vacant slots, reused before the table grows.
    free: Vec<u32>,
}

impl ScopeTree {
    /// Creates an empty scope tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of live scopes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Returns `true` if no scopes are alive.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Creates a new empty scope with the given parent.
    ///
    /// The parent link is fixed for the scope's lifetime; children are
    /// always created after their parent, so parent chains cannot cycle.
    ///
    /// # Panics
    ///
    /// Panics if `parent` is not alive, or if the slot table would exceed
    /// `u32::MAX` scopes.
    pub fn create_scope(&mut self, parent: Option<ScopeId>) -> ScopeId {
        if let Some(p) = parent {
            assert!(self.contains_scope(p), "parent scope {p:?} is not alive");
        }
        let scope = ResourceScope::new(parent);
        if let Some(index) = self.free.pop() {
            self.slots[index as usize] = Some(scope);
            ScopeId::new(index)
        } else {
            assert!(
                self.slots.len() < u32::MAX as usize,
                "scope table is full (max {})",
                u32::MAX
            );
            #[expect(clippy::cast_possible_truncation, reason = "checked above")]
            let id = ScopeId::new(self.slots.len() as u32);
            self.slots.push(Some(scope));
            id
        }
    }

    /// Removes a scope, releasing its own entries.
    ///
    /// Returns `true` if the scope was alive. Scopes the removed scope had
    /// merged are unaffected; scopes that merged *it* keep a dangling
    /// reference which resolution skips. The slot is reused by later
    /// [`create_scope`](Self::create_scope) calls, invalidating the id.
    pub fn remove_scope(&mut self, id: ScopeId) -> bool {
        match self.slots.get_mut(id.index() as usize) {
            Some(slot) if slot.is_some() => {
                *slot = None;
                self.free.push(id.index());
                true
            }
            _ => false,
        }
    }

    /// Returns `true` if the id addresses a live scope.
    #[must_use]
    pub fn contains_scope(&self, id: ScopeId) -> bool {
        self.get_scope(id).is_some()
    }

    /// Returns the scope for an id, if it is alive.
    #[must_use]
    pub fn get_scope(&self, id: ScopeId) -> Option<&ResourceScope> {
        self.slots.get(id.index() as usize)?.as_ref()
    }

    /// Returns the scope for an id.
    ///
    /// # Panics
    ///
    /// Panics if the scope is not alive.
    #[must_use]
    pub fn scope(&self, id: ScopeId) -> &ResourceScope {
        match self.get_scope(id) {
            Some(scope) => scope,
            None => panic!("scope {id:?} is not alive"),
        }
    }

    /// Returns the scope for an id, mutably.
    ///
    /// Direct mutation bypasses any observer layered above the tree (see
    /// `arbor_binding`); callers holding bindings should mutate through
    /// that layer instead.
    ///
    /// # Panics
    ///
    /// Panics if the scope is not alive.
    #[must_use]
    pub fn scope_mut(&mut self, id: ScopeId) -> &mut ResourceScope {
        match self.slots.get_mut(id.index() as usize).and_then(Option::as_mut) {
            Some(scope) => scope,
            None => panic!("scope {id:?} is not alive"),
        }
    }

    /// Inserts or overwrites an entry in a scope's own dictionary.
    ///
    /// Returns `true` if an existing value was replaced (last-write-wins;
    /// see [`ResourceScope::insert`]).
    ///
    /// # Panics
    ///
    /// Panics if the scope is not alive.
    pub fn insert<T: Clone + 'static>(&mut self, id: ScopeId, key: &str, value: T) -> bool {
        self.scope_mut(id).insert(key, value)
    }

    /// Inserts or overwrites an already-erased entry in a scope's own dictionary.
    ///
    /// Returns `true` if an existing value was replaced.
    ///
    /// # Panics
    ///
    /// Panics if the scope is not alive.
    pub fn insert_value(&mut self, id: ScopeId, key: &str, value: ResourceValue) -> bool {
        self.scope_mut(id).insert_value(key, value)
    }

    /// Removes an entry from a scope's own dictionary.
    ///
    /// Returns `true` if a value was removed. Entries in merged or parent
    /// scopes are untouched.
    ///
    /// # Panics
    ///
    /// Panics if the scope is not alive.
    pub fn remove(&mut self, id: ScopeId, key: &str) -> bool {
        self.scope_mut(id).remove(key)
    }

    /// Merges `other` into `scope` by reference.
    ///
    /// Entries are not copied: later changes to `other` are visible through
    /// the merge. `other` is appended to the merge list, so among merged
    /// scopes sharing a key the last-merged wins.
    ///
    /// Rejects self-merge and any edge that would make `scope` reachable
    /// from itself through merged references, since resolution would
    /// otherwise recurse forever.
    ///
    /// # Panics
    ///
    /// Panics if either scope is not alive.
    pub fn merge(&mut self, scope: ScopeId, other: ScopeId) -> Result<(), CycleError> {
        assert!(self.contains_scope(scope), "scope {scope:?} is not alive");
        assert!(
            self.contains_scope(other),
            "merged scope {other:?} is not alive"
        );

        if scope == other || self.reaches(other, scope) {
            return Err(CycleError {
                scope,
                merged: other,
            });
        }
        self.scope_mut(scope).push_merged(other);
        Ok(())
    }

    /// Removes the most recent merge of `other` from `scope`.
    ///
    /// Returns `true` if a merged reference was removed. The merged scope
    /// itself is unaffected; it is shared, not owned.
    ///
    /// # Panics
    ///
    /// Panics if `scope` is not alive.
    pub fn unmerge(&mut self, scope: ScopeId, other: ScopeId) -> bool {
        self.scope_mut(scope).remove_merged(other)
    }

    /// Checks whether `target` is reachable from `from` over merged edges.
    ///
    /// DFS over arena indices. Parent links are not followed: resolution
    /// never walks a merged scope's parent chain, so only merge edges can
    /// recurse.
    fn reaches(&self, from: ScopeId, target: ScopeId) -> bool {
        let mut visited = HashSet::new();
        let mut stack = Vec::new();
        stack.push(from);

        while let Some(current) = stack.pop() {
            if current == target {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            if let Some(scope) = self.get_scope(current) {
                stack.extend(scope.merged().iter().copied());
            }
        }

        false
    }
}
