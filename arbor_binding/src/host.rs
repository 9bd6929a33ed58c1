// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The binding host.
//!
//! This module provides [`ScopeBindings`], which owns a [`ScopeTree`] and
//! layers an observer registry over it. Writes that go through the host
//! notify affected bindings synchronously before returning; writes made
//! directly on the tree do not.
//!
//! # Registry layout
//!
//! A binding is recorded against the scope whose **own** entries satisfied
//! its lookup (its *found* scope), not the scope the lookup started from.
//! Only writes to the found scope propagate: a key appearing in a nearer
//! scope later does not rebind, matching dictionary semantics where a
//! resolved reference stays attached to its source until that source
//! changes.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;
use hashbrown::HashMap;

use arbor_scope::{CycleError, KeyNotFound, ResourceValue, ScopeId, ScopeTree};

use crate::binding::{BindingEvent, BindingId};

/// A consumer callback invoked on propagation.
type Consumer = Box<dyn FnMut(&BindingEvent)>;

/// One registered dynamic binding.
struct Binding {
    /// The key being observed.
    key: Box<str>,
    /// The scope the original lookup started from; re-resolution restarts here.
    start: ScopeId,
    /// The scope whose own entries currently satisfy the binding, or `None`
    /// while unresolved.
    found: Option<ScopeId>,
    consumer: Consumer,
}

/// A scope tree with dynamic binding support.
///
/// `ScopeBindings` wraps a [`ScopeTree`] and adds the observer half of the
/// resource system: consumers bind to a `(scope, key)` lookup and are
/// notified when the entry that satisfied it is overwritten or removed.
/// Notification is synchronous; every consumer has observed a write before
/// the mutating call returns.
///
/// Re-entrant writes from inside a consumer are structurally impossible:
/// all mutating operations take `&mut self`, and consumers only receive the
/// event. Consumers communicating through shared state (`Rc<RefCell<_>>`
/// and the like) should still be written idempotent-safe, since one write
/// can fan out to many consumers in registration order.
///
/// # Example
///
/// ```rust
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use arbor_binding::{BindingEvent, ScopeBindings};
///
/// let mut host = ScopeBindings::new();
/// let app = host.create_scope(None);
/// let page = host.create_scope(Some(app));
/// host.insert(app, "AccentColor", 0x0078D4_u32);
///
/// let seen = Rc::new(RefCell::new(None));
/// let sink = seen.clone();
/// let (_, initial) = host
///     .bind(page, "AccentColor", move |event| {
///         if let BindingEvent::Changed(value) = event {
///             *sink.borrow_mut() = value.downcast::<u32>();
///         }
///     })
///     .unwrap();
/// assert_eq!(initial.downcast::<u32>(), Some(0x0078D4));
///
/// // The write propagates before `insert` returns.
/// host.insert(app, "AccentColor", 0x4CC2FF_u32);
/// assert_eq!(*seen.borrow(), Some(0x4CC2FF));
/// ```
pub struct ScopeBindings {
    tree: ScopeTree,
    /// Binding slab; `None` slots are free and listed in `free`.
    bindings: Vec<Option<Binding>>,
    free: Vec<u32>,
    /// Resolved bindings indexed by found scope, then key.
    by_source: HashMap<ScopeId, HashMap<Box<str>, Vec<BindingId>>>,
}

impl fmt::Debug for ScopeBindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeBindings")
            .field("tree", &self.tree)
            .field("binding_count", &self.binding_count())
            .finish_non_exhaustive()
    }
}

impl Default for ScopeBindings {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeBindings {
    /// Creates a binding host over an empty scope tree.
    #[must_use]
    pub fn new() -> Self {
        Self::with_tree(ScopeTree::new())
    }

    /// Creates a binding host over an existing scope tree.
    ///
    /// Useful when a markup loader has already populated the tree.
    #[must_use]
    pub fn with_tree(tree: ScopeTree) -> Self {
        Self {
            tree,
            bindings: Vec::new(),
            free: Vec::new(),
            by_source: HashMap::new(),
        }
    }

    /// Returns the underlying scope tree.
    #[must_use]
    #[inline]
    pub fn tree(&self) -> &ScopeTree {
        &self.tree
    }

    /// Returns the underlying scope tree, mutably.
    ///
    /// Writes made through this reference bypass the binding registry: no
    /// consumer is notified and found-scope bookkeeping goes stale. Reserve
    /// it for bulk population before any binding exists.
    #[must_use]
    #[inline]
    pub fn tree_mut(&mut self) -> &mut ScopeTree {
        &mut self.tree
    }

    /// Discards all bindings and returns the scope tree.
    #[must_use]
    pub fn into_tree(self) -> ScopeTree {
        self.tree
    }

    /// Returns the number of registered bindings, resolved or not.
    #[must_use]
    pub fn binding_count(&self) -> usize {
        self.bindings.len() - self.free.len()
    }

    /// Returns `true` if the id addresses a live binding.
    #[must_use]
    pub fn contains_binding(&self, id: BindingId) -> bool {
        self.binding(id).is_some()
    }

    /// Returns whether a binding currently resolves to a value.
    ///
    /// `None` if the binding is not alive.
    #[must_use]
    pub fn is_resolved(&self, id: BindingId) -> Option<bool> {
        self.binding(id).map(|b| b.found.is_some())
    }

    #[inline]
    fn binding(&self, id: BindingId) -> Option<&Binding> {
        self.bindings.get(id.index() as usize)?.as_ref()
    }

    #[inline]
    fn binding_mut(&mut self, id: BindingId) -> Option<&mut Binding> {
        self.bindings.get_mut(id.index() as usize)?.as_mut()
    }

    // =========================================================================
    // Scope management pass-throughs
    // =========================================================================

    /// Creates a new scope. See [`ScopeTree::create_scope`].
    pub fn create_scope(&mut self, parent: Option<ScopeId>) -> ScopeId {
        self.tree.create_scope(parent)
    }

    /// Merges `other` into `scope`. See [`ScopeTree::merge`].
    ///
    /// Existing bindings are not re-evaluated: a merge changes what a fresh
    /// lookup would find, not where live bindings are attached.
    pub fn merge(&mut self, scope: ScopeId, other: ScopeId) -> Result<(), CycleError> {
        self.tree.merge(scope, other)
    }

    /// Removes a merged reference. See [`ScopeTree::unmerge`].
    pub fn unmerge(&mut self, scope: ScopeId, other: ScopeId) -> bool {
        self.tree.unmerge(scope, other)
    }

    /// Resolves a key to a typed snapshot. See [`ScopeTree::get`].
    #[must_use]
    pub fn get<T: Clone + 'static>(&self, scope: ScopeId, key: &str) -> Option<T> {
        self.tree.get(scope, key)
    }

    /// Removes a scope and settles the bindings that depended on it.
    ///
    /// Bindings whose lookup *started* in the removed scope are dropped:
    /// their chain no longer exists. Bindings *satisfied* by the removed
    /// scope re-resolve from their start scope exactly as if the entry had
    /// been removed, notifying [`BindingEvent::Changed`] or
    /// [`BindingEvent::Removed`].
    ///
    /// Returns `true` if the scope was alive.
    pub fn remove_scope(&mut self, scope: ScopeId) -> bool {
        if !self.tree.remove_scope(scope) {
            return false;
        }

        for index in 0..self.bindings.len() {
            if self.bindings[index]
                .as_ref()
                .is_some_and(|b| b.start == scope)
            {
                #[expect(clippy::cast_possible_truncation, reason = "slab index fits u32")]
                let id = BindingId::new(index as u32);
                self.unbind(id);
            }
        }

        let orphaned: Vec<BindingId> = match self.by_source.remove(&scope) {
            Some(keys) => keys.into_values().flatten().collect(),
            None => Vec::new(),
        };
        for id in orphaned {
            let _ = self.reresolve(id, Notify::Consumers);
        }
        true
    }

    // =========================================================================
    // Entry mutation with propagation
    // =========================================================================

    /// Inserts or overwrites an entry, then notifies affected bindings.
    ///
    /// Bindings satisfied by `scope` for `key` receive
    /// [`BindingEvent::Changed`] with the new value before this returns.
    /// Bindings satisfied by a *different* scope are never notified, even if
    /// `scope` is nearer to their start than their current source.
    ///
    /// Returns `true` if an existing value was replaced (last-write-wins
    /// within one scope; see [`ScopeTree::insert`]).
    ///
    /// # Panics
    ///
    /// Panics if the scope is not alive.
    pub fn insert<T: Clone + 'static>(&mut self, scope: ScopeId, key: &str, value: T) -> bool {
        let replaced = self.tree.insert(scope, key, value);
        self.notify_changed(scope, key);
        replaced
    }

    /// Inserts or overwrites an already-erased entry, then notifies.
    ///
    /// See [`insert`](Self::insert).
    ///
    /// # Panics
    ///
    /// Panics if the scope is not alive.
    pub fn insert_value(&mut self, scope: ScopeId, key: &str, value: ResourceValue) -> bool {
        let replaced = self.tree.insert_value(scope, key, value);
        self.notify_changed(scope, key);
        replaced
    }

    /// Removes an entry, then re-resolves affected bindings.
    ///
    /// Each binding satisfied by `scope` for `key` resolves again from its
    /// start scope: if another scope in the chain provides the key, the
    /// binding attaches there and its consumer receives
    /// [`BindingEvent::Changed`] with the fallback value; otherwise it
    /// becomes unresolved and receives [`BindingEvent::Removed`].
    ///
    /// Returns `true` if a value was removed.
    ///
    /// # Panics
    ///
    /// Panics if the scope is not alive.
    pub fn remove(&mut self, scope: ScopeId, key: &str) -> bool {
        if !self.tree.remove(scope, key) {
            return false;
        }

        let ids = self.take_registered(scope, key);
        for id in ids {
            let _ = self.reresolve(id, Notify::Consumers);
        }
        true
    }

    // =========================================================================
    // Binding management
    // =========================================================================

    /// Resolves `key` from `scope` and registers a live binding.
    ///
    /// On success, returns the binding id and the current value; the
    /// consumer is *not* called for this initial value. The binding is
    /// recorded against the scope that satisfied the lookup and receives
    /// events when that scope's entry changes.
    ///
    /// Fails with [`KeyNotFound`] if no scope in the chain provides the key;
    /// nothing is registered in that case.
    pub fn bind<F>(
        &mut self,
        scope: ScopeId,
        key: &str,
        consumer: F,
    ) -> Result<(BindingId, ResourceValue), KeyNotFound>
    where
        F: FnMut(&BindingEvent) + 'static,
    {
        let (found, value) = self.tree.resolve_entry(scope, key)?;
        let value = value.clone();

        let id = self.alloc(Binding {
            key: Box::from(key),
            start: scope,
            found: Some(found),
            consumer: Box::new(consumer),
        });
        self.register(found, key, id);
        Ok((id, value))
    }

    /// Removes a binding; its consumer receives no further events.
    ///
    /// Returns `true` if the binding was alive.
    pub fn unbind(&mut self, id: BindingId) -> bool {
        let Some(slot) = self.bindings.get_mut(id.index() as usize) else {
            return false;
        };
        let Some(binding) = slot.take() else {
            return false;
        };
        self.free.push(id.index());
        if let Some(found) = binding.found {
            self.deregister(found, &binding.key, id);
        }
        true
    }

    /// Explicitly re-resolves a binding from its start scope.
    ///
    /// This is how an unresolved binding re-arms, and how a consumer opts
    /// into a nearer value after a shadowing insert. The new value is
    /// returned rather than delivered as an event.
    ///
    /// # Panics
    ///
    /// Panics if the binding is not alive.
    pub fn rebind(&mut self, id: BindingId) -> Result<ResourceValue, KeyNotFound> {
        let (old_found, key) = match self.binding(id) {
            Some(b) => (b.found, b.key.clone()),
            None => panic!("binding {id:?} is not alive"),
        };
        if let Some(found) = old_found {
            self.deregister(found, &key, id);
        }
        self.reresolve(id, Notify::Silent)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn alloc(&mut self, binding: Binding) -> BindingId {
        if let Some(index) = self.free.pop() {
            self.bindings[index as usize] = Some(binding);
            BindingId::new(index)
        } else {
            assert!(
                self.bindings.len() < u32::MAX as usize,
                "binding table is full (max {})",
                u32::MAX
            );
            #[expect(clippy::cast_possible_truncation, reason = "checked above")]
            let id = BindingId::new(self.bindings.len() as u32);
            self.bindings.push(Some(binding));
            id
        }
    }

    fn register(&mut self, found: ScopeId, key: &str, id: BindingId) {
        self.by_source
            .entry(found)
            .or_default()
            .entry(Box::from(key))
            .or_default()
            .push(id);
    }

    fn deregister(&mut self, found: ScopeId, key: &str, id: BindingId) {
        let Some(keys) = self.by_source.get_mut(&found) else {
            return;
        };
        if let Some(ids) = keys.get_mut(key) {
            if let Some(pos) = ids.iter().position(|&b| b == id) {
                ids.swap_remove(pos);
            }
            if ids.is_empty() {
                keys.remove(key);
            }
        }
        if keys.is_empty() {
            self.by_source.remove(&found);
        }
    }

    /// Removes and returns every binding id registered for `(scope, key)`.
    fn take_registered(&mut self, scope: ScopeId, key: &str) -> Vec<BindingId> {
        let Some(keys) = self.by_source.get_mut(&scope) else {
            return Vec::new();
        };
        let ids = keys.remove(key).unwrap_or_default();
        if keys.is_empty() {
            self.by_source.remove(&scope);
        }
        ids
    }

    /// Notifies bindings registered for `(scope, key)` of the entry's
    /// current value.
    fn notify_changed(&mut self, scope: ScopeId, key: &str) {
        let ids = match self.by_source.get(&scope).and_then(|keys| keys.get(key)) {
            Some(ids) => ids.clone(),
            None => return,
        };
        // The entry is present: this runs right after a write to it.
        let Some(value) = self.tree.scope(scope).get(key) else {
            return;
        };
        let event = BindingEvent::Changed(value.clone());
        for id in ids {
            self.dispatch(id, &event);
        }
    }

    /// Resolves a binding again from its start scope, re-registering it
    /// against whichever scope now satisfies the key.
    ///
    /// The caller must already have deregistered the binding from its
    /// previous found scope.
    fn reresolve(
        &mut self,
        id: BindingId,
        notify: Notify,
    ) -> Result<ResourceValue, KeyNotFound> {
        let (start, key) = match self.binding(id) {
            Some(b) => (b.start, b.key.clone()),
            None => panic!("binding {id:?} is not alive"),
        };

        let resolved = self
            .tree
            .resolve_entry(start, &key)
            .map(|(found, value)| (found, value.clone()));

        match resolved {
            Ok((found, value)) => {
                if let Some(binding) = self.binding_mut(id) {
                    binding.found = Some(found);
                }
                self.register(found, &key, id);
                if notify == Notify::Consumers {
                    self.dispatch(id, &BindingEvent::Changed(value.clone()));
                }
                Ok(value)
            }
            Err(err) => {
                if let Some(binding) = self.binding_mut(id) {
                    binding.found = None;
                }
                if notify == Notify::Consumers {
                    self.dispatch(id, &BindingEvent::Removed);
                }
                Err(err)
            }
        }
    }

    fn dispatch(&mut self, id: BindingId, event: &BindingEvent) {
        if let Some(binding) = self.binding_mut(id) {
            (binding.consumer)(event);
        }
    }
}

/// Whether a re-resolution delivers events or returns silently.
#[derive(Copy, Clone, PartialEq, Eq)]
enum Notify {
    Consumers,
    Silent,
}
