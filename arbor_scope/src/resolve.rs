// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hierarchical key resolution.
//!
//! This module implements the lookup algorithm over a [`ScopeTree`]:
//!
//! **Own entries → merged scopes (reverse merge order) → parent chain**
//!
//! A hit in a scope's own entries terminates the search even if the same
//! key exists elsewhere. Merged scopes are searched through their own
//! entries and their own merged scopes only — never their parent chains.
//! Local entries always outrank merged entries, which always outrank
//! anything inherited from the parent chain.

use alloc::boxed::Box;
use core::fmt;

use crate::id::ScopeId;
use crate::tree::ScopeTree;
use crate::value::ResourceValue;

/// Error returned when no scope in the chain provides a key.
///
/// Whether this is fatal is the caller's call: a required style lookup may
/// treat it as an error, an optional resource may fall back to a default.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyNotFound {
    key: Box<str>,
}

impl KeyNotFound {
    pub(crate) fn new(key: &str) -> Self {
        Self {
            key: Box::from(key),
        }
    }

    /// Returns the key that failed to resolve.
    #[must_use]
    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Debug for KeyNotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("KeyNotFound").field(&self.key).finish()
    }
}

impl fmt::Display for KeyNotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "resource key {:?} not found in any scope", self.key)
    }
}

impl core::error::Error for KeyNotFound {}

impl ScopeTree {
    /// Resolves a key, reporting which scope's own entries satisfied it.
    ///
    /// This is the canonical resolution operation; the other `resolve`/`get`
    /// methods are conveniences over it. The returned [`ScopeId`] is the
    /// scope whose **own** entries held the value — for a hit through a
    /// merge, that is the merged scope, not the scope it was merged into.
    /// Dynamic binding layers key their observer registry on it.
    ///
    /// Resolving from a scope that is no longer alive fails with
    /// [`KeyNotFound`]: the chain is empty.
    pub fn resolve_entry(
        &self,
        scope: ScopeId,
        key: &str,
    ) -> Result<(ScopeId, &ResourceValue), KeyNotFound> {
        debug_assert!(!key.is_empty(), "resource keys must be non-empty");

        let mut current = Some(scope);
        while let Some(id) = current {
            let Some(node) = self.get_scope(id) else {
                // Dead scope ends the chain; the parent of a dead scope is
                // unknowable from here.
                break;
            };

            // 1. Own entries terminate the search.
            if let Some(value) = node.get(key) {
                return Ok((id, value));
            }

            // 2. Merged scopes, last-merged first.
            for &merged in node.merged().iter().rev() {
                if let Some(hit) = self.resolve_merged(merged, key) {
                    return Ok(hit);
                }
            }

            // 3. Continue at the enclosing scope.
            current = node.parent();
        }

        Err(KeyNotFound::new(key))
    }

    /// Searches a merged scope: its own entries and its own merged scopes.
    ///
    /// The merged scope's parent chain is deliberately not consulted; only
    /// the starting scope's parent chain participates in resolution.
    /// Dangling references to removed scopes are skipped. Terminates because
    /// [`merge`](Self::merge) keeps the merge graph acyclic.
    fn resolve_merged(&self, id: ScopeId, key: &str) -> Option<(ScopeId, &ResourceValue)> {
        let scope = self.get_scope(id)?;
        if let Some(value) = scope.get(key) {
            return Some((id, value));
        }
        for &merged in scope.merged().iter().rev() {
            if let Some(hit) = self.resolve_merged(merged, key) {
                return Some(hit);
            }
        }
        None
    }

    /// Resolves a key to a value reference.
    ///
    /// See [`resolve_entry`](Self::resolve_entry) for the search order.
    pub fn resolve_ref(&self, scope: ScopeId, key: &str) -> Result<&ResourceValue, KeyNotFound> {
        self.resolve_entry(scope, key).map(|(_, value)| value)
    }

    /// Resolves a key to a value reference, or `None` if absent.
    ///
    /// The `Option` form for callers that treat a missing key as ordinary.
    #[must_use]
    pub fn try_resolve_ref(&self, scope: ScopeId, key: &str) -> Option<&ResourceValue> {
        self.resolve_entry(scope, key).ok().map(|(_, value)| value)
    }

    /// Resolves a key to a typed reference.
    ///
    /// Returns `None` if the key is absent or the value is not a `T`.
    #[must_use]
    pub fn get_ref<T: Clone + 'static>(&self, scope: ScopeId, key: &str) -> Option<&T> {
        self.try_resolve_ref(scope, key)
            .and_then(ResourceValue::downcast_ref)
    }

    /// Resolves a key to a typed snapshot.
    ///
    /// This is static resolution: the clone retains no relationship to the
    /// entry it came from. Returns `None` if the key is absent or the value
    /// is not a `T`.
    #[must_use]
    pub fn get<T: Clone + 'static>(&self, scope: ScopeId, key: &str) -> Option<T> {
        self.get_ref(scope, key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_own_entry_wins() {
        let mut tree = ScopeTree::new();
        let parent = tree.create_scope(None);
        let merged = tree.create_scope(None);
        let scope = tree.create_scope(Some(parent));
        tree.merge(scope, merged).unwrap();

        tree.insert(parent, "Accent", 1_u32);
        tree.insert(merged, "Accent", 2_u32);
        tree.insert(scope, "Accent", 3_u32);

        // Own entries outrank everything, regardless of merged/parent contents
        assert_eq!(tree.get::<u32>(scope, "Accent"), Some(3));
        let (found, _) = tree.resolve_entry(scope, "Accent").unwrap();
        assert_eq!(found, scope);
    }

    #[test]
    fn resolve_merged_beats_inherited() {
        let mut tree = ScopeTree::new();
        let parent = tree.create_scope(None);
        let merged = tree.create_scope(None);
        let scope = tree.create_scope(Some(parent));
        tree.merge(scope, merged).unwrap();

        tree.insert(parent, "Accent", 1_u32);
        tree.insert(merged, "Accent", 2_u32);

        assert_eq!(tree.get::<u32>(scope, "Accent"), Some(2));
        let (found, _) = tree.resolve_entry(scope, "Accent").unwrap();
        assert_eq!(found, merged);
    }

    #[test]
    fn resolve_last_merged_wins() {
        let mut tree = ScopeTree::new();
        let scope = tree.create_scope(None);
        let m1 = tree.create_scope(None);
        let m2 = tree.create_scope(None);

        tree.merge(scope, m1).unwrap();
        tree.merge(scope, m2).unwrap();

        tree.insert(m1, "Accent", 1_u32);
        tree.insert(m2, "Accent", 2_u32);

        assert_eq!(tree.get::<u32>(scope, "Accent"), Some(2));

        // m2 loses the key, so m1 becomes visible again
        tree.remove(m2, "Accent");
        assert_eq!(tree.get::<u32>(scope, "Accent"), Some(1));
    }

    #[test]
    fn resolve_walks_parent_chain() {
        let mut tree = ScopeTree::new();
        let app = tree.create_scope(None);
        let window = tree.create_scope(Some(app));
        let page = tree.create_scope(Some(window));

        tree.insert(app, "FontSize", 14.0_f64);

        assert_eq!(tree.get::<f64>(page, "FontSize"), Some(14.0));
        let (found, _) = tree.resolve_entry(page, "FontSize").unwrap();
        assert_eq!(found, app);
    }

    #[test]
    fn resolve_merged_scope_parent_ignored() {
        let mut tree = ScopeTree::new();
        // The merged scope has a parent of its own holding the key; that
        // chain must not leak into resolution.
        let merged_parent = tree.create_scope(None);
        let merged = tree.create_scope(Some(merged_parent));
        let scope = tree.create_scope(None);
        tree.merge(scope, merged).unwrap();

        tree.insert(merged_parent, "Accent", 1_u32);

        assert!(tree.get::<u32>(scope, "Accent").is_none());
    }

    #[test]
    fn resolve_nested_merges() {
        let mut tree = ScopeTree::new();
        let scope = tree.create_scope(None);
        let outer = tree.create_scope(None);
        let inner = tree.create_scope(None);

        tree.merge(outer, inner).unwrap();
        tree.merge(scope, outer).unwrap();

        tree.insert(inner, "Accent", 7_u32);

        // Found through the merged scope's own merges
        assert_eq!(tree.get::<u32>(scope, "Accent"), Some(7));
        let (found, _) = tree.resolve_entry(scope, "Accent").unwrap();
        assert_eq!(found, inner);
    }

    #[test]
    fn resolve_merge_is_live_not_snapshot() {
        let mut tree = ScopeTree::new();
        let scope = tree.create_scope(None);
        let merged = tree.create_scope(None);
        tree.merge(scope, merged).unwrap();

        assert!(tree.get::<u32>(scope, "Accent").is_none());

        // Inserted after the merge, still visible through it
        tree.insert(merged, "Accent", 5_u32);
        assert_eq!(tree.get::<u32>(scope, "Accent"), Some(5));
    }

    #[test]
    fn resolve_key_not_found() {
        let mut tree = ScopeTree::new();
        let app = tree.create_scope(None);
        let page = tree.create_scope(Some(app));

        let err = tree.resolve_ref(page, "Missing").unwrap_err();
        assert_eq!(err.key(), "Missing");
        assert!(tree.try_resolve_ref(page, "Missing").is_none());
    }

    #[test]
    fn resolve_from_dead_scope_fails() {
        let mut tree = ScopeTree::new();
        let app = tree.create_scope(None);
        tree.insert(app, "Accent", 1_u32);
        tree.remove_scope(app);

        assert!(tree.resolve_ref(app, "Accent").is_err());
    }

    #[test]
    fn resolve_skips_dead_merged_reference() {
        let mut tree = ScopeTree::new();
        let scope = tree.create_scope(None);
        let m1 = tree.create_scope(None);
        let m2 = tree.create_scope(None);

        tree.merge(scope, m1).unwrap();
        tree.merge(scope, m2).unwrap();
        tree.insert(m1, "Accent", 1_u32);
        tree.insert(m2, "Accent", 2_u32);

        tree.remove_scope(m2);

        // The dangling reference to m2 is skipped, m1 still resolves
        assert_eq!(tree.get::<u32>(scope, "Accent"), Some(1));
    }

    #[test]
    fn resolve_typed_mismatch() {
        let mut tree = ScopeTree::new();
        let app = tree.create_scope(None);
        tree.insert(app, "Accent", 1_u32);

        assert!(tree.get::<f64>(app, "Accent").is_none());
        assert!(tree.get_ref::<f64>(app, "Accent").is_none());
        // The erased value is still reachable
        assert!(tree.try_resolve_ref(app, "Accent").is_some());
    }

    #[test]
    fn resolve_app_page_color_example() {
        let mut tree = ScopeTree::new();
        let app = tree.create_scope(None);
        let page = tree.create_scope(Some(app));

        tree.insert(app, "Color", "Blue");
        assert_eq!(tree.get::<&str>(page, "Color"), Some("Blue"));

        tree.insert(page, "Color", "Red");
        assert_eq!(tree.get::<&str>(page, "Color"), Some("Red"));
        assert_eq!(tree.get::<&str>(app, "Color"), Some("Blue"));
    }

    #[test]
    fn key_not_found_display() {
        use alloc::format;

        let err = KeyNotFound::new("Accent");
        let text = format!("{err}");
        assert!(text.contains("Accent"));
        assert_eq!(format!("{err:?}"), "KeyNotFound(\"Accent\")");
    }
}
