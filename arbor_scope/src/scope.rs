// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A single resource scope.
//!
//! This module provides [`ResourceScope`], the dictionary attached to one
//! structural element. It handles **own entries only**: hierarchical
//! resolution across merged scopes and the parent chain lives in the
//! [`ScopeTree`](crate::ScopeTree).
//!
//! # Implementation
//!
//! Entries are kept in a sorted vector with binary search rather than a hash
//! map. This provides:
//!
//! - Better cache locality (contiguous memory)
//! - Lower memory overhead (no hash buckets)
//! - O(log n) lookup, which is fast for typical per-element resource counts
//! - Inline storage for small dictionaries via `SmallVec`

use alloc::boxed::Box;
use alloc::vec::Vec;
use smallvec::SmallVec;

use crate::id::ScopeId;
use crate::value::ResourceValue;

/// Default inline capacity for dictionary entries.
///
/// Most elements declare only a handful of resources; application and theme
/// scopes that overflow this spill to the heap.
const INLINE_CAPACITY: usize = 8;

/// The resource dictionary attached to one structural element.
///
/// A scope holds its own entries, an ordered list of merged scopes, and a
/// back-reference to the enclosing scope. The merged list and parent are
/// references by [`ScopeId`], not owned: merged scopes live in the same
/// [`ScopeTree`](crate::ScopeTree) and may be shared by many scopes, and the
/// parent usually outlives its children.
///
/// Keys are unique within a scope's own entries; inserting an existing key
/// overwrites silently (last-write-wins). This is deliberate and distinct
/// from cross-scope collisions, which shadow without overwriting.
#[derive(Clone, Debug)]
pub struct ResourceScope {
    /// Own entries, sorted by key for binary search lookup.
    entries: SmallVec<[(Box<str>, ResourceValue); INLINE_CAPACITY]>,
    /// Merged scopes in merge order. Later entries shadow earlier ones.
    merged: Vec<ScopeId>,
    /// The enclosing scope, fixed at creation.
    parent: Option<ScopeId>,
}

impl ResourceScope {
    /// Creates an empty scope with the given parent.
    #[must_use]
    pub(crate) fn new(parent: Option<ScopeId>) -> Self {
        Self {
            entries: SmallVec::new(),
            merged: Vec::new(),
            parent,
        }
    }

    /// Returns the enclosing scope, if any.
    #[must_use]
    #[inline]
    pub fn parent(&self) -> Option<ScopeId> {
        self.parent
    }

    /// Returns the merged scopes in merge order.
    ///
    /// Resolution searches this list in reverse: the last-merged scope
    /// shadows everything merged before it.
    #[must_use]
    #[inline]
    pub fn merged(&self) -> &[ScopeId] {
        &self.merged
    }

    /// Returns `true` if this scope has no own entries.
    ///
    /// Merged scopes and the parent chain are not considered.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of own entries.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Binary search for an own entry by key.
    #[inline]
    fn find_entry(&self, key: &str) -> Result<usize, usize> {
        self.entries.binary_search_by(|(k, _)| k.as_ref().cmp(key))
    }

    /// Gets an own entry, if present.
    ///
    /// This looks at this scope's entries only; use
    /// [`ScopeTree::resolve_ref`](crate::ScopeTree::resolve_ref) for the
    /// full hierarchical lookup.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ResourceValue> {
        self.find_entry(key).ok().map(|idx| &self.entries[idx].1)
    }

    /// Gets an own entry downcast to `T`, if present and of that type.
    #[must_use]
    pub fn get_value<T: Clone + 'static>(&self, key: &str) -> Option<&T> {
        self.get(key).and_then(ResourceValue::downcast_ref)
    }

    /// Returns `true` if this scope's own entries contain the key.
    #[must_use]
    #[inline]
    pub fn contains(&self, key: &str) -> bool {
        self.find_entry(key).is_ok()
    }

    /// Inserts or overwrites an own entry.
    ///
    /// Returns `true` if an existing value was replaced. Overwriting is
    /// silent by design: within one scope, last write wins.
    pub fn insert<T: Clone + 'static>(&mut self, key: &str, value: T) -> bool {
        self.insert_value(key, ResourceValue::new(value))
    }

    /// Inserts or overwrites an own entry with an already-erased value.
    ///
    /// Returns `true` if an existing value was replaced.
    pub fn insert_value(&mut self, key: &str, value: ResourceValue) -> bool {
        debug_assert!(!key.is_empty(), "resource keys must be non-empty");
        match self.find_entry(key) {
            Ok(idx) => {
                self.entries[idx].1 = value;
                true
            }
            Err(idx) => {
                self.entries.insert(idx, (Box::from(key), value));
                false
            }
        }
    }

    /// Removes an own entry.
    ///
    /// Returns `true` if a value was removed. Entries in merged or parent
    /// scopes cannot be removed through this scope.
    pub fn remove(&mut self, key: &str) -> bool {
        if let Ok(idx) = self.find_entry(key) {
            self.entries.remove(idx);
            true
        } else {
            false
        }
    }

    /// Returns an iterator over this scope's own keys, in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_ref())
    }

    /// Appends a merged scope. Cycle checking is the tree's job.
    pub(crate) fn push_merged(&mut self, other: ScopeId) {
        self.merged.push(other);
    }

    /// Removes the last occurrence of a merged scope.
    ///
    /// Returns `true` if the reference existed and was removed.
    pub(crate) fn remove_merged(&mut self, other: ScopeId) -> bool {
        if let Some(pos) = self.merged.iter().rposition(|&id| id == other) {
            self.merged.remove(pos);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::String;
    use alloc::vec::Vec;

    #[test]
    fn scope_new() {
        let scope = ResourceScope::new(None);
        assert!(scope.is_empty());
        assert_eq!(scope.len(), 0);
        assert_eq!(scope.parent(), None);
        assert!(scope.merged().is_empty());
    }

    #[test]
    fn scope_parent() {
        let scope = ResourceScope::new(Some(ScopeId::new(3)));
        assert_eq!(scope.parent(), Some(ScopeId::new(3)));
    }

    #[test]
    fn scope_insert_get() {
        let mut scope = ResourceScope::new(None);

        assert!(scope.get("Accent").is_none());

        let replaced = scope.insert("Accent", 0x0078D4_u32);
        assert!(!replaced);
        assert_eq!(scope.get_value::<u32>("Accent"), Some(&0x0078D4));
        assert!(scope.contains("Accent"));
        assert_eq!(scope.len(), 1);
    }

    #[test]
    fn scope_last_write_wins() {
        let mut scope = ResourceScope::new(None);

        scope.insert("Accent", 0x0078D4_u32);
        let replaced = scope.insert("Accent", 0x4CC2FF_u32);

        assert!(replaced);
        assert_eq!(scope.len(), 1);
        assert_eq!(scope.get_value::<u32>("Accent"), Some(&0x4CC2FF));
    }

    #[test]
    fn scope_overwrite_may_change_type() {
        let mut scope = ResourceScope::new(None);

        scope.insert("Accent", 0x0078D4_u32);
        scope.insert("Accent", String::from("Blue"));

        assert_eq!(scope.get_value::<u32>("Accent"), None);
        assert_eq!(
            scope.get_value::<String>("Accent").map(|s| s.as_str()),
            Some("Blue")
        );
    }

    #[test]
    fn scope_remove() {
        let mut scope = ResourceScope::new(None);

        scope.insert("Accent", 1_u32);
        assert!(scope.remove("Accent"));
        assert!(!scope.contains("Accent"));
        assert!(scope.is_empty());

        // Removing a missing key reports false
        assert!(!scope.remove("Accent"));
    }

    #[test]
    fn scope_keys_sorted() {
        let mut scope = ResourceScope::new(None);

        scope.insert("Margin", 4.0_f64);
        scope.insert("Accent", 1_u32);
        scope.insert("FontSize", 14.0_f64);

        let keys: Vec<_> = scope.keys().collect();
        assert_eq!(keys, ["Accent", "FontSize", "Margin"]);
    }

    #[test]
    fn scope_binary_search_correctness() {
        let mut scope = ResourceScope::new(None);
        let names: Vec<String> = (0..20).map(|i| alloc::format!("Key{i:02}")).collect();

        // Insert every other key
        for (i, name) in names.iter().enumerate() {
            if i % 2 == 0 {
                scope.insert(name, i);
            }
        }

        for (i, name) in names.iter().enumerate() {
            if i % 2 == 0 {
                assert_eq!(scope.get_value::<usize>(name), Some(&i));
            } else {
                assert!(scope.get(name).is_none());
            }
        }
    }

    #[test]
    fn scope_merged_order() {
        let mut scope = ResourceScope::new(None);

        scope.push_merged(ScopeId::new(1));
        scope.push_merged(ScopeId::new(2));
        assert_eq!(scope.merged(), [ScopeId::new(1), ScopeId::new(2)]);

        assert!(scope.remove_merged(ScopeId::new(1)));
        assert_eq!(scope.merged(), [ScopeId::new(2)]);
        assert!(!scope.remove_merged(ScopeId::new(1)));
    }

    #[test]
    fn scope_remove_merged_last_occurrence() {
        let mut scope = ResourceScope::new(None);

        scope.push_merged(ScopeId::new(1));
        scope.push_merged(ScopeId::new(2));
        scope.push_merged(ScopeId::new(1));

        assert!(scope.remove_merged(ScopeId::new(1)));
        assert_eq!(scope.merged(), [ScopeId::new(1), ScopeId::new(2)]);
    }

    #[test]
    fn scope_clone() {
        let mut scope = ResourceScope::new(Some(ScopeId::new(7)));
        scope.insert("Accent", 1_u32);
        scope.push_merged(ScopeId::new(2));

        let cloned = scope.clone();
        assert_eq!(cloned.get_value::<u32>("Accent"), Some(&1));
        assert_eq!(cloned.parent(), Some(ScopeId::new(7)));
        assert_eq!(cloned.merged(), [ScopeId::new(2)]);
    }
}
