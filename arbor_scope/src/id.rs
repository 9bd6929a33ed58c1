// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scope identification.
//!
//! This module provides [`ScopeId`], the arena handle used to address scopes
//! inside a [`ScopeTree`](crate::ScopeTree).

use core::fmt;

/// An arena handle identifying a scope in a [`ScopeTree`](crate::ScopeTree).
///
/// Scope ids are lightweight `u32` indices into the tree's slot table. A
/// scope is created for every structural element that carries resources
/// (view, layout, page, application), so unlike small registered sets the
/// population can grow with the UI; `u32` keeps the handle `Copy` while
/// leaving ample headroom.
///
/// Removing a scope invalidates its id; slots are reused, so a stale id may
/// later address an unrelated scope. The structural tree owning the scopes
/// is expected to drop handles when it drops the owning element.
///
/// # Example
///
/// ```rust
/// use arbor_scope::ScopeTree;
///
/// let mut tree = ScopeTree::new();
/// let app = tree.create_scope(None);
/// let page = tree.create_scope(Some(app));
/// assert_ne!(app, page);
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScopeId(u32);

impl ScopeId {
    /// Creates a scope id from a raw slot index.
    ///
    /// This is typically produced by [`ScopeTree::create_scope`](crate::ScopeTree::create_scope)
    /// rather than constructed directly.
    #[must_use]
    #[inline]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the underlying slot index of this scope id.
    #[must_use]
    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ScopeId").field(&self.0).finish()
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScopeId({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;

    #[test]
    fn scope_id_basics() {
        let id = ScopeId::new(42);
        assert_eq!(id.index(), 42);

        let id2 = ScopeId::new(42);
        assert_eq!(id, id2);

        let id3 = ScopeId::new(43);
        assert_ne!(id, id3);
    }

    #[test]
    fn scope_id_debug() {
        let id = ScopeId::new(42);
        assert_eq!(format!("{:?}", id), "ScopeId(42)");
    }

    #[test]
    fn scope_id_display() {
        let id = ScopeId::new(42);
        assert_eq!(format!("{}", id), "ScopeId(42)");
    }

    #[test]
    fn scope_id_size() {
        use core::mem::size_of;
        assert_eq!(size_of::<ScopeId>(), 4);
        assert_eq!(size_of::<Option<ScopeId>>(), 8);
    }
}
