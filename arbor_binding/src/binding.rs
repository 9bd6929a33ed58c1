// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Binding identification and events.

use core::fmt;

use arbor_scope::ResourceValue;

/// A handle identifying a dynamic binding in a
/// [`ScopeBindings`](crate::ScopeBindings) host.
///
/// Binding ids are `u32` slab indices. Unbinding invalidates the id and the
/// slot may be reused by a later bind.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BindingId(u32);

impl BindingId {
    /// Creates a binding id from a raw slot index.
    ///
    /// This is typically produced by
    /// [`ScopeBindings::bind`](crate::ScopeBindings::bind) rather than
    /// constructed directly.
    #[must_use]
    #[inline]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the underlying slot index of this binding id.
    #[must_use]
    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for BindingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BindingId").field(&self.0).finish()
    }
}

impl fmt::Display for BindingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BindingId({})", self.0)
    }
}

/// A change propagated to a bound consumer.
///
/// Events are delivered synchronously: the write that caused the event
/// completes only after every affected consumer has observed it.
#[derive(Clone, Debug)]
pub enum BindingEvent {
    /// The binding resolves to a new value.
    ///
    /// Sent when the entry in the scope that satisfied the binding is
    /// overwritten, and when a removal re-resolves the binding to a value
    /// from farther along the chain.
    Changed(ResourceValue),
    /// The bound entry was removed and no remaining scope in the chain
    /// provides the key.
    ///
    /// The binding stays registered but unresolved; it re-arms only through
    /// [`ScopeBindings::rebind`](crate::ScopeBindings::rebind).
    Removed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;

    #[test]
    fn binding_id_basics() {
        let id = BindingId::new(7);
        assert_eq!(id.index(), 7);
        assert_eq!(id, BindingId::new(7));
        assert_ne!(id, BindingId::new(8));
    }

    #[test]
    fn binding_id_debug_display() {
        let id = BindingId::new(7);
        assert_eq!(format!("{:?}", id), "BindingId(7)");
        assert_eq!(format!("{}", id), "BindingId(7)");
    }

    #[test]
    fn binding_event_debug() {
        let event = BindingEvent::Changed(ResourceValue::new(1_u32));
        assert!(format!("{:?}", event).contains("Changed"));
        assert!(format!("{:?}", BindingEvent::Removed).contains("Removed"));
    }
}
