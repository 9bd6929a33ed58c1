// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Type-erased resource values.
//!
//! This module provides [`ResourceValue`] for storing dictionary entries of
//! any type in a heterogeneous collection.

use alloc::boxed::Box;
use core::any::{Any, TypeId};
use core::fmt;

/// A type-erased resource value.
///
/// This wraps a value of any `'static + Clone` type, storing it on the heap
/// with its type information for later downcasting. Resource dictionaries
/// are heterogeneous by nature: one scope may hold brushes, lengths, and
/// strings side by side, all addressed by string keys.
///
/// # Example
///
/// ```rust
/// use arbor_scope::ResourceValue;
///
/// let value = ResourceValue::new(42_i32);
/// assert!(value.is::<i32>());
/// assert_eq!(value.downcast_ref::<i32>(), Some(&42));
///
/// let snapshot = value.clone();
/// assert_eq!(snapshot.downcast::<i32>(), Some(42));
/// ```
pub struct ResourceValue {
    inner: Box<dyn ErasedResource>,
    type_id: TypeId,
}

impl ResourceValue {
    /// Creates a new resource value from a concrete value.
    #[must_use]
    pub fn new<T: Clone + 'static>(value: T) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            inner: Box::new(value),
        }
    }

    /// Returns the [`TypeId`] of the contained value.
    #[must_use]
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns `true` if the contained value is of type `T`.
    #[must_use]
    #[inline]
    pub fn is<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// Attempts to downcast to a reference of type `T`.
    ///
    /// Returns `None` if the contained value is not of type `T`.
    #[must_use]
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        if self.is::<T>() {
            self.inner.as_any().downcast_ref()
        } else {
            None
        }
    }

    /// Clones the contained value out as a concrete `T`.
    ///
    /// Returns `None` if the contained value is not of type `T`. This is the
    /// snapshot operation: the returned value has no further relationship to
    /// the dictionary entry it was cloned from.
    #[must_use]
    pub fn downcast<T: Clone + 'static>(&self) -> Option<T> {
        self.downcast_ref().cloned()
    }
}

impl Clone for ResourceValue {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone_boxed(),
            type_id: self.type_id,
        }
    }
}

impl fmt::Debug for ResourceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceValue")
            .field("type_id", &self.type_id)
            .finish_non_exhaustive()
    }
}

/// Trait object for type-erased values that can be cloned.
trait ErasedResource: Any {
    fn as_any(&self) -> &dyn Any;
    fn clone_boxed(&self) -> Box<dyn ErasedResource>;
}

impl<T: Clone + 'static> ErasedResource for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_boxed(&self) -> Box<dyn ErasedResource> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;
    use alloc::string::String;

    #[test]
    fn value_i32() {
        let value = ResourceValue::new(42_i32);
        assert!(value.is::<i32>());
        assert!(!value.is::<f64>());
        assert_eq!(value.downcast_ref::<i32>(), Some(&42));
        assert_eq!(value.downcast_ref::<f64>(), None);
    }

    #[test]
    fn value_string() {
        let value = ResourceValue::new(String::from("Blue"));
        assert!(value.is::<String>());
        assert_eq!(
            value.downcast_ref::<String>().map(|s| s.as_str()),
            Some("Blue")
        );
    }

    #[test]
    fn value_clone() {
        let value = ResourceValue::new(42_i32);
        let cloned = value.clone();
        assert_eq!(cloned.downcast_ref::<i32>(), Some(&42));

        // Original still works
        assert_eq!(value.downcast_ref::<i32>(), Some(&42));
    }

    #[test]
    fn value_downcast_snapshot() {
        let value = ResourceValue::new(String::from("Accent"));
        let snapshot: String = value.downcast().unwrap();
        assert_eq!(snapshot, "Accent");

        // Wrong type yields nothing
        assert_eq!(value.downcast::<i32>(), None);
    }

    #[test]
    fn value_type_id() {
        let value = ResourceValue::new(42_i32);
        assert_eq!(value.type_id(), TypeId::of::<i32>());
    }

    #[test]
    fn value_debug() {
        let value = ResourceValue::new(42_i32);
        let debug = format!("{:?}", value);
        assert!(debug.contains("ResourceValue"));
        assert!(debug.contains("type_id"));
    }
}
