// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Arbor Binding: Dynamic resource bindings over `arbor_scope`.
//!
//! Static resolution (`ScopeTree::get`) hands out a snapshot and forgets
//! about the caller. This crate provides the other half of the resource
//! system: **dynamic** resolution, where a consumer stays attached to its
//! lookup and observes later writes.
//!
//! ## Core Concepts
//!
//! ### The host
//!
//! [`ScopeBindings`] owns a [`ScopeTree`](arbor_scope::ScopeTree) and an
//! observer registry. Entry mutation goes through the host
//! ([`insert`](ScopeBindings::insert), [`remove`](ScopeBindings::remove),
//! [`remove_scope`](ScopeBindings::remove_scope)) so that affected bindings
//! are notified synchronously — a write has reached every bound consumer by
//! the time the call returns.
//!
//! ### Binding semantics
//!
//! [`ScopeBindings::bind`] resolves once and records the triple of
//! consumer, key, and the scope whose own entries satisfied the lookup.
//! From then on:
//!
//! - Overwriting that entry delivers [`BindingEvent::Changed`].
//! - Writing the same key in any *other* scope delivers nothing, even if
//!   that scope would win a fresh lookup.
//! - Removing the entry makes the binding resolve again from its original
//!   start scope: a fallback hit (typically the parent chain) delivers
//!   `Changed` with the fallback value and moves the binding there; no hit
//!   delivers [`BindingEvent::Removed`] and leaves the binding unresolved
//!   until [`rebind`](ScopeBindings::rebind).
//!
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use arbor_binding::{BindingEvent, ScopeBindings};
//!
//! let mut host = ScopeBindings::new();
//! let app = host.create_scope(None);
//! let page = host.create_scope(Some(app));
//! host.insert(app, "Color", "Blue");
//! host.insert(page, "Color", "Red");
//!
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let sink = seen.clone();
//! host.bind(page, "Color", move |event| {
//!     if let BindingEvent::Changed(value) = event {
//!         sink.borrow_mut().push(value.downcast::<&str>().unwrap());
//!     }
//! })
//! .unwrap();
//!
//! // Removing the page entry falls back to the app entry.
//! host.remove(page, "Color");
//! assert_eq!(*seen.borrow(), ["Blue"]);
//! ```
//!
//! ## Concurrency
//!
//! Single-threaded, like the tree it wraps. All mutating operations take
//! `&mut self`, which also makes re-entrant writes from inside a consumer
//! impossible by construction.
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`. It does not depend on `std`.

#![no_std]

extern crate alloc;

mod binding;
mod host;

pub use binding::{BindingEvent, BindingId};
pub use host::ScopeBindings;
