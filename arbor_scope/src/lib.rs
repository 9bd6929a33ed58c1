// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Arbor Scope: Scoped resource dictionaries with hierarchical resolution.
//!
//! This crate provides the storage and lookup side of a resource system for
//! a retained UI tree: every structural element (view, layout, page,
//! application) can carry a dictionary of keyed values, and a lookup from
//! any element searches outward until the nearest definition wins.
//!
//! Precedence, nearest first:
//!
//! **Own entries → merged scopes (last-merged wins) → parent chain**
//!
//! ## Core Concepts
//!
//! ### Scopes and the tree
//!
//! [`ResourceScope`] is one dictionary; [`ScopeTree`] is the arena that owns
//! all of them and hands out [`ScopeId`] handles. The parent link is a weak
//! back-reference by index: parents usually outlive children, and no scope
//! keeps another alive.
//!
//! ```rust
//! use arbor_scope::ScopeTree;
//!
//! let mut tree = ScopeTree::new();
//! let app = tree.create_scope(None);
//! let page = tree.create_scope(Some(app));
//!
//! tree.insert(app, "AccentColor", 0x0078D4_u32);
//! tree.insert(page, "FontSize", 14.0_f64);
//!
//! // Inherited from the app scope
//! assert_eq!(tree.get::<u32>(page, "AccentColor"), Some(0x0078D4));
//! // Shadowing: a nearer definition hides the farther one
//! tree.insert(page, "AccentColor", 0x4CC2FF_u32);
//! assert_eq!(tree.get::<u32>(page, "AccentColor"), Some(0x4CC2FF));
//! assert_eq!(tree.get::<u32>(app, "AccentColor"), Some(0x0078D4));
//! ```
//!
//! ### Merging
//!
//! [`ScopeTree::merge`] incorporates another scope by reference, not by
//! copy: later changes to the merged scope stay visible, and one scope (a
//! theme, say) can be merged into many others. Merged scopes are searched
//! after own entries, last-merged first, and contribute only their own
//! entries and their own merges — never their parent chains. Merges that
//! would cycle are rejected with [`CycleError`].
//!
//! ```rust
//! use arbor_scope::ScopeTree;
//!
//! let mut tree = ScopeTree::new();
//! let theme = tree.create_scope(None);
//! let overrides = tree.create_scope(None);
//! let page = tree.create_scope(None);
//!
//! tree.insert(theme, "AccentColor", 0x0078D4_u32);
//! tree.insert(overrides, "AccentColor", 0xFF8C00_u32);
//!
//! tree.merge(page, theme).unwrap();
//! tree.merge(page, overrides).unwrap();
//!
//! // Last-merged wins
//! assert_eq!(tree.get::<u32>(page, "AccentColor"), Some(0xFF8C00));
//! ```
//!
//! ### Values
//!
//! Dictionaries are heterogeneous: entries are [`ResourceValue`]s, a
//! type-erased box over any `Clone + 'static` type with checked downcasts.
//! [`ScopeTree::get`] is static resolution — a one-time snapshot with no
//! link back to the entry. Dynamic resolution (live bindings that observe
//! later writes) is layered on top by `arbor_binding`.
//!
//! ## Collaborators
//!
//! The crate neither parses markup nor owns the structural tree: a markup
//! loader populates scopes through [`ScopeTree::insert`] and
//! [`ScopeTree::merge`] at load time, and the structural tree supplies the
//! parent relationship when it calls [`ScopeTree::create_scope`].
//!
//! ## Concurrency
//!
//! Single-threaded and synchronous throughout. All operations run to
//! completion; mutation of a shared merged scope is immediately visible to
//! every scope referencing it. The tree is not safe to share across threads.
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`. It does not depend on `std`.

#![no_std]

extern crate alloc;

mod id;
mod resolve;
mod scope;
mod tree;
mod value;

pub use id::ScopeId;
pub use resolve::KeyNotFound;
pub use scope::ResourceScope;
pub use tree::{CycleError, ScopeTree};
pub use value::ResourceValue;
