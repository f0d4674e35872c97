// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene node tree data model.
//!
//! A *node* is an element of the tree the window manager builds for one
//! output. Each node has:
//!
//! - An identity ([`NodeId`]), a generational handle that becomes stale when
//!   the node is destroyed.
//! - Topology: parent, first-child, and sibling links forming an ordered
//!   tree. Siblings are stored back to front.
//! - A [`NodeKind`]: a group, a surface leaf, or a transformer (blur,
//!   crossfade) wrapping exactly one child.
//! - Pending damage, recorded with [`damage`](SceneStore::damage) and
//!   handed out by [`commit`](SceneStore::commit).
//!
//! Nodes are stored in struct-of-arrays layout with index-based handles.
//!
//! # Dirty tracking
//!
//! Mutations mark the channels in [`dirty`](crate::dirty): TOPOLOGY for
//! structural edits, KIND for [`set_kind`](SceneStore::set_kind), and DAMAGE
//! for recorded damage. [`SceneStore::commit`] drains them into
//! [`SceneChanges`].

mod commit;
mod id;
mod kind;
mod store;
mod traverse;

pub use commit::SceneChanges;
pub use id::{INVALID, NodeId, SurfaceId};
pub use kind::{NodeClass, NodeKind, TransformerKind};
pub use store::SceneStore;
pub use traverse::Children;
