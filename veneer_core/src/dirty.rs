// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants.
//!
//! The scene store marks these channels (via [`understory_dirty`]) as it is
//! mutated, and [`SceneStore::commit`](crate::scene::SceneStore::commit)
//! drains them into [`SceneChanges`](crate::scene::SceneChanges).
//!
//! All channels are local-only: damage is a per-node region and does not
//! propagate through the tree. The render driver turns it into pass damage.

use understory_dirty::Channel;

/// Node content was damaged; the damaged area is kept next to the node.
pub const DAMAGE: Channel = Channel::new(0);

/// Tree topology changed (create/destroy, attach/detach, wrap/unwrap).
pub const TOPOLOGY: Channel = Channel::new(1);

/// The node kind (surface handle or effect provider) was replaced.
pub const KIND: Channel = Channel::new(2);
