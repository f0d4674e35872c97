// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Committing scene mutations.
//!
//! [`SceneStore::commit`] drains every dirty channel and hands the result to
//! the render driver as [`SceneChanges`]:
//!
//! 1. **TOPOLOGY**: nodes that were created, destroyed, attached or
//!    detached. The traversal order is rebuilt if needed.
//! 2. **KIND**: nodes whose kind was replaced; their render instances must
//!    be recreated.
//! 3. **DAMAGE**: nodes with recorded damage, together with the accumulated
//!    region (taken out of the store).
//!
//! Like the `*_at()` accessors, [`SceneChanges`] uses raw slot indices. A
//! slot may have been freed and reused since it was recorded, so consumers
//! must compare generations where that matters.

use alloc::vec::Vec;

use super::id::INVALID;
use super::store::SceneStore;
use crate::dirty;
use crate::region::Region;

/// The set of changes produced by a single [`SceneStore::commit`] call.
#[derive(Clone, Debug, Default)]
pub struct SceneChanges {
    /// Damaged nodes with their accumulated damage, in global logical
    /// coordinates.
    pub damage: Vec<(u32, Region)>,
    /// Nodes whose position in the tree changed (attached, detached, moved,
    /// or whose child list changed).
    pub restructured: Vec<u32>,
    /// Nodes whose kind was replaced.
    pub kind_changed: Vec<u32>,
    /// Nodes created since the last commit.
    pub added: Vec<u32>,
    /// Nodes destroyed since the last commit.
    pub removed: Vec<u32>,
    /// Whether the tree topology changed (traversal order was rebuilt).
    pub topology_changed: bool,
}

impl SceneChanges {
    /// Clears all change lists.
    pub fn clear(&mut self) {
        self.damage.clear();
        self.restructured.clear();
        self.kind_changed.clear();
        self.added.clear();
        self.removed.clear();
        self.topology_changed = false;
    }

    /// Returns `true` if nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.damage.is_empty()
            && self.restructured.is_empty()
            && self.kind_changed.is_empty()
            && self.added.is_empty()
            && self.removed.is_empty()
            && !self.topology_changed
    }
}

impl SceneStore {
    /// Drains all pending changes.
    pub fn commit(&mut self) -> SceneChanges {
        let mut changes = SceneChanges::default();
        self.commit_into(&mut changes);
        changes
    }

    /// Like [`commit`](Self::commit), but reuses a caller-provided buffer
    /// to avoid allocation.
    pub fn commit_into(&mut self, changes: &mut SceneChanges) {
        changes.clear();

        if self.traversal_dirty {
            self.rebuild_traversal_order();
            changes.topology_changed = true;
            self.traversal_dirty = false;
        }

        changes.restructured = self
            .dirty
            .drain(dirty::TOPOLOGY)
            .deterministic()
            .run()
            .collect();

        changes.kind_changed = self
            .dirty
            .drain(dirty::KIND)
            .deterministic()
            .run()
            .collect();

        let damaged: Vec<u32> = self
            .dirty
            .drain(dirty::DAMAGE)
            .deterministic()
            .run()
            .collect();
        for idx in damaged {
            let region = core::mem::take(&mut self.pending_damage[idx as usize]);
            if !region.is_empty() {
                changes.damage.push((idx, region));
            }
        }

        core::mem::swap(&mut self.pending_added, &mut changes.added);
        core::mem::swap(&mut self.pending_removed, &mut changes.removed);
    }

    /// Returns the current traversal order (depth-first pre-order, back to
    /// front within each child list).
    ///
    /// Only valid after [`commit`](Self::commit) has been called at least
    /// once.
    #[must_use]
    pub fn traversal_order(&self) -> &[u32] {
        &self.traversal_order
    }

    /// Rebuilds the depth-first pre-order traversal of all live nodes.
    fn rebuild_traversal_order(&mut self) {
        self.traversal_order.clear();
        for idx in 0..self.len {
            if self.parent[idx as usize] == INVALID && !self.free_list.contains(&idx) {
                self.dfs_collect(idx);
            }
        }
    }

    /// Depth-first pre-order collection starting from `idx`.
    fn dfs_collect(&mut self, idx: u32) {
        self.traversal_order.push(idx);
        let mut child = self.first_child[idx as usize];
        while child != INVALID {
            self.dfs_collect(child);
            child = self.next_sibling[child as usize];
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;
    use crate::geometry::Rect;
    use crate::scene::{NodeKind, SurfaceId};

    #[test]
    fn first_commit_reports_creation() {
        let mut store = SceneStore::new();
        let root = store.create_node(NodeKind::Group);
        let leaf = store.create_surface(SurfaceId(1));
        store.add_child(root, leaf);

        let changes = store.commit();
        assert!(changes.topology_changed);
        assert_eq!(changes.added, vec![root.index(), leaf.index()]);
        assert!(changes.restructured.contains(&leaf.index()));
        assert_eq!(store.traversal_order(), &[root.index(), leaf.index()]);
    }

    #[test]
    fn no_change_commit_is_empty() {
        let mut store = SceneStore::new();
        let _root = store.create_node(NodeKind::Group);
        let _ = store.commit();
        let changes = store.commit();
        assert!(changes.is_empty());
    }

    #[test]
    fn removal_is_reported() {
        let mut store = SceneStore::new();
        let root = store.create_node(NodeKind::Group);
        let leaf = store.create_surface(SurfaceId(1));
        store.add_child(root, leaf);
        let _ = store.commit();

        store.destroy_node(leaf);
        let changes = store.commit();
        assert_eq!(changes.removed, vec![leaf.index()]);
        assert!(changes.topology_changed);
        assert_eq!(store.traversal_order(), &[root.index()]);
    }

    #[test]
    fn destroyed_node_drops_pending_damage() {
        let mut store = SceneStore::new();
        let leaf = store.create_surface(SurfaceId(1));
        let _ = store.commit();
        store.damage(leaf, &Region::from_rect(Rect::new(0, 0, 4, 4)));
        store.destroy_node(leaf);
        let changes = store.commit();
        assert!(changes.damage.is_empty());
    }

    #[test]
    fn commit_into_reuses_buffer() {
        let mut store = SceneStore::new();
        let leaf = store.create_surface(SurfaceId(1));
        let mut changes = SceneChanges::default();
        store.commit_into(&mut changes);
        assert!(!changes.is_empty());

        store.damage(leaf, &Region::from_rect(Rect::new(1, 1, 2, 2)));
        store.commit_into(&mut changes);
        assert!(changes.added.is_empty());
        assert_eq!(changes.damage.len(), 1);
    }
}
