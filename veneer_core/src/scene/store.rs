// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays node storage with allocation, topology, kind and damage
//! management.

use alloc::vec::Vec;

use understory_dirty::{CycleHandling, DirtyTracker};

use super::id::{INVALID, NodeId, SurfaceId};
use super::kind::{NodeClass, NodeKind, TransformerKind};
use super::traverse::Children;
use crate::dirty;
use crate::region::Region;

/// Struct-of-arrays storage for all scene nodes.
///
/// Nodes are addressed by [`NodeId`] handles. Internally, each node occupies
/// a slot in parallel arrays. Destroyed nodes are recycled via a free list,
/// and generation counters prevent stale handle access.
///
/// Children are ordered back to front: the last child is drawn on top.
#[derive(Debug)]
pub struct SceneStore {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,

    // -- Per-node data --
    pub(crate) kind: Vec<NodeKind>,
    pub(crate) pending_damage: Vec<Region>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,

    // -- Dirty tracking --
    pub(crate) dirty: DirtyTracker<u32>,

    // -- Traversal cache --
    pub(crate) traversal_order: Vec<u32>,
    pub(crate) traversal_dirty: bool,

    // -- Lifecycle tracking --
    pub(crate) pending_added: Vec<u32>,
    pub(crate) pending_removed: Vec<u32>,
}

impl Default for SceneStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneStore {
    /// Creates an empty scene store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parent: Vec::new(),
            first_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            kind: Vec::new(),
            pending_damage: Vec::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            traversal_order: Vec::new(),
            traversal_dirty: true,
            pending_added: Vec::new(),
            pending_removed: Vec::new(),
        }
    }

    // -- Allocation API --

    /// Creates a new detached node of the given kind and returns its handle.
    pub fn create_node(&mut self, kind: NodeKind) -> NodeId {
        let idx = if let Some(idx) = self.free_list.pop() {
            // Reuse a freed slot. The generation was bumped on destroy.
            self.parent[idx as usize] = INVALID;
            self.first_child[idx as usize] = INVALID;
            self.next_sibling[idx as usize] = INVALID;
            self.prev_sibling[idx as usize] = INVALID;
            self.kind[idx as usize] = kind;
            self.pending_damage[idx as usize].clear();
            idx
        } else {
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.kind.push(kind);
            self.pending_damage.push(Region::new());
            self.generation.push(0);
            idx
        };

        self.traversal_dirty = true;
        self.pending_added.push(idx);
        self.dirty.mark(idx, dirty::TOPOLOGY);

        NodeId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Creates a surface leaf. Shorthand for
    /// `create_node(NodeKind::Surface(surface))`.
    pub fn create_surface(&mut self, surface: SurfaceId) -> NodeId {
        self.create_node(NodeKind::Surface(surface))
    }

    /// Destroys a node, freeing its slot for reuse.
    ///
    /// # Panics
    ///
    /// Panics if the node has children (remove them first) or if the handle
    /// is stale.
    pub fn destroy_node(&mut self, id: NodeId) {
        self.validate(id);
        let idx = id.idx;
        assert!(
            self.first_child[idx as usize] == INVALID,
            "cannot destroy node with children"
        );

        if self.parent[idx as usize] != INVALID {
            self.unlink_from_parent(idx);
        }

        self.dirty.remove_key(idx);

        // Bump generation so old handles immediately fail validation.
        self.generation[idx as usize] += 1;
        // Release provider references held by the kind.
        self.kind[idx as usize] = NodeKind::Group;
        self.pending_damage[idx as usize].clear();

        self.free_list.push(idx);
        self.traversal_dirty = true;
        self.pending_removed.push(idx);
        self.dirty.mark(idx, dirty::TOPOLOGY);
    }

    /// Destroys a node and its whole subtree, children first.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn destroy_subtree(&mut self, id: NodeId) {
        self.validate(id);
        loop {
            let Some(child) = self.children(id).next() else {
                break;
            };
            self.destroy_subtree(child);
        }
        self.destroy_node(id);
    }

    /// Returns whether the given handle refers to a live node.
    #[must_use]
    pub fn is_alive(&self, id: NodeId) -> bool {
        (id.idx < self.len)
            && self.generation[id.idx as usize] == id.generation
            && !self.free_list.contains(&id.idx)
    }

    // -- Topology API --

    /// Adds `child` as the last (topmost) child of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, if `child` already has a parent, if
    /// `parent` is a surface, or if `parent` is a transformer that already
    /// has a child.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        self.validate(parent);
        self.validate(child);
        let c = child.idx;
        assert!(
            self.parent[c as usize] == INVALID,
            "child already has a parent"
        );
        self.link_last(parent.idx, c);
    }

    /// Removes `child` from its current parent.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the node has no parent.
    pub fn remove_from_parent(&mut self, child: NodeId) {
        self.validate(child);
        let c = child.idx;
        assert!(self.parent[c as usize] != INVALID, "node has no parent");

        let p = self.parent[c as usize];
        self.unlink_from_parent(c);

        self.traversal_dirty = true;
        self.dirty.mark(p, dirty::TOPOLOGY);
        self.dirty.mark(c, dirty::TOPOLOGY);
    }

    /// Moves `child` to be the last child of `new_parent`.
    ///
    /// If `child` already has a parent, it is removed first.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, or under the same conditions as
    /// [`add_child`](Self::add_child).
    pub fn reparent(&mut self, child: NodeId, new_parent: NodeId) {
        self.validate(child);
        self.validate(new_parent);

        if self.parent[child.idx as usize] != INVALID {
            let old_p = self.parent[child.idx as usize];
            self.unlink_from_parent(child.idx);
            self.dirty.mark(old_p, dirty::TOPOLOGY);
        }

        self.link_last(new_parent.idx, child.idx);
    }

    /// Inserts `child` directly behind `sibling` in the sibling list.
    ///
    /// `child` must not already have a parent. `sibling` must have a parent.
    ///
    /// # Panics
    ///
    /// Panics if handles are stale, `child` already has a parent, or `sibling`
    /// has no parent.
    pub fn insert_before(&mut self, child: NodeId, sibling: NodeId) {
        self.validate(child);
        self.validate(sibling);
        let c = child.idx;
        let s = sibling.idx;
        assert!(
            self.parent[c as usize] == INVALID,
            "child already has a parent"
        );
        let p = self.parent[s as usize];
        assert!(p != INVALID, "sibling has no parent");

        self.parent[c as usize] = p;
        self.next_sibling[c as usize] = s;
        self.prev_sibling[c as usize] = self.prev_sibling[s as usize];

        if self.prev_sibling[s as usize] != INVALID {
            self.next_sibling[self.prev_sibling[s as usize] as usize] = c;
        } else {
            // `sibling` was the first child.
            self.first_child[p as usize] = c;
        }
        self.prev_sibling[s as usize] = c;

        self.traversal_dirty = true;
        self.dirty.mark(p, dirty::TOPOLOGY);
        self.dirty.mark(c, dirty::TOPOLOGY);
    }

    /// Returns the parent of a node, if any.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.validate(id);
        self.id_or_none(self.parent[id.idx as usize])
    }

    /// Returns an iterator over the direct children of a node, back to front.
    #[must_use]
    pub fn children(&self, id: NodeId) -> Children<'_> {
        self.validate(id);
        Children::new(self, self.first_child[id.idx as usize])
    }

    /// Returns the number of direct children.
    #[must_use]
    pub fn child_count(&self, id: NodeId) -> usize {
        self.children(id).count()
    }

    /// Returns the only child of a node, or `None` if it has zero or several.
    #[must_use]
    pub fn single_child(&self, id: NodeId) -> Option<NodeId> {
        let mut kids = self.children(id);
        match (kids.next(), kids.next()) {
            (Some(c), None) => Some(c),
            _ => None,
        }
    }

    /// Returns the handles of root nodes (those with no parent).
    #[must_use]
    pub fn roots(&self) -> Vec<NodeId> {
        let mut roots = Vec::new();
        for idx in 0..self.len {
            if self.parent[idx as usize] == INVALID && !self.free_list.contains(&idx) {
                roots.push(NodeId {
                    idx,
                    generation: self.generation[idx as usize],
                });
            }
        }
        roots
    }

    /// Returns whether `node` is `ancestor` or lies in its subtree.
    #[must_use]
    pub fn is_descendant_of(&self, node: NodeId, ancestor: NodeId) -> bool {
        self.validate(node);
        self.validate(ancestor);
        let mut cur = node.idx;
        while cur != INVALID {
            if cur == ancestor.idx {
                return true;
            }
            cur = self.parent[cur as usize];
        }
        false
    }

    // -- Kind API --

    /// Returns the kind of a node.
    #[must_use]
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        self.validate(id);
        &self.kind[id.idx as usize]
    }

    /// Returns the payload-free class of a node.
    #[must_use]
    pub fn class(&self, id: NodeId) -> NodeClass {
        self.kind(id).class()
    }

    /// Replaces the kind of a node.
    ///
    /// The render instance for the node is recreated on the next pass.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale, if a node with children becomes a
    /// surface, or if a node with several children becomes a transformer.
    pub fn set_kind(&mut self, id: NodeId, kind: NodeKind) {
        self.validate(id);
        let children = self.child_count(id);
        match kind.class() {
            NodeClass::Surface => assert!(children == 0, "surface nodes cannot have children"),
            NodeClass::Blur | NodeClass::Crossfade => {
                assert!(children <= 1, "transformer nodes wrap a single child");
            }
            NodeClass::Group => {}
        }
        self.kind[id.idx as usize] = kind;
        self.dirty.mark(id.idx, dirty::KIND);
    }

    // -- Damage API --

    /// Records damage on a node, in global logical coordinates.
    ///
    /// Damage accumulates until the next [`commit`](Self::commit).
    pub fn damage(&mut self, id: NodeId, region: &Region) {
        self.validate(id);
        if region.is_empty() {
            return;
        }
        self.pending_damage[id.idx as usize].union_with(region);
        self.dirty.mark(id.idx, dirty::DAMAGE);
    }

    // -- Transformer chains --

    /// Wraps `node` in a new transformer of the given kind and returns the
    /// transformer's handle.
    ///
    /// Transformers above `node` form a chain ordered by
    /// [`TransformerKind::z_order`]: the new transformer is inserted above
    /// every existing transformer of lower or equal order and below the
    /// rest. The outermost element of the chain keeps `node`'s former place
    /// among its siblings.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or `kind` is not a transformer kind.
    pub fn wrap(&mut self, node: NodeId, kind: NodeKind) -> NodeId {
        self.validate(node);
        let Some(new_kind) = kind.class().transformer() else {
            panic!("wrap requires a transformer kind, got {:?}", kind.class());
        };

        let mut inner = node;
        while let Some(p) = self.parent(inner) {
            match self.class(p).transformer() {
                Some(t) if t.z_order() <= new_kind.z_order() => inner = p,
                _ => break,
            }
        }

        let transformer = self.create_node(kind);
        if self.parent[inner.idx as usize] != INVALID {
            self.insert_before(transformer, inner);
            self.remove_from_parent(inner);
        }
        self.link_last(transformer.idx, inner.idx);
        transformer
    }

    /// Removes a transformer from its chain, re-attaching its child in its
    /// place, and destroys it. Returns the former child, if any.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the node is not a transformer.
    pub fn unwrap(&mut self, transformer: NodeId) -> Option<NodeId> {
        self.validate(transformer);
        assert!(
            self.kind(transformer).is_transformer(),
            "unwrap requires a transformer node, got {:?}",
            self.class(transformer)
        );

        let child = self.single_child(transformer);
        if let Some(child) = child {
            self.remove_from_parent(child);
            if self.parent[transformer.idx as usize] != INVALID {
                self.insert_before(child, transformer);
            }
        }
        self.destroy_node(transformer);
        child
    }

    /// Finds the transformer of the given kind in the chain directly above
    /// `node`.
    ///
    /// Only single-child transformer ancestors are searched; the walk stops
    /// at the first group or at the root.
    #[must_use]
    pub fn find_transformer(&self, node: NodeId, kind: TransformerKind) -> Option<NodeId> {
        let mut cur = node;
        while let Some(p) = self.parent(cur) {
            match self.class(p).transformer() {
                Some(t) if t == kind => return Some(p),
                Some(_) => cur = p,
                None => return None,
            }
        }
        None
    }

    /// Returns the outermost transformer in the chain above `node`, or
    /// `node` itself if it is not wrapped.
    #[must_use]
    pub fn chain_top(&self, node: NodeId) -> NodeId {
        let mut cur = node;
        while let Some(p) = self.parent(cur) {
            if self.class(p).transformer().is_none() {
                break;
            }
            cur = p;
        }
        cur
    }

    // -- Raw-index accessors for the render driver --
    //
    // These accept raw slot indices (as found in `SceneChanges`) rather than
    // `NodeId` handles, skipping generation validation.

    /// Returns the current handle for raw slot `idx`, or `None` if the slot
    /// is free.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len`.
    #[must_use]
    pub fn node_at(&self, idx: u32) -> Option<NodeId> {
        assert!(
            idx < self.len,
            "slot index {idx} out of range (len {})",
            self.len
        );
        if self.free_list.contains(&idx) {
            None
        } else {
            Some(NodeId {
                idx,
                generation: self.generation[idx as usize],
            })
        }
    }

    /// Returns the kind at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len`.
    #[must_use]
    pub fn kind_at(&self, idx: u32) -> &NodeKind {
        assert!(
            idx < self.len,
            "slot index {idx} out of range (len {})",
            self.len
        );
        &self.kind[idx as usize]
    }

    // -- Internal helpers --

    /// Panics if the handle is stale.
    fn validate(&self, id: NodeId) {
        assert!(
            id.idx < self.len && self.generation[id.idx as usize] == id.generation,
            "stale NodeId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    fn id_or_none(&self, idx: u32) -> Option<NodeId> {
        if idx == INVALID {
            None
        } else {
            Some(NodeId {
                idx,
                generation: self.generation[idx as usize],
            })
        }
    }

    /// Appends detached `c` as the last child of `p`.
    fn link_last(&mut self, p: u32, c: u32) {
        match self.kind[p as usize].class() {
            NodeClass::Surface => panic!("surface nodes cannot have children"),
            NodeClass::Blur | NodeClass::Crossfade => assert!(
                self.first_child[p as usize] == INVALID,
                "transformer node already has a child"
            ),
            NodeClass::Group => {}
        }
        assert!(p != c, "node cannot be its own parent");

        self.parent[c as usize] = p;
        self.prev_sibling[c as usize] = INVALID;
        self.next_sibling[c as usize] = INVALID;

        if self.first_child[p as usize] == INVALID {
            self.first_child[p as usize] = c;
        } else {
            let mut last = self.first_child[p as usize];
            while self.next_sibling[last as usize] != INVALID {
                last = self.next_sibling[last as usize];
            }
            self.next_sibling[last as usize] = c;
            self.prev_sibling[c as usize] = last;
        }

        self.traversal_dirty = true;
        self.dirty.mark(p, dirty::TOPOLOGY);
        self.dirty.mark(c, dirty::TOPOLOGY);
    }

    /// Removes `idx` from its parent's child list without touching dirty state.
    fn unlink_from_parent(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        let prev = self.prev_sibling[idx as usize];
        let next = self.next_sibling[idx as usize];

        if prev != INVALID {
            self.next_sibling[prev as usize] = next;
        } else {
            // Was first child.
            self.first_child[p as usize] = next;
        }

        if next != INVALID {
            self.prev_sibling[next as usize] = prev;
        }

        self.parent[idx as usize] = INVALID;
        self.prev_sibling[idx as usize] = INVALID;
        self.next_sibling[idx as usize] = INVALID;
        self.traversal_dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::vec;

    use super::*;
    use crate::effect::{CrossfadeState, SharedBlurRadius};
    use crate::geometry::Rect;

    fn blur() -> NodeKind {
        NodeKind::Blur(Rc::new(SharedBlurRadius::new(4.0)))
    }

    fn crossfade() -> NodeKind {
        NodeKind::Crossfade(Rc::new(CrossfadeState::new(kurbo::Rect::ZERO)))
    }

    #[test]
    fn create_and_destroy() {
        let mut store = SceneStore::new();
        let id = store.create_node(NodeKind::Group);
        assert!(store.is_alive(id));
        store.destroy_node(id);
        assert!(!store.is_alive(id));
    }

    #[test]
    fn generation_prevents_stale_access() {
        let mut store = SceneStore::new();
        let id1 = store.create_node(NodeKind::Group);
        store.destroy_node(id1);
        let id2 = store.create_node(NodeKind::Group);
        // id2 reuses the same slot but has a different generation.
        assert!(!store.is_alive(id1));
        assert!(store.is_alive(id2));
        assert_eq!(id1.idx, id2.idx);
        assert_ne!(id1.generation, id2.generation);
    }

    #[test]
    fn add_child_and_query() {
        let mut store = SceneStore::new();
        let parent = store.create_node(NodeKind::Group);
        let child1 = store.create_surface(SurfaceId(1));
        let child2 = store.create_surface(SurfaceId(2));

        store.add_child(parent, child1);
        store.add_child(parent, child2);

        assert_eq!(store.parent(child1), Some(parent));
        let kids: Vec<_> = store.children(parent).collect();
        assert_eq!(kids, vec![child1, child2]);
        assert_eq!(store.child_count(parent), 2);
        assert_eq!(store.single_child(parent), None);
    }

    #[test]
    fn insert_before_and_reparent() {
        let mut store = SceneStore::new();
        let p1 = store.create_node(NodeKind::Group);
        let p2 = store.create_node(NodeKind::Group);
        let a = store.create_node(NodeKind::Group);
        let b = store.create_node(NodeKind::Group);
        let c = store.create_node(NodeKind::Group);

        store.add_child(p1, a);
        store.add_child(p1, c);
        store.insert_before(b, c);
        assert_eq!(store.children(p1).collect::<Vec<_>>(), vec![a, b, c]);

        store.reparent(b, p2);
        assert_eq!(store.children(p1).collect::<Vec<_>>(), vec![a, c]);
        assert_eq!(store.parent(b), Some(p2));
    }

    #[test]
    fn destroy_subtree_frees_everything() {
        let mut store = SceneStore::new();
        let root = store.create_node(NodeKind::Group);
        let mid = store.create_node(NodeKind::Group);
        let leaf = store.create_surface(SurfaceId(1));
        store.add_child(root, mid);
        store.add_child(mid, leaf);

        store.destroy_subtree(mid);
        assert!(!store.is_alive(mid));
        assert!(!store.is_alive(leaf));
        assert!(store.children(root).next().is_none());
    }

    #[test]
    #[should_panic(expected = "cannot destroy node with children")]
    fn destroy_with_children_panics() {
        let mut store = SceneStore::new();
        let parent = store.create_node(NodeKind::Group);
        let child = store.create_node(NodeKind::Group);
        store.add_child(parent, child);
        store.destroy_node(parent);
    }

    #[test]
    #[should_panic(expected = "stale NodeId")]
    fn destroyed_handle_panics_on_kind() {
        let mut store = SceneStore::new();
        let id = store.create_node(NodeKind::Group);
        store.destroy_node(id);
        let _ = store.kind(id);
    }

    #[test]
    #[should_panic(expected = "stale NodeId")]
    fn destroyed_handle_panics_on_damage() {
        let mut store = SceneStore::new();
        let id = store.create_node(NodeKind::Group);
        store.destroy_node(id);
        store.damage(id, &Region::from_rect(Rect::new(0, 0, 1, 1)));
    }

    #[test]
    #[should_panic(expected = "surface nodes cannot have children")]
    fn surface_cannot_have_children() {
        let mut store = SceneStore::new();
        let s = store.create_surface(SurfaceId(1));
        let g = store.create_node(NodeKind::Group);
        store.add_child(s, g);
    }

    #[test]
    #[should_panic(expected = "transformer node already has a child")]
    fn transformer_takes_one_child() {
        let mut store = SceneStore::new();
        let t = store.create_node(blur());
        let a = store.create_surface(SurfaceId(1));
        let b = store.create_surface(SurfaceId(2));
        store.add_child(t, a);
        store.add_child(t, b);
    }

    #[test]
    fn wrap_keeps_sibling_position() {
        let mut store = SceneStore::new();
        let root = store.create_node(NodeKind::Group);
        let a = store.create_surface(SurfaceId(1));
        let b = store.create_surface(SurfaceId(2));
        let c = store.create_surface(SurfaceId(3));
        store.add_child(root, a);
        store.add_child(root, b);
        store.add_child(root, c);

        let t = store.wrap(b, blur());
        assert_eq!(store.children(root).collect::<Vec<_>>(), vec![a, t, c]);
        assert_eq!(store.single_child(t), Some(b));
        assert_eq!(store.find_transformer(b, TransformerKind::Blur), Some(t));
        assert_eq!(store.chain_top(b), t);
    }

    #[test]
    fn wrap_orders_chain_by_z() {
        let mut store = SceneStore::new();
        let root = store.create_node(NodeKind::Group);
        let s = store.create_surface(SurfaceId(1));
        store.add_child(root, s);

        let b = store.wrap(s, blur());
        // Crossfade has a lower order, so it lands between blur and surface.
        let x = store.wrap(s, crossfade());
        assert_eq!(store.parent(s), Some(x));
        assert_eq!(store.parent(x), Some(b));
        assert_eq!(store.parent(b), Some(root));
        assert_eq!(store.find_transformer(s, TransformerKind::Blur), Some(b));
        assert_eq!(
            store.find_transformer(s, TransformerKind::Crossfade),
            Some(x)
        );
    }

    #[test]
    fn unwrap_restores_child() {
        let mut store = SceneStore::new();
        let root = store.create_node(NodeKind::Group);
        let a = store.create_surface(SurfaceId(1));
        let b = store.create_surface(SurfaceId(2));
        store.add_child(root, a);
        store.add_child(root, b);

        let t = store.wrap(a, blur());
        assert_eq!(store.unwrap(t), Some(a));
        assert!(!store.is_alive(t));
        assert_eq!(store.children(root).collect::<Vec<_>>(), vec![a, b]);
        assert_eq!(store.find_transformer(a, TransformerKind::Blur), None);
    }

    #[test]
    fn wrap_detached_root() {
        let mut store = SceneStore::new();
        let s = store.create_surface(SurfaceId(1));
        let t = store.wrap(s, crossfade());
        assert_eq!(store.parent(t), None);
        assert_eq!(store.unwrap(t), Some(s));
        assert_eq!(store.parent(s), None);
    }

    #[test]
    #[should_panic(expected = "wrap requires a transformer kind")]
    fn wrap_with_group_panics() {
        let mut store = SceneStore::new();
        let s = store.create_surface(SurfaceId(1));
        let _ = store.wrap(s, NodeKind::Group);
    }

    #[test]
    fn damage_accumulates_until_commit() {
        let mut store = SceneStore::new();
        let s = store.create_surface(SurfaceId(1));
        let _ = store.commit();

        store.damage(s, &Region::from_rect(Rect::new(0, 0, 10, 10)));
        store.damage(s, &Region::from_rect(Rect::new(5, 0, 10, 10)));
        let changes = store.commit();
        assert_eq!(changes.damage.len(), 1);
        assert_eq!(changes.damage[0].0, s.index());
        assert_eq!(changes.damage[0].1.rects(), &[Rect::new(0, 0, 15, 10)]);

        let changes = store.commit();
        assert!(changes.damage.is_empty());
    }

    #[test]
    fn set_kind_is_reported() {
        let mut store = SceneStore::new();
        let s = store.create_surface(SurfaceId(1));
        let _ = store.commit();

        store.set_kind(s, NodeKind::Surface(SurfaceId(9)));
        let changes = store.commit();
        assert_eq!(changes.kind_changed, vec![s.index()]);
        assert!(matches!(store.kind(s), NodeKind::Surface(SurfaceId(9))));
    }
}
