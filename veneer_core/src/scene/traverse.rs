// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree traversal utilities.

use super::id::{INVALID, NodeId};
use super::store::SceneStore;

/// An iterator over the direct children of a node, back to front.
///
/// Iterate with [`rev`](Iterator::rev) to walk front to back.
///
/// Created by [`SceneStore::children`].
#[derive(Debug)]
pub struct Children<'a> {
    store: &'a SceneStore,
    front: u32,
    back: u32,
}

impl<'a> Children<'a> {
    pub(crate) fn new(store: &'a SceneStore, first: u32) -> Self {
        let mut back = first;
        if back != INVALID {
            while store.next_sibling[back as usize] != INVALID {
                back = store.next_sibling[back as usize];
            }
        }
        Self {
            store,
            front: first,
            back,
        }
    }

    fn id(&self, idx: u32) -> NodeId {
        NodeId {
            idx,
            generation: self.store.generation[idx as usize],
        }
    }

    fn finish(&mut self) {
        self.front = INVALID;
        self.back = INVALID;
    }
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if self.front == INVALID {
            return None;
        }
        let idx = self.front;
        if idx == self.back {
            self.finish();
        } else {
            self.front = self.store.next_sibling[idx as usize];
        }
        Some(self.id(idx))
    }
}

impl DoubleEndedIterator for Children<'_> {
    fn next_back(&mut self) -> Option<NodeId> {
        if self.back == INVALID {
            return None;
        }
        let idx = self.back;
        if idx == self.front {
            self.finish();
        } else {
            self.back = self.store.prev_sibling[idx as usize];
        }
        Some(self.id(idx))
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use alloc::vec::Vec;

    use crate::scene::{NodeKind, SceneStore};

    #[test]
    fn forward_and_reverse() {
        let mut store = SceneStore::new();
        let root = store.create_node(NodeKind::Group);
        let a = store.create_node(NodeKind::Group);
        let b = store.create_node(NodeKind::Group);
        let c = store.create_node(NodeKind::Group);
        store.add_child(root, a);
        store.add_child(root, b);
        store.add_child(root, c);

        let fwd: Vec<_> = store.children(root).collect();
        let rev: Vec<_> = store.children(root).rev().collect();
        assert_eq!(fwd, vec![a, b, c]);
        assert_eq!(rev, vec![c, b, a]);
    }

    #[test]
    fn meet_in_the_middle() {
        let mut store = SceneStore::new();
        let root = store.create_node(NodeKind::Group);
        let a = store.create_node(NodeKind::Group);
        let b = store.create_node(NodeKind::Group);
        store.add_child(root, a);
        store.add_child(root, b);

        let mut it = store.children(root);
        assert_eq!(it.next(), Some(a));
        assert_eq!(it.next_back(), Some(b));
        assert_eq!(it.next(), None);
        assert_eq!(it.next_back(), None);
    }

    #[test]
    fn empty() {
        let mut store = SceneStore::new();
        let root = store.create_node(NodeKind::Group);
        assert!(store.children(root).next_back().is_none());
    }
}
