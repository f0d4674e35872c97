// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Live effect nodes, for pass-level queries.
//!
//! The registry is rebuilt from the tree whenever the topology or a node
//! kind changes, so it always lists exactly the effect nodes reachable from
//! the pass root.

use alloc::vec::Vec;

use veneer_core::scene::{NodeId, NodeKind, SceneStore};
use veneer_core::target::padding_for_radius;

/// Effect nodes reachable from the pass root.
#[derive(Debug, Default)]
pub struct EffectRegistry {
    blur_nodes: Vec<NodeId>,
    crossfade_nodes: Vec<NodeId>,
}

impl EffectRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-collects the effect nodes below `root` (inclusive).
    pub fn rebuild(&mut self, store: &SceneStore, root: NodeId) {
        self.blur_nodes.clear();
        self.crossfade_nodes.clear();
        let mut stack = Vec::new();
        stack.push(root);
        while let Some(node) = stack.pop() {
            match store.kind(node) {
                NodeKind::Blur(_) => self.blur_nodes.push(node),
                NodeKind::Crossfade(_) => self.crossfade_nodes.push(node),
                NodeKind::Group | NodeKind::Surface(_) => {}
            }
            stack.extend(store.children(node));
        }
    }

    /// Blur nodes, in no particular order.
    #[must_use]
    pub fn blur_nodes(&self) -> &[NodeId] {
        &self.blur_nodes
    }

    /// Crossfade nodes, in no particular order.
    #[must_use]
    pub fn crossfade_nodes(&self) -> &[NodeId] {
        &self.crossfade_nodes
    }

    /// Largest blur padding any live blur needs at `scale`, or 0.
    #[must_use]
    pub fn max_padding(&self, store: &SceneStore, scale: f64) -> i32 {
        self.blur_nodes
            .iter()
            .filter(|n| store.is_alive(**n))
            .filter_map(|n| match store.kind(*n) {
                NodeKind::Blur(provider) => {
                    Some(padding_for_radius(provider.blur_radius(), scale))
                }
                _ => None,
            })
            .max()
            .unwrap_or(0)
    }
}
