// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Direct scanout detection.
//!
//! A frame can skip composition when a single surface covers the whole
//! output opaquely and nothing is drawn on top of it. The walk goes front to
//! back and stops at the first node that touches the output.

use veneer_core::scene::{NodeId, NodeKind, SceneStore, SurfaceId};
use veneer_core::surface::SurfaceSource;
use veneer_core::target::RenderTarget;

use crate::bounds;

/// Result of a direct scanout query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DirectScanout {
    /// The surface can be shown directly, without composition.
    Success(SurfaceId),
    /// The node covers part of the output, so the frame must be composited.
    Occlusion,
    /// The node does not touch the output; keep looking behind it.
    Skip,
}

/// Walks `node` front to back looking for a surface to scan out.
#[must_use]
pub fn try_scanout(
    store: &SceneStore,
    surfaces: &dyn SurfaceSource,
    node: NodeId,
    target: &RenderTarget,
) -> DirectScanout {
    match store.kind(node) {
        NodeKind::Group | NodeKind::Blur(_) => {
            for child in store.children(node).rev() {
                match try_scanout(store, surfaces, child, target) {
                    DirectScanout::Skip => {}
                    result => return result,
                }
            }
            DirectScanout::Skip
        }
        NodeKind::Surface(s) => {
            let Some(bbox) = surfaces.bounding_box(*s) else {
                return DirectScanout::Skip;
            };
            if bbox == target.geometry
                && surfaces
                    .opaque_region(*s, bbox.origin())
                    .contains_rect(target.geometry)
            {
                DirectScanout::Success(*s)
            } else if bbox.intersects(target.geometry) {
                DirectScanout::Occlusion
            } else {
                DirectScanout::Skip
            }
        }
        NodeKind::Crossfade(_) => {
            if bounds::bounding_box(store, surfaces, node, target.scale)
                .intersects(target.geometry)
            {
                DirectScanout::Occlusion
            } else {
                DirectScanout::Skip
            }
        }
    }
}
