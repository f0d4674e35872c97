// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node geometry: bounding boxes and opaque regions.
//!
//! Both are computed on demand from the scene store and the surface layer;
//! nothing is cached between frames. Results are in global logical
//! coordinates.
//!
//! | kind      | bounding box                                  | opaque region    |
//! |-----------|-----------------------------------------------|------------------|
//! | Group     | union of children                             | union of children|
//! | Surface   | surface box (empty without content)           | surface opaque   |
//! | Blur      | child box grown by the blur padding           | child's          |
//! | Crossfade | child box ∪ displayed geometry                | none             |

use veneer_core::geometry::Rect;
use veneer_core::region::Region;
use veneer_core::scene::{NodeId, NodeKind, SceneStore, SurfaceId};
use veneer_core::surface::SurfaceSource;
use veneer_core::target::padding_for_radius;

/// Bounding box of `node` for a pass at `scale`.
#[must_use]
pub fn bounding_box(
    store: &SceneStore,
    surfaces: &dyn SurfaceSource,
    node: NodeId,
    scale: f64,
) -> Rect {
    match store.kind(node) {
        NodeKind::Group => children_box(store, surfaces, node, scale),
        NodeKind::Surface(s) => surfaces.bounding_box(*s).unwrap_or(Rect::EMPTY),
        NodeKind::Blur(provider) => {
            let child = children_box(store, surfaces, node, scale);
            if child.is_empty() {
                Rect::EMPTY
            } else {
                child.inflate(padding_for_radius(provider.blur_radius(), scale))
            }
        }
        NodeKind::Crossfade(provider) => children_box(store, surfaces, node, scale)
            .union_bounds(Rect::from_kurbo_outer(provider.displayed_geometry())),
    }
}

/// Union of the bounding boxes of `node`'s children.
#[must_use]
pub fn children_box(
    store: &SceneStore,
    surfaces: &dyn SurfaceSource,
    node: NodeId,
    scale: f64,
) -> Rect {
    store
        .children(node)
        .map(|c| bounding_box(store, surfaces, c, scale))
        .fold(Rect::EMPTY, Rect::union_bounds)
}

/// Fully opaque part of `node`.
#[must_use]
pub fn opaque_region(store: &SceneStore, surfaces: &dyn SurfaceSource, node: NodeId) -> Region {
    match store.kind(node) {
        NodeKind::Group | NodeKind::Blur(_) => {
            let mut region = Region::new();
            for child in store.children(node) {
                region.union_with(&opaque_region(store, surfaces, child));
            }
            region
        }
        NodeKind::Surface(s) => match surfaces.bounding_box(*s) {
            Some(bbox) => {
                let mut region = surfaces.opaque_region(*s, bbox.origin());
                region.clip_to(bbox);
                region
            }
            None => Region::new(),
        },
        NodeKind::Crossfade(_) => Region::new(),
    }
}

/// First surface in `node`'s subtree in back-to-front pre-order.
#[must_use]
pub fn first_surface(store: &SceneStore, node: NodeId) -> Option<SurfaceId> {
    if let NodeKind::Surface(s) = store.kind(node) {
        return Some(*s);
    }
    store.children(node).find_map(|c| first_surface(store, c))
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;

    use veneer_core::effect::{CrossfadeState, SharedBlurRadius};

    use super::*;
    use crate::testing::FakeSurfaces;

    #[test]
    fn group_is_union_of_children() {
        let mut surfaces = FakeSurfaces::default();
        surfaces.insert(SurfaceId(1), Rect::new(0, 0, 10, 10), None);
        surfaces.insert(SurfaceId(2), Rect::new(20, 5, 10, 10), None);

        let mut store = SceneStore::new();
        let g = store.create_node(NodeKind::Group);
        let a = store.create_surface(SurfaceId(1));
        let b = store.create_surface(SurfaceId(2));
        store.add_child(g, a);
        store.add_child(g, b);

        assert_eq!(
            bounding_box(&store, &surfaces, g, 1.0),
            Rect::from_corners(0, 0, 30, 15)
        );
    }

    #[test]
    fn blur_box_includes_padding() {
        let mut surfaces = FakeSurfaces::default();
        surfaces.insert(SurfaceId(1), Rect::new(10, 10, 20, 20), None);

        let mut store = SceneStore::new();
        let s = store.create_surface(SurfaceId(1));
        let b = store.wrap(s, NodeKind::Blur(Rc::new(SharedBlurRadius::new(10.0))));

        assert_eq!(
            bounding_box(&store, &surfaces, b, 2.0),
            Rect::new(5, 5, 30, 30)
        );
    }

    #[test]
    fn blur_without_content_is_empty() {
        let surfaces = FakeSurfaces::default();
        let mut store = SceneStore::new();
        let s = store.create_surface(SurfaceId(1));
        let b = store.wrap(s, NodeKind::Blur(Rc::new(SharedBlurRadius::new(10.0))));
        assert!(bounding_box(&store, &surfaces, b, 1.0).is_empty());
    }

    #[test]
    fn crossfade_box_includes_displayed_geometry() {
        let mut surfaces = FakeSurfaces::default();
        surfaces.insert(SurfaceId(1), Rect::new(0, 0, 10, 10), None);

        let mut store = SceneStore::new();
        let s = store.create_surface(SurfaceId(1));
        let state = Rc::new(CrossfadeState::new(kurbo::Rect::new(
            40.0, 40.0, 50.5, 50.0,
        )));
        let x = store.wrap(s, NodeKind::Crossfade(state));

        assert_eq!(
            bounding_box(&store, &surfaces, x, 1.0),
            Rect::from_corners(0, 0, 51, 50)
        );
        assert!(opaque_region(&store, &surfaces, x).is_empty());
        assert_eq!(first_surface(&store, x), Some(SurfaceId(1)));
    }

    #[test]
    fn opaque_region_is_clipped_to_surface() {
        let mut surfaces = FakeSurfaces::default();
        surfaces.insert(
            SurfaceId(1),
            Rect::new(100, 100, 10, 10),
            Some(Region::from_rect(Rect::new(0, 0, 50, 5))),
        );
        let mut store = SceneStore::new();
        let s = store.create_surface(SurfaceId(1));
        assert_eq!(
            opaque_region(&store, &surfaces, s).rects(),
            &[Rect::new(100, 100, 10, 5)]
        );
    }
}
