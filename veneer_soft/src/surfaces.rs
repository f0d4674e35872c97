// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Client surfaces held in memory.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use veneer_core::geometry::{Point, Rect};
use veneer_core::region::Region;
use veneer_core::scene::SurfaceId;
use veneer_core::surface::SurfaceSource;

use crate::pixmap::{Pixmap, Rgba8};

#[derive(Debug)]
struct SoftSurface {
    origin: Point,
    content: Pixmap,
    /// Pixels with full alpha, relative to the surface origin.
    opaque: Region,
}

impl SoftSurface {
    fn new(origin: Point, content: Pixmap) -> Self {
        let opaque = opaque_region(&content);
        Self {
            origin,
            content,
            opaque,
        }
    }

    fn bbox(&self) -> Rect {
        self.content
            .bounds()
            .translate(self.origin.x, self.origin.y)
    }
}

/// A shared table of surfaces whose content is one pixel per logical unit.
///
/// Cloning yields another handle to the same table, so the
/// [`SoftBackend`](crate::SoftBackend) can draw what the caller edits.
/// Every mutating method returns the logical region that changed on screen;
/// pass it to [`SceneStore::damage`](veneer_core::scene::SceneStore::damage).
#[derive(Clone, Debug, Default)]
pub struct SoftSurfaces {
    inner: Rc<RefCell<BTreeMap<SurfaceId, SoftSurface>>>,
}

impl SoftSurfaces {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a surface with its top-left corner at `origin`.
    pub fn insert(&self, id: SurfaceId, origin: Point, content: Pixmap) -> Region {
        let surface = SoftSurface::new(origin, content);
        let mut damage = Region::from_rect(surface.bbox());
        if let Some(old) = self.inner.borrow_mut().insert(id, surface) {
            damage.union_rect(old.bbox());
        }
        damage
    }

    /// Adds or replaces a surface covering `rect` with a single color.
    pub fn insert_solid(&self, id: SurfaceId, rect: Rect, color: Rgba8) -> Region {
        let width = u32::try_from(rect.width).unwrap_or(0);
        let height = u32::try_from(rect.height).unwrap_or(0);
        self.insert(id, rect.origin(), Pixmap::filled(width, height, color))
    }

    /// Fills `local` (relative to the surface origin) with `color`.
    ///
    /// Unknown surfaces are ignored and produce no damage.
    pub fn paint(&self, id: SurfaceId, local: Rect, color: Rgba8) -> Region {
        let mut map = self.inner.borrow_mut();
        let Some(surface) = map.get_mut(&id) else {
            log::warn!("paint on unknown surface {id:?}");
            return Region::new();
        };
        let local = local.intersect(surface.content.bounds());
        surface.content.fill_rect(local, color);
        surface.opaque = opaque_region(&surface.content);
        Region::from_rect(local.translate(surface.origin.x, surface.origin.y))
    }

    /// Moves a surface. The damage covers both the old and new position.
    pub fn set_position(&self, id: SurfaceId, origin: Point) -> Region {
        let mut map = self.inner.borrow_mut();
        let Some(surface) = map.get_mut(&id) else {
            return Region::new();
        };
        let mut damage = Region::from_rect(surface.bbox());
        surface.origin = origin;
        damage.union_rect(surface.bbox());
        damage
    }

    /// Removes a surface, returning the area it used to cover.
    pub fn remove(&self, id: SurfaceId) -> Region {
        self.inner
            .borrow_mut()
            .remove(&id)
            .map(|s| Region::from_rect(s.bbox()))
            .unwrap_or_default()
    }

    /// Samples the surface pixel at logical `(x, y)` relative to its
    /// origin.
    pub(crate) fn sample(&self, id: SurfaceId, x: i32, y: i32) -> Option<Rgba8> {
        self.inner.borrow().get(&id)?.content.pixel(x, y)
    }

    pub(crate) fn contains(&self, id: SurfaceId) -> bool {
        self.inner.borrow().contains_key(&id)
    }
}

impl SurfaceSource for SoftSurfaces {
    fn bounding_box(&self, surface: SurfaceId) -> Option<Rect> {
        self.inner
            .borrow()
            .get(&surface)
            .map(SoftSurface::bbox)
            .filter(|b| !b.is_empty())
    }

    fn opaque_region(&self, surface: SurfaceId, origin: Point) -> Region {
        self.inner
            .borrow()
            .get(&surface)
            .map(|s| s.opaque.translated(origin.x, origin.y))
            .unwrap_or_default()
    }
}

/// Runs of fully opaque pixels, one rectangle per run.
fn opaque_region(content: &Pixmap) -> Region {
    let width = i32::try_from(content.width()).unwrap_or(i32::MAX);
    let height = i32::try_from(content.height()).unwrap_or(i32::MAX);
    let mut runs = Vec::new();
    for y in 0..height {
        let mut start = None;
        for x in 0..=width {
            let opaque = content.pixel(x, y).is_some_and(|p| p.a == u8::MAX);
            match (start, opaque) {
                (None, true) => start = Some(x),
                (Some(x0), false) => {
                    runs.push(Rect::new(x0, y, x - x0, 1));
                    start = None;
                }
                _ => {}
            }
        }
    }
    Region::from_rects(runs)
}
