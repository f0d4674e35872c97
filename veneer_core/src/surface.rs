// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Read-only view of client surfaces.

use crate::geometry::{Point, Rect};
use crate::region::Region;
use crate::scene::SurfaceId;

/// Geometry queries about client surfaces.
///
/// Surfaces are owned by the window-management layer; render instances only
/// read their current placement and opacity through this trait. Surface
/// pixels are drawn with [`Backend::render_surface`](crate::backend::Backend::render_surface).
pub trait SurfaceSource {
    /// Logical box of the surface, or `None` if it currently has no content.
    fn bounding_box(&self, surface: SurfaceId) -> Option<Rect>;

    /// Fully opaque part of the surface when placed at `origin`, in logical
    /// coordinates.
    fn opaque_region(&self, surface: SurfaceId, origin: Point) -> Region;
}
