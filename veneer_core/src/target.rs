// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render targets and logical-to-physical coordinate conversion.

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

use crate::backend::FramebufferId;
use crate::geometry::Rect;
use crate::region::Region;

/// One destination framebuffer for a render pass.
///
/// `geometry` is the logical area the framebuffer shows; `scale` is the
/// number of physical pixels per logical pixel. The physical viewport is
/// always `ceil(geometry.size × scale)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderTarget {
    /// Framebuffer the pass draws into.
    pub framebuffer: FramebufferId,
    /// Logical geometry covered by the framebuffer.
    pub geometry: Rect,
    /// Physical pixels per logical pixel.
    pub scale: f64,
    /// Physical width in pixels.
    pub viewport_width: u32,
    /// Physical height in pixels.
    pub viewport_height: u32,
}

impl RenderTarget {
    /// Creates a target, deriving the physical viewport from `geometry` and
    /// `scale`.
    ///
    /// # Panics
    ///
    /// Panics if `scale` is not strictly positive and finite.
    #[must_use]
    pub fn new(framebuffer: FramebufferId, geometry: Rect, scale: f64) -> Self {
        assert!(
            scale.is_finite() && scale > 0.0,
            "render target scale must be positive, got {scale}"
        );
        Self {
            framebuffer,
            geometry,
            scale,
            viewport_width: physical_len(geometry.width, scale),
            viewport_height: physical_len(geometry.height, scale),
        }
    }

    /// Returns a copy of this target drawing into a different framebuffer
    /// that covers `geometry` at the same scale.
    #[must_use]
    pub fn retarget(&self, framebuffer: FramebufferId, geometry: Rect) -> Self {
        Self::new(framebuffer, geometry, self.scale)
    }

    /// The full physical viewport as a rectangle at the origin.
    #[must_use]
    pub fn viewport(&self) -> Rect {
        Rect::new(
            0,
            0,
            clamp_i32(self.viewport_width),
            clamp_i32(self.viewport_height),
        )
    }

    /// Converts a logical rectangle to physical framebuffer pixels.
    ///
    /// The result is relative to the target origin, rounded outward and
    /// clamped to the viewport. Rectangles entirely outside the target
    /// produce an empty rectangle.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "values are rounded and clamped to the viewport before the cast"
    )]
    pub fn framebuffer_box_from_geometry_box(&self, rect: Rect) -> Rect {
        if rect.is_empty() {
            return Rect::EMPTY;
        }
        let s = self.scale;
        let x0 = f64::from(rect.x - self.geometry.x) * s;
        let y0 = f64::from(rect.y - self.geometry.y) * s;
        let x1 = f64::from(rect.right() - self.geometry.x) * s;
        let y1 = f64::from(rect.bottom() - self.geometry.y) * s;

        let vw = f64::from(self.viewport_width);
        let vh = f64::from(self.viewport_height);
        let x0 = x0.floor().clamp(0.0, vw) as i32;
        let y0 = y0.floor().clamp(0.0, vh) as i32;
        let x1 = x1.ceil().clamp(0.0, vw) as i32;
        let y1 = y1.ceil().clamp(0.0, vh) as i32;
        Rect::from_corners(x0, y0, x1, y1).intersect(self.viewport())
    }

    /// Region variant of
    /// [`framebuffer_box_from_geometry_box`](Self::framebuffer_box_from_geometry_box).
    #[must_use]
    pub fn framebuffer_region_from_geometry_region(&self, region: &Region) -> Region {
        region
            .iter()
            .map(|r| self.framebuffer_box_from_geometry_box(*r))
            .collect()
    }

    /// Logical padding needed for a blur of `radius` physical pixels.
    ///
    /// Equal to `ceil(radius / scale)`; never negative.
    #[must_use]
    pub fn padding_for_radius(&self, radius: f64) -> i32 {
        padding_for_radius(radius, self.scale)
    }
}

/// `ceil(radius / scale)` clamped to `0..=i32::MAX`.
#[must_use]
#[expect(
    clippy::cast_possible_truncation,
    reason = "clamped into i32 range before the cast"
)]
pub fn padding_for_radius(radius: f64, scale: f64) -> i32 {
    if radius.is_nan() || scale.is_nan() || radius <= 0.0 || scale <= 0.0 {
        return 0;
    }
    (radius / scale).ceil().min(f64::from(i32::MAX)) as i32
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "negative sizes are clamped to zero; viewports fit in u32"
)]
fn physical_len(logical: i32, scale: f64) -> u32 {
    (f64::from(logical.max(0)) * scale)
        .ceil()
        .min(f64::from(u32::MAX)) as u32
}

fn clamp_i32(v: u32) -> i32 {
    i32::try_from(v).unwrap_or(i32::MAX)
}
