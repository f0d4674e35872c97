// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! [`Backend`] implementation on CPU pixmaps.

use std::collections::BTreeMap;

use veneer_core::backend::{Backend, BackendError, FramebufferId, Texture};
use veneer_core::geometry::{Point, Rect};
use veneer_core::region::Region;
use veneer_core::scene::SurfaceId;
use veneer_core::target::RenderTarget;

use crate::pixmap::{Pixmap, Rgba8, unit_to_u8};
use crate::surfaces::SoftSurfaces;

/// Largest framebuffer edge, in pixels.
pub const MAX_DIMENSION: u32 = 16384;

/// Operation counters, reset with [`SoftBackend::take_stats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SoftStats {
    /// Successful allocations.
    pub allocations: u32,
    /// Releases of live framebuffers.
    pub releases: u32,
    /// Successful blits.
    pub blits: u32,
    /// Texture draws.
    pub texture_draws: u32,
    /// Surface draws.
    pub surface_draws: u32,
    /// Blur calls.
    pub blurs: u32,
    /// Physical pixels filled by [`Backend::clear`].
    pub cleared_pixels: i64,
}

/// A software [`Backend`] drawing surfaces from a [`SoftSurfaces`] table.
///
/// Framebuffers are premultiplied RGBA8 [`Pixmap`]s. Textures are sampled
/// with nearest filtering; blur is a separable box blur.
#[derive(Debug)]
pub struct SoftBackend {
    surfaces: SoftSurfaces,
    framebuffers: BTreeMap<FramebufferId, Pixmap>,
    next_id: u64,
    framebuffer_limit: Option<usize>,
    stats: SoftStats,
}

impl SoftBackend {
    /// Creates a backend with no framebuffers.
    #[must_use]
    pub fn new(surfaces: SoftSurfaces) -> Self {
        Self {
            surfaces,
            framebuffers: BTreeMap::new(),
            next_id: 1,
            framebuffer_limit: None,
            stats: SoftStats::default(),
        }
    }

    /// Caps the number of live framebuffers; further allocations fail with
    /// [`BackendError::OutOfMemory`]. `None` removes the cap.
    pub fn set_framebuffer_limit(&mut self, limit: Option<usize>) {
        self.framebuffer_limit = limit;
    }

    /// The pixels of a framebuffer.
    #[must_use]
    pub fn pixmap(&self, framebuffer: FramebufferId) -> Option<&Pixmap> {
        self.framebuffers.get(&framebuffer)
    }

    /// Number of live framebuffers.
    #[must_use]
    pub fn live_framebuffers(&self) -> usize {
        self.framebuffers.len()
    }

    /// Counters since the last call.
    pub fn take_stats(&mut self) -> SoftStats {
        core::mem::take(&mut self.stats)
    }

    /// Takes the destination framebuffer out of the map so it can be
    /// written while another one is read.
    fn checkout(&mut self, framebuffer: FramebufferId) -> Option<Pixmap> {
        let pixmap = self.framebuffers.remove(&framebuffer);
        if pixmap.is_none() {
            log::warn!("draw into unknown framebuffer {framebuffer:?}");
        }
        pixmap
    }
}

impl Backend for SoftBackend {
    fn allocate(&mut self, width: u32, height: u32) -> Result<FramebufferId, BackendError> {
        if width == 0 || height == 0 {
            return Err(BackendError::ZeroSize { width, height });
        }
        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(BackendError::TooLarge { width, height });
        }
        if self
            .framebuffer_limit
            .is_some_and(|limit| self.framebuffers.len() >= limit)
        {
            return Err(BackendError::OutOfMemory);
        }
        let id = FramebufferId(self.next_id);
        self.next_id += 1;
        self.framebuffers.insert(id, Pixmap::new(width, height));
        self.stats.allocations += 1;
        log::trace!("allocated {id:?} {width}x{height}");
        Ok(id)
    }

    fn release(&mut self, framebuffer: FramebufferId) {
        if self.framebuffers.remove(&framebuffer).is_some() {
            self.stats.releases += 1;
            log::trace!("released {framebuffer:?}");
        }
    }

    fn clear(&mut self, target: &RenderTarget, region: &Region, color: [f32; 4]) {
        let Some(pixmap) = self.framebuffers.get_mut(&target.framebuffer) else {
            log::warn!("clear of unknown framebuffer {:?}", target.framebuffer);
            return;
        };
        let color = Rgba8::from_f32(color);
        for rect in &target.framebuffer_region_from_geometry_region(region) {
            let rect = rect.intersect(pixmap.bounds());
            pixmap.fill_rect(rect, color);
            self.stats.cleared_pixels += rect.area();
        }
    }

    fn blit(
        &mut self,
        src: FramebufferId,
        dst: FramebufferId,
        region: &Region,
    ) -> Result<(), BackendError> {
        if src == dst {
            return Ok(());
        }
        if !self.framebuffers.contains_key(&src) {
            return Err(BackendError::UnknownFramebuffer(src));
        }
        let mut out = self
            .framebuffers
            .remove(&dst)
            .ok_or(BackendError::UnknownFramebuffer(dst))?;
        if let Some(from) = self.framebuffers.get(&src) {
            for rect in region {
                out.copy_rect_from(from, *rect);
            }
        }
        self.framebuffers.insert(dst, out);
        self.stats.blits += 1;
        Ok(())
    }

    fn draw_texture(
        &mut self,
        target: &RenderTarget,
        texture: Texture,
        geometry: kurbo::Rect,
        opacity: f32,
        scissor: Rect,
    ) {
        if texture.framebuffer == target.framebuffer {
            log::warn!("texture {:?} drawn onto itself", texture.framebuffer);
            return;
        }
        let alpha = unit_to_u8(opacity);
        if alpha == 0 {
            return;
        }
        let Some(mut out) = self.checkout(target.framebuffer) else {
            return;
        };
        if let Some(src) = self.framebuffers.get(&texture.framebuffer) {
            let clip = target.framebuffer_box_from_geometry_box(scissor);
            let quad = physical_quad(target, geometry);
            for y in clip.y..clip.bottom() {
                let Some(sy) = sample_coord(y, quad.y0, quad.y1, texture.height) else {
                    continue;
                };
                for x in clip.x..clip.right() {
                    let Some(sx) = sample_coord(x, quad.x0, quad.x1, texture.width) else {
                        continue;
                    };
                    let (Some(s), Some(d)) = (src.pixel(sx, sy), out.pixel(x, y)) else {
                        continue;
                    };
                    out.set_pixel(x, y, s.scaled(alpha).over(d));
                }
            }
        } else {
            log::warn!("unknown texture {:?}", texture.framebuffer);
        }
        self.framebuffers.insert(target.framebuffer, out);
        self.stats.texture_draws += 1;
    }

    fn render_surface(
        &mut self,
        target: &RenderTarget,
        surface: SurfaceId,
        origin: Point,
        damage: &Region,
    ) {
        if !self.surfaces.contains(surface) {
            log::debug!("surface {surface:?} has no content");
            return;
        }
        let Some(pixmap) = self.framebuffers.get_mut(&target.framebuffer) else {
            log::warn!("draw into unknown framebuffer {:?}", target.framebuffer);
            return;
        };
        for rect in &target.framebuffer_region_from_geometry_region(damage) {
            for y in rect.y..rect.bottom() {
                let ly = logical_coord(y, target.geometry.y, target.scale) - origin.y;
                for x in rect.x..rect.right() {
                    let lx = logical_coord(x, target.geometry.x, target.scale) - origin.x;
                    let Some(s) = self.surfaces.sample(surface, lx, ly) else {
                        continue;
                    };
                    if let Some(d) = pixmap.pixel(x, y) {
                        pixmap.set_pixel(x, y, s.over(d));
                    }
                }
            }
        }
        self.stats.surface_draws += 1;
    }

    fn blur(&mut self, target: &RenderTarget, bounds: Rect, region: &Region, radius: f64) {
        let Some(pixmap) = self.framebuffers.get_mut(&target.framebuffer) else {
            log::warn!("blur of unknown framebuffer {:?}", target.framebuffer);
            return;
        };
        let rects = target.framebuffer_region_from_geometry_region(region);
        let bounds = target.framebuffer_box_from_geometry_box(bounds);
        pixmap.box_blur(rects.rects(), bounds, blur_steps(radius));
        self.stats.blurs += 1;
    }
}

/// `geometry` in physical pixels of `target`'s framebuffer.
fn physical_quad(target: &RenderTarget, geometry: kurbo::Rect) -> kurbo::Rect {
    let origin = kurbo::Vec2::new(f64::from(target.geometry.x), f64::from(target.geometry.y));
    let r = (geometry - origin).abs();
    kurbo::Rect::new(
        r.x0 * target.scale,
        r.y0 * target.scale,
        r.x1 * target.scale,
        r.y1 * target.scale,
    )
}

/// Texel index for the centre of physical pixel `p` on a quad spanning
/// `[q0, q1)`, or `None` if the centre lies outside the quad.
#[expect(
    clippy::cast_possible_truncation,
    reason = "the texel index is bounded by the texture size"
)]
fn sample_coord(p: i32, q0: f64, q1: f64, size: u32) -> Option<i32> {
    let span = q1 - q0;
    if span <= 0.0 {
        return None;
    }
    let t = (f64::from(p) + 0.5 - q0) / span;
    if !(0.0..1.0).contains(&t) {
        return None;
    }
    let last = i32::try_from(size).unwrap_or(i32::MAX) - 1;
    Some(((t * f64::from(size)).floor() as i32).min(last))
}

/// Logical coordinate covering the centre of physical pixel `p`.
#[expect(
    clippy::cast_possible_truncation,
    reason = "logical coordinates fit in i32"
)]
fn logical_coord(p: i32, origin: i32, scale: f64) -> i32 {
    origin + ((f64::from(p) + 0.5) / scale).floor() as i32
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "radius is clamped to [0, MAX_DIMENSION] before the cast"
)]
fn blur_steps(radius: f64) -> u32 {
    if radius.is_nan() {
        return 0;
    }
    radius.ceil().clamp(0.0, f64::from(MAX_DIMENSION)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(fb: FramebufferId, geometry: Rect, scale: f64) -> RenderTarget {
        RenderTarget::new(fb, geometry, scale)
    }

    #[test]
    fn allocation_limits() {
        let mut backend = SoftBackend::new(SoftSurfaces::new());
        assert_eq!(
            backend.allocate(0, 4),
            Err(BackendError::ZeroSize {
                width: 0,
                height: 4
            })
        );
        assert_eq!(
            backend.allocate(MAX_DIMENSION + 1, 4),
            Err(BackendError::TooLarge {
                width: MAX_DIMENSION + 1,
                height: 4
            })
        );
        backend.set_framebuffer_limit(Some(1));
        let fb = backend.allocate(4, 4).unwrap();
        assert_eq!(backend.allocate(4, 4), Err(BackendError::OutOfMemory));
        backend.release(fb);
        backend.release(fb);
        assert_eq!(backend.live_framebuffers(), 0);
        assert_eq!(backend.take_stats().releases, 1);
    }

    #[test]
    fn clear_converts_to_physical_pixels() {
        let mut backend = SoftBackend::new(SoftSurfaces::new());
        let fb = backend.allocate(20, 20).unwrap();
        let t = target(fb, Rect::new(100, 100, 10, 10), 2.0);
        backend.clear(
            &t,
            &Region::from_rect(Rect::new(105, 100, 50, 1)),
            [1.0, 0.0, 0.0, 1.0],
        );
        let pm = backend.pixmap(fb).unwrap();
        assert_eq!(pm.pixel(9, 0), Some(Rgba8::TRANSPARENT));
        assert_eq!(pm.pixel(10, 1), Some(Rgba8::new(255, 0, 0, 255)));
        assert_eq!(pm.pixel(19, 1), Some(Rgba8::new(255, 0, 0, 255)));
        assert_eq!(pm.pixel(10, 2), Some(Rgba8::TRANSPARENT));
    }

    #[test]
    fn blit_checks_handles() {
        let mut backend = SoftBackend::new(SoftSurfaces::new());
        let a = backend.allocate(4, 4).unwrap();
        let b = backend.allocate(4, 4).unwrap();
        let t = target(a, Rect::new(0, 0, 4, 4), 1.0);
        backend.clear(&t, &Region::from_rect(Rect::new(0, 0, 4, 4)), [1.0; 4]);
        let region = Region::from_rect(Rect::new(1, 1, 2, 2));
        backend.blit(a, b, &region).unwrap();
        let pm = backend.pixmap(b).unwrap();
        assert_eq!(pm.pixel(0, 0), Some(Rgba8::TRANSPARENT));
        assert_eq!(pm.pixel(2, 2), Some(Rgba8::new(255, 255, 255, 255)));
        assert_eq!(
            backend.blit(a, FramebufferId(99), &region),
            Err(BackendError::UnknownFramebuffer(FramebufferId(99)))
        );
        assert!(backend.pixmap(a).is_some(), "source survives a failed blit");
    }

    #[test]
    fn texture_is_stretched_and_scissored() {
        let mut backend = SoftBackend::new(SoftSurfaces::new());
        let src = backend.allocate(2, 2).unwrap();
        let dst = backend.allocate(8, 8).unwrap();
        let src_target = target(src, Rect::new(0, 0, 2, 2), 1.0);
        backend.clear(
            &src_target,
            &Region::from_rect(Rect::new(1, 0, 1, 2)),
            [0.0, 0.0, 1.0, 1.0],
        );
        let dst_target = target(dst, Rect::new(0, 0, 8, 8), 1.0);
        backend.draw_texture(
            &dst_target,
            Texture {
                framebuffer: src,
                width: 2,
                height: 2,
            },
            kurbo::Rect::new(0.0, 0.0, 8.0, 8.0),
            1.0,
            Rect::new(0, 0, 6, 8),
        );
        let pm = backend.pixmap(dst).unwrap();
        assert_eq!(pm.pixel(3, 3), Some(Rgba8::TRANSPARENT));
        assert_eq!(pm.pixel(4, 3), Some(Rgba8::new(0, 0, 255, 255)));
        assert_eq!(pm.pixel(6, 3), Some(Rgba8::TRANSPARENT), "outside scissor");
    }

    #[test]
    fn surface_is_drawn_at_origin() {
        let surfaces = SoftSurfaces::new();
        surfaces.insert_solid(
            SurfaceId(1),
            Rect::new(2, 2, 2, 2),
            Rgba8::new(0, 255, 0, 255),
        );
        let mut backend = SoftBackend::new(surfaces);
        let fb = backend.allocate(8, 8).unwrap();
        let t = target(fb, Rect::new(0, 0, 4, 4), 2.0);
        backend.render_surface(
            &t,
            SurfaceId(1),
            Point::new(2, 2),
            &Region::from_rect(Rect::new(0, 0, 4, 4)),
        );
        let pm = backend.pixmap(fb).unwrap();
        assert_eq!(pm.pixel(3, 3), Some(Rgba8::TRANSPARENT));
        assert_eq!(pm.pixel(4, 4), Some(Rgba8::new(0, 255, 0, 255)));
        assert_eq!(pm.pixel(7, 7), Some(Rgba8::new(0, 255, 0, 255)));
        assert_eq!(backend.take_stats().surface_draws, 1);
    }
}
