// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fakes shared by the unit tests.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec::Vec;

use veneer_core::backend::{Backend, BackendError, FramebufferId, Texture};
use veneer_core::geometry::{Point, Rect};
use veneer_core::region::Region;
use veneer_core::scene::SurfaceId;
use veneer_core::surface::SurfaceSource;
use veneer_core::target::RenderTarget;

/// A backend call, as seen by [`RecordingBackend`].
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Call {
    Allocate {
        framebuffer: FramebufferId,
        width: u32,
        height: u32,
    },
    Release(FramebufferId),
    Clear {
        framebuffer: FramebufferId,
        region: Region,
        color: [f32; 4],
    },
    Blit {
        src: FramebufferId,
        dst: FramebufferId,
        region: Region,
    },
    DrawTexture {
        framebuffer: FramebufferId,
        texture: FramebufferId,
        geometry: kurbo::Rect,
        opacity: f32,
        scissor: Rect,
    },
    RenderSurface {
        framebuffer: FramebufferId,
        surface: SurfaceId,
        damage: Region,
    },
    Blur {
        framebuffer: FramebufferId,
        bounds: Rect,
        region: Region,
        radius: f64,
    },
}

/// Backend that records every call and draws nothing.
#[derive(Debug)]
pub(crate) struct RecordingBackend {
    pub(crate) calls: Vec<Call>,
    pub(crate) released: Vec<FramebufferId>,
    pub(crate) fail_allocations: bool,
    pub(crate) fail_blits: bool,
    next_id: u64,
    live: BTreeSet<FramebufferId>,
}

impl RecordingBackend {
    /// Framebuffer id the tests use for the output.
    pub(crate) const OUTPUT: FramebufferId = FramebufferId(0);

    pub(crate) fn new() -> Self {
        Self {
            calls: Vec::new(),
            released: Vec::new(),
            fail_allocations: false,
            fail_blits: false,
            next_id: 1,
            live: BTreeSet::new(),
        }
    }

    pub(crate) fn live_framebuffers(&self) -> usize {
        self.live.len()
    }

    pub(crate) fn blits(&self) -> Vec<(FramebufferId, FramebufferId, Region)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Blit { src, dst, region } => Some((*src, *dst, region.clone())),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn blurs(&self) -> Vec<Region> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Blur { region, .. } => Some(region.clone()),
                _ => None,
            })
            .collect()
    }
}

impl Backend for RecordingBackend {
    fn allocate(&mut self, width: u32, height: u32) -> Result<FramebufferId, BackendError> {
        if width == 0 || height == 0 {
            return Err(BackendError::ZeroSize { width, height });
        }
        if self.fail_allocations {
            return Err(BackendError::OutOfMemory);
        }
        let framebuffer = FramebufferId(self.next_id);
        self.next_id += 1;
        self.live.insert(framebuffer);
        self.calls.push(Call::Allocate {
            framebuffer,
            width,
            height,
        });
        Ok(framebuffer)
    }

    fn release(&mut self, framebuffer: FramebufferId) {
        assert!(
            self.live.remove(&framebuffer),
            "double release of {framebuffer:?}"
        );
        self.released.push(framebuffer);
        self.calls.push(Call::Release(framebuffer));
    }

    fn clear(&mut self, target: &RenderTarget, region: &Region, color: [f32; 4]) {
        self.calls.push(Call::Clear {
            framebuffer: target.framebuffer,
            region: region.clone(),
            color,
        });
    }

    fn blit(
        &mut self,
        src: FramebufferId,
        dst: FramebufferId,
        region: &Region,
    ) -> Result<(), BackendError> {
        if self.fail_blits {
            return Err(BackendError::UnknownFramebuffer(src));
        }
        self.calls.push(Call::Blit {
            src,
            dst,
            region: region.clone(),
        });
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
        self.calls.push(Call::DrawTexture {
            framebuffer: target.framebuffer,
            texture: texture.framebuffer,
            geometry,
            opacity,
            scissor,
        });
    }

    fn render_surface(
        &mut self,
        target: &RenderTarget,
        surface: SurfaceId,
        _origin: Point,
        damage: &Region,
    ) {
        self.calls.push(Call::RenderSurface {
            framebuffer: target.framebuffer,
            surface,
            damage: damage.clone(),
        });
    }

    fn blur(&mut self, target: &RenderTarget, bounds: Rect, region: &Region, radius: f64) {
        self.calls.push(Call::Blur {
            framebuffer: target.framebuffer,
            bounds,
            region: region.clone(),
            radius,
        });
    }
}

/// Surface layer backed by a map. Opaque regions are surface-local.
#[derive(Debug, Default)]
pub(crate) struct FakeSurfaces {
    surfaces: BTreeMap<SurfaceId, (Rect, Region)>,
}

impl FakeSurfaces {
    pub(crate) fn insert(&mut self, surface: SurfaceId, bbox: Rect, opaque: Option<Region>) {
        self.surfaces
            .insert(surface, (bbox, opaque.unwrap_or_default()));
    }

    pub(crate) fn remove(&mut self, surface: SurfaceId) {
        self.surfaces.remove(&surface);
    }
}

impl SurfaceSource for FakeSurfaces {
    fn bounding_box(&self, surface: SurfaceId) -> Option<Rect> {
        self.surfaces
            .get(&surface)
            .map(|(bbox, _)| *bbox)
            .filter(|bbox| !bbox.is_empty())
    }

    fn opaque_region(&self, surface: SurfaceId, origin: Point) -> Region {
        self.surfaces
            .get(&surface)
            .map(|(_, opaque)| opaque.translated(origin.x, origin.y))
            .unwrap_or_default()
    }
}
