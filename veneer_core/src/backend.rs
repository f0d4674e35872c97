// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Graphics backend contract.
//!
//! Veneer never talks to a graphics API directly. Everything the render
//! instances need from the GPU goes through the [`Backend`] trait, which is
//! deliberately small:
//!
//! - **Framebuffers**: [`allocate`](Backend::allocate) and
//!   [`release`](Backend::release) off-screen buffers, identified by
//!   [`FramebufferId`].
//! - **Copies**: [`blit`](Backend::blit) pixels between two framebuffers of
//!   compatible size, and [`clear`](Backend::clear) a region.
//! - **Drawing**: [`draw_texture`](Backend::draw_texture) (a textured quad
//!   with opacity and a scissor), [`render_surface`](Backend::render_surface)
//!   (raw client content) and [`blur`](Backend::blur).
//!
//! Coordinate conventions:
//!
//! - Methods taking a [`RenderTarget`] take *logical* coordinates and convert
//!   them with the target themselves.
//! - [`blit`](Backend::blit) works on *physical* framebuffer pixels, with the
//!   same coordinates in source and destination.
//!
//! Backends clamp every rectangle they receive to the framebuffer they touch.

use core::fmt;

use crate::geometry::{Point, Rect};
use crate::region::Region;
use crate::scene::SurfaceId;
use crate::target::RenderTarget;

/// An opaque handle to a backend-managed framebuffer.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FramebufferId(pub u64);

impl fmt::Debug for FramebufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FramebufferId({})", self.0)
    }
}

/// A framebuffer viewed as a texture for sampling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Texture {
    /// Framebuffer holding the pixels.
    pub framebuffer: FramebufferId,
    /// Physical width in pixels.
    pub width: u32,
    /// Physical height in pixels.
    pub height: u32,
}

/// Failures reported by fallible backend operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// A framebuffer was requested with zero width or height.
    #[error("framebuffer size {width}x{height} has no pixels")]
    ZeroSize {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },
    /// A framebuffer exceeds the backend's size limit.
    #[error("framebuffer size {width}x{height} exceeds the backend limit")]
    TooLarge {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },
    /// The backend ran out of framebuffer memory.
    #[error("out of framebuffer memory")]
    OutOfMemory,
    /// The framebuffer handle is not known to the backend.
    #[error("unknown framebuffer {0:?}")]
    UnknownFramebuffer(FramebufferId),
}

/// Operations a graphics backend must provide.
pub trait Backend {
    /// Allocates an off-screen framebuffer of `width × height` physical
    /// pixels, initialized to transparent.
    fn allocate(&mut self, width: u32, height: u32) -> Result<FramebufferId, BackendError>;

    /// Frees a framebuffer. Unknown handles are ignored.
    fn release(&mut self, framebuffer: FramebufferId);

    /// Fills a logical `region` of the target with a premultiplied color.
    fn clear(&mut self, target: &RenderTarget, region: &Region, color: [f32; 4]);

    /// Copies physical `region` from `src` into the same coordinates of `dst`.
    fn blit(
        &mut self,
        src: FramebufferId,
        dst: FramebufferId,
        region: &Region,
    ) -> Result<(), BackendError>;

    /// Draws `texture` stretched over logical `geometry` with `opacity`,
    /// source-over, restricted to the logical `scissor` rectangle.
    fn draw_texture(
        &mut self,
        target: &RenderTarget,
        texture: Texture,
        geometry: kurbo::Rect,
        opacity: f32,
        scissor: Rect,
    );

    /// Draws a client surface whose top-left corner sits at logical `origin`,
    /// restricted to the logical `damage`.
    fn render_surface(
        &mut self,
        target: &RenderTarget,
        surface: SurfaceId,
        origin: Point,
        damage: &Region,
    );

    /// Blurs the target's pixels inside logical `region` with the given
    /// `radius` in physical pixels, sampling only inside logical `bounds`.
    fn blur(&mut self, target: &RenderTarget, bounds: Rect, region: &Region, radius: f64);
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::*;

    #[test]
    fn error_messages() {
        assert_eq!(
            BackendError::ZeroSize {
                width: 0,
                height: 4
            }
            .to_string(),
            "framebuffer size 0x4 has no pixels"
        );
        assert_eq!(
            BackendError::UnknownFramebuffer(FramebufferId(7)).to_string(),
            "unknown framebuffer FramebufferId(7)"
        );
    }
}
