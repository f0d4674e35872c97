// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Off-screen framebuffers owned by render instances.

use veneer_core::backend::{Backend, BackendError, FramebufferId, Texture};

/// A framebuffer exclusively owned by one render instance.
///
/// The buffer must be handed back with [`release`](Self::release) before the
/// owner goes away; dropping a still-allocated buffer leaks it on the backend
/// and is logged as an error.
#[derive(Debug, Default)]
pub struct OwnedFramebuffer {
    id: Option<FramebufferId>,
    width: u32,
    height: u32,
}

impl OwnedFramebuffer {
    /// An empty handle with nothing allocated.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            id: None,
            width: 0,
            height: 0,
        }
    }

    /// Makes sure a buffer of exactly `width × height` is allocated.
    ///
    /// Returns the buffer and whether it was newly allocated (new buffers are
    /// transparent). On error the handle is left empty.
    pub fn ensure(
        &mut self,
        backend: &mut dyn Backend,
        width: u32,
        height: u32,
    ) -> Result<(FramebufferId, bool), BackendError> {
        if let Some(id) = self.id {
            if self.width == width && self.height == height {
                return Ok((id, false));
            }
        }
        self.release(backend);
        let id = backend.allocate(width, height)?;
        log::trace!("allocated {id:?} ({width}x{height})");
        self.id = Some(id);
        self.width = width;
        self.height = height;
        Ok((id, true))
    }

    /// Returns the buffer to the backend. Does nothing if empty.
    pub fn release(&mut self, backend: &mut dyn Backend) {
        if let Some(id) = self.id.take() {
            log::trace!("released {id:?}");
            backend.release(id);
        }
        self.width = 0;
        self.height = 0;
    }

    /// The framebuffer, if allocated.
    #[must_use]
    pub fn id(&self) -> Option<FramebufferId> {
        self.id
    }

    /// The buffer as a texture, if allocated.
    #[must_use]
    pub fn texture(&self) -> Option<Texture> {
        self.id.map(|framebuffer| Texture {
            framebuffer,
            width: self.width,
            height: self.height,
        })
    }

    /// Returns `true` if a buffer is allocated.
    #[must_use]
    pub fn is_allocated(&self) -> bool {
        self.id.is_some()
    }
}

impl Drop for OwnedFramebuffer {
    fn drop(&mut self) {
        if let Some(id) = self.id {
            log::error!("{id:?} dropped without being released");
        }
    }
}
