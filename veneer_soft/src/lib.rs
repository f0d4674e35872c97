// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! CPU reference backend for veneer.
//!
//! [`SoftBackend`] implements [`Backend`](veneer_core::backend::Backend) on
//! premultiplied RGBA8 [`Pixmap`]s and [`SoftSurfaces`] implements
//! [`SurfaceSource`](veneer_core::surface::SurfaceSource) over in-memory
//! client buffers. Together they render a `veneer_render` scene without a
//! GPU, which makes pixel-exact tests of damage tracking possible.
//!
//! ```
//! use veneer_core::backend::Backend;
//! use veneer_core::geometry::Rect;
//! use veneer_core::scene::{NodeKind, SceneStore, SurfaceId};
//! use veneer_core::target::RenderTarget;
//! use veneer_core::trace::Tracer;
//! use veneer_render::{PassConfig, Renderer};
//! use veneer_soft::{Rgba8, SoftBackend, SoftSurfaces};
//!
//! let surfaces = SoftSurfaces::new();
//! surfaces.insert_solid(SurfaceId(1), Rect::new(0, 0, 8, 8), Rgba8::new(0, 0, 255, 255));
//! let mut backend = SoftBackend::new(surfaces.clone());
//! let output = backend.allocate(16, 16).unwrap();
//! let target = RenderTarget::new(output, Rect::new(0, 0, 16, 16), 1.0);
//!
//! let mut store = SceneStore::new();
//! let root = store.create_node(NodeKind::Group);
//! let window = store.create_surface(SurfaceId(1));
//! store.add_child(root, window);
//!
//! let mut renderer = Renderer::new(PassConfig::new());
//! renderer.render_frame(&mut store, &surfaces, &mut backend, root, &target, &mut Tracer::none());
//! let pixels = backend.pixmap(output).unwrap();
//! assert_eq!(pixels.pixel(4, 4), Some(Rgba8::new(0, 0, 255, 255)));
//! assert_eq!(pixels.pixel(12, 12), Some(Rgba8::BLACK));
//! ```

mod backend;
mod pixmap;
mod surfaces;

pub use backend::{MAX_DIMENSION, SoftBackend, SoftStats};
pub use pixmap::{Pixmap, Rgba8};
pub use surfaces::SoftSurfaces;
