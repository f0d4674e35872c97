// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Region algebra, scene tree and backend contracts for damage-tracked
//! compositing.
//!
//! `veneer_core` holds the data model the render driver in `veneer_render`
//! works on. It is `no_std` compatible (with `alloc`) and stores the scene in
//! struct-of-arrays layout with generational index handles.
//!
//! # Architecture
//!
//! ```text
//!   window manager
//!       │  create/wrap/damage nodes
//!       ▼
//!   SceneStore::commit() ──► SceneChanges ──► Renderer (veneer_render)
//!                                                 │ schedule / execute
//!                                                 ▼
//!                                  Backend + SurfaceSource (e.g. veneer_soft)
//! ```
//!
//! **[`region`]**: canonical y-x banded [`Region`](region::Region) with
//! union, intersection, subtraction, xor and edge expansion.
//!
//! **[`geometry`]**: integer [`Rect`](geometry::Rect) and
//! [`Point`](geometry::Point), with [`kurbo`] conversions.
//!
//! **[`target`]**: [`RenderTarget`](target::RenderTarget), one destination
//! framebuffer with its logical geometry and scale.
//!
//! **[`scene`]**: struct-of-arrays node tree with groups, surfaces and
//! transformer nodes (blur, crossfade).
//!
//! **[`dirty`]**: dirty channels drained by
//! [`SceneStore::commit`](scene::SceneStore::commit).
//!
//! **[`backend`]** and **[`surface`]**: what a graphics backend and the
//! surface layer must provide.
//!
//! **[`effect`]**: pull-model providers for blur and crossfade parameters.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! render-pass instrumentation, with zero-overhead
//! [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates
//!   per-instruction and damage-rect events.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod backend;
pub mod dirty;
pub mod effect;
pub mod geometry;
pub mod region;
pub mod scene;
pub mod surface;
pub mod target;
pub mod trace;
