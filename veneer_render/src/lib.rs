// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Damage-tracked render scheduling with blur and crossfade effects.
//!
//! `veneer_render` drives a [`veneer_core`] scene onto a
//! [`Backend`](veneer_core::backend::Backend). Rendering a frame is split in
//! two phases:
//!
//! - **Schedule** walks the scene front to back and produces a list of
//!   [`RenderInstruction`]s, each naming a node, a target and the damage it
//!   must redraw. Effects grow the damage here: a blur redraws a ring of
//!   `padding` pixels around what changed, a crossfade redraws its whole box.
//! - **Execute** runs the list back to front against the backend.
//!
//! [`Renderer`] owns the per-node render instances and runs both phases,
//! plus scene synchronization and retirement of finished effects. The
//! [`effects`] helpers attach and detach blur and crossfade transformers.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Emits pass, phase and instance events
//!   through [`veneer_core::trace::Tracer`].
//! - `trace-rich` (disabled by default, implies `trace`): Also emits
//!   per-instruction and damage-rect events.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod bounds;
pub mod effects;
mod instance;
mod instruction;
mod registry;
mod renderer;
mod resource;
mod scanout;

#[cfg(test)]
mod testing;

pub use instruction::RenderInstruction;
pub use registry::EffectRegistry;
pub use renderer::{FrameStats, PassConfig, Renderer};
pub use resource::OwnedFramebuffer;
pub use scanout::{DirectScanout, try_scanout};
