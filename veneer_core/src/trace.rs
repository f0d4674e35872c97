// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for render passes.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! render driver calls at each stage of a pass. All method bodies default to
//! no-ops, so implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! Events carry no timestamps; sinks that need them (such as the recorder in
//! `veneer_debug`) stamp events on arrival.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`): gates [`InstructionRecord`] and
//!   [`DamageRect`] events plus the corresponding `TraceSink` methods.

use crate::backend::FramebufferId;
#[cfg(feature = "trace-rich")]
use crate::geometry::Rect;
use crate::scene::NodeClass;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which phase of a render pass is being measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    /// Unwrapping finished effects before the pass.
    Retire,
    /// Committing scene changes into the instance arena.
    Sync,
    /// Walking the instance tree and building the instruction list.
    Schedule,
    /// Running the instruction list against the backend.
    Execute,
}

impl PhaseKind {
    /// Short lowercase name for diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Retire => "retire",
            Self::Sync => "sync",
            Self::Schedule => "schedule",
            Self::Execute => "execute",
        }
    }
}

/// Lifecycle transition of a render instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InstanceLifecycle {
    /// The instance was created on first use.
    Created,
    /// The instance and its resources were released.
    Destroyed,
}

/// Why an effect rendered without its effect for a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FallbackReason {
    /// An off-screen buffer could not be allocated.
    AllocationFailed,
    /// A pixel copy between framebuffers failed.
    BlitFailed,
    /// The crossfade snapshot has no content.
    StaleSnapshot,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when a render pass starts, after pass damage has been expanded.
#[derive(Clone, Copy, Debug)]
pub struct PassBeginEvent {
    /// Monotonic pass counter.
    pub frame_index: u64,
    /// Framebuffer the pass draws into.
    pub framebuffer: FramebufferId,
    /// Number of rectangles in the pass damage.
    pub damage_rects: u32,
    /// Number of logical pixels in the pass damage.
    pub damage_area: i64,
    /// Padding the pass damage was expanded by.
    pub padding: i32,
}

/// Emitted when a render pass completes.
#[derive(Clone, Copy, Debug)]
pub struct PassEndEvent {
    /// Pass counter.
    pub frame_index: u64,
    /// Number of top-level instructions executed.
    pub instructions: u32,
    /// Number of effects that fell back to rendering without the effect.
    pub fallbacks: u32,
}

/// Marks the beginning of a pass phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseBeginEvent {
    /// Pass counter.
    pub frame_index: u64,
    /// Which phase is starting.
    pub phase: PhaseKind,
}

/// Marks the end of a pass phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseEndEvent {
    /// Pass counter.
    pub frame_index: u64,
    /// Which phase is ending.
    pub phase: PhaseKind,
}

/// Emitted when a render instance is created or destroyed.
#[derive(Clone, Copy, Debug)]
pub struct InstanceEvent {
    /// Pass counter.
    pub frame_index: u64,
    /// Slot index of the node.
    pub node_index: u32,
    /// Kind of node.
    pub class: NodeClass,
    /// What happened.
    pub lifecycle: InstanceLifecycle,
}

/// Emitted when an effect degrades to rendering without the effect.
#[derive(Clone, Copy, Debug)]
pub struct EffectFallbackEvent {
    /// Pass counter.
    pub frame_index: u64,
    /// Slot index of the transformer node.
    pub node_index: u32,
    /// Kind of transformer.
    pub class: NodeClass,
    /// Why.
    pub reason: FallbackReason,
}

/// One scheduled instruction.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug)]
pub struct InstructionRecord {
    /// Slot index of the node the instruction renders.
    pub node_index: u32,
    /// Kind of node.
    pub class: NodeClass,
    /// Bounding box of the instruction damage.
    pub bounds: DamageRect,
    /// Number of rectangles in the instruction damage.
    pub rects: u32,
}

/// An axis-aligned damage rectangle.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DamageRect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width.
    pub width: u32,
    /// Height.
    pub height: u32,
}

#[cfg(feature = "trace-rich")]
impl From<Rect> for DamageRect {
    fn from(r: Rect) -> Self {
        Self {
            x: r.x,
            y: r.y,
            width: r.width.max(0).unsigned_abs(),
            height: r.height.max(0).unsigned_abs(),
        }
    }
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the render driver.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when a pass begins.
    fn on_pass_begin(&mut self, e: &PassBeginEvent) {
        _ = e;
    }

    /// Called when a pass ends.
    fn on_pass_end(&mut self, e: &PassEndEvent) {
        _ = e;
    }

    /// Called at the beginning of a pass phase.
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        _ = e;
    }

    /// Called at the end of a pass phase.
    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        _ = e;
    }

    /// Called when a render instance is created or destroyed.
    fn on_instance(&mut self, e: &InstanceEvent) {
        _ = e;
    }

    /// Called when an effect falls back to rendering without the effect.
    fn on_effect_fallback(&mut self, e: &EffectFallbackEvent) {
        _ = e;
    }

    /// Called with the scheduled instruction list (requires `trace-rich`).
    #[cfg(feature = "trace-rich")]
    fn on_instructions(&mut self, frame_index: u64, instructions: &[InstructionRecord]) {
        _ = (frame_index, instructions);
    }

    /// Called with the pass damage rectangles (requires `trace-rich`).
    #[cfg(feature = "trace-rich")]
    fn on_damage_rects(&mut self, frame_index: u64, rects: &[DamageRect]) {
        _ = (frame_index, rects);
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Reborrows the tracer for a shorter lifetime.
    #[inline]
    pub fn reborrow(&mut self) -> Tracer<'_> {
        #[cfg(feature = "trace")]
        {
            match &mut self.sink {
                Some(s) => {
                    let s: &mut dyn TraceSink = &mut **s;
                    Tracer { sink: Some(s) }
                }
                None => Tracer { sink: None },
            }
        }
        #[cfg(not(feature = "trace"))]
        {
            Tracer::none()
        }
    }

    /// Emits a [`PassBeginEvent`].
    #[inline]
    pub fn pass_begin(&mut self, e: &PassBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_pass_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PassEndEvent`].
    #[inline]
    pub fn pass_end(&mut self, e: &PassEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_pass_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PhaseBeginEvent`].
    #[inline]
    pub fn phase_begin(&mut self, e: &PhaseBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PhaseEndEvent`].
    #[inline]
    pub fn phase_end(&mut self, e: &PhaseEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits an [`InstanceEvent`].
    #[inline]
    pub fn instance(&mut self, e: &InstanceEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_instance(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits an [`EffectFallbackEvent`].
    #[inline]
    pub fn effect_fallback(&mut self, e: &EffectFallbackEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_effect_fallback(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits the scheduled instruction list (requires `trace-rich`).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn instructions(&mut self, frame_index: u64, instructions: &[InstructionRecord]) {
        if let Some(s) = &mut self.sink {
            s.on_instructions(frame_index, instructions);
        }
    }

    /// Emits pass damage rectangles (requires `trace-rich`).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn damage_rects(&mut self, frame_index: u64, rects: &[DamageRect]) {
        if let Some(s) = &mut self.sink {
            s.on_damage_rects(frame_index, rects);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
