// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;

use veneer_core::trace::{
    DamageRect, EffectFallbackEvent, FallbackReason, InstanceEvent, InstanceLifecycle,
    InstructionRecord, PassBeginEvent, PassEndEvent, PhaseBeginEvent, PhaseEndEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    /// Print every instruction instead of only the count.
    verbose: bool,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("verbose", &self.verbose)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self {
            writer,
            verbose: false,
        }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer,
            verbose: false,
        }
    }

    /// Also prints one line per scheduled instruction.
    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Consumes the sink and returns the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn lifecycle_name(lifecycle: InstanceLifecycle) -> &'static str {
    match lifecycle {
        InstanceLifecycle::Created => "created",
        InstanceLifecycle::Destroyed => "destroyed",
    }
}

fn fallback_name(reason: FallbackReason) -> &'static str {
    match reason {
        FallbackReason::AllocationFailed => "allocation-failed",
        FallbackReason::BlitFailed => "blit-failed",
        FallbackReason::StaleSnapshot => "stale-snapshot",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_pass_begin(&mut self, e: &PassBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[pass:begin] frame={} fb={} damage={}px/{}rects padding={}",
            e.frame_index, e.framebuffer.0, e.damage_area, e.damage_rects, e.padding,
        );
    }

    fn on_pass_end(&mut self, e: &PassEndEvent) {
        let _ = writeln!(
            self.writer,
            "[pass:end] frame={} instructions={} fallbacks={}",
            e.frame_index, e.instructions, e.fallbacks,
        );
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:begin] frame={} {}",
            e.frame_index,
            e.phase.name(),
        );
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:end] frame={} {}",
            e.frame_index,
            e.phase.name(),
        );
    }

    fn on_instance(&mut self, e: &InstanceEvent) {
        let _ = writeln!(
            self.writer,
            "[instance] frame={} node={} {} {}",
            e.frame_index,
            e.node_index,
            e.class.name(),
            lifecycle_name(e.lifecycle),
        );
    }

    fn on_effect_fallback(&mut self, e: &EffectFallbackEvent) {
        let _ = writeln!(
            self.writer,
            "[fallback] frame={} node={} {} {}",
            e.frame_index,
            e.node_index,
            e.class.name(),
            fallback_name(e.reason),
        );
    }

    fn on_instructions(&mut self, frame_index: u64, instructions: &[InstructionRecord]) {
        let _ = writeln!(
            self.writer,
            "[schedule] frame={frame_index} instructions={}",
            instructions.len(),
        );
        if self.verbose {
            for i in instructions {
                let b = i.bounds;
                let _ = writeln!(
                    self.writer,
                    "    node={} {} bounds={},{} {}x{} rects={}",
                    i.node_index,
                    i.class.name(),
                    b.x,
                    b.y,
                    b.width,
                    b.height,
                    i.rects,
                );
            }
        }
    }

    fn on_damage_rects(&mut self, frame_index: u64, rects: &[DamageRect]) {
        let _ = writeln!(
            self.writer,
            "[damage] frame={frame_index} rects={}",
            rects.len(),
        );
    }
}
