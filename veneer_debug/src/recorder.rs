// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as little-endian records, each prefixed with a tag and the
//! nanoseconds elapsed since the recorder was created. [`decode`] reads them
//! back as an iterator of [`Recorded`] events.
//!
//! Rich events ([`on_instructions`](TraceSink::on_instructions),
//! [`on_damage_rects`](TraceSink::on_damage_rects)) store only the count.

use std::time::Instant;

use veneer_core::backend::FramebufferId;
use veneer_core::scene::NodeClass;
use veneer_core::trace::{
    DamageRect, EffectFallbackEvent, FallbackReason, InstanceEvent, InstanceLifecycle,
    InstructionRecord, PassBeginEvent, PassEndEvent, PhaseBeginEvent, PhaseEndEvent, PhaseKind,
    TraceSink,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_PASS_BEGIN: u8 = 1;
const TAG_PASS_END: u8 = 2;
const TAG_PHASE_BEGIN: u8 = 3;
const TAG_PHASE_END: u8 = 4;
const TAG_INSTANCE: u8 = 5;
const TAG_EFFECT_FALLBACK: u8 = 6;
const TAG_INSTRUCTIONS_COUNT: u8 = 7;
const TAG_DAMAGE_RECTS_COUNT: u8 = 8;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug)]
pub struct RecorderSink {
    buf: Vec<u8>,
    start: Instant,
}

impl Default for RecorderSink {
    fn default() -> Self {
        Self::new()
    }
}

impl RecorderSink {
    /// Creates an empty recorder. Timestamps count from now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Vec::new(),
            start: Instant::now(),
        }
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn header(&mut self, tag: u8) {
        let elapsed = u64::try_from(self.start.elapsed().as_nanos()).unwrap_or(u64::MAX);
        self.write_u8(tag);
        self.write_u64(elapsed);
    }

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_i64(&mut self, v: i64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_count(&mut self, len: usize) {
        self.write_u32(u32::try_from(len).unwrap_or(u32::MAX));
    }

    fn write_phase(&mut self, p: PhaseKind) {
        self.write_u8(match p {
            PhaseKind::Retire => 0,
            PhaseKind::Sync => 1,
            PhaseKind::Schedule => 2,
            PhaseKind::Execute => 3,
        });
    }

    fn write_class(&mut self, c: NodeClass) {
        self.write_u8(match c {
            NodeClass::Group => 0,
            NodeClass::Surface => 1,
            NodeClass::Blur => 2,
            NodeClass::Crossfade => 3,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_pass_begin(&mut self, e: &PassBeginEvent) {
        self.header(TAG_PASS_BEGIN);
        self.write_u64(e.frame_index);
        self.write_u64(e.framebuffer.0);
        self.write_u32(e.damage_rects);
        self.write_i64(e.damage_area);
        self.write_i32(e.padding);
    }

    fn on_pass_end(&mut self, e: &PassEndEvent) {
        self.header(TAG_PASS_END);
        self.write_u64(e.frame_index);
        self.write_u32(e.instructions);
        self.write_u32(e.fallbacks);
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.header(TAG_PHASE_BEGIN);
        self.write_u64(e.frame_index);
        self.write_phase(e.phase);
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.header(TAG_PHASE_END);
        self.write_u64(e.frame_index);
        self.write_phase(e.phase);
    }

    fn on_instance(&mut self, e: &InstanceEvent) {
        self.header(TAG_INSTANCE);
        self.write_u64(e.frame_index);
        self.write_u32(e.node_index);
        self.write_class(e.class);
        self.write_u8(match e.lifecycle {
            InstanceLifecycle::Created => 0,
            InstanceLifecycle::Destroyed => 1,
        });
    }

    fn on_effect_fallback(&mut self, e: &EffectFallbackEvent) {
        self.header(TAG_EFFECT_FALLBACK);
        self.write_u64(e.frame_index);
        self.write_u32(e.node_index);
        self.write_class(e.class);
        self.write_u8(match e.reason {
            FallbackReason::AllocationFailed => 0,
            FallbackReason::BlitFailed => 1,
            FallbackReason::StaleSnapshot => 2,
        });
    }

    fn on_instructions(&mut self, frame_index: u64, instructions: &[InstructionRecord]) {
        self.header(TAG_INSTRUCTIONS_COUNT);
        self.write_u64(frame_index);
        self.write_count(instructions.len());
    }

    fn on_damage_rects(&mut self, frame_index: u64, rects: &[DamageRect]) {
        self.header(TAG_DAMAGE_RECTS_COUNT);
        self.write_u64(frame_index);
        self.write_count(rects.len());
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug)]
pub enum RecordedEvent {
    /// A [`PassBeginEvent`].
    PassBegin(PassBeginEvent),
    /// A [`PassEndEvent`].
    PassEnd(PassEndEvent),
    /// A [`PhaseBeginEvent`].
    PhaseBegin(PhaseBeginEvent),
    /// A [`PhaseEndEvent`].
    PhaseEnd(PhaseEndEvent),
    /// An [`InstanceEvent`].
    Instance(InstanceEvent),
    /// An [`EffectFallbackEvent`].
    EffectFallback(EffectFallbackEvent),
    /// Scheduled instruction count for a pass.
    InstructionsCount {
        /// Pass counter.
        frame_index: u64,
        /// Number of instructions.
        count: u32,
    },
    /// Damage-rect count for a pass.
    DamageRectsCount {
        /// Pass counter.
        frame_index: u64,
        /// Number of damage rects.
        count: u32,
    },
}

/// A decoded event with its arrival time.
#[derive(Clone, Debug)]
pub struct Recorded {
    /// Nanoseconds since the recorder was created.
    pub timestamp_ns: u64,
    /// The event.
    pub event: RecordedEvent,
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`Recorded`] events.
///
/// Iteration stops at the first truncated record or unknown tag.
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn read_array<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.data.get(self.pos..self.pos + N)?;
        self.pos += N;
        bytes.try_into().ok()
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.read_array::<1>().map(|[v]| v)
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.read_array().map(u32::from_le_bytes)
    }

    fn read_i32(&mut self) -> Option<i32> {
        self.read_array().map(i32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.read_array().map(u64::from_le_bytes)
    }

    fn read_i64(&mut self) -> Option<i64> {
        self.read_array().map(i64::from_le_bytes)
    }

    fn read_phase(&mut self) -> Option<PhaseKind> {
        Some(match self.read_u8()? {
            0 => PhaseKind::Retire,
            1 => PhaseKind::Sync,
            2 => PhaseKind::Schedule,
            3 => PhaseKind::Execute,
            _ => return None,
        })
    }

    fn read_class(&mut self) -> Option<NodeClass> {
        Some(match self.read_u8()? {
            0 => NodeClass::Group,
            1 => NodeClass::Surface,
            2 => NodeClass::Blur,
            3 => NodeClass::Crossfade,
            _ => return None,
        })
    }

    fn decode_event(&mut self, tag: u8) -> Option<RecordedEvent> {
        Some(match tag {
            TAG_PASS_BEGIN => RecordedEvent::PassBegin(PassBeginEvent {
                frame_index: self.read_u64()?,
                framebuffer: FramebufferId(self.read_u64()?),
                damage_rects: self.read_u32()?,
                damage_area: self.read_i64()?,
                padding: self.read_i32()?,
            }),
            TAG_PASS_END => RecordedEvent::PassEnd(PassEndEvent {
                frame_index: self.read_u64()?,
                instructions: self.read_u32()?,
                fallbacks: self.read_u32()?,
            }),
            TAG_PHASE_BEGIN => RecordedEvent::PhaseBegin(PhaseBeginEvent {
                frame_index: self.read_u64()?,
                phase: self.read_phase()?,
            }),
            TAG_PHASE_END => RecordedEvent::PhaseEnd(PhaseEndEvent {
                frame_index: self.read_u64()?,
                phase: self.read_phase()?,
            }),
            TAG_INSTANCE => RecordedEvent::Instance(InstanceEvent {
                frame_index: self.read_u64()?,
                node_index: self.read_u32()?,
                class: self.read_class()?,
                lifecycle: match self.read_u8()? {
                    0 => InstanceLifecycle::Created,
                    _ => InstanceLifecycle::Destroyed,
                },
            }),
            TAG_EFFECT_FALLBACK => RecordedEvent::EffectFallback(EffectFallbackEvent {
                frame_index: self.read_u64()?,
                node_index: self.read_u32()?,
                class: self.read_class()?,
                reason: match self.read_u8()? {
                    0 => FallbackReason::AllocationFailed,
                    1 => FallbackReason::BlitFailed,
                    _ => FallbackReason::StaleSnapshot,
                },
            }),
            TAG_INSTRUCTIONS_COUNT => RecordedEvent::InstructionsCount {
                frame_index: self.read_u64()?,
                count: self.read_u32()?,
            },
            TAG_DAMAGE_RECTS_COUNT => RecordedEvent::DamageRectsCount {
                frame_index: self.read_u64()?,
                count: self.read_u32()?,
            },
            _ => return None,
        })
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = Recorded;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        let timestamp_ns = self.read_u64()?;
        let event = self.decode_event(tag)?;
        Some(Recorded {
            timestamp_ns,
            event,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_pass() -> PassBeginEvent {
        PassBeginEvent {
            frame_index: 7,
            framebuffer: FramebufferId(2),
            damage_rects: 3,
            damage_area: -1,
            padding: 16,
        }
    }

    #[test]
    fn pass_begin_survives_recording() {
        let mut rec = RecorderSink::new();
        rec.on_pass_begin(&sample_pass());

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 1);
        match &events[0].event {
            RecordedEvent::PassBegin(e) => {
                assert_eq!(e.frame_index, 7);
                assert_eq!(e.framebuffer, FramebufferId(2));
                assert_eq!(e.damage_rects, 3);
                assert_eq!(e.damage_area, -1);
                assert_eq!(e.padding, 16);
            }
            other => panic!("expected PassBegin, got {other:?}"),
        }
    }

    #[test]
    fn events_keep_order_and_timestamps_are_monotonic() {
        let mut rec = RecorderSink::new();
        rec.on_pass_begin(&sample_pass());
        rec.on_phase_begin(&PhaseBeginEvent {
            frame_index: 7,
            phase: PhaseKind::Schedule,
        });
        rec.on_instance(&InstanceEvent {
            frame_index: 7,
            node_index: 4,
            class: NodeClass::Blur,
            lifecycle: InstanceLifecycle::Destroyed,
        });
        rec.on_effect_fallback(&EffectFallbackEvent {
            frame_index: 7,
            node_index: 4,
            class: NodeClass::Blur,
            reason: FallbackReason::BlitFailed,
        });
        rec.on_phase_end(&PhaseEndEvent {
            frame_index: 7,
            phase: PhaseKind::Schedule,
        });
        rec.on_pass_end(&PassEndEvent {
            frame_index: 7,
            instructions: 5,
            fallbacks: 1,
        });

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 6);
        assert!(matches!(events[0].event, RecordedEvent::PassBegin(_)));
        assert!(matches!(
            events[1].event,
            RecordedEvent::PhaseBegin(PhaseBeginEvent {
                phase: PhaseKind::Schedule,
                ..
            })
        ));
        assert!(matches!(
            events[2].event,
            RecordedEvent::Instance(InstanceEvent {
                node_index: 4,
                class: NodeClass::Blur,
                lifecycle: InstanceLifecycle::Destroyed,
                ..
            })
        ));
        assert!(matches!(
            events[3].event,
            RecordedEvent::EffectFallback(EffectFallbackEvent {
                reason: FallbackReason::BlitFailed,
                ..
            })
        ));
        assert!(matches!(events[4].event, RecordedEvent::PhaseEnd(_)));
        assert!(matches!(
            events[5].event,
            RecordedEvent::PassEnd(PassEndEvent {
                instructions: 5,
                fallbacks: 1,
                ..
            })
        ));
        assert!(
            events
                .windows(2)
                .all(|w| w[0].timestamp_ns <= w[1].timestamp_ns),
            "timestamps go backwards"
        );
    }

    #[test]
    fn rich_events_store_counts() {
        let mut rec = RecorderSink::new();
        let rect = DamageRect {
            x: 0,
            y: 0,
            width: 4,
            height: 4,
        };
        rec.on_damage_rects(42, &[rect, rect]);
        rec.on_instructions(
            42,
            &[InstructionRecord {
                node_index: 1,
                class: NodeClass::Surface,
                bounds: rect,
                rects: 1,
            }],
        );

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert!(matches!(
            events[0].event,
            RecordedEvent::DamageRectsCount {
                frame_index: 42,
                count: 2
            }
        ));
        assert!(matches!(
            events[1].event,
            RecordedEvent::InstructionsCount {
                frame_index: 42,
                count: 1
            }
        ));
    }

    #[test]
    fn empty_buffer_decodes_to_nothing() {
        assert_eq!(decode(&[]).count(), 0);
    }

    #[test]
    fn truncated_record_stops_decoding() {
        let mut rec = RecorderSink::new();
        rec.on_pass_begin(&sample_pass());
        rec.on_pass_begin(&sample_pass());
        let bytes = rec.into_bytes();
        assert_eq!(decode(&bytes[..bytes.len() - 1]).count(), 1);
    }
}
