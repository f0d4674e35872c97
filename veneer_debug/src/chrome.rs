// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][format] JSON to the given writer.
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
/// Passes and phases become duration slices; everything else is an instant
/// event on the same track.
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();

    for recorded in decode(bytes) {
        let ts = nanos_to_us(recorded.timestamp_ns);
        let event = match recorded.event {
            RecordedEvent::PassBegin(e) => json!({
                "ph": "B",
                "name": "Pass",
                "cat": "Pass",
                "ts": ts,
                "pid": 0,
                "tid": 0,
                "args": {
                    "frame_index": e.frame_index,
                    "framebuffer": e.framebuffer.0,
                    "damage_rects": e.damage_rects,
                    "damage_area": e.damage_area,
                    "padding": e.padding,
                }
            }),
            RecordedEvent::PassEnd(e) => json!({
                "ph": "E",
                "name": "Pass",
                "cat": "Pass",
                "ts": ts,
                "pid": 0,
                "tid": 0,
                "args": {
                    "frame_index": e.frame_index,
                    "instructions": e.instructions,
                    "fallbacks": e.fallbacks,
                }
            }),
            RecordedEvent::PhaseBegin(e) => json!({
                "ph": "B",
                "name": format!("{:?}", e.phase),
                "cat": "Phase",
                "ts": ts,
                "pid": 0,
                "tid": 0,
                "args": {
                    "frame_index": e.frame_index,
                }
            }),
            RecordedEvent::PhaseEnd(e) => json!({
                "ph": "E",
                "name": format!("{:?}", e.phase),
                "cat": "Phase",
                "ts": ts,
                "pid": 0,
                "tid": 0,
                "args": {
                    "frame_index": e.frame_index,
                }
            }),
            RecordedEvent::Instance(e) => json!({
                "ph": "i",
                "name": format!("{:?}", e.lifecycle),
                "cat": "Instance",
                "ts": ts,
                "pid": 0,
                "tid": 0,
                "s": "t",
                "args": {
                    "frame_index": e.frame_index,
                    "node_index": e.node_index,
                    "class": e.class.name(),
                }
            }),
            RecordedEvent::EffectFallback(e) => json!({
                "ph": "i",
                "name": "EffectFallback",
                "cat": "Effect",
                "ts": ts,
                "pid": 0,
                "tid": 0,
                "s": "t",
                "args": {
                    "frame_index": e.frame_index,
                    "node_index": e.node_index,
                    "class": e.class.name(),
                    "reason": format!("{:?}", e.reason),
                }
            }),
            RecordedEvent::InstructionsCount { frame_index, count } => json!({
                "ph": "i",
                "name": "Instructions",
                "cat": "Rich",
                "ts": ts,
                "pid": 0,
                "tid": 0,
                "s": "t",
                "args": {
                    "frame_index": frame_index,
                    "count": count,
                }
            }),
            RecordedEvent::DamageRectsCount { frame_index, count } => json!({
                "ph": "i",
                "name": "DamageRects",
                "cat": "Rich",
                "ts": ts,
                "pid": 0,
                "tid": 0,
                "s": "t",
                "args": {
                    "frame_index": frame_index,
                    "count": count,
                }
            }),
        };
        events.push(event);
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn nanos_to_us(nanos: u64) -> f64 {
    nanos as f64 / 1000.0
}
