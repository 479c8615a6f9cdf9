// Copyright 2026 the fxgov Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][format] JSON to the given writer.
//!
//! Metrics reports become counter tracks (`fps`, `frame_time_ms`); every
//! other event is a global instant.
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use crate::recorder::{RecordedEvent, decode};

const PID: u32 = 1;

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
/// Host time is already in microseconds, so timestamps are written as-is.
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let events: Vec<Value> = decode(bytes).flat_map(trace_events).collect();
    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn instant(name: &str, cat: &str, ts: u64, args: Value) -> Value {
    json!({
        "ph": "i",
        "name": name,
        "cat": cat,
        "ts": ts,
        "pid": PID,
        "tid": 0,
        "s": "g",
        "args": args,
    })
}

fn counter(name: &str, ts: u64, value: Value) -> Value {
    json!({
        "ph": "C",
        "name": name,
        "cat": "Monitor",
        "ts": ts,
        "pid": PID,
        "tid": 0,
        "args": { name: value },
    })
}

fn trace_events(recorded: RecordedEvent) -> Vec<Value> {
    let ts = recorded.timestamp().ticks();
    match recorded {
        RecordedEvent::Metrics(e) => vec![
            counter("fps", ts, json!(e.fps)),
            counter("frame_time_ms", ts, json!(e.frame_time_ms)),
            instant(
                "Metrics",
                "Monitor",
                ts,
                json!({
                    "is_optimized": e.is_optimized,
                    "animation_count": e.animation_count,
                }),
            ),
        ],
        RecordedEvent::TierChange(e) => vec![instant(
            "TierChange",
            "Optimizer",
            ts,
            json!({
                "from": e.from.map(|tier| tier.as_str()),
                "to": e.to.as_str(),
                "reason": format!("{:?}", e.reason),
            }),
        )],
        RecordedEvent::FallbackSweep(e) => vec![instant(
            "FallbackSweep",
            "Fallback",
            ts,
            json!({
                "trigger": format!("{:?}", e.trigger),
                "substitutions": e.substitutions,
            }),
        )],
        RecordedEvent::Acceleration(e) => vec![instant(
            "Acceleration",
            "Acceleration",
            ts,
            json!({
                "kind": format!("{:?}", e.kind),
                "registry_len": e.registry_len,
            }),
        )],
        RecordedEvent::Lifecycle(e) => vec![instant(
            "Lifecycle",
            "Governor",
            ts,
            json!({ "phase": format!("{:?}", e.phase) }),
        )],
    }
}
