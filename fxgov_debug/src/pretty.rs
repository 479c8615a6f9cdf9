// Copyright 2026 the fxgov Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Timestamps
//! are printed in milliseconds.

use std::io::Write;

use fxgov_core::time::HostTime;
use fxgov_core::trace::{
    AccelerationEvent, AccelerationKind, FallbackSweepEvent, LifecycleEvent, LifecyclePhase,
    MetricsEvent, SweepTrigger, TierChangeEvent, TierChangeReason, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn ms(t: HostTime) -> f64 {
    t.as_millis_f64()
}

fn reason_name(reason: TierChangeReason) -> &'static str {
    match reason {
        TierChangeReason::Initial => "initial",
        TierChangeReason::Degraded => "degraded",
    }
}

fn trigger_name(trigger: SweepTrigger) -> &'static str {
    match trigger {
        SweepTrigger::Startup => "startup",
        SweepTrigger::SustainedDegradation => "sustained",
        SweepTrigger::Manual => "manual",
    }
}

fn kind_name(kind: AccelerationKind) -> &'static str {
    match kind {
        AccelerationKind::Promoted => "promoted",
        AccelerationKind::Retracted => "retracted",
        AccelerationKind::Pruned => "pruned",
        AccelerationKind::Released => "released",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_metrics(&mut self, e: &MetricsEvent) {
        let verdict = if e.is_optimized { "ok" } else { "SLOW" };
        let _ = writeln!(
            self.writer,
            "[metrics] at={:.1}ms fps={} frame={:.2}ms animations={} {verdict}",
            ms(e.timestamp),
            e.fps,
            e.frame_time_ms,
            e.animation_count,
        );
    }

    fn on_tier_change(&mut self, e: &TierChangeEvent) {
        let from = e.from.map_or("-", |tier| tier.as_str());
        let _ = writeln!(
            self.writer,
            "[tier] at={:.1}ms {from} -> {} ({})",
            ms(e.timestamp),
            e.to,
            reason_name(e.reason),
        );
    }

    fn on_fallback_sweep(&mut self, e: &FallbackSweepEvent) {
        let _ = writeln!(
            self.writer,
            "[fallback] at={:.1}ms trigger={} substitutions={}",
            ms(e.timestamp),
            trigger_name(e.trigger),
            e.substitutions,
        );
    }

    fn on_acceleration(&mut self, e: &AccelerationEvent) {
        let _ = writeln!(
            self.writer,
            "[accel] at={:.1}ms {} registry={}",
            ms(e.timestamp),
            kind_name(e.kind),
            e.registry_len,
        );
    }

    fn on_lifecycle(&mut self, e: &LifecycleEvent) {
        let phase = match e.phase {
            LifecyclePhase::Init => "init",
            LifecyclePhase::Destroy => "destroy",
        };
        let _ = writeln!(self.writer, "[{phase}] at={:.1}ms", ms(e.timestamp));
    }
}
