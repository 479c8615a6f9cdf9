// Copyright 2026 the fxgov Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].
//!
//! The governor owns its sink, so [`SharedRecorder`] is provided for the
//! common case of recording while the governor runs and reading the bytes
//! back without taking the sink out again.

use std::cell::RefCell;
use std::rc::Rc;

use fxgov_core::OptimizationTier;
use fxgov_core::time::HostTime;
use fxgov_core::trace::{
    AccelerationEvent, AccelerationKind, FallbackSweepEvent, LifecycleEvent, LifecyclePhase,
    MetricsEvent, SweepTrigger, TierChangeEvent, TierChangeReason, TraceSink,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_METRICS: u8 = 1;
const TAG_TIER_CHANGE: u8 = 2;
const TAG_FALLBACK_SWEEP: u8 = 3;
const TAG_ACCELERATION: u8 = 4;
const TAG_LIFECYCLE: u8 = 5;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
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

    /// Discards everything recorded so far.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_f64(&mut self, v: f64) {
        self.write_u64(v.to_bits());
    }

    fn write_header(&mut self, tag: u8, timestamp: HostTime) {
        self.write_u8(tag);
        self.write_u64(timestamp.ticks());
    }
}

// 0 is reserved for "no tier".
fn tier_code(tier: OptimizationTier) -> u8 {
    match tier {
        OptimizationTier::Low => 1,
        OptimizationTier::Medium => 2,
        OptimizationTier::High => 3,
    }
}

fn reason_code(reason: TierChangeReason) -> u8 {
    match reason {
        TierChangeReason::Initial => 0,
        TierChangeReason::Degraded => 1,
    }
}

fn trigger_code(trigger: SweepTrigger) -> u8 {
    match trigger {
        SweepTrigger::Startup => 0,
        SweepTrigger::SustainedDegradation => 1,
        SweepTrigger::Manual => 2,
    }
}

fn kind_code(kind: AccelerationKind) -> u8 {
    match kind {
        AccelerationKind::Promoted => 0,
        AccelerationKind::Retracted => 1,
        AccelerationKind::Pruned => 2,
        AccelerationKind::Released => 3,
    }
}

fn phase_code(phase: LifecyclePhase) -> u8 {
    match phase {
        LifecyclePhase::Init => 0,
        LifecyclePhase::Destroy => 1,
    }
}

impl TraceSink for RecorderSink {
    fn on_metrics(&mut self, e: &MetricsEvent) {
        self.write_header(TAG_METRICS, e.timestamp);
        self.write_u32(e.fps);
        self.write_f64(e.frame_time_ms);
        self.write_u8(u8::from(e.is_optimized));
        self.write_u32(e.animation_count);
    }

    fn on_tier_change(&mut self, e: &TierChangeEvent) {
        self.write_header(TAG_TIER_CHANGE, e.timestamp);
        self.write_u8(e.from.map_or(0, tier_code));
        self.write_u8(tier_code(e.to));
        self.write_u8(reason_code(e.reason));
    }

    fn on_fallback_sweep(&mut self, e: &FallbackSweepEvent) {
        self.write_header(TAG_FALLBACK_SWEEP, e.timestamp);
        self.write_u8(trigger_code(e.trigger));
        self.write_u32(e.substitutions);
    }

    fn on_acceleration(&mut self, e: &AccelerationEvent) {
        self.write_header(TAG_ACCELERATION, e.timestamp);
        self.write_u8(kind_code(e.kind));
        self.write_u32(e.registry_len);
    }

    fn on_lifecycle(&mut self, e: &LifecycleEvent) {
        self.write_header(TAG_LIFECYCLE, e.timestamp);
        self.write_u8(phase_code(e.phase));
    }
}

// ---------------------------------------------------------------------------
// SharedRecorder
// ---------------------------------------------------------------------------

/// A cloneable handle to one [`RecorderSink`].
///
/// Hand one clone to the governor and keep another to read the recording.
#[derive(Clone, Debug, Default)]
pub struct SharedRecorder(Rc<RefCell<RecorderSink>>);

impl SharedRecorder {
    /// Creates an empty shared recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies out the bytes recorded so far.
    #[must_use]
    pub fn snapshot(&self) -> Vec<u8> {
        self.0.borrow().as_bytes().to_vec()
    }

    /// Discards everything recorded so far.
    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

impl TraceSink for SharedRecorder {
    fn on_metrics(&mut self, e: &MetricsEvent) {
        self.0.borrow_mut().on_metrics(e);
    }

    fn on_tier_change(&mut self, e: &TierChangeEvent) {
        self.0.borrow_mut().on_tier_change(e);
    }

    fn on_fallback_sweep(&mut self, e: &FallbackSweepEvent) {
        self.0.borrow_mut().on_fallback_sweep(e);
    }

    fn on_acceleration(&mut self, e: &AccelerationEvent) {
        self.0.borrow_mut().on_acceleration(e);
    }

    fn on_lifecycle(&mut self, e: &LifecycleEvent) {
        self.0.borrow_mut().on_lifecycle(e);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug, PartialEq)]
pub enum RecordedEvent {
    /// A [`MetricsEvent`].
    Metrics(MetricsEvent),
    /// A [`TierChangeEvent`].
    TierChange(TierChangeEvent),
    /// A [`FallbackSweepEvent`].
    FallbackSweep(FallbackSweepEvent),
    /// An [`AccelerationEvent`].
    Acceleration(AccelerationEvent),
    /// A [`LifecycleEvent`].
    Lifecycle(LifecycleEvent),
}

impl RecordedEvent {
    /// Host time at which the event was emitted.
    #[must_use]
    pub fn timestamp(&self) -> HostTime {
        match self {
            Self::Metrics(e) => e.timestamp,
            Self::TierChange(e) => e.timestamp,
            Self::FallbackSweep(e) => e.timestamp,
            Self::Acceleration(e) => e.timestamp,
            Self::Lifecycle(e) => e.timestamp,
        }
    }
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
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
    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let end = self.pos.checked_add(N)?;
        let bytes = self.data.get(self.pos..end)?.try_into().ok()?;
        self.pos = end;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[v]| v)
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.take().map(u32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.take().map(u64::from_le_bytes)
    }

    fn read_f64(&mut self) -> Option<f64> {
        self.read_u64().map(f64::from_bits)
    }

    fn read_time(&mut self) -> Option<HostTime> {
        self.read_u64().map(HostTime)
    }

    fn read_tier(&mut self) -> Option<Option<OptimizationTier>> {
        match self.read_u8()? {
            0 => Some(None),
            1 => Some(Some(OptimizationTier::Low)),
            2 => Some(Some(OptimizationTier::Medium)),
            3 => Some(Some(OptimizationTier::High)),
            _ => None,
        }
    }

    fn decode_metrics(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Metrics(MetricsEvent {
            timestamp: self.read_time()?,
            fps: self.read_u32()?,
            frame_time_ms: self.read_f64()?,
            is_optimized: self.read_u8()? != 0,
            animation_count: self.read_u32()?,
        }))
    }

    fn decode_tier_change(&mut self) -> Option<RecordedEvent> {
        let timestamp = self.read_time()?;
        let from = self.read_tier()?;
        let to = self.read_tier()??;
        let reason = match self.read_u8()? {
            0 => TierChangeReason::Initial,
            1 => TierChangeReason::Degraded,
            _ => return None,
        };
        Some(RecordedEvent::TierChange(TierChangeEvent {
            timestamp,
            from,
            to,
            reason,
        }))
    }

    fn decode_fallback_sweep(&mut self) -> Option<RecordedEvent> {
        let timestamp = self.read_time()?;
        let trigger = match self.read_u8()? {
            0 => SweepTrigger::Startup,
            1 => SweepTrigger::SustainedDegradation,
            2 => SweepTrigger::Manual,
            _ => return None,
        };
        Some(RecordedEvent::FallbackSweep(FallbackSweepEvent {
            timestamp,
            trigger,
            substitutions: self.read_u32()?,
        }))
    }

    fn decode_acceleration(&mut self) -> Option<RecordedEvent> {
        let timestamp = self.read_time()?;
        let kind = match self.read_u8()? {
            0 => AccelerationKind::Promoted,
            1 => AccelerationKind::Retracted,
            2 => AccelerationKind::Pruned,
            3 => AccelerationKind::Released,
            _ => return None,
        };
        Some(RecordedEvent::Acceleration(AccelerationEvent {
            timestamp,
            kind,
            registry_len: self.read_u32()?,
        }))
    }

    fn decode_lifecycle(&mut self) -> Option<RecordedEvent> {
        let timestamp = self.read_time()?;
        let phase = match self.read_u8()? {
            0 => LifecyclePhase::Init,
            1 => LifecyclePhase::Destroy,
            _ => return None,
        };
        Some(RecordedEvent::Lifecycle(LifecycleEvent { timestamp, phase }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let decoded = match self.read_u8()? {
            TAG_METRICS => self.decode_metrics(),
            TAG_TIER_CHANGE => self.decode_tier_change(),
            TAG_FALLBACK_SWEEP => self.decode_fallback_sweep(),
            TAG_ACCELERATION => self.decode_acceleration(),
            TAG_LIFECYCLE => self.decode_lifecycle(),
            _ => None,
        };
        if decoded.is_none() {
            // Corrupt or truncated: do not resume mid-record.
            self.pos = self.data.len();
        }
        decoded
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_metrics() -> MetricsEvent {
        MetricsEvent {
            timestamp: HostTime(1_000_000),
            fps: 42,
            frame_time_ms: 23.75,
            is_optimized: false,
            animation_count: 3,
        }
    }

    fn sample_tier_change() -> TierChangeEvent {
        TierChangeEvent {
            timestamp: HostTime(1_000_000),
            from: Some(OptimizationTier::High),
            to: OptimizationTier::Medium,
            reason: TierChangeReason::Degraded,
        }
    }

    #[test]
    fn metrics_survive_recording() {
        let mut rec = RecorderSink::new();
        rec.on_metrics(&sample_metrics());

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events, [RecordedEvent::Metrics(sample_metrics())]);
    }

    #[test]
    fn initial_tier_change_has_no_previous_tier() {
        let mut rec = RecorderSink::new();
        rec.on_tier_change(&TierChangeEvent {
            timestamp: HostTime(5),
            from: None,
            to: OptimizationTier::Low,
            reason: TierChangeReason::Initial,
        });

        match decode(rec.as_bytes()).next() {
            Some(RecordedEvent::TierChange(e)) => {
                assert_eq!(e.from, None);
                assert_eq!(e.to, OptimizationTier::Low);
                assert_eq!(e.reason, TierChangeReason::Initial);
            }
            other => panic!("expected TierChange, got {other:?}"),
        }
    }

    #[test]
    fn mixed_events_decode_in_order() {
        let mut rec = RecorderSink::new();
        rec.on_lifecycle(&LifecycleEvent {
            timestamp: HostTime(0),
            phase: LifecyclePhase::Init,
        });
        rec.on_metrics(&sample_metrics());
        rec.on_tier_change(&sample_tier_change());
        rec.on_fallback_sweep(&FallbackSweepEvent {
            timestamp: HostTime(3_000_000),
            trigger: SweepTrigger::SustainedDegradation,
            substitutions: 4,
        });
        rec.on_acceleration(&AccelerationEvent {
            timestamp: HostTime(3_100_000),
            kind: AccelerationKind::Pruned,
            registry_len: 1,
        });

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 5);
        assert!(matches!(events[0], RecordedEvent::Lifecycle(_)));
        assert!(matches!(events[1], RecordedEvent::Metrics(_)));
        assert_eq!(events[2], RecordedEvent::TierChange(sample_tier_change()));
        match &events[3] {
            RecordedEvent::FallbackSweep(e) => {
                assert_eq!(e.trigger, SweepTrigger::SustainedDegradation);
                assert_eq!(e.substitutions, 4);
            }
            other => panic!("expected FallbackSweep, got {other:?}"),
        }
        assert_eq!(events[4].timestamp(), HostTime(3_100_000));
    }

    #[test]
    fn empty_buffer_decodes_to_nothing() {
        let events: Vec<_> = decode(&[]).collect();
        assert!(events.is_empty());
    }

    #[test]
    fn truncated_record_stops_iteration() {
        let mut rec = RecorderSink::new();
        rec.on_metrics(&sample_metrics());
        rec.on_metrics(&sample_metrics());
        let bytes = rec.into_bytes();

        let events: Vec<_> = decode(&bytes[..bytes.len() - 1]).collect();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn unknown_tag_stops_iteration() {
        let mut rec = RecorderSink::new();
        rec.on_metrics(&sample_metrics());
        let mut bytes = rec.into_bytes();
        bytes.push(0xff);
        bytes.extend_from_slice(&[0; 16]);

        assert_eq!(decode(&bytes).count(), 1);
    }

    #[test]
    fn shared_recorder_clones_write_to_one_buffer() {
        let shared = SharedRecorder::new();
        let mut writer = shared.clone();
        writer.on_lifecycle(&LifecycleEvent {
            timestamp: HostTime(10),
            phase: LifecyclePhase::Destroy,
        });

        let events: Vec<_> = decode(&shared.snapshot()).collect();
        assert_eq!(events.len(), 1);

        shared.clear();
        assert!(shared.snapshot().is_empty());
    }
}
