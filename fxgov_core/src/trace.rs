// Copyright 2026 the fxgov Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the governor.
//!
//! This module provides a [`TraceSink`] trait with one method per governor
//! event. All method bodies default to no-ops, so implementing only the
//! events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing. When **on**, each
//! method performs a single `Option` branch before dispatching.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).

use crate::time::HostTime;
use crate::tier::OptimizationTier;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Why the tier changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TierChangeReason {
    /// Chosen from the capability snapshot when optimizations were applied.
    Initial,
    /// An unoptimized report arrived while at the high tier.
    Degraded,
}

/// What started a fallback sweep.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SweepTrigger {
    /// Low device class or reduced motion at init.
    Startup,
    /// The degradation watcher reached its threshold.
    SustainedDegradation,
    /// Requested by the embedding application.
    Manual,
}

/// What happened to the accelerated-element registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AccelerationKind {
    /// An element received compositing hints and was registered.
    Promoted,
    /// A promotion hint was reset after an animation ended.
    Retracted,
    /// Detached elements were dropped from the registry.
    Pruned,
    /// The registry was torn down.
    Released,
}

/// Governor lifecycle transitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LifecyclePhase {
    /// `init` ran.
    Init,
    /// `destroy` ran.
    Destroy,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted for every metrics report.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MetricsEvent {
    /// Host time at which the window closed.
    pub timestamp: HostTime,
    /// Frames per second over the window.
    pub fps: u32,
    /// Mean frame time in milliseconds.
    pub frame_time_ms: f64,
    /// Whether the window was within budget.
    pub is_optimized: bool,
    /// Tracked active animations.
    pub animation_count: u32,
}

/// Emitted when a tier is applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TierChangeEvent {
    /// Host time of the change.
    pub timestamp: HostTime,
    /// Previous tier, if one had been applied.
    pub from: Option<OptimizationTier>,
    /// New tier.
    pub to: OptimizationTier,
    /// What caused the change.
    pub reason: TierChangeReason,
}

/// Emitted after a fallback sweep.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FallbackSweepEvent {
    /// Host time of the sweep.
    pub timestamp: HostTime,
    /// What started the sweep.
    pub trigger: SweepTrigger,
    /// Number of class substitutions made.
    pub substitutions: u32,
}

/// Emitted when the accelerated-element registry changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AccelerationEvent {
    /// Host time of the change.
    pub timestamp: HostTime,
    /// Kind of change.
    pub kind: AccelerationKind,
    /// Registry size after the change.
    pub registry_len: u32,
}

/// Emitted on init and destroy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LifecycleEvent {
    /// Host time of the transition.
    pub timestamp: HostTime,
    /// Which transition.
    pub phase: LifecyclePhase,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the governor.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called for every metrics report.
    fn on_metrics(&mut self, e: &MetricsEvent) {
        _ = e;
    }

    /// Called when a tier is applied.
    fn on_tier_change(&mut self, e: &TierChangeEvent) {
        _ = e;
    }

    /// Called after a fallback sweep.
    fn on_fallback_sweep(&mut self, e: &FallbackSweepEvent) {
        _ = e;
    }

    /// Called when the accelerated-element registry changes.
    fn on_acceleration(&mut self, e: &AccelerationEvent) {
        _ = e;
    }

    /// Called on init and destroy.
    fn on_lifecycle(&mut self, e: &LifecycleEvent) {
        _ = e;
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

    /// Emits a [`MetricsEvent`].
    #[inline]
    pub fn metrics(&mut self, e: &MetricsEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_metrics(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`TierChangeEvent`].
    #[inline]
    pub fn tier_change(&mut self, e: &TierChangeEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_tier_change(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`FallbackSweepEvent`].
    #[inline]
    pub fn fallback_sweep(&mut self, e: &FallbackSweepEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_fallback_sweep(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits an [`AccelerationEvent`].
    #[inline]
    pub fn acceleration(&mut self, e: &AccelerationEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_acceleration(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`LifecycleEvent`].
    #[inline]
    pub fn lifecycle(&mut self, e: &LifecycleEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_lifecycle(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }
}

/// Saturating `usize` → `u32` for event counters.
pub(crate) fn count_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
